//! 题目提取服务 - 业务能力层
//!
//! 在 TeX 文档中查找 `ex` / `bt` / `vd` 三种环境，记录每道题在原文中的精确字节偏移，
//! 供写回阶段无损重组文档。
//!
//! 匹配规则：从 `\begin{tag}` 开始，到其后最近的同名 `\end{tag}` 结束（非贪婪）。
//! 同名环境嵌套时以第一个结束符为准，这是已知限制。

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::models::exercise::{EnvTag, ExerciseBlock};

static OPENING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\begin\{(ex|bt|vd)\}").expect("opening pattern is valid"));

/// 按文档顺序提取所有题目（含偏移）
pub fn extract(document: &str) -> Vec<ExerciseBlock> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = OPENING.captures_at(document, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let Some(tag) = EnvTag::from_name(name.as_str()) else {
            cursor = whole.end();
            continue;
        };

        let closing = tag.closing();
        match document[whole.end()..].find(&closing) {
            Some(rel) => {
                let start = whole.start();
                let end = whole.end() + rel + closing.len();
                blocks.push(ExerciseBlock {
                    text: document[start..end].to_string(),
                    tag,
                    start,
                    end,
                });
                cursor = end;
            }
            None => {
                warn!("\\begin{{{}}} (偏移 {}) 没有对应的结束符，已跳过", tag, whole.start());
                cursor = whole.end();
            }
        }
    }

    debug!("提取到 {} 道题目", blocks.len());
    blocks
}

/// 只需要题目文本、不需要写回时使用
pub fn extract_texts(document: &str) -> Vec<String> {
    extract(document).into_iter().map(|b| b.text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_all_three_tags_in_order() {
        let doc = "intro\n\\begin{vd}A\\end{vd}\ntext\\begin{ex}B\\end{ex}\\begin{bt}C\n\\end{bt}tail";
        let blocks = extract(doc);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].tag, EnvTag::Vd);
        assert_eq!(blocks[1].tag, EnvTag::Ex);
        assert_eq!(blocks[2].tag, EnvTag::Bt);
        for block in &blocks {
            assert_eq!(&doc[block.start..block.end], block.text);
        }
        assert_eq!(blocks[2].body(), "C");
    }

    #[test]
    fn test_blocks_are_strictly_increasing_and_disjoint() {
        let doc = "\\begin{ex}1\\end{ex}\\begin{ex}2\\end{ex}\n\\begin{bt}3\\end{bt}";
        let blocks = extract(doc);

        assert_eq!(blocks.len(), 3);
        for pair in blocks.windows(2) {
            assert!(pair[0].start < pair[1].start);
            assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn test_nearest_closing_of_same_tag_wins() {
        // 不同名的结束符不会截断
        let doc = "\\begin{ex}a \\end{bt} b\\end{ex} c \\end{ex}";
        let blocks = extract(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "\\begin{ex}a \\end{bt} b\\end{ex}");

        // 同名嵌套：第一个结束符为准
        let nested = "\\begin{ex}outer \\begin{ex}inner\\end{ex} rest\\end{ex}";
        let blocks = extract(nested);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "\\begin{ex}outer \\begin{ex}inner\\end{ex}");
    }

    #[test]
    fn test_unclosed_opening_is_skipped() {
        let doc = "\\begin{bt} never closed \\begin{ex}ok\\end{ex}";
        let blocks = extract(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].tag, EnvTag::Ex);
        assert_eq!(blocks[0].start, doc.find("\\begin{ex}").unwrap());
    }

    #[test]
    fn test_unicode_offsets_are_byte_exact() {
        let doc = "Đề thi\n\\begin{ex}Tính độ dài\\end{ex}";
        let blocks = extract(doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(&doc[blocks[0].start..blocks[0].end], blocks[0].text);
        assert_eq!(extract_texts(doc), vec![blocks[0].text.clone()]);
    }

    #[test]
    fn test_other_environments_are_ignored() {
        assert!(extract("\\begin{example}x\\end{example}\\begin{itemize}\\end{itemize}").is_empty());
    }
}
