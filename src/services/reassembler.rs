//! 文档重组服务 - 业务能力层
//!
//! 把分类编码写回原文：紧跟在起始定界符之后插入 `%[编码]`，
//! 其余字节原样保留。

use tracing::warn;

use crate::models::report::ProcessingResult;

/// 注释前缀
const ANNOTATION_PREFIX: char = '%';

/// 按原文偏移写回所有标注
pub fn reassemble(document: &str, results: &[ProcessingResult]) -> String {
    let mut ordered: Vec<&ProcessingResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.block.start);

    let extra: usize = ordered
        .iter()
        .filter_map(|r| r.annotation())
        .map(|code| code.len() + 1)
        .sum();
    let mut output = String::with_capacity(document.len() + extra);
    let mut cursor = 0;

    for result in ordered {
        let block = &result.block;
        let opening_end = block.start + block.opening_len();

        let in_range = block.start >= cursor
            && block.end <= document.len()
            && opening_end <= block.end
            && document.get(block.start..block.end) == Some(block.text.as_str());
        if !in_range {
            warn!(
                "[练习 {}] 偏移 {}..{} 与原文不一致，跳过写回",
                result.index, block.start, block.end
            );
            continue;
        }

        output.push_str(&document[cursor..block.start]);
        match result.annotation() {
            Some(code) => {
                output.push_str(&document[block.start..opening_end]);
                output.push(ANNOTATION_PREFIX);
                output.push_str(code);
                output.push_str(&document[opening_end..block.end]);
            }
            None => output.push_str(&document[block.start..block.end]),
        }
        cursor = block.end;
    }

    output.push_str(&document[cursor..]);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classification::ClassificationResult;
    use crate::models::difficulty::Difficulty;
    use crate::services::exercise_extractor::extract;

    fn classified(index: usize, block: crate::models::ExerciseBlock, lesson: &str) -> ProcessingResult {
        let result = ClassificationResult {
            grade: "10".to_string(),
            subject: "T".to_string(),
            chapter: "1".to_string(),
            lesson: lesson.to_string(),
            type_code: "3".to_string(),
            difficulty: Difficulty::H,
            confidence: 0.9,
            is_valid: true,
        };
        ProcessingResult::from_classification(index, block, &result)
    }

    #[test]
    fn test_no_results_is_identity() {
        let doc = "a\\begin{ex}x\\end{ex}b\n";
        assert_eq!(reassemble(doc, &[]), doc);
        assert_eq!(reassemble("", &[]), "");
    }

    #[test]
    fn test_single_block_annotation() {
        let doc = "\\begin{ex}2+2=4\\end{ex}";
        let blocks = extract(doc);
        let results = vec![classified(1, blocks[0].clone(), "2")];
        assert_eq!(reassemble(doc, &results), "\\begin{ex}%[10T1H2-3]2+2=4\\end{ex}");
    }

    #[test]
    fn test_unsorted_results_and_surrounding_text_preserved() {
        let doc = "Đầu\n\\begin{ex}\nA\n\\end{ex}\ngiữa\n\\begin{bt}\nB\n\\end{bt}\ncuối";
        let blocks = extract(doc);
        let results = vec![
            classified(2, blocks[1].clone(), "5"),
            classified(1, blocks[0].clone(), "4"),
        ];
        let out = reassemble(doc, &results);
        assert_eq!(
            out,
            "Đầu\n\\begin{ex}%[10T1H4-3]\nA\n\\end{ex}\ngiữa\n\\begin{bt}%[10T1H5-3]\nB\n\\end{bt}\ncuối"
        );
        assert_eq!(out.len(), doc.len() + "%[10T1H4-3]".len() + "%[10T1H5-3]".len());
    }

    #[test]
    fn test_error_rows_are_left_untouched() {
        let doc = "\\begin{ex}1\\end{ex} \\begin{ex}2\\end{ex}";
        let blocks = extract(doc);
        let results = vec![
            ProcessingResult::failed(1, blocks[0].clone(), "timeout"),
            classified(2, blocks[1].clone(), "2"),
        ];
        assert_eq!(
            reassemble(doc, &results),
            "\\begin{ex}1\\end{ex} \\begin{ex}%[10T1H2-3]2\\end{ex}"
        );
    }

    #[test]
    fn test_stale_offsets_are_skipped() {
        let doc = "\\begin{ex}1\\end{ex}";
        let other = extract("xx\\begin{ex}1\\end{ex}");
        let results = vec![classified(1, other[0].clone(), "2")];
        assert_eq!(reassemble(doc, &results), doc);
    }
}
