//! MapID 解析服务 - 业务能力层
//!
//! 把用短横线缩进编码的大纲解析成四层分类树。层级只由短横线的数量决定：
//!
//! | 短横线 | 层级 |
//! |-------|------|
//! | 1     | 年级 |
//! | 4     | 科目 |
//! | 7     | 章   |
//! | 10    | 课   |
//! | 13    | 题型 |
//!
//! 解析永不失败：不认识的行直接跳过。

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::models::difficulty::Difficulty;
use crate::models::taxonomy::{DifficultyLegend, LeafIndex, Taxonomy, TaxonomyLeaf, TaxonomyTree};

static OUTLINE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-+)\[(.+?)\]\s*(.+)$").expect("outline pattern is valid"));

static LEGEND_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([NHVC])\]\s+(.+)").expect("legend pattern is valid"));

const GRADE_DASHES: usize = 1;
const SUBJECT_DASHES: usize = 4;
const CHAPTER_DASHES: usize = 7;
const LESSON_DASHES: usize = 10;
const TYPE_DASHES: usize = 13;

/// 解析 MapID 文本，返回 (分类树, 难度图例)
pub fn parse(text: &str) -> (TaxonomyTree, DifficultyLegend) {
    let mut tree = TaxonomyTree::default();
    let mut legend = DifficultyLegend::default();

    let mut grade: Option<String> = None;
    let mut subject: Option<String> = None;
    let mut chapter: Option<String> = None;
    let mut lesson: Option<String> = None;

    for raw_line in text.lines() {
        let line = raw_line.trim_end();
        let trimmed = line.trim_start();

        // 注释行和控制序列行只用来找难度图例
        if trimmed.is_empty() || trimmed.starts_with('%') || trimmed.starts_with('\\') {
            if let Some(caps) = LEGEND_LINE.captures(line) {
                if let Some(level) = Difficulty::from_code(&caps[1]) {
                    legend.insert(level, caps[2].trim());
                }
            }
            continue;
        }

        let Some(caps) = OUTLINE_LINE.captures(line) else {
            continue;
        };
        let dashes = caps[1].len();
        let code = caps[2].trim().to_string();
        let name = caps[3].trim().to_string();

        match dashes {
            GRADE_DASHES => {
                tree.grades.entry(code.clone()).or_default();
                grade = Some(code);
                subject = None;
                chapter = None;
                lesson = None;
            }
            SUBJECT_DASHES => {
                let Some(g) = grade.as_ref() else { continue };
                tree.grades.entry(g.clone()).or_default().entry(code.clone()).or_default();
                subject = Some(code);
                chapter = None;
                lesson = None;
            }
            CHAPTER_DASHES => {
                let (Some(g), Some(s)) = (grade.as_ref(), subject.as_ref()) else {
                    continue;
                };
                tree.grades
                    .entry(g.clone())
                    .or_default()
                    .entry(s.clone())
                    .or_default()
                    .entry(code.clone())
                    .or_default();
                chapter = Some(code);
                lesson = None;
            }
            LESSON_DASHES => {
                let (Some(g), Some(s), Some(c)) = (grade.as_ref(), subject.as_ref(), chapter.as_ref()) else {
                    continue;
                };
                tree.grades
                    .entry(g.clone())
                    .or_default()
                    .entry(s.clone())
                    .or_default()
                    .entry(c.clone())
                    .or_default()
                    .entry(code.clone())
                    .or_default();
                lesson = Some(code);
            }
            TYPE_DASHES => {
                let (Some(g), Some(s), Some(c), Some(l)) =
                    (grade.as_ref(), subject.as_ref(), chapter.as_ref(), lesson.as_ref())
                else {
                    continue;
                };
                tree.grades
                    .entry(g.clone())
                    .or_default()
                    .entry(s.clone())
                    .or_default()
                    .entry(c.clone())
                    .or_default()
                    .entry(l.clone())
                    .or_default()
                    .insert(code, name);
            }
            other => {
                debug!("跳过无法识别层级的行 (短横线 {}): {}", other, line);
            }
        }
    }

    (tree, legend)
}

/// 深度优先展开分类树，返回 (叶子列表, 给模型看的摘要)
pub fn flatten(tree: &TaxonomyTree) -> (Vec<TaxonomyLeaf>, String) {
    let mut leaves = Vec::new();
    let mut lines = Vec::new();

    for (grade, subjects) in &tree.grades {
        lines.push(format!("Grade {}:", grade));
        for (subject, chapters) in subjects {
            lines.push(format!("  - Subject {}:", subject));
            for (chapter, lessons) in chapters {
                lines.push(format!("    * Chapter {}:", chapter));
                for (lesson, types) in lessons {
                    lines.push(format!("      + Lesson {}: {} types", lesson, types.len()));
                    for (type_code, type_name) in types {
                        lines.push(format!("        . Type {}: {}", type_code, type_name));
                        leaves.push(TaxonomyLeaf {
                            grade: grade.clone(),
                            subject: subject.clone(),
                            chapter: chapter.clone(),
                            lesson: lesson.clone(),
                            type_code: type_code.clone(),
                            type_name: type_name.clone(),
                        });
                    }
                }
            }
        }
    }

    (leaves, lines.join("\n"))
}

/// 一步完成解析、展开、建索引
pub fn build_taxonomy(text: &str) -> Taxonomy {
    let (tree, legend) = parse(text);
    let (leaves, summary) = flatten(&tree);
    let index = LeafIndex::new(&leaves);

    debug!(
        "MapID 解析完成: {} 个年级, {} 个题型",
        tree.grades.len(),
        leaves.len()
    );

    Taxonomy {
        tree,
        legend,
        leaves,
        index,
        summary,
    }
}
