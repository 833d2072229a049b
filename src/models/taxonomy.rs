//! MapID 分类体系
//!
//! 年级 → 科目 → 章 → 课 → {题型代码 → 题型名称}

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::difficulty::Difficulty;

pub type TypeMap = BTreeMap<String, String>;
pub type LessonMap = BTreeMap<String, TypeMap>;
pub type ChapterMap = BTreeMap<String, LessonMap>;
pub type SubjectMap = BTreeMap<String, ChapterMap>;

/// 四层嵌套的分类树
///
/// 使用有序映射，保证同一棵树每次生成的摘要完全一致。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyTree {
    pub grades: BTreeMap<String, SubjectMap>,
}

impl TaxonomyTree {
    /// 获取某个课下的所有题型
    pub fn types(&self, grade: &str, subject: &str, chapter: &str, lesson: &str) -> Option<&TypeMap> {
        self.grades
            .get(grade)?
            .get(subject)?
            .get(chapter)?
            .get(lesson)
    }
}

/// 展开后的叶子节点
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaxonomyLeaf {
    pub grade: String,
    pub subject: String,
    pub chapter: String,
    pub lesson: String,
    pub type_code: String,
    pub type_name: String,
}

impl TaxonomyLeaf {
    pub fn key(&self) -> LeafKey {
        LeafKey {
            grade: self.grade.clone(),
            subject: self.subject.clone(),
            chapter: self.chapter.clone(),
            lesson: self.lesson.clone(),
            type_code: self.type_code.clone(),
        }
    }
}

/// 用于校验的五元组
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeafKey {
    pub grade: String,
    pub subject: String,
    pub chapter: String,
    pub lesson: String,
    pub type_code: String,
}

/// 叶子五元组的集合，O(1) 校验
#[derive(Debug, Clone, Default)]
pub struct LeafIndex {
    keys: HashSet<LeafKey>,
}

impl LeafIndex {
    pub fn new(leaves: &[TaxonomyLeaf]) -> Self {
        Self {
            keys: leaves.iter().map(TaxonomyLeaf::key).collect(),
        }
    }

    /// 逐字段精确匹配（区分大小写）
    pub fn contains(&self, key: &LeafKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// 难度图例，只用于显示
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifficultyLegend {
    labels: BTreeMap<Difficulty, String>,
}

impl DifficultyLegend {
    pub fn insert(&mut self, level: Difficulty, label: impl Into<String>) {
        self.labels.insert(level, label.into());
    }

    /// 文件中声明的名称，没有声明时使用默认名称
    pub fn label(&self, level: Difficulty) -> &str {
        self.labels
            .get(&level)
            .map(String::as_str)
            .unwrap_or_else(|| level.default_label())
    }

    pub fn declared(&self, level: Difficulty) -> Option<&str> {
        self.labels.get(&level).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// 一次运行使用的完整分类上下文
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub tree: TaxonomyTree,
    pub legend: DifficultyLegend,
    pub leaves: Vec<TaxonomyLeaf>,
    pub index: LeafIndex,
    /// 发送给模型的分类体系摘要
    pub summary: String,
}

impl Taxonomy {
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}
