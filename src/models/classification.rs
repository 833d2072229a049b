//! 分类结果与模型响应的结构校验

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::models::difficulty::Difficulty;
use crate::models::taxonomy::LeafKey;

/// 单道题的分类结果
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub grade: String,
    pub subject: String,
    pub chapter: String,
    pub lesson: String,
    pub type_code: String,
    pub difficulty: Difficulty,
    /// 0.0 - 1.0
    pub confidence: f64,
    /// 五元组是否命中 MapID
    pub is_valid: bool,
}

impl ClassificationResult {
    pub fn key(&self) -> LeafKey {
        LeafKey {
            grade: self.grade.clone(),
            subject: self.subject.clone(),
            chapter: self.chapter.clone(),
            lesson: self.lesson.clone(),
            type_code: self.type_code.clone(),
        }
    }

    /// 写回文档的标注：`[<年级><科目><章><难度><课>-<题型>]`
    pub fn code(&self) -> String {
        format!(
            "[{}{}{}{}{}-{}]",
            self.grade, self.subject, self.chapter, self.difficulty, self.lesson, self.type_code
        )
    }

    /// 置信度百分比，如 `90%`
    pub fn confidence_percent(&self) -> String {
        format!("{}%", (self.confidence * 100.0).round() as i64)
    }

    /// 序列化成与模型响应同结构的 JSON，用于纠错提示词
    pub fn to_wire_json(&self) -> String {
        json!({
            "grade": self.grade,
            "subject": self.subject,
            "chapter": self.chapter,
            "lesson": self.lesson,
            "type": self.type_code,
            "difficulty": self.difficulty.code(),
            "confidence": self.confidence,
        })
        .to_string()
    }
}

/// 模型响应不符合约定结构
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("响应中没有 JSON 对象: {0}")]
    NotJson(String),
    #[error("JSON 解析失败: {0}")]
    Malformed(String),
    #[error("缺少字段: {0}")]
    MissingField(&'static str),
    #[error("难度代码无效: {0}")]
    InvalidDifficulty(String),
    #[error("置信度超出 [0, 1]: {0}")]
    InvalidConfidence(f64),
}

/// 代码字段可能是字符串，也可能被模型写成数字
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CodeValue {
    Text(String),
    Number(serde_json::Number),
}

impl CodeValue {
    fn into_code(self) -> String {
        match self {
            CodeValue::Text(s) => s.trim().to_string(),
            CodeValue::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    grade: Option<CodeValue>,
    subject: Option<CodeValue>,
    chapter: Option<CodeValue>,
    lesson: Option<CodeValue>,
    #[serde(rename = "type")]
    type_code: Option<CodeValue>,
    difficulty: Option<String>,
    confidence: Option<f64>,
}

/// 解析并校验模型返回的 7 字段 JSON
///
/// 允许 JSON 外包裹代码块或说明文字，取第一个 `{` 到最后一个 `}`。
pub fn parse_classification(response: &str) -> Result<ClassificationResult, SchemaError> {
    let json_text = extract_json_object(response)?;
    let raw: RawClassification =
        serde_json::from_str(json_text).map_err(|e| SchemaError::Malformed(e.to_string()))?;

    let grade = required_code(raw.grade, "grade")?;
    let subject = required_code(raw.subject, "subject")?;
    let chapter = required_code(raw.chapter, "chapter")?;
    let lesson = required_code(raw.lesson, "lesson")?;
    let type_code = required_code(raw.type_code, "type")?;

    let difficulty_raw = raw.difficulty.ok_or(SchemaError::MissingField("difficulty"))?;
    let difficulty = Difficulty::normalize(&difficulty_raw)
        .ok_or_else(|| SchemaError::InvalidDifficulty(difficulty_raw.clone()))?;

    let confidence = raw.confidence.ok_or(SchemaError::MissingField("confidence"))?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(SchemaError::InvalidConfidence(confidence));
    }

    Ok(ClassificationResult {
        grade,
        subject,
        chapter,
        lesson,
        type_code,
        difficulty,
        confidence,
        is_valid: false,
    })
}

fn required_code(value: Option<CodeValue>, field: &'static str) -> Result<String, SchemaError> {
    let code = value.ok_or(SchemaError::MissingField(field))?.into_code();
    if code.is_empty() {
        return Err(SchemaError::MissingField(field));
    }
    Ok(code)
}

fn extract_json_object(response: &str) -> Result<&str, SchemaError> {
    let start = response.find('{');
    let end = response.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&response[s..=e]),
        _ => Err(SchemaError::NotJson(response.chars().take(80).collect())),
    }
}
