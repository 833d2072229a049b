//! 分类提示词模板

/// 系统消息
pub const SYSTEM_MESSAGE: &str = "You are an examiner for secondary-school mathematics. \
You classify exercises into a fixed taxonomy and answer with a single JSON object only, \
without explanations or markdown.";

/// 期望的响应结构
const RESPONSE_SHAPE: &str = r#"{
  "grade": "grade code",
  "subject": "subject code",
  "chapter": "chapter code",
  "lesson": "lesson code",
  "type": "exercise type code",
  "difficulty": "N|H|V|C",
  "confidence": 0.0
}"#;

/// 首次分类提示词
pub fn build_classify_prompt(taxonomy_summary: &str, exercise: &str) -> String {
    format!(
        r#"Below is the complete taxonomy (grade → subject → chapter → lesson → exercise type):
{taxonomy}

Classify the following exercise and pick the single most precise code path from the taxonomy above.
Answer with JSON of exactly this shape:
{shape}

Rules:
1. Use ONLY codes that appear in the taxonomy above; the five codes must form an existing path.
2. "difficulty" must be one of N (recognition), H (comprehension), V (application), C (advanced application).
3. "confidence" is a number between 0 and 1.
4. Return the JSON object only.

Exercise:
"""{exercise}""""#,
        taxonomy = taxonomy_summary,
        shape = RESPONSE_SHAPE,
        exercise = exercise,
    )
}

/// 纠错提示词：上一次的编码不在分类体系中
pub fn build_fallback_prompt(taxonomy_summary: &str, exercise: &str, previous: &str) -> String {
    format!(
        r#"A previous classification of this exercise does not match any valid code path.

Valid taxonomy:
{taxonomy}

Task: check the tentative classification below and correct it so that grade, subject, chapter,
lesson and type form a path that exists in the valid taxonomy exactly.

Exercise:
"""{exercise}"""

Tentative classification to correct:
{previous}

Return the final JSON object with the same shape:
{shape}"#,
        taxonomy = taxonomy_summary,
        exercise = exercise,
        previous = previous,
        shape = RESPONSE_SHAPE,
    )
}

/// 校验 API Key 用的最小请求
pub const VERIFY_PROMPT: &str = "Return an empty JSON object {}";
