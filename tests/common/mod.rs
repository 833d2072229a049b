//! 集成测试共用的脚本化后端与样例数据

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use exercise_tagger::error::BackendError;
use exercise_tagger::services::{CompletionBackend, CompletionRequest};

pub const MAPID: &str = "\
% Mức độ
% [N] Nhận biết
% [H] Thông hiểu
-[10] Lớp 10
----[T] Toán
-------[1] Chương 1
----------[2] Bài 2
-------------[3] Dạng 3
-------------[4] Dạng 4
";

/// 按顺序返回预设响应，并记录收到的提示词
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String, BackendError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<Result<String, BackendError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::new("script exhausted")))
    }
}

/// 模型响应
pub fn reply(type_code: &str, difficulty: &str, confidence: f64) -> Result<String, BackendError> {
    Ok(format!(
        r#"{{"grade":"10","subject":"T","chapter":"1","lesson":"2","type":"{}","difficulty":"{}","confidence":{}}}"#,
        type_code, difficulty, confidence
    ))
}

pub fn probe_ok() -> Result<String, BackendError> {
    Ok("{}".to_string())
}
