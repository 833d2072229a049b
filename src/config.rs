use std::time::Duration;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 输入输出 ---
    /// 待标注的 TeX 文件
    pub source_path: Option<String>,
    /// MapID 分类体系文件（为空时使用已缓存的版本）
    pub taxonomy_path: Option<String>,
    /// 本地设置文件（API Key、缓存的分类体系）
    pub settings_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    /// 是否把环境变量中的 API Key 写入设置文件
    pub remember_api_key: bool,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 开启深度推理时使用的模型
    pub llm_reasoning_model_name: String,
    pub use_extended_reasoning: bool,
    /// 发送给模型的题目最大字符数
    pub preview_chars: usize,
    // --- 节奏与重试 ---
    /// 两道题之间的间隔（毫秒）
    pub pacing_delay_ms: u64,
    /// 配额耗尽后的冷却时间（秒）
    pub cooldown_secs: u64,
    /// 冷却倒计时的步长（毫秒）
    pub cooldown_tick_ms: u64,
    /// 单次请求最大尝试次数
    pub max_attempts: u32,
    /// 普通网络错误的退避基数（毫秒）
    pub transport_backoff_ms: u64,
    /// 限流错误的退避基数（毫秒）
    pub rate_limit_backoff_ms: u64,
}

/// 发送给模型的题目长度下限
pub const MIN_PREVIEW_CHARS: usize = 1000;
/// 发送给模型的题目长度上限
pub const MAX_PREVIEW_CHARS: usize = 3000;

impl Default for Config {
    fn default() -> Self {
        Self {
            source_path: None,
            taxonomy_path: None,
            settings_file: "exercise_tagger_settings.toml".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            remember_api_key: false,
            llm_api_base_url: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
            llm_model_name: "gemini-2.5-flash".to_string(),
            llm_reasoning_model_name: "gemini-2.5-pro".to_string(),
            use_extended_reasoning: true,
            preview_chars: MIN_PREVIEW_CHARS,
            pacing_delay_ms: 1000,
            cooldown_secs: 30,
            cooldown_tick_ms: 1000,
            max_attempts: 3,
            transport_backoff_ms: 1000,
            rate_limit_backoff_ms: 5000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            source_path: std::env::var("SOURCE_PATH").ok().or(default.source_path),
            taxonomy_path: std::env::var("TAXONOMY_PATH").ok().or(default.taxonomy_path),
            settings_file: std::env::var("SETTINGS_FILE").unwrap_or(default.settings_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            remember_api_key: std::env::var("REMEMBER_API_KEY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.remember_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_reasoning_model_name: std::env::var("LLM_REASONING_MODEL_NAME").unwrap_or(default.llm_reasoning_model_name),
            use_extended_reasoning: std::env::var("USE_EXTENDED_REASONING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.use_extended_reasoning),
            preview_chars: std::env::var("PREVIEW_CHARS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.preview_chars),
            pacing_delay_ms: std::env::var("PACING_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.pacing_delay_ms),
            cooldown_secs: std::env::var("COOLDOWN_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cooldown_secs),
            cooldown_tick_ms: std::env::var("COOLDOWN_TICK_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cooldown_tick_ms),
            max_attempts: std::env::var("MAX_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_attempts),
            transport_backoff_ms: std::env::var("TRANSPORT_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.transport_backoff_ms),
            rate_limit_backoff_ms: std::env::var("RATE_LIMIT_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.rate_limit_backoff_ms),
        }
    }

    /// 用命令行参数覆盖输入路径：`<source.tex> [taxonomy.tex]`
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        if let Some(source) = args.next() {
            self.source_path = Some(source);
        }
        if let Some(taxonomy) = args.next() {
            self.taxonomy_path = Some(taxonomy);
        }
        self
    }

    /// 实际发送给模型的题目长度，限制在 [1000, 3000] 内
    pub fn effective_preview_chars(&self) -> usize {
        self.preview_chars.clamp(MIN_PREVIEW_CHARS, MAX_PREVIEW_CHARS)
    }

    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }
}
