use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 分类服务错误
    #[error("分类服务错误: {0}")]
    Classify(#[from] ClassifyError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 业务逻辑错误
    #[error("业务错误: {0}")]
    Business(#[from] BusinessError),
}

/// 分类服务对外暴露的错误
///
/// 底层的网络/鉴权错误只在分类客户端边界被归类为这三种，
/// 编排层不会直接看到原始错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// API Key 无效，整次运行终止
    #[error("API Key 无效或无权限")]
    InvalidCredentials,
    /// 配额耗尽，进入冷却后重试同一道题
    #[error("API 配额耗尽")]
    QuotaExceeded,
    /// 其他所有失败（网络、响应格式等）
    #[error("请求失败: {message}")]
    Transport { message: String },
    /// 退避等待期间收到取消信号
    #[error("已取消")]
    Cancelled,
}

impl ClassifyError {
    pub fn transport(message: impl Into<String>) -> Self {
        ClassifyError::Transport {
            message: message.into(),
        }
    }
}

/// 补全后端返回的原始错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BackendError {
    /// HTTP 状态码（后端能拿到时）
    pub status: Option<u16>,
    pub message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// TOML 序列化失败
    #[error("TOML序列化失败: {source}")]
    TomlSerializeFailed {
        #[source]
        source: toml::ser::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 没有可用的 API Key
    #[error("未配置 API Key (环境变量 LLM_API_KEY 或设置文件)")]
    MissingApiKey,
    /// 没有指定待处理的 TeX 文件
    #[error("未指定待处理的 TeX 文件")]
    MissingSourcePath,
    /// 没有分类体系可用
    #[error("未指定 MapID 文件，且没有已缓存的 MapID")]
    MissingTaxonomy,
}

/// 业务逻辑错误
#[derive(Debug, Error)]
pub enum BusinessError {
    /// 分类体系中没有任何叶子节点
    #[error("MapID 中没有找到有效的分类数据")]
    EmptyTaxonomy,
    /// 文档中没有找到题目
    #[error("文档中没有找到任何题目 (ex, bt, vd)")]
    NoExercises,
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
