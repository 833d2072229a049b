//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一次完整运行的资源准备和收尾。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、设置文件、API Key
//! 2. **输入加载**：MapID（命令行或缓存）和待标注的 TeX
//! 3. **Key 校验**：正式处理前发一次探测请求
//! 4. **向下委托**：交给 `RunProcessor` 逐题处理
//! 5. **输出**：写回 `_tagged.tex` 和 `_report.csv`，打印统计

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, BusinessError, ClassifyError, ConfigError};
use crate::infrastructure::SettingsStore;
use crate::logger;
use crate::models::loaders::{load_document, output_paths};
use crate::models::taxonomy::Taxonomy;
use crate::orchestrator::run_processor::{RunEvent, RunOutcome, RunProcessor, RunStats};
use crate::services::exercise_extractor;
use crate::services::{build_taxonomy, BackoffPolicy, ClassificationClient, CompletionBackend, LlmService, ReportWriter};
use crate::utils::logging::{log_inputs_loaded, log_startup, print_final_stats};
use crate::workflow::ExerciseFlow;

/// 应用主结构
pub struct App {
    config: Config,
    store: SettingsStore,
    backend: Arc<dyn CompletionBackend>,
    events: Option<UnboundedSender<RunEvent>>,
}

impl App {
    /// 初始化应用
    ///
    /// API Key 优先使用配置（环境变量），其次使用设置文件中保存的。
    pub async fn initialize(config: Config) -> Result<Self> {
        logger::init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let store = SettingsStore::new(&config.settings_file);
        let settings = store.load().await?;

        let api_key = if !config.llm_api_key.trim().is_empty() {
            if config.remember_api_key {
                store.remember_api_key(&config.llm_api_key).await?;
                info!("🔑 API Key 已保存到 {}", store.path().display());
            }
            config.llm_api_key.clone()
        } else if let Some(saved) = settings.api_key.filter(|k| !k.trim().is_empty()) {
            info!("🔑 使用设置文件中保存的 API Key");
            saved
        } else {
            String::new()
        };

        let backend = Arc::new(LlmService::with_api_key(&config, &api_key));
        Ok(Self::with_backend(config, backend))
    }

    /// 使用指定的补全后端
    pub fn with_backend(config: Config, backend: Arc<dyn CompletionBackend>) -> Self {
        let store = SettingsStore::new(&config.settings_file);
        Self {
            config,
            store,
            backend,
            events: None,
        }
    }

    /// 订阅进度事件
    pub fn with_events(mut self, sender: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// 运行应用主逻辑
    pub async fn run(&self, cancel: CancellationToken) -> Result<RunOutcome> {
        let source_path = self
            .config
            .source_path
            .as_deref()
            .ok_or(AppError::Config(ConfigError::MissingSourcePath))?;
        let source_path = Path::new(source_path);

        // 加载输入
        let taxonomy = self.load_taxonomy().await?;
        let document = load_document(source_path).await?;
        let blocks = exercise_extractor::extract(&document);

        if blocks.is_empty() {
            warn!("⚠️ 文档中没有找到任何题目 (ex, bt, vd)，程序结束");
            return Err(AppError::Business(BusinessError::NoExercises).into());
        }
        log_inputs_loaded(taxonomy.leaves.len(), blocks.len());

        let client = ClassificationClient::new(
            self.backend.clone(),
            BackoffPolicy::from_config(&self.config),
            self.config.effective_preview_chars(),
        );
        if !client.has_credentials() {
            return Err(AppError::Config(ConfigError::MissingApiKey).into());
        }

        // 校验 Key
        info!("🔑 正在校验 API Key...");
        match client.verify_credentials().await {
            Ok(()) => info!("✓ API Key 可用"),
            Err(ClassifyError::QuotaExceeded) => warn!("⚠️ 配额暂时耗尽，处理中会自动冷却"),
            Err(e) => {
                error!("❌ API Key 校验失败: {}", e);
                return Err(AppError::Classify(e).into());
            }
        }

        // 逐题处理
        let flow = ExerciseFlow::new(client, self.config.use_extended_reasoning, self.config.verbose_logging);
        let mut processor = RunProcessor::from_config(flow, &self.config);
        if let Some(sender) = &self.events {
            processor = processor.with_events(sender.clone());
        }

        let outcome = processor.start(&document, &blocks, &taxonomy, &cancel).await?;

        match &outcome {
            RunOutcome::Completed { document, results } => {
                let paths = output_paths(source_path);
                tokio::fs::write(&paths.document, document)
                    .await
                    .map_err(|e| AppError::file_write_failed(paths.document.display().to_string(), e))?;
                info!("💾 标注后的文档: {}", paths.document.display());

                let writer = ReportWriter::with_path(&paths.report);
                writer.write(results).await?;
                info!("💾 报表: {}", writer.path().display());

                print_final_stats(&RunStats::from_results(results), &self.config.output_log_file);
            }
            RunOutcome::Cancelled { processed } => {
                warn!("🛑 处理已取消，已完成的 {} 道题不会写回", processed);
            }
            RunOutcome::Failed { error, results } => {
                error!("❌ 处理终止: {} (已完成 {} 道题，未写回)", error, results.len());
            }
        }

        Ok(outcome)
    }

    /// 加载 MapID
    ///
    /// 命令行指定的 MapID 至少要有一个题型才会被缓存；未指定时使用缓存。
    async fn load_taxonomy(&self) -> Result<Taxonomy> {
        if let Some(path) = self.config.taxonomy_path.as_deref() {
            info!("\n📁 正在加载 MapID...");
            let path = Path::new(path);
            let content = load_document(path).await?;
            let taxonomy = build_taxonomy(&content);

            if taxonomy.is_empty() {
                return Err(AppError::Business(BusinessError::EmptyTaxonomy).into());
            }

            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            self.store.remember_taxonomy(&file_name, &content).await?;
            return Ok(taxonomy);
        }

        let settings = self.store.load().await?;
        let cached = settings
            .taxonomy
            .ok_or(AppError::Config(ConfigError::MissingTaxonomy))?;
        info!("📁 使用缓存的 MapID: {}", cached.file_name);

        let taxonomy = build_taxonomy(&cached.content);
        if taxonomy.is_empty() {
            return Err(AppError::Business(BusinessError::EmptyTaxonomy).into());
        }
        Ok(taxonomy)
    }
}
