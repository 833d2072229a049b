//! 本地设置存储 - 基础设施层
//!
//! 在两次运行之间保存 API Key 和最近一次成功解析的 MapID 原文。
//! 文件格式为 TOML，不存在时视为空设置。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::error::{AppError, AppResult, FileError};

/// 缓存的 MapID 原文
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTaxonomy {
    /// 来源文件名（仅用于显示）
    pub file_name: String,
    pub content: String,
}

/// 持久化的设置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<CachedTaxonomy>,
}

/// 设置文件
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取设置，文件不存在时返回空设置
    pub async fn load(&self) -> AppResult<PersistedSettings> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("设置文件不存在，使用空设置: {}", self.path.display());
                return Ok(PersistedSettings::default());
            }
            Err(e) => return Err(AppError::file_read_failed(self.display(), e)),
        };

        toml::from_str(&content).map_err(|source| {
            AppError::File(FileError::TomlParseFailed {
                path: self.display(),
                source,
            })
        })
    }

    pub async fn save(&self, settings: &PersistedSettings) -> AppResult<()> {
        let content = toml::to_string(settings)
            .map_err(|source| AppError::File(FileError::TomlSerializeFailed { source }))?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::file_write_failed(self.display(), e))
    }

    /// 缓存 MapID 原文
    pub async fn remember_taxonomy(&self, file_name: &str, content: &str) -> AppResult<()> {
        let mut settings = self.load().await?;
        settings.taxonomy = Some(CachedTaxonomy {
            file_name: file_name.to_string(),
            content: content.to_string(),
        });
        self.save(&settings).await?;
        debug!("已缓存 MapID: {}", file_name);
        Ok(())
    }

    pub async fn remember_api_key(&self, api_key: &str) -> AppResult<()> {
        let mut settings = self.load().await?;
        settings.api_key = Some(api_key.to_string());
        self.save(&settings).await
    }

    /// 清除缓存的 MapID
    pub async fn clear_taxonomy(&self) -> AppResult<()> {
        let mut settings = self.load().await?;
        if settings.taxonomy.take().is_some() {
            self.save(&settings).await?;
            info!("🗑️ 已清除缓存的 MapID");
        }
        Ok(())
    }

    pub async fn clear_api_key(&self) -> AppResult<()> {
        let mut settings = self.load().await?;
        if settings.api_key.take().is_some() {
            self.save(&settings).await?;
            info!("🗑️ 已清除保存的 API Key");
        }
        Ok(())
    }

    /// 删除整个设置文件
    pub async fn reset(&self) -> AppResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("🗑️ 已删除设置文件: {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::file_write_failed(self.display(), e)),
        }
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.toml"))
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).load().await.unwrap(), PersistedSettings::default());
    }

    #[tokio::test]
    async fn test_taxonomy_cache_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        store.remember_api_key("key-123").await.unwrap();
        store.remember_taxonomy("mapid.tex", "-[10] Lớp 10\n").await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("key-123"));
        let cached = loaded.taxonomy.unwrap();
        assert_eq!(cached.file_name, "mapid.tex");
        assert_eq!(cached.content, "-[10] Lớp 10\n");

        store.clear_taxonomy().await.unwrap();
        let loaded = store.load().await.unwrap();
        assert!(loaded.taxonomy.is_none());
        assert_eq!(loaded.api_key.as_deref(), Some("key-123"));

        store.clear_api_key().await.unwrap();
        assert_eq!(store.load().await.unwrap(), PersistedSettings::default());
    }

    #[tokio::test]
    async fn test_reset_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.remember_api_key("k").await.unwrap();
        assert!(store.path().exists());

        store.reset().await.unwrap();
        assert!(!store.path().exists());
        // 再次删除不报错
        store.reset().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::write(store.path(), "api_key = [unterminated").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::TomlParseFailed { .. })));
    }
}
