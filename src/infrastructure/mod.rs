//! 基础设施层
//!
//! 持有跨运行的本地状态，只暴露读写能力

pub mod settings_store;

pub use settings_store::{CachedTaxonomy, PersistedSettings, SettingsStore};
