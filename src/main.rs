use anyhow::Result;
use exercise_tagger::{logger, App, Config, RunOutcome, SettingsStore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logger::init();

    // 维护命令：清除缓存后直接退出
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let clear_map = take_flag(&mut args, "--clear-map");
    let clear_key = take_flag(&mut args, "--clear-key");
    let reset = take_flag(&mut args, "--reset-settings");

    // 加载配置
    let config = Config::from_env().with_args(args);

    if clear_map || clear_key || reset {
        let store = SettingsStore::new(&config.settings_file);
        if reset {
            store.reset().await?;
        } else {
            if clear_map {
                store.clear_taxonomy().await?;
            }
            if clear_key {
                store.clear_api_key().await?;
            }
        }
        return Ok(());
    }

    // Ctrl+C 取消
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 收到 Ctrl+C，当前题目完成后停止...");
            trigger.cancel();
        }
    });

    // 初始化并运行应用
    let app = App::initialize(config).await?;
    match app.run(cancel).await? {
        RunOutcome::Failed { error, .. } => Err(error.into()),
        _ => {
            info!("👋 程序结束");
            Ok(())
        }
    }
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}
