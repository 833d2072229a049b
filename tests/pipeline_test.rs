mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{probe_ok, reply, ScriptedBackend, MAPID};
use exercise_tagger::error::BackendError;
use exercise_tagger::orchestrator::CooldownPolicy;
use exercise_tagger::services::exercise_extractor::extract;
use exercise_tagger::services::{build_taxonomy, BackoffPolicy, ClassificationClient};
use exercise_tagger::{App, ClassifyError, Config, ExerciseFlow, RunEvent, RunOutcome, RunProcessor, RunState, SettingsStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn processor(backend: Arc<ScriptedBackend>, pacing: Duration, cooldown: CooldownPolicy) -> RunProcessor {
    let client = ClassificationClient::new(backend, BackoffPolicy::immediate(3), 1000);
    RunProcessor::new(ExerciseFlow::new(client, false, false), pacing, cooldown)
}

fn quick(backend: Arc<ScriptedBackend>) -> RunProcessor {
    processor(backend, Duration::ZERO, CooldownPolicy::default())
}

fn test_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::default();
    config.settings_file = dir.path().join("settings.toml").to_string_lossy().to_string();
    config.output_log_file = dir.path().join("output.txt").to_string_lossy().to_string();
    config.pacing_delay_ms = 0;
    config.transport_backoff_ms = 0;
    config.rate_limit_backoff_ms = 0;
    config.cooldown_tick_ms = 0;
    config
}

#[tokio::test]
async fn test_single_exercise_is_annotated_and_reported() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("de.tex");
    let mapid = dir.path().join("mapid.tex");
    std::fs::write(&source, "Intro\n\\begin{ex}2+2=4\\end{ex}\nOutro").unwrap();
    std::fs::write(&mapid, MAPID).unwrap();

    let mut config = test_config(&dir);
    config.source_path = Some(source.to_string_lossy().to_string());
    config.taxonomy_path = Some(mapid.to_string_lossy().to_string());

    let backend = Arc::new(ScriptedBackend::new(vec![probe_ok(), reply("3", "H", 0.9)]));
    let app = App::with_backend(config.clone(), backend.clone());
    let outcome = app.run(CancellationToken::new()).await.unwrap();

    let RunOutcome::Completed { document, results } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(document, "Intro\n\\begin{ex}%[10T1H2-3]2+2=4\\end{ex}\nOutro");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status.as_str(), "valid");
    assert_eq!(results[0].confidence, "90%");

    let tagged = std::fs::read_to_string(dir.path().join("de_tagged.tex")).unwrap();
    assert_eq!(tagged, document);

    let report = std::fs::read_to_string(dir.path().join("de_report.csv")).unwrap();
    assert_eq!(
        report,
        "\u{FEFF}Index,Content,ID,Status,Difficulty,Confidence\n1,\"2+2=4\",\"[10T1H2-3]\",valid,H,90%"
    );

    // MapID 已被缓存
    let settings = SettingsStore::new(&config.settings_file).load().await.unwrap();
    assert_eq!(settings.taxonomy.unwrap().file_name, "mapid.tex");
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_cached_taxonomy_is_used_without_path() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("de.tex");
    std::fs::write(&source, "\\begin{bt}x\\end{bt}").unwrap();

    let mut config = test_config(&dir);
    config.source_path = Some(source.to_string_lossy().to_string());
    SettingsStore::new(&config.settings_file)
        .remember_taxonomy("cached.tex", MAPID)
        .await
        .unwrap();

    let backend = Arc::new(ScriptedBackend::new(vec![probe_ok(), reply("4", "N", 0.5)]));
    let outcome = App::with_backend(config, backend).run(CancellationToken::new()).await.unwrap();

    let RunOutcome::Completed { document, .. } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(document, "\\begin{bt}%[10T1N2-4]x\\end{bt}");
}

#[tokio::test]
async fn test_missing_taxonomy_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("de.tex");
    std::fs::write(&source, "\\begin{ex}x\\end{ex}").unwrap();

    let mut config = test_config(&dir);
    config.source_path = Some(source.to_string_lossy().to_string());

    let backend = Arc::new(ScriptedBackend::new(vec![]));
    let err = App::with_backend(config, backend.clone()).run(CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().contains("MapID"));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_fallback_replaces_invalid_primary() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{vd}y\\end{vd}";
    let blocks = extract(document);

    let backend = Arc::new(ScriptedBackend::new(vec![reply("9", "H", 0.7), reply("4", "V", 0.6)]));
    let outcome = quick(backend.clone())
        .start(document, &blocks, &taxonomy, &CancellationToken::new())
        .await
        .unwrap();

    let RunOutcome::Completed { document, results } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(document, "\\begin{vd}%[10T1V2-4]y\\end{vd}");
    assert_eq!(results[0].status.as_str(), "valid");
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_unresolved_classification_is_written_as_warning() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{ex}z\\end{ex}";
    let blocks = extract(document);

    let backend = Arc::new(ScriptedBackend::new(vec![reply("9", "C", 0.4), reply("8", "C", 0.4)]));
    let outcome = quick(backend).start(document, &blocks, &taxonomy, &CancellationToken::new()).await.unwrap();

    let RunOutcome::Completed { document, results } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(document, "\\begin{ex}%[10T1C2-9]z\\end{ex}");
    assert_eq!(results[0].status.as_str(), "warning");
}

#[tokio::test]
async fn test_authentication_failure_aborts_run() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{ex}a\\end{ex}\n\\begin{ex}b\\end{ex}";
    let blocks = extract(document);

    let backend = Arc::new(ScriptedBackend::new(vec![
        reply("3", "N", 0.9),
        Err(BackendError::with_status(401, "API_KEY_INVALID")),
        reply("3", "N", 0.9),
    ]));
    let mut processor = quick(backend.clone());
    let outcome = processor.start(document, &blocks, &taxonomy, &CancellationToken::new()).await.unwrap();

    match outcome {
        RunOutcome::Failed { error, results } => {
            assert_eq!(error, ClassifyError::InvalidCredentials);
            assert_eq!(results.len(), 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(processor.state(), RunState::Failed);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_transport_failure_becomes_error_row() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{ex}a\\end{ex}|\\begin{ex}b\\end{ex}";
    let blocks = extract(document);

    let backend = Arc::new(ScriptedBackend::new(vec![
        Err(BackendError::new("connection reset")),
        Err(BackendError::new("connection reset")),
        Err(BackendError::new("connection reset")),
        reply("4", "H", 1.0),
    ]));
    let outcome = quick(backend).start(document, &blocks, &taxonomy, &CancellationToken::new()).await.unwrap();

    let RunOutcome::Completed { document, results } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(document, "\\begin{ex}a\\end{ex}|\\begin{ex}%[10T1H2-4]b\\end{ex}");
    assert_eq!(results[0].code, "[ERROR]");
    assert_eq!(results[0].confidence, "0%");
    assert_eq!(results[0].difficulty, "N/A");
    assert_eq!(results[1].confidence, "100%");
}

#[tokio::test]
async fn test_quota_cooldown_retries_same_exercise() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{ex}a\\end{ex}";
    let blocks = extract(document);

    let backend = Arc::new(ScriptedBackend::new(vec![
        Err(BackendError::with_status(429, "quota")),
        Err(BackendError::with_status(429, "quota")),
        Err(BackendError::with_status(429, "quota")),
        reply("3", "V", 0.8),
    ]));
    let cooldown = CooldownPolicy {
        seconds: 2,
        tick: Duration::ZERO,
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut processor = processor(backend.clone(), Duration::ZERO, cooldown).with_events(tx);

    let outcome = processor.start(document, &blocks, &taxonomy, &CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.state(), RunState::Completed);
    drop(processor);

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert!(events.contains(&RunEvent::StateChanged(RunState::AwaitingCooldown)));
    let ticks: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            RunEvent::CooldownTick { remaining_secs, .. } => Some(*remaining_secs),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![2, 1]);
    assert_eq!(events.last(), Some(&RunEvent::StateChanged(RunState::Completed)));
    assert_eq!(backend.calls(), 4);
}

#[tokio::test]
async fn test_cancellation_discards_results() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{ex}a\\end{ex}\\begin{ex}b\\end{ex}";
    let blocks = extract(document);

    let backend = Arc::new(ScriptedBackend::new(vec![reply("3", "N", 0.9), reply("3", "N", 0.9)]));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut processor = processor(backend.clone(), Duration::from_secs(3600), CooldownPolicy::default()).with_events(tx);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if matches!(event, RunEvent::ExerciseFinished(_)) {
                trigger.cancel();
            }
        }
    });

    let outcome = processor.start(document, &blocks, &taxonomy, &cancel).await.unwrap();
    assert_eq!(outcome, RunOutcome::Cancelled { processed: 1 });
    assert_eq!(processor.state(), RunState::Cancelled);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_rate_limited_fallback_enters_cooldown_and_retries() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{ex}z\\end{ex}";
    let blocks = extract(document);

    // 首次结果不在 MapID 中，纠错请求连续限流
    let backend = Arc::new(ScriptedBackend::new(vec![
        reply("9", "C", 0.4),
        Err(BackendError::with_status(429, "quota")),
        Err(BackendError::with_status(429, "quota")),
        Err(BackendError::with_status(429, "quota")),
        reply("3", "V", 0.8),
    ]));
    let cooldown = CooldownPolicy {
        seconds: 1,
        tick: Duration::ZERO,
    };
    let mut processor = processor(backend.clone(), Duration::ZERO, cooldown);

    let outcome = processor.start(document, &blocks, &taxonomy, &CancellationToken::new()).await.unwrap();

    let RunOutcome::Completed { document, results } = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(document, "\\begin{ex}%[10T1V2-3]z\\end{ex}");
    assert_eq!(results[0].status.as_str(), "valid");
    assert_eq!(backend.calls(), 5);
}

#[tokio::test]
async fn test_cancellation_interrupts_retry_backoff() {
    let taxonomy = build_taxonomy(MAPID);
    let document = "\\begin{ex}a\\end{ex}";
    let blocks = extract(document);

    let backend = Arc::new(ScriptedBackend::new(vec![
        Err(BackendError::with_status(429, "quota")),
        Err(BackendError::with_status(429, "quota")),
        Err(BackendError::with_status(429, "quota")),
    ]));
    let backoff = BackoffPolicy {
        max_attempts: 3,
        transport_base: Duration::from_secs(3600),
        rate_limit_base: Duration::from_secs(3600),
    };
    let client = ClassificationClient::new(backend.clone(), backoff, 1000);
    let mut processor = RunProcessor::new(ExerciseFlow::new(client, false, false), Duration::ZERO, CooldownPolicy::default());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        processor.start(document, &blocks, &taxonomy, &cancel),
    )
    .await
    .expect("cancellation did not interrupt the backoff wait")
    .unwrap();

    assert_eq!(outcome, RunOutcome::Cancelled { processed: 0 });
    assert_eq!(processor.state(), RunState::Cancelled);
    assert_eq!(backend.calls(), 1);
}
