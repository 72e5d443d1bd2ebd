use super::*;
use crate::client::ApiResponse;
use crate::lookup::GameLookupClient;
use crate::memo::FileNotFoundMemo;
use crate::test_support::{MemoryStore, ScriptedApi, full_game, not_found, rom};
use futures::StreamExt;
use tokio::time::Duration;

struct Harness {
    api: Arc<ScriptedApi>,
    store: Arc<MemoryStore>,
    memo: Arc<FileNotFoundMemo>,
    scheduler: BatchScheduler,
}

fn harness(api: ScriptedApi, workers: usize) -> Harness {
    let api = Arc::new(api);
    let store = Arc::new(MemoryStore::new());
    let memo = Arc::new(FileNotFoundMemo::in_memory());
    let fetcher = ArtworkFetcher::new(
        GameLookupClient::new(api.clone()),
        store.clone(),
        memo.clone(),
    );
    let scheduler = BatchScheduler::new(Arc::new(fetcher), memo.clone(), workers);
    Harness {
        api,
        store,
        memo,
        scheduler,
    }
}

fn jobs(names: &[&str]) -> Vec<RomJob> {
    names
        .iter()
        .map(|name| RomJob {
            rom: rom("snes", name),
            system_id: 4,
            system_name: "Super Nintendo".to_string(),
        })
        .collect()
}

fn numbered_jobs(n: usize) -> Vec<RomJob> {
    let names: Vec<String> = (1..=n).map(|i| format!("game{i}.sfc")).collect();
    jobs(&names.iter().map(String::as_str).collect::<Vec<_>>())
}

/// Full game for every ROM except `fatal_rom`, which gets `fatal_status`.
fn api_failing_on(fatal_rom: &'static str, fatal_status: u16) -> ScriptedApi {
    ScriptedApi::from_fn(move |q, _| {
        if q.rom_name.as_deref() == Some(fatal_rom) {
            ApiResponse::new(fatal_status, "")
        } else {
            full_game("1")
        }
    })
}

async fn run_collect(h: &Harness, jobs: Vec<RomJob>) -> (BatchState, Vec<BatchEvent>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let state = h.scheduler.run(jobs, tx, CancellationToken::new()).await;
    let mut events = Vec::new();
    while let Some(e) = rx.recv().await {
        events.push(e);
    }
    (state, events)
}

fn assert_single_terminal_last(events: &[BatchEvent]) {
    let terminal: Vec<_> = events.iter().filter(|e| e.is_complete).collect();
    assert_eq!(terminal.len(), 1);
    assert!(events.last().unwrap().is_complete);
}

fn assert_monotonic(events: &[BatchEvent]) {
    for pair in events.windows(2) {
        assert!(pair[1].progress.completed_roms >= pair[0].progress.completed_roms);
    }
}

#[tokio::test]
async fn test_sequential_run_completes() {
    let h = harness(ScriptedApi::always(full_game("1")), 1);
    assert_eq!(h.scheduler.state(), BatchState::Idle);

    let (state, events) = run_collect(&h, jobs(&["a.sfc", "b.sfc", "c.sfc"])).await;
    assert_eq!(state, BatchState::Completed);
    assert_eq!(h.scheduler.state(), BatchState::Completed);

    assert_eq!(events.len(), 4);
    let completed: Vec<usize> = events.iter().map(|e| e.progress.completed_roms).collect();
    assert_eq!(completed, vec![1, 2, 3, 3]);
    let current: Vec<_> = events[..3]
        .iter()
        .map(|e| e.progress.current_rom.clone().unwrap())
        .collect();
    assert_eq!(current, vec!["a.sfc", "b.sfc", "c.sfc"]);
    assert!(events[..3].iter().all(|e| matches!(e.outcome, FetchOutcome::Success { .. })));

    let last = events.last().unwrap();
    assert!(last.is_complete);
    assert_eq!(last.outcome, FetchOutcome::Skipped);
    assert_eq!(last.progress.current_rom, None);
    assert_eq!(last.progress.current_system, None);
    assert_eq!(
        last.progress.systems["snes"],
        SystemProgress {
            total: 3,
            completed: 3
        }
    );
    assert_eq!(last.progress.fraction(), 1.0);
}

#[tokio::test]
async fn test_sequential_fatal_stops_before_later_jobs() {
    let h = harness(api_failing_on("game3.sfc", 403), 1);
    let (state, events) = run_collect(&h, numbered_jobs(5)).await;

    assert_eq!(state, BatchState::Aborted);
    assert_single_terminal_last(&events);
    assert_eq!(events.len(), 4);

    // The failing job reports like any other before the run stops
    let fatal = &events[2];
    assert!(!fatal.is_complete);
    assert!(matches!(fatal.outcome, FetchOutcome::AuthError { .. }));
    assert_eq!(fatal.progress.completed_roms, 3);
    assert_eq!(fatal.progress.current_rom.as_deref(), Some("game3.sfc"));

    let last = events.last().unwrap();
    assert!(matches!(last.outcome, FetchOutcome::AuthError { .. }));
    assert_eq!(last.progress.completed_roms, 3);
    assert_eq!(last.progress.current_rom, None);
    // Jobs 4 and 5 never reached the API
    assert_eq!(h.api.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_fatal_emits_one_terminal_event() {
    let h = harness(
        api_failing_on("game3.sfc", 430).with_latency(Duration::from_millis(100)),
        2,
    );
    let (state, events) = run_collect(&h, numbered_jobs(5)).await;

    assert_eq!(state, BatchState::Aborted);
    assert_single_terminal_last(&events);
    assert_monotonic(&events);

    let last = events.last().unwrap();
    assert!(matches!(last.outcome, FetchOutcome::QuotaExceeded { .. }));
    assert!(last.progress.completed_roms <= 5);
    assert!(h.api.calls() <= 5);

    let fatal: Vec<_> = events[..events.len() - 1]
        .iter()
        .filter(|e| e.outcome.is_fatal())
        .collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].progress.current_rom.as_deref(), Some("game3.sfc"));
    assert_eq!(fatal[0].progress.completed_roms, last.progress.completed_roms);
}

#[tokio::test(start_paused = true)]
async fn test_hung_jobs_become_errors() {
    let h = harness(
        ScriptedApi::always(full_game("1")).with_latency(Duration::from_secs(700)),
        2,
    );
    let (state, events) = run_collect(&h, numbered_jobs(2)).await;

    assert_eq!(state, BatchState::Completed);
    assert_eq!(events.len(), 3);
    assert_single_terminal_last(&events);
    assert!(events[..2]
        .iter()
        .all(|e| matches!(e.outcome, FetchOutcome::Error { .. })));
    assert_eq!(events[2].progress.completed_roms, 2);
    assert_eq!(events[2].outcome, FetchOutcome::Skipped);
    assert!(h.memo.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_sequential_job_timeout_moves_on() {
    let mut h = harness(
        ScriptedApi::always(full_game("1")).with_latency(Duration::from_secs(20)),
        1,
    );
    h.scheduler = h.scheduler.clone().with_job_timeout(Duration::from_secs(10));

    let (state, events) = run_collect(&h, numbered_jobs(2)).await;
    assert_eq!(state, BatchState::Completed);
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0].outcome, FetchOutcome::Error { message } if message.contains("timed out")));
    assert_eq!(events[1].progress.completed_roms, 2);
    assert!(matches!(events[1].outcome, FetchOutcome::Error { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_no_admission_after_fatal() {
    let h = harness(
        api_failing_on("game1.sfc", 403).with_latency(Duration::from_millis(100)),
        2,
    );
    let (state, _) = run_collect(&h, numbered_jobs(6)).await;
    assert_eq!(state, BatchState::Aborted);

    // Let abandoned work settle; nothing new may start
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(h.api.calls() <= 4);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_run_completes() {
    let h = harness(
        ScriptedApi::always(full_game("1")).with_latency(Duration::from_millis(50)),
        3,
    );
    let (state, events) = run_collect(&h, numbered_jobs(6)).await;

    assert_eq!(state, BatchState::Completed);
    assert_eq!(events.len(), 7);
    assert_single_terminal_last(&events);
    let completed: Vec<usize> = events[..6].iter().map(|e| e.progress.completed_roms).collect();
    assert_eq!(completed, vec![1, 2, 3, 4, 5, 6]);

    let mut roms: Vec<String> = events[..6]
        .iter()
        .map(|e| e.progress.current_rom.clone().unwrap())
        .collect();
    roms.sort();
    assert_eq!(roms, (1..=6).map(|i| format!("game{i}.sfc")).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_not_found_is_recorded_and_skipped_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Homebrew.sfc");
    std::fs::write(&path, b"homebrew").unwrap();
    let mut job = jobs(&["Homebrew.sfc"]).remove(0);
    job.rom.path = path;

    let h = harness(ScriptedApi::always(not_found()), 1);
    let (_, events) = run_collect(&h, vec![job.clone()]).await;
    assert_eq!(events[0].outcome, FetchOutcome::NotFound);
    assert!(h.memo.contains("snes/Homebrew.sfc"));
    let calls = h.api.calls();

    let (_, events) = run_collect(&h, vec![job]).await;
    assert_eq!(events[0].outcome, FetchOutcome::Skipped);
    assert_eq!(h.api.calls(), calls);
}

#[tokio::test]
async fn test_errors_do_not_stop_the_batch() {
    let h = harness(api_failing_on("game2.sfc", 500), 1);
    let (state, events) = run_collect(&h, numbered_jobs(3)).await;
    assert_eq!(state, BatchState::Completed);
    assert_eq!(events.len(), 4);
    assert!(matches!(events[1].outcome, FetchOutcome::Error { .. }));
    // Generic errors are not remembered as misses
    assert!(h.memo.is_empty());
}

#[tokio::test]
async fn test_second_run_downloads_nothing() {
    let h = harness(ScriptedApi::always(full_game("1")), 2);
    run_collect(&h, numbered_jobs(4)).await;
    let saves = h.store.saves().len();
    assert_eq!(saves, 12);

    let (state, events) = run_collect(&h, numbered_jobs(4)).await;
    assert_eq!(state, BatchState::Completed);
    assert!(events.iter().all(|e| e.outcome == FetchOutcome::Skipped));
    assert_eq!(h.store.saves().len(), saves);
}

#[tokio::test]
async fn test_empty_batch() {
    let h = harness(ScriptedApi::always(full_game("1")), 4);
    let (state, events) = run_collect(&h, Vec::new()).await;
    assert_eq!(state, BatchState::Completed);
    assert_eq!(events.len(), 1);
    assert!(events[0].is_complete);
    assert_eq!(events[0].progress.fraction(), 0.0);
}

#[tokio::test(start_paused = true)]
async fn test_external_cancel_aborts() {
    let h = harness(
        ScriptedApi::always(full_game("1")).with_latency(Duration::from_millis(100)),
        1,
    );
    let cancel = CancellationToken::new();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let scheduler = h.scheduler.clone();
    let run_cancel = cancel.clone();
    let handle = tokio::spawn(async move { scheduler.run(numbered_jobs(5), tx, run_cancel).await });

    let first = rx.recv().await.unwrap();
    assert_eq!(first.progress.completed_roms, 1);
    cancel.cancel();

    let mut rest = Vec::new();
    while let Some(e) = rx.recv().await {
        rest.push(e);
    }
    assert_eq!(handle.await.unwrap(), BatchState::Aborted);
    assert_single_terminal_last(&rest);
    assert!(rest.last().unwrap().progress.completed_roms < 5);
}

#[tokio::test]
async fn test_event_stream_is_lazy_and_ends_after_terminal() {
    let h = harness(ScriptedApi::always(full_game("1")), 2);
    let stream = h.scheduler.events(numbered_jobs(3), CancellationToken::new());

    tokio::task::yield_now().await;
    assert_eq!(h.api.calls(), 0);
    assert_eq!(h.scheduler.state(), BatchState::Idle);

    let events: Vec<BatchEvent> = stream.collect().await;
    assert_eq!(events.len(), 4);
    assert_single_terminal_last(&events);
    assert_eq!(h.api.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_stream_cancels_run() {
    let h = harness(
        ScriptedApi::always(full_game("1")).with_latency(Duration::from_millis(100)),
        1,
    );
    let parent = CancellationToken::new();
    let mut stream = h.scheduler.events(numbered_jobs(10), parent.clone());

    let first = stream.next().await.unwrap();
    assert!(!first.is_complete);
    drop(stream);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(h.api.calls() < 10);
    assert_eq!(h.scheduler.state(), BatchState::Aborted);
    assert!(!parent.is_cancelled());
}

#[test]
fn test_jobs_from_systems() {
    let systems = vec![
        RomSystem {
            system_id: 1,
            folder_name: "genesis".to_string(),
            display_name: "Sega Genesis".to_string(),
            roms: vec![rom("genesis", "sonic.md")],
        },
        RomSystem {
            system_id: 4,
            folder_name: "snes".to_string(),
            display_name: "Super Nintendo".to_string(),
            roms: vec![rom("snes", "a.sfc"), rom("snes", "b.sfc")],
        },
    ];
    let jobs = jobs_from_systems(&systems);
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].system_id, 1);
    assert_eq!(jobs[2].rom.name, "b.sfc");
    assert_eq!(jobs[2].system_name, "Super Nintendo");

    let progress = BatchProgress::new(&jobs);
    assert_eq!(progress.total_roms, 3);
    assert_eq!(progress.systems["snes"].total, 2);
    assert_eq!(progress.systems["genesis"].total, 1);
}
