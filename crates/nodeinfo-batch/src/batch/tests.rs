use super::*;
use core::{
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use serde::{Serializer, ser::Error as _};
use serde_json::Value;
use std::{
    collections::HashSet,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio_util::sync::CancellationToken;

struct Run {
    summary: Result<BatchSummary>,
    records: Vec<Value>,
    diagnostics: Arc<MemoryDiagnostics>,
}

impl Run {
    fn ids(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r["hostname"].as_str().unwrap().to_owned())
            .collect()
    }
}

async fn run<O: Operation>(input: &str, workers: usize, deadline: &Deadline, op: O) -> Run {
    let pool = PoolConfig {
        workers,
        ..PoolConfig::default()
    };
    let diagnostics = Arc::new(MemoryDiagnostics::default());
    let mut output = Vec::new();

    let summary = run_batch(
        &pool,
        RecordFields::DISCOVERY,
        deadline,
        input.as_bytes(),
        &mut output,
        op,
        diagnostics.clone(),
    )
    .await;

    let records = output
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice(line).unwrap())
        .collect();

    Run {
        summary,
        records,
        diagnostics,
    }
}

fn numbered(n: usize) -> String {
    (0..n).map(|i| format!("host-{i}.example\n")).collect()
}

async fn reverse(_: CancellationToken, id: String) -> core::result::Result<String, String> {
    Ok(id.chars().rev().collect())
}

#[tokio::test]
async fn every_identifier_yields_one_record() {
    let run = run("a\nab\nabc\n", 2, &Deadline::never(), reverse).await;

    let summary = run.summary.unwrap();
    assert_eq!(summary.inputs, 3);
    assert_eq!(summary.emitted, 3);
    assert_eq!(summary.abandoned, 0);
    assert_eq!(summary.state, RunState::Done);

    let mut records: Vec<_> = run
        .records
        .iter()
        .map(|r| {
            (
                r["hostname"].as_str().unwrap().to_owned(),
                r["links"].as_str().unwrap().to_owned(),
            )
        })
        .collect();
    records.sort();
    assert_eq!(
        records,
        [
            ("a".to_owned(), "a".to_owned()),
            ("ab".to_owned(), "ba".to_owned()),
            ("abc".to_owned(), "cba".to_owned()),
        ]
    );
    assert!(run.records.iter().all(|r| r["err"].is_null()));
    assert!(run.diagnostics.reports().is_empty());
}

#[tokio::test]
async fn item_failure_is_recorded_and_batch_continues() {
    let calls = Arc::new(AtomicUsize::new(0));
    let op = {
        let calls = Arc::clone(&calls);
        move |_: CancellationToken, id: String| {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call == 2 {
                    Err(format!("lookup failed for {id}"))
                } else {
                    Ok(id)
                }
            }
        }
    };

    let run = run(&numbered(5), 3, &Deadline::never(), op).await;

    let summary = run.summary.unwrap();
    assert_eq!(summary.emitted, 5);
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    let failed: Vec<_> = run.records.iter().filter(|r| !r["err"].is_null()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0]["links"], "");
    assert!(
        failed[0]["err"]
            .as_str()
            .unwrap()
            .starts_with("lookup failed for host-")
    );
}

#[tokio::test]
async fn deadline_partitions_identifiers_between_output_and_diagnostics() {
    let input = numbered(5);
    let deadline = Deadline::after(Duration::from_millis(150));
    let op = |_: CancellationToken, id: String| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, String>(id)
    };

    let run = run(&input, 1, &deadline, op).await;

    let summary = run.summary.as_ref().unwrap();
    let emitted = run.ids();
    let abandoned = run.diagnostics.ids();
    assert!(emitted.len() < 5);
    assert!(!abandoned.is_empty());
    assert_eq!(summary.emitted, emitted.len());
    assert_eq!(summary.abandoned, abandoned.len());

    let emitted_set: HashSet<_> = emitted.iter().cloned().collect();
    let abandoned_set: HashSet<_> = abandoned.iter().cloned().collect();
    assert_eq!(emitted_set.len(), emitted.len());
    assert_eq!(abandoned_set.len(), abandoned.len());
    assert!(emitted_set.is_disjoint(&abandoned_set));

    let all: HashSet<_> = input.lines().map(str::to_owned).collect();
    let seen: HashSet<_> = emitted_set.union(&abandoned_set).cloned().collect();
    assert_eq!(seen, all);

    assert!(
        run.diagnostics
            .reports()
            .iter()
            .any(|(_, reason)| *reason == Abandoned::Undispatched(Cause::DeadlineExceeded))
    );
}

#[tokio::test]
async fn empty_input_writes_nothing() {
    let run = run("", 4, &Deadline::never(), reverse).await;

    let summary = run.summary.unwrap();
    assert_eq!(summary.inputs, 0);
    assert_eq!(summary.emitted, 0);
    assert_eq!(summary.state, RunState::Done);
    assert!(run.records.is_empty());
    assert!(run.diagnostics.reports().is_empty());
}

#[tokio::test]
async fn cancelled_before_start_reports_everything_once() {
    let input = numbered(20);
    let deadline = Deadline::never();
    deadline.cancel();

    let calls = Arc::new(AtomicUsize::new(0));
    let op = {
        let calls = Arc::clone(&calls);
        move |_: CancellationToken, id: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, String>(id) }
        }
    };

    let run = run(&input, 4, &deadline, op).await;

    assert_eq!(run.summary.unwrap().emitted, 0);
    assert!(run.records.is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let mut abandoned = run.diagnostics.ids();
    abandoned.sort();
    let mut expected: Vec<_> = input.lines().map(str::to_owned).collect();
    expected.sort();
    assert_eq!(abandoned, expected);
    assert!(
        run.diagnostics
            .reports()
            .iter()
            .all(|(_, reason)| *reason == Abandoned::Undispatched(Cause::Cancelled))
    );
}

#[tokio::test]
async fn in_flight_calls_never_exceed_worker_count() {
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let op = {
        let current = Arc::clone(&current);
        let peak = Arc::clone(&peak);
        move |_: CancellationToken, id: String| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, String>(id)
            }
        }
    };

    let run = run(&numbered(40), 4, &Deadline::never(), op).await;

    assert_eq!(run.summary.unwrap().emitted, 40);
    let peak = peak.load(Ordering::SeqCst);
    assert!((1..=4).contains(&peak), "peak in-flight was {peak}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_workers_emit_no_duplicates() {
    let input = numbered(200);
    let run = run(&input, 8, &Deadline::never(), reverse).await;

    assert_eq!(run.summary.as_ref().unwrap().emitted, 200);
    let seen: HashSet<_> = run.ids().into_iter().collect();
    assert_eq!(seen.len(), 200);
    assert_eq!(
        seen,
        input.lines().map(str::to_owned).collect::<HashSet<_>>()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn deadline_mid_run_accounts_for_every_identifier() {
    let input = numbered(300);
    let all: HashSet<_> = input.lines().map(str::to_owned).collect();
    let op = |_: CancellationToken, id: String| async move {
        tokio::time::sleep(Duration::from_millis(1)).await;
        Ok::<_, String>(id)
    };

    for round in 0..30_u64 {
        let deadline = Deadline::after(Duration::from_millis(20 + round % 31));
        let run = tokio::time::timeout(Duration::from_secs(10), run(&input, 8, &deadline, op))
            .await
            .expect("batch did not finish after its deadline");

        let summary = run.summary.as_ref().unwrap();
        let emitted = run.ids();
        let abandoned = run.diagnostics.ids();
        assert_eq!(summary.emitted + summary.abandoned, 300, "round {round}");
        assert_eq!(emitted.len() + abandoned.len(), 300, "round {round}");

        let seen: HashSet<_> = emitted.into_iter().chain(abandoned).collect();
        assert_eq!(seen, all, "round {round}");
    }
}

#[tokio::test]
async fn single_worker_preserves_input_order() {
    let input = numbered(25);
    let run = run(&input, 1, &Deadline::never(), reverse).await;

    assert_eq!(
        run.ids(),
        input.lines().map(str::to_owned).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn unreadable_input_fails_before_any_output() {
    let pool = PoolConfig::default();
    let mut output = Vec::new();

    let err = run_batch(
        &pool,
        RecordFields::DISCOVERY,
        &Deadline::never(),
        &b"ok.example\n\xff\xfe\n"[..],
        &mut output,
        reverse,
        Arc::new(MemoryDiagnostics::default()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Read(_)));
    assert!(output.is_empty());
}

#[derive(Default)]
struct Unencodable;

impl serde::Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _: S) -> core::result::Result<S::Ok, S::Error> {
        Err(S::Error::custom("not encodable"))
    }
}

#[tokio::test]
async fn unencodable_payload_is_fatal_and_cancels() {
    let deadline = Deadline::never();
    let op = |_: CancellationToken, _: String| async { Ok::<_, String>(Unencodable) };

    let run = run("a\nb\n", 1, &deadline, op).await;

    let err = run.summary.unwrap_err();
    assert!(matches!(err, Error::Serialization { ref id, .. } if id == "a"));
    assert!(run.records.is_empty());
    assert!(deadline.is_expired());
}

struct BrokenPipe;

impl tokio::io::AsyncWrite for BrokenPipe {
    fn poll_write(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        _: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Poll::Ready(Err(std::io::ErrorKind::BrokenPipe.into()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn write_failure_is_fatal() {
    let deadline = Deadline::never();

    let err = run_batch(
        &PoolConfig::default(),
        RecordFields::NODEINFO,
        &deadline,
        &b"https://a.example/nodeinfo/2.0\n"[..],
        BrokenPipe,
        reverse,
        Arc::new(MemoryDiagnostics::default()),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Write(_)));
    assert!(deadline.is_expired());
}

#[tokio::test]
async fn zero_sizes_are_rejected() {
    let no_workers = PoolConfig {
        workers: 0,
        ..PoolConfig::default()
    };
    let no_capacity = PoolConfig {
        queue_capacity: 0,
        ..PoolConfig::default()
    };
    assert!(matches!(no_workers.validate(), Err(Error::Config { .. })));
    assert!(matches!(no_capacity.validate(), Err(Error::Config { .. })));

    let run = run("a\n", 0, &Deadline::never(), reverse).await;
    assert!(matches!(run.summary, Err(Error::Config { .. })));
}
