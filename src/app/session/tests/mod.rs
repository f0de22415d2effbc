//! Scenario tests for the upload session
//!
//! Uploads go through a controllable transport that parks each call until the
//! test resolves it, so interleavings are chosen by the test rather than by
//! timers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{broadcast, oneshot};

use super::*;
use crate::app::models::{FileId, FileStatus, RawFile, UploadOutcome, UploadResult};
use crate::app::transport::Transport;
use crate::errors::SessionError;

struct ParkedCall {
    reporter: ProgressReporter,
    resolver: Option<oneshot::Sender<UploadOutcome>>,
}

/// Transport whose calls wait for the test to resolve them
#[derive(Clone, Default)]
struct ControlledTransport {
    calls: Arc<StdMutex<HashMap<String, Vec<ParkedCall>>>>,
}

impl ControlledTransport {
    fn call_count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).map_or(0, Vec::len)
    }

    /// Reporter handed to the most recent call for `name`
    fn reporter(&self, name: &str) -> ProgressReporter {
        self.calls.lock().unwrap()[name]
            .last()
            .expect("no call for file")
            .reporter
            .clone()
    }

    /// Reporter handed to a specific call (0-based) for `name`
    fn reporter_for_call(&self, name: &str, index: usize) -> ProgressReporter {
        self.calls.lock().unwrap()[name][index].reporter.clone()
    }

    /// Resolve the most recent call for `name`
    fn resolve(&self, name: &str, outcome: UploadOutcome) {
        let mut calls = self.calls.lock().unwrap();
        let call = calls
            .get_mut(name)
            .and_then(|c| c.last_mut())
            .expect("no call for file");
        let resolver = call.resolver.take().expect("call already resolved");
        resolver.send(outcome).expect("upload task went away");
    }
}

impl Transport for ControlledTransport {
    fn upload<'a>(
        &'a self,
        file: &'a RawFile,
        progress: ProgressReporter,
    ) -> BoxFuture<'a, UploadOutcome> {
        async move {
            let (tx, rx) = oneshot::channel();
            self.calls
                .lock()
                .unwrap()
                .entry(file.name.clone())
                .or_default()
                .push(ParkedCall {
                    reporter: progress,
                    resolver: Some(tx),
                });
            rx.await
                .unwrap_or_else(|_| UploadOutcome::failure("resolver dropped"))
        }
        .boxed()
    }
}

struct ExplodingTransport;

fn explode(file: &RawFile) -> UploadOutcome {
    panic!("transport exploded for {}", file.name)
}

impl Transport for ExplodingTransport {
    fn upload<'a>(
        &'a self,
        file: &'a RawFile,
        _progress: ProgressReporter,
    ) -> BoxFuture<'a, UploadOutcome> {
        async move { explode(file) }.boxed()
    }
}

fn text_file(name: &str, size: usize) -> RawFile {
    RawFile::new(name, "text/plain", vec![b'x'; size])
}

fn success(name: &str) -> UploadOutcome {
    UploadOutcome::Success(UploadResult {
        server_id: format!("srv_{}", name),
        url: format!("memory://uploads/srv_{}/{}", name, name),
        uploaded_at: Utc::now(),
        preview_url: None,
    })
}

fn new_session() -> (UploadSession, ControlledTransport) {
    let transport = ControlledTransport::default();
    let session = UploadSession::with_config(transport.clone(), SessionConfigPresets::testing());
    (session, transport)
}

/// Let spawned tasks run until they park again
async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

async fn assert_no_drift(session: &UploadSession) {
    let stats = session.stats().await;
    assert_eq!(stats, session.recompute_stats().await);
    assert!(stats.is_consistent());
}

async fn id_of(session: &UploadSession, name: &str) -> FileId {
    session
        .files()
        .await
        .into_iter()
        .find(|f| f.name == name)
        .map(|f| f.id)
        .expect("file not tracked")
}

fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_batch_is_uploading_immediately_after_submit() {
    let (session, _transport) = new_session();

    let report = session
        .submit_batch(vec![
            text_file("a.txt", 1000),
            text_file("b.txt", 2000),
            text_file("c.txt", 3000),
        ])
        .await;

    assert_eq!(report.accepted.len(), 3);
    assert!(report.rejected.is_empty());

    let stats = session.stats().await;
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.total_bytes, 6000);

    for file in session.files().await {
        assert_eq!(file.status, FileStatus::Uploading);
        assert_eq!(file.progress_percent, 0.0);
        assert_eq!(file.attempt, 1);
    }
    assert!(session.is_uploading().await);
    assert_no_drift(&session).await;
}

#[tokio::test]
async fn test_mixed_results_then_retry() {
    let (session, transport) = new_session();
    session
        .submit_batch(vec![
            text_file("a.txt", 1000),
            text_file("b.txt", 2000),
            text_file("c.txt", 3000),
        ])
        .await;
    settle().await;

    transport.reporter("c.txt").report(40.0).await;
    transport.resolve("a.txt", success("a.txt"));
    transport.resolve("b.txt", UploadOutcome::failure("Upload failed - network error"));
    settle().await;

    let stats = session.stats().await;
    assert_eq!(stats.total_files, 3);
    assert_eq!(stats.completed_files, 1);
    assert_eq!(stats.failed_files, 1);
    assert_eq!(stats.uploaded_bytes, 1000);
    assert_no_drift(&session).await;

    let a = session.get(&id_of(&session, "a.txt").await).await.unwrap();
    assert_eq!(a.status, FileStatus::Completed);
    assert_eq!(a.progress_percent, 100.0);
    assert!(a.result.is_some());
    assert!(!a.has_retained_source());

    let b_id = id_of(&session, "b.txt").await;
    let b = session.get(&b_id).await.unwrap();
    assert_eq!(b.status, FileStatus::Error);
    assert_eq!(b.error_message.as_deref(), Some("Upload failed - network error"));
    assert!(b.can_retry());

    let c = session.get(&id_of(&session, "c.txt").await).await.unwrap();
    assert_eq!(c.status, FileStatus::Uploading);
    assert_eq!(c.progress_percent, 40.0);

    // Retry the failed file
    session.retry(&b_id).await.unwrap();
    let b = session.get(&b_id).await.unwrap();
    assert_eq!(b.status, FileStatus::Uploading);
    assert_eq!(b.progress_percent, 0.0);
    assert_eq!(b.error_message, None);
    assert_eq!(b.attempt, 2);
    assert_eq!(session.stats().await.failed_files, 0);
    assert_no_drift(&session).await;

    settle().await;
    assert_eq!(transport.call_count("b.txt"), 2);

    transport.resolve("b.txt", success("b.txt"));
    settle().await;

    let stats = session.stats().await;
    assert_eq!(stats.completed_files, 2);
    assert_eq!(stats.failed_files, 0);
    assert_eq!(stats.uploaded_bytes, 3000);
    assert_no_drift(&session).await;
}

#[tokio::test]
async fn test_superseded_attempt_progress_is_ignored() {
    let (session, transport) = new_session();
    session.submit_batch(vec![text_file("a.txt", 10)]).await;
    settle().await;

    let id = id_of(&session, "a.txt").await;
    let first = transport.reporter("a.txt");
    transport.resolve("a.txt", UploadOutcome::failure("boom"));
    settle().await;

    session.retry(&id).await.unwrap();
    settle().await;

    assert!(!first.report(90.0).await);
    assert!(transport.reporter_for_call("a.txt", 1).report(25.0).await);
    assert_eq!(session.get(&id).await.unwrap().progress_percent, 25.0);
}

#[tokio::test]
async fn test_clear_mid_upload_discards_late_callbacks() {
    let (session, transport) = new_session();
    let mut events = session.subscribe();

    session
        .submit_batch(vec![text_file("a.txt", 100), text_file("b.txt", 200)])
        .await;
    settle().await;

    let a = transport.reporter("a.txt");
    let b = transport.reporter("b.txt");
    a.report(30.0).await;

    assert_eq!(session.clear().await, 2);
    assert!(session.files().await.is_empty());
    assert_eq!(session.stats().await, SessionStats::default());

    assert!(!a.report(60.0).await);
    assert!(!b.report(60.0).await);
    transport.resolve("a.txt", success("a.txt"));
    transport.resolve("b.txt", UploadOutcome::failure("late"));
    settle().await;

    assert!(session.files().await.is_empty());
    assert_eq!(session.stats().await, SessionStats::default());
    assert!(!session.is_uploading().await);

    let events = drain(&mut events);
    assert!(events.contains(&SessionEvent::SessionCleared { removed: 2 }));
    assert!(events.contains(&SessionEvent::BatchFinished {
        submitted: 2,
        completed: 0,
        failed: 0,
        discarded: 2,
    }));
    assert!(!events
        .iter()
        .any(|e| matches!(e, SessionEvent::FileCompleted { .. } | SessionEvent::FileFailed { .. })));
}

#[tokio::test]
async fn test_remove_twice_does_not_double_decrement() {
    let (session, transport) = new_session();
    session
        .submit_batch(vec![text_file("a.txt", 1000), text_file("b.txt", 2000)])
        .await;
    settle().await;
    transport.resolve("a.txt", success("a.txt"));
    settle().await;

    let id = id_of(&session, "a.txt").await;
    session.remove(&id).await.unwrap();

    let after_first = session.stats().await;
    assert_eq!(after_first.total_files, 1);
    assert_eq!(after_first.completed_files, 0);
    assert_eq!(after_first.total_bytes, 2000);
    assert_eq!(after_first.uploaded_bytes, 0);

    assert_eq!(
        session.remove(&id).await.unwrap_err(),
        SessionError::NotFound { id: id.clone() }
    );
    assert_eq!(session.stats().await, after_first);
    assert_no_drift(&session).await;
}

#[tokio::test]
async fn test_remove_while_uploading_ignores_late_result() {
    let (session, transport) = new_session();
    session
        .submit_batch(vec![text_file("a.txt", 1000), text_file("b.txt", 2000)])
        .await;
    settle().await;

    let id = id_of(&session, "a.txt").await;
    let reporter = transport.reporter("a.txt");
    session.remove(&id).await.unwrap();

    assert!(!reporter.report(50.0).await);
    transport.resolve("a.txt", success("a.txt"));
    settle().await;

    assert!(session.get(&id).await.is_none());
    let stats = session.stats().await;
    assert_eq!(stats.total_files, 1);
    assert_eq!(stats.completed_files, 0);
    assert_no_drift(&session).await;
}

#[tokio::test]
async fn test_retry_guard_leaves_state_untouched() {
    let (session, transport) = new_session();
    session.submit_batch(vec![text_file("a.txt", 10)]).await;
    settle().await;
    let id = id_of(&session, "a.txt").await;

    // Uploading
    let err = session.retry(&id).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidState { status: FileStatus::Uploading, .. }
    ));
    assert_eq!(transport.call_count("a.txt"), 1);

    transport.resolve("a.txt", success("a.txt"));
    settle().await;
    let before = session.stats().await;

    // Completed
    let err = session.retry(&id).await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidState { status: FileStatus::Completed, .. }
    ));

    let file = session.get(&id).await.unwrap();
    assert_eq!(file.status, FileStatus::Completed);
    assert_eq!(file.attempt, 1);
    assert_eq!(session.stats().await, before);

    settle().await;
    assert_eq!(transport.call_count("a.txt"), 1);

    let unknown = FileId::from("does-not-exist");
    assert_eq!(
        session.retry(&unknown).await.unwrap_err(),
        SessionError::NotFound { id: unknown }
    );
}

#[tokio::test]
async fn test_progress_is_clamped_and_non_decreasing() {
    let (session, transport) = new_session();
    session.submit_batch(vec![text_file("a.txt", 10)]).await;
    settle().await;
    let id = id_of(&session, "a.txt").await;
    let reporter = transport.reporter("a.txt");

    assert!(reporter.report(60.0).await);
    assert!(!reporter.report(30.0).await);
    assert!(!reporter.report(f64::NAN).await);
    assert!(!reporter.report(-5.0).await);
    assert_eq!(session.get(&id).await.unwrap().progress_percent, 60.0);

    assert!(reporter.report(150.0).await);
    assert_eq!(session.get(&id).await.unwrap().progress_percent, 100.0);

    // Still uploading until the transport resolves
    assert_eq!(session.get(&id).await.unwrap().status, FileStatus::Uploading);

    transport.resolve("a.txt", UploadOutcome::failure("boom"));
    settle().await;
    assert!(!reporter.report(100.0).await);
}

#[tokio::test]
async fn test_partial_failure_isolation_with_panicking_transport() {
    let session = UploadSession::with_config(ExplodingTransport, SessionConfigPresets::testing());
    session
        .submit_batch(vec![text_file("a.txt", 10), text_file("b.txt", 20)])
        .await;
    settle().await;

    for file in session.files().await {
        assert_eq!(file.status, FileStatus::Error);
        assert_eq!(file.error_message.as_deref(), Some("Transport panicked"));
    }
    assert_eq!(session.stats().await.failed_files, 2);
    assert_no_drift(&session).await;
}

#[tokio::test]
async fn test_previews_for_images_only() {
    let (session, transport) = new_session();
    session
        .submit_batch(vec![
            RawFile::new("cat.png", "image/png", vec![1, 2, 3]),
            RawFile::new("empty.png", "image/png", Vec::new()),
            text_file("notes.txt", 5),
        ])
        .await;
    settle().await;

    let cat = session.get(&id_of(&session, "cat.png").await).await.unwrap();
    assert_eq!(cat.preview_token.as_deref(), Some("data:image/png;base64,AQID"));

    // Preview failure degrades to no preview and the upload still runs
    let empty_id = id_of(&session, "empty.png").await;
    let empty = session.get(&empty_id).await.unwrap();
    assert_eq!(empty.preview_token, None);
    assert_eq!(empty.status, FileStatus::Uploading);
    assert_eq!(transport.call_count("empty.png"), 1);

    let notes = session.get(&id_of(&session, "notes.txt").await).await.unwrap();
    assert_eq!(notes.preview_token, None);
}

#[tokio::test]
async fn test_previews_can_be_disabled() {
    let transport = ControlledTransport::default();
    let config = SessionConfigBuilder::new().previews_enabled(false).build();
    let session = UploadSession::with_config(transport, config);

    session
        .submit_batch(vec![RawFile::new("cat.png", "image/png", vec![1, 2, 3])])
        .await;
    settle().await;

    let cat = session.get(&id_of(&session, "cat.png").await).await.unwrap();
    assert_eq!(cat.preview_token, None);
}

#[tokio::test]
async fn test_rejected_files_do_not_touch_counters() {
    let transport = ControlledTransport::default();
    let config = SessionConfigBuilder::new()
        .max_file_size(100)
        .allowed_types([".txt", "image"])
        .build();
    let session = UploadSession::with_config(transport.clone(), config);

    let report = session
        .submit_batch(vec![
            text_file("small.txt", 50),
            text_file("large.txt", 500),
            RawFile::new("clip.mp4", "video/mp4", vec![0; 10]),
            RawFile::new("cat.PNG", "image/png", vec![0; 10]),
        ])
        .await;
    settle().await;

    assert_eq!(report.accepted.len(), 2);
    let rejected: Vec<&str> = report.rejected.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(rejected, vec!["large.txt", "clip.mp4"]);

    let stats = session.stats().await;
    assert_eq!(stats.total_files, 2);
    assert_eq!(stats.total_bytes, 60);
    assert_eq!(transport.call_count("large.txt"), 0);
    assert_eq!(transport.call_count("clip.mp4"), 0);
}

#[tokio::test]
async fn test_empty_batch_is_a_no_op() {
    let (session, _transport) = new_session();
    let mut events = session.subscribe();

    let report = session.submit_batch(Vec::new()).await;
    settle().await;

    assert!(report.is_empty());
    assert_eq!(session.stats().await, SessionStats::default());
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn test_newest_batch_listed_first() {
    let (session, _transport) = new_session();
    session
        .submit_batch(vec![text_file("a.txt", 1), text_file("b.txt", 1)])
        .await;
    session.submit_batch(vec![text_file("c.txt", 1)]).await;

    let names: Vec<String> = session.files().await.into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["c.txt", "a.txt", "b.txt"]);
}

#[tokio::test]
async fn test_event_stream_for_a_batch() {
    let (session, transport) = new_session();
    let mut events = session.subscribe();

    session
        .submit_batch(vec![text_file("a.txt", 10), text_file("b.txt", 20)])
        .await;
    settle().await;

    let a_id = id_of(&session, "a.txt").await;
    let b_id = id_of(&session, "b.txt").await;

    transport.resolve("a.txt", success("a.txt"));
    settle().await;
    transport.resolve("b.txt", UploadOutcome::failure("boom"));
    settle().await;

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![
            SessionEvent::BatchRegistered {
                count: 2,
                total_bytes: 30,
            },
            SessionEvent::FileCompleted {
                id: a_id,
                name: "a.txt".to_string(),
            },
            SessionEvent::FileFailed {
                id: b_id,
                name: "b.txt".to_string(),
                message: "boom".to_string(),
            },
            SessionEvent::BatchFinished {
                submitted: 2,
                completed: 1,
                failed: 1,
                discarded: 0,
            },
        ]
    );
}

#[tokio::test]
async fn test_counters_never_drift_across_operations() {
    let (session, transport) = new_session();
    let names: Vec<String> = (0..8).map(|i| format!("f{}.txt", i)).collect();

    session
        .submit_batch(names.iter().map(|n| text_file(n, 100)).collect())
        .await;
    settle().await;
    assert_no_drift(&session).await;

    for (i, name) in names.iter().enumerate() {
        if i % 2 == 0 {
            transport.resolve(name, success(name));
        } else {
            transport.resolve(name, UploadOutcome::failure("boom"));
        }
        settle().await;
        assert_no_drift(&session).await;
    }

    // Retry one failure, remove another, remove a completed file
    session.retry(&id_of(&session, "f1.txt").await).await.unwrap();
    assert_no_drift(&session).await;
    session.remove(&id_of(&session, "f3.txt").await).await.unwrap();
    assert_no_drift(&session).await;
    session.remove(&id_of(&session, "f0.txt").await).await.unwrap();
    assert_no_drift(&session).await;

    settle().await;
    transport.resolve("f1.txt", success("f1.txt"));
    settle().await;
    assert_no_drift(&session).await;

    let stats = session.stats().await;
    assert_eq!(stats.total_files, 6);
    assert_eq!(stats.completed_files, 4);
    assert_eq!(stats.failed_files, 2);
    assert_eq!(stats.total_bytes, 600);
    assert_eq!(stats.uploaded_bytes, 400);
}

#[tokio::test]
async fn test_wait_for_idle() {
    let (session, transport) = new_session();
    session.submit_batch(vec![text_file("a.txt", 10)]).await;
    settle().await;

    assert!(!session.wait_for_idle(std::time::Duration::from_millis(30)).await);

    transport.resolve("a.txt", success("a.txt"));
    assert!(session.wait_for_idle(std::time::Duration::from_secs(5)).await);
}

#[tokio::test]
async fn test_snapshots_never_hold_the_payload() {
    let (session, transport) = new_session();
    session.submit_batch(vec![text_file("a.txt", 1000)]).await;
    settle().await;
    transport.resolve("a.txt", UploadOutcome::failure("Network error"));
    settle().await;

    let id = id_of(&session, "a.txt").await;
    let listed = session.files().await;
    let single = session.get(&id).await.unwrap();

    for snapshot in listed.iter().chain(std::iter::once(&single)) {
        assert!(snapshot.retained_source.is_none());
        assert!(snapshot.has_retained_source());
        assert!(snapshot.can_retry());
    }

    session.retry(&id).await.unwrap();
    settle().await;
    transport.resolve("a.txt", success("a.txt"));
    settle().await;

    let done = session.get(&id).await.unwrap();
    assert_eq!(done.status, FileStatus::Completed);
    assert!(!done.has_retained_source());
    assert_no_drift(&session).await;
}
