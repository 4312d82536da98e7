//! End-to-end share session tests
//!
//! Every test drives a real `ShareSession` against a temp directory standing
//! in for shared storage and an in-memory media index.

mod helpers;

use gshare_album::platform::{ConfiguredPermissions, ScanTarget};
use gshare_album::{
    Capability, EventBusListener, ShareSession, TransferErrorKind, TransferResult,
};
use gshare_common::events::{EventBus, ShareEvent};
use gshare_common::Error;
use helpers::{
    sample_bytes, Callback, DeferredPermissions, PanicOnStartListener, RecordingListener,
    ScriptedPermissions, TestEnv,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

// ============================================================================
// Strategy scenarios
// ============================================================================

#[tokio::test]
async fn test_legacy_copy_scenario() {
    let env = TestEnv::granted(28);
    let bytes = sample_bytes(500);
    let source = env.write_source("photo.jpg", &bytes);

    let listener = Arc::new(RecordingListener::new());
    let mut session = ShareSession::with_prefix(&env.platform, "album_");
    session.set_listener(listener.clone());

    let result = session.transfer(&source).unwrap().wait().await;
    assert!(result.is_success(), "unexpected result: {result:?}");

    let target = env.camera_dir().join("album_photo.jpg");
    assert_eq!(std::fs::read(&target).unwrap(), bytes);
    assert_eq!(env.index.scans(), vec![ScanTarget::File(target.clone())]);

    // The scan made the copied file visible in the index
    let records = env.index.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].1.display_name, "album_photo.jpg");
    assert_eq!(records[0].1.data_path, target);

    assert_eq!(
        listener.calls(),
        vec![Callback::Start(source.clone()), Callback::End(None, source)]
    );
}

#[tokio::test]
async fn test_indexed_insert_scenario() {
    let env = TestEnv::granted(34);
    let bytes = sample_bytes(500);
    let source = env.write_source("photo.jpg", &bytes);

    let session = ShareSession::new(&env.platform);
    let result = session.transfer(&source).unwrap().wait().await;
    assert!(result.is_success(), "unexpected result: {result:?}");

    let records = env.index.records();
    assert_eq!(records.len(), 1);
    let (handle, record) = &records[0];
    assert_eq!(record.display_name, "album_photo.jpg");
    assert_eq!(record.title, "photo.jpg");
    assert_eq!(record.mime_type, "image/jpeg");
    assert_eq!(record.size, 500);
    assert_eq!(env.index.content(handle).unwrap(), bytes);
    assert_eq!(env.index.scans(), vec![ScanTarget::Handle(handle.clone())]);

    // Nothing lands in the legacy directory
    assert!(!env.camera_dir().exists());
}

#[tokio::test]
async fn test_large_file_spans_many_buffers() {
    for api_level in [28, 34] {
        let env = TestEnv::granted(api_level);
        let bytes = sample_bytes(1024 * 64 + 3);
        let source = env.write_source("big.jpg", &bytes);

        let session = ShareSession::new(&env.platform);
        let result = session.transfer(&source).unwrap().wait().await;
        assert!(result.is_success());

        let (handle, _) = env.index.records().remove(0);
        if api_level < 29 {
            assert_eq!(std::fs::read(env.camera_dir().join("album_big.jpg")).unwrap(), bytes);
        } else {
            assert_eq!(env.index.content(&handle).unwrap(), bytes);
        }
    }
}

// ============================================================================
// Failure and denial paths
// ============================================================================

#[tokio::test]
async fn test_missing_source_fails_for_both_strategies() {
    for api_level in [28, 34] {
        let env = TestEnv::granted(api_level);
        let source = env.dir.path().join("source").join("missing.jpg");

        let listener = Arc::new(RecordingListener::new());
        let mut session = ShareSession::new(&env.platform);
        session.set_listener(listener.clone());

        let result = session.transfer(&source).unwrap().wait().await;
        assert_eq!(result.error_kind(), Some(TransferErrorKind::SourceMissing));
        assert_eq!(result.path(), source.as_path());

        assert!(env.index.is_empty());
        assert!(env.index.scans().is_empty());
        assert!(!env.shared_root().exists());
        assert_eq!(
            listener.calls(),
            vec![
                Callback::Start(source.clone()),
                Callback::End(Some(TransferErrorKind::SourceMissing), source)
            ]
        );
    }
}

#[tokio::test]
async fn test_denied_writes_nothing() {
    for api_level in [28, 34] {
        let env = TestEnv::new(api_level, Arc::new(ConfiguredPermissions::deny_all()));
        let source = env.write_source("photo.jpg", &sample_bytes(500));

        let listener = Arc::new(RecordingListener::new());
        let mut session = ShareSession::new(&env.platform);
        session.set_listener(listener.clone());

        let result = session.transfer(&source).unwrap().wait().await;
        assert!(matches!(result, TransferResult::Denied(ref p) if *p == source));
        assert_eq!(result.error_kind(), Some(TransferErrorKind::PermissionDenied));

        assert!(env.index.is_empty());
        assert!(env.index.scans().is_empty());
        assert!(!env.shared_root().exists());
        assert_eq!(listener.calls(), vec![Callback::Denied(source)]);
    }
}

#[tokio::test]
async fn test_capability_follows_api_level() {
    for (api_level, expected) in [
        (28, Capability::WriteExternalStorage),
        (32, Capability::WriteExternalStorage),
        (33, Capability::ReadMediaImages),
        (34, Capability::ReadMediaImages),
    ] {
        let permissions = Arc::new(ScriptedPermissions::denying());
        let env = TestEnv::new(api_level, permissions.clone());
        let source = env.write_source("photo.jpg", b"x");

        let session = ShareSession::new(&env.platform);
        session.transfer(&source).unwrap().wait().await;

        assert_eq!(permissions.requested(), vec![expected]);
    }
}

#[tokio::test]
async fn test_permission_asked_on_every_transfer() {
    let permissions = Arc::new(ScriptedPermissions::granting());
    let env = TestEnv::new(34, permissions.clone());
    let a = env.write_source("a.jpg", b"a");
    let b = env.write_source("b.jpg", b"b");

    let session = ShareSession::new(&env.platform);
    session.transfer(&a).unwrap().wait().await;
    session.transfer(&b).unwrap().wait().await;

    assert_eq!(permissions.requested().len(), 2);
}

#[tokio::test]
async fn test_transfer_waits_for_permission_decision() {
    let (permissions, decide) = DeferredPermissions::new();
    let env = TestEnv::new(34, Arc::new(permissions));
    let source = env.write_source("photo.jpg", &sample_bytes(100));

    let listener = Arc::new(RecordingListener::new());
    let mut session = ShareSession::new(&env.platform);
    session.set_listener(listener.clone());

    let handle = session.transfer(&source).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(!handle.is_finished());
    assert!(listener.calls().is_empty());
    assert!(env.index.is_empty());

    decide.send(true).unwrap();
    assert!(handle.wait().await.is_success());
    assert_eq!(listener.calls().first(), Some(&Callback::Start(source)));
}

// ============================================================================
// Duplicate suppression
// ============================================================================

#[tokio::test]
async fn test_duplicate_name_is_skipped_indexed() {
    let env = TestEnv::granted(34);
    let first = env.write_source_in("one", "a.jpg", b"first file");
    let second = env.write_source_in("two", "a.jpg", b"a different file entirely");

    let listener = Arc::new(RecordingListener::new());
    let mut session = ShareSession::new(&env.platform);
    session.enable_duplicate_suppression();
    session.set_listener(listener.clone());

    assert!(session.transfer(&first).unwrap().wait().await.is_success());
    let result = session.transfer(&second).unwrap().wait().await;

    assert!(matches!(result, TransferResult::Skipped(ref p) if *p == second));
    assert_eq!(env.index.len(), 1);
    assert_eq!(env.index.scans().len(), 1);
    assert_eq!(listener.calls().last(), Some(&Callback::Skipped(second)));
}

#[tokio::test]
async fn test_duplicate_name_is_skipped_legacy() {
    let env = TestEnv::granted(28);
    let first = env.write_source_in("one", "a.jpg", b"first file");
    let second = env.write_source_in("two", "a.jpg", b"second file");

    let mut session = ShareSession::new(&env.platform);
    session.enable_duplicate_suppression();

    assert!(session.transfer(&first).unwrap().wait().await.is_success());
    let result = session.transfer(&second).unwrap().wait().await;

    assert!(matches!(result, TransferResult::Skipped(_)));
    assert_eq!(
        std::fs::read(env.camera_dir().join("album_a.jpg")).unwrap(),
        b"first file"
    );
}

#[tokio::test]
async fn test_without_suppression_duplicates_are_stored() {
    let env = TestEnv::granted(34);
    let source = env.write_source("a.jpg", b"bytes");

    let session = ShareSession::new(&env.platform);
    assert!(session.transfer(&source).unwrap().wait().await.is_success());
    assert!(session.transfer(&source).unwrap().wait().await.is_success());

    assert_eq!(env.index.len(), 2);
}

#[tokio::test]
async fn test_duplicate_check_uses_session_prefix() {
    let env = TestEnv::granted(34);
    let source = env.write_source("a.jpg", b"bytes");

    let plain = ShareSession::new(&env.platform);
    assert!(plain.transfer(&source).unwrap().wait().await.is_success());

    let mut trip = ShareSession::with_prefix(&env.platform, "trip_");
    trip.enable_duplicate_suppression();
    assert!(trip.transfer(&source).unwrap().wait().await.is_success());

    assert_eq!(env.index.len(), 2);
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_release_fails_fast() {
    let env = TestEnv::granted(34);
    let source = env.write_source("a.jpg", b"bytes");

    let mut session = ShareSession::new(&env.platform);
    session.release();

    assert!(matches!(session.transfer(&source), Err(Error::InvalidState(_))));
    assert!(env.index.is_empty());
}

#[tokio::test]
async fn test_release_does_not_cancel_in_flight_transfer() {
    let (permissions, decide) = DeferredPermissions::new();
    let env = TestEnv::new(34, Arc::new(permissions));
    let source = env.write_source("a.jpg", b"bytes");

    let mut session = ShareSession::new(&env.platform);
    let handle = session.transfer(&source).unwrap();
    session.release();

    decide.send(true).unwrap();
    assert!(handle.wait().await.is_success());
    assert_eq!(env.index.len(), 1);
}

#[tokio::test]
async fn test_dropped_host_fails_fast() {
    let env = TestEnv::granted(34);
    let source = env.write_source("a.jpg", b"bytes");
    let TestEnv {
        dir: _dir,
        index,
        platform,
    } = env;

    let session = ShareSession::new(&platform);
    drop(platform);

    assert!(matches!(session.transfer(&source), Err(Error::InvalidState(_))));
    assert!(index.is_empty());
}

#[tokio::test]
async fn test_application_context_outlives_caller() {
    let env = TestEnv::granted(34);
    let source = env.write_source("a.jpg", b"bytes");
    let TestEnv {
        dir: _dir,
        index,
        platform,
    } = env;

    let mut session = ShareSession::new(&platform);
    session.enable_application_context().unwrap();
    drop(platform);

    assert!(session.transfer(&source).unwrap().wait().await.is_success());
    assert_eq!(index.len(), 1);
}

#[tokio::test]
async fn test_application_context_after_host_dropped() {
    let env = TestEnv::granted(34);
    let TestEnv {
        dir: _dir,
        platform,
        ..
    } = env;

    let mut session = ShareSession::new(&platform);
    drop(platform);

    assert!(matches!(
        session.enable_application_context(),
        Err(Error::InvalidState(_))
    ));
}

// ============================================================================
// Callbacks and concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_transfers_on_one_session() {
    let env = TestEnv::granted(34);
    let listener = Arc::new(RecordingListener::new());
    let mut session = ShareSession::new(&env.platform);
    session.set_listener(listener.clone());

    let mut join_set = JoinSet::new();
    for i in 0..10 {
        let source = env.write_source(&format!("photo_{i}.jpg"), &sample_bytes(700 + i));
        let handle = session.transfer(&source).unwrap();
        join_set.spawn(handle.wait());
    }

    let mut successes = 0;
    while let Some(result) = join_set.join_next().await {
        assert!(result.unwrap().is_success());
        successes += 1;
    }

    assert_eq!(successes, 10);
    assert_eq!(env.index.len(), 10);
    assert_eq!(listener.terminal_count(), 10);

    // Each record carries the bytes of its own source
    for (handle, record) in env.index.records() {
        let source = env.dir.path().join("source").join(&record.title);
        assert_eq!(env.index.content(&handle).unwrap(), std::fs::read(source).unwrap());
    }
}

#[tokio::test]
async fn test_config_change_does_not_reach_running_transfer() {
    let (permissions, decide) = DeferredPermissions::new();
    let env = TestEnv::new(34, Arc::new(permissions));
    let source = env.write_source("a.jpg", b"bytes");

    let mut session = ShareSession::with_prefix(&env.platform, "before_");
    let handle = session.transfer(&source).unwrap();
    session.enable_duplicate_suppression();

    decide.send(true).unwrap();
    assert!(handle.wait().await.is_success());
    assert_eq!(env.index.records()[0].1.display_name, "before_a.jpg");
}

#[tokio::test]
async fn test_panicking_listener_does_not_fail_transfer() {
    for api_level in [28, 34] {
        let env = TestEnv::granted(api_level);
        let bytes = sample_bytes(500);
        let source = env.write_source("photo.jpg", &bytes);

        let listener = Arc::new(PanicOnStartListener::new());
        let mut session = ShareSession::new(&env.platform);
        session.set_listener(listener.clone());

        let result = session.transfer(&source).unwrap().wait().await;
        assert!(result.is_success(), "unexpected result: {result:?}");
        assert_eq!(env.index.len(), 1);

        // The terminal callback still arrives after the panic in on_start
        assert_eq!(listener.calls(), vec![Callback::End(None, source.clone())]);
    }
}

#[tokio::test]
async fn test_event_bus_listener_mirrors_lifecycle() {
    let env = TestEnv::granted(34);
    let source = env.write_source("photo.jpg", b"bytes");

    let bus = EventBus::new(16);
    let mut rx = bus.subscribe();
    let mut session = ShareSession::new(&env.platform);
    session.set_listener(Arc::new(EventBusListener::new(bus)));

    assert!(session.transfer(&source).unwrap().wait().await.is_success());

    let started = rx.recv().await.unwrap();
    assert!(matches!(started, ShareEvent::TransferStarted { .. }));
    assert_eq!(started.path(), source.to_string_lossy());

    match rx.recv().await.unwrap() {
        ShareEvent::TransferEnded {
            error_kind, error, ..
        } => {
            assert!(error_kind.is_none());
            assert!(error.is_none());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
