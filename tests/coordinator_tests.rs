mod common;

use async_insert::{
    AsyncInsertConfig, AsyncInsertCoordinator, DbError, DeferredRetryBuffer, EnqueueOptions,
    EnqueueOutcome, FlushOutcomeKind, ForceSync, Value,
};
use common::{
    BrokenTranslator, ScriptedBackend, ScriptedTransport, User, UserTranslator, unique_violation,
    users_row,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn coordinator(
    transport: &Arc<ScriptedTransport>,
    backend: &Arc<ScriptedBackend>,
    config: AsyncInsertConfig,
) -> AsyncInsertCoordinator {
    AsyncInsertCoordinator::new(transport.clone(), backend.clone(), config)
}

fn queue_first() -> AsyncInsertConfig {
    AsyncInsertConfig::new().force_sync(ForceSync::Disabled).quiet_logging(true)
}

#[tokio::test]
async fn test_queued_send_skips_direct_insert() {
    let transport = ScriptedTransport::working();
    let backend = ScriptedBackend::new();
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let outcome = coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();

    assert_eq!(outcome, EnqueueOutcome::Queued);
    assert!(backend.calls().is_empty());
    assert!(buffer.is_empty());

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].table, "users");
    assert_eq!(sent[0].row, users_row("a"));
    assert!(!sent[0].allow_duplicate);
    assert_eq!(sent[0].delay_ms, None);
    assert_eq!(coordinator.stats().queued, 1);
}

#[tokio::test]
async fn test_delay_and_allow_duplicate_travel_with_message() {
    let transport = ScriptedTransport::working();
    let backend = ScriptedBackend::new();
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let options = EnqueueOptions::new()
        .delay(Duration::from_millis(1500))
        .allow_duplicate(true);
    coordinator
        .enqueue(&UserTranslator, &User::named("a"), options, &mut buffer)
        .await
        .unwrap();

    let sent = transport.sent();
    assert_eq!(sent[0].delay_ms, Some(1500));
    assert!(sent[0].allow_duplicate);
}

#[tokio::test]
async fn test_send_failure_falls_back_to_one_direct_insert() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    backend.push_ok();
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let outcome = coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();

    assert_eq!(outcome, EnqueueOutcome::WrittenDirectly { id: Value::Integer(7) });
    assert_eq!(backend.calls(), vec![("users".to_string(), users_row("a"))]);
    assert_eq!(backend.id_queries(), 1);
    assert!(buffer.is_empty());
    assert_eq!(coordinator.stats().direct_writes, 1);
}

#[tokio::test]
async fn test_explicit_primary_key_skips_id_lookup() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let user = User { id: Some(99), name: "a".into() };
    let outcome = coordinator
        .enqueue(&UserTranslator, &user, EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();

    assert_eq!(outcome, EnqueueOutcome::WrittenDirectly { id: Value::Integer(99) });
    assert_eq!(backend.id_queries(), 0);
}

#[tokio::test]
async fn test_duplicate_on_direct_insert_is_never_buffered() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    backend.push_err(unique_violation());
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let outcome = coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();

    assert_eq!(outcome, EnqueueOutcome::DuplicateRejected);
    assert!(buffer.is_empty());
    assert_eq!(backend.calls().len(), 1);
    assert_eq!(coordinator.stats().duplicates, 1);
    assert_eq!(coordinator.stats().deferred, 0);
}

#[tokio::test]
async fn test_allowed_duplicate_on_direct_insert_is_ignored() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    backend.push_err(DbError::Backend("Duplicate entry 'a' for key 'name'".into()));
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let outcome = coordinator
        .enqueue(
            &UserTranslator,
            &User::named("a"),
            EnqueueOptions::new().allow_duplicate(true),
            &mut buffer,
        )
        .await
        .unwrap();

    assert_eq!(outcome, EnqueueOutcome::DuplicateIgnored);
    assert!(buffer.is_empty());
    assert_eq!(coordinator.stats().duplicates, 0);
    assert_eq!(coordinator.stats().direct_writes, 0);
}

#[tokio::test]
async fn test_direct_failure_is_buffered_and_retried_at_request_end() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    backend.push_err(DbError::Backend("MySQL server has gone away".into()));
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let outcome = coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();

    assert_eq!(outcome, EnqueueOutcome::Deferred);
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.entries()[0].attempts, 0);
    assert_eq!(buffer.entries()[0].table, "users");
    assert_eq!(buffer.entries()[0].row, users_row("a"));

    let report = buffer.flush(coordinator.writer()).await;
    assert_eq!(report.inserted(), 1);
    assert!(buffer.is_empty());
    assert_eq!(backend.calls().len(), 2);
}

#[tokio::test]
async fn test_exhausted_entry_is_reported_once() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    backend.fail_always("Lock wait timeout exceeded");
    let coordinator = coordinator(&transport, &backend, queue_first().max_retries(2));
    let mut unit = coordinator.begin_unit_of_work();

    coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), unit.buffer_mut())
        .await
        .unwrap();
    assert_eq!(unit.buffer().max_retries(), 2);

    let mut kinds = Vec::new();
    for _ in 0..4 {
        let report = unit.buffer_mut().flush(coordinator.writer()).await;
        kinds.extend(report.outcomes.iter().map(|o| (o.kind, o.attempts)));
    }

    assert_eq!(
        kinds,
        vec![
            (FlushOutcomeKind::Retained, 1),
            (FlushOutcomeKind::Retained, 2),
            (FlushOutcomeKind::Exhausted, 3),
        ]
    );
    assert!(unit.buffer().is_empty());
    assert!(coordinator.finish_unit_of_work(unit).await.is_empty());
}

#[tokio::test]
async fn test_duplicate_during_flush_is_evicted_silently() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    backend.push_err(DbError::Backend("deadlock found".into()));
    backend.push_err(DbError::Backend("SQLSTATE[23000]: Integrity constraint violation".into()));
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();
    let report = buffer.flush(coordinator.writer()).await;

    assert_eq!(report.duplicates(), 1);
    assert_eq!(report.exhausted(), 0);
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn test_finishing_unit_of_work_always_clears_buffer() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    backend.fail_always("connection refused");
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut unit = coordinator.begin_unit_of_work();

    for name in ["a", "a", "b"] {
        coordinator
            .enqueue(&UserTranslator, &User::named(name), EnqueueOptions::new(), unit.buffer_mut())
            .await
            .unwrap();
    }
    assert_eq!(unit.buffer().len(), 3);

    let report = coordinator.finish_unit_of_work(unit).await;
    assert_eq!(report.retained(), 3);
    assert_eq!(coordinator.stats().deferred, 3);

    let fresh = coordinator.begin_unit_of_work();
    assert!(fresh.buffer().is_empty());
}

#[tokio::test]
async fn test_force_sync_bypasses_queue() {
    let transport = ScriptedTransport::working();
    let backend = ScriptedBackend::new();
    let config = queue_first().force_sync(ForceSync::Enabled);
    let coordinator = coordinator(&transport, &backend, config);
    let mut buffer = DeferredRetryBuffer::new();

    let outcome = coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();

    assert!(matches!(outcome, EnqueueOutcome::WrittenDirectly { .. }));
    assert!(transport.sent().is_empty());
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_force_sync_failure_still_falls_back_to_buffer() {
    let transport = ScriptedTransport::working();
    let backend = ScriptedBackend::new();
    backend.push_err(DbError::Backend("too many connections".into()));
    let config = queue_first().force_sync(ForceSync::Enabled);
    let coordinator = coordinator(&transport, &backend, config);
    let mut buffer = DeferredRetryBuffer::new();

    let outcome = coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();

    assert_eq!(outcome, EnqueueOutcome::Deferred);
    assert_eq!(buffer.len(), 1);
}

#[tokio::test]
async fn test_force_sync_env_flag_is_read_per_call() {
    let var = "ASYNC_INSERT_FORCE_SYNC_COORDINATOR_TEST";
    unsafe { std::env::remove_var(var) };

    let transport = ScriptedTransport::working();
    let backend = ScriptedBackend::new();
    let config = queue_first().force_sync(ForceSync::Env(var.to_string()));
    let coordinator = coordinator(&transport, &backend, config);
    let mut buffer = DeferredRetryBuffer::new();

    let first = coordinator
        .enqueue(&UserTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();
    assert_eq!(first, EnqueueOutcome::Queued);

    unsafe { std::env::set_var(var, "true") };
    let second = coordinator
        .enqueue(&UserTranslator, &User::named("b"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap();
    unsafe { std::env::remove_var(var) };

    assert!(matches!(second, EnqueueOutcome::WrittenDirectly { .. }));
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_translation_failure_propagates() {
    let transport = ScriptedTransport::working();
    let backend = ScriptedBackend::new();
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let err = coordinator
        .enqueue(&BrokenTranslator, &User::named("a"), EnqueueOptions::new(), &mut buffer)
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::Translation(_)));
    assert!(transport.sent().is_empty());
    assert!(backend.calls().is_empty());
    assert!(buffer.is_empty());
}

#[tokio::test]
async fn test_direct_insert_receives_normalized_row() {
    let transport = ScriptedTransport::broken();
    let backend = ScriptedBackend::new();
    let coordinator = coordinator(&transport, &backend, queue_first());
    let mut buffer = DeferredRetryBuffer::new();

    let mut row = users_row("a");
    row.insert("settings".into(), Value::Json(json!({"theme": "dark"})));
    let request = async_insert::WriteRequest::new("users", row);
    coordinator
        .enqueue_request(request, Duration::ZERO, &mut buffer)
        .await;

    let calls = backend.calls();
    let (_, written) = &calls[0];
    assert_eq!(written["settings"], Value::Text(r#"{"theme":"dark"}"#.into()));
}
