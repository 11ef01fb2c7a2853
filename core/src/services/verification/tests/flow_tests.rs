//! Tests for the hosting facade

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::domain::entities::email_type::EmailType;
use crate::domain::value_objects::messages::RequestMessage;
use crate::errors::VerificationError;
use crate::services::verification::{
    AddressChange, EmailVerificationFlow, FlowCallbacks, RequestOutcome, SubmitOutcome,
    VerificationServiceConfig,
};

use super::mocks::{advance, wait_for_sends, MockVerificationBackend};

fn mount(
    backend: Arc<MockVerificationBackend>,
    callbacks: FlowCallbacks,
) -> EmailVerificationFlow<MockVerificationBackend> {
    EmailVerificationFlow::mount(
        EmailType::Contact,
        Some("user@example.com"),
        backend,
        VerificationServiceConfig::default(),
        callbacks,
    )
}

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    (count.clone(), count)
}

#[tokio::test(start_paused = true)]
async fn test_mount_prefills_candidate() {
    let flow = mount(Arc::new(MockVerificationBackend::new()), FlowCallbacks::new());

    let session = flow.snapshot();
    assert_eq!(session.email_type(), EmailType::Contact);
    assert_eq!(session.candidate_address(), Some("user@example.com"));
    assert_eq!(session.contacted_address(), None);
    assert!(session.can_request_code());
}

#[tokio::test(start_paused = true)]
async fn test_address_change_bypasses_cooldown() {
    let backend = Arc::new(MockVerificationBackend::new());
    let flow = mount(backend.clone(), FlowCallbacks::new());

    flow.request_code("user@example.com").await.unwrap();
    assert!(!flow.snapshot().can_request_code());

    assert_eq!(
        flow.set_candidate_address(Some("other@example.com")),
        AddressChange::ChangedAwayFromContacted
    );
    let session = flow.snapshot();
    assert!(session.can_request_code());
    assert_eq!(session.request_message(), Some(RequestMessage::AddressChanged));

    assert_eq!(
        flow.set_candidate_address(Some("user@example.com")),
        AddressChange::RevertedToContacted
    );
    let session = flow.snapshot();
    assert_eq!(session.request_message(), None);
    assert!(session.can_request_code());

    let outcome = flow.request_code("user@example.com").await.unwrap();
    assert!(matches!(outcome, RequestOutcome::Sent { .. }));
    assert_eq!(backend.send_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_request_for_new_address_while_throttled_is_sent() {
    let backend = Arc::new(MockVerificationBackend::new());
    let flow = mount(backend.clone(), FlowCallbacks::new());

    flow.request_code("user@example.com").await.unwrap();
    advance(Duration::from_secs(10)).await;

    let outcome = flow.request_code("other@example.com").await.unwrap();
    assert!(matches!(outcome, RequestOutcome::Sent { .. }));
    assert_eq!(flow.snapshot().contacted_address(), Some("other@example.com"));
    assert_eq!(flow.session().remaining_cooldown_seconds(), 60);
}

#[tokio::test(start_paused = true)]
async fn test_address_edited_while_send_pending_reenables_requests() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockVerificationBackend::new().with_send_gate(gate.clone()));
    let flow = mount(backend.clone(), FlowCallbacks::new());

    let (request, change) = tokio::join!(flow.request_code("a@example.com"), async {
        wait_for_sends(&backend, 1).await;
        let change = flow.set_candidate_address(Some("b@example.com"));
        gate.notify_one();
        change
    });
    assert!(matches!(request, Ok(RequestOutcome::Sent { .. })));
    // nothing was contacted yet when the field changed
    assert_eq!(change, AddressChange::Unchanged);

    let session = flow.snapshot();
    assert_eq!(session.candidate_address(), Some("b@example.com"));
    assert_eq!(session.contacted_address(), Some("a@example.com"));
    assert_eq!(session.request_message(), Some(RequestMessage::AddressChanged));
    assert!(session.can_request_code());
    assert_eq!(flow.session().remaining_cooldown_seconds(), 0);

    gate.notify_one();
    let outcome = flow
        .request_controller()
        .request_code("b@example.com")
        .await
        .unwrap();
    assert!(matches!(outcome, RequestOutcome::Sent { .. }));
    assert_eq!(backend.send_count(), 2);
    assert_eq!(flow.snapshot().contacted_address(), Some("b@example.com"));
    assert!(!flow.snapshot().can_request_code());
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_field_keeps_cooldown_after_pending_send() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockVerificationBackend::new().with_send_gate(gate.clone()));
    let flow = mount(backend.clone(), FlowCallbacks::new());

    let (request, _) = tokio::join!(flow.request_code("user@example.com"), async {
        wait_for_sends(&backend, 1).await;
        flow.set_candidate_address(Some("USER@example.com"));
        gate.notify_one();
    });
    assert!(request.is_ok());

    let session = flow.snapshot();
    assert_eq!(session.request_message(), Some(RequestMessage::RequestSent));
    assert!(!session.can_request_code());
    assert_eq!(flow.session().remaining_cooldown_seconds(), 60);
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_follow_the_cycle() {
    let flow = mount(Arc::new(MockVerificationBackend::new()), FlowCallbacks::new());
    let mut updates = flow.subscribe();

    flow.request_code("user@example.com").await.unwrap();
    updates.changed().await.unwrap();
    assert!(!updates.borrow_and_update().can_request_code());

    advance(Duration::from_secs(60)).await;
    updates.changed().await.unwrap();
    assert!(updates.borrow_and_update().can_request_code());
}

#[tokio::test(start_paused = true)]
async fn test_request_and_submit_do_not_block_each_other() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(MockVerificationBackend::new().with_send_gate(gate.clone()));
    let (verified, fired) = counter();
    let flow = mount(
        backend.clone(),
        FlowCallbacks::new().on_verified(move |_| {
            fired.fetch_add(1, Ordering::SeqCst);
        }),
    );

    gate.notify_one();
    flow.request_code("user@example.com").await.unwrap();
    flow.set_candidate_address(Some("other@example.com"));

    let (request, submit) = tokio::join!(flow.request_code("other@example.com"), async {
        wait_for_sends(&backend, 2).await;
        let outcome = flow.submit_code("123456").await;
        gate.notify_one();
        outcome
    });

    assert!(matches!(submit, Ok(SubmitOutcome::Verified(ref completed)) if completed.address == "user@example.com"));
    assert_eq!(request, Err(VerificationError::SessionClosed));
    assert_eq!(verified.load(Ordering::SeqCst), 1);
    assert!(flow.snapshot().is_terminal());
}

#[tokio::test(start_paused = true)]
async fn test_reset_returns_to_idle() {
    let backend = Arc::new(MockVerificationBackend::new());
    let flow = mount(backend.clone(), FlowCallbacks::new());

    flow.request_code("user@example.com").await.unwrap();
    flow.reset();

    let session = flow.snapshot();
    assert_eq!(session.email_type(), EmailType::Contact);
    assert_eq!(session.candidate_address(), Some("user@example.com"));
    assert_eq!(session.contacted_address(), None);
    assert!(session.can_request_code());

    let outcome = flow.submit_code("123456").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::MustRequestCodeFirst);
    assert_eq!(backend.verify_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_fires_once_and_closes() {
    let (skipped, fired) = counter();
    let (verified, on_verified) = counter();
    let flow = mount(
        Arc::new(MockVerificationBackend::new()),
        FlowCallbacks::new()
            .on_skip(move || {
                fired.fetch_add(1, Ordering::SeqCst);
            })
            .on_verified(move |_| {
                on_verified.fetch_add(1, Ordering::SeqCst);
            }),
    );

    flow.skip();
    flow.skip();
    assert_eq!(skipped.load(Ordering::SeqCst), 1);
    assert!(flow.snapshot().is_terminal());

    assert_eq!(
        flow.request_code("user@example.com").await,
        Err(VerificationError::SessionClosed)
    );
    assert_eq!(verified.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_drop_tears_down_session() {
    let backend = Arc::new(MockVerificationBackend::new());
    let flow = mount(backend.clone(), FlowCallbacks::new());
    flow.request_code("user@example.com").await.unwrap();

    let session = flow.session().clone();
    let generation = session.generation();
    drop(flow);

    assert!(!session.is_current(generation));
    assert!(session.snapshot().is_terminal());
    assert_eq!(session.remaining_cooldown_seconds(), 0);
}
