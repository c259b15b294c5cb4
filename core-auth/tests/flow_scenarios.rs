//! End-to-end scenarios: page-side flow posting into the native transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_desktop::{ChannelMessagePort, MemorySecureStore, StaticDocumentLifecycle};
use bridge_traits::{
    error::Result as BridgeResult, AuthCapability, AuthUser, BridgeError, CapabilityBinding,
    LoginEntry, LoginModalOptions, LoginModalResult, SecureStore,
};
use core_async::retry::RetryPolicy;
use core_auth::{
    AuthFlowController, AuthOutcome, BridgeEnvelope, CredentialStore, EnvelopeKind,
    NativeBridgeTransport, NativeResultHandler, ScreenOutcome, ACCESS_TOKEN_KEY,
};
use core_runtime::config::FlowSettings;
use core_runtime::events::EventBus;
use tokio::sync::mpsc::UnboundedReceiver;

/// Scripted vendor capability.
struct FakeCapability {
    stub_checks_left: Mutex<usize>,
    modal: BridgeResult<LoginModalResult>,
    private_key: Mutex<VecDeque<BridgeResult<bool>>>,
    tokens: Mutex<VecDeque<BridgeResult<Option<String>>>>,
    seen_options: Mutex<Option<LoginModalOptions>>,
}

impl FakeCapability {
    fn with_modal(modal: BridgeResult<LoginModalResult>) -> Self {
        Self {
            stub_checks_left: Mutex::new(0),
            modal,
            private_key: Mutex::new(VecDeque::new()),
            tokens: Mutex::new(VecDeque::new()),
            seen_options: Mutex::new(None),
        }
    }

    fn signed_in(token: &str) -> Self {
        Self::with_modal(Ok(LoginModalResult {
            success: true,
            payload: vec![LoginEntry {
                token: Some(token.to_string()),
                user: AuthUser::new("u1").with_email("a@b.com"),
            }],
            error: None,
        }))
    }

    fn stub_checks(self, count: usize) -> Self {
        *self.stub_checks_left.lock().unwrap() = count;
        self
    }

    fn private_key_answers(self, answers: Vec<BridgeResult<bool>>) -> Self {
        *self.private_key.lock().unwrap() = answers.into();
        self
    }

    fn token_answers(self, answers: Vec<BridgeResult<Option<String>>>) -> Self {
        *self.tokens.lock().unwrap() = answers.into();
        self
    }
}

#[async_trait]
impl AuthCapability for FakeCapability {
    async fn open_auth_login_modal(
        &self,
        options: &LoginModalOptions,
    ) -> BridgeResult<LoginModalResult> {
        *self.seen_options.lock().unwrap() = Some(options.clone());
        self.modal.clone()
    }

    /// Replays scripted answers; `false` once they run out.
    async fn has_private_key(&self) -> BridgeResult<bool> {
        self.private_key.lock().unwrap().pop_front().unwrap_or(Ok(false))
    }

    async fn get_access_token(&self) -> BridgeResult<Option<String>> {
        self.tokens.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }

    /// Reports a stub for the scripted number of checks, live afterwards.
    fn readiness(&self) -> Option<bool> {
        let mut left = self.stub_checks_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            Some(false)
        } else {
            Some(true)
        }
    }
}

/// Binding that resolves to nothing for the first `absent_checks` ticks.
struct FakeBinding {
    capability: Option<Arc<FakeCapability>>,
    absent_checks: Mutex<u32>,
}

impl FakeBinding {
    fn new(capability: Option<Arc<FakeCapability>>) -> Self {
        Self {
            capability,
            absent_checks: Mutex::new(0),
        }
    }

    fn absent_for(self, checks: u32) -> Self {
        *self.absent_checks.lock().unwrap() = checks;
        self
    }
}

impl CapabilityBinding for FakeBinding {
    fn resolve(&self) -> Option<Arc<dyn AuthCapability>> {
        let mut absent = self.absent_checks.lock().unwrap();
        if *absent > 0 {
            *absent -= 1;
            return None;
        }
        self.capability
            .clone()
            .map(|capability| capability as Arc<dyn AuthCapability>)
    }
}

struct Harness {
    outcome: AuthOutcome,
    posted: Vec<String>,
}

impl Harness {
    fn kinds(&self) -> Vec<EnvelopeKind> {
        self.posted
            .iter()
            .map(|raw| BridgeEnvelope::decode(raw).unwrap().kind())
            .collect()
    }

    fn terminal_count(&self) -> usize {
        self.kinds().into_iter().filter(|k| k.is_terminal()).count()
    }
}

fn settings() -> FlowSettings {
    FlowSettings::default().with_project_id("proj_test")
}

fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<String> {
    let mut posted = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        posted.push(raw);
    }
    posted
}

async fn run_flow(binding: FakeBinding, settings: FlowSettings) -> Harness {
    let (port, mut rx) = ChannelMessagePort::new();
    let controller = AuthFlowController::new(
        Arc::new(binding),
        Arc::new(StaticDocumentLifecycle::loaded()),
        Arc::new(port),
        settings,
    );

    let outcome = controller.run().await;
    Harness {
        outcome,
        posted: drain(&mut rx),
    }
}

/// Feeds everything the page posted into a fresh native transport.
async fn deliver(posted: &[String]) -> (Vec<ScreenOutcome>, MemorySecureStore) {
    let backing = MemorySecureStore::new();
    let handler = NativeResultHandler::new(
        CredentialStore::new(Arc::new(backing.clone())),
        EventBus::new(16),
    );
    let mut transport = NativeBridgeTransport::new(handler);
    transport.open_surface();

    let mut outcomes = Vec::new();
    for raw in posted {
        if let Some(outcome) = transport.receive(raw).await {
            outcomes.push(outcome);
        }
    }
    (outcomes, backing)
}

#[tokio::test(start_paused = true)]
async fn capability_never_loads() {
    let harness = run_flow(FakeBinding::new(None), settings()).await;

    assert_eq!(harness.kinds(), vec![EnvelopeKind::AuthError]);
    match &harness.outcome {
        AuthOutcome::Error { message } => assert!(message.starts_with("Timeout")),
        other => panic!("expected timeout error, got {:?}", other),
    }

    let (outcomes, backing) = deliver(&harness.posted).await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].closes_surface());
    assert!(backing.is_empty());
}

#[tokio::test(start_paused = true)]
async fn document_never_finishes_loading() {
    let capability = Arc::new(FakeCapability::signed_in("tok123"));
    let (port, mut rx) = ChannelMessagePort::new();
    let controller = AuthFlowController::new(
        Arc::new(FakeBinding::new(Some(capability))),
        Arc::new(StaticDocumentLifecycle::loading()),
        Arc::new(port),
        settings(),
    );

    let outcome = controller.run().await;
    let harness = Harness {
        outcome,
        posted: drain(&mut rx),
    };

    assert_eq!(harness.kinds(), vec![EnvelopeKind::AuthError]);
    assert!(matches!(harness.outcome, AuthOutcome::Error { .. }));
}

#[tokio::test(start_paused = true)]
async fn modal_returns_token_directly() {
    let capability = Arc::new(FakeCapability::signed_in("tok123"));
    let harness = run_flow(FakeBinding::new(Some(capability.clone())), settings()).await;

    assert_eq!(
        harness.kinds(),
        vec![EnvelopeKind::AuthStarted, EnvelopeKind::AuthSuccess]
    );
    assert_eq!(
        capability.seen_options.lock().unwrap().clone(),
        Some(LoginModalOptions {
            project_id: Some("proj_test".to_string()),
            show_branding_panel: true,
        })
    );

    let (outcomes, backing) = deliver(&harness.posted).await;
    let result = outcomes[0].to_screen_result();
    assert_eq!(result.token.as_deref(), Some("tok123"));
    let user = result.user.unwrap();
    assert_eq!(user.id, "u1");
    assert_eq!(user.email.as_deref(), Some("a@b.com"));
    assert_eq!(
        backing.get_secret(ACCESS_TOKEN_KEY).await.unwrap(),
        Some(b"tok123".to_vec())
    );
}

#[tokio::test(start_paused = true)]
async fn empty_token_and_no_private_key() {
    let capability = Arc::new(FakeCapability::signed_in(""));
    let start = tokio::time::Instant::now();
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    assert_eq!(
        harness.kinds(),
        vec![EnvelopeKind::AuthStarted, EnvelopeKind::AuthError]
    );
    match &harness.outcome {
        AuthOutcome::Error { message } => assert!(message.contains("private key was not ready")),
        other => panic!("expected key error, got {:?}", other),
    }
    // Settle delay, then 24 intervals between 25 key checks.
    assert_eq!(
        start.elapsed(),
        std::time::Duration::from_millis(500 + 24 * 200)
    );

    let (_, backing) = deliver(&harness.posted).await;
    assert!(backing.is_empty());
}

#[tokio::test(start_paused = true)]
async fn token_arrives_after_private_key() {
    let capability = Arc::new(
        FakeCapability::signed_in("")
            .private_key_answers(vec![Ok(false), Ok(false), Ok(true)])
            .token_answers(vec![
                Ok(None),
                Err(BridgeError::Rejected("not yet".to_string())),
                Ok(Some(String::new())),
                Ok(Some("late-token".to_string())),
            ]),
    );
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    match &harness.outcome {
        AuthOutcome::Success { token, user } => {
            assert_eq!(token, "late-token");
            assert_eq!(user.id, "u1");
        }
        other => panic!("expected success, got {:?}", other),
    }
    assert_eq!(harness.terminal_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn private_key_present_but_token_never_arrives() {
    let capability = Arc::new(
        FakeCapability::signed_in("").private_key_answers(vec![Ok(true)]),
    );
    let harness = run_flow(
        FakeBinding::new(Some(capability)),
        settings().with_token_poll(RetryPolicy::from_millis(200, 5)),
    )
    .await;

    match &harness.outcome {
        AuthOutcome::Error { message } => {
            assert!(message.contains("private key is present"));
            assert!(message.contains("5 attempts"));
        }
        other => panic!("expected token error, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn private_key_check_error_stops_flow() {
    let capability = Arc::new(
        FakeCapability::signed_in("")
            .private_key_answers(vec![Err(BridgeError::Rejected("keystore locked".to_string()))]),
    );
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    assert_eq!(harness.outcome, AuthOutcome::error("keystore locked"));
    assert_eq!(harness.terminal_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn user_dismisses_modal() {
    let capability = Arc::new(FakeCapability::with_modal(Ok(LoginModalResult::default())));
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    assert_eq!(harness.outcome, AuthOutcome::Cancelled);
    assert_eq!(
        harness.kinds(),
        vec![EnvelopeKind::AuthStarted, EnvelopeKind::AuthCancelled]
    );

    let (outcomes, backing) = deliver(&harness.posted).await;
    assert_eq!(outcomes, vec![ScreenOutcome::Cancelled]);
    assert!(backing.is_empty());
}

#[tokio::test(start_paused = true)]
async fn modal_rejection_becomes_error() {
    let capability = Arc::new(FakeCapability::with_modal(Err(BridgeError::Rejected(
        "NotAllowedError".to_string(),
    ))));
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    assert_eq!(harness.outcome, AuthOutcome::error("NotAllowedError"));

    let (outcomes, _) = deliver(&harness.posted).await;
    assert_eq!(
        outcomes,
        vec![ScreenOutcome::Error {
            message: "NotAllowedError".to_string()
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn modal_failure_without_message_is_generic() {
    let capability = Arc::new(FakeCapability::with_modal(Ok(LoginModalResult {
        success: true,
        payload: vec![],
        error: None,
    })));
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    assert_eq!(harness.outcome, AuthOutcome::error("Authentication failed"));
}

#[tokio::test(start_paused = true)]
async fn capability_loads_late_through_stub() {
    let capability = Arc::new(FakeCapability::signed_in("tok123").stub_checks(4));
    let binding = FakeBinding::new(Some(capability)).absent_for(3);
    let harness = run_flow(binding, settings()).await;

    assert!(matches!(harness.outcome, AuthOutcome::Success { .. }));
    assert_eq!(harness.terminal_count(), 1);
    assert_eq!(harness.kinds()[0], EnvelopeKind::AuthStarted);
}

#[tokio::test(start_paused = true)]
async fn stub_that_never_initializes_times_out() {
    let capability = Arc::new(FakeCapability::signed_in("tok123").stub_checks(usize::MAX));
    let harness = run_flow(
        FakeBinding::new(Some(capability)),
        settings().with_capability_poll(RetryPolicy::from_millis(200, 10)),
    )
    .await;

    assert_eq!(harness.kinds(), vec![EnvelopeKind::AuthError]);
    match &harness.outcome {
        AuthOutcome::Error { message } => {
            assert!(message.starts_with("Timeout"));
            assert!(message.contains("StubPresent"));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn duplicate_success_delivery_is_idempotent() {
    let capability = Arc::new(FakeCapability::signed_in("tok123"));
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    let mut doubled = harness.posted.clone();
    doubled.push(harness.posted.last().unwrap().clone());
    let (outcomes, backing) = deliver(&doubled).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0], outcomes[1]);
    assert_eq!(backing.len(), 1);
    assert_eq!(
        backing.get_secret(ACCESS_TOKEN_KEY).await.unwrap(),
        Some(b"tok123".to_vec())
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_messages_do_not_disturb_flow() {
    let capability = Arc::new(FakeCapability::signed_in("tok123"));
    let harness = run_flow(FakeBinding::new(Some(capability)), settings()).await;

    let mut noisy = vec![
        "<html>".to_string(),
        r#"{"type":"AUTH_WHATEVER"}"#.to_string(),
    ];
    noisy.extend(harness.posted.iter().cloned());
    let (outcomes, backing) = deliver(&noisy).await;

    assert_eq!(outcomes.len(), 1);
    assert!(matches!(outcomes[0], ScreenOutcome::Success { .. }));
    assert_eq!(backing.len(), 1);
}
