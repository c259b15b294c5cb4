//! Capability readiness polling.
//!
//! The vendor script installs its global on its own schedule and may publish
//! a placeholder first. [`CapabilityPoller`] waits for the page to settle,
//! then inspects the binding on a fixed cadence until the capability is live
//! or the attempt budget runs out.

use std::sync::Arc;

use bridge_traits::{AuthCapability, CapabilityBinding, DocumentLifecycle, DocumentReadyState};
use core_async::retry::{poll_until, PollError, Probe, RetryPolicy};
use core_async::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

use crate::error::{AuthError, Result};
use crate::types::CapabilityState;

const STUB_NOT_INITIALIZED: &str = "Not initialized";
const STUB_FAILURE_LITERAL: &str = "success: false";

/// Whether an entry-point source text is the vendor placeholder.
///
/// The placeholder answers every call with a "not initialized" failure; both
/// markers must be present.
pub fn is_stub_signature(source: &str) -> bool {
    source.contains(STUB_NOT_INITIALIZED) && source.contains(STUB_FAILURE_LITERAL)
}

/// Classifies a resolved capability.
///
/// The explicit readiness flag wins. The entry-point signature is consulted
/// only when the vendor does not publish the flag, and a capability that
/// exposes neither is taken as live.
pub fn classify(capability: &dyn AuthCapability) -> CapabilityState {
    match capability.readiness() {
        Some(true) => CapabilityState::Ready,
        Some(false) => CapabilityState::StubPresent,
        None => match capability.entry_point_signature() {
            Some(source) if is_stub_signature(&source) => CapabilityState::StubPresent,
            _ => CapabilityState::Ready,
        },
    }
}

pub struct CapabilityPoller {
    binding: Arc<dyn CapabilityBinding>,
    lifecycle: Arc<dyn DocumentLifecycle>,
    settle_delay: Duration,
    state: CapabilityState,
    transitions: Vec<CapabilityState>,
}

impl CapabilityPoller {
    pub fn new(
        binding: Arc<dyn CapabilityBinding>,
        lifecycle: Arc<dyn DocumentLifecycle>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            binding,
            lifecycle,
            settle_delay,
            state: CapabilityState::Absent,
            transitions: vec![CapabilityState::Absent],
        }
    }

    /// Latest observed state. Never moves backwards.
    pub fn state(&self) -> CapabilityState {
        self.state
    }

    /// Distinct states in the order they were first observed, starting with
    /// `Absent`.
    pub fn transitions(&self) -> &[CapabilityState] {
        &self.transitions
    }

    /// Waits until the capability is live.
    ///
    /// Waits for DOMContentLoaded if the document is still parsing, otherwise
    /// for the settle delay, then checks at most `policy.max_attempts` times.
    pub async fn await_ready(&mut self, policy: RetryPolicy) -> Result<Arc<dyn AuthCapability>> {
        if !self.wait_for_document(policy.total_budget()).await {
            warn!(last_state = %self.state, "Document never finished loading");
            return Err(AuthError::CapabilityTimeout {
                attempts: 0,
                last_state: self.state,
            });
        }

        let binding = Arc::clone(&self.binding);
        let state = &mut self.state;
        let transitions = &mut self.transitions;

        let result = poll_until(policy, |attempt| {
            let resolved = binding.resolve();
            let observed = resolved
                .as_deref()
                .map(classify)
                .unwrap_or(CapabilityState::Absent);

            let next = state.advance(observed);
            if next != *state {
                debug!(attempt, from = %state, to = %next, "Capability state advanced");
                *state = next;
                transitions.push(next);
            }

            let probe = match resolved {
                Some(capability) if next.is_ready() => Probe::Ready(capability),
                _ => Probe::Pending,
            };
            std::future::ready(probe)
        })
        .await;

        match result {
            Ok(capability) => {
                info!(transitions = ?self.transitions, "Authentication capability ready");
                Ok(capability)
            }
            Err(PollError::Exhausted { attempts }) | Err(PollError::Aborted { attempt: attempts, .. }) => {
                warn!(attempts, last_state = %self.state, "Authentication capability never became ready");
                Err(AuthError::CapabilityTimeout {
                    attempts,
                    last_state: self.state,
                })
            }
        }
    }

    /// `false` when DOMContentLoaded did not fire within `budget`.
    async fn wait_for_document(&self, budget: Duration) -> bool {
        match self.lifecycle.ready_state() {
            DocumentReadyState::Loading => {
                debug!(?budget, "Waiting for DOMContentLoaded");
                timeout(budget, self.lifecycle.dom_content_loaded())
                    .await
                    .is_ok()
            }
            DocumentReadyState::Interactive | DocumentReadyState::Complete => {
                if !self.settle_delay.is_zero() {
                    sleep(self.settle_delay).await;
                }
                true
            }
        }
    }
}
