//! Outbound hooks fired after lifecycle transitions.
//!
//! Both hooks are best-effort: they are invoked after the transition is
//! persisted and their outcome never affects action state. Implementations
//! must not block for long; anything slow belongs behind the
//! implementation's own queue.

use acta_types::{ActionRecord, ParticipantId};

/// Delivers human-facing notifications (pending verification requests,
/// outcome notices).
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient: &ParticipantId, subject: &str, body: &str);
}

/// Invoked once per completed action matching the configured significance
/// predicate (domain, tag, or amount threshold). The record carries the
/// initiator and every contributing verifier.
pub trait RewardHook: Send + Sync {
    fn reward(&self, record: &ActionRecord);
}

/// Discards all notifications.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _recipient: &ParticipantId, _subject: &str, _body: &str) {}
}

/// Ignores rewards.
pub struct NoopReward;

impl RewardHook for NoopReward {
    fn reward(&self, _record: &ActionRecord) {}
}
