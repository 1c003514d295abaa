//! The user-facing notification channel.
//!
//! The client reports each failed call here exactly once, with the same
//! localized text it puts on the `ClientError`. Delivery is fire-and-forget:
//! `notify` returns nothing and the client never waits on the UI.

use std::sync::Arc;

/// Receives one error message per failed call.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Emits notifications as `warn` events on the `notification` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(target: "notification", %message, "request failed");
    }
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, message: &str) {
        (**self).notify(message)
    }
}
