//! Rendezvous between the web callback listener and the interactive flow.
//!
//! The flow arms the slot and awaits the receiver; the listener delivers the
//! `(code, state)` pair from the redirect. Delivery succeeds at most once
//! per arming.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

/// Query parameters carried by the platform's redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCallback {
    pub code: String,
    pub state: String,
    /// Set when the operator declined consent (`error` / `error_description`).
    pub error: Option<String>,
}

impl AuthCallback {
    /// A successful redirect carrying an authorization code.
    pub fn code(code: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: state.into(),
            error: None,
        }
    }
}

/// Single-flight slot for the pending authorization exchange.
#[derive(Debug, Clone, Default)]
pub struct AuthCallbackSlot {
    pending: Arc<Mutex<Option<oneshot::Sender<AuthCallback>>>>,
}

impl AuthCallbackSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the slot for one callback and return the receiving end.
    ///
    /// Arming again replaces (and thereby abandons) any earlier receiver.
    pub fn arm(&self) -> oneshot::Receiver<AuthCallback> {
        let (tx, rx) = oneshot::channel();
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
        rx
    }

    /// Hand a callback to the waiting flow.
    ///
    /// Returns `false` when nothing is waiting, including a second delivery
    /// for the same arming.
    pub fn deliver(&self, callback: AuthCallback) -> bool {
        let sender = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(callback).is_ok(),
            None => false,
        }
    }

    /// Whether a flow is currently waiting.
    pub fn is_armed(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Drop the waiting sender so the flow fails fast.
    pub fn disarm(&self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deliver_reaches_armed_receiver() {
        let slot = AuthCallbackSlot::new();
        let rx = slot.arm();
        assert!(slot.is_armed());

        assert!(slot.deliver(AuthCallback::code("the-code", "the-state")));
        let received = rx.await.unwrap();
        assert_eq!(received.code, "the-code");
        assert_eq!(received.state, "the-state");
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_deliver_without_arming_is_rejected() {
        let slot = AuthCallbackSlot::new();
        assert!(!slot.deliver(AuthCallback::code("c", "s")));
    }

    #[tokio::test]
    async fn test_second_delivery_is_rejected() {
        let slot = AuthCallbackSlot::new();
        let _rx = slot.arm();
        assert!(slot.deliver(AuthCallback::code("first", "s")));
        assert!(!slot.deliver(AuthCallback::code("second", "s")));
    }

    #[tokio::test]
    async fn test_disarm_abandons_receiver() {
        let slot = AuthCallbackSlot::new();
        let rx = slot.arm();
        slot.disarm();
        assert!(rx.await.is_err());
    }

    #[test]
    fn test_dropped_receiver_is_not_armed() {
        let slot = AuthCallbackSlot::new();
        drop(slot.arm());
        assert!(!slot.is_armed());
        assert!(!slot.deliver(AuthCallback::code("c", "s")));
    }
}
