//! Session context
//!
//! The signed-in session is held by an explicit, cloneable [`SessionContext`]
//! handed to whoever needs it. Interested parties observe sign-in and sign-out
//! through a [`SessionSubscription`] and release it when they go away.

use std::sync::Arc;

use tokio::sync::watch;

use crate::types::{AuthUser, Session};

/// A change of the signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was stored (fresh sign-in or token refresh).
    SignedIn(AuthUser),
    SignedOut,
}

/// Shared holder of the current session.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl SessionContext {
    /// Context with nobody signed in.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Context that starts with `session`.
    pub fn with_session(session: Session) -> Self {
        let ctx = Self::new();
        ctx.tx.send_replace(Some(session));
        ctx
    }

    pub fn current_session(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.tx.borrow().as_ref().map(|s| s.user.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx.borrow().as_ref().map(|s| s.access_token.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Store `session` and notify subscribers.
    pub fn set_session(&self, session: Session) {
        log::debug!("Session stored for user {}", session.user.id);
        self.tx.send_replace(Some(session));
    }

    /// Drop the session. Subscribers are only notified if one was stored.
    pub fn clear(&self) {
        let cleared = self.tx.send_if_modified(|current| current.take().is_some());
        if cleared {
            log::debug!("Session cleared");
        }
    }

    /// Observe future session changes.
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle on session change notifications.
///
/// Only changes made after the subscription was taken are reported.
pub struct SessionSubscription {
    rx: Option<watch::Receiver<Option<Session>>>,
}

impl SessionSubscription {
    /// Wait for the next change.
    ///
    /// Returns `None` once unsubscribed or when the context is gone.
    pub async fn changed(&mut self) -> Option<SessionEvent> {
        let rx = self.rx.as_mut()?;
        rx.changed().await.ok()?;
        let event = match rx.borrow_and_update().as_ref() {
            Some(session) => SessionEvent::SignedIn(session.user.clone()),
            None => SessionEvent::SignedOut,
        };
        Some(event)
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(&mut self) {
        self.rx = None;
    }

    pub fn is_active(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(user_id: &str) -> Session {
        Session {
            access_token: format!("token-{user_id}"),
            refresh_token: None,
            expires_at: None,
            user: AuthUser {
                id: user_id.to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn starts_signed_out() {
        let ctx = SessionContext::new();
        assert!(!ctx.is_signed_in());
        assert!(ctx.current_user().is_none());
        assert!(ctx.access_token().is_none());
    }

    #[test]
    fn clones_share_state() {
        let ctx = SessionContext::new();
        let other = ctx.clone();
        ctx.set_session(session("u-1"));
        assert_eq!(other.current_user().map(|u| u.id), Some("u-1".to_string()));
        assert_eq!(other.access_token().as_deref(), Some("token-u-1"));
        other.clear();
        assert!(!ctx.is_signed_in());
    }

    #[tokio::test]
    async fn subscription_reports_sign_in_and_out() {
        let ctx = SessionContext::new();
        let mut sub = ctx.subscribe();

        ctx.set_session(session("u-1"));
        assert_eq!(
            sub.changed().await,
            Some(SessionEvent::SignedIn(session("u-1").user))
        );

        ctx.clear();
        assert_eq!(sub.changed().await, Some(SessionEvent::SignedOut));
    }

    #[tokio::test]
    async fn clearing_twice_notifies_once() {
        let ctx = SessionContext::with_session(session("u-1"));
        let mut sub = ctx.subscribe();
        ctx.clear();
        ctx.clear();
        assert_eq!(sub.changed().await, Some(SessionEvent::SignedOut));

        ctx.set_session(session("u-2"));
        assert_eq!(
            sub.changed().await,
            Some(SessionEvent::SignedIn(session("u-2").user))
        );
    }

    #[tokio::test]
    async fn unsubscribe_releases_receiver() {
        let ctx = SessionContext::new();
        let mut sub = ctx.subscribe();
        assert_eq!(ctx.subscriber_count(), 1);

        sub.unsubscribe();
        assert!(!sub.is_active());
        assert_eq!(ctx.subscriber_count(), 0);
        ctx.set_session(session("u-1"));
        assert_eq!(sub.changed().await, None);
    }
}
