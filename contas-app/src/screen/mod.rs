//! Account screen controller
//!
//! Owns the state of the bank-account screen and drives the repository:
//! load on mount, add/edit through a validated modal form, two-phase delete,
//! and a full refetch after every successful write.
//!
//! State lives behind a `tokio::sync::RwLock` that is never held across a
//! repository call, so independent operations may overlap; whichever refresh
//! finishes last decides what is shown. After [`AccountsScreen::dispose`] every
//! late result is dropped.

mod form;
mod state;

pub use form::{to_validation_errors, AccountField, AccountForm, FieldErrors, ValidatedForm};
pub use state::{
    describe_error, AccountsState, Alert, AlertKind, FormMode, ModalState, PendingDelete, Phase,
};

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use contas_core::error::CoreError;
use contas_core::traits::AccountRepository;
use contas_core::types::BankAccount;
use contas_core::{SessionContext, SessionEvent};

struct Inner {
    repository: Arc<dyn AccountRepository>,
    session: SessionContext,
    state: RwLock<AccountsState>,
    alive: AtomicBool,
    /// List calls started and not yet settled; only touched under the state lock
    loads_in_flight: AtomicUsize,
    watcher: OnceLock<JoinHandle<()>>,
}

/// Controller for one instance of the accounts screen.
///
/// Cheap to clone; clones drive the same screen.
#[derive(Clone)]
pub struct AccountsScreen {
    inner: Arc<Inner>,
}

impl AccountsScreen {
    pub fn new(repository: Arc<dyn AccountRepository>, session: SessionContext) -> Self {
        Self {
            inner: Arc::new(Inner {
                repository,
                session,
                state: RwLock::new(AccountsState::new()),
                alive: AtomicBool::new(true),
                loads_in_flight: AtomicUsize::new(0),
                watcher: OnceLock::new(),
            }),
        }
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> AccountsState {
        self.inner.state.read().await.clone()
    }

    pub fn is_alive(&self) -> bool {
        self.inner.alive.load(Ordering::SeqCst)
    }

    /// Apply `f` to the state unless the screen was disposed.
    async fn apply<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut AccountsState),
    {
        if !self.is_alive() {
            return false;
        }
        let mut state = self.inner.state.write().await;
        if !self.is_alive() {
            return false;
        }
        f(&mut state);
        true
    }

    // ===== Lifecycle =====

    /// Start watching the session and load the signed-in user's accounts.
    ///
    /// Always ends in `Phase::Ready`: a failed load leaves an empty list and an
    /// alert, a missing user a not-signed-in alert.
    pub async fn mount(&self) {
        if !self.is_alive() {
            return;
        }
        self.watch_session();
        self.refresh().await;
    }

    /// Stop watching the session and drop every result that arrives later.
    pub fn dispose(&self) {
        if self.inner.alive.swap(false, Ordering::SeqCst) {
            if let Some(handle) = self.inner.watcher.get() {
                handle.abort();
            }
            log::debug!("Accounts screen disposed");
        }
    }

    fn watch_session(&self) {
        if self.inner.watcher.get().is_some() {
            return;
        }
        let mut subscription = self.inner.session.subscribe();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let handle = tokio::spawn(async move {
            while let Some(event) = subscription.changed().await {
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                let screen = AccountsScreen { inner };
                if !screen.is_alive() {
                    break;
                }
                screen.on_session_event(event).await;
            }
            subscription.unsubscribe();
        });

        if let Err(duplicate) = self.inner.watcher.set(handle) {
            duplicate.abort();
        }
    }

    async fn on_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(user) => {
                let same_owner =
                    self.inner.state.read().await.owner_id.as_deref() == Some(user.id.as_str());
                if !same_owner {
                    log::info!("Session changed to {}, reloading accounts", user.id);
                    self.refresh().await;
                }
            }
            SessionEvent::SignedOut => {
                log::info!("Signed out, clearing accounts");
                self.apply(AccountsState::reset_for_sign_out).await;
            }
        }
    }

    /// Refetch the signed-in user's accounts.
    ///
    /// On failure the current collection is kept (unless it belonged to another
    /// user) and a load alert is raised. A result is dropped when the session no
    /// longer belongs to the user it was fetched for.
    pub async fn refresh(&self) {
        let Some(user) = self.inner.session.current_user() else {
            self.apply(AccountsState::reset_for_sign_out).await;
            return;
        };

        let started = self
            .apply(|s| {
                self.inner.loads_in_flight.fetch_add(1, Ordering::SeqCst);
                s.loading = true;
            })
            .await;
        if !started {
            return;
        }
        let result = self.inner.repository.list(&user.id).await;

        self.apply(|s| {
            let remaining = self.inner.loads_in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            s.loading = remaining > 0;

            let current = self.inner.session.current_user();
            if current.as_ref().map(|u| u.id.as_str()) != Some(user.id.as_str()) {
                log::debug!("Dropping accounts fetched for {}: session changed", user.id);
                return;
            }

            s.phase = Phase::Ready;
            match result {
                Ok(accounts) => {
                    s.accounts = accounts;
                    s.owner_id = Some(user.id);
                }
                Err(e) => {
                    log::warn!("Account list unavailable: {e}");
                    if s.owner_id.as_deref() != Some(user.id.as_str()) {
                        s.accounts.clear();
                        s.owner_id = Some(user.id);
                    }
                    s.alert = Some(Alert::new(AlertKind::LoadFailed, describe_error(&e)));
                }
            }
        })
        .await;
    }

    // ===== Modal =====

    /// Open an empty add form.
    pub async fn open_add(&self) {
        self.apply(|s| s.modal = Some(ModalState::add())).await;
    }

    /// Open the edit form for `account`, pre-filled with its values.
    pub async fn open_edit(&self, account: &BankAccount) {
        let Some(id) = account.id else {
            log::warn!("Cannot edit an account that was never saved");
            return;
        };
        self.apply(|s| s.modal = Some(ModalState::edit(id, account)))
            .await;
    }

    /// Close the modal, discarding the form.
    pub async fn close_modal(&self) {
        self.apply(|s| s.modal = None).await;
    }

    /// Update one form field. Clears that field's error and the modal error.
    pub async fn set_field(&self, field: AccountField, value: impl Into<String>) {
        let value = value.into();
        self.apply(|s| {
            if let Some(modal) = s.modal.as_mut() {
                modal.form.set(field, value);
                modal.field_errors.remove(&field);
                modal.error = None;
            }
        })
        .await;
    }

    /// Check the form and publish field errors. Never touches the repository.
    ///
    /// Returns `false` when there is no open modal or a field is invalid.
    pub async fn validate(&self) -> bool {
        let mut valid = false;
        self.apply(|s| {
            if let Some(modal) = s.modal.as_mut() {
                match modal.form.validate() {
                    Ok(_) => {
                        modal.field_errors.clear();
                        valid = true;
                    }
                    Err(errors) => modal.field_errors = errors,
                }
            }
        })
        .await;
        valid
    }

    /// Validate and save the open form.
    ///
    /// Add creates an account for the signed-in user; edit sends only the changed
    /// fields, guarded by the record's `updated_at`. Success closes the modal and
    /// refetches; failure keeps the modal open with an error.
    /// Returns whether the save went through.
    pub async fn submit(&self) -> bool {
        let mut prepared = None;
        self.apply(|s| {
            let Some(modal) = s.modal.as_mut() else {
                return;
            };
            if s.submitting {
                return;
            }
            match modal.form.validate() {
                Ok(valid) => {
                    modal.field_errors.clear();
                    modal.error = None;
                    prepared = Some((modal.mode.clone(), valid));
                    s.submitting = true;
                }
                Err(errors) => {
                    log::debug!(
                        "Account form rejected: {}",
                        to_validation_errors(&errors)
                    );
                    modal.field_errors = errors;
                }
            }
        })
        .await;
        let Some((mode, valid)) = prepared else {
            return false;
        };

        let result = match mode {
            FormMode::Add => match self.inner.session.current_user() {
                Some(user) => self
                    .inner
                    .repository
                    .create(valid.into_new(user.id))
                    .await
                    .map(|_| ()),
                None => Err(CoreError::NotAuthenticated),
            },
            FormMode::Edit { id, original } => self
                .inner
                .repository
                .update(id, valid.patch_against(&original))
                .await
                .map(|_| ()),
        };

        match result {
            Ok(()) => {
                self.apply(|s| {
                    s.submitting = false;
                    s.modal = None;
                })
                .await;
                self.refresh().await;
                true
            }
            Err(e) => {
                let message = describe_error(&e);
                self.apply(|s| {
                    s.submitting = false;
                    match s.modal.as_mut() {
                        Some(modal) => modal.error = Some(message),
                        None => s.alert = Some(Alert::new(AlertKind::SaveFailed, message)),
                    }
                })
                .await;
                false
            }
        }
    }

    // ===== Delete =====

    /// First phase of a delete: remember the account and wait for confirmation.
    pub async fn request_delete(&self, account: &BankAccount) {
        let Some(id) = account.id else {
            return;
        };
        let pending = PendingDelete {
            id,
            description: account.description.clone(),
        };
        self.apply(|s| s.pending_delete = Some(pending)).await;
    }

    pub async fn cancel_delete(&self) {
        self.apply(|s| s.pending_delete = None).await;
    }

    /// Second phase: delete the pending account and refetch.
    ///
    /// On failure the collection stays as it was and a one-shot alert is raised.
    /// Returns whether the delete went through.
    pub async fn confirm_delete(&self) -> bool {
        let mut target = None;
        self.apply(|s| {
            target = s.pending_delete.take();
            if target.is_some() {
                s.deleting = true;
            }
        })
        .await;
        let Some(pending) = target else {
            return false;
        };

        match self.inner.repository.delete(pending.id).await {
            Ok(()) => {
                self.apply(|s| s.deleting = false).await;
                self.refresh().await;
                true
            }
            Err(e) => {
                let message = describe_error(&e);
                self.apply(|s| {
                    s.deleting = false;
                    s.alert = Some(Alert::new(AlertKind::DeleteFailed, message));
                })
                .await;
                false
            }
        }
    }

    // ===== Alerts =====

    pub async fn dismiss_alert(&self) {
        self.apply(|s| s.alert = None).await;
    }
}
