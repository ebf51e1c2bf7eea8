// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session reconciliation: the single source of truth for who is signed in
//! and what their profile contains.
//!
//! The reconciler observes identity-changed events from the auth provider
//! and resolves each one against the profile store, producing a
//! [`SessionSnapshot`] broadcast over a watch channel. Consumers read the
//! snapshot through a receiver handle; there is no ambient global.
//!
//! Invariant: once `ready` is true, `identity` and `profile` are either
//! both set or both absent. A missing or unreachable store record is
//! replaced by a synthesized fallback profile, never by a null profile.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{Identity, Profile, ProfileDetails};
use crate::services::FirebaseAuthClient;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, watch};
use validator::Validate;

/// Reconciler state.
///
/// `ProfileLoading`, `ProfileReady` and `ProfileFallback` are the
/// authenticated sub-states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Before the first identity-changed event.
    Initializing,
    /// No identity.
    Anonymous,
    /// Identity present, profile resolution in flight.
    ProfileLoading,
    /// Identity present, stored profile loaded.
    ProfileReady,
    /// Identity present, synthesized profile substituted (record missing
    /// or store unreachable; the two cases deliberately converge).
    ProfileFallback,
}

/// The `{identity, profile, ready}` triple consumers observe.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub identity: Option<Identity>,
    pub profile: Option<Profile>,
    /// True once the current identity's profile resolution has finished.
    /// Cleared again while a subsequent sign-in's profile loads.
    pub ready: bool,
}

impl SessionSnapshot {
    fn initializing() -> Self {
        Self {
            state: SessionState::Initializing,
            identity: None,
            profile: None,
            ready: false,
        }
    }

    fn anonymous() -> Self {
        Self {
            state: SessionState::Anonymous,
            identity: None,
            profile: None,
            ready: true,
        }
    }
}

/// Reconciles auth-provider identity changes against the profile store.
///
/// Generic over [`ProfileStore`] so the state machine is testable offline.
pub struct SessionReconciler<S> {
    store: S,
    tx: watch::Sender<SessionSnapshot>,
    /// Bumped by every identity-changing entry point. A profile resolution
    /// commits only if the epoch it was issued under is still current, so a
    /// stale in-flight fetch can never clobber a newer identity.
    epoch: AtomicU64,
}

impl<S: ProfileStore> SessionReconciler<S> {
    pub fn new(store: S) -> Self {
        let (tx, _) = watch::channel(SessionSnapshot::initializing());
        Self {
            store,
            tx,
            epoch: AtomicU64::new(0),
        }
    }

    /// Subscribe to snapshot updates.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Publish `snapshot` unless a newer identity change superseded `epoch`.
    fn commit_if_current(&self, epoch: u64, snapshot: SessionSnapshot) -> bool {
        if self.current_epoch() != epoch {
            tracing::debug!(epoch, "Discarding superseded session update");
            return false;
        }
        self.tx.send_replace(snapshot);
        true
    }

    /// Handle an identity-changed event from the auth provider.
    ///
    /// `None` commits ANONYMOUS immediately; `Some` resolves the profile
    /// (stored record or fallback) before `ready` flips.
    pub async fn on_identity_changed(&self, identity: Option<Identity>) {
        let epoch = self.next_epoch();

        let Some(identity) = identity else {
            tracing::info!("Identity cleared, session anonymous");
            self.commit_if_current(epoch, SessionSnapshot::anonymous());
            return;
        };

        tracing::info!(uid = %identity.uid, "Identity changed, resolving profile");
        self.commit_if_current(
            epoch,
            SessionSnapshot {
                state: SessionState::ProfileLoading,
                identity: Some(identity.clone()),
                profile: None,
                ready: false,
            },
        );

        let (profile, state) = self.resolve_profile(&identity).await;

        let committed = self.commit_if_current(
            epoch,
            SessionSnapshot {
                state,
                identity: Some(identity.clone()),
                profile: Some(profile),
                ready: true,
            },
        );

        // Best-effort login stamp, after readiness is already observable.
        if committed && state == SessionState::ProfileReady {
            self.touch_last_login(&identity.uid).await;
        }
    }

    /// Fetch the profile for `identity`, falling back to a synthesized one.
    ///
    /// Not-found and store failure converge on the same fallback; the
    /// reconciler never blocks readiness on store availability.
    async fn resolve_profile(&self, identity: &Identity) -> (Profile, SessionState) {
        let fetched = self.store.get(&identity.uid).await.unwrap_or_else(|e| {
            tracing::warn!(uid = %identity.uid, error = %e, "Profile fetch failed");
            None
        });

        match fetched {
            Some(profile) => (profile, SessionState::ProfileReady),
            None => {
                tracing::warn!(uid = %identity.uid, "Using fallback profile");
                (Profile::fallback(identity, Utc::now()), SessionState::ProfileFallback)
            }
        }
    }

    /// Record the login time; failures are logged and discarded.
    async fn touch_last_login(&self, uid: &str) {
        if let Err(e) = self.store.set_last_login(uid, Utc::now()).await {
            tracing::warn!(uid, error = %e, "Could not record last login");
        }
    }

    /// Re-fetch the current identity's profile in place.
    ///
    /// Does not change `ready`. On failure or a missing record the profile
    /// is left untouched; only the initial load falls back.
    pub async fn refresh(&self) {
        let Some(identity) = self.snapshot().identity else {
            return;
        };
        let epoch = self.current_epoch();

        match self.store.get(&identity.uid).await {
            Ok(Some(profile)) => {
                let current = self.snapshot();
                if self.current_epoch() != epoch {
                    tracing::debug!(uid = %identity.uid, "Refresh superseded, discarding");
                    return;
                }
                self.tx.send_replace(SessionSnapshot {
                    state: SessionState::ProfileReady,
                    identity: current.identity,
                    profile: Some(profile),
                    ready: current.ready,
                });
                self.touch_last_login(&identity.uid).await;
            }
            Ok(None) => {
                tracing::warn!(uid = %identity.uid, "Refresh found no record, keeping profile");
            }
            Err(e) => {
                tracing::warn!(uid = %identity.uid, error = %e, "Refresh failed, keeping profile");
            }
        }
    }

    /// Sign out: identity and profile are cleared synchronously, before any
    /// in-flight store call settles. A pending resolution is superseded and
    /// its result discarded.
    pub fn sign_out(&self) {
        self.next_epoch();
        tracing::info!("Signed out");
        self.tx.send_replace(SessionSnapshot::anonymous());
    }

    /// Create the stored profile for a fresh signup, then resolve it into
    /// the session via the normal fetch-and-fallback path.
    ///
    /// Store failure on the create surfaces to the caller. Calling this
    /// twice for the same identity overwrites the prior record.
    pub async fn create_profile(
        &self,
        identity: &Identity,
        details: &ProfileDetails,
    ) -> Result<(), AppError> {
        details.validate()?;

        let profile = Profile::from_signup(identity, details, Utc::now());
        self.store.create(&profile).await?;
        tracing::info!(uid = %identity.uid, "Profile created");

        self.on_identity_changed(Some(identity.clone())).await;
        Ok(())
    }

    /// Persist an edited profile and update the snapshot.
    ///
    /// Store failure surfaces to the caller (so the UI can report it) and
    /// leaves reconciler state unchanged.
    pub async fn save_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let mut updated = profile.clone();
        updated.last_updated = Some(Utc::now());
        self.store.update(&updated).await?;

        let current = self.snapshot();
        if current
            .identity
            .as_ref()
            .is_some_and(|identity| identity.uid == updated.uid)
        {
            self.tx.send_replace(SessionSnapshot {
                state: SessionState::ProfileReady,
                profile: Some(updated),
                ..current
            });
        }
        Ok(())
    }

    /// Process identity-changed events in arrival order until the sender
    /// side closes. Later events supersede earlier in-flight resolutions.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<Option<Identity>>) {
        while let Some(identity) = events.recv().await {
            self.on_identity_changed(identity).await;
        }
        tracing::debug!("Identity event stream closed");
    }
}

/// Auth provider wired to a reconciler: the embedding shell's entry point
/// for credential flows.
pub struct Session<S> {
    auth: FirebaseAuthClient,
    reconciler: SessionReconciler<S>,
}

impl<S: ProfileStore> Session<S> {
    pub fn new(auth: FirebaseAuthClient, store: S) -> Self {
        Self {
            auth,
            reconciler: SessionReconciler::new(store),
        }
    }

    pub fn reconciler(&self) -> &SessionReconciler<S> {
        &self.reconciler
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.reconciler.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.reconciler.snapshot()
    }

    /// Sign in with email/password.
    ///
    /// Credential rejection is the only error that propagates; profile
    /// resolution after it can only succeed or fall back.
    pub async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AppError> {
        let identity = self.auth.sign_in_with_email(email, password).await?;
        self.reconciler
            .on_identity_changed(Some(identity.clone()))
            .await;
        Ok(identity)
    }

    /// Sign up with email/password and create the stored profile.
    pub async fn sign_up_with_email(
        &self,
        email: &str,
        password: &str,
        details: &ProfileDetails,
    ) -> Result<Identity, AppError> {
        let identity = self.auth.sign_up_with_email(email, password).await?;
        self.reconciler.create_profile(&identity, details).await?;
        Ok(identity)
    }

    /// Sign out immediately. Firebase email/password sessions are
    /// client-held tokens, so dropping local state is the whole operation.
    pub fn sign_out(&self) {
        self.reconciler.sign_out();
    }
}
