// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session reconciler state-machine tests against an in-memory store.
//!
//! Covers readiness ordering, the fallback paths (not-found and store
//! failure converge), synchronous sign-out with an in-flight fetch, stale
//! fetch supersession, refresh semantics, and signup profile creation.

use chrono::{Duration, Utc};
use reelvault_core::db::ProfileStore;
use reelvault_core::error::AppError;
use reelvault_core::models::profile::{Plan, SubscriptionStatus};
use reelvault_core::models::{Identity, Profile, ProfileDetails};
use reelvault_core::{SessionReconciler, SessionState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// In-memory profile store with controllable failure modes.
///
/// Clones share state, so a test can keep a handle after moving a clone
/// into the reconciler.
#[derive(Clone, Default)]
struct MockStore {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    profiles: Mutex<HashMap<String, Profile>>,
    fail_get: AtomicBool,
    fail_create: AtomicBool,
    fail_last_login: AtomicBool,
    last_login_writes: AtomicUsize,
    /// Gates blocking `get` per UID until notified.
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl MockStore {
    fn new() -> Self {
        Self::default()
    }

    fn insert(&self, profile: Profile) {
        self.inner
            .profiles
            .lock()
            .unwrap()
            .insert(profile.uid.clone(), profile);
    }

    fn remove(&self, uid: &str) {
        self.inner.profiles.lock().unwrap().remove(uid);
    }

    fn stored(&self, uid: &str) -> Option<Profile> {
        self.inner.profiles.lock().unwrap().get(uid).cloned()
    }

    fn fail_get(&self, fail: bool) {
        self.inner.fail_get.store(fail, Ordering::SeqCst);
    }

    fn fail_create(&self, fail: bool) {
        self.inner.fail_create.store(fail, Ordering::SeqCst);
    }

    fn fail_last_login(&self, fail: bool) {
        self.inner.fail_last_login.store(fail, Ordering::SeqCst);
    }

    fn last_login_writes(&self) -> usize {
        self.inner.last_login_writes.load(Ordering::SeqCst)
    }

    /// Make `get(uid)` block until the returned handle is notified.
    fn gate(&self, uid: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner
            .gates
            .lock()
            .unwrap()
            .insert(uid.to_string(), gate.clone());
        gate
    }
}

impl ProfileStore for MockStore {
    async fn get(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        let gate = self.inner.gates.lock().unwrap().get(uid).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.inner.fail_get.load(Ordering::SeqCst) {
            return Err(AppError::Store("simulated outage".to_string()));
        }
        Ok(self.stored(uid))
    }

    async fn create(&self, profile: &Profile) -> Result<(), AppError> {
        if self.inner.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::Store("simulated write failure".to_string()));
        }
        self.insert(profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> Result<(), AppError> {
        self.insert(profile.clone());
        Ok(())
    }

    async fn set_last_login(
        &self,
        uid: &str,
        at: chrono::DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.inner.fail_last_login.load(Ordering::SeqCst) {
            return Err(AppError::Store("simulated write failure".to_string()));
        }
        let mut profiles = self.inner.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("profile {}", uid)))?;
        profile.last_login = at;
        self.inner.last_login_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add_to_my_list(&self, uid: &str, item_id: &str) -> Result<(), AppError> {
        let mut profiles = self.inner.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("profile {}", uid)))?;
        if !profile.my_list.iter().any(|id| id == item_id) {
            profile.my_list.push(item_id.to_string());
        }
        Ok(())
    }

    async fn remove_from_my_list(&self, uid: &str, item_id: &str) -> Result<(), AppError> {
        let mut profiles = self.inner.profiles.lock().unwrap();
        let profile = profiles
            .get_mut(uid)
            .ok_or_else(|| AppError::NotFound(format!("profile {}", uid)))?;
        profile.my_list.retain(|id| id != item_id);
        Ok(())
    }
}

fn identity(uid: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(format!("{}@example.com", uid)),
        phone: None,
        display_name: Some(format!("User {}", uid)),
        photo_url: None,
    }
}

fn stored_profile(uid: &str) -> Profile {
    let mut profile = Profile::fallback(&identity(uid), Utc::now());
    profile.first_name = Some("Stored".to_string());
    profile.subscription.plan = Plan::Premium;
    profile.subscription.status = SubscriptionStatus::Active;
    profile
}

#[tokio::test]
async fn test_ready_implies_identity_iff_profile() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = SessionReconciler::new(store);

    reconciler.on_identity_changed(Some(identity("u1"))).await;
    let snapshot = reconciler.snapshot();
    assert!(snapshot.ready);
    assert_eq!(snapshot.identity.is_some(), snapshot.profile.is_some());

    reconciler.on_identity_changed(None).await;
    let snapshot = reconciler.snapshot();
    assert!(snapshot.ready);
    assert_eq!(snapshot.identity.is_some(), snapshot.profile.is_some());
}

#[tokio::test]
async fn test_stored_profile_loads_ready() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = SessionReconciler::new(store.clone());

    reconciler.on_identity_changed(Some(identity("u1"))).await;

    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::ProfileReady);
    assert!(snapshot.ready);
    let profile = snapshot.profile.expect("profile");
    assert_eq!(profile.first_name.as_deref(), Some("Stored"));
    assert_eq!(profile.subscription.plan, Plan::Premium);
    // Best-effort login stamp was attempted exactly once
    assert_eq!(store.last_login_writes(), 1);
}

#[tokio::test]
async fn test_not_found_produces_trial_fallback() {
    let store = MockStore::new();
    let reconciler = SessionReconciler::new(store);

    reconciler.on_identity_changed(Some(identity("u1"))).await;

    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::ProfileFallback);
    assert!(snapshot.ready);

    let profile = snapshot.profile.expect("fallback profile");
    assert_eq!(profile.uid, "u1");
    assert_eq!(profile.email.as_deref(), Some("u1@example.com"));
    assert_eq!(profile.subscription.plan, Plan::Free);
    assert_eq!(profile.subscription.status, SubscriptionStatus::Trial);
    assert_eq!(
        profile.subscription.end_date - profile.subscription.start_date,
        Duration::days(7)
    );
}

#[tokio::test]
async fn test_store_error_produces_identical_fallback() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    store.fail_get(true);
    let reconciler = SessionReconciler::new(store);

    reconciler.on_identity_changed(Some(identity("u1"))).await;

    // Error path converges on the same fallback as not-found
    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::ProfileFallback);
    assert!(snapshot.ready);

    let profile = snapshot.profile.expect("fallback profile");
    assert_eq!(profile.subscription.plan, Plan::Free);
    assert_eq!(profile.subscription.status, SubscriptionStatus::Trial);
    assert_eq!(
        profile.subscription.end_date - profile.subscription.start_date,
        Duration::days(7)
    );
}

#[tokio::test]
async fn test_last_login_failure_does_not_affect_state() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    store.fail_last_login(true);
    let reconciler = SessionReconciler::new(store);

    reconciler.on_identity_changed(Some(identity("u1"))).await;

    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::ProfileReady);
    assert!(snapshot.ready);
    assert!(snapshot.profile.is_some());
}

#[tokio::test]
async fn test_sign_out_wins_over_pending_fetch() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let gate = store.gate("u1");
    let reconciler = Arc::new(SessionReconciler::new(store));

    let task = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            reconciler.on_identity_changed(Some(identity("u1"))).await;
        })
    };

    // Let the task reach the gated fetch
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    assert_eq!(reconciler.snapshot().state, SessionState::ProfileLoading);

    // Sign out while the fetch is pending: clears state synchronously
    reconciler.sign_out();
    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert!(snapshot.identity.is_none());
    assert!(snapshot.profile.is_none());

    // Release the fetch; its result must be discarded
    gate.notify_one();
    task.await.expect("task");

    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert!(snapshot.identity.is_none());
    assert!(snapshot.profile.is_none());
}

#[tokio::test]
async fn test_newer_identity_supersedes_stale_fetch() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    store.insert(stored_profile("u2"));
    let gate = store.gate("u1");
    let reconciler = Arc::new(SessionReconciler::new(store));

    let stale = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            reconciler.on_identity_changed(Some(identity("u1"))).await;
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    // A second identity arrives while u1's fetch is in flight
    reconciler.on_identity_changed(Some(identity("u2"))).await;
    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.identity.as_ref().map(|i| i.uid.as_str()), Some("u2"));

    // u1's fetch resolves late and must not win
    gate.notify_one();
    stale.await.expect("task");

    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.identity.as_ref().map(|i| i.uid.as_str()), Some("u2"));
    assert_eq!(
        snapshot.profile.as_ref().map(|p| p.uid.as_str()),
        Some("u2")
    );
}

#[tokio::test]
async fn test_ready_clears_while_switching_accounts() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    store.insert(stored_profile("u2"));
    let reconciler = Arc::new(SessionReconciler::new(store.clone()));

    reconciler.on_identity_changed(Some(identity("u1"))).await;
    assert!(reconciler.snapshot().ready);

    // A second sign-in drops readiness while the new profile loads
    let gate = store.gate("u2");
    let task = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            reconciler.on_identity_changed(Some(identity("u2"))).await;
        })
    };
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::ProfileLoading);
    assert!(!snapshot.ready);

    gate.notify_one();
    task.await.expect("task");

    let snapshot = reconciler.snapshot();
    assert!(snapshot.ready);
    assert_eq!(
        snapshot.profile.as_ref().map(|p| p.uid.as_str()),
        Some("u2")
    );
}

#[tokio::test]
async fn test_refresh_updates_profile_in_place() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = SessionReconciler::new(store.clone());
    reconciler.on_identity_changed(Some(identity("u1"))).await;

    let mut edited = store.stored("u1").expect("stored");
    edited.bio = Some("Updated bio".to_string());
    store.insert(edited);

    reconciler.refresh().await;

    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::ProfileReady);
    assert!(snapshot.ready);
    assert_eq!(
        snapshot.profile.and_then(|p| p.bio).as_deref(),
        Some("Updated bio")
    );
}

#[tokio::test]
async fn test_refresh_failure_keeps_profile() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = SessionReconciler::new(store.clone());
    reconciler.on_identity_changed(Some(identity("u1"))).await;
    let before = reconciler.snapshot();

    store.fail_get(true);
    reconciler.refresh().await;

    let after = reconciler.snapshot();
    assert_eq!(after.state, before.state);
    assert_eq!(after.profile, before.profile);
}

#[tokio::test]
async fn test_refresh_not_found_keeps_profile() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = SessionReconciler::new(store.clone());
    reconciler.on_identity_changed(Some(identity("u1"))).await;
    let before = reconciler.snapshot();

    store.remove("u1");
    reconciler.refresh().await;

    // No fallback overwrite on refresh
    let after = reconciler.snapshot();
    assert!(after.profile.is_some());
    assert_eq!(after.profile, before.profile);
}

#[tokio::test]
async fn test_create_profile_signup_flow() {
    let store = MockStore::new();
    let reconciler = SessionReconciler::new(store.clone());

    let details = ProfileDetails {
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        age: Some(28),
        ..Default::default()
    };
    reconciler
        .create_profile(&identity("u1"), &details)
        .await
        .expect("create");

    // Record written, then loaded through the normal path
    assert!(store.stored("u1").is_some());
    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::ProfileReady);
    assert!(snapshot.ready);
    assert_eq!(
        snapshot.profile.and_then(|p| p.first_name).as_deref(),
        Some("Ada")
    );
}

#[tokio::test]
async fn test_create_profile_write_failure_surfaces() {
    let store = MockStore::new();
    store.fail_create(true);
    let reconciler = SessionReconciler::new(store);

    let result = reconciler
        .create_profile(&identity("u1"), &ProfileDetails::default())
        .await;

    assert!(matches!(result, Err(AppError::Store(_))));
    // State untouched by the failed signup
    assert_eq!(reconciler.snapshot().state, SessionState::Initializing);
}

#[tokio::test]
async fn test_create_profile_rejects_invalid_details() {
    let store = MockStore::new();
    let reconciler = SessionReconciler::new(store.clone());

    let details = ProfileDetails {
        age: Some(12),
        ..Default::default()
    };
    let result = reconciler.create_profile(&identity("u1"), &details).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.stored("u1").is_none());
}

#[tokio::test]
async fn test_save_profile_updates_store_and_snapshot() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = SessionReconciler::new(store.clone());
    reconciler.on_identity_changed(Some(identity("u1"))).await;

    let mut edited = reconciler.snapshot().profile.expect("profile");
    edited.bio = Some("New bio".to_string());
    reconciler.save_profile(&edited).await.expect("save");

    assert_eq!(
        store.stored("u1").and_then(|p| p.bio).as_deref(),
        Some("New bio")
    );
    assert_eq!(
        reconciler.snapshot().profile.and_then(|p| p.bio).as_deref(),
        Some("New bio")
    );
}

#[tokio::test]
async fn test_run_processes_events_in_order() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = Arc::new(SessionReconciler::new(store));

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let driver = {
        let reconciler = reconciler.clone();
        tokio::spawn(async move { reconciler.run(rx).await })
    };

    tx.send(Some(identity("u1"))).expect("send");
    tx.send(None).expect("send");
    drop(tx);
    driver.await.expect("driver");

    // The last event wins
    let snapshot = reconciler.snapshot();
    assert_eq!(snapshot.state, SessionState::Anonymous);
    assert!(snapshot.ready);
}

#[tokio::test]
async fn test_subscribers_observe_transitions() {
    let store = MockStore::new();
    store.insert(stored_profile("u1"));
    let reconciler = SessionReconciler::new(store);
    let mut rx = reconciler.subscribe();

    assert_eq!(rx.borrow().state, SessionState::Initializing);

    reconciler.on_identity_changed(Some(identity("u1"))).await;
    rx.changed().await.expect("watch channel open");
    assert_eq!(rx.borrow_and_update().state, SessionState::ProfileReady);

    reconciler.on_identity_changed(None).await;
    rx.changed().await.expect("watch channel open");
    assert_eq!(rx.borrow_and_update().state, SessionState::Anonymous);
}
