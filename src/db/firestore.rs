// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed profile store.
//!
//! One document per user in the `users` collection, keyed by the auth
//! provider UID. My-list mutations re-read the document first and accept
//! last-writer-wins; there is no optimistic concurrency token.

use crate::db::{collections, ProfileStore};
use crate::error::AppError;
use crate::models::Profile;
use chrono::{DateTime, Utc};

/// Firestore profile store.
#[derive(Clone)]
pub struct FirestoreProfiles {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreProfiles {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Store(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock client for testing (offline mode).
    ///
    /// All store operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Store("Database not connected (offline mode)".to_string()))
    }

    /// Create or replace a profile document (Firestore upsert).
    async fn upsert(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&profile.uid)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Store(e.to_string()))?;
        Ok(())
    }

    /// Re-fetch a profile, apply `mutate`, and write it back.
    ///
    /// Last-writer-wins: another writer between the read and the write is
    /// silently overwritten.
    async fn read_modify_write<F>(&self, uid: &str, mutate: F) -> Result<(), AppError>
    where
        F: FnOnce(&mut Profile) -> bool,
    {
        let mut profile = self
            .get(uid)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile {}", uid)))?;

        if mutate(&mut profile) {
            profile.last_updated = Some(Utc::now());
            self.upsert(&profile).await?;
        }
        Ok(())
    }
}

impl ProfileStore for FirestoreProfiles {
    async fn get(&self, uid: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(uid)
            .await
            .map_err(|e| AppError::Store(e.to_string()))
    }

    async fn create(&self, profile: &Profile) -> Result<(), AppError> {
        // Deliberately an upsert: a repeated signup for the same UID
        // overwrites the prior record.
        self.upsert(profile).await
    }

    async fn update(&self, profile: &Profile) -> Result<(), AppError> {
        self.upsert(profile).await
    }

    async fn set_last_login(&self, uid: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        self.read_modify_write(uid, |profile| {
            profile.last_login = at;
            true
        })
        .await
    }

    async fn add_to_my_list(&self, uid: &str, item_id: &str) -> Result<(), AppError> {
        self.read_modify_write(uid, |profile| {
            if profile.my_list.iter().any(|id| id == item_id) {
                return false;
            }
            profile.my_list.push(item_id.to_string());
            true
        })
        .await
    }

    async fn remove_from_my_list(&self, uid: &str, item_id: &str) -> Result<(), AppError> {
        self.read_modify_write(uid, |profile| {
            let before = profile.my_list.len();
            profile.my_list.retain(|id| id != item_id);
            profile.my_list.len() != before
        })
        .await
    }
}
