// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! ReelVault core: the headless backend of a movie-browsing app.
//!
//! This crate owns session reconciliation (auth identity ↔ stored profile),
//! the TMDB catalog client, the locally persisted watchlist, and the
//! free-streaming availability heuristic. It is meant to be embedded in a
//! UI shell; there is no wire protocol or CLI here.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod time_utils;

pub use error::{AppError, Result};
pub use session::{Session, SessionReconciler, SessionSnapshot, SessionState};

use config::Config;
use db::FirestoreProfiles;
use services::{FileStorage, FirebaseAuthClient, TmdbClient, Watchlist};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared application core for embedding shells.
pub struct AppCore {
    pub config: Config,
    pub tmdb: TmdbClient,
    pub session: Session<FirestoreProfiles>,
    pub watchlist: Watchlist<FileStorage>,
}

impl AppCore {
    /// Connect external collaborators and load local state.
    pub async fn bootstrap(config: Config) -> Result<Self> {
        let store = FirestoreProfiles::new(&config.gcp_project_id).await?;
        let auth = FirebaseAuthClient::new(config.firebase_api_key.clone());
        let tmdb =
            TmdbClient::with_base_url(config.tmdb_api_key.clone(), config.tmdb_base_url.clone());
        let watchlist = Watchlist::load(FileStorage::new(config.data_dir.clone()));

        tracing::info!(data_dir = %config.data_dir, "Application core ready");

        Ok(Self {
            config,
            tmdb,
            session: Session::new(auth, store),
            watchlist,
        })
    }
}

/// Initialize structured JSON logging.
///
/// For embedding shells that do not install their own subscriber; call at
/// most once, before anything else logs.
pub fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reelvault_core=debug".parse().expect("static directive"))
                .add_directive("info".parse().expect("static directive")),
        )
        .with(format)
        .init();
}
