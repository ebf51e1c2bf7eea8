// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod firebase_auth;
pub mod streaming;
pub mod tmdb;
pub mod watchlist;

pub use firebase_auth::FirebaseAuthClient;
pub use streaming::{is_potentially_available, SearchLinks, StreamingPlatform};
pub use tmdb::{TimeWindow, TmdbClient};
pub use watchlist::{FileStorage, MemoryStorage, StorageBackend, Watchlist};
