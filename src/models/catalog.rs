// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Catalog value objects as returned by TMDB.
//!
//! These are immutable, externally-sourced records; field names follow the
//! TMDB wire format so they deserialize directly.

use serde::{Deserialize, Serialize};

/// A movie from the TMDB catalog.
///
/// `budget` is only populated by the details endpoint; list endpoints omit
/// it, which the availability heuristic treats as "low budget".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    /// Release date as `YYYY-MM-DD`; may be absent or empty
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    /// Average vote, 0–10
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    /// Production budget in USD (details endpoint only)
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub popularity: f64,
}

/// A TV show from the TMDB catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TvShow {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

/// A TMDB genre, as returned by the genre list endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

/// Envelope for `/genre/{movie,tv}/list`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenreList {
    pub genres: Vec<Genre>,
}

/// Paged TMDB response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}
