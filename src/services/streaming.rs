// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Free-streaming availability heuristic and platform deep links.
//!
//! We do not host or stream content; these helpers point users at legal
//! platforms. The availability predicate is a heuristic only: Tubi tends to
//! carry older, lower-budget, mid-rated titles, so that is what it scores.

use crate::models::Movie;
use crate::time_utils::release_year;
use chrono::{Datelike, Utc};

/// Titles younger than this many years are never classified available.
const MIN_AGE_YEARS: i32 = 3;
/// Budgets below this (USD) count as low budget.
const LOW_BUDGET_CEILING: u64 = 50_000_000;
/// Inclusive vote-average band counted as a "moderate" rating.
const MODERATE_RATING_MIN: f64 = 5.0;
const MODERATE_RATING_MAX: f64 = 8.0;

/// Guess whether a movie might be available on a free ad-supported
/// platform.
///
/// Pure and deterministic for a fixed calendar year; the clock is the only
/// ambient input. See [`is_potentially_available_in_year`] for the rules.
pub fn is_potentially_available(movie: &Movie) -> bool {
    is_potentially_available_in_year(movie, Utc::now().year())
}

/// Year-parameterized form of [`is_potentially_available`], for callers and
/// tests that need determinism.
///
/// Rules: the title must be at least three years old, and either low-budget
/// (a missing budget counts as low) or moderately rated (vote average in
/// [5.0, 8.0], inclusive). A missing or unparseable release date means the
/// title is never classified available.
pub fn is_potentially_available_in_year(movie: &Movie, current_year: i32) -> bool {
    let Some(year) = movie.release_date.as_deref().and_then(release_year) else {
        return false;
    };

    let age = current_year - year;
    let is_older = age >= MIN_AGE_YEARS;
    let is_low_budget = movie.budget.map_or(true, |b| b < LOW_BUDGET_CEILING);
    let is_moderate_rating =
        movie.vote_average >= MODERATE_RATING_MIN && movie.vote_average <= MODERATE_RATING_MAX;

    is_older && (is_low_budget || is_moderate_rating)
}

/// A streaming platform users can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingPlatform {
    pub name: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

/// Free ad-supported platforms, in display order.
pub const FREE_PLATFORMS: &[StreamingPlatform] = &[
    StreamingPlatform {
        name: "Tubi",
        url: "https://tubitv.com",
        description: "Free movies and TV shows with ads",
    },
    StreamingPlatform {
        name: "Crackle",
        url: "https://www.crackle.com",
        description: "Free Sony movies and shows with ads",
    },
    StreamingPlatform {
        name: "Pluto TV",
        url: "https://pluto.tv",
        description: "Free live TV and on-demand content",
    },
    StreamingPlatform {
        name: "YouTube Movies",
        url: "https://www.youtube.com/movies",
        description: "Free movies with ads and paid rentals",
    },
    StreamingPlatform {
        name: "Internet Archive",
        url: "https://archive.org/details/movies",
        description: "Public domain and classic films",
    },
];

/// Tubi genre slug mapping (TMDB genre name → Tubi category).
const TUBI_CATEGORIES: &[(&str, &str)] = &[
    ("action", "action"),
    ("comedy", "comedy"),
    ("drama", "drama"),
    ("horror", "horror"),
    ("thriller", "thriller"),
    ("romance", "romance"),
    ("documentary", "documentaries"),
    ("family", "kids-family"),
    ("animation", "animation"),
    ("crime", "crime"),
    ("mystery", "mystery"),
    ("adventure", "action-adventure"),
];

/// Tubi search URL for a title, optionally disambiguated by year.
pub fn tubi_search_url(title: &str, year: Option<i32>) -> String {
    let query = match year {
        Some(year) => format!("{} {}", title, year),
        None => title.to_string(),
    };
    format!("https://tubitv.com/search/{}", urlencoding::encode(&query))
}

/// Tubi browse URL for a genre; falls back to the movies landing page for
/// genres Tubi has no category for.
pub fn tubi_browse_url(genre: Option<&str>) -> String {
    if let Some(genre) = genre {
        let genre = genre.to_lowercase();
        if let Some((_, slug)) = TUBI_CATEGORIES.iter().find(|(name, _)| *name == genre) {
            return format!("https://tubitv.com/category/{}", slug);
        }
    }
    "https://tubitv.com/movies".to_string()
}

/// Search deep links across the major lookup platforms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchLinks {
    pub just_watch: String,
    pub tubi: String,
    pub google: String,
    pub youtube: String,
    pub imdb: String,
    pub rotten_tomatoes: String,
}

/// Build per-platform search URLs for a title.
pub fn search_links(title: &str, year: Option<i32>) -> SearchLinks {
    let query = match year {
        Some(year) => format!("{} {}", title, year),
        None => title.to_string(),
    };
    let encoded = urlencoding::encode(&query).into_owned();

    SearchLinks {
        just_watch: format!("https://www.justwatch.com/us/search?q={}", encoded),
        tubi: format!("https://tubitv.com/search/{}", encoded),
        google: format!(
            "https://www.google.com/search?q={}+watch+online+streaming",
            encoded
        ),
        youtube: format!(
            "https://www.youtube.com/results?search_query={}+trailer",
            encoded
        ),
        imdb: format!("https://www.imdb.com/find?q={}&s=tt&ttype=ft", encoded),
        rotten_tomatoes: format!("https://www.rottentomatoes.com/search?search={}", encoded),
    }
}
