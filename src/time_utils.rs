// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for catalog date handling.

/// Extract the year from a TMDB-style release date (`YYYY-MM-DD`).
///
/// Returns `None` for missing or unparseable input.
pub fn release_year(date: &str) -> Option<i32> {
    if date.len() < 4 {
        return None;
    }
    date.get(..4)?.parse().ok()
}
