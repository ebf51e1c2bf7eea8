// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! TMDB API client for catalog metadata.
//!
//! Handles:
//! - Trending / popular / top-rated / now-playing / upcoming movie lists
//! - Genre lists and genre-filtered discovery (movies and TV)
//! - Movie details (incl. budget), similar/recommended movies, search
//! - TV show lists and search

use crate::error::AppError;
use crate::models::{GenreList, Movie, Page, TvShow};
use serde::de::DeserializeOwned;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p";

/// Trending window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    Week,
}

impl TimeWindow {
    fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

/// TMDB API client.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbClient {
    /// Create a new client with a v3 API key.
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Create a client against a non-default base URL (tests, proxies).
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Get trending movies for a time window.
    pub async fn trending_movies(&self, window: TimeWindow) -> Result<Page<Movie>, AppError> {
        self.get_json(&format!("/trending/movie/{}", window.as_str()), &[])
            .await
    }

    /// Get popular movies (paginated).
    pub async fn popular_movies(&self, page: u32) -> Result<Page<Movie>, AppError> {
        self.get_json("/movie/popular", &[("page", page.to_string())])
            .await
    }

    /// Get top rated movies (paginated).
    pub async fn top_rated_movies(&self, page: u32) -> Result<Page<Movie>, AppError> {
        self.get_json("/movie/top_rated", &[("page", page.to_string())])
            .await
    }

    /// Get movies currently in theaters (paginated).
    pub async fn now_playing_movies(&self, page: u32) -> Result<Page<Movie>, AppError> {
        self.get_json("/movie/now_playing", &[("page", page.to_string())])
            .await
    }

    /// Get upcoming movies (paginated).
    pub async fn upcoming_movies(&self, page: u32) -> Result<Page<Movie>, AppError> {
        self.get_json("/movie/upcoming", &[("page", page.to_string())])
            .await
    }

    /// Discover movies by TMDB genre ID (paginated).
    pub async fn movies_by_genre(&self, genre_id: u64, page: u32) -> Result<Page<Movie>, AppError> {
        self.get_json(
            "/discover/movie",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    /// Get full movie details, including budget.
    pub async fn movie_details(&self, movie_id: u64) -> Result<Movie, AppError> {
        self.get_json(&format!("/movie/{}", movie_id), &[]).await
    }

    /// Get movies similar to the given one (paginated).
    pub async fn similar_movies(&self, movie_id: u64, page: u32) -> Result<Page<Movie>, AppError> {
        self.get_json(
            &format!("/movie/{}/similar", movie_id),
            &[("page", page.to_string())],
        )
        .await
    }

    /// Get movies recommended alongside the given one (paginated).
    pub async fn movie_recommendations(
        &self,
        movie_id: u64,
        page: u32,
    ) -> Result<Page<Movie>, AppError> {
        self.get_json(
            &format!("/movie/{}/recommendations", movie_id),
            &[("page", page.to_string())],
        )
        .await
    }

    /// Get the movie genre directory.
    pub async fn movie_genres(&self) -> Result<GenreList, AppError> {
        self.get_json("/genre/movie/list", &[]).await
    }

    /// Search movies by title (paginated).
    pub async fn search_movies(&self, query: &str, page: u32) -> Result<Page<Movie>, AppError> {
        self.get_json(
            "/search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// Get trending TV shows for a time window.
    pub async fn trending_tv(&self, window: TimeWindow) -> Result<Page<TvShow>, AppError> {
        self.get_json(&format!("/trending/tv/{}", window.as_str()), &[])
            .await
    }

    /// Get popular TV shows (paginated).
    pub async fn popular_tv(&self, page: u32) -> Result<Page<TvShow>, AppError> {
        self.get_json("/tv/popular", &[("page", page.to_string())])
            .await
    }

    /// Get top rated TV shows (paginated).
    pub async fn top_rated_tv(&self, page: u32) -> Result<Page<TvShow>, AppError> {
        self.get_json("/tv/top_rated", &[("page", page.to_string())])
            .await
    }

    /// Discover TV shows by TMDB genre ID (paginated).
    pub async fn tv_by_genre(&self, genre_id: u64, page: u32) -> Result<Page<TvShow>, AppError> {
        self.get_json(
            "/discover/tv",
            &[
                ("with_genres", genre_id.to_string()),
                ("page", page.to_string()),
            ],
        )
        .await
    }

    /// Get the TV genre directory.
    pub async fn tv_genres(&self) -> Result<GenreList, AppError> {
        self.get_json("/genre/tv/list", &[]).await
    }

    /// Search TV shows by name (paginated).
    pub async fn search_tv(&self, query: &str, page: u32) -> Result<Page<TvShow>, AppError> {
        self.get_json(
            "/search/tv",
            &[("query", query.to_string()), ("page", page.to_string())],
        )
        .await
    }

    /// GET a TMDB endpoint and deserialize the JSON response.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "en-US"),
            ])
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::Tmdb(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, path, "TMDB request failed");
            return Err(AppError::Tmdb(format!("{} for {}: {}", status, path, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Tmdb(format!("Invalid response for {}: {}", path, e)))
    }
}

/// Poster image URL (w500), or `None` if the item has no poster.
pub fn poster_url(path: Option<&str>) -> Option<String> {
    image_url(path, "w500")
}

/// Backdrop image URL (w1280), or `None` if the item has no backdrop.
pub fn backdrop_url(path: Option<&str>) -> Option<String> {
    image_url(path, "w1280")
}

/// Image URL for an arbitrary TMDB size bucket.
pub fn image_url(path: Option<&str>, size: &str) -> Option<String> {
    path.map(|p| format!("{}/{}{}", IMAGE_BASE_URL, size, p))
}
