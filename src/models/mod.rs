// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod catalog;
pub mod profile;

pub use catalog::{Genre, GenreList, Movie, Page, TvShow};
pub use profile::{Identity, Plan, Preferences, Profile, ProfileDetails, Subscription, SubscriptionStatus};
