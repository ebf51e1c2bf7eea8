//! Identity and profile models.
//!
//! `Identity` is the externally-authenticated principal as issued by the
//! auth provider; it is replaced wholesale on sign-in/sign-out. `Profile`
//! is the application's durable per-user record, keyed 1:1 by
//! `Identity.uid` and independently editable afterward.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Length of the free trial granted to synthesized profiles (days).
pub const TRIAL_PERIOD_DAYS: i64 = 7;

/// Externally-authenticated principal.
///
/// Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Auth provider UID (also used as the profile document ID)
    pub uid: String,
    /// Email address (absent for phone-authenticated principals)
    pub email: Option<String>,
    /// Phone number in E.164 form
    pub phone: Option<String>,
    /// Display name, if the provider has one
    pub display_name: Option<String>,
    /// Profile picture URL
    pub photo_url: Option<String>,
}

/// Subscription plan tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Basic,
    Premium,
    Ultra,
}

/// Subscription lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
    Trial,
}

/// A user's subscription window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub plan: Plan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Subscription {
    /// Free trial starting at `now`.
    pub fn trial(now: DateTime<Utc>) -> Self {
        Self {
            plan: Plan::Free,
            status: SubscriptionStatus::Trial,
            start_date: now,
            end_date: now + Duration::days(TRIAL_PERIOD_DAYS),
        }
    }
}

/// Gender, as self-reported at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    Other,
}

/// Viewing preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Favorite genre names
    #[serde(default)]
    pub genres: Vec<String>,
    /// Preferred audio/subtitle languages
    #[serde(default)]
    pub languages: Vec<String>,
}

/// User profile stored in Firestore.
///
/// Identity fields are mirrored at creation time and may diverge from the
/// provider afterward, since the profile is independently editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Auth provider UID (also used as document ID)
    pub uid: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,

    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Age in years (13+ enforced at signup)
    pub age: Option<u32>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub bio: Option<String>,

    #[serde(default)]
    pub preferences: Preferences,
    pub subscription: Subscription,

    /// Durable "My List" mirror (catalog item IDs)
    #[serde(default)]
    pub my_list: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Profile {
    /// Synthesize a minimal profile from an identity.
    ///
    /// Used when the store has no record for the UID or is unreachable; the
    /// UI cannot tell this apart from a stored profile.
    pub fn fallback(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
            display_name: identity.display_name.clone(),
            photo_url: identity.photo_url.clone(),
            first_name: None,
            last_name: None,
            age: None,
            date_of_birth: None,
            gender: None,
            bio: None,
            preferences: Preferences::default(),
            subscription: Subscription::trial(now),
            my_list: Vec::new(),
            created_at: now,
            last_login: now,
            last_updated: None,
        }
    }

    /// Build the initial stored profile for a fresh signup.
    pub fn from_signup(identity: &Identity, details: &ProfileDetails, now: DateTime<Utc>) -> Self {
        let display_name = identity.display_name.clone().or_else(|| {
            match (&details.first_name, &details.last_name) {
                (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
                (Some(first), None) => Some(first.clone()),
                _ => None,
            }
        });

        Self {
            display_name,
            first_name: details.first_name.clone(),
            last_name: details.last_name.clone(),
            age: details.age,
            date_of_birth: details.date_of_birth,
            gender: details.gender,
            bio: details.bio.clone(),
            preferences: details.preferences.clone(),
            ..Self::fallback(identity, now)
        }
    }
}

/// Personal details collected at signup.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProfileDetails {
    #[validate(length(min = 1, message = "first name must not be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "last name must not be empty"))]
    pub last_name: Option<String>,
    #[validate(range(min = 13, message = "must be at least 13"))]
    pub age: Option<u32>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
}
