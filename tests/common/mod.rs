// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use reelvault_core::db::FirestoreProfiles;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test store connection against the emulator.
#[allow(dead_code)]
pub async fn test_store() -> FirestoreProfiles {
    FirestoreProfiles::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}
