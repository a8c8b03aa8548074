// crates/xenospec-core/src/identifiers.rs
// ============================================================================
// Module: XenoSpec Identifiers
// Description: Canonical opaque identifiers for scenarios, sessions,
// experiments, and species.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Opaque string-based identifiers used throughout XenoSpec. Identifiers
//! serialize transparently as strings; validation (e.g. "must be a valid
//! dotted name") is the caller's responsibility at the scope or loader
//! boundary, not this module's.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Declares a transparent string newtype identifier with the shared
/// constructor / accessor / conversion surface.
macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(ScenarioId, "Identifies a loaded scenario specification.");
string_id!(
    SpecVersion,
    "Version tag of a scenario specification, as declared by its author."
);
string_id!(
    SessionId,
    "Identifies a single run of the agent/simulation session protocol."
);
string_id!(
    ExperimentId,
    "Identifies an experiment sweep over an axis map."
);
string_id!(
    SpeciesId,
    "Identifies a simulated species within a scenario's biology catalog."
);

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, reason = "tests use expect_used on deterministic fixtures")]
    use super::*;

    #[test]
    fn round_trips_through_display_and_as_str() {
        let id = ScenarioId::new("tide-pool-01");
        assert_eq!(id.as_str(), "tide-pool-01");
        assert_eq!(id.to_string(), "tide-pool-01");
    }

    #[test]
    fn serializes_as_a_bare_string() {
        let id = SessionId::from("sess-7");
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"sess-7\"");
    }
}
