//! # Identity Gate
//!
//! The single authorization decision point: a claimed identity is accepted
//! iff it is literally a member of the allowed set.
//!
//! ## Security
//!
//! Membership is exact `HashSet` lookup. The gate never performs substring,
//! prefix, or pattern matching, so a crafted identity such as
//! `' OR '1'='1' --` — which a string-concatenated database query would
//! treat as always-true — is just another unknown tag and is rejected.

use std::collections::HashSet;

use sv_types::AuthorizationStatus;

/// Decides whether a claimed identity may charge.
///
/// The allowed set is fixed at construction; runtime mutation belongs to an
/// admin surface this suite does not model.
#[derive(Debug, Clone)]
pub struct IdentityGate {
    allowed: HashSet<String>,
}

impl IdentityGate {
    /// Build a gate over the given allowed identities.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// The demo allow-list used across scenarios.
    pub fn demo() -> Self {
        Self::new(["USER-A123", "CPT-2024-001"])
    }

    /// Classify a claimed identity. Exact set membership only.
    pub fn authorize(&self, id_tag: &str) -> AuthorizationStatus {
        if self.allowed.contains(id_tag) {
            AuthorizationStatus::Accepted
        } else {
            AuthorizationStatus::Invalid
        }
    }

    /// Number of identities the gate knows.
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
