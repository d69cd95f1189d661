//! TTL-scoped access-decision states.

use serde::{Deserialize, Serialize};

/// A cached access verdict correlating a domain and a requester.
///
/// Created on the first check for a (domain, requester) pair; mutated
/// only by an explicit override, which also locks the state against
/// further changes; removed on expiry by the background sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionState {
    /// Opaque identifier handed back to the caller.
    pub state_id: String,
    pub domain_name: String,
    pub ip_address: Option<String>,
    /// Unix epoch seconds.
    pub created_at: u64,
    /// Unix epoch seconds; the state is live while `expires_at > now`.
    pub expires_at: u64,
    pub access_allowed: bool,
    /// Set by an explicit override; a locked state is never refreshed
    /// or overridden again.
    pub override_locked: bool,
}

impl DecisionState {
    /// Whether the state is still live at `now`.
    pub fn is_live(&self, now: u64) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(expires_at: u64) -> DecisionState {
        DecisionState {
            state_id: "s-1".to_string(),
            domain_name: "example.com".to_string(),
            ip_address: None,
            created_at: 100,
            expires_at,
            access_allowed: true,
            override_locked: false,
        }
    }

    #[test]
    fn test_liveness_boundary() {
        assert!(state(101).is_live(100));
        assert!(!state(100).is_live(100));
        assert!(!state(99).is_live(100));
    }
}
