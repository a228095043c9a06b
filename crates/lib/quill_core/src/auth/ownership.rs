//! Resource ownership policy.
//!
//! Only the creator of an article or comment may mutate or delete it. Callers
//! look the resource up first and turn a `Deny` into a forbidden response.

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Allow iff the authenticated subject owns the resource.
pub fn authorize(resource_owner_id: i64, subject_id: i64) -> Decision {
    if resource_owner_id == subject_id {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_allowed() {
        assert_eq!(authorize(5, 5), Decision::Allow);
        assert!(authorize(5, 5).is_allowed());
    }

    #[test]
    fn non_owner_is_denied() {
        assert_eq!(authorize(5, 6), Decision::Deny);
        assert!(!authorize(5, 6).is_allowed());
    }
}
