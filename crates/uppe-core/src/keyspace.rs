//! Key layout of every persisted record.
//!
//! Tenant records always carry the owner as their second segment:
//!
//! ```text
//! monitors/{owner}/{id}
//! monitor-logs/{owner}/{monitor_id}/{log_id}
//! ```
//!
//! so scanning `{kind}/{owner}` can only ever yield that owner's records.
//! `monitor-owners/{id}` is a system index used by verification to resolve a
//! monitor from its id alone and is never listed on behalf of a tenant.

use crate::store::Key;

pub const MONITORS: &str = "monitors";
pub const MONITOR_LOGS: &str = "monitor-logs";
pub const MONITOR_OWNERS: &str = "monitor-owners";

pub fn monitor(owner: &str, id: &str) -> Key {
    monitors_of(owner).child(id)
}

pub fn monitors_of(owner: &str) -> Key {
    Key::new([MONITORS, owner])
}

/// Every monitor of every tenant
pub fn all_monitors() -> Key {
    Key::new([MONITORS])
}

pub fn monitor_owner(id: &str) -> Key {
    Key::new([MONITOR_OWNERS, id])
}

pub fn log(owner: &str, monitor_id: &str, log_id: &str) -> Key {
    logs_of(owner, monitor_id).child(log_id)
}

pub fn logs_of(owner: &str, monitor_id: &str) -> Key {
    Key::new([MONITOR_LOGS, owner, monitor_id])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_is_second_segment() {
        for key in [monitor("t1", "m"), log("t1", "m", "l"), monitors_of("t1"), logs_of("t1", "m")] {
            assert_eq!(key.segments()[1], "t1", "{key}");
        }
    }

    #[test]
    fn test_tenant_prefixes_do_not_overlap() {
        assert!(monitor("t1", "m").starts_with(&monitors_of("t1")));
        assert!(!monitor("t10", "m").starts_with(&monitors_of("t1")));
        assert!(!monitor_owner("m").starts_with(&all_monitors()));
        assert!(!log("t1", "m", "l").starts_with(&all_monitors()));
    }
}
