//! # Conflict Resolution
//!
//! Decides whose inventory count wins when the storefront and Square disagree.
//!
//! ## Rule
//! ```text
//!   remote.updated_at missing ─────────────────────────► Local
//!   local.updated_at  >  remote.updated_at ────────────► Local
//!   local.updated_at  <  remote.updated_at ────────────► Remote
//!   local.updated_at  == remote.updated_at ────────────► TieBreak (Remote)
//! ```
//!
//! Last-write-wins by wall clock is a heuristic: two machines with skewed
//! clocks can pick the wrong winner. The tie rule is a policy value so it can
//! be flipped from configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One side of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub updated_at: Option<DateTime<Utc>>,
    pub inventory: u32,
}

impl InventorySnapshot {
    pub fn new(updated_at: Option<DateTime<Utc>>, inventory: u32) -> Self {
        InventorySnapshot {
            updated_at,
            inventory,
        }
    }
}

/// Which side supplied the winning count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum InventorySource {
    Local,
    Remote,
}

/// Who wins when both timestamps are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    #[default]
    Remote,
    Local,
}

impl std::str::FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(TieBreak::Remote),
            "local" => Ok(TieBreak::Local),
            other => Err(format!("unknown tie break '{other}', expected 'remote' or 'local'")),
        }
    }
}

/// The inventory to keep and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub use_inventory: u32,
    pub source: InventorySource,
}

/// Resolves with the default tie policy (remote wins at parity).
pub fn resolve(local: InventorySnapshot, remote: InventorySnapshot) -> Resolution {
    resolve_with(local, remote, TieBreak::default())
}

/// Resolves with an explicit tie policy.
pub fn resolve_with(
    local: InventorySnapshot,
    remote: InventorySnapshot,
    tie: TieBreak,
) -> Resolution {
    let keep_local = Resolution {
        use_inventory: local.inventory,
        source: InventorySource::Local,
    };
    let take_remote = Resolution {
        use_inventory: remote.inventory,
        source: InventorySource::Remote,
    };

    let Some(remote_at) = remote.updated_at else {
        return keep_local;
    };
    // A local record with no timestamp has never been written locally.
    let Some(local_at) = local.updated_at else {
        return take_remote;
    };

    match local_at.cmp(&remote_at) {
        std::cmp::Ordering::Greater => keep_local,
        std::cmp::Ordering::Less => take_remote,
        std::cmp::Ordering::Equal => match tie {
            TieBreak::Remote => take_remote,
            TieBreak::Local => keep_local,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(minute: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2025, 6, 1, 10, minute, 0).unwrap())
    }

    #[test]
    fn test_newer_local_wins() {
        let r = resolve(InventorySnapshot::new(at(30), 3), InventorySnapshot::new(at(10), 8));
        assert_eq!(r.source, InventorySource::Local);
        assert_eq!(r.use_inventory, 3);
    }

    #[test]
    fn test_swapping_timestamps_flips_result() {
        let r = resolve(InventorySnapshot::new(at(10), 3), InventorySnapshot::new(at(30), 8));
        assert_eq!(r.source, InventorySource::Remote);
        assert_eq!(r.use_inventory, 8);
    }

    #[test]
    fn test_missing_remote_timestamp_keeps_local() {
        let r = resolve(InventorySnapshot::new(at(0), 3), InventorySnapshot::new(None, 8));
        assert_eq!(r.source, InventorySource::Local);
    }

    #[test]
    fn test_tie_follows_policy() {
        let local = InventorySnapshot::new(at(15), 3);
        let remote = InventorySnapshot::new(at(15), 8);

        assert_eq!(resolve(local, remote).source, InventorySource::Remote);
        assert_eq!(
            resolve_with(local, remote, TieBreak::Local).source,
            InventorySource::Local
        );
    }

    #[test]
    fn test_one_millisecond_matters() {
        let base = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let local = InventorySnapshot::new(Some(base + Duration::milliseconds(1)), 1);
        let remote = InventorySnapshot::new(Some(base), 2);
        assert_eq!(resolve(local, remote).use_inventory, 1);
    }

    #[test]
    fn test_tie_break_parses() {
        assert_eq!("LOCAL".parse::<TieBreak>().unwrap(), TieBreak::Local);
        assert!("newest".parse::<TieBreak>().is_err());
    }
}
