//! Post-batch duplicate chain collapsing.
//!
//! After a batch completes, duplicates that point at other duplicates are
//! redirected to the end of their chain so every member references the same
//! canonical issue. Malformed data (cycles, very long chains) never raises an
//! error; the walk stops and the anomaly is reported in the [`ChainReport`].

use crate::batch::BatchItem;
use crate::issue::IssueId;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Maximum number of links followed from any issue.
pub const MAX_CHAIN_HOPS: usize = 10;

/// Result of walking one duplicate chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainWalk {
    /// Where the walk stopped.
    pub root: IssueId,
    /// The walk revisited an issue.
    pub cycle: bool,
    /// The walk hit [`MAX_CHAIN_HOPS`].
    pub truncated: bool,
}

/// A duplicate target that was replaced by its chain root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redirect {
    /// The duplicate issue.
    pub issue: IssueId,
    /// Its original direct target.
    pub from: IssueId,
    /// The chain root it now points at.
    pub to: IssueId,
}

/// Summary of a resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    /// Duplicates whose target changed.
    pub redirected: Vec<Redirect>,
    /// Duplicates whose chain loops back on itself.
    pub cycles: Vec<IssueId>,
    /// Duplicates whose chain exceeded the hop bound.
    pub truncated: Vec<IssueId>,
}

/// Follows direct duplicate links from `start` until a root, a revisit, or
/// the hop bound.
pub fn walk_chain(links: &HashMap<IssueId, IssueId>, start: &IssueId) -> ChainWalk {
    let mut seen = HashSet::from([start.clone()]);
    let mut current = start.clone();

    for _ in 0..MAX_CHAIN_HOPS {
        let Some(next) = links.get(&current) else {
            return ChainWalk {
                root: current,
                cycle: false,
                truncated: false,
            };
        };
        if !seen.insert(next.clone()) {
            return ChainWalk {
                root: next.clone(),
                cycle: true,
                truncated: false,
            };
        }
        current = next.clone();
    }

    let truncated = links.contains_key(&current);
    ChainWalk {
        root: current,
        cycle: false,
        truncated,
    }
}

/// Rewrites every duplicate in `items` to point at its chain root.
///
/// Only successful results flagged as duplicates with a target take part.
/// When a cycle leads back to the issue itself, the original target is kept
/// so no issue ends up marked as a duplicate of itself.
pub fn resolve_duplicate_chains(items: &mut [BatchItem]) -> ChainReport {
    let links: HashMap<IssueId, IssueId> = items
        .iter()
        .filter_map(|item| {
            let result = item.outcome.as_ref().ok()?;
            if !result.duplicate {
                return None;
            }
            let target = result.duplicate_of.clone()?;
            Some((item.issue.id.clone(), target))
        })
        .collect();

    let mut report = ChainReport::default();
    if links.is_empty() {
        return report;
    }

    for item in items.iter_mut() {
        let id = item.issue.id.clone();
        let Ok(result) = item.outcome.as_mut() else {
            continue;
        };
        let Some(direct) = links.get(&id) else {
            continue;
        };

        let walk = walk_chain(&links, &id);

        if walk.cycle {
            warn!(issue = %id, stopped_at = %walk.root, "Duplicate chain contains a cycle");
            result.record_error(format!(
                "duplicate chain from {id} loops back to {}",
                walk.root
            ));
            report.cycles.push(id.clone());
        }
        if walk.truncated {
            warn!(issue = %id, stopped_at = %walk.root, max_hops = MAX_CHAIN_HOPS, "Duplicate chain too long");
            result.record_error(format!(
                "duplicate chain from {id} exceeds {MAX_CHAIN_HOPS} hops, stopped at {}",
                walk.root
            ));
            report.truncated.push(id.clone());
        }

        if walk.root != *direct && walk.root != id {
            report.redirected.push(Redirect {
                issue: id.clone(),
                from: direct.clone(),
                to: walk.root.clone(),
            });
            result.duplicate_of = Some(walk.root);
        }
    }

    info!(
        redirected = report.redirected.len(),
        cycles = report.cycles.len(),
        truncated = report.truncated.len(),
        "Resolved duplicate chains"
    );
    report
}
