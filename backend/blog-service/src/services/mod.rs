//! Business logic layer

pub mod aggregation;
pub mod content;
pub mod engagement;
pub mod social_graph;

pub use aggregation::AggregationFacade;
pub use content::ContentStore;
pub use engagement::EngagementLedger;
pub use social_graph::SocialGraphLedger;

use crate::domain::Identity;
use crate::error::{ServiceError, ServiceResult};
use std::collections::{BTreeSet, HashMap};

/// Fixed top-N window for listings.
pub const MAX_LIST_LIMIT: i64 = 100;

/// What to do with records whose author the directory cannot resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinPolicy {
    /// Fail the whole join with `JoinInconsistency`
    #[default]
    Strict,
    /// Drop the affected records
    SkipMissing,
}

fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_LIST_LIMIT)
}

fn distinct_ids<'a>(ids: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
    ids.into_iter().map(str::to_string).collect()
}

/// Pair each record with its author's identity under `policy`.
///
/// `resolved` must come from one batch lookup over every author id in `records`.
fn join_authors<T>(
    records: Vec<T>,
    author_id: impl Fn(&T) -> &str,
    resolved: &HashMap<String, Identity>,
    policy: JoinPolicy,
) -> ServiceResult<Vec<(T, Identity)>> {
    if policy == JoinPolicy::Strict {
        let missing: BTreeSet<String> = records
            .iter()
            .map(|record| author_id(record))
            .filter(|id| !resolved.contains_key(*id))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            tracing::error!(missing = ?missing, "author identities missing from directory");
            return Err(ServiceError::JoinInconsistency {
                missing: missing.into_iter().collect(),
            });
        }
    }

    Ok(records
        .into_iter()
        .filter_map(|record| {
            let identity = resolved.get(author_id(&record))?.clone();
            Some((record, identity))
        })
        .collect())
}
