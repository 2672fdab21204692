//! Tag Reconciler
//!
//! Computes the add/remove calls needed to move a resource's remote tags to
//! the desired set.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use serde::Serialize;

use crate::aws::tagging::TaggingApi;
use crate::aws::RemoteError;

/// Tag key to value
pub type TagSet = BTreeMap<String, String>;

/// Keys with this prefix are managed by AWS and never reconciled
pub const AWS_TAG_PREFIX: &str = "aws:";

/// Drop AWS-managed system tags
pub fn ignore_aws(tags: &TagSet) -> TagSet {
    tags.iter()
        .filter(|(k, _)| !k.starts_with(AWS_TAG_PREFIX))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TagDiff {
    /// Keys missing from the current set or carrying a different value
    pub additions: TagSet,
    /// Keys present in the current set but not desired
    pub removals: BTreeSet<String>,
}

impl TagDiff {
    pub fn between(current: &TagSet, desired: &TagSet) -> Self {
        let additions = desired
            .iter()
            .filter(|(k, v)| current.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let removals = current
            .keys()
            .filter(|k| !desired.contains_key(*k))
            .cloned()
            .collect();
        Self {
            additions,
            removals,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    /// Run `remove` then `add`, skipping whichever has nothing to do.
    ///
    /// A failed removal stops before adding. A failed add after a successful
    /// removal leaves the resource partially updated; re-running the whole
    /// reconciliation converges.
    pub async fn apply<A, AF, R, RF, E>(&self, add: A, remove: R) -> Result<(), E>
    where
        A: FnOnce(TagSet) -> AF,
        AF: Future<Output = Result<(), E>>,
        R: FnOnce(BTreeSet<String>) -> RF,
        RF: Future<Output = Result<(), E>>,
    {
        if !self.removals.is_empty() {
            remove(self.removals.clone()).await?;
        }
        if !self.additions.is_empty() {
            add(self.additions.clone()).await?;
        }
        Ok(())
    }
}

/// Bring the tags on `arn` in line with `desired`.
///
/// Always diffs against the tags the remote reports now, so re-running after
/// a partial failure (or after success) only does the remaining work.
pub async fn reconcile_tags<T: TaggingApi + ?Sized>(
    api: &T,
    arn: &str,
    desired: &TagSet,
) -> Result<TagDiff, RemoteError> {
    let current = ignore_aws(&api.list_tags(arn).await?);
    let diff = TagDiff::between(&current, &ignore_aws(desired));

    if diff.is_empty() {
        tracing::debug!("Tags on {} already up to date", arn);
        return Ok(diff);
    }

    tracing::info!(
        "Updating tags on {}: {} to set, {} to remove",
        arn,
        diff.additions.len(),
        diff.removals.len()
    );
    diff.apply(
        |tags| async move { api.tag_resource(arn, &tags).await },
        |keys| async move { api.untag_resource(arn, &keys).await },
    )
    .await?;

    Ok(diff)
}
