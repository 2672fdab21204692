//! Tagging calls shared by API Gateway v2 and Amazon MQ

use std::collections::BTreeSet;

use async_trait::async_trait;

use super::RemoteError;
use crate::reconcile::TagSet;

#[async_trait]
pub trait TaggingApi: Send + Sync {
    /// Tags currently attached to `arn`, including AWS-managed ones
    async fn list_tags(&self, arn: &str) -> Result<TagSet, RemoteError>;

    /// Add or overwrite tags
    async fn tag_resource(&self, arn: &str, tags: &TagSet) -> Result<(), RemoteError>;

    async fn untag_resource(&self, arn: &str, keys: &BTreeSet<String>) -> Result<(), RemoteError>;
}
