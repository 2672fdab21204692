//! aws_apigatewayv2_vpc_link
//!
//! VPC links become usable asynchronously, so create and update wait for the
//! link to turn AVAILABLE and delete waits for it to disappear.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{OpContext, Plan, ProviderMeta, Resource};
use crate::aws::apigatewayv2::{vpc_link_status, ApiGatewayV2Api, CreateVpcLinkInput};
use crate::aws::{arn, RemoteError};
use crate::reconcile::tags::{ignore_aws, reconcile_tags};
use crate::reconcile::{wait_for, TagSet, WaitSpec};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VpcLinkConfig {
    pub name: String,
    pub subnet_ids: BTreeSet<String>,
    #[serde(default)]
    pub security_group_ids: BTreeSet<String>,
    #[serde(default)]
    pub tags: TagSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VpcLinkState {
    pub id: String,
    pub arn: String,
    pub name: String,
    pub subnet_ids: BTreeSet<String>,
    pub security_group_ids: BTreeSet<String>,
    pub tags: TagSet,
}

pub struct VpcLink {
    client: Arc<dyn ApiGatewayV2Api>,
    meta: ProviderMeta,
}

impl VpcLink {
    pub fn new(client: Arc<dyn ApiGatewayV2Api>, meta: ProviderMeta) -> Self {
        Self { client, meta }
    }

    fn arn(&self, id: &str) -> String {
        arn(
            &self.meta.partition,
            "apigatewayv2",
            &self.meta.region,
            "",
            &format!("/vpclinks/{}", id),
        )
    }

    async fn wait_available(&self, ctx: &OpContext, id: &str) -> Result<()> {
        let (timeout, interval) = self.meta.timeouts.vpc_link_available();
        let spec = WaitSpec::new(timeout, interval)
            .pending([vpc_link_status::PENDING])
            .target([vpc_link_status::AVAILABLE])
            .failure([vpc_link_status::FAILED]);

        let client = &self.client;
        wait_for(&spec, &ctx.cancel, move || async move {
            client.get_vpc_link(id).await.map(|link| link.vpc_link_status)
        })
        .await
        .with_context(|| {
            format!(
                "Error waiting for VPC Link ({}) status to be {:?}",
                id,
                vpc_link_status::AVAILABLE
            )
        })?;
        Ok(())
    }

    async fn wait_deleted(&self, ctx: &OpContext, id: &str) -> Result<()> {
        let (timeout, interval) = self.meta.timeouts.vpc_link_deleted();
        let spec = WaitSpec::new(timeout, interval)
            .pending([
                vpc_link_status::PENDING,
                vpc_link_status::AVAILABLE,
                vpc_link_status::DELETING,
            ])
            .failure([vpc_link_status::FAILED])
            .until_not_found();

        let client = &self.client;
        wait_for(&spec, &ctx.cancel, move || async move {
            client.get_vpc_link(id).await.map(|link| link.vpc_link_status)
        })
        .await
        .with_context(|| format!("Error waiting for VPC Link ({}) deletion", id))?;
        Ok(())
    }
}

#[async_trait]
impl Resource for VpcLink {
    const TYPE_NAME: &'static str = "aws_apigatewayv2_vpc_link";

    type Config = VpcLinkConfig;
    type State = VpcLinkState;

    async fn create(&self, ctx: &OpContext, config: &VpcLinkConfig) -> Result<String> {
        let input = CreateVpcLinkInput {
            name: config.name.clone(),
            subnet_ids: config.subnet_ids.iter().cloned().collect(),
            security_group_ids: config.security_group_ids.iter().cloned().collect(),
            tags: ignore_aws(&config.tags),
        };

        let link = self.client.create_vpc_link(&input).await?;
        tracing::info!("Created VPC Link {}", link.vpc_link_id);

        self.wait_available(ctx, &link.vpc_link_id).await?;
        Ok(link.vpc_link_id)
    }

    async fn read(&self, id: &str) -> Result<Option<VpcLinkState>> {
        let link = match self.client.get_vpc_link(id).await {
            Ok(link) => link,
            Err(RemoteError::NotFound(_)) => {
                tracing::warn!("VPC Link {} not found, removing from state", id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Some(VpcLinkState {
            id: link.vpc_link_id.clone(),
            arn: self.arn(&link.vpc_link_id),
            name: link.name,
            subnet_ids: link.subnet_ids.into_iter().collect(),
            security_group_ids: link.security_group_ids.into_iter().collect(),
            tags: ignore_aws(&link.tags),
        }))
    }

    async fn update(
        &self,
        ctx: &OpContext,
        id: &str,
        old: &VpcLinkConfig,
        new: &VpcLinkConfig,
    ) -> Result<()> {
        if old.name != new.name {
            match self.client.update_vpc_link(id, &new.name).await {
                Ok(_) => {}
                Err(RemoteError::NotFound(_)) => {
                    tracing::warn!("VPC Link {} not found, removing from state", id);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }
            self.wait_available(ctx, id).await?;
        }

        if old.tags != new.tags {
            reconcile_tags(self.client.as_ref(), &self.arn(id), &new.tags)
                .await
                .context("Error updating tags")?;
        }
        Ok(())
    }

    async fn delete(&self, ctx: &OpContext, id: &str) -> Result<()> {
        match self.client.delete_vpc_link(id).await {
            Ok(()) => {}
            Err(RemoteError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        self.wait_deleted(ctx, id).await
    }

    fn plan(&self, old: &VpcLinkConfig, new: &VpcLinkConfig) -> Plan {
        let mut plan = Plan::default();
        plan.field("name", &old.name, &new.name)
            .force_new("subnet_ids", &old.subnet_ids, &new.subnet_ids)
            .force_new("security_group_ids", &old.security_group_ids, &new.security_group_ids)
            .field("tags", &old.tags, &new.tags);
        plan
    }
}
