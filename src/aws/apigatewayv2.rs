//! API Gateway v2 client seam

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tagging::TaggingApi;
use super::RemoteError;
use crate::reconcile::TagSet;

/// VPC link statuses reported by the service
pub mod vpc_link_status {
    pub const PENDING: &str = "PENDING";
    pub const AVAILABLE: &str = "AVAILABLE";
    pub const DELETING: &str = "DELETING";
    pub const FAILED: &str = "FAILED";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVpcLinkInput {
    pub name: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub tags: TagSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VpcLink {
    pub vpc_link_id: String,
    pub name: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub vpc_link_status: String,
    #[serde(default)]
    pub tags: TagSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProtocolType {
    Http,
    Websocket,
}

/// The parts of an API a stage needs to compute its URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Api {
    pub api_id: String,
    pub api_endpoint: String,
    pub protocol_type: ProtocolType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSettings {
    #[serde(default)]
    pub data_trace_enabled: bool,
    #[serde(default)]
    pub detailed_metrics_enabled: bool,
    #[serde(default)]
    pub logging_level: Option<String>,
    #[serde(default)]
    pub throttling_burst_limit: Option<i32>,
    #[serde(default)]
    pub throttling_rate_limit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogSettings {
    pub destination_arn: String,
    pub format: String,
}

/// Create/update request for a stage. `tags` is only honoured on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageInput {
    pub api_id: String,
    pub stage_name: String,
    pub description: Option<String>,
    pub deployment_id: Option<String>,
    pub client_certificate_id: Option<String>,
    pub auto_deploy: bool,
    pub stage_variables: BTreeMap<String, String>,
    pub default_route_settings: Option<RouteSettings>,
    pub route_settings: BTreeMap<String, RouteSettings>,
    pub access_log_settings: Option<AccessLogSettings>,
    pub tags: TagSet,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub stage_name: String,
    pub description: Option<String>,
    pub deployment_id: Option<String>,
    pub client_certificate_id: Option<String>,
    pub auto_deploy: bool,
    pub stage_variables: BTreeMap<String, String>,
    pub default_route_settings: Option<RouteSettings>,
    pub route_settings: BTreeMap<String, RouteSettings>,
    pub access_log_settings: Option<AccessLogSettings>,
    pub tags: TagSet,
    pub created_date: Option<DateTime<Utc>>,
    pub last_updated_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait ApiGatewayV2Api: TaggingApi {
    async fn create_vpc_link(&self, input: &CreateVpcLinkInput) -> Result<VpcLink, RemoteError>;
    async fn get_vpc_link(&self, vpc_link_id: &str) -> Result<VpcLink, RemoteError>;
    async fn update_vpc_link(&self, vpc_link_id: &str, name: &str) -> Result<VpcLink, RemoteError>;
    async fn delete_vpc_link(&self, vpc_link_id: &str) -> Result<(), RemoteError>;

    async fn get_api(&self, api_id: &str) -> Result<Api, RemoteError>;

    async fn create_stage(&self, input: &StageInput) -> Result<Stage, RemoteError>;
    async fn get_stage(&self, api_id: &str, stage_name: &str) -> Result<Stage, RemoteError>;
    async fn update_stage(&self, input: &StageInput) -> Result<Stage, RemoteError>;
    async fn delete_stage(&self, api_id: &str, stage_name: &str) -> Result<(), RemoteError>;
}
