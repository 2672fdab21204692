//! AppSync client seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::RemoteError;

/// The only function version the service accepts for mapping templates
pub const FUNCTION_VERSION: &str = "2018-05-29";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResolverKind {
    #[default]
    Unit,
    Pipeline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverInput {
    pub api_id: String,
    pub type_name: String,
    pub field_name: String,
    pub data_source_name: Option<String>,
    pub kind: ResolverKind,
    /// Function IDs, in call order, for `PIPELINE` resolvers
    pub pipeline_functions: Option<Vec<String>>,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolver {
    pub resolver_arn: String,
    pub type_name: String,
    pub field_name: String,
    pub data_source_name: Option<String>,
    pub kind: ResolverKind,
    pub pipeline_functions: Option<Vec<String>>,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionInput {
    pub api_id: String,
    /// Set on update, assigned by the service on create
    pub function_id: Option<String>,
    pub name: String,
    pub data_source_name: String,
    pub description: Option<String>,
    pub function_version: String,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionConfiguration {
    pub function_id: String,
    pub function_arn: String,
    pub name: String,
    pub data_source_name: String,
    pub description: Option<String>,
    pub function_version: String,
    pub request_mapping_template: String,
    pub response_mapping_template: String,
}

#[async_trait]
pub trait AppSyncApi: Send + Sync {
    async fn create_resolver(&self, input: &ResolverInput) -> Result<Resolver, RemoteError>;
    async fn get_resolver(
        &self,
        api_id: &str,
        type_name: &str,
        field_name: &str,
    ) -> Result<Resolver, RemoteError>;
    async fn update_resolver(&self, input: &ResolverInput) -> Result<Resolver, RemoteError>;
    async fn delete_resolver(
        &self,
        api_id: &str,
        type_name: &str,
        field_name: &str,
    ) -> Result<(), RemoteError>;

    async fn create_function(
        &self,
        input: &FunctionInput,
    ) -> Result<FunctionConfiguration, RemoteError>;
    async fn get_function(
        &self,
        api_id: &str,
        function_id: &str,
    ) -> Result<FunctionConfiguration, RemoteError>;
    async fn update_function(
        &self,
        input: &FunctionInput,
    ) -> Result<FunctionConfiguration, RemoteError>;
    async fn delete_function(&self, api_id: &str, function_id: &str) -> Result<(), RemoteError>;
}
