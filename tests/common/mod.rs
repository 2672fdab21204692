//! In-memory AWS service fakes for adapter tests
//!
//! One `FakeAws` stands in for API Gateway v2, AppSync and Amazon MQ. VPC
//! links walk through their status transitions one poll at a time so the
//! waiter is exercised without real delays.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use uuid::Uuid;

use awsrecon::aws::apigatewayv2::{
    vpc_link_status, Api, ApiGatewayV2Api, CreateVpcLinkInput, ProtocolType, Stage, StageInput,
    VpcLink,
};
use awsrecon::aws::appsync::{
    AppSyncApi, FunctionConfiguration, FunctionInput, Resolver, ResolverInput,
};
use awsrecon::aws::mq::{
    Configuration, ConfigurationRevision, CreateConfigurationInput, MqApi, RevisionData,
    UpdateConfigurationInput,
};
use awsrecon::aws::tagging::TaggingApi;
use awsrecon::aws::{arn, RemoteError};
use awsrecon::config::Timeouts;
use awsrecon::provider::{aws_registry, Clients, ProviderMeta, Registry};
use awsrecon::reconcile::TagSet;

pub const REGION: &str = "us-west-2";
pub const PARTITION: &str = "aws";
pub const ACCOUNT_ID: &str = "123456789012";

/// System tag the fake attaches to every taggable object
pub const SYSTEM_TAG: &str = "aws:cloudformation:stack-name";

pub fn meta(timeouts: Timeouts) -> ProviderMeta {
    ProviderMeta {
        region: REGION.to_string(),
        partition: PARTITION.to_string(),
        account_id: Some(ACCOUNT_ID.to_string()),
        timeouts,
    }
}

/// One-second waits polled at the interval floor
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        vpc_link_available_secs: 1,
        vpc_link_available_poll_secs: 0,
        vpc_link_deleted_secs: 1,
        vpc_link_deleted_poll_secs: 0,
    }
}

pub fn registry(fake: &Arc<FakeAws>) -> Registry {
    let clients = Clients {
        apigatewayv2: fake.clone(),
        appsync: fake.clone(),
        mq: fake.clone(),
    };
    aws_registry(meta(fast_timeouts()), clients).unwrap()
}

/// True when some layer of `err` is an `awsrecon::Error` matching `pred`
pub fn has_error(err: &anyhow::Error, pred: impl Fn(&awsrecon::Error) -> bool) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<awsrecon::Error>())
        .any(pred)
}

/// How a fake VPC link behaves after create or update
#[derive(Debug, Clone, Copy)]
pub enum LinkScript {
    /// PENDING for this many polls, then AVAILABLE
    AvailableAfter(usize),
    /// PENDING for this many polls, then FAILED
    FailAfter(usize),
    /// PENDING forever
    StuckPending,
}

struct FakeLink {
    link: VpcLink,
    pending_polls: usize,
    /// Polls left in DELETING before the link disappears
    deleting_polls: Option<usize>,
}

struct FakeConfiguration {
    configuration: Configuration,
    revisions: Vec<RevisionData>,
}

#[derive(Default)]
struct State {
    links: HashMap<String, FakeLink>,
    apis: HashMap<String, Api>,
    stages: HashMap<(String, String), Stage>,
    configurations: HashMap<String, FakeConfiguration>,
    resolvers: HashMap<(String, String, String), Resolver>,
    functions: HashMap<(String, String), FunctionConfiguration>,
    tags: HashMap<String, TagSet>,
    calls: Vec<String>,
}

pub struct FakeAws {
    state: Mutex<State>,
    link_script: Mutex<LinkScript>,
}

impl Default for FakeAws {
    fn default() -> Self {
        Self {
            state: Mutex::new(State::default()),
            link_script: Mutex::new(LinkScript::AvailableAfter(2)),
        }
    }
}

fn not_found(what: impl Into<String>) -> RemoteError {
    RemoteError::NotFound(what.into())
}

fn with_system_tag(tags: &TagSet) -> TagSet {
    let mut tags = tags.clone();
    tags.insert(SYSTEM_TAG.to_string(), "test-stack".to_string());
    tags
}

fn vpc_link_arn(id: &str) -> String {
    arn(PARTITION, "apigatewayv2", REGION, "", &format!("/vpclinks/{}", id))
}

fn stage_arn(api_id: &str, name: &str) -> String {
    arn(
        PARTITION,
        "apigateway",
        REGION,
        "",
        &format!("/apis/{}/stages/{}", api_id, name),
    )
}

impl FakeAws {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(state: &mut State, call: impl Into<String>) {
        state.calls.push(call.into());
    }

    pub fn set_link_script(&self, script: LinkScript) {
        *self.link_script.lock().unwrap() = script;
    }

    fn pending_polls(&self) -> usize {
        match *self.link_script.lock().unwrap() {
            LinkScript::AvailableAfter(n) | LinkScript::FailAfter(n) => n,
            LinkScript::StuckPending => usize::MAX,
        }
    }

    fn settled_status(&self) -> &'static str {
        match *self.link_script.lock().unwrap() {
            LinkScript::FailAfter(_) => vpc_link_status::FAILED,
            _ => vpc_link_status::AVAILABLE,
        }
    }

    pub fn add_api(&self, api_id: &str, protocol_type: ProtocolType) {
        let scheme = match protocol_type {
            ProtocolType::Http => "https",
            ProtocolType::Websocket => "wss",
        };
        self.state().apis.insert(
            api_id.to_string(),
            Api {
                api_id: api_id.to_string(),
                api_endpoint: format!(
                    "{}://{}.execute-api.{}.amazonaws.com",
                    scheme, api_id, REGION
                ),
                protocol_type,
            },
        );
    }

    /// Remote calls made so far, e.g. `tag_resource` or `update_stage`
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.state().calls.iter().filter(|c| *c == name).count()
    }

    /// Raw tags on `arn`, system tags included
    pub fn tags_of(&self, arn: &str) -> TagSet {
        self.state().tags.get(arn).cloned().unwrap_or_default()
    }

    pub fn link_exists(&self, id: &str) -> bool {
        self.state().links.contains_key(id)
    }

    /// Drop a VPC link behind the provider's back
    pub fn forget_link(&self, id: &str) {
        self.state().links.remove(id);
    }

    pub fn forget_stage(&self, api_id: &str, name: &str) {
        self.state()
            .stages
            .remove(&(api_id.to_string(), name.to_string()));
    }

    pub fn revision_count(&self, configuration_id: &str) -> usize {
        self.state()
            .configurations
            .get(configuration_id)
            .map(|c| c.revisions.len())
            .unwrap_or(0)
    }

    pub fn stage_description(&self, api_id: &str, name: &str) -> Option<String> {
        self.state()
            .stages
            .get(&(api_id.to_string(), name.to_string()))
            .and_then(|s| s.description.clone())
    }
}

#[async_trait]
impl TaggingApi for FakeAws {
    async fn list_tags(&self, arn: &str) -> Result<TagSet, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "list_tags");
        Ok(state.tags.get(arn).cloned().unwrap_or_default())
    }

    async fn tag_resource(&self, arn: &str, tags: &TagSet) -> Result<(), RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "tag_resource");
        let current = state.tags.entry(arn.to_string()).or_default();
        current.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn untag_resource(&self, arn: &str, keys: &BTreeSet<String>) -> Result<(), RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "untag_resource");
        if let Some(current) = state.tags.get_mut(arn) {
            current.retain(|k, _| !keys.contains(k));
        }
        Ok(())
    }
}

#[async_trait]
impl ApiGatewayV2Api for FakeAws {
    async fn create_vpc_link(&self, input: &CreateVpcLinkInput) -> Result<VpcLink, RemoteError> {
        let pending_polls = self.pending_polls();
        let mut state = self.state();
        Self::record(&mut state, "create_vpc_link");

        let id = Uuid::new_v4().simple().to_string()[..6].to_string();
        let link = VpcLink {
            vpc_link_id: id.clone(),
            name: input.name.clone(),
            subnet_ids: input.subnet_ids.clone(),
            security_group_ids: input.security_group_ids.clone(),
            vpc_link_status: vpc_link_status::PENDING.to_string(),
            tags: TagSet::new(),
        };
        state.tags.insert(vpc_link_arn(&id), with_system_tag(&input.tags));
        state.links.insert(
            id,
            FakeLink {
                link: link.clone(),
                pending_polls,
                deleting_polls: None,
            },
        );
        Ok(link)
    }

    async fn get_vpc_link(&self, vpc_link_id: &str) -> Result<VpcLink, RemoteError> {
        let settled = self.settled_status();
        let mut state = self.state();
        Self::record(&mut state, "get_vpc_link");

        let gone = match state.links.get_mut(vpc_link_id) {
            None => return Err(not_found(format!("VPC link {}", vpc_link_id))),
            Some(fake) => match fake.deleting_polls {
                Some(0) => true,
                Some(ref mut n) => {
                    *n -= 1;
                    false
                }
                None => {
                    if fake.link.vpc_link_status == vpc_link_status::PENDING {
                        if fake.pending_polls == 0 {
                            fake.link.vpc_link_status = settled.to_string();
                        } else {
                            fake.pending_polls = fake.pending_polls.saturating_sub(1);
                        }
                    }
                    false
                }
            },
        };
        if gone {
            state.links.remove(vpc_link_id);
            return Err(not_found(format!("VPC link {}", vpc_link_id)));
        }

        let tags = state
            .tags
            .get(&vpc_link_arn(vpc_link_id))
            .cloned()
            .unwrap_or_default();
        let mut link = state.links[vpc_link_id].link.clone();
        link.tags = tags;
        Ok(link)
    }

    async fn update_vpc_link(&self, vpc_link_id: &str, name: &str) -> Result<VpcLink, RemoteError> {
        let pending_polls = self.pending_polls();
        let mut state = self.state();
        Self::record(&mut state, "update_vpc_link");

        let fake = state
            .links
            .get_mut(vpc_link_id)
            .ok_or_else(|| not_found(format!("VPC link {}", vpc_link_id)))?;
        fake.link.name = name.to_string();
        fake.link.vpc_link_status = vpc_link_status::PENDING.to_string();
        fake.pending_polls = pending_polls;
        Ok(fake.link.clone())
    }

    async fn delete_vpc_link(&self, vpc_link_id: &str) -> Result<(), RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "delete_vpc_link");

        let fake = state
            .links
            .get_mut(vpc_link_id)
            .ok_or_else(|| not_found(format!("VPC link {}", vpc_link_id)))?;
        fake.link.vpc_link_status = vpc_link_status::DELETING.to_string();
        fake.deleting_polls = Some(2);
        Ok(())
    }

    async fn get_api(&self, api_id: &str) -> Result<Api, RemoteError> {
        self.state()
            .apis
            .get(api_id)
            .cloned()
            .ok_or_else(|| not_found(format!("API {}", api_id)))
    }

    async fn create_stage(&self, input: &StageInput) -> Result<Stage, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "create_stage");

        if !state.apis.contains_key(&input.api_id) {
            return Err(not_found(format!("API {}", input.api_id)));
        }
        let key = (input.api_id.clone(), input.stage_name.clone());
        if state.stages.contains_key(&key) {
            return Err(RemoteError::Api(anyhow!(
                "ConflictException: stage {} already exists",
                input.stage_name
            )));
        }

        let now = Utc::now();
        let stage = Stage {
            stage_name: input.stage_name.clone(),
            description: input.description.clone(),
            deployment_id: input.deployment_id.clone(),
            client_certificate_id: input.client_certificate_id.clone(),
            auto_deploy: input.auto_deploy,
            stage_variables: input.stage_variables.clone(),
            default_route_settings: input.default_route_settings.clone(),
            route_settings: input.route_settings.clone(),
            access_log_settings: input.access_log_settings.clone(),
            tags: TagSet::new(),
            created_date: Some(now),
            last_updated_date: Some(now),
        };
        state.tags.insert(
            stage_arn(&input.api_id, &input.stage_name),
            with_system_tag(&input.tags),
        );
        state.stages.insert(key, stage.clone());
        Ok(stage)
    }

    async fn get_stage(&self, api_id: &str, stage_name: &str) -> Result<Stage, RemoteError> {
        let state = self.state();
        let mut stage = state
            .stages
            .get(&(api_id.to_string(), stage_name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("stage {}", stage_name)))?;
        stage.tags = state
            .tags
            .get(&stage_arn(api_id, stage_name))
            .cloned()
            .unwrap_or_default();
        Ok(stage)
    }

    async fn update_stage(&self, input: &StageInput) -> Result<Stage, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "update_stage");

        let stage = state
            .stages
            .get_mut(&(input.api_id.clone(), input.stage_name.clone()))
            .ok_or_else(|| not_found(format!("stage {}", input.stage_name)))?;
        stage.description = input.description.clone();
        stage.deployment_id = input.deployment_id.clone();
        stage.client_certificate_id = input.client_certificate_id.clone();
        stage.auto_deploy = input.auto_deploy;
        stage.stage_variables = input.stage_variables.clone();
        stage.default_route_settings = input.default_route_settings.clone();
        stage.route_settings = input.route_settings.clone();
        stage.access_log_settings = input.access_log_settings.clone();
        stage.last_updated_date = Some(Utc::now());
        Ok(stage.clone())
    }

    async fn delete_stage(&self, api_id: &str, stage_name: &str) -> Result<(), RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "delete_stage");
        state
            .stages
            .remove(&(api_id.to_string(), stage_name.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("stage {}", stage_name)))
    }
}

#[async_trait]
impl MqApi for FakeAws {
    async fn create_configuration(
        &self,
        input: &CreateConfigurationInput,
    ) -> Result<Configuration, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "create_configuration");

        let id = format!("c-{}", Uuid::new_v4().simple());
        let arn = arn(PARTITION, "mq", REGION, ACCOUNT_ID, &format!("configuration:{}", id));
        let description = Some(format!("Auto-generated default for {}", input.name));
        let configuration = Configuration {
            id: id.clone(),
            arn: arn.clone(),
            name: input.name.clone(),
            engine_type: input.engine_type.clone(),
            engine_version: input.engine_version.clone(),
            latest_revision: ConfigurationRevision {
                revision: 1,
                description: description.clone(),
                created: Some(Utc::now()),
            },
        };
        state.tags.insert(arn, with_system_tag(&input.tags));
        state.configurations.insert(
            id.clone(),
            FakeConfiguration {
                configuration: configuration.clone(),
                revisions: vec![RevisionData {
                    configuration_id: id,
                    revision: 1,
                    data: STANDARD
                        .encode("<broker xmlns=\"http://activemq.apache.org/schema/core\"/>"),
                    description,
                }],
            },
        );
        Ok(configuration)
    }

    async fn describe_configuration(
        &self,
        configuration_id: &str,
    ) -> Result<Configuration, RemoteError> {
        self.state()
            .configurations
            .get(configuration_id)
            .map(|c| c.configuration.clone())
            .ok_or_else(|| not_found(format!("configuration {}", configuration_id)))
    }

    async fn describe_configuration_revision(
        &self,
        configuration_id: &str,
        revision: i32,
    ) -> Result<RevisionData, RemoteError> {
        self.state()
            .configurations
            .get(configuration_id)
            .and_then(|c| c.revisions.iter().find(|r| r.revision == revision).cloned())
            .ok_or_else(|| {
                not_found(format!("configuration {} revision {}", configuration_id, revision))
            })
    }

    async fn update_configuration(
        &self,
        input: &UpdateConfigurationInput,
    ) -> Result<ConfigurationRevision, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "update_configuration");

        if STANDARD.decode(&input.data).is_err() {
            return Err(RemoteError::Api(anyhow!("BadRequestException: data is not base64")));
        }

        let fake = state
            .configurations
            .get_mut(&input.configuration_id)
            .ok_or_else(|| not_found(format!("configuration {}", input.configuration_id)))?;
        let revision = ConfigurationRevision {
            revision: fake.configuration.latest_revision.revision + 1,
            description: input.description.clone(),
            created: Some(Utc::now()),
        };
        fake.revisions.push(RevisionData {
            configuration_id: input.configuration_id.clone(),
            revision: revision.revision,
            data: input.data.clone(),
            description: input.description.clone(),
        });
        fake.configuration.latest_revision = revision.clone();
        Ok(revision)
    }
}

fn resolver_arn(api_id: &str, type_name: &str, field_name: &str) -> String {
    arn(
        PARTITION,
        "appsync",
        REGION,
        ACCOUNT_ID,
        &format!("apis/{}/types/{}/resolvers/{}", api_id, type_name, field_name),
    )
}

fn resolver_from(input: &ResolverInput) -> Resolver {
    Resolver {
        resolver_arn: resolver_arn(&input.api_id, &input.type_name, &input.field_name),
        type_name: input.type_name.clone(),
        field_name: input.field_name.clone(),
        data_source_name: input.data_source_name.clone(),
        kind: input.kind,
        pipeline_functions: input.pipeline_functions.clone(),
        request_mapping_template: input.request_mapping_template.clone(),
        response_mapping_template: input.response_mapping_template.clone(),
    }
}

fn function_from(input: &FunctionInput, function_id: &str) -> FunctionConfiguration {
    FunctionConfiguration {
        function_id: function_id.to_string(),
        function_arn: arn(
            PARTITION,
            "appsync",
            REGION,
            ACCOUNT_ID,
            &format!("apis/{}/functions/{}", input.api_id, function_id),
        ),
        name: input.name.clone(),
        data_source_name: input.data_source_name.clone(),
        description: input.description.clone(),
        function_version: input.function_version.clone(),
        request_mapping_template: input.request_mapping_template.clone(),
        response_mapping_template: input.response_mapping_template.clone(),
    }
}

#[async_trait]
impl AppSyncApi for FakeAws {
    async fn create_resolver(&self, input: &ResolverInput) -> Result<Resolver, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "create_resolver");

        let key = (
            input.api_id.clone(),
            input.type_name.clone(),
            input.field_name.clone(),
        );
        if state.resolvers.contains_key(&key) {
            return Err(RemoteError::Api(anyhow!(
                "ConcurrentModificationException: resolver exists"
            )));
        }
        let resolver = resolver_from(input);
        state.resolvers.insert(key, resolver.clone());
        Ok(resolver)
    }

    async fn get_resolver(
        &self,
        api_id: &str,
        type_name: &str,
        field_name: &str,
    ) -> Result<Resolver, RemoteError> {
        self.state()
            .resolvers
            .get(&(api_id.to_string(), type_name.to_string(), field_name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("resolver {}.{}", type_name, field_name)))
    }

    async fn update_resolver(&self, input: &ResolverInput) -> Result<Resolver, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "update_resolver");

        let resolver = state
            .resolvers
            .get_mut(&(
                input.api_id.clone(),
                input.type_name.clone(),
                input.field_name.clone(),
            ))
            .ok_or_else(|| {
                not_found(format!("resolver {}.{}", input.type_name, input.field_name))
            })?;
        *resolver = resolver_from(input);
        Ok(resolver.clone())
    }

    async fn delete_resolver(
        &self,
        api_id: &str,
        type_name: &str,
        field_name: &str,
    ) -> Result<(), RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "delete_resolver");
        state
            .resolvers
            .remove(&(api_id.to_string(), type_name.to_string(), field_name.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("resolver {}.{}", type_name, field_name)))
    }

    async fn create_function(
        &self,
        input: &FunctionInput,
    ) -> Result<FunctionConfiguration, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "create_function");

        // Service-assigned IDs never contain the composite ID delimiter
        let function_id = Uuid::new_v4().simple().to_string();
        let function = function_from(input, &function_id);
        state
            .functions
            .insert((input.api_id.clone(), function_id), function.clone());
        Ok(function)
    }

    async fn get_function(
        &self,
        api_id: &str,
        function_id: &str,
    ) -> Result<FunctionConfiguration, RemoteError> {
        self.state()
            .functions
            .get(&(api_id.to_string(), function_id.to_string()))
            .cloned()
            .ok_or_else(|| not_found(format!("function {}", function_id)))
    }

    async fn update_function(
        &self,
        input: &FunctionInput,
    ) -> Result<FunctionConfiguration, RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "update_function");

        let function_id = input
            .function_id
            .clone()
            .ok_or_else(|| {
                RemoteError::Api(anyhow!("BadRequestException: functionId is required"))
            })?;
        let function = state
            .functions
            .get_mut(&(input.api_id.clone(), function_id.clone()))
            .ok_or_else(|| not_found(format!("function {}", function_id)))?;
        *function = function_from(input, &function_id);
        Ok(function.clone())
    }

    async fn delete_function(&self, api_id: &str, function_id: &str) -> Result<(), RemoteError> {
        let mut state = self.state();
        Self::record(&mut state, "delete_function");
        state
            .functions
            .remove(&(api_id.to_string(), function_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(format!("function {}", function_id)))
    }
}
