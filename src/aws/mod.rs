//! AWS service seams
//!
//! The adapters never talk to AWS directly. Each service is reached through
//! an async trait so the wire client can be swapped out (the real SDK client
//! in production, an in-memory store in tests).
//!
//! # Module Structure
//!
//! - [`apigatewayv2`] - API Gateway v2 VPC links, APIs and stages
//! - [`appsync`] - AppSync resolvers and functions
//! - [`mq`] - Amazon MQ configurations and revisions
//! - [`tagging`] - Tag list/tag/untag calls shared by taggable services

pub mod apigatewayv2;
pub mod appsync;
pub mod mq;
pub mod tagging;

/// Errors returned by a remote client
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The remote object does not exist (any more)
    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Api(#[from] anyhow::Error),
}

/// Build an ARN from its components
pub fn arn(
    partition: &str,
    service: &str,
    region: &str,
    account_id: &str,
    resource: &str,
) -> String {
    format!("arn:{partition}:{service}:{region}:{account_id}:{resource}")
}
