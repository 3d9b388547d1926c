//! The Auto Scaling facade: query-parameter RPC over GET.

use cloudcall_core::param::{ParamWriter, ToParams};
use cloudcall_core::{Client, Evaluator, Request, ResponseFormat, Result};
use http::Method;
use log::debug;
use serde::de::DeserializeOwned;

use crate::model::*;

/// The query API version this crate speaks.
pub const API_VERSION: &str = "2011-01-01";

/// Client for the Auto Scaling service.
#[derive(Debug, Clone)]
pub struct AutoScaling {
    client: Client,
    evaluator: Evaluator,
}

impl AutoScaling {
    /// Wrap a signed-request client in the Auto Scaling dialect.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            evaluator: Evaluator::new(ResponseFormat::Xml),
        }
    }

    /// Describe groups, optionally filtered by name, one page at a time.
    pub async fn describe_auto_scaling_groups(
        &self,
        input: &DescribeAutoScalingGroupsInput,
    ) -> Result<DescribeAutoScalingGroupsResponse> {
        self.call("DescribeAutoScalingGroups", input).await
    }

    /// Create a group.
    pub async fn create_auto_scaling_group(
        &self,
        input: &CreateAutoScalingGroupInput,
    ) -> Result<CreateAutoScalingGroupResponse> {
        self.call("CreateAutoScalingGroup", input).await
    }

    /// Create tags, overwriting same-keyed ones.
    pub async fn create_or_update_tags(
        &self,
        input: &CreateOrUpdateTagsInput,
    ) -> Result<CreateOrUpdateTagsResponse> {
        self.call("CreateOrUpdateTags", input).await
    }

    /// Delete a group.
    pub async fn delete_auto_scaling_group(
        &self,
        input: &DeleteAutoScalingGroupInput,
    ) -> Result<DeleteAutoScalingGroupResponse> {
        self.call("DeleteAutoScalingGroup", input).await
    }

    /// One query-API call: `Action` and `Version` first, then the input's
    /// fields, all carried by the query string.
    async fn call<I, O>(&self, action: &str, input: &I) -> Result<O>
    where
        I: ToParams,
        O: DeserializeOwned,
    {
        let mut req = Request::client(Method::GET, self.client.service().endpoint())?;
        req.query_pair("Action", action);
        req.query_pair("Version", API_VERSION);

        let mut w = ParamWriter::new();
        input.to_params(&mut w);
        for (k, v) in w.into_pairs() {
            req.query_pair(k, v);
        }

        debug!("calling {action} on {}", self.client.service().host());
        self.client.send(req, &self.evaluator).await
    }
}
