//! Request and response shapes for the Auto Scaling query API.
//!
//! Request fields render through the field codec: sequences expand under
//! `.member.N` with base 1, nested structs flatten their own fields below
//! the element prefix. Responses are XML documents decoded with serde.

use cloudcall_core::param::{FromParams, ParamReader, ParamWriter, Tag, ToParams};
use cloudcall_core::Result;
use serde::Deserialize;

/// A resource tag attached to a group, propagated to instances on launch
/// when asked to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagSpec {
    /// Name of the tagged resource (the group name).
    pub resource_id: String,
    /// Resource type; the service accepts `auto-scaling-group`.
    pub resource_type: String,
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
    /// Whether new instances inherit the tag.
    pub propagate_at_launch: bool,
}

impl TagSpec {
    const RESOURCE_ID: Tag = Tag::named("ResourceId").omit_empty();
    const RESOURCE_TYPE: Tag = Tag::named("ResourceType").omit_empty();
    const KEY: Tag = Tag::named("Key");
    const VALUE: Tag = Tag::named("Value");
    const PROPAGATE: Tag = Tag::named("PropagateAtLaunch");
}

impl ToParams for TagSpec {
    fn to_params(&self, w: &mut ParamWriter) {
        w.write_str(&Self::RESOURCE_ID, &self.resource_id);
        w.write_str(&Self::RESOURCE_TYPE, &self.resource_type);
        w.write_str(&Self::KEY, &self.key);
        w.write_str(&Self::VALUE, &self.value);
        w.write_bool(&Self::PROPAGATE, self.propagate_at_launch);
    }
}

impl FromParams for TagSpec {
    fn from_params(r: &ParamReader<'_>) -> Result<Self> {
        Ok(Self {
            resource_id: r.read_str(&Self::RESOURCE_ID),
            resource_type: r.read_str(&Self::RESOURCE_TYPE),
            key: r.read_str(&Self::KEY),
            value: r.read_str(&Self::VALUE),
            propagate_at_launch: r.read_bool(&Self::PROPAGATE)?,
        })
    }
}

/// Input for `DescribeAutoScalingGroups`.
#[derive(Debug, Clone, Default)]
pub struct DescribeAutoScalingGroupsInput {
    /// Group names to describe; empty describes every group.
    pub auto_scaling_group_names: Vec<String>,
    /// Page size.
    pub max_records: Option<i64>,
    /// Pagination cursor from a previous page.
    pub next_token: Option<String>,
}

impl ToParams for DescribeAutoScalingGroupsInput {
    fn to_params(&self, w: &mut ParamWriter) {
        w.write_str_seq(
            &Tag::named("AutoScalingGroupNames.member.#").base(1),
            &self.auto_scaling_group_names,
        );
        w.write_opt_i64(&Tag::named("MaxRecords"), self.max_records);
        w.write_opt_str(&Tag::named("NextToken"), self.next_token.as_deref());
    }
}

/// Input for `CreateAutoScalingGroup`.
#[derive(Debug, Clone, Default)]
pub struct CreateAutoScalingGroupInput {
    /// Name of the group to create. Must be unique per account and region.
    pub auto_scaling_group_name: String,
    /// Launch configuration the group instantiates.
    pub launch_configuration_name: String,
    /// Lower bound on group size.
    pub min_size: i64,
    /// Upper bound on group size.
    pub max_size: i64,
    /// Initial capacity; the service defaults it to `min_size`.
    pub desired_capacity: Option<i64>,
    /// Availability zones the group spans.
    pub availability_zones: Vec<String>,
    /// Tags applied at creation.
    pub tags: Vec<TagSpec>,
}

impl ToParams for CreateAutoScalingGroupInput {
    fn to_params(&self, w: &mut ParamWriter) {
        w.write_str(
            &Tag::named("AutoScalingGroupName"),
            &self.auto_scaling_group_name,
        );
        w.write_str(
            &Tag::named("LaunchConfigurationName").omit_empty(),
            &self.launch_configuration_name,
        );
        w.write_i64(&Tag::named("MinSize"), self.min_size);
        w.write_i64(&Tag::named("MaxSize"), self.max_size);
        w.write_opt_i64(&Tag::named("DesiredCapacity"), self.desired_capacity);
        w.write_str_seq(
            &Tag::named("AvailabilityZones.member.#").base(1),
            &self.availability_zones,
        );
        w.write_struct_seq(&Tag::named("Tags.member.#").base(1), &self.tags);
    }
}

/// Input for `CreateOrUpdateTags`.
#[derive(Debug, Clone, Default)]
pub struct CreateOrUpdateTagsInput {
    /// Tags to create or overwrite.
    pub tags: Vec<TagSpec>,
}

impl ToParams for CreateOrUpdateTagsInput {
    fn to_params(&self, w: &mut ParamWriter) {
        w.write_struct_seq(&Tag::named("Tags.member.#").base(1), &self.tags);
    }
}

/// Input for `DeleteAutoScalingGroup`.
#[derive(Debug, Clone, Default)]
pub struct DeleteAutoScalingGroupInput {
    /// Name of the group to delete.
    pub auto_scaling_group_name: String,
    /// Delete even while instances are still attached.
    pub force_delete: bool,
}

impl ToParams for DeleteAutoScalingGroupInput {
    fn to_params(&self, w: &mut ParamWriter) {
        w.write_str(
            &Tag::named("AutoScalingGroupName"),
            &self.auto_scaling_group_name,
        );
        w.write_bool(&Tag::named("ForceDelete").omit_empty(), self.force_delete);
    }
}

/// One group as described by the service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AutoScalingGroup {
    /// Group name.
    #[serde(rename = "AutoScalingGroupName", default)]
    pub auto_scaling_group_name: String,
    /// Launch configuration in use.
    #[serde(rename = "LaunchConfigurationName", default)]
    pub launch_configuration_name: String,
    /// Lower bound on group size.
    #[serde(rename = "MinSize", default)]
    pub min_size: i64,
    /// Upper bound on group size.
    #[serde(rename = "MaxSize", default)]
    pub max_size: i64,
    /// Capacity the group converges to.
    #[serde(rename = "DesiredCapacity", default)]
    pub desired_capacity: i64,
    /// Availability zones the group spans.
    #[serde(rename = "AvailabilityZones", default)]
    pub availability_zones: MemberList<String>,
    /// Creation time, as the service formatted it.
    #[serde(rename = "CreatedTime", default)]
    pub created_time: String,
}

/// XML `<member>` list wrapper.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberList<T> {
    /// The list elements.
    #[serde(rename = "member", default = "Vec::new")]
    pub member: Vec<T>,
}

impl<T> Default for MemberList<T> {
    fn default() -> Self {
        Self { member: Vec::new() }
    }
}

/// `<ResponseMetadata>` common to every query-API response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResponseMetadata {
    /// Request id for support correlation.
    #[serde(rename = "RequestId", default)]
    pub request_id: String,
}

/// Response document for `DescribeAutoScalingGroups`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescribeAutoScalingGroupsResponse {
    /// The operation result.
    #[serde(rename = "DescribeAutoScalingGroupsResult", default)]
    pub result: DescribeAutoScalingGroupsResult,
    /// Common response metadata.
    #[serde(rename = "ResponseMetadata", default)]
    pub response_metadata: ResponseMetadata,
}

/// Result element of `DescribeAutoScalingGroups`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescribeAutoScalingGroupsResult {
    /// The described groups.
    #[serde(rename = "AutoScalingGroups", default)]
    pub auto_scaling_groups: MemberList<AutoScalingGroup>,
    /// Cursor for the next page, when truncated.
    #[serde(rename = "NextToken", default)]
    pub next_token: Option<String>,
}

/// Response document for `CreateAutoScalingGroup`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAutoScalingGroupResponse {
    /// Common response metadata.
    #[serde(rename = "ResponseMetadata", default)]
    pub response_metadata: ResponseMetadata,
}

/// Response document for `CreateOrUpdateTags`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrUpdateTagsResponse {
    /// Common response metadata.
    #[serde(rename = "ResponseMetadata", default)]
    pub response_metadata: ResponseMetadata,
}

/// Response document for `DeleteAutoScalingGroup`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAutoScalingGroupResponse {
    /// Common response metadata.
    #[serde(rename = "ResponseMetadata", default)]
    pub response_metadata: ResponseMetadata,
}
