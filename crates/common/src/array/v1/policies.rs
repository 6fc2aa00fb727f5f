use reqwest::{Client, RequestBuilder, Url};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use super::{ItemsResponse, Reference};
use crate::array::ApiRequest;

const POLICIES_PATH: &str = "object-store-access-policies";
const POLICY_USERS_PATH: &str = "object-store-access-policies/object-store-users";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAccessPoliciesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPolicy {
    pub name: String,
}

impl ApiRequest for ListAccessPoliciesRequest {
    type Response = ItemsResponse<AccessPolicy>;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(POLICIES_PATH)?;
        Ok(client.get(full_url))
    }
}

/// Policies attached to the named users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListUserPoliciesRequest {
    /// Comma separated user names
    pub member_names: String,
}

/// One (user, policy) attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyMember {
    #[serde(default)]
    pub member: Reference,
    pub policy: Reference,
}

impl ApiRequest for ListUserPoliciesRequest {
    type Response = ItemsResponse<PolicyMember>;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(POLICY_USERS_PATH)?;
        Ok(client.get(full_url).query(&self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddUserPolicyRequest {
    pub member_names: String,
    pub policy_names: String,
}

impl ApiRequest for AddUserPolicyRequest {
    type Response = IgnoredAny;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(POLICY_USERS_PATH)?;
        Ok(client.post(full_url).query(&self))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveUserPolicyRequest {
    pub member_names: String,
    pub policy_names: String,
}

impl ApiRequest for RemoveUserPolicyRequest {
    type Response = IgnoredAny;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join(POLICY_USERS_PATH)?;
        Ok(client.delete(full_url).query(&self))
    }
}
