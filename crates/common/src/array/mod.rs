//! Client for the storage array's management REST API.
//!
//! Only the handful of endpoints needed for usage reporting and policy
//! enforcement are wrapped. Reporting and enforcement code talks to the
//! array through [`ArrayApi`] so it can run against an in-memory double.

mod client;
mod error;
pub mod v1;

pub use client::{ArrayClient, DEFAULT_API_VERSION};
pub use error::ArrayError;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use v1::{AccessPolicy, Bucket, ObjectStoreUser, PolicyMember};

pub trait ApiRequest {
    type Response: DeserializeOwned;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError>;
}

/// The operations reporting and enforcement need from the array.
#[async_trait]
pub trait ArrayApi: Send + Sync {
    /// Buckets whose owning account is `account`
    async fn list_account_buckets(&self, account: &str) -> Result<Vec<Bucket>, ArrayError>;

    /// Object store users named `<account>/*`
    async fn list_account_users(&self, account: &str) -> Result<Vec<ObjectStoreUser>, ArrayError>;

    /// Every access policy defined on the array
    async fn list_access_policies(&self) -> Result<Vec<AccessPolicy>, ArrayError>;

    /// Policy attachments for a single user
    async fn list_user_policies(&self, user: &str) -> Result<Vec<PolicyMember>, ArrayError>;

    async fn add_user_policy(&self, user: &str, policy: &str) -> Result<(), ArrayError>;

    async fn remove_user_policy(&self, user: &str, policy: &str) -> Result<(), ArrayError>;
}

/// Filter matching buckets owned by `account`.
pub fn account_bucket_filter(account: &str) -> String {
    format!("account.name='{}'", account)
}

/// Filter matching every user in `account`.
pub fn account_user_filter(account: &str) -> String {
    format!("name='{}/*'", account)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters() {
        assert_eq!(account_bucket_filter("teamA"), "account.name='teamA'");
        assert_eq!(account_user_filter("teamA"), "name='teamA/*'");
    }
}
