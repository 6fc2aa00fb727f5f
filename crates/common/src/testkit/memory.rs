use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::array::v1::{AccessPolicy, Bucket, BucketSpace, ObjectStoreUser, PolicyMember, Reference};
use crate::array::{ArrayApi, ArrayError};

/// A call made against a [`MemoryArray`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArrayCall {
    ListBuckets { account: String },
    ListUsers { account: String },
    ListPolicies,
    ListUserPolicies { user: String },
    AddPolicy { user: String, policy: String },
    RemovePolicy { user: String, policy: String },
}

impl ArrayCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::AddPolicy { .. } | Self::RemovePolicy { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryArray {
    inner: Arc<Mutex<MemoryArrayInner>>,
}

#[derive(Debug, Default)]
struct MemoryArrayInner {
    buckets: Vec<Bucket>,
    users: Vec<String>,
    policies: Vec<String>,
    /// (user, policy) in attachment order
    attachments: Vec<(String, String)>,
    calls: Vec<ArrayCall>,
    /// Calls that answer with a server error instead of succeeding
    failures: Vec<ArrayCall>,
}

impl MemoryArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, account: &str, name: &str, virtual_bytes: u64) -> Self {
        self.inner.lock().buckets.push(Bucket {
            name: name.to_string(),
            account: Reference {
                name: account.to_string(),
            },
            space: BucketSpace { virtual_bytes },
        });
        self
    }

    pub fn with_policy(self, name: &str) -> Self {
        self.inner.lock().policies.push(name.to_string());
        self
    }

    pub fn with_user(self, name: &str, policies: &[&str]) -> Self {
        {
            let mut inner = self.inner.lock();
            inner.users.push(name.to_string());
            for policy in policies {
                inner
                    .attachments
                    .push((name.to_string(), policy.to_string()));
            }
        }
        self
    }

    /// Make `call` fail with an HTTP 500 every time it is made.
    pub fn fail_on(self, call: ArrayCall) -> Self {
        self.inner.lock().failures.push(call);
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<ArrayCall> {
        self.inner.lock().calls.clone()
    }

    /// Only the policy attach/detach calls, in order
    pub fn mutations(&self) -> Vec<ArrayCall> {
        self.calls().into_iter().filter(ArrayCall::is_mutation).collect()
    }

    /// Current policies of `user`, in attachment order
    pub fn user_policies(&self, user: &str) -> Vec<String> {
        self.inner
            .lock()
            .attachments
            .iter()
            .filter(|(u, _)| u == user)
            .map(|(_, p)| p.clone())
            .collect()
    }

    fn record(&self, call: ArrayCall) -> Result<(), ArrayError> {
        let mut inner = self.inner.lock();
        let failing = inner.failures.contains(&call);
        inner.calls.push(call.clone());
        if failing {
            return Err(ArrayError::HttpStatus(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("injected failure: {:?}", call),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ArrayApi for MemoryArray {
    async fn list_account_buckets(&self, account: &str) -> Result<Vec<Bucket>, ArrayError> {
        self.record(ArrayCall::ListBuckets {
            account: account.to_string(),
        })?;
        Ok(self
            .inner
            .lock()
            .buckets
            .iter()
            .filter(|b| b.account.name == account)
            .cloned()
            .collect())
    }

    async fn list_account_users(&self, account: &str) -> Result<Vec<ObjectStoreUser>, ArrayError> {
        self.record(ArrayCall::ListUsers {
            account: account.to_string(),
        })?;
        let prefix = format!("{}/", account);
        Ok(self
            .inner
            .lock()
            .users
            .iter()
            .filter(|name| name.starts_with(&prefix))
            .map(|name| ObjectStoreUser { name: name.clone() })
            .collect())
    }

    async fn list_access_policies(&self) -> Result<Vec<AccessPolicy>, ArrayError> {
        self.record(ArrayCall::ListPolicies)?;
        Ok(self
            .inner
            .lock()
            .policies
            .iter()
            .map(|name| AccessPolicy { name: name.clone() })
            .collect())
    }

    async fn list_user_policies(&self, user: &str) -> Result<Vec<PolicyMember>, ArrayError> {
        self.record(ArrayCall::ListUserPolicies {
            user: user.to_string(),
        })?;
        Ok(self
            .user_policies(user)
            .into_iter()
            .map(|policy| PolicyMember {
                member: Reference {
                    name: user.to_string(),
                },
                policy: Reference { name: policy },
            })
            .collect())
    }

    async fn add_user_policy(&self, user: &str, policy: &str) -> Result<(), ArrayError> {
        self.record(ArrayCall::AddPolicy {
            user: user.to_string(),
            policy: policy.to_string(),
        })?;
        let mut inner = self.inner.lock();
        let attachment = (user.to_string(), policy.to_string());
        if !inner.attachments.contains(&attachment) {
            inner.attachments.push(attachment);
        }
        Ok(())
    }

    async fn remove_user_policy(&self, user: &str, policy: &str) -> Result<(), ArrayError> {
        self.record(ArrayCall::RemovePolicy {
            user: user.to_string(),
            policy: policy.to_string(),
        })?;
        self.inner
            .lock()
            .attachments
            .retain(|(u, p)| !(u == user && p == policy));
        Ok(())
    }
}
