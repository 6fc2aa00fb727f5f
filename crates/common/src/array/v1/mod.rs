//! Request types for the versioned management REST API.
//!
//! Every list endpoint answers with an `{"items": [...]}` envelope.

pub mod buckets;
pub mod policies;
pub mod users;

use serde::{Deserialize, Serialize};

pub use buckets::{Bucket, BucketSpace, ListBucketsRequest};
pub use policies::{
    AccessPolicy, AddUserPolicyRequest, ListAccessPoliciesRequest, ListUserPoliciesRequest,
    PolicyMember, RemoveUserPolicyRequest,
};
pub use users::{ListObjectStoreUsersRequest, ObjectStoreUser};

/// The `{"items": [...]}` envelope every list call returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

/// A `{"name": ...}` reference to another resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub name: String,
}
