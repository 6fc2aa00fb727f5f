use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::{ItemsResponse, Reference};
use crate::array::ApiRequest;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBucketsRequest {
    /// Server-side filter expression, e.g. `account.name='teamA'`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    #[serde(default)]
    pub account: Reference,
    #[serde(default)]
    pub space: BucketSpace,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketSpace {
    /// Logical bytes stored, before data reduction
    #[serde(default, rename = "virtual")]
    pub virtual_bytes: u64,
}

impl ApiRequest for ListBucketsRequest {
    type Response = ItemsResponse<Bucket>;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("buckets")?;
        Ok(client.get(full_url).query(&self))
    }
}
