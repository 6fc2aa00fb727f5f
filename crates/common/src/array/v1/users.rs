use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use super::ItemsResponse;
use crate::array::ApiRequest;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListObjectStoreUsersRequest {
    /// Server-side filter expression, e.g. `name='teamA/*'`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreUser {
    /// Fully qualified as `<account>/<user>`
    pub name: String,
}

impl ApiRequest for ListObjectStoreUsersRequest {
    type Response = ItemsResponse<ObjectStoreUser>;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("object-store-users")?;
        Ok(client.get(full_url).query(&self))
    }
}
