use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::ArrayError;
use super::v1::{
    AccessPolicy, AddUserPolicyRequest, Bucket, ListAccessPoliciesRequest, ListBucketsRequest,
    ListObjectStoreUsersRequest, ListUserPoliciesRequest, ObjectStoreUser, PolicyMember,
    RemoveUserPolicyRequest,
};
use super::{account_bucket_filter, account_user_filter, ApiRequest, ArrayApi};

pub const DEFAULT_API_VERSION: &str = "1.12";

const API_TOKEN_HEADER: &str = "api-token";
const AUTH_TOKEN_HEADER: &str = "x-auth-token";

#[derive(Debug, Clone)]
pub struct ArrayClient {
    /// Array root, e.g. `https://10.0.0.5/`
    pub remote: Url,
    /// Versioned resource root, e.g. `https://10.0.0.5/api/1.12/`
    api_base: Url,
    client: Client,
    session: Option<HeaderValue>,
}

impl ArrayClient {
    pub fn new(remote: &Url, api_version: &str, verify_tls: bool) -> Result<Self, ArrayError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(default_headers)
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;

        let api_base = remote.join(&format!("api/{}/", api_version))?;

        Ok(Self {
            remote: remote.clone(),
            api_base,
            client,
            session: None,
        })
    }

    /// Exchange the API token for a session token.
    pub async fn login(&mut self, api_token: &str) -> Result<(), ArrayError> {
        let url = self.remote.join("api/login")?;
        tracing::debug!(%url, "logging in");

        let response = self
            .client
            .post(url)
            .header(API_TOKEN_HEADER, HeaderValue::from_str(api_token)?)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ArrayError::HttpStatus(
                response.status(),
                response.text().await?,
            ));
        }

        let token = response
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .cloned()
            .ok_or(ArrayError::MissingAuthToken)?;
        self.session = Some(token);
        Ok(())
    }

    /// End the session. A client that never logged in has nothing to do.
    pub async fn logout(&mut self) -> Result<(), ArrayError> {
        let Some(token) = self.session.take() else {
            return Ok(());
        };

        let url = self.remote.join("api/logout")?;
        tracing::debug!(%url, "logging out");

        let response = self
            .client
            .post(url)
            .header(AUTH_TOKEN_HEADER, token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ArrayError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ArrayError> {
        let token = self.session.clone().ok_or(ArrayError::NotAuthenticated)?;
        let request_builder = request
            .build_request(&self.api_base, &self.client)?
            .header(AUTH_TOKEN_HEADER, token);
        let response = request_builder.send().await?;
        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "array call");

        if status.is_success() {
            let body = response.bytes().await?;
            parse_body(&body)
        } else {
            Err(ArrayError::HttpStatus(status, response.text().await?))
        }
    }

    #[cfg(test)]
    fn base_url(&self) -> &Url {
        &self.api_base
    }
}

/// Mutation endpoints may answer with an empty body.
fn parse_body<R: DeserializeOwned>(body: &[u8]) -> Result<R, ArrayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        Ok(serde_json::from_slice(b"null")?)
    } else {
        Ok(serde_json::from_slice(body)?)
    }
}

#[async_trait]
impl ArrayApi for ArrayClient {
    async fn list_account_buckets(&self, account: &str) -> Result<Vec<Bucket>, ArrayError> {
        let request = ListBucketsRequest {
            filter: Some(account_bucket_filter(account)),
        };
        Ok(self.call(request).await?.items)
    }

    async fn list_account_users(&self, account: &str) -> Result<Vec<ObjectStoreUser>, ArrayError> {
        let request = ListObjectStoreUsersRequest {
            filter: Some(account_user_filter(account)),
        };
        Ok(self.call(request).await?.items)
    }

    async fn list_access_policies(&self) -> Result<Vec<AccessPolicy>, ArrayError> {
        Ok(self.call(ListAccessPoliciesRequest {}).await?.items)
    }

    async fn list_user_policies(&self, user: &str) -> Result<Vec<PolicyMember>, ArrayError> {
        let request = ListUserPoliciesRequest {
            member_names: user.to_string(),
        };
        Ok(self.call(request).await?.items)
    }

    async fn add_user_policy(&self, user: &str, policy: &str) -> Result<(), ArrayError> {
        let request = AddUserPolicyRequest {
            member_names: user.to_string(),
            policy_names: policy.to_string(),
        };
        self.call(request).await?;
        Ok(())
    }

    async fn remove_user_policy(&self, user: &str, policy: &str) -> Result<(), ArrayError> {
        let request = RemoveUserPolicyRequest {
            member_names: user.to_string(),
            policy_names: policy.to_string(),
        };
        self.call(request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::IgnoredAny;

    use crate::enforce::{enforce, FULL_ACCESS_POLICY};
    use crate::testkit::{FakeArrayServer, FAKE_API_TOKEN, FAKE_API_VERSION};
    use crate::usage::collect_usage;

    const GIB: u64 = 1024 * 1024 * 1024;

    async fn fake_client() -> (FakeArrayServer, ArrayClient) {
        let server = FakeArrayServer::spawn().await;
        let client = ArrayClient::new(server.url(), FAKE_API_VERSION, false).unwrap();
        (server, client)
    }

    #[test]
    fn test_api_base_is_versioned() {
        let remote = Url::parse("https://array.example.com").unwrap();
        let client = ArrayClient::new(&remote, "1.12", false).unwrap();
        assert_eq!(
            client.base_url().as_str(),
            "https://array.example.com/api/1.12/"
        );
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn test_call_requires_login() {
        let remote = Url::parse("https://array.example.com").unwrap();
        let client = ArrayClient::new(&remote, DEFAULT_API_VERSION, true).unwrap();
        let result = client.list_access_policies().await;
        assert!(matches!(result, Err(ArrayError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_logout_without_login_is_noop() {
        let remote = Url::parse("https://array.example.com").unwrap();
        let mut client = ArrayClient::new(&remote, DEFAULT_API_VERSION, true).unwrap();
        client.logout().await.unwrap();
    }

    #[test]
    fn test_parse_empty_body() {
        let _: IgnoredAny = parse_body(b"").unwrap();
        let _: IgnoredAny = parse_body(b"{\"items\": []}").unwrap();
        let parsed: Result<crate::array::v1::ItemsResponse<AccessPolicy>, _> = parse_body(b"");
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_token() {
        let (_server, mut client) = fake_client().await;

        let err = client.login("wrong").await.unwrap_err();

        match err {
            ArrayError::HttpStatus(status, body) => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "invalid api token");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn test_report_over_http() {
        let (server, mut client) = fake_client().await;
        client.login(FAKE_API_TOKEN).await.unwrap();
        assert!(client.is_logged_in());

        let report = collect_usage(&client, "teamA").await.unwrap();

        assert_eq!(report.total, 3 * GIB);
        assert_eq!(
            report.lines(),
            vec!["Bucket b1 2.0GB", "Bucket b2 1.0GB", "Total for teamA = 3.0GB"]
        );
        assert_eq!(server.filters(), vec!["account.name='teamA'"]);

        client.logout().await.unwrap();
        assert!(server.logged_out());
        assert!(!client.is_logged_in());
    }

    #[tokio::test]
    async fn test_listing_error_carries_status() {
        let (_server, mut client) = fake_client().await;
        client.login(FAKE_API_TOKEN).await.unwrap();

        let err = client.list_account_buckets("broken").await.unwrap_err();

        assert!(matches!(err, ArrayError::HttpStatus(status, _) if status.as_u16() == 500));
    }

    #[tokio::test]
    async fn test_enforce_over_http() {
        let (server, mut client) = fake_client().await;
        client.login(FAKE_API_TOKEN).await.unwrap();

        let outcome = enforce(&client, "teamA").await.unwrap();

        assert_eq!(
            server.mutations(),
            vec![
                (
                    "add".to_string(),
                    "teamA/alice".to_string(),
                    "pure:policy/object-read".to_string()
                ),
                (
                    "remove".to_string(),
                    "teamA/alice".to_string(),
                    FULL_ACCESS_POLICY.to_string()
                ),
            ]
        );
        assert_eq!(
            outcome
                .recovery
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "purepolicy obj access remove --user teamA/alice pure:policy/object-read",
                "purepolicy obj access add --user teamA/alice pure:policy/full-access",
            ]
        );
        assert!(server.filters().iter().any(|f| f == "name='teamA/*'"));
    }
}
