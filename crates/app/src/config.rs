use url::Url;

use common::size::Quota;

use crate::args::Args;

/// How to reach the array's management API.
#[derive(Debug, Clone)]
pub struct ArrayConfig {
    /// Array root, always ending in `/`
    pub url: Url,
    pub api_token: String,
    pub api_version: String,
    pub verify_tls: bool,
}

/// Credentials and routing for quota warning mail.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub address: String,
    pub password: String,
    pub recipient: String,
}

/// Everything one run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub array: ArrayConfig,
    /// Unset when no sending address is configured
    pub smtp: Option<SmtpConfig>,
    pub account: String,
    pub quota: Quota,
    pub enforce: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("requires PUREFB_URL and PUREFB_API environment variables")]
    MissingArray,
    #[error("invalid array endpoint '{0}': {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("SMTP_EMAIL is set but SMTP_PASSWORD is not")]
    MissingSmtpPassword,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        let (Some(endpoint), Some(api_token)) = (non_empty(args.array_url), non_empty(args.api_token))
        else {
            return Err(ConfigError::MissingArray);
        };

        let smtp = match non_empty(args.smtp_email) {
            Some(address) => {
                let password =
                    non_empty(args.smtp_password).ok_or(ConfigError::MissingSmtpPassword)?;
                let recipient = non_empty(args.smtp_recipient).unwrap_or_else(|| address.clone());
                Some(SmtpConfig {
                    host: args.smtp_host,
                    address,
                    password,
                    recipient,
                })
            }
            None => None,
        };

        Ok(Self {
            array: ArrayConfig {
                url: endpoint_url(&endpoint)?,
                api_token,
                api_version: args.api_version,
                verify_tls: args.verify_tls,
            },
            smtp,
            account: args.account,
            quota: args.quota,
            enforce: args.enforce,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accept a bare host or address as well as a full URL.
fn endpoint_url(endpoint: &str) -> Result<Url, ConfigError> {
    let candidate = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    };

    let mut url =
        Url::parse(&candidate).map_err(|e| ConfigError::InvalidUrl(endpoint.to_string(), e))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
