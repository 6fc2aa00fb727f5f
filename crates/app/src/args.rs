pub use clap::Parser;

use common::array::DEFAULT_API_VERSION;
use common::size::Quota;

#[derive(Parser, Debug, Clone)]
#[command(name = "s3-account-quota")]
#[command(version = env!("REPO_VERSION"))]
#[command(about = "Report object store usage for an account and enforce its quota")]
pub struct Args {
    /// Account whose buckets are totalled and whose users are downgraded
    #[arg(long, default_value = "default")]
    pub account: String,

    /// Quota for the account: an integer, optionally suffixed with KB, MB, GB, TB or PB
    #[arg(long, default_value = "0")]
    pub quota: Quota,

    /// Downgrade the account's user policies when the quota is exceeded
    #[arg(long)]
    pub enforce: bool,

    /// Management endpoint of the array (host name, address or URL)
    #[arg(long = "array-url", env = "PUREFB_URL", hide_env_values = true)]
    pub array_url: Option<String>,

    /// API token used to open a management session
    #[arg(long, env = "PUREFB_API", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Management REST API version
    #[arg(long, default_value = DEFAULT_API_VERSION)]
    pub api_version: String,

    /// Verify the array's TLS certificate (arrays usually ship self-signed ones)
    #[arg(long)]
    pub verify_tls: bool,

    /// Address that sends quota warnings; warnings are only mailed when set
    #[arg(long, env = "SMTP_EMAIL")]
    pub smtp_email: Option<String>,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    /// SMTP relay, reached over implicit TLS
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// Where quota warnings go (defaults to the sending address)
    #[arg(long, env = "SMTP_RECIPIENT")]
    pub smtp_recipient: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: tracing::Level,
}
