use std::fmt;
use std::io::{self, Write};

use common::array::{ArrayApi, ArrayClient, ArrayError};
use common::enforce::{enforce_with, EnforceError, EnforcementOutcome};
use common::size::Quota;
use common::usage::{collect_usage, UsageReport};

use crate::notify::{Notifier, NotifyError, SmtpNotifier};
use crate::op::{Op, OpContext};

/// Report an account's usage and act on a quota breach.
#[derive(Debug, Clone, Copy, Default)]
pub struct Check;

/// Everything a check wrote out, in order.
#[derive(Debug, Clone)]
pub struct CheckOutput {
    pub report: UsageReport,
    /// Set when usage is over quota
    pub warning: Option<String>,
    /// Sending address, when a warning mail was attempted
    pub notified_through: Option<String>,
    /// Set when enforcement ran, even partially
    pub enforcement: Option<EnforcementOutcome>,
}

impl CheckOutput {
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.report.lines();
        lines.extend(self.warning.clone());
        if let Some(sender) = &self.notified_through {
            lines.push(format!("Sending warning email through {}", sender));
        }
        if let Some(outcome) = &self.enforcement {
            lines.extend(outcome.lines());
        }
        lines
    }
}

impl fmt::Display for CheckOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("failed to create array client: {0}")]
    Client(#[source] ArrayError),
    #[error("invalid email settings: {0}")]
    NotifySetup(#[source] NotifyError),
    #[error("login failed: {0}")]
    Login(#[source] ArrayError),
    #[error("Unable to list buckets: {0}")]
    ListBuckets(#[source] ArrayError),
    #[error("failed to send warning email: {0}")]
    Notify(#[source] NotifyError),
    #[error("{0}")]
    Enforce(#[source] EnforceError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Subject line of the quota warning.
pub fn warning_message(quota: &Quota, account: &str) -> String {
    format!("WARN Quota of {} exceeded for account {}", quota, account)
}

fn write_lines(out: &mut (dyn Write + Send), lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

/// Report, warn and enforce against an already authenticated array.
///
/// Lines go to `out` as soon as they are known: the report before any
/// notification, each downgrade before that user's policies change, and
/// the recovery block once enforcement stops, even when it stops on an
/// error.
pub async fn run_check<A>(
    api: &A,
    account: &str,
    quota: &Quota,
    enforce_quota: bool,
    notifier: Option<&dyn Notifier>,
    out: &mut (dyn Write + Send),
) -> Result<CheckOutput, CheckError>
where
    A: ArrayApi + ?Sized,
{
    let report = collect_usage(api, account)
        .await
        .map_err(CheckError::ListBuckets)?;
    write_lines(out, &report.lines())?;

    let mut output = CheckOutput {
        report,
        warning: None,
        notified_through: None,
        enforcement: None,
    };

    if !output.report.exceeds(quota) {
        tracing::debug!(account, total = output.report.total, quota = quota.bytes(), "within quota");
        return Ok(output);
    }

    let warning = warning_message(quota, account);
    tracing::warn!(account, total = output.report.total, quota = quota.bytes(), "quota exceeded");
    write_lines(out, &[warning.clone()])?;
    output.warning = Some(warning.clone());

    if let Some(notifier) = notifier {
        let sender = notifier.sender().to_string();
        write_lines(out, &[format!("Sending warning email through {}", sender)])?;
        output.notified_through = Some(sender);
        notifier
            .notify(&warning, &output.report.to_string())
            .await
            .map_err(CheckError::Notify)?;
    }

    if enforce_quota {
        let mut write_error = None;
        let result = enforce_with(api, account, |downgrade| {
            if write_error.is_none() {
                write_error = write_lines(out, &[downgrade.to_string()]).err();
            }
        })
        .await;

        let (outcome, failure) = match result {
            Ok(outcome) => (outcome, None),
            Err(e) => (e.outcome.clone(), Some(e)),
        };
        // recovery commands must reach the operator before any error is raised
        write_lines(out, &outcome.recovery_lines())?;
        output.enforcement = Some(outcome);

        if let Some(e) = failure {
            return Err(CheckError::Enforce(e));
        }
        if let Some(e) = write_error {
            return Err(CheckError::Output(e));
        }
    }

    Ok(output)
}

impl Check {
    /// Run against the configured array, streaming output to `out`.
    pub async fn execute_to(
        &self,
        ctx: &OpContext,
        out: &mut (dyn Write + Send),
    ) -> Result<CheckOutput, CheckError> {
        let config = &ctx.config;

        let notifier = config
            .smtp
            .as_ref()
            .map(SmtpNotifier::new)
            .transpose()
            .map_err(CheckError::NotifySetup)?;

        let mut client = ArrayClient::new(
            &config.array.url,
            &config.array.api_version,
            config.array.verify_tls,
        )
        .map_err(CheckError::Client)?;
        client
            .login(&config.array.api_token)
            .await
            .map_err(CheckError::Login)?;

        let result = run_check(
            &client,
            &config.account,
            &config.quota,
            config.enforce,
            notifier.as_ref().map(|n| n as &dyn Notifier),
            out,
        )
        .await;

        if client.is_logged_in() {
            if let Err(e) = client.logout().await {
                tracing::warn!("logout failed: {}", e);
            }
        }

        result
    }
}

#[async_trait::async_trait]
impl Op for Check {
    type Error = CheckError;
    type Output = CheckOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.execute_to(ctx, &mut io::stdout()).await
    }
}
