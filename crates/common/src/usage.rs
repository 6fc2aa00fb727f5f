use std::fmt;

use crate::array::{ArrayApi, ArrayError};
use crate::size::{humanize_bytes, Quota};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketUsage {
    pub name: String,
    pub virtual_bytes: u64,
}

/// Logical space used by every bucket of one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageReport {
    pub account: String,
    pub buckets: Vec<BucketUsage>,
    pub total: u64,
}

impl UsageReport {
    pub fn new(account: impl Into<String>, buckets: Vec<BucketUsage>) -> Self {
        let total = buckets
            .iter()
            .fold(0u64, |acc, b| acc.saturating_add(b.virtual_bytes));
        Self {
            account: account.into(),
            buckets,
            total,
        }
    }

    /// One line per bucket followed by the account total.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .buckets
            .iter()
            .map(|b| format!("Bucket {} {}", b.name, humanize_bytes(b.virtual_bytes)))
            .collect();
        lines.push(format!(
            "Total for {} = {}",
            self.account,
            humanize_bytes(self.total)
        ));
        lines
    }

    /// Usage equal to the quota is still within it.
    pub fn exceeds(&self, quota: &Quota) -> bool {
        self.total > quota.bytes()
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// List the buckets owned by `account` and total their logical usage.
pub async fn collect_usage<A>(api: &A, account: &str) -> Result<UsageReport, ArrayError>
where
    A: ArrayApi + ?Sized,
{
    let buckets = api
        .list_account_buckets(account)
        .await?
        .into_iter()
        .map(|b| BucketUsage {
            name: b.name,
            virtual_bytes: b.space.virtual_bytes,
        })
        .collect::<Vec<_>>();

    tracing::debug!(account, buckets = buckets.len(), "collected bucket usage");
    Ok(UsageReport::new(account, buckets))
}
