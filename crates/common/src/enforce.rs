//! Write revocation for accounts over quota.
//!
//! Users holding the full-access policy are moved onto every other policy
//! the array defines, then lose full-access. Users holding object-write
//! lose it outright. Each mutation records the command that reverses it,
//! in mutation order, so an operator can replay them to restore access.

use std::fmt;

use crate::array::{ArrayApi, ArrayError};

pub const FULL_ACCESS_POLICY: &str = "pure:policy/full-access";
pub const OBJECT_WRITE_POLICY: &str = "pure:policy/object-write";

/// Policies never handed out as replacements.
pub const DISABLED_POLICIES: [&str; 2] = [FULL_ACCESS_POLICY, OBJECT_WRITE_POLICY];

const RECOVERY_HEADER: &str =
    "To recover policies back to original state, issue the following CLI commands:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    Add,
    Remove,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => f.write_str("add"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// Policy CLI invocation that undoes one mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryCommand {
    pub action: RecoveryAction,
    pub user: String,
    pub policy: String,
}

impl RecoveryCommand {
    /// Undoes attaching `policy` to `user`.
    pub fn undo_attach(user: &str, policy: &str) -> Self {
        Self {
            action: RecoveryAction::Remove,
            user: user.to_string(),
            policy: policy.to_string(),
        }
    }

    /// Undoes detaching `policy` from `user`.
    pub fn undo_detach(user: &str, policy: &str) -> Self {
        Self {
            action: RecoveryAction::Add,
            user: user.to_string(),
            policy: policy.to_string(),
        }
    }
}

impl fmt::Display for RecoveryCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "purepolicy obj access {} --user {} {}",
            self.action, self.user, self.policy
        )
    }
}

/// A user moved off full-access onto the listed policies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downgrade {
    pub user: String,
    pub added: Vec<String>,
}

impl fmt::Display for Downgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downgrading user {} from full-access policy. Adding: {}",
            self.user,
            self.added.join(",")
        )
    }
}

/// What an enforcement pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnforcementOutcome {
    pub downgrades: Vec<Downgrade>,
    pub recovery: Vec<RecoveryCommand>,
}

impl EnforcementOutcome {
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.downgrades.iter().map(ToString::to_string).collect();
        lines.extend(self.recovery_lines());
        lines
    }

    /// The recovery block alone; empty when nothing changed.
    pub fn recovery_lines(&self) -> Vec<String> {
        if self.recovery.is_empty() {
            return Vec::new();
        }
        std::iter::once(RECOVERY_HEADER.to_string())
            .chain(self.recovery.iter().map(ToString::to_string))
            .collect()
    }
}

impl fmt::Display for EnforcementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// A failed array call part way through enforcement.
///
/// `outcome` holds everything applied before the failure, including the
/// recovery commands for it.
#[derive(Debug, thiserror::Error)]
#[error("enforcement stopped after {} recorded change(s): {source}", .outcome.recovery.len())]
pub struct EnforceError {
    pub outcome: EnforcementOutcome,
    #[source]
    pub source: ArrayError,
}

/// Revoke write access from every user of `account`.
pub async fn enforce<A>(api: &A, account: &str) -> Result<EnforcementOutcome, EnforceError>
where
    A: ArrayApi + ?Sized,
{
    enforce_with(api, account, |_| {}).await
}

/// Like [`enforce`], but hands each [`Downgrade`] to `on_downgrade` before
/// any of that user's policies change.
pub async fn enforce_with<A, F>(
    api: &A,
    account: &str,
    mut on_downgrade: F,
) -> Result<EnforcementOutcome, EnforceError>
where
    A: ArrayApi + ?Sized,
    F: FnMut(&Downgrade) + Send,
{
    let mut outcome = EnforcementOutcome::default();
    match run(api, account, &mut outcome, &mut on_downgrade).await {
        Ok(()) => Ok(outcome),
        Err(source) => Err(EnforceError { outcome, source }),
    }
}

async fn run<A, F>(
    api: &A,
    account: &str,
    outcome: &mut EnforcementOutcome,
    on_downgrade: &mut F,
) -> Result<(), ArrayError>
where
    A: ArrayApi + ?Sized,
    F: FnMut(&Downgrade) + Send,
{
    let replacements: Vec<String> = api
        .list_access_policies()
        .await?
        .into_iter()
        .map(|p| p.name)
        .filter(|name| !DISABLED_POLICIES.contains(&name.as_str()))
        .collect();

    let users: Vec<String> = api
        .list_account_users(account)
        .await?
        .into_iter()
        .map(|u| u.name)
        .collect();
    tracing::info!(account, users = users.len(), "enforcing quota");

    for user in &users {
        // NOTE: this snapshot is not refreshed after the full-access swap
        //  below, so the object-write check sees the pre-mutation state.
        let held: Vec<String> = api
            .list_user_policies(user)
            .await?
            .into_iter()
            .map(|m| m.policy.name)
            .collect();

        if held.iter().any(|p| p == FULL_ACCESS_POLICY) {
            let added: Vec<String> = replacements
                .iter()
                .filter(|p| !held.contains(p))
                .cloned()
                .collect();
            let downgrade = Downgrade {
                user: user.clone(),
                added: added.clone(),
            };
            on_downgrade(&downgrade);
            outcome.downgrades.push(downgrade);

            for policy in &added {
                api.add_user_policy(user, policy).await?;
                tracing::info!(user = %user, policy = %policy, "attached policy");
                outcome
                    .recovery
                    .push(RecoveryCommand::undo_attach(user, policy));
            }

            api.remove_user_policy(user, FULL_ACCESS_POLICY).await?;
            tracing::info!(user = %user, policy = FULL_ACCESS_POLICY, "detached policy");
            outcome
                .recovery
                .push(RecoveryCommand::undo_detach(user, FULL_ACCESS_POLICY));
        }

        if held.iter().any(|p| p == OBJECT_WRITE_POLICY) {
            api.remove_user_policy(user, OBJECT_WRITE_POLICY).await?;
            tracing::info!(user = %user, policy = OBJECT_WRITE_POLICY, "detached policy");
            outcome
                .recovery
                .push(RecoveryCommand::undo_detach(user, OBJECT_WRITE_POLICY));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{ArrayCall, MemoryArray};

    const READ: &str = "pure:policy/object-read";
    const LIST: &str = "pure:policy/bucket-list";

    fn array() -> MemoryArray {
        MemoryArray::new()
            .with_policy(FULL_ACCESS_POLICY)
            .with_policy(READ)
            .with_policy(OBJECT_WRITE_POLICY)
            .with_policy(LIST)
    }

    fn add(user: &str, policy: &str) -> ArrayCall {
        ArrayCall::AddPolicy {
            user: user.to_string(),
            policy: policy.to_string(),
        }
    }

    fn remove(user: &str, policy: &str) -> ArrayCall {
        ArrayCall::RemovePolicy {
            user: user.to_string(),
            policy: policy.to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_access_is_replaced() {
        let array = array().with_user("teamA/alice", &[FULL_ACCESS_POLICY, READ]);

        let outcome = enforce(&array, "teamA").await.unwrap();

        assert_eq!(
            array.mutations(),
            vec![
                add("teamA/alice", LIST),
                remove("teamA/alice", FULL_ACCESS_POLICY)
            ]
        );
        assert_eq!(array.user_policies("teamA/alice"), vec![READ, LIST]);
        assert_eq!(
            outcome.downgrades,
            vec![Downgrade {
                user: "teamA/alice".to_string(),
                added: vec![LIST.to_string()],
            }]
        );
        assert_eq!(
            outcome.lines(),
            vec![
                "Downgrading user teamA/alice from full-access policy. Adding: pure:policy/bucket-list",
                "To recover policies back to original state, issue the following CLI commands:",
                "purepolicy obj access remove --user teamA/alice pure:policy/bucket-list",
                "purepolicy obj access add --user teamA/alice pure:policy/full-access",
            ]
        );
    }

    #[tokio::test]
    async fn test_object_write_is_removed() {
        let array = array().with_user("teamA/bob", &[OBJECT_WRITE_POLICY, READ]);

        let outcome = enforce(&array, "teamA").await.unwrap();

        assert_eq!(
            array.mutations(),
            vec![remove("teamA/bob", OBJECT_WRITE_POLICY)]
        );
        assert!(outcome.downgrades.is_empty());
        assert_eq!(
            outcome.recovery,
            vec![RecoveryCommand::undo_detach(
                "teamA/bob",
                OBJECT_WRITE_POLICY
            )]
        );
    }

    #[tokio::test]
    async fn test_both_policies_use_stale_snapshot() {
        let array = array().with_user("teamA/carol", &[FULL_ACCESS_POLICY, OBJECT_WRITE_POLICY]);

        let outcome = enforce(&array, "teamA").await.unwrap();

        // two candidates not held, plus full-access and object-write
        assert_eq!(outcome.recovery.len(), 2 + 2);
        assert_eq!(
            array.mutations(),
            vec![
                add("teamA/carol", READ),
                add("teamA/carol", LIST),
                remove("teamA/carol", FULL_ACCESS_POLICY),
                remove("teamA/carol", OBJECT_WRITE_POLICY),
            ]
        );
        assert_eq!(
            outcome.recovery.last(),
            Some(&RecoveryCommand::undo_detach("teamA/carol", OBJECT_WRITE_POLICY))
        );
        // policy set is read once per user
        let reads = array
            .calls()
            .into_iter()
            .filter(|c| matches!(c, ArrayCall::ListUserPolicies { .. }))
            .count();
        assert_eq!(reads, 1);
    }

    #[tokio::test]
    async fn test_recovery_order_spans_users() {
        let array = array()
            .with_user("teamA/alice", &[FULL_ACCESS_POLICY, READ, LIST])
            .with_user("teamA/bob", &[OBJECT_WRITE_POLICY])
            .with_user("teamB/eve", &[FULL_ACCESS_POLICY]);

        let outcome = enforce(&array, "teamA").await.unwrap();

        let rendered: Vec<String> = outcome.recovery.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "purepolicy obj access add --user teamA/alice pure:policy/full-access",
                "purepolicy obj access add --user teamA/bob pure:policy/object-write",
            ]
        );
        assert_eq!(outcome.downgrades[0].to_string(), "Downgrading user teamA/alice from full-access policy. Adding: ");
        assert_eq!(array.user_policies("teamB/eve"), vec![FULL_ACCESS_POLICY]);
    }

    #[tokio::test]
    async fn test_no_users_records_nothing() {
        let array = array().with_user("teamB/eve", &[FULL_ACCESS_POLICY]);

        let outcome = enforce(&array, "teamA").await.unwrap();

        assert!(array.mutations().is_empty());
        assert!(outcome.recovery.is_empty());
        assert!(outcome.lines().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_partial_recovery() {
        let array = array()
            .with_user("teamA/alice", &[FULL_ACCESS_POLICY])
            .fail_on(remove("teamA/alice", FULL_ACCESS_POLICY));

        let err = enforce(&array, "teamA").await.unwrap_err();

        assert_eq!(
            err.outcome.recovery,
            vec![
                RecoveryCommand::undo_attach("teamA/alice", READ),
                RecoveryCommand::undo_attach("teamA/alice", LIST),
            ]
        );
        assert_eq!(
            err.outcome.recovery_lines()[0],
            "To recover policies back to original state, issue the following CLI commands:"
        );
        assert!(matches!(err.source, ArrayError::HttpStatus(..)));
    }

    #[tokio::test]
    async fn test_downgrade_announced_before_mutations() {
        let array = array()
            .with_user("teamA/alice", &[FULL_ACCESS_POLICY])
            .fail_on(add("teamA/alice", READ));

        let mut seen = Vec::new();
        let err = enforce_with(&array, "teamA", |d| {
            seen.push((d.to_string(), array.mutations().len()))
        })
        .await
        .unwrap_err();

        // announced with nothing applied yet, and kept although the attach failed
        assert_eq!(
            seen,
            vec![(
                "Downgrading user teamA/alice from full-access policy. Adding: pure:policy/object-read,pure:policy/bucket-list".to_string(),
                0
            )]
        );
        assert_eq!(err.outcome.downgrades.len(), 1);
        assert!(err.outcome.recovery.is_empty());
    }
}
