//! Authorization guard over the ledger write surface

use crate::error::{AuthzError, Result};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use vault_core::{
    Account, ActorId, ApprovalPolicy, Approver, Currency, Ledger, Transaction, TransferRequest,
    Vault, VaultId, VaultStatus, VoteDecision,
};

/// Ledger front that checks actor permissions before delegating
///
/// Rules:
/// - Vault management (status, policy, approvers, accounts) is owner-only
/// - Transfers may be initiated by the vault owner or a registered approver,
///   and only under the actor's own identity
/// - Cancellation is allowed to the initiator and the vault owner
/// - Votes pass through; the ledger enforces approver standing itself
pub struct AuthorizedLedger {
    ledger: Arc<Ledger>,
}

impl std::fmt::Debug for AuthorizedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedLedger").finish_non_exhaustive()
    }
}

impl AuthorizedLedger {
    /// Wrap a ledger
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// The wrapped ledger, for read-only access
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    fn require_owner(&self, vault_id: &VaultId, actor: &ActorId) -> Result<Vault> {
        let vault = self.ledger.vault(vault_id)?;
        if vault.owner != *actor {
            tracing::warn!(vault_id = %vault_id, actor = %actor, "Vault management denied");
            return Err(AuthzError::Denied(format!(
                "{} does not own vault {}",
                actor, vault_id
            )));
        }
        Ok(vault)
    }

    fn is_approver(&self, vault_id: &VaultId, actor: &ActorId) -> Result<bool> {
        let approvers = self.ledger.approvers(vault_id)?;
        Ok(approvers.iter().any(|a: &Approver| a.actor == *actor))
    }

    /// Change a vault's status (owner only)
    pub async fn set_vault_status(
        &self,
        actor: &ActorId,
        vault_id: VaultId,
        status: VaultStatus,
    ) -> Result<Vault> {
        self.require_owner(&vault_id, actor)?;
        Ok(self.ledger.set_vault_status(vault_id, status).await?)
    }

    /// Replace a vault's approval policy (owner only)
    pub async fn update_policy(
        &self,
        actor: &ActorId,
        vault_id: VaultId,
        policy: ApprovalPolicy,
    ) -> Result<Vault> {
        self.require_owner(&vault_id, actor)?;
        Ok(self.ledger.update_policy(vault_id, policy).await?)
    }

    /// Grant approver standing (owner only)
    pub async fn add_approver(
        &self,
        actor: &ActorId,
        vault_id: VaultId,
        approver: ActorId,
    ) -> Result<Approver> {
        self.require_owner(&vault_id, actor)?;
        Ok(self.ledger.add_approver(vault_id, approver).await?)
    }

    /// Create an account (owner only)
    pub async fn create_account(
        &self,
        actor: &ActorId,
        vault_id: VaultId,
        currency: Currency,
        initial_balance: Decimal,
    ) -> Result<Account> {
        self.require_owner(&vault_id, actor)?;
        Ok(self
            .ledger
            .create_account(vault_id, currency, initial_balance)
            .await?)
    }

    /// Create a transfer under the actor's own identity
    pub async fn create_transaction(
        &self,
        actor: &ActorId,
        request: TransferRequest,
    ) -> Result<Transaction> {
        if request.initiated_by != *actor {
            return Err(AuthzError::Denied(format!(
                "{} may not initiate transfers as {}",
                actor, request.initiated_by
            )));
        }

        let source = self.ledger.account(&request.source)?;
        let vault = self.ledger.vault(&source.vault_id)?;
        if vault.owner != *actor && !self.is_approver(&vault.vault_id, actor)? {
            tracing::warn!(vault_id = %vault.vault_id, actor = %actor, "Transfer initiation denied");
            return Err(AuthzError::Denied(format!(
                "{} has no standing on vault {}",
                actor, vault.vault_id
            )));
        }

        Ok(self.ledger.create_transaction(request).await?)
    }

    /// Cast an approval vote; standing is enforced by the ledger
    pub async fn cast_vote(
        &self,
        actor: &ActorId,
        transaction_id: Uuid,
        decision: VoteDecision,
    ) -> Result<Transaction> {
        Ok(self
            .ledger
            .cast_vote(transaction_id, actor.clone(), decision)
            .await?)
    }

    /// Cancel a pending transaction (initiator or vault owner)
    pub async fn cancel(&self, actor: &ActorId, transaction_id: Uuid) -> Result<Transaction> {
        let transaction = self.ledger.transaction(transaction_id)?;

        let allowed = transaction.initiated_by == *actor
            || match transaction.source.account_id() {
                Some(source_id) => {
                    let account = self.ledger.account(source_id)?;
                    self.ledger.vault(&account.vault_id)?.owner == *actor
                }
                None => false,
            };

        if !allowed {
            return Err(AuthzError::Denied(format!(
                "{} may not cancel transaction {}",
                actor, transaction_id
            )));
        }

        Ok(self.ledger.cancel(transaction_id, actor.clone()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vault_core::{Config, Party};

    async fn setup() -> (AuthorizedLedger, VaultId, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        let ledger = Arc::new(Ledger::open(config).await.unwrap());

        let vault = ledger
            .create_vault(ActorId::new("owner-1"), "treasury", ApprovalPolicy::default())
            .await
            .unwrap();

        (AuthorizedLedger::new(ledger), vault.vault_id, temp_dir)
    }

    #[tokio::test]
    async fn test_only_owner_manages_vault() {
        let (authz, vault_id, _tmp) = setup().await;

        let err = authz
            .set_vault_status(&ActorId::new("mallory"), vault_id, VaultStatus::Paused)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Denied(_)));

        let vault = authz
            .set_vault_status(&ActorId::new("owner-1"), vault_id, VaultStatus::Paused)
            .await
            .unwrap();
        assert_eq!(vault.status, VaultStatus::Paused);
    }

    #[tokio::test]
    async fn test_transfer_requires_standing_and_own_identity() {
        let (authz, vault_id, _tmp) = setup().await;
        let owner = ActorId::new("owner-1");

        let account = authz
            .create_account(&owner, vault_id, Currency::USD, Decimal::from(100))
            .await
            .unwrap();

        let request = |initiated_by: &str| TransferRequest {
            source: account.account_id,
            destination: Party::External("x".to_string()),
            amount: Decimal::from(10),
            initiated_by: ActorId::new(initiated_by),
        };

        // Identity mismatch
        let err = authz
            .create_transaction(&owner, request("somebody-else"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Denied(_)));

        // No standing on the vault
        let err = authz
            .create_transaction(&ActorId::new("mallory"), request("mallory"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Denied(_)));

        // Owner initiates fine
        authz.create_transaction(&owner, request("owner-1")).await.unwrap();

        // A registered approver may initiate too
        authz
            .add_approver(&owner, vault_id, ActorId::new("alice"))
            .await
            .unwrap();
        authz
            .create_transaction(&ActorId::new("alice"), request("alice"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_initiator_or_owner() {
        let (authz, vault_id, _tmp) = setup().await;
        let owner = ActorId::new("owner-1");

        // Pending requires an approval policy
        authz
            .update_policy(&owner, vault_id, ApprovalPolicy::quorum_of(2))
            .await
            .unwrap();
        authz
            .add_approver(&owner, vault_id, ActorId::new("alice"))
            .await
            .unwrap();
        let account = authz
            .create_account(&owner, vault_id, Currency::USD, Decimal::from(100))
            .await
            .unwrap();

        let txn = authz
            .create_transaction(
                &ActorId::new("alice"),
                TransferRequest {
                    source: account.account_id,
                    destination: Party::External("x".to_string()),
                    amount: Decimal::from(10),
                    initiated_by: ActorId::new("alice"),
                },
            )
            .await
            .unwrap();

        let err = authz
            .cancel(&ActorId::new("mallory"), txn.transaction_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthzError::Denied(_)));

        // Vault owner may cancel what an approver initiated
        let cancelled = authz.cancel(&owner, txn.transaction_id).await.unwrap();
        assert!(cancelled.reason.unwrap().contains("owner-1"));
    }
}
