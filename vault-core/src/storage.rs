//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `vaults` - Vault records (key: vault_id)
//! - `accounts` - Account balances (key: account_id)
//! - `transactions` - Transaction ledger (key: transaction_id)
//! - `approvers` - Approver standing (key: vault_id || actor)
//! - `votes` - Append-only vote log (key: transaction_id || actor)
//! - `history` - Append-only balance snapshots (key: account_id || ts || seq)
//! - `indices` - Per-account time-ordered transaction index
//!
//! A balance mutation and its history snapshot always land in the same
//! `WriteBatch`: a reader never sees one without the other.

use crate::{
    error::{Error, Result},
    types::{
        Account, AccountId, ActorId, ApprovalVote, Approver, BalanceSnapshot, Transaction, Vault,
        VaultId,
    },
    Config,
};
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_VAULTS: &str = "vaults";
const CF_ACCOUNTS: &str = "accounts";
const CF_TRANSACTIONS: &str = "transactions";
const CF_APPROVERS: &str = "approvers";
const CF_VOTES: &str = "votes";
const CF_HISTORY: &str = "history";
const CF_INDICES: &str = "indices";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,

    /// Disambiguates history rows written within the same nanosecond
    history_seq: AtomicU64,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_VAULTS, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_ACCOUNTS, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_APPROVERS, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_VOTES, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_HISTORY, Self::cf_options_append_only()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self {
            db: Arc::new(db),
            history_seq: AtomicU64::new(0),
        })
    }

    // Column family options

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // Frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_append_only() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Vault operations

    /// Put vault
    pub fn put_vault(&self, vault: &Vault) -> Result<()> {
        let cf = self.cf_handle(CF_VAULTS)?;
        let value = bincode::serialize(vault)?;
        self.db.put_cf(cf, vault.vault_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Get vault by ID
    pub fn get_vault(&self, vault_id: &VaultId) -> Result<Vault> {
        let cf = self.cf_handle(CF_VAULTS)?;
        let value = self
            .db
            .get_cf(cf, vault_id.as_bytes())?
            .ok_or_else(|| Error::VaultNotFound(vault_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    // Account operations

    /// Put account (creation only; mutations go through the atomic writers)
    pub fn put_account(&self, account: &Account) -> Result<()> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = bincode::serialize(account)?;
        self.db.put_cf(cf, account.account_id.as_bytes(), &value)?;
        Ok(())
    }

    /// Get account by ID
    pub fn get_account(&self, account_id: &AccountId) -> Result<Account> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let value = self
            .db
            .get_cf(cf, account_id.as_bytes())?
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    // Approver operations

    /// Grant approver standing on a vault
    pub fn put_approver(&self, approver: &Approver) -> Result<()> {
        let cf = self.cf_handle(CF_APPROVERS)?;
        let key = Self::approver_key(&approver.vault_id, &approver.actor);
        let value = bincode::serialize(approver)?;
        self.db.put_cf(cf, &key, &value)?;
        Ok(())
    }

    /// Check approver standing
    pub fn is_approver(&self, vault_id: &VaultId, actor: &ActorId) -> Result<bool> {
        let cf = self.cf_handle(CF_APPROVERS)?;
        let key = Self::approver_key(vault_id, actor);
        Ok(self.db.get_cf(cf, &key)?.is_some())
    }

    /// All approvers for a vault
    pub fn approvers(&self, vault_id: &VaultId) -> Result<Vec<Approver>> {
        let cf = self.cf_handle(CF_APPROVERS)?;
        let prefix = vault_id.as_bytes();

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut approvers = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            approvers.push(bincode::deserialize(&value)?);
        }

        Ok(approvers)
    }

    // Transaction operations

    /// Get transaction by ID
    pub fn get_transaction(&self, transaction_id: Uuid) -> Result<Transaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let value = self
            .db
            .get_cf(cf, transaction_id.as_bytes())?
            .ok_or_else(|| Error::TransactionNotFound(transaction_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Create transaction with index entries and optional source-account
    /// mutation, atomically
    pub fn create_transaction_atomic(
        &self,
        transaction: &Transaction,
        account: Option<(&Account, &BalanceSnapshot)>,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, transaction)?;
        self.stage_indices(&mut batch, transaction)?;
        if let Some((account, snapshot)) = account {
            self.stage_account(&mut batch, account, snapshot)?;
        }
        self.db.write(batch)?;

        tracing::debug!(
            transaction_id = %transaction.transaction_id,
            status = ?transaction.status,
            "Transaction recorded"
        );

        Ok(())
    }

    /// Update a transaction together with account mutations and an optional
    /// vote row, atomically
    pub fn update_transaction_atomic(
        &self,
        transaction: &Transaction,
        accounts: &[(&Account, &BalanceSnapshot)],
        vote: Option<&ApprovalVote>,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_transaction(&mut batch, transaction)?;
        for (account, snapshot) in accounts {
            self.stage_account(&mut batch, account, snapshot)?;
        }
        if let Some(vote) = vote {
            let cf = self.cf_handle(CF_VOTES)?;
            let key = Self::vote_key(vote.transaction_id, &vote.approver);
            batch.put_cf(cf, &key, bincode::serialize(vote)?);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Mutate an account and append its snapshot, atomically
    pub fn put_account_with_snapshot(
        &self,
        account: &Account,
        snapshot: &BalanceSnapshot,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_account(&mut batch, account, snapshot)?;
        self.db.write(batch)?;
        Ok(())
    }

    // Vote operations

    /// Check whether an approver already voted on a transaction
    pub fn has_voted(&self, transaction_id: Uuid, actor: &ActorId) -> Result<bool> {
        let cf = self.cf_handle(CF_VOTES)?;
        let key = Self::vote_key(transaction_id, actor);
        Ok(self.db.get_cf(cf, &key)?.is_some())
    }

    /// Full vote log for a transaction
    pub fn votes(&self, transaction_id: Uuid) -> Result<Vec<ApprovalVote>> {
        let cf = self.cf_handle(CF_VOTES)?;
        let prefix = transaction_id.as_bytes();

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut votes = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            votes.push(bincode::deserialize(&value)?);
        }

        Ok(votes)
    }

    // History operations

    /// Ordered balance snapshots for an account; `None` bounds are unbounded
    pub fn history(
        &self,
        account_id: &AccountId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<BalanceSnapshot>> {
        let cf = self.cf_handle(CF_HISTORY)?;

        let from_nanos = from.map(Self::ts_nanos).unwrap_or(0);
        let to_nanos = to.map(Self::ts_nanos).unwrap_or(i64::MAX);

        let mut start = account_id.as_bytes().to_vec();
        start.extend_from_slice(&from_nanos.to_be_bytes());

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&start, Direction::Forward));

        let prefix = account_id.as_bytes();
        let mut snapshots = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            let ts = Self::key_ts_nanos(&key)?;
            if ts > to_nanos {
                break;
            }
            snapshots.push(bincode::deserialize(&value)?);
        }

        Ok(snapshots)
    }

    /// Transactions touching an account, ordered by creation time
    pub fn account_transactions(
        &self,
        account_id: &AccountId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<Transaction>> {
        let cf = self.cf_handle(CF_INDICES)?;

        let from_nanos = from.map(Self::ts_nanos).unwrap_or(0);
        let to_nanos = to.map(Self::ts_nanos).unwrap_or(i64::MAX);

        let mut start = account_id.as_bytes().to_vec();
        start.extend_from_slice(&from_nanos.to_be_bytes());

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&start, Direction::Forward));

        let prefix = account_id.as_bytes();
        let mut transactions = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            let ts = Self::key_ts_nanos(&key)?;
            if ts > to_nanos {
                break;
            }
            if key.len() >= 40 {
                let id_bytes: [u8; 16] = key[24..40]
                    .try_into()
                    .map_err(|_| Error::Storage("corrupt index key".to_string()))?;
                transactions.push(self.get_transaction(Uuid::from_bytes(id_bytes))?);
            }
        }

        Ok(transactions)
    }

    // Batch staging helpers

    fn stage_transaction(&self, batch: &mut WriteBatch, transaction: &Transaction) -> Result<()> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let value = bincode::serialize(transaction)?;
        batch.put_cf(cf, transaction.transaction_id.as_bytes(), &value);
        Ok(())
    }

    fn stage_account(
        &self,
        batch: &mut WriteBatch,
        account: &Account,
        snapshot: &BalanceSnapshot,
    ) -> Result<()> {
        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        batch.put_cf(cf_accounts, account.account_id.as_bytes(), bincode::serialize(account)?);

        let cf_history = self.cf_handle(CF_HISTORY)?;
        let key = self.history_key(&snapshot.account_id, snapshot.recorded_at);
        batch.put_cf(cf_history, &key, bincode::serialize(snapshot)?);
        Ok(())
    }

    fn stage_indices(&self, batch: &mut WriteBatch, transaction: &Transaction) -> Result<()> {
        let cf = self.cf_handle(CF_INDICES)?;
        for account_id in transaction.account_ids() {
            let key = Self::index_key(&account_id, transaction.created_at, transaction.transaction_id);
            batch.put_cf(cf, &key, &[]);
        }
        Ok(())
    }

    // Key helpers

    fn approver_key(vault_id: &VaultId, actor: &ActorId) -> Vec<u8> {
        let mut key = vault_id.as_bytes().to_vec();
        key.extend_from_slice(actor.as_str().as_bytes());
        key
    }

    fn vote_key(transaction_id: Uuid, actor: &ActorId) -> Vec<u8> {
        let mut key = transaction_id.as_bytes().to_vec();
        key.extend_from_slice(actor.as_str().as_bytes());
        key
    }

    fn history_key(&self, account_id: &AccountId, recorded_at: DateTime<Utc>) -> Vec<u8> {
        let seq = self.history_seq.fetch_add(1, Ordering::Relaxed);
        let mut key = account_id.as_bytes().to_vec();
        key.extend_from_slice(&Self::ts_nanos(recorded_at).to_be_bytes());
        key.extend_from_slice(&seq.to_be_bytes());
        key
    }

    fn index_key(account_id: &AccountId, created_at: DateTime<Utc>, transaction_id: Uuid) -> Vec<u8> {
        let mut key = account_id.as_bytes().to_vec();
        key.extend_from_slice(&Self::ts_nanos(created_at).to_be_bytes());
        key.extend_from_slice(transaction_id.as_bytes());
        key
    }

    fn ts_nanos(ts: DateTime<Utc>) -> i64 {
        ts.timestamp_nanos_opt().unwrap_or(0)
    }

    fn key_ts_nanos(key: &[u8]) -> Result<i64> {
        if key.len() < 24 {
            return Err(Error::Storage("corrupt time-ordered key".to_string()));
        }
        let ts_bytes: [u8; 8] = key[16..24]
            .try_into()
            .map_err(|_| Error::Storage("corrupt time-ordered key".to_string()))?;
        Ok(i64::from_be_bytes(ts_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, Party, TransactionStatus};
    use approval_engine::ApprovalStatus;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn test_account() -> Account {
        Account {
            account_id: AccountId::generate(),
            vault_id: VaultId::generate(),
            currency: Currency::USD,
            balance: Decimal::from(1000),
            reserved: Decimal::ZERO,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_transaction(source: AccountId, destination: AccountId) -> Transaction {
        Transaction {
            transaction_id: Uuid::new_v4(),
            source: Party::Account(source),
            destination: Party::Account(destination),
            amount: Decimal::from(100),
            currency: Currency::USD,
            initiated_by: ActorId::new("trader-1"),
            status: TransactionStatus::Pending,
            approvals_required: 0,
            approvals_current: 0,
            approval_status: ApprovalStatus::NotRequired,
            external_ref: None,
            reason: None,
            destination_credited: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_account_roundtrip() {
        let (storage, _tmp) = test_storage();
        let account = test_account();

        storage.put_account(&account).unwrap();
        let loaded = storage.get_account(&account.account_id).unwrap();
        assert_eq!(loaded.balance, account.balance);
        assert_eq!(loaded.currency, account.currency);
    }

    #[test]
    fn test_missing_account() {
        let (storage, _tmp) = test_storage();
        let err = storage.get_account(&AccountId::generate()).unwrap_err();
        assert!(matches!(err, Error::AccountNotFound(_)));
    }

    #[test]
    fn test_account_mutation_and_snapshot_atomic() {
        let (storage, _tmp) = test_storage();
        let mut account = test_account();
        storage.put_account(&account).unwrap();

        account.reserved = Decimal::from(300);
        let snapshot = BalanceSnapshot::of(&account);
        storage.put_account_with_snapshot(&account, &snapshot).unwrap();

        let loaded = storage.get_account(&account.account_id).unwrap();
        assert_eq!(loaded.reserved, Decimal::from(300));

        let history = storage.history(&account.account_id, None, None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].available, Decimal::from(700));
    }

    #[test]
    fn test_history_range_query_ordered() {
        let (storage, _tmp) = test_storage();
        let mut account = test_account();
        storage.put_account(&account).unwrap();

        let base = Utc::now();
        for i in 1..=3 {
            account.balance = Decimal::from(1000 + i);
            let mut snapshot = BalanceSnapshot::of(&account);
            snapshot.recorded_at = base + Duration::seconds(i);
            storage.put_account_with_snapshot(&account, &snapshot).unwrap();
        }

        let all = storage.history(&account.account_id, None, None).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].recorded_at <= w[1].recorded_at));

        // Bounded range excludes the last row
        let bounded = storage
            .history(&account.account_id, None, Some(base + Duration::seconds(2)))
            .unwrap();
        assert_eq!(bounded.len(), 2);
    }

    #[test]
    fn test_transaction_index_both_accounts() {
        let (storage, _tmp) = test_storage();
        let source = test_account();
        let destination = test_account();
        storage.put_account(&source).unwrap();
        storage.put_account(&destination).unwrap();

        let txn = test_transaction(source.account_id, destination.account_id);
        storage.create_transaction_atomic(&txn, None).unwrap();

        let from_source = storage
            .account_transactions(&source.account_id, None, None)
            .unwrap();
        let from_destination = storage
            .account_transactions(&destination.account_id, None, None)
            .unwrap();
        assert_eq!(from_source.len(), 1);
        assert_eq!(from_destination.len(), 1);
        assert_eq!(from_source[0].transaction_id, txn.transaction_id);
    }

    #[test]
    fn test_vote_log_append_and_lookup() {
        let (storage, _tmp) = test_storage();
        let txn = test_transaction(AccountId::generate(), AccountId::generate());
        storage.create_transaction_atomic(&txn, None).unwrap();

        let actor = ActorId::new("approver-1");
        assert!(!storage.has_voted(txn.transaction_id, &actor).unwrap());

        let vote = ApprovalVote {
            vote_id: Uuid::new_v4(),
            transaction_id: txn.transaction_id,
            vault_id: VaultId::generate(),
            approver: actor.clone(),
            decision: approval_engine::VoteDecision::Approve,
            voted_at: Utc::now(),
        };
        storage
            .update_transaction_atomic(&txn, &[], Some(&vote))
            .unwrap();

        assert!(storage.has_voted(txn.transaction_id, &actor).unwrap());
        assert_eq!(storage.votes(txn.transaction_id).unwrap().len(), 1);
    }

    #[test]
    fn test_approver_standing() {
        let (storage, _tmp) = test_storage();
        let vault_id = VaultId::generate();
        let actor = ActorId::new("approver-1");

        assert!(!storage.is_approver(&vault_id, &actor).unwrap());

        storage
            .put_approver(&Approver {
                vault_id,
                actor: actor.clone(),
                added_at: Utc::now(),
            })
            .unwrap();

        assert!(storage.is_approver(&vault_id, &actor).unwrap());
        assert_eq!(storage.approvers(&vault_id).unwrap().len(), 1);
    }
}
