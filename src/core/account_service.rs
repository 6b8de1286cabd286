//! Account lifecycle: opening, closing, and listing
//!
//! Opening draws a fresh account number and enforces the per-user limit.
//! Closing reads and writes the balance, so it runs under the account's lock
//! like uses and cancels do; a close can never interleave with a debit or
//! credit on the same account.

use std::sync::Arc;

use tracing::info;

use crate::config::AccountConfig;
use crate::core::id_generator::next_account_number;
use crate::core::traits::BalanceLedger;
use crate::core::KeyedLockManager;
use crate::types::{Account, AccountError, AccountUser, Amount, CloseAccount, LockKey, UserId};

/// Opens, closes, and lists accounts
#[derive(Debug, Clone)]
pub struct AccountService {
    ledger: Arc<dyn BalanceLedger>,
    locks: KeyedLockManager,
    config: AccountConfig,
}

impl AccountService {
    pub fn new(ledger: Arc<dyn BalanceLedger>, locks: KeyedLockManager, config: AccountConfig) -> Self {
        Self {
            ledger,
            locks,
            config,
        }
    }

    /// Open a new account for `user_id` with `initial_balance`
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The new open account
    /// * `Err(AccountError::UserNotFound)` - If the user does not exist
    /// * `Err(AccountError::ReachedAccountPerUserLimit)` - If the user has too many open accounts
    /// * `Err(AccountError::InvalidRequest)` - If `initial_balance` is negative
    /// * `Err(AccountError::IdGenerationExhausted)` - If no free account number was found
    ///
    /// The limit check and the save are not atomic: concurrent opens for the
    /// same user can each pass the check and exceed the limit.
    pub fn open_account(
        &self,
        user_id: UserId,
        initial_balance: Amount,
    ) -> Result<Account, AccountError> {
        let user = self.find_user(user_id)?;

        let limit = self.config.account_limit_per_user;
        if self.ledger.count_open_accounts(user.id)? >= limit {
            return Err(AccountError::ReachedAccountPerUserLimit {
                user_id: user.id,
                limit,
            });
        }
        if initial_balance < 0 {
            return Err(AccountError::invalid_request(format!(
                "initial balance {} is negative",
                initial_balance
            )));
        }

        let account_number =
            next_account_number(self.ledger.as_ref(), self.config.id_generation_attempts)?;
        let account = self.ledger.save_account(Account::open(
            self.ledger.next_account_id(),
            user.id,
            account_number,
            initial_balance,
        ))?;

        info!(
            user = user.id,
            account = %account.account_number,
            balance = account.balance,
            "Account opened"
        );
        Ok(account)
    }

    /// Close an account whose balance is zero
    ///
    /// Runs under the account's lock.
    ///
    /// # Returns
    ///
    /// * `Ok(Account)` - The closed account
    /// * `Err(AccountError)` - `UserNotFound`, `AccountNotFound`,
    ///   `AccountUserMismatched`, `AccountClosed`, `BalanceNotZero`, or
    ///   `AccountTransactionLocked`
    pub async fn close_account(&self, request: &CloseAccount) -> Result<Account, AccountError> {
        self.locks
            .run_locked(request.lock_key(), || async { self.close_locked(request) })
            .await
    }

    fn close_locked(&self, request: &CloseAccount) -> Result<Account, AccountError> {
        let user = self.find_user(request.user_id)?;
        let mut account = self
            .ledger
            .find_account_by_number(&request.account_number)?
            .ok_or_else(|| AccountError::account_not_found(&request.account_number))?;

        if account.owner != user.id {
            return Err(AccountError::account_user_mismatched(
                &account.account_number,
                user.id,
            ));
        }
        if account.is_closed() {
            return Err(AccountError::account_closed(&account.account_number));
        }
        if account.balance != 0 {
            return Err(AccountError::balance_not_zero(
                &account.account_number,
                account.balance,
            ));
        }

        account.close();
        let account = self.ledger.save_account(account)?;
        info!(user = user.id, account = %account.account_number, "Account closed");
        Ok(account)
    }

    /// All accounts of a user, ordered by account number
    pub fn get_accounts_by_user(&self, user_id: UserId) -> Result<Vec<Account>, AccountError> {
        let user = self.find_user(user_id)?;
        self.ledger.find_accounts_by_user(user.id)
    }

    fn find_user(&self, user_id: UserId) -> Result<AccountUser, AccountError> {
        self.ledger
            .find_user_by_id(user_id)?
            .ok_or_else(|| AccountError::user_not_found(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LockConfig;
    use crate::core::testing::{seeded, OTHER_ACCOUNT, OWNER, STRANGER, USED_ACCOUNT};
    use crate::core::InMemoryLedger;
    use crate::types::{AccountStatus, ErrorCode};
    use rstest::rstest;
    use std::time::Duration;

    fn service(ledger: Arc<InMemoryLedger>, limit: usize) -> AccountService {
        AccountService::new(
            ledger,
            KeyedLockManager::new(LockConfig::default()),
            AccountConfig::new(limit, 10),
        )
    }

    #[test]
    fn test_open_account() {
        let (ledger, _) = seeded(0);
        let service = service(ledger.clone(), 10);

        let account = service.open_account(OWNER, 1000).unwrap();

        assert_eq!(account.owner, OWNER);
        assert_eq!(account.balance, 1000);
        assert_eq!(account.status, AccountStatus::Open);
        assert_eq!(account.account_number.len(), 10);
        assert_eq!(
            ledger
                .find_account_by_number(&account.account_number)
                .unwrap(),
            Some(account)
        );
    }

    #[rstest]
    #[case::user_not_found(999, 0, 10, ErrorCode::UserNotFound)]
    #[case::limit_reached(OWNER, 0, 1, ErrorCode::ReachedAccountPerUserLimit)]
    #[case::negative_balance(OWNER, -1, 10, ErrorCode::InvalidRequest)]
    fn test_open_account_rejections(
        #[case] user: UserId,
        #[case] balance: Amount,
        #[case] limit: usize,
        #[case] expected: ErrorCode,
    ) {
        let (ledger, _) = seeded(0);
        let service = service(ledger.clone(), limit);

        let err = service.open_account(user, balance).unwrap_err();

        assert_eq!(err.code(), expected);
        assert_eq!(ledger.all_accounts().unwrap().len(), 2);
    }

    #[test]
    fn test_closed_accounts_do_not_count_towards_limit() {
        let (ledger, _) = seeded(0);
        ledger.seed_account(OWNER, "3000000000", 0, AccountStatus::Closed);
        let service = service(ledger, 2);

        assert!(service.open_account(OWNER, 0).is_ok());
        assert_eq!(
            service.open_account(OWNER, 0).unwrap_err().code(),
            ErrorCode::ReachedAccountPerUserLimit
        );
    }

    #[tokio::test]
    async fn test_close_account() {
        let (ledger, _) = seeded(0);
        let service = service(ledger.clone(), 10);

        let closed = service
            .close_account(&CloseAccount::new(OWNER, USED_ACCOUNT))
            .await
            .unwrap();

        assert_eq!(closed.status, AccountStatus::Closed);
        assert!(closed.closed_at.is_some());
        assert!(ledger
            .find_account_by_number(USED_ACCOUNT)
            .unwrap()
            .unwrap()
            .is_closed());
    }

    #[rstest]
    #[case::user_not_found(999, USED_ACCOUNT, 0, ErrorCode::UserNotFound)]
    #[case::account_not_found(OWNER, "9999999999", 0, ErrorCode::AccountNotFound)]
    #[case::owner_mismatch(STRANGER, USED_ACCOUNT, 0, ErrorCode::AccountUserMismatched)]
    #[case::balance_not_zero(OWNER, USED_ACCOUNT, 10, ErrorCode::BalanceNotZero)]
    #[tokio::test]
    async fn test_close_account_rejections(
        #[case] user: UserId,
        #[case] account_number: &str,
        #[case] balance: Amount,
        #[case] expected: ErrorCode,
    ) {
        let (ledger, _) = seeded(balance);
        let service = service(ledger, 10);

        let err = service
            .close_account(&CloseAccount::new(user, account_number))
            .await
            .unwrap_err();
        assert_eq!(err.code(), expected);
    }

    #[tokio::test]
    async fn test_close_twice() {
        let (ledger, _) = seeded(0);
        let service = service(ledger, 10);
        let request = CloseAccount::new(OWNER, USED_ACCOUNT);

        service.close_account(&request).await.unwrap();
        let err = service.close_account(&request).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountClosed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_waits_for_account_lock() {
        let (ledger, _) = seeded(0);
        let locks = KeyedLockManager::new(LockConfig::new(
            Duration::from_millis(20),
            Duration::from_secs(15),
        ));
        let service = AccountService::new(ledger, locks.clone(), AccountConfig::default());

        let _held = locks.acquire(USED_ACCOUNT).await.unwrap();
        let err = service
            .close_account(&CloseAccount::new(OWNER, USED_ACCOUNT))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::AccountTransactionLocked);
    }

    #[test]
    fn test_get_accounts_by_user() {
        let (ledger, _) = seeded(0);
        let service = service(ledger, 10);

        let accounts = service.get_accounts_by_user(STRANGER).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_number, OTHER_ACCOUNT);

        assert_eq!(
            service.get_accounts_by_user(999).unwrap_err().code(),
            ErrorCode::UserNotFound
        );
    }
}
