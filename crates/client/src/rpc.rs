use confidential_codec::MoveCallArgs;
use confidential_core::Point;

use crate::balance::BalanceRecord;
use crate::error::RpcError;

pub type AccountId = [u8; 32];
pub type TokenAddress = [u8; 32];

/// Result of a successfully submitted transaction (`spec.md` §6.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: [u8; 32],
    pub sequence_number: u64,
}

/// Read-only chain state access, implemented against whatever indexer or
/// full-node RPC the embedding application uses.
#[async_trait::async_trait]
pub trait AccountRpc: Send + Sync {
    async fn get_balance_record(
        &self,
        account: AccountId,
        token: TokenAddress,
    ) -> Result<Option<BalanceRecord>, RpcError>;

    async fn get_encryption_key(
        &self,
        account: AccountId,
        token: TokenAddress,
    ) -> Result<Option<Point>, RpcError>;

    async fn get_asset_auditor_encryption_key(
        &self,
        token: TokenAddress,
    ) -> Result<Option<Point>, RpcError>;
}

/// Signs and submits a packed entry-function call on behalf of `account`.
/// `account` is metadata about the transaction (who signs it), not one of
/// the Move entry function's declared arguments — it never appears inside
/// `call.args`. Implementations own sequence-number assignment and wallet
/// signing; `SequenceConflict` signals a concurrent submission raced this
/// one for the same `(account, token)` pair.
#[async_trait::async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(&self, account: AccountId, call: MoveCallArgs) -> Result<Receipt, RpcError>;
}
