use confidential_ciphertext::ChunkedCiphertext;
use confidential_core::Point;

use crate::error::ClientError;

/// On-chain account balance record for one `(account, token)` pair
/// (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceRecord {
    pub encryption_key: Point,
    pub pending: ChunkedCiphertext,
    pub available: ChunkedCiphertext,
    pub is_frozen: bool,
    pub is_normalized: bool,
    /// Whether `rollover` has ever executed for this pair. A freshly
    /// registered account's `available` ciphertext is an all-zero encryption
    /// indistinguishable on the wire from a post-rollover zero balance, so
    /// this has to be tracked explicitly rather than read off the
    /// ciphertext — it is what lets `classify` tell `RegisteredZero` apart
    /// from `NormalizedIdle`.
    pub has_rolled_over: bool,
}

/// The client's mirror of the on-chain balance state machine (`spec.md`
/// §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceState {
    Unregistered,
    RegisteredZero,
    NormalizedIdle,
    Unnormalized,
    Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Register,
    Deposit,
    IncomingTransfer,
    Rollover,
    Normalize,
    Withdraw,
    Transfer,
    Rotate,
}

impl BalanceState {
    pub fn classify(record: Option<&BalanceRecord>) -> Self {
        match record {
            None => BalanceState::Unregistered,
            Some(r) if r.is_frozen => BalanceState::Frozen,
            Some(r) if !r.is_normalized => BalanceState::Unnormalized,
            Some(r) if !r.has_rolled_over => BalanceState::RegisteredZero,
            Some(_) => BalanceState::NormalizedIdle,
        }
    }

    fn allowed_ops(self) -> &'static [Operation] {
        use Operation::*;
        match self {
            BalanceState::Unregistered => &[Register],
            BalanceState::RegisteredZero => &[Deposit, IncomingTransfer, Rollover],
            BalanceState::NormalizedIdle => {
                &[Deposit, IncomingTransfer, Rollover, Normalize, Withdraw, Transfer, Rotate]
            }
            BalanceState::Unnormalized => &[Normalize],
            BalanceState::Frozen => &[],
        }
    }

    /// Checks `op` is legal from this state, per `spec.md` §4.6's table.
    pub fn try_transition(self, op: Operation) -> Result<(), ClientError> {
        if self.allowed_ops().contains(&op) {
            return Ok(());
        }
        match self {
            BalanceState::Frozen => Err(ClientError::FrozenAccount),
            BalanceState::Unnormalized => Err(ClientError::Unnormalized),
            BalanceState::Unregistered => Err(ClientError::StaleState),
            BalanceState::RegisteredZero | BalanceState::NormalizedIdle => Err(ClientError::StaleState),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_only_allows_register() {
        let state = BalanceState::classify(None);
        assert_eq!(state, BalanceState::Unregistered);
        assert!(state.try_transition(Operation::Register).is_ok());
        assert!(matches!(state.try_transition(Operation::Deposit), Err(ClientError::StaleState)));
    }

    #[test]
    fn frozen_rejects_everything() {
        let record = BalanceRecord {
            encryption_key: Point::basepoint(),
            pending: ChunkedCiphertext::zero(),
            available: ChunkedCiphertext::zero(),
            is_frozen: true,
            is_normalized: true,
            has_rolled_over: true,
        };
        let state = BalanceState::classify(Some(&record));
        assert_eq!(state, BalanceState::Frozen);
        assert!(matches!(state.try_transition(Operation::Withdraw), Err(ClientError::FrozenAccount)));
    }

    #[test]
    fn unnormalized_only_allows_normalize() {
        let record = BalanceRecord {
            encryption_key: Point::basepoint(),
            pending: ChunkedCiphertext::zero(),
            available: ChunkedCiphertext::zero(),
            is_frozen: false,
            is_normalized: false,
            has_rolled_over: true,
        };
        let state = BalanceState::classify(Some(&record));
        assert_eq!(state, BalanceState::Unnormalized);
        assert!(state.try_transition(Operation::Normalize).is_ok());
        assert!(matches!(state.try_transition(Operation::Withdraw), Err(ClientError::Unnormalized)));
    }

    #[test]
    fn normalized_idle_allows_spendable_ops() {
        let record = BalanceRecord {
            encryption_key: Point::basepoint(),
            pending: ChunkedCiphertext::zero(),
            available: ChunkedCiphertext::zero(),
            is_frozen: false,
            is_normalized: true,
            has_rolled_over: true,
        };
        let state = BalanceState::classify(Some(&record));
        assert_eq!(state, BalanceState::NormalizedIdle);
        for op in [Operation::Withdraw, Operation::Transfer, Operation::Rotate] {
            assert!(state.try_transition(op).is_ok());
        }
    }

    #[test]
    fn registered_zero_only_allows_deposit_and_incoming_transfer() {
        let record = BalanceRecord {
            encryption_key: Point::basepoint(),
            pending: ChunkedCiphertext::zero(),
            available: ChunkedCiphertext::zero(),
            is_frozen: false,
            is_normalized: true,
            has_rolled_over: false,
        };
        let state = BalanceState::classify(Some(&record));
        assert_eq!(state, BalanceState::RegisteredZero);
        assert!(state.try_transition(Operation::Deposit).is_ok());
        assert!(state.try_transition(Operation::IncomingTransfer).is_ok());
        assert!(state.try_transition(Operation::Rollover).is_ok());
        for op in [Operation::Withdraw, Operation::Transfer, Operation::Rotate, Operation::Normalize] {
            assert!(matches!(state.try_transition(op), Err(ClientError::StaleState)));
        }
    }
}
