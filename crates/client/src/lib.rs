//! Operation orchestrator for confidential-asset accounts: balance state
//! tracking, RPC collaborator traits, and the seven entrypoints
//! (`spec.md` §4.8) that fetch on-chain state, build the relevant Sigma
//! proof locally, and submit the resulting Move entry call.

mod balance;
mod chunking;
mod config;
mod error;
mod orchestrator;
mod rpc;

pub use balance::{BalanceRecord, BalanceState, Operation};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ClientError, RpcError};
pub use orchestrator::Orchestrator;
pub use rpc::{AccountId, AccountRpc, Receipt, Submitter, TokenAddress};
