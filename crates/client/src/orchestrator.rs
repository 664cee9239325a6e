use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use confidential_ciphertext::{DecryptionKey, EncryptionKey};
use confidential_codec::{pack_entry_args, WireEncode};
use rand::{CryptoRng, RngCore};
use tokio::sync::{Mutex, RwLock};

use crate::balance::{BalanceRecord, BalanceState, Operation};
use crate::chunking::fresh_chunks;
use crate::config::ClientConfig;
use crate::error::{ClientError, RpcError};
use crate::rpc::{AccountId, AccountRpc, Receipt, Submitter, TokenAddress};

const BACKOFF_MS: [u64; 3] = [100, 400, 1600];

fn is_retryable(err: &ClientError) -> bool {
    matches!(err, ClientError::RpcError(_) | ClientError::StaleState)
}

fn backoff(attempt: usize) -> Duration {
    Duration::from_millis(BACKOFF_MS[attempt.min(BACKOFF_MS.len() - 1)])
}

#[derive(Clone, Copy, Debug)]
struct CachedRecord {
    record: BalanceRecord,
    #[allow(dead_code)]
    fetched_at: Instant,
}

/// Ties an [`AccountRpc`]/[`Submitter`] pair to the balance state machine and
/// drives the seven confidential-asset operations (`spec.md` §4.8): fetch
/// current state, build the relevant Sigma proof locally, and submit.
///
/// Per-`(account, token)` operations are serialized through an internal
/// mutex map so two concurrent calls against the same pair queue rather than
/// race on the same ciphertext; calls against distinct pairs run fully in
/// parallel.
pub struct Orchestrator<R: AccountRpc, S: Submitter> {
    rpc: R,
    submitter: S,
    config: ClientConfig,
    locks: RwLock<HashMap<(AccountId, TokenAddress), Arc<Mutex<()>>>>,
    cache: RwLock<HashMap<(AccountId, TokenAddress), CachedRecord>>,
}

impl<R: AccountRpc, S: Submitter> Orchestrator<R, S> {
    pub fn new(rpc: R, submitter: S, config: ClientConfig) -> Self {
        Orchestrator {
            rpc,
            submitter,
            config,
            locks: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn lock_pair(&self, account: AccountId, token: TokenAddress) -> tokio::sync::OwnedMutexGuard<()> {
        let key = (account, token);
        if let Some(mutex) = self.locks.read().await.get(&key) {
            return mutex.clone().lock_owned().await;
        }
        let mutex = self.locks.write().await.entry(key).or_insert_with(|| Arc::new(Mutex::new(()))).clone();
        mutex.lock_owned().await
    }

    async fn refresh(&self, account: AccountId, token: TokenAddress) -> Result<Option<BalanceRecord>, ClientError> {
        let record = self.rpc.get_balance_record(account, token).await.map_err(ClientError::RpcError)?;
        let mut cache = self.cache.write().await;
        match record {
            Some(record) => {
                cache.insert((account, token), CachedRecord { record, fetched_at: Instant::now() });
            }
            None => {
                cache.remove(&(account, token));
            }
        }
        Ok(record)
    }

    /// The most recently fetched record for `(account, token)`, if any,
    /// without hitting the RPC. Useful for UI-layer polling that should not
    /// itself pay for a round trip on every redraw.
    pub async fn cached_record(&self, account: AccountId, token: TokenAddress) -> Option<BalanceRecord> {
        self.cache.read().await.get(&(account, token)).map(|c| c.record)
    }

    async fn submit(&self, account: AccountId, call: confidential_codec::MoveCallArgs) -> Result<Receipt, ClientError> {
        match self.submitter.submit(account, call).await {
            Ok(receipt) => Ok(receipt),
            Err(RpcError::SequenceConflict) => Err(ClientError::DuplicateSubmission),
            Err(err @ RpcError::Transport(_)) => Err(ClientError::RpcError(err)),
        }
    }

    fn account_key(record: &BalanceRecord) -> Result<EncryptionKey, ClientError> {
        Ok(EncryptionKey::from_bytes(&record.encryption_key.to_bytes())?)
    }

    /// Fetches the current record, transparently submitting a normalization
    /// transaction first if the balance is due for it (`spec.md` §8, S5):
    /// a spend operation that only ever saw `Unnormalized` would otherwise
    /// never make progress after a rollover pushes a chunk out of range.
    async fn ensure_normalized<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
        rng: &mut Rng,
    ) -> Result<BalanceRecord, ClientError> {
        let record = self.refresh(account, token).await?.ok_or(ClientError::StaleState)?;
        if BalanceState::classify(Some(&record)) != BalanceState::Unnormalized {
            return Ok(record);
        }
        self.normalize_once(account, token, decryption_key, rng).await?;
        self.refresh(account, token).await?.ok_or(ClientError::StaleState)
    }

    /// Decrypts the account's current spendable balance. Exposed directly
    /// since every spending operation needs the same local decryption to
    /// pre-check `InsufficientBalance` before building a proof.
    #[tracing::instrument(skip(self, decryption_key))]
    pub async fn decrypt_balance(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
    ) -> Result<u128, ClientError> {
        let record = self.refresh(account, token).await?.ok_or(ClientError::StaleState)?;
        Ok(record.available.decrypt(decryption_key)?)
    }

    #[tracing::instrument(skip(self, decryption_key))]
    pub async fn register(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
    ) -> Result<Receipt, ClientError> {
        let _guard = self.lock_pair(account, token).await;
        self.run_with_retry(|| self.register_once(account, token, decryption_key)).await
    }

    async fn register_once(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
    ) -> Result<Receipt, ClientError> {
        let existing = self.refresh(account, token).await?;
        BalanceState::classify(existing.as_ref()).try_transition(Operation::Register)?;
        let key = decryption_key.encryption_key();
        let call = pack_entry_args("register", vec![token.to_vec(), key.to_bytes().to_vec()]);
        self.submit(account, call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn deposit(&self, account: AccountId, token: TokenAddress, amount: u64) -> Result<Receipt, ClientError> {
        let _guard = self.lock_pair(account, token).await;
        self.run_with_retry(|| self.deposit_once(account, token, amount)).await
    }

    async fn deposit_once(&self, account: AccountId, token: TokenAddress, amount: u64) -> Result<Receipt, ClientError> {
        let record = self.refresh(account, token).await?;
        BalanceState::classify(record.as_ref()).try_transition(Operation::Deposit)?;
        let call = pack_entry_args("deposit", vec![token.to_vec(), amount.to_le_bytes().to_vec()]);
        self.submit(account, call).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn rollover(&self, account: AccountId, token: TokenAddress) -> Result<Receipt, ClientError> {
        let _guard = self.lock_pair(account, token).await;
        self.run_with_retry(|| self.rollover_once(account, token)).await
    }

    async fn rollover_once(&self, account: AccountId, token: TokenAddress) -> Result<Receipt, ClientError> {
        let record = self.refresh(account, token).await?;
        BalanceState::classify(record.as_ref()).try_transition(Operation::Rollover)?;
        let call = pack_entry_args("rollover", vec![token.to_vec()]);
        self.submit(account, call).await
    }

    #[tracing::instrument(skip(self, decryption_key, rng))]
    pub async fn normalize<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let _guard = self.lock_pair(account, token).await;
        self.run_with_retry(|| self.normalize_once(account, token, decryption_key, &mut *rng)).await
    }

    async fn normalize_once<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let record = self.refresh(account, token).await?.ok_or(ClientError::StaleState)?;
        BalanceState::classify(Some(&record)).try_transition(Operation::Normalize)?;
        let key = Self::account_key(&record)?;
        let amount = record.available.decrypt(decryption_key)?;
        let new_chunks = fresh_chunks(amount, rng);

        let (proof, new_ciphertext) = confidential_proofs::prove_normalization(
            &account,
            &token,
            &key,
            decryption_key,
            &record.available,
            &new_chunks,
            rng,
        )?;
        confidential_proofs::verify_normalization(&account, &token, &key, &record.available, &new_ciphertext, &proof)
            .map_err(|_| ClientError::ProofFailed)?;

        let mut new_ciphertext_bytes = Vec::new();
        new_ciphertext.encode(&mut new_ciphertext_bytes);
        let mut proof_bytes = Vec::new();
        proof.encode(&mut proof_bytes);

        let call = pack_entry_args("normalize", vec![token.to_vec(), new_ciphertext_bytes, proof_bytes]);
        self.submit(account, call).await
    }

    #[tracing::instrument(skip(self, decryption_key, rng))]
    pub async fn withdraw<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
        amount: u64,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let _guard = self.lock_pair(account, token).await;
        self.run_with_retry(|| self.withdraw_once(account, token, decryption_key, amount, &mut *rng)).await
    }

    async fn withdraw_once<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
        amount: u64,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let record = self.refresh(account, token).await?.ok_or(ClientError::StaleState)?;
        // Balance is checked against whatever `available` holds right now —
        // decryption does not require a normalized balance — so a doomed
        // withdrawal is rejected before any transaction (including a
        // normalization one) is submitted.
        let balance = record.available.decrypt(decryption_key)?;
        if balance < amount as u128 {
            return Err(ClientError::InsufficientBalance);
        }

        let record = self.ensure_normalized(account, token, decryption_key, rng).await?;
        BalanceState::classify(Some(&record)).try_transition(Operation::Withdraw)?;
        let key = Self::account_key(&record)?;
        let new_chunks = fresh_chunks(balance - amount as u128, rng);

        let (proof, new_ciphertext) = confidential_proofs::prove_withdrawal(
            &account,
            &token,
            &key,
            decryption_key,
            &record.available,
            amount,
            &new_chunks,
            rng,
        )?;
        confidential_proofs::verify_withdrawal(&account, &token, &key, &record.available, amount, &new_ciphertext, &proof)
            .map_err(|_| ClientError::ProofFailed)?;

        let mut new_ciphertext_bytes = Vec::new();
        new_ciphertext.encode(&mut new_ciphertext_bytes);
        let mut proof_bytes = Vec::new();
        proof.encode(&mut proof_bytes);

        let call = pack_entry_args(
            "withdraw",
            vec![token.to_vec(), amount.to_le_bytes().to_vec(), new_ciphertext_bytes, proof_bytes],
        );
        self.submit(account, call).await
    }

    #[tracing::instrument(skip(self, decryption_key, rng))]
    #[allow(clippy::too_many_arguments)]
    pub async fn transfer<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
        recipient: AccountId,
        amount: u64,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let _guard = self.lock_pair(account, token).await;
        self.run_with_retry(|| self.transfer_once(account, token, decryption_key, recipient, amount, &mut *rng)).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn transfer_once<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        decryption_key: &DecryptionKey,
        recipient: AccountId,
        amount: u64,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let record = self.refresh(account, token).await?.ok_or(ClientError::StaleState)?;
        // See the identical check in `withdraw_once`: reject before
        // submitting anything, including a normalization transaction.
        let balance = record.available.decrypt(decryption_key)?;
        if balance < amount as u128 {
            return Err(ClientError::InsufficientBalance);
        }

        let record = self.ensure_normalized(account, token, decryption_key, rng).await?;
        BalanceState::classify(Some(&record)).try_transition(Operation::Transfer)?;
        let sender_key = Self::account_key(&record)?;

        let recipient_point =
            self.rpc.get_encryption_key(recipient, token).await.map_err(ClientError::RpcError)?.ok_or(ClientError::StaleState)?;
        let recipient_key = EncryptionKey::from_bytes(&recipient_point.to_bytes())?;

        let mut auditor_keys = Vec::new();
        if let Some(auditor_point) = self.rpc.get_asset_auditor_encryption_key(token).await.map_err(ClientError::RpcError)? {
            auditor_keys.push(EncryptionKey::from_bytes(&auditor_point.to_bytes())?);
        } else if let Some(default_auditor) = self.config.default_auditor_key() {
            auditor_keys.push(*default_auditor);
        }

        let value_chunks = fresh_chunks(amount as u128, rng);
        let value_amounts: [u64; confidential_ciphertext::CHUNK_COUNT] = std::array::from_fn(|i| value_chunks[i].0);
        let recipient_randomness: [confidential_core::Scalar; confidential_ciphertext::CHUNK_COUNT] =
            std::array::from_fn(|i| value_chunks[i].1);
        let auditor_randomness: Vec<[confidential_core::Scalar; confidential_ciphertext::CHUNK_COUNT]> = auditor_keys
            .iter()
            .map(|_| std::array::from_fn(|_| confidential_core::Scalar::random(rng)))
            .collect();
        let sender_new_chunks = fresh_chunks(balance - amount as u128, rng);

        let (proof, sender_new_ciphertext, recipient_ciphertext, auditor_ciphertexts) = confidential_proofs::prove_transfer(
            &account,
            &token,
            &sender_key,
            decryption_key,
            &recipient_key,
            &auditor_keys,
            &record.available,
            &value_amounts,
            &recipient_randomness,
            &auditor_randomness,
            &sender_new_chunks,
            rng,
        )?;
        confidential_proofs::verify_transfer(
            &account,
            &token,
            &sender_key,
            &recipient_key,
            &auditor_keys,
            &record.available,
            &sender_new_ciphertext,
            &recipient_ciphertext,
            &auditor_ciphertexts,
            &proof,
        )
        .map_err(|_| ClientError::ProofFailed)?;

        let mut sender_new_bytes = Vec::new();
        sender_new_ciphertext.encode(&mut sender_new_bytes);
        let mut recipient_bytes = Vec::new();
        recipient_ciphertext.encode(&mut recipient_bytes);
        let mut auditor_bytes = Vec::new();
        for ciphertext in &auditor_ciphertexts {
            ciphertext.encode(&mut auditor_bytes);
        }
        let mut proof_bytes = Vec::new();
        proof.encode(&mut proof_bytes);

        let call = pack_entry_args(
            "confidential_transfer",
            vec![token.to_vec(), recipient.to_vec(), sender_new_bytes, recipient_bytes, auditor_bytes, proof_bytes],
        );
        self.submit(account, call).await
    }

    #[tracing::instrument(skip(self, old_decryption_key, new_decryption_key, rng))]
    pub async fn rotate<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        old_decryption_key: &DecryptionKey,
        new_decryption_key: &DecryptionKey,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let _guard = self.lock_pair(account, token).await;
        self.run_with_retry(|| self.rotate_once(account, token, old_decryption_key, new_decryption_key, &mut *rng)).await
    }

    async fn rotate_once<Rng: RngCore + CryptoRng>(
        &self,
        account: AccountId,
        token: TokenAddress,
        old_decryption_key: &DecryptionKey,
        new_decryption_key: &DecryptionKey,
        rng: &mut Rng,
    ) -> Result<Receipt, ClientError> {
        let record = self.refresh(account, token).await?.ok_or(ClientError::StaleState)?;
        BalanceState::classify(Some(&record)).try_transition(Operation::Rotate)?;
        // A nonzero pending balance cannot be carried across a key change (the
        // rotation proof only re-opens `available`), so refuse the same way an
        // unnormalized `available` is refused: ask the caller to roll over and
        // normalize first.
        let pending_is_zero = record.pending.decrypt(old_decryption_key).map(|v| v == 0).unwrap_or(false);
        if !pending_is_zero {
            return Err(ClientError::Unnormalized);
        }
        let old_key = Self::account_key(&record)?;
        let new_key = new_decryption_key.encryption_key();
        let amount = record.available.decrypt(old_decryption_key)?;
        let new_chunks = fresh_chunks(amount, rng);

        let (proof, new_ciphertext) = confidential_proofs::prove_rotation(
            &account,
            &token,
            &old_key,
            old_decryption_key,
            &new_key,
            new_decryption_key,
            &record.available,
            &new_chunks,
            rng,
        )?;
        confidential_proofs::verify_rotation(&account, &token, &old_key, &new_key, &record.available, &new_ciphertext, &proof)
            .map_err(|_| ClientError::ProofFailed)?;

        let mut new_ciphertext_bytes = Vec::new();
        new_ciphertext.encode(&mut new_ciphertext_bytes);
        let mut proof_bytes = Vec::new();
        proof.encode(&mut proof_bytes);

        let call = pack_entry_args(
            "rotate_encryption_key",
            vec![token.to_vec(), new_key.to_bytes().to_vec(), new_ciphertext_bytes, proof_bytes],
        );
        self.submit(account, call).await
    }

    async fn run_with_retry<T, F, Fut>(&self, mut attempt: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, ClientError>>,
    {
        let attempts = self.config.max_retries().max(1) as usize;
        let mut last_err = None;
        for i in 0..attempts {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if is_retryable(&err) => {
                    tracing::warn!(attempt = i + 1, error = %err, "retrying after transient failure");
                    last_err = Some(err);
                    if i + 1 < attempts {
                        tokio::time::sleep(backoff(i)).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.expect("loop executes at least once since attempts >= 1"))
    }
}
