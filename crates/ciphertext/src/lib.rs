//! Twisted-ElGamal ciphertext, chunked balances, and key material.
//!
//! Built on `confidential-core`'s group arithmetic. A balance is encrypted
//! as [`chunked::ChunkedCiphertext`], eight homomorphically-addable 16-bit
//! [`ciphertext::Ciphertext`] chunks under one [`key::EncryptionKey`].

mod chunked;
mod ciphertext;
mod dlog;
mod error;
mod key;

pub use chunked::{ChunkedCiphertext, CHUNK_COUNT};
pub use ciphertext::Ciphertext;
pub use dlog::discrete_log_search;
pub use error::CipherError;
pub use key::{DecryptionKey, EncryptionKey};
