//! Canonical byte encoding for every public type in `confidential-core`,
//! `confidential-ciphertext`, and `confidential-proofs`, plus packing of
//! chain-facing Move entry-function arguments.
//!
//! `WireEncode`/`WireDecode` give every caller a single encode/decode path
//! instead of hand-rolled byte offsets at each orchestrator call site.
//! Versioned structs (the four proof types) carry a 2-byte little-endian
//! version prefix and reject unknown versions with
//! [`CodecError::UnsupportedVersion`].

mod ciphertext;
mod entry;
mod error;
mod primitive;
mod proofs;

pub use entry::{pack_entry_args, MoveCallArgs};
pub use error::CodecError;

/// Appends `self`'s canonical encoding to `out`.
pub trait WireEncode {
    fn encode(&self, out: &mut Vec<u8>);
}

/// Decodes `Self` from the front of `buf`, returning the value and the
/// number of bytes consumed.
pub trait WireDecode: Sized {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError>;
}

pub(crate) fn read_bytes<'a>(buf: &'a [u8], len: usize) -> Result<&'a [u8], CodecError> {
    buf.get(..len).ok_or(CodecError::UnexpectedEof)
}

pub(crate) fn read_array<const N: usize>(buf: &[u8]) -> Result<([u8; N], usize), CodecError> {
    let slice = read_bytes(buf, N)?;
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    Ok((out, N))
}

pub(crate) fn read_u16(buf: &[u8]) -> Result<(u16, usize), CodecError> {
    let (bytes, n) = read_array::<2>(buf)?;
    Ok((u16::from_le_bytes(bytes), n))
}

pub(crate) fn read_u32(buf: &[u8]) -> Result<(u32, usize), CodecError> {
    let (bytes, n) = read_array::<4>(buf)?;
    Ok((u32::from_le_bytes(bytes), n))
}
