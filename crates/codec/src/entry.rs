/// A packed call to one of the on-chain confidential-asset module's entry
/// functions (`spec.md` §6.2): a function name plus one byte-vector per
/// Move argument, in argument order.
///
/// Deliberately enum-free — the `Submitter` collaborator signs and submits
/// whatever `Vec<Vec<u8>>` it is handed, with no knowledge of the
/// cryptographic meaning of any argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveCallArgs {
    pub function: &'static str,
    pub args: Vec<Vec<u8>>,
}

/// Packs one entry-function call. `args` are supplied as already-encoded
/// byte vectors (addresses as 32 raw bytes, proofs/ciphertexts via
/// `WireEncode`, `amount_u64` as 8 little-endian bytes per Move's `u64`
/// argument convention) in the exact order `spec.md` §6.2 lists them for
/// `function`.
pub fn pack_entry_args(function: &'static str, args: Vec<Vec<u8>>) -> MoveCallArgs {
    MoveCallArgs { function, args }
}
