use confidential_ciphertext::{Ciphertext, ChunkedCiphertext, EncryptionKey, CHUNK_COUNT};

use crate::{read_array, CodecError, WireDecode, WireEncode};

impl WireEncode for Ciphertext {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }
}

impl WireDecode for Ciphertext {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (bytes, n) = read_array::<64>(buf)?;
        Ok((Ciphertext::from_bytes(&bytes)?, n))
    }
}

impl WireEncode for ChunkedCiphertext {
    /// Chunk 0 (least-significant 16 bits) first, matching
    /// `ChunkedCiphertext::chunks`'s ordering.
    fn encode(&self, out: &mut Vec<u8>) {
        for chunk in self.chunks() {
            chunk.encode(out);
        }
    }
}

impl WireDecode for ChunkedCiphertext {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let mut chunks = [Ciphertext::zero(); CHUNK_COUNT];
        let mut offset = 0;
        for chunk in chunks.iter_mut() {
            let (value, n) = Ciphertext::decode(&buf[offset..])?;
            *chunk = value;
            offset += n;
        }
        Ok((ChunkedCiphertext::from_chunks(chunks), offset))
    }
}

impl WireEncode for EncryptionKey {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }
}

impl WireDecode for EncryptionKey {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (bytes, n) = read_array::<32>(buf)?;
        Ok((EncryptionKey::from_bytes(&bytes)?, n))
    }
}
