use confidential_core::{Point, Scalar};

use crate::{read_array, CodecError, WireDecode, WireEncode};

impl WireEncode for Point {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }
}

impl WireDecode for Point {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (bytes, n) = read_array::<32>(buf)?;
        Ok((Point::from_bytes(&bytes, true)?, n))
    }
}

impl WireEncode for Scalar {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_bytes());
    }
}

impl WireDecode for Scalar {
    fn decode(buf: &[u8]) -> Result<(Self, usize), CodecError> {
        let (bytes, n) = read_array::<32>(buf)?;
        Ok((Scalar::from_canonical_bytes(&bytes)?, n))
    }
}
