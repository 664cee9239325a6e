use std::collections::HashMap;
use std::sync::OnceLock;

use confidential_core::{Point, Scalar};

use crate::error::CipherError;

/// A baby-step/giant-step discrete-log table for `i * G0 -> i`,
/// `i in [0, 2^(maxBits/2))`.
///
/// Built once per `maxBits` value and shared read-only across every caller
/// for the lifetime of the process (`spec.md` §5, "Shared-resource
/// policy"). The map is injective over the range it covers, so there are no
/// tie-breaks to resolve on a hit.
struct DlogTable {
    half_bits: u32,
    table: HashMap<[u8; 32], u64>,
}

impl DlogTable {
    fn build(max_bits: u8) -> Self {
        let half_bits = (max_bits as u32) / 2;
        let size = 1u64 << half_bits;
        let mut table = HashMap::with_capacity(size as usize);
        let g = Point::basepoint();
        let mut acc = Point::identity();
        for i in 0..size {
            table.insert(acc.to_bytes(), i);
            acc = acc + g;
        }
        DlogTable { half_bits, table }
    }

    /// Searches for `m` such that `target == m * G0`, `m in [0, 2^maxBits)`.
    fn search(&self, target: Point, max_bits: u8) -> Option<u64> {
        let giant_step = Point::basepoint() * Scalar::from_u64(1u64 << self.half_bits);
        let outer_bits = (max_bits as u32).saturating_sub(self.half_bits);
        let outer_size = 1u64 << outer_bits;

        let mut probe = target;
        for j in 0..outer_size {
            if let Some(&i) = self.table.get(&probe.to_bytes()) {
                return Some(j * (1u64 << self.half_bits) + i);
            }
            probe = probe - giant_step;
        }
        None
    }
}

static TABLE_16: OnceLock<DlogTable> = OnceLock::new();
static TABLE_32: OnceLock<DlogTable> = OnceLock::new();

fn table_for(max_bits: u8) -> &'static DlogTable {
    match max_bits {
        16 => TABLE_16.get_or_init(|| DlogTable::build(16)),
        32 => TABLE_32.get_or_init(|| DlogTable::build(32)),
        other => panic!("unsupported discrete-log bit width {other}; only 16 and 32 are precomputed"),
    }
}

/// Recovers `m` such that `point == m * G0`, `m in [0, 2^maxBits)`, using the
/// shared precomputed table for `maxBits`.
///
/// This step is inherently data-dependent on the *plaintext value* `m`
/// (timing reveals how many giant steps were needed), which `spec.md` §1
/// explicitly accepts as a non-goal of constant-time execution; it never
/// touches secret key material.
pub fn discrete_log_search(point: Point, max_bits: u8) -> Result<u64, CipherError> {
    table_for(max_bits)
        .search(point, max_bits)
        .ok_or(CipherError::AmountOutOfRange)
}
