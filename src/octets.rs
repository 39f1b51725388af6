//! Fixed-width big-endian marshalling for big integers.
//!
//! All wire encodings in this crate are length-exact: egress pads with
//! leading zero bytes up to the declared width, ingest rejects any length
//! mismatch. The widths mirror the 2048-bit Paillier / commitment moduli and
//! their 4096-bit squares.

use libpaillier::unknown_order::BigNumber;
use tracing::warn;

use crate::api::{BytesVec, MtaError, MtaResult};

/// Width of an element mod a 2048-bit modulus (N or N~)
pub const FS_2048: usize = 256;

/// Width of an element mod a 4096-bit modulus (N^2)
pub const FS_4096: usize = 512;

/// Width of a half-size witness component
pub const HFS_2048: usize = 128;

/// Width of a curve scalar or challenge
pub const FS_SCALAR: usize = 32;

/// Width of a SEC1 compressed secp256k1 point
pub const FS_POINT: usize = 33;

/// Serialize `n` big-endian, left-zero-padded to exactly `width` bytes.
/// `n` must fit in `width` bytes.
pub(crate) fn to_padded(n: &BigNumber, width: usize) -> BytesVec {
    let bytes = n.to_bytes();
    debug_assert!(bytes.len() <= width);

    if bytes.len() >= width {
        // keep the numerically-significant low-order bytes
        return bytes[(bytes.len() - width)..].to_vec();
    }

    let mut padded = vec![0; width];
    padded[(width - bytes.len())..].copy_from_slice(&bytes);
    padded
}

/// Parse a big-endian integer from exactly `width` bytes.
pub(crate) fn from_padded(bytes: &[u8], width: usize) -> MtaResult<BigNumber> {
    if bytes.len() != width {
        warn!("octets: expect {} bytes, got {}", width, bytes.len());
        return Err(MtaError::Fail);
    }

    Ok(BigNumber::from_slice(bytes))
}

/// Split `bytes` into chunks of the given `widths`.
/// The total length must match exactly.
pub(crate) fn split_exact<'a>(bytes: &'a [u8], widths: &[usize]) -> MtaResult<Vec<&'a [u8]>> {
    if bytes.len() != widths.iter().sum::<usize>() {
        warn!(
            "octets: expect {} bytes, got {}",
            widths.iter().sum::<usize>(),
            bytes.len()
        );
        return Err(MtaError::Fail);
    }

    let mut chunks = Vec::with_capacity(widths.len());
    let mut rest = bytes;
    for &width in widths {
        let (chunk, tail) = rest.split_at(width);
        chunks.push(chunk);
        rest = tail;
    }
    Ok(chunks)
}

/// Fold the top `x.len()` bytes of `y` into `x` by integer addition,
/// discarding any carry out of the `x.len()`-byte window.
/// Used to fold the ECDSA ephemeral inversion output.
pub fn truncate_add(x: &[u8], y: &[u8]) -> BytesVec {
    let top_len = x.len().min(y.len());
    let sum = BigNumber::from_slice(x) + BigNumber::from_slice(&y[..top_len]);

    // wrap mod 256^|x|
    let wrapped = sum % &(BigNumber::one() << (8 * x.len()));
    to_padded(&wrapped, x.len())
}
