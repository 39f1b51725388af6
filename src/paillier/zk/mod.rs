//! Ring-Pedersen commitment parameters and the shared Fiat-Shamir transcript
//! for the MtA zero-knowledge proofs.

use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{digest::Update, Digest, Sha256};
use zeroize::Zeroize;

use crate::{
    api::MtaResult,
    k256_serde::point_to_bytes,
    octets::{self, FS_2048, FS_4096},
};

use super::{
    keygen, keygen_unsafe, Ciphertext, EncryptionKey, Plaintext, Randomness, SecretNumber,
    SECP256K1_CURVE_ORDER,
};

pub mod mta;
pub mod range;

/// Commitment parameters of a verifier: a Blum-Williams modulus `N~` and
/// generators `h1`, `h2` of the quadratic residues mod `N~` with
/// `h1 = h2^alpha0`. The verifier keeps `alpha0`; provers never see it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Zeroize)]
pub struct ZkSetup {
    n_tilde: BigNumber,
    h1: BigNumber,
    h2: BigNumber,
}

/// The verifier-side exponent `alpha0` relating `h1` to `h2`
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct ZkSetupSecret {
    alpha0: BigNumber,
}

impl ZkSetup {
    /// unsafe because the primes behind `N~` are not safe primes
    pub fn new_unsafe(
        rng: &mut (impl CryptoRng + RngCore),
    ) -> MtaResult<(ZkSetup, ZkSetupSecret)> {
        let (_, dk_tilde) = keygen_unsafe(rng)?;
        Ok(Self::from_modulus(rng, dk_tilde.ek().n().clone()))
    }

    /// Generate commitment parameters over a fresh Blum-Williams modulus.
    /// Safe primes are `3 mod 4`, so `N~` is a Blum integer.
    pub fn new(rng: &mut (impl CryptoRng + RngCore)) -> MtaResult<(ZkSetup, ZkSetupSecret)> {
        let (_, dk_tilde) = keygen(rng)?;
        Ok(Self::from_modulus(rng, dk_tilde.ek().n().clone()))
    }

    fn from_modulus(
        rng: &mut (impl CryptoRng + RngCore),
        n_tilde: BigNumber,
    ) -> (ZkSetup, ZkSetupSecret) {
        // h2 generates the quadratic residues mod N~ with overwhelming probability
        let f = SecretNumber(BigNumber::from_rng(&n_tilde, rng));
        let h2 = f.0.modmul(&f.0, &n_tilde);

        let alpha0 = BigNumber::from_rng(&n_tilde, rng);
        let h1 = h2.modpow(&alpha0, &n_tilde);

        (
            Self { n_tilde, h1, h2 },
            ZkSetupSecret { alpha0 },
        )
    }

    pub(crate) fn h1(&self) -> &BigNumber {
        &self.h1
    }

    pub(crate) fn h2(&self) -> &BigNumber {
        &self.h2
    }

    pub(crate) fn n_tilde(&self) -> &BigNumber {
        &self.n_tilde
    }

    /// Compute the FO commitment, `h1^msg h2^r mod N~`
    fn commit(&self, msg: &Plaintext, randomness: &Randomness) -> BigNumber {
        let h1_x = self.h1.modpow(&msg.0, &self.n_tilde);
        let h2_r = self.h2.modpow(&randomness.0, &self.n_tilde);

        h1_x.modmul(&h2_r, &self.n_tilde)
    }
}

/// Uniform challenge in `[0, q)` for the interactive variant of any of the
/// proofs, supplied by the verifier in place of the Fiat-Shamir challenge.
pub fn random_challenge(rng: impl CryptoRng + RngCore) -> k256::Scalar {
    use k256::elliptic_curve::Field;
    k256::Scalar::random(rng)
}

/// Canonical Fiat-Shamir transcript shared by the range and receiver proofs.
///
/// Every field is absorbed pre-padded to its fixed width so that the
/// challenge is bit-identical across implementations: 2048-bit ring elements
/// at `FS_2048`, ciphertext-ring elements at `FS_4096`, the curve order at
/// 32 bytes, curve points SEC1-compressed at 33 bytes. The digest is read as
/// a big-endian integer and reduced mod q.
pub(crate) struct Transcript(Sha256);

impl Transcript {
    /// Absorb the shared prefix `g | N~ | h1 | h2 | q`
    fn new(ek: &EncryptionKey, zkp: &ZkSetup) -> Self {
        let g = ek.n() + BigNumber::one();

        Self(
            Sha256::new()
                .chain(octets::to_padded(&g, FS_2048))
                .chain(octets::to_padded(&zkp.n_tilde, FS_2048))
                .chain(octets::to_padded(&zkp.h1, FS_2048))
                .chain(octets::to_padded(&zkp.h2, FS_2048))
                .chain(SECP256K1_CURVE_ORDER),
        )
    }

    fn chain_2048(self, x: &BigNumber) -> Self {
        Self(self.0.chain(octets::to_padded(x, FS_2048)))
    }

    fn chain_ciphertext(self, c: &Ciphertext) -> Self {
        Self(self.0.chain(octets::to_padded(&c.0, FS_4096)))
    }

    fn chain_point(self, p: &k256::ProjectivePoint) -> Self {
        Self(self.0.chain(point_to_bytes(p)))
    }

    fn challenge(self) -> k256::Scalar {
        use crypto_bigint::ArrayEncoding;
        use ecdsa::elliptic_curve::ops::Reduce;

        let digest: [u8; 32] = self.0.finalize().into();
        k256::Scalar::reduce(k256::U256::from_be_byte_array(digest.into()))
    }
}

/// The order of the secp256k1 curve raised to exponent 3
const SECP256K1_CURVE_ORDER_CUBED: [u8; 96] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfc,
    0x30, 0x0c, 0x96, 0xb4, 0x0d, 0xd9, 0xe0, 0xb3, 0x3f, 0x77, 0x1b, 0xa6, 0x70, 0xa2, 0xc3, 0xc7,
    0xd8, 0x35, 0x56, 0x80, 0x85, 0x53, 0xd3, 0x51, 0xb3, 0xc7, 0xe1, 0xad, 0x13, 0x67, 0x17, 0x4d,
    0x7e, 0xf3, 0x6d, 0x11, 0x11, 0xa6, 0x3c, 0x8c, 0xfd, 0x39, 0x30, 0x75, 0x16, 0xea, 0x33, 0xb3,
    0x46, 0x38, 0x5c, 0x85, 0x02, 0xd9, 0x95, 0x74, 0xd9, 0xef, 0x0f, 0x38, 0x7a, 0x1c, 0xf0, 0x66,
    0x35, 0x52, 0x09, 0x0f, 0xe1, 0xe1, 0x1b, 0x11, 0xeb, 0x69, 0x26, 0xb7, 0x85, 0x7b, 0x73, 0xc1,
];

/// The order of the secp256k1 curve raised to exponent 2
const SECP256K1_CURVE_ORDER_SQUARED: [u8; 64] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfd,
    0x75, 0x5d, 0xb9, 0xcd, 0x5e, 0x91, 0x40, 0x77, 0x7f, 0xa4, 0xbd, 0x19, 0xa0, 0x6c, 0x82, 0x83,
    0x9d, 0x67, 0x1c, 0xd5, 0x81, 0xc6, 0x9b, 0xc5, 0xe6, 0x97, 0xf5, 0xe4, 0x5b, 0xcd, 0x07, 0xc5,
    0x2e, 0xc3, 0x73, 0xa8, 0xbd, 0xc5, 0x98, 0xb4, 0x49, 0x3f, 0x50, 0xa1, 0x38, 0x0e, 0x12, 0x81,
];

/// secp256k1 curve order cubed as a `BigNumber`
fn secp256k1_modulus_cubed() -> BigNumber {
    BigNumber::from_slice(SECP256K1_CURVE_ORDER_CUBED.as_ref())
}

/// secp256k1 curve order squared as a `BigNumber`
fn secp256k1_modulus_squared() -> BigNumber {
    BigNumber::from_slice(SECP256K1_CURVE_ORDER_SQUARED.as_ref())
}
