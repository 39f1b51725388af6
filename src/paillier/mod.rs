//! A thin wrapper around the Paillier cryptosystem with `g = N + 1`:
//! * keeps the big-number backend behind one narrow seam
//! * fixes the canonical plaintext/ciphertext value types used by the proofs

use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::error;
use zeroize::Zeroize;

use crate::{
    api::{BytesVec, MtaError, MtaResult},
    octets::{self, FS_4096},
};

use self::utils::{member_of_mod, member_of_mul_group};

pub mod utils;
pub mod zk;

/// unsafe because the primes are not safe primes
pub fn keygen_unsafe(
    rng: &mut (impl CryptoRng + RngCore),
) -> MtaResult<(EncryptionKey, DecryptionKey)> {
    let p = SecretNumber(BigNumber::prime(1024));
    let q = SecretNumber(BigNumber::prime(1024));
    keypair_from_primes(&p.0, &q.0)
}

/// Generate a Paillier keypair (using safe primes)
pub fn keygen(_rng: &mut (impl CryptoRng + RngCore)) -> MtaResult<(EncryptionKey, DecryptionKey)> {
    let p = BigNumber::safe_prime(1024);
    let q = BigNumber::safe_prime(1024);

    keypair_from_primes(&p, &q)
}

fn keypair_from_primes(p: &BigNumber, q: &BigNumber) -> MtaResult<(EncryptionKey, DecryptionKey)> {
    if p == q {
        error!("keygen: the two primes coincide");
        return Err(MtaError::Fail);
    }

    let n = p * q;
    let ek = EncryptionKey {
        nn: &n * &n,
        n,
    };

    let totient = SecretNumber((p - BigNumber::one()) * (q - BigNumber::one()));

    // With g = N + 1: Dec(c) = L(c^phi mod N^2) * phi^-1 mod N, L(x) = (x-1)/N
    let totient_inv = totient.0.invert(ek.n()).ok_or_else(|| {
        error!("keygen: totient not invertible mod n");
        MtaError::Fail
    })?;

    let dk = DecryptionKey {
        ek: ek.clone(),
        totient: totient.0.clone(),
        totient_inv,
    };

    Ok((ek, dk))
}

/// Wrapper for a `BigNumber` that is zeroized on drop
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct SecretNumber(pub(crate) BigNumber);

/// Paillier encryption key `(N, N^2)`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Zeroize)]
pub struct EncryptionKey {
    n: BigNumber,
    nn: BigNumber,
}

impl EncryptionKey {
    pub(crate) fn n(&self) -> &BigNumber {
        &self.n
    }

    pub(crate) fn nn(&self) -> &BigNumber {
        &self.nn
    }

    pub fn sample_randomness(&self, rng: &mut (impl CryptoRng + RngCore)) -> Randomness {
        Randomness(BigNumber::from_rng(&self.n, rng))
    }

    pub fn random_plaintext(&self, rng: &mut (impl CryptoRng + RngCore)) -> Plaintext {
        Plaintext(BigNumber::from_rng(&self.n, rng))
    }

    /// Validate that the `plaintext` is a valid input to the Paillier encryption key.
    pub fn validate_plaintext(&self, p: &Plaintext) -> bool {
        member_of_mod(&p.0, &self.n)
    }

    /// Validate that the `ciphertext` is a valid output of the Paillier encryption key.
    pub fn validate_ciphertext(&self, c: &Ciphertext) -> bool {
        member_of_mul_group(&c.0, &self.nn)
    }

    /// Validate that the `randomness` is a valid input to the Paillier encryption key.
    pub fn validate_randomness(&self, r: &Randomness) -> bool {
        member_of_mul_group(&r.0, &self.n)
    }

    /// Encrypt a plaintext `p` with the Paillier encryption key.
    pub fn encrypt(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        p: &Plaintext,
    ) -> (Ciphertext, Randomness) {
        // Paillier encryption requires r to be co-prime to N
        // Sampling a random integer mod N has negligible probability of not being co-prime
        let r = self.sample_randomness(rng);

        (self.encrypt_with_randomness(p, &r), r)
    }

    /// `c = (1 + pN) r^N mod N^2`
    ///
    /// Also accepts `p >= N` (the verification equations feed it integers up
    /// to `qN`); the plaintext is implicitly `p mod N`.
    pub fn encrypt_with_randomness(&self, p: &Plaintext, r: &Randomness) -> Ciphertext {
        let g_p = (BigNumber::one() + p.0.modmul(&self.n, &self.nn)) % &self.nn;
        let r_n = r.0.modpow(&self.n, &self.nn);

        Ciphertext(g_p.modmul(&r_n, &self.nn))
    }

    /// Homomorphically add `c1` to `c2`
    pub fn add(&self, c1: &Ciphertext, c2: &Ciphertext) -> Ciphertext {
        Ciphertext(c1.0.modmul(&c2.0, &self.nn))
    }

    /// Homomorphically multiply `c` by `p`
    pub fn mul(&self, c: &Ciphertext, p: &Plaintext) -> Ciphertext {
        Ciphertext(c.0.modpow(&p.0, &self.nn))
    }
}

/// Paillier decryption key; holds only the totient material needed to invert
/// `g = N + 1` encryptions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Zeroize)]
#[zeroize(drop)]
pub struct DecryptionKey {
    ek: EncryptionKey,
    totient: BigNumber,
    totient_inv: BigNumber,
}

impl DecryptionKey {
    pub fn ek(&self) -> &EncryptionKey {
        &self.ek
    }

    pub fn decrypt(&self, c: &Ciphertext) -> Plaintext {
        let x = c.0.modpow(&self.totient, self.ek.nn());

        // L(x) = (x - 1) / N is an exact integer division
        let l = (x - BigNumber::one()) / self.ek.n();

        Plaintext(l.modmul(&self.totient_inv, self.ek.n()))
    }
}

/// Wrapper for Paillier plaintext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct Plaintext(pub(crate) BigNumber);

impl Plaintext {
    /// Generate a random plaintext in the range `[0, n)`
    pub fn generate(rng: &mut (impl CryptoRng + RngCore), n: &BigNumber) -> Self {
        Self(BigNumber::from_rng(n, rng))
    }

    /// Big-endian ingest, for pre-supplied deterministic material
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self(BigNumber::from_slice(bytes))
    }

    pub fn to_scalar(&self) -> k256::Scalar {
        to_scalar(&self.0)
    }

    pub fn from_scalar(s: &k256::Scalar) -> Self {
        Self(to_bigint(s))
    }
}

/// Wrapper for Paillier ciphertext
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ciphertext(pub(crate) BigNumber);

impl Ciphertext {
    /// Fixed-width egress: `FS_4096` bytes, big-endian, left-zero-padded
    pub fn to_octets(&self) -> BytesVec {
        octets::to_padded(&self.0, FS_4096)
    }

    /// Length-strict ingest of a `FS_4096`-byte ciphertext
    pub fn from_octets(bytes: &[u8]) -> MtaResult<Self> {
        Ok(Self(octets::from_padded(bytes, FS_4096)?))
    }
}

/// Wrapper for randomness used in Paillier encryption
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct Randomness(pub(crate) BigNumber);

impl Randomness {
    /// Generate a random number in the range `[0, n)`
    pub fn generate(rng: &mut (impl CryptoRng + RngCore), n: &BigNumber) -> Self {
        Self(BigNumber::from_rng(n, rng))
    }

    /// Big-endian ingest, for pre-supplied deterministic material
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self(BigNumber::from_slice(bytes))
    }
}

pub(crate) fn to_bigint(s: &k256::Scalar) -> BigNumber {
    BigNumber::from_slice(s.to_bytes().as_slice())
}

pub(crate) fn to_scalar(bigint: &BigNumber) -> k256::Scalar {
    use crypto_bigint::ArrayEncoding;
    use ecdsa::elliptic_curve::ops::Reduce;

    let reduced = bigint % &secp256k1_modulus();
    let reduced_pad = pad32(reduced.to_bytes());
    k256::Scalar::reduce(k256::U256::from_be_byte_array(reduced_pad.into()))
}

/// pad `v` with leading zero bytes until it has length 32
/// panics if `v.len()` exceeds 32
fn pad32(v: Vec<u8>) -> [u8; 32] {
    debug_assert!(v.len() <= 32);

    let mut v_pad = [0; 32];
    v_pad[(32 - v.len())..].copy_from_slice(&v);
    v_pad
}

/// The order of the secp256k1 curve
pub(crate) const SECP256K1_CURVE_ORDER: [u8; 32] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// secp256k1 curve order as a `BigNumber`
pub(crate) fn secp256k1_modulus() -> BigNumber {
    BigNumber::from_slice(SECP256K1_CURVE_ORDER.as_ref())
}

#[cfg(test)]
pub(crate) mod malicious {
    use super::*;

    impl Ciphertext {
        pub fn corrupt(&mut self) {
            self.0 += BigNumber::one();
        }

        pub fn corrupt_owned(mut self) -> Self {
            self.corrupt();
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::elliptic_curve::Field;

    #[test]
    fn basic_round_trip() {
        let mut rng = rand::thread_rng();
        let s = k256::Scalar::random(&mut rng);
        let pt = Plaintext::from_scalar(&s);
        let (ek, dk) = keygen_unsafe(&mut rng).unwrap();
        let (ct, _r) = ek.encrypt(&mut rng, &pt);
        let pt2 = dk.decrypt(&ct);
        let s2 = pt2.to_scalar();

        assert_eq!(pt, pt2);
        assert_eq!(s, s2);
    }

    #[test]
    fn homomorphic_ops() {
        let mut rng = rand::thread_rng();
        let (ek, dk) = keygen_unsafe(&mut rng).unwrap();

        let a = k256::Scalar::random(&mut rng);
        let b = k256::Scalar::random(&mut rng);
        let k = k256::Scalar::random(&mut rng);

        let (c_a, _) = ek.encrypt(&mut rng, &Plaintext::from_scalar(&a));
        let (c_b, _) = ek.encrypt(&mut rng, &Plaintext::from_scalar(&b));

        // Dec(a +' b) = a + b
        let sum = dk.decrypt(&ek.add(&c_a, &c_b)).to_scalar();
        assert_eq!(sum, a + b);

        // Dec(a *' k) = a * k
        let prod = dk
            .decrypt(&ek.mul(&c_a, &Plaintext::from_scalar(&k)))
            .to_scalar();
        assert_eq!(prod, a * k);
    }

    #[test]
    fn ciphertext_octets_round_trip() {
        let mut rng = rand::thread_rng();
        let (ek, _dk) = keygen_unsafe(&mut rng).unwrap();
        let (ct, _) = ek.encrypt(&mut rng, &Plaintext::from_scalar(&k256::Scalar::ONE));

        let bytes = ct.to_octets();
        assert_eq!(bytes.len(), FS_4096);
        assert_eq!(Ciphertext::from_octets(&bytes).unwrap(), ct);

        assert!(Ciphertext::from_octets(&bytes[1..]).is_err());
    }

    #[test]
    fn secp256k1_order() {
        // Test that secp256k1 modulus is the order of the generator
        let g = k256::ProjectivePoint::GENERATOR;

        assert_eq!(
            g * to_scalar(&secp256k1_modulus()),
            k256::ProjectivePoint::IDENTITY
        );
    }
}
