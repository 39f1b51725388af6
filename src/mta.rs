//! MtA (Multiplicative to Additive) share conversion.
//!
//! Two parties holding secret scalars `a` and `b` mod the secp256k1 order
//! compute additive shares `alpha + beta = a * b` without revealing their
//! inputs:
//! 1. the sender encrypts `a` under its Paillier key ([mta_client1]),
//! 2. the receiver replies homomorphically with `Enc(a*b + z)` and keeps
//!    `beta = -z` ([mta_server]),
//! 3. the sender decrypts `alpha = a*b + z` ([mta_client2]).
//!
//! The accompanying proofs ([crate::paillier::zk::range] for pass 1,
//! [crate::paillier::zk::mta] for pass 2) are what make the exchange safe
//! against malicious plaintexts.

use k256::elliptic_curve::Field;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::warn;
use zeroize::Zeroize;

use crate::{
    api::{MtaError, MtaResult},
    k256_serde,
    paillier::{
        zk::{mta, range, ZkSetup},
        Ciphertext, DecryptionKey, EncryptionKey, Plaintext, Randomness,
    },
};

/// Receiver-side secret output of a MtA response: the additive share `beta`,
/// the blinding `z` with `beta = -z`, and the Paillier randomness behind the
/// reply. `z` and `randomness` are the receiver-proof witnesses.
#[derive(Debug, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
pub struct Secret {
    pub beta: k256_serde::Scalar,
    pub z: k256_serde::Scalar,
    pub randomness: Randomness,
}

/// Sender first pass: encrypt the multiplicative share `a`.
/// The returned randomness is retained by the sender as its range-proof
/// witness.
pub fn mta_client1(
    rng: &mut (impl CryptoRng + RngCore),
    ek: &EncryptionKey,
    a: &k256::Scalar,
) -> (Ciphertext, Randomness) {
    let r = ek.sample_randomness(rng);
    (mta_client1_with_randomness(ek, a, &r), r)
}

/// Deterministic sibling of [mta_client1]: the pre-supplied `r` is read in
/// place of fresh randomness.
pub fn mta_client1_with_randomness(
    ek: &EncryptionKey,
    a: &k256::Scalar,
    r: &Randomness,
) -> Ciphertext {
    ek.encrypt_with_randomness(&Plaintext::from_scalar(a), r)
}

/// [mta_client1] plus the range proof over the produced ciphertext,
/// non-interactive against the verifier's `zkp`
pub fn mta_client1_with_proof(
    rng: &mut (impl CryptoRng + RngCore),
    zkp: &ZkSetup,
    ek: &EncryptionKey,
    a: &k256::Scalar,
) -> (Ciphertext, Randomness, range::Commitment, range::Proof) {
    let (ciphertext, r) = mta_client1(rng, ek, a);
    let (com, proof) = zkp.range_proof(
        rng,
        &range::Statement {
            ciphertext: &ciphertext,
            ek,
        },
        &range::Witness {
            msg: a,
            randomness: &r,
        },
    );
    (ciphertext, r, com, proof)
}

/// Receiver pass: blind the homomorphic product with a fresh `z` from
/// `[0, q)` and keep `beta = -z mod q`.
/// Rejects a malformed `a_ciphertext` with [MtaError::Fail].
pub fn mta_server(
    rng: &mut (impl CryptoRng + RngCore),
    a_ek: &EncryptionKey,
    b: &k256::Scalar,
    a_ciphertext: &Ciphertext,
) -> MtaResult<(Ciphertext, Secret)> {
    let z = k256::Scalar::random(&mut *rng);
    let randomness = a_ek.sample_randomness(rng);
    let (c_b, beta) = mta_server_with_randomness(a_ek, b, a_ciphertext, &z, &randomness)?;

    Ok((
        c_b,
        Secret {
            beta,
            z: z.into(),
            randomness,
        },
    ))
}

/// Deterministic sibling of [mta_server]: the pre-supplied `z` and `r` are
/// read in place of fresh randomness.
/// `c_b = a_ciphertext *' b +' Enc(z; r)`, `beta = -z mod q`.
pub fn mta_server_with_randomness(
    a_ek: &EncryptionKey,
    b: &k256::Scalar,
    a_ciphertext: &Ciphertext,
    z: &k256::Scalar,
    r: &Randomness,
) -> MtaResult<(Ciphertext, k256_serde::Scalar)> {
    if !a_ek.validate_ciphertext(a_ciphertext) {
        warn!("mta server: ciphertext not in Z*_N^2");
        return Err(MtaError::Fail);
    }

    let z_ciphertext = a_ek.encrypt_with_randomness(&Plaintext::from_scalar(z), r);
    let c_b = a_ek.add(
        &a_ek.mul(a_ciphertext, &Plaintext::from_scalar(b)),
        &z_ciphertext,
    );
    let beta = k256_serde::Scalar::from(-*z);

    Ok((c_b, beta))
}

/// [mta_server] plus the receiver proof over `(CA, CB)`, non-interactive
/// against the sender's `zkp`
pub fn mta_server_with_proof(
    rng: &mut (impl CryptoRng + RngCore),
    a_zkp: &ZkSetup,
    a_ek: &EncryptionKey,
    b: &k256::Scalar,
    a_ciphertext: &Ciphertext,
) -> MtaResult<(Ciphertext, mta::Commitment, mta::Proof, Secret)> {
    let (c_b, secret) = mta_server(rng, a_ek, b, a_ciphertext)?;
    let (com, proof) = a_zkp.mta_proof(
        rng,
        &mta::Statement {
            ciphertext1: a_ciphertext,
            ciphertext2: &c_b,
            ek: a_ek,
        },
        &mta::Witness {
            x: b,
            msg: &Plaintext::from_scalar(secret.z.as_ref()),
            randomness: &secret.randomness,
        },
    );
    Ok((c_b, com, proof, secret))
}

/// [mta_server] plus the receiver proof with the DLOG check against
/// `X = b * G`
pub fn mta_server_with_proof_wc(
    rng: &mut (impl CryptoRng + RngCore),
    a_zkp: &ZkSetup,
    a_ek: &EncryptionKey,
    b: &k256::Scalar,
    a_ciphertext: &Ciphertext,
) -> MtaResult<(Ciphertext, mta::CommitmentWc, mta::Proof, Secret)> {
    let (c_b, secret) = mta_server(rng, a_ek, b, a_ciphertext)?;
    let x_g = k256::ProjectivePoint::GENERATOR * b;
    let (com_wc, proof) = a_zkp.mta_proof_wc(
        rng,
        &mta::StatementWc {
            stmt: mta::Statement {
                ciphertext1: a_ciphertext,
                ciphertext2: &c_b,
                ek: a_ek,
            },
            x_g: &x_g,
        },
        &mta::Witness {
            x: b,
            msg: &Plaintext::from_scalar(secret.z.as_ref()),
            randomness: &secret.randomness,
        },
    );
    Ok((c_b, com_wc, proof, secret))
}

/// Sender second pass: `alpha = Dec(CB) mod q`.
/// Rejects a malformed `c_b` with [MtaError::Fail].
pub fn mta_client2(dk: &DecryptionKey, c_b: &Ciphertext) -> MtaResult<k256::Scalar> {
    if !dk.ek().validate_ciphertext(c_b) {
        warn!("mta client2: ciphertext not in Z*_N^2");
        return Err(MtaError::Fail);
    }

    Ok(dk.decrypt(c_b).to_scalar())
}

/// `a * b + alpha + beta mod q`, the share recombination used when summing
/// pairwise MtA outputs
pub fn mta_sum(
    a: &k256::Scalar,
    b: &k256::Scalar,
    alpha: &k256::Scalar,
    beta: &k256::Scalar,
) -> k256::Scalar {
    a * b + alpha + beta
}

/// Return `true` iff `(c_b, s.beta)` is the response derived from
/// `(a_ek, a_ciphertext, b)` under the opened secret `s`
pub fn verify_mta_response(
    a_ek: &EncryptionKey,
    a_ciphertext: &Ciphertext,
    b: &k256::Scalar,
    c_b: &Ciphertext,
    s: &Secret,
) -> bool {
    match mta_server_with_randomness(a_ek, b, a_ciphertext, s.z.as_ref(), &s.randomness) {
        Ok((check_c_b, check_beta)) => check_c_b == *c_b && check_beta == s.beta,
        Err(_) => false,
    }
}
