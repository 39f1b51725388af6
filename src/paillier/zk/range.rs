//! Range proof for the MtA sender: the prover knows `(m, r)` with
//! `ciphertext = Enc(ek, m, r)` and `-q^3 < m < q^3`.
//!
//! Full specification: appendix A.1 of <https://eprint.iacr.org/2019/114.pdf>
//!
//! The proof runs in explicit phases so it can also be used interactively:
//! `commit`, `challenge` (Fiat-Shamir or verifier-supplied), `prove`,
//! `verify`.

use std::ops::Neg;

use libpaillier::unknown_order::BigNumber;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::warn;
use zeroize::Zeroize;

use crate::{
    api::{BytesVec, MtaResult},
    octets::{self, FS_2048, FS_4096, HFS_2048},
    paillier::{
        secp256k1_modulus, to_bigint,
        utils::{member_of_mod, member_of_mul_group},
        zk::{secp256k1_modulus_cubed, Transcript, ZkSetup},
        Ciphertext, EncryptionKey, Plaintext, Randomness,
    },
};

#[derive(Clone, Debug)]
pub struct Statement<'a> {
    pub ciphertext: &'a Ciphertext,
    pub ek: &'a EncryptionKey,
}

#[derive(Clone, Debug)]
pub struct Witness<'a> {
    pub msg: &'a k256::Scalar,
    pub randomness: &'a Randomness,
}

/// Public commitment `(z, u, w)`: `z, w` over `N~`, `u` over `N^2`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Commitment {
    z: BigNumber,
    u: Ciphertext,
    w: BigNumber,
}

/// Secret witnesses behind a [Commitment]; read once by `range_prove`,
/// wiped on every exit path
#[derive(Debug, Zeroize)]
#[zeroize(drop)]
pub struct CommitmentRandomness {
    alpha: Plaintext,
    beta: Randomness,
    gamma: Randomness,
    rho: Randomness,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    s: Randomness,
    s1: Plaintext,
    s2: Randomness,
}

impl CommitmentRandomness {
    /// Sample commitment randomness:
    /// `alpha` from `[0, q^3)`, `beta` from `Z*_N`,
    /// `gamma` from `[0, q^3 N~)`, `rho` from `[0, q N~)`
    pub fn sample(
        rng: &mut (impl CryptoRng + RngCore),
        zkp: &ZkSetup,
        ek: &EncryptionKey,
    ) -> Self {
        let q_n_tilde = secp256k1_modulus() * zkp.n_tilde();
        let q3_n_tilde = secp256k1_modulus_cubed() * zkp.n_tilde();

        Self {
            alpha: Plaintext::generate(rng, &secp256k1_modulus_cubed()),
            beta: ek.sample_randomness(rng),
            gamma: Randomness::generate(rng, &q3_n_tilde),
            rho: Randomness::generate(rng, &q_n_tilde),
        }
    }

    /// Pre-supplied material for the deterministic entry points
    pub fn from_material(
        alpha: Plaintext,
        beta: Randomness,
        gamma: Randomness,
        rho: Randomness,
    ) -> Self {
        Self {
            alpha,
            beta,
            gamma,
            rho,
        }
    }

    /// Explicit wipe; also performed on drop
    pub fn kill(&mut self) {
        self.zeroize();
    }
}

impl ZkSetup {
    pub fn range_commit(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        ek: &EncryptionKey,
        msg: &k256::Scalar,
    ) -> (Commitment, CommitmentRandomness) {
        let rv = CommitmentRandomness::sample(rng, self, ek);
        let com = self.range_commit_with_randomness(ek, msg, &rv);
        (com, rv)
    }

    /// Deterministic sibling of [Self::range_commit]: the pre-supplied `rv`
    /// is read in place of fresh randomness.
    pub fn range_commit_with_randomness(
        &self,
        ek: &EncryptionKey,
        msg: &k256::Scalar,
        rv: &CommitmentRandomness,
    ) -> Commitment {
        let msg = Plaintext(to_bigint(msg));

        // z = h1^m h2^rho mod N~
        let z = self.commit(&msg, &rv.rho);

        // u = Paillier-Enc(alpha, beta) = g^alpha beta^N mod N^2
        let u = ek.encrypt_with_randomness(&rv.alpha, &rv.beta);

        // w = h1^alpha h2^gamma mod N~
        let w = self.commit(&rv.alpha, &rv.gamma);

        Commitment { z, u, w }
    }

    /// Fiat-Shamir challenge `e = H(g | N~ | h1 | h2 | q | CT | z | u | w) mod q`
    pub fn range_challenge(&self, stmt: &Statement, com: &Commitment) -> k256::Scalar {
        Transcript::new(stmt.ek, self)
            .chain_ciphertext(stmt.ciphertext)
            .chain_2048(&com.z)
            .chain_ciphertext(&com.u)
            .chain_2048(&com.w)
            .challenge()
    }

    /// `s = beta r^e mod N`, `s1 = e m + alpha`, `s2 = e rho + gamma`
    /// (`s1`, `s2` over the integers). Consumes `rv`, which is wiped on drop.
    pub fn range_prove(
        &self,
        ek: &EncryptionKey,
        wit: &Witness,
        rv: CommitmentRandomness,
        e: &k256::Scalar,
    ) -> Proof {
        // Assume: m in Z_q
        debug_assert!(member_of_mod(&to_bigint(wit.msg), &secp256k1_modulus()));

        // Assume: r in Z*_N
        debug_assert!(ek.validate_randomness(wit.randomness));

        let e = &to_bigint(e);
        let msg = Plaintext(to_bigint(wit.msg));

        // s = r^e beta mod N
        let s = Randomness(
            wit.randomness
                .0
                .modpow(e, ek.n())
                .modmul(&rv.beta.0, ek.n()),
        );

        // s1 = e * m + alpha
        let s1 = Plaintext(e * &msg.0 + &rv.alpha.0);

        // s2 = e * rho + gamma
        let s2 = Randomness(e * &rv.rho.0 + &rv.gamma.0);

        Proof { s, s1, s2 }
    }

    /// Single boolean verdict. Malformed components (group-membership
    /// failures) reject immediately; the size bounds and both algebraic
    /// equations are evaluated jointly so the verdict does not reveal which
    /// one failed.
    pub fn range_verify(
        &self,
        stmt: &Statement,
        com: &Commitment,
        e: &k256::Scalar,
        proof: &Proof,
    ) -> bool {
        // Ensure c is in Z*_N^2
        if !member_of_mul_group(&stmt.ciphertext.0, stmt.ek.nn()) {
            warn!("range proof: ciphertext not in Z*_N^2");
            return false;
        }

        // Ensure z is in Z*_N~
        if !member_of_mul_group(&com.z, self.n_tilde()) {
            warn!("range proof: z not in Z*_N~");
            return false;
        }

        // Ensure u is in Z*_N^2
        if !member_of_mul_group(&com.u.0, stmt.ek.nn()) {
            warn!("range proof: u not in Z*_N^2");
            return false;
        }

        // Ensure w is in Z*_N~
        if !member_of_mul_group(&com.w, self.n_tilde()) {
            warn!("range proof: w not in Z*_N~");
            return false;
        }

        // Ensure s is in Z*_N
        if !member_of_mul_group(&proof.s.0, stmt.ek.n()) {
            warn!("range proof: s not in Z*_N");
            return false;
        }

        // s1 in Z_q^3: the bound is s1 <= q^3, but equality occurs with
        // negligible probability from an honest prover and the soundness
        // proof uses s1 < q^3
        let s1_ok = member_of_mod(&proof.s1.0, &secp256k1_modulus_cubed());

        // s2 in Z_(q^3 N~); a 1/q chance of an honest s2 exceeding the bound
        let q3_n_tilde = secp256k1_modulus_cubed() * self.n_tilde();
        let s2_ok = member_of_mod(&proof.s2.0, &q3_n_tilde);

        let e_neg = to_bigint(e).neg();

        // w ?= h1^s1 h2^s2 z^(-e) mod N~
        let w_ok = self.commit(&proof.s1, &proof.s2).modmul(
            &com.z.modpow(&e_neg, self.n_tilde()),
            self.n_tilde(),
        ) == com.w;

        // u ?= Paillier-Enc(s1, s) * c^(-e) mod N^2
        let u_ok = stmt
            .ek
            .encrypt_with_randomness(&proof.s1, &proof.s)
            .0
            .modmul(
                &stmt.ciphertext.0.modpow(&e_neg, stmt.ek.nn()),
                stmt.ek.nn(),
            )
            == com.u.0;

        // no short-circuit: a forger learns only the verdict
        let ok = s1_ok & s2_ok & w_ok & u_ok;
        if !ok {
            warn!("range proof: verify failed");
        }
        ok
    }

    /// Non-interactive proof: commit, Fiat-Shamir challenge, prove
    pub fn range_proof(
        &self,
        rng: &mut (impl CryptoRng + RngCore),
        stmt: &Statement,
        wit: &Witness,
    ) -> (Commitment, Proof) {
        let (com, rv) = self.range_commit(rng, stmt.ek, wit.msg);
        let e = self.range_challenge(stmt, &com);
        let proof = self.range_prove(stmt.ek, wit, rv, &e);
        (com, proof)
    }

    pub fn verify_range_proof(&self, stmt: &Statement, com: &Commitment, proof: &Proof) -> bool {
        let e = self.range_challenge(stmt, com);
        self.range_verify(stmt, com, &e, proof)
    }
}

impl Commitment {
    /// `z | u | w` at widths `FS_2048 | FS_4096 | FS_2048`
    pub fn to_octets(&self) -> BytesVec {
        let mut bytes = octets::to_padded(&self.z, FS_2048);
        bytes.extend(octets::to_padded(&self.u.0, FS_4096));
        bytes.extend(octets::to_padded(&self.w, FS_2048));
        bytes
    }

    pub fn from_octets(bytes: &[u8]) -> MtaResult<Self> {
        let chunks = octets::split_exact(bytes, &[FS_2048, FS_4096, FS_2048])?;

        Ok(Self {
            z: octets::from_padded(chunks[0], FS_2048)?,
            u: Ciphertext::from_octets(chunks[1])?,
            w: octets::from_padded(chunks[2], FS_2048)?,
        })
    }
}

impl Proof {
    /// `s | s1 | s2` at widths `FS_2048 | FS_2048 | FS_2048 + HFS_2048`
    pub fn to_octets(&self) -> BytesVec {
        let mut bytes = octets::to_padded(&self.s.0, FS_2048);
        bytes.extend(octets::to_padded(&self.s1.0, FS_2048));
        bytes.extend(octets::to_padded(&self.s2.0, FS_2048 + HFS_2048));
        bytes
    }

    pub fn from_octets(bytes: &[u8]) -> MtaResult<Self> {
        let chunks = octets::split_exact(bytes, &[FS_2048, FS_2048, FS_2048 + HFS_2048])?;

        Ok(Self {
            s: Randomness(octets::from_padded(chunks[0], FS_2048)?),
            s1: Plaintext(octets::from_padded(chunks[1], FS_2048)?),
            s2: Randomness(octets::from_padded(chunks[2], FS_2048 + HFS_2048)?),
        })
    }
}

#[cfg(test)]
pub(crate) mod malicious {
    use super::*;

    pub fn corrupt_commitment(com: &Commitment) -> Commitment {
        let com = com.clone();
        Commitment {
            u: com.u.corrupt_owned(),
            ..com
        }
    }

    pub fn corrupt_proof(proof: &Proof) -> Proof {
        let proof = proof.clone();
        Proof {
            s1: Plaintext(proof.s1.0.clone() + BigNumber::one()),
            ..proof
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        malicious::{corrupt_commitment, corrupt_proof},
        BigNumber, Commitment, CommitmentRandomness, Plaintext, Proof, Randomness, Statement,
        Witness, ZkSetup,
    };
    use crate::paillier::{keygen_unsafe, zk::random_challenge};
    use k256::elliptic_curve::Field;
    use tracing_test::traced_test; // enable logs in tests

    #[test]
    #[traced_test]
    fn basic_correctness() {
        let rng = &mut rand::thread_rng();

        // create a (statement, witness) pair
        let (ek, _dk) = &keygen_unsafe(rng).unwrap();
        let msg = &k256::Scalar::random(&mut *rng);
        let (ciphertext, randomness) = &ek.encrypt(rng, &Plaintext::from_scalar(msg));

        let stmt = &Statement { ciphertext, ek };
        let wit = &Witness { msg, randomness };
        let (zkp, _) = ZkSetup::new_unsafe(rng).unwrap();

        // test: valid non-interactive proof
        let (com, proof) = zkp.range_proof(rng, stmt, wit);
        assert!(zkp.verify_range_proof(stmt, &com, &proof));

        // test: valid interactive proof
        let (com2, rv) = zkp.range_commit(rng, ek, msg);
        let e = random_challenge(&mut *rng);
        let proof2 = zkp.range_prove(ek, wit, rv, &e);
        assert!(zkp.range_verify(stmt, &com2, &e, &proof2));

        // test: interactive proof replayed under a different challenge
        let e_bad = random_challenge(&mut *rng);
        assert!(!zkp.range_verify(stmt, &com2, &e_bad, &proof2));

        // test: bad commitment
        let bad_com = corrupt_commitment(&com);
        assert!(!zkp.verify_range_proof(stmt, &bad_com, &proof));

        // test: bad proof
        let bad_proof = corrupt_proof(&proof);
        assert!(!zkp.verify_range_proof(stmt, &com, &bad_proof));

        // test: bad witness
        let bad_wit = &Witness {
            msg: &(*wit.msg + k256::Scalar::ONE),
            ..*wit
        };
        let (bad_wit_com, bad_wit_proof) = zkp.range_proof(rng, stmt, bad_wit);
        assert!(!zkp.verify_range_proof(stmt, &bad_wit_com, &bad_wit_proof));
    }

    #[test]
    #[traced_test]
    fn fixed_witnesses() {
        let rng = &mut rand::thread_rng();

        let (ek, _dk) = &keygen_unsafe(rng).unwrap();
        let (zkp, _) = ZkSetup::new_unsafe(rng).unwrap();

        // encrypt m = 42 with fixed r
        let msg = &k256::Scalar::from(42u64);
        let randomness = &Randomness::from_be_bytes(&[7]);
        let ciphertext = &ek.encrypt_with_randomness(&Plaintext::from_scalar(msg), randomness);

        let stmt = &Statement { ciphertext, ek };
        let wit = &Witness { msg, randomness };

        let rv = || {
            CommitmentRandomness::from_material(
                Plaintext::from_be_bytes(&[5]),
                Randomness::from_be_bytes(&[9]),
                Randomness::from_be_bytes(&[0x03, 0xe8]),
                Randomness::from_be_bytes(&[0x01, 0x02]),
            )
        };

        let com = zkp.range_commit_with_randomness(ek, msg, &rv());
        let e = zkp.range_challenge(stmt, &com);
        let proof = zkp.range_prove(ek, wit, rv(), &e);

        assert!(zkp.range_verify(stmt, &com, &e, &proof));
        assert!(zkp.verify_range_proof(stmt, &com, &proof));

        // outputs are bit-identical across runs with the same material
        let com_again = zkp.range_commit_with_randomness(ek, msg, &rv());
        assert_eq!(com_again.to_octets(), com.to_octets());
        let e_again = zkp.range_challenge(stmt, &com_again);
        assert_eq!(e_again, e);
        let proof_again = zkp.range_prove(ek, wit, rv(), &e_again);
        assert_eq!(proof_again.to_octets(), proof.to_octets());

        // tampered s1: replace s1 with s1 + 1
        let tampered = Proof {
            s1: Plaintext(proof.s1.0.clone() + BigNumber::one()),
            ..proof.clone()
        };
        assert!(!zkp.range_verify(stmt, &com, &e, &tampered));

        // s1 forced above q^3
        let oversized = Proof {
            s1: Plaintext(crate::paillier::zk::secp256k1_modulus_cubed() + &proof.s1.0),
            ..proof
        };
        assert!(!zkp.range_verify(stmt, &com, &e, &oversized));
    }

    #[test]
    fn octets_round_trip() {
        let rng = &mut rand::thread_rng();

        let (ek, _dk) = &keygen_unsafe(rng).unwrap();
        let msg = &k256::Scalar::random(&mut *rng);
        let (ciphertext, randomness) = &ek.encrypt(rng, &Plaintext::from_scalar(msg));
        let stmt = &Statement { ciphertext, ek };
        let wit = &Witness { msg, randomness };
        let (zkp, _) = ZkSetup::new_unsafe(rng).unwrap();

        let (com, proof) = zkp.range_proof(rng, stmt, wit);

        let com_bytes = com.to_octets();
        let proof_bytes = proof.to_octets();
        assert_eq!(Commitment::from_octets(&com_bytes).unwrap(), com);
        assert_eq!(Proof::from_octets(&proof_bytes).unwrap(), proof);

        // length-strict ingest
        assert!(Commitment::from_octets(&com_bytes[1..]).is_err());
        assert!(Proof::from_octets(&[proof_bytes.clone(), vec![0]].concat()).is_err());

        // the decoded proof still verifies
        assert!(zkp.verify_range_proof(
            stmt,
            &Commitment::from_octets(&com_bytes).unwrap(),
            &Proof::from_octets(&proof_bytes).unwrap(),
        ));
    }

    #[test]
    fn seeded_rng_determinism() {
        use rand::SeedableRng;
        use rand_chacha::ChaCha20Rng;

        let rng = &mut rand::thread_rng();

        let (ek, _dk) = &keygen_unsafe(rng).unwrap();
        let (zkp, _) = ZkSetup::new_unsafe(rng).unwrap();
        let msg = &k256::Scalar::random(&mut *rng);

        // identical seeds draw identical commitment randomness
        let (com1, _) = zkp.range_commit(&mut ChaCha20Rng::seed_from_u64(42), ek, msg);
        let (com2, _) = zkp.range_commit(&mut ChaCha20Rng::seed_from_u64(42), ek, msg);
        assert_eq!(com1.to_octets(), com2.to_octets());

        let (com3, _) = zkp.range_commit(&mut ChaCha20Rng::seed_from_u64(43), ek, msg);
        assert_ne!(com1.to_octets(), com3.to_octets());
    }

    #[test]
    fn randomness_kill() {
        let rng = &mut rand::thread_rng();

        let (ek, _dk) = &keygen_unsafe(rng).unwrap();
        let (zkp, _) = ZkSetup::new_unsafe(rng).unwrap();

        let mut rv = CommitmentRandomness::sample(rng, &zkp, ek);
        rv.kill();

        assert_eq!(rv.alpha.0, BigNumber::zero());
        assert_eq!(rv.beta.0, BigNumber::zero());
        assert_eq!(rv.gamma.0, BigNumber::zero());
        assert_eq!(rv.rho.0, BigNumber::zero());
    }
}
