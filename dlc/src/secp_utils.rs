//! Crypto utilities providing necessary DLC specific functions not available in
//! rust-secp256k1 or rust-secp256k1-zkp.

use crate::Error;
use bitcoin::hashes::{sha256, Hash, HashEngine};
use secp256k1_zkp::{Message, Parity, PublicKey, Scalar, Secp256k1, Verification, XOnlyPublicKey};

const BIP340_CHALLENGE_TAG: &[u8] = b"BIP0340/challenge";

/// Compute a signature point for the given public key, nonce and message.
/// The point is `R + H(R || P || m) * P`, that is the public counterpart of the
/// `s` value of the BIP340 signature the oracle will publish for `message`.
pub fn schnorrsig_compute_sig_point<C: Verification>(
    secp: &Secp256k1<C>,
    pubkey: &XOnlyPublicKey,
    nonce: &XOnlyPublicKey,
    message: &Message,
) -> Result<PublicKey, Error> {
    let hash = create_schnorr_hash(message, nonce, pubkey);
    let tweak = Scalar::from_be_bytes(hash).map_err(|_| Error::InvalidArgument)?;
    let pk = pubkey.public_key(Parity::Even).mul_tweak(secp, &tweak)?;
    let npk = nonce.public_key(Parity::Even);
    Ok(npk.combine(&pk)?)
}

fn create_schnorr_hash(msg: &Message, nonce: &XOnlyPublicKey, pubkey: &XOnlyPublicKey) -> [u8; 32] {
    let tag_hash = sha256::Hash::hash(BIP340_CHALLENGE_TAG);
    let mut engine = sha256::Hash::engine();
    engine.input(tag_hash.as_byte_array());
    engine.input(tag_hash.as_byte_array());
    engine.input(&nonce.serialize());
    engine.input(&pubkey.serialize());
    engine.input(&msg[..]);
    sha256::Hash::from_engine(engine).to_byte_array()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secp256k1_zkp::{rand::thread_rng, Keypair, SecretKey, SECP256K1};

    #[test]
    fn sig_point_matches_signature_scalar() {
        let oracle_kp = Keypair::new(SECP256K1, &mut thread_rng());
        let nonce_kp = Keypair::new(SECP256K1, &mut thread_rng());
        let msg = Message::from_digest(sha256::Hash::hash(b"1").to_byte_array());

        let (oracle_pk, _) = oracle_kp.x_only_public_key();
        let (nonce_pk, _) = nonce_kp.x_only_public_key();

        // Even-y secret keys matching the x-only public keys.
        let even_sk = |kp: &Keypair| {
            let sk = SecretKey::from_keypair(kp);
            if kp.x_only_public_key().1 == Parity::Odd {
                sk.negate()
            } else {
                sk
            }
        };
        let x = even_sk(&oracle_kp);
        let k = even_sk(&nonce_kp);

        let e = Scalar::from_be_bytes(create_schnorr_hash(&msg, &nonce_pk, &oracle_pk)).unwrap();
        let s = x.mul_tweak(&e).unwrap().add_tweak(&Scalar::from(k)).unwrap();

        let expected = PublicKey::from_secret_key(SECP256K1, &s);
        let computed =
            schnorrsig_compute_sig_point(SECP256K1, &oracle_pk, &nonce_pk, &msg).unwrap();

        assert_eq!(expected, computed);
    }

    #[test]
    fn sig_point_depends_on_message() {
        let oracle_kp = Keypair::new(SECP256K1, &mut thread_rng());
        let nonce_kp = Keypair::new(SECP256K1, &mut thread_rng());
        let msg0 = Message::from_digest(sha256::Hash::hash(b"0").to_byte_array());
        let msg1 = Message::from_digest(sha256::Hash::hash(b"1").to_byte_array());
        let (oracle_pk, _) = oracle_kp.x_only_public_key();
        let (nonce_pk, _) = nonce_kp.x_only_public_key();

        assert_ne!(
            schnorrsig_compute_sig_point(SECP256K1, &oracle_pk, &nonce_pk, &msg0).unwrap(),
            schnorrsig_compute_sig_point(SECP256K1, &oracle_pk, &nonce_pk, &msg1).unwrap()
        );
    }
}
