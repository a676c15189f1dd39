//! Utility functions not uniquely related to DLC

use bitcoin::hashes::Hash;
use bitcoin::script::{Builder, PushBytes};
use bitcoin::sighash::SighashCache;
use bitcoin::{Amount, EcdsaSighashType, Script, ScriptBuf, Sequence, Transaction, TxOut, Witness};
use secp256k1_zkp::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey, Signing};
use std::convert::TryFrom;

use crate::Error;

// Setting the nSequence for every input of a transaction to this value disables
// both RBF and nLockTime usage.
pub(crate) const DISABLE_LOCKTIME: Sequence = Sequence(0xffffffff);
// Setting the nSequence for every input of a transaction to this value disables
// RBF but enables nLockTime usage.
pub(crate) const ENABLE_LOCKTIME: Sequence = Sequence(0xfffffffe);

/// Maximum fee rate (in sats per vbyte) accepted for contract transactions.
const MAX_FEE_RATE_PER_VB: u64 = 25 * 250;

/// Get a BIP143 (https://github.com/bitcoin/bips/blob/master/bip-0143.mediawiki)
/// signature hash with sighash all flag for a segwit transaction input as
/// a Message instance
pub(crate) fn get_sig_hash_msg(
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    value: Amount,
) -> Result<Message, Error> {
    let sig_hash = SighashCache::new(tx)
        .p2wsh_signature_hash(input_index, script_pubkey, value, EcdsaSighashType::All)
        .map_err(|e| Error::Sighash(e.to_string()))?;
    Ok(Message::from_digest(sig_hash.to_byte_array()))
}

/// Convert a raw signature to DER encoded and append the sighash type, to use
/// a signature in a signature script
pub(crate) fn finalize_sig(sig: &Signature, sig_hash_type: EcdsaSighashType) -> Vec<u8> {
    [
        sig.serialize_der().as_ref(),
        &[sig_hash_type.to_u32() as u8],
    ]
    .concat()
}

/// Generate a signature for a given transaction input using the given secret key.
pub fn get_raw_sig_for_tx_input<C: Signing>(
    secp: &Secp256k1<C>,
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    value: Amount,
    sk: &SecretKey,
) -> Result<Signature, Error> {
    let sig_hash_msg = get_sig_hash_msg(tx, input_index, script_pubkey, value)?;
    Ok(secp.sign_ecdsa_low_r(&sig_hash_msg, sk))
}

/// Returns a DER encoded signature with appended sighash for the specified input
/// in the provided transaction (assumes a segwit input)
pub fn get_sig_for_tx_input<C: Signing>(
    secp: &Secp256k1<C>,
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    value: Amount,
    sig_hash_type: EcdsaSighashType,
    sk: &SecretKey,
) -> Result<Vec<u8>, Error> {
    let sig = get_raw_sig_for_tx_input(secp, tx, input_index, script_pubkey, value, sk)?;
    Ok(finalize_sig(&sig, sig_hash_type))
}

/// Returns a DER encoded signature with apended sighash for the specified P2WPKH input.
pub fn get_sig_for_p2wpkh_input<C: Signing>(
    secp: &Secp256k1<C>,
    sk: &SecretKey,
    tx: &Transaction,
    input_index: usize,
    value: Amount,
    sig_hash_type: EcdsaSighashType,
) -> Result<Vec<u8>, Error> {
    let script_code = get_pkh_script_pubkey_from_sk(secp, sk);
    get_sig_for_tx_input(
        secp,
        tx,
        input_index,
        &script_code,
        value,
        sig_hash_type,
        sk,
    )
}

/// Computes the fee for a transaction (or a share of it) of the given weight,
/// rounding the virtual size up.
pub fn weight_to_fee(weight: usize, fee_rate: u64) -> Result<Amount, Error> {
    let vsize = (weight as u64 + 3) / 4;
    vsize
        .checked_mul(fee_rate)
        .map(Amount::from_sat)
        .ok_or(Error::InvalidArgument)
}

// The BIP143 script code of a P2WPKH output is the equivalent P2PKH script.
fn get_pkh_script_pubkey_from_sk<C: Signing>(secp: &Secp256k1<C>, sk: &SecretKey) -> ScriptBuf {
    let pk = bitcoin::PublicKey::new(PublicKey::from_secret_key(secp, sk));
    ScriptBuf::new_p2pkh(&pk.pubkey_hash())
}

/// Create a signature for a p2wpkh transaction input using the provided secret key
/// and places the signature and associated public key on the witness stack.
pub fn sign_p2wpkh_input<C: Signing>(
    secp: &Secp256k1<C>,
    sk: &SecretKey,
    tx: &mut Transaction,
    input_index: usize,
    sig_hash_type: EcdsaSighashType,
    value: Amount,
) -> Result<(), Error> {
    let witness = get_witness_for_p2wpkh_input(secp, sk, tx, input_index, sig_hash_type, value)?;
    let input = tx
        .input
        .get_mut(input_index)
        .ok_or(Error::InvalidArgument)?;
    input.witness = witness;
    Ok(())
}

/// Generates the witness data for a P2WPKH input using the provided secret key.
pub fn get_witness_for_p2wpkh_input<C: Signing>(
    secp: &Secp256k1<C>,
    sk: &SecretKey,
    tx: &Transaction,
    input_index: usize,
    sig_hash_type: EcdsaSighashType,
    value: Amount,
) -> Result<Witness, Error> {
    let full_sig = get_sig_for_p2wpkh_input(secp, sk, tx, input_index, value, sig_hash_type)?;
    Ok(Witness::from_slice(&[
        full_sig,
        PublicKey::from_secret_key(secp, sk).serialize().to_vec(),
    ]))
}

/// Transforms a redeem script for a p2sh-p2w* output to a script signature.
pub fn redeem_script_to_script_sig(redeem: &Script) -> Result<ScriptBuf, Error> {
    if redeem.is_empty() {
        return Ok(ScriptBuf::new());
    }

    let push = <&PushBytes>::try_from(redeem.as_bytes()).map_err(|_| Error::InvalidArgument)?;
    Ok(Builder::new().push_slice(push).into_script())
}

/// Get the vout and TxOut of the first output with a matching `script_pubkey`
/// if any.
pub fn get_output_for_script_pubkey<'a>(
    tx: &'a Transaction,
    script_pubkey: &Script,
) -> Option<(usize, &'a TxOut)> {
    tx.output
        .iter()
        .enumerate()
        .find(|(_, x)| x.script_pubkey.as_script() == script_pubkey)
}

/// Filters the outputs that have a value lower than the given `dust_limit`.
pub(crate) fn discard_dust(txs: Vec<TxOut>, dust_limit: Amount) -> Vec<TxOut> {
    txs.into_iter().filter(|x| x.value >= dust_limit).collect()
}

/// Returns the sequence to use for inputs of a transaction with the given lock time.
pub fn get_sequence(lock_time: u32) -> Sequence {
    if lock_time == 0 {
        DISABLE_LOCKTIME
    } else {
        ENABLE_LOCKTIME
    }
}

/// Validate that the fee rate is not too high
pub fn validate_fee_rate(fee_rate_per_vb: u64) -> Result<(), Error> {
    if fee_rate_per_vb > MAX_FEE_RATE_PER_VB {
        return Err(Error::InvalidArgument);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{absolute::LockTime, transaction::Version, OutPoint, TxIn};
    use secp256k1_zkp::{rand::thread_rng, SECP256K1};

    #[test]
    fn weight_to_fee_rounds_up() {
        assert_eq!(Amount::from_sat(10), weight_to_fee(4, 10).unwrap());
        assert_eq!(Amount::from_sat(20), weight_to_fee(5, 10).unwrap());
        assert_eq!(Amount::ZERO, weight_to_fee(0, 10).unwrap());
        assert!(weight_to_fee(8, u64::MAX).is_err());
    }

    #[test]
    fn sequence_depends_on_lock_time() {
        assert_eq!(DISABLE_LOCKTIME, get_sequence(0));
        assert_eq!(ENABLE_LOCKTIME, get_sequence(1));
    }

    #[test]
    fn validate_fee_rate_test() {
        assert!(validate_fee_rate(MAX_FEE_RATE_PER_VB).is_ok());
        assert!(validate_fee_rate(MAX_FEE_RATE_PER_VB + 1).is_err());
    }

    #[test]
    fn empty_redeem_script_gives_empty_script_sig() {
        assert!(redeem_script_to_script_sig(&ScriptBuf::new())
            .unwrap()
            .is_empty());
        let redeem = ScriptBuf::from_bytes(vec![0x00, 0x14, 0x01, 0x02]);
        // One push opcode followed by the script bytes.
        assert_eq!(
            redeem.len() + 1,
            redeem_script_to_script_sig(&redeem).unwrap().len()
        );
    }

    #[test]
    fn p2wpkh_witness_has_signature_and_pubkey() {
        let sk = SecretKey::new(&mut thread_rng());
        let mut tx = Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn::default()],
            output: vec![TxOut {
                value: Amount::from_sat(5000),
                script_pubkey: ScriptBuf::new(),
            }],
        };
        tx.input[0].previous_output = OutPoint::null();

        sign_p2wpkh_input(
            SECP256K1,
            &sk,
            &mut tx,
            0,
            EcdsaSighashType::All,
            Amount::from_sat(10000),
        )
        .unwrap();

        let witness = &tx.input[0].witness;
        assert_eq!(2, witness.len());
        assert_eq!(
            Some(&PublicKey::from_secret_key(SECP256K1, &sk).serialize()[..]),
            witness.nth(1)
        );
        assert!(sign_p2wpkh_input(
            SECP256K1,
            &sk,
            &mut tx,
            3,
            EcdsaSighashType::All,
            Amount::from_sat(10000),
        )
        .is_err());
    }
}
