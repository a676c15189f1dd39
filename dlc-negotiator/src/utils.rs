//! Utility functions used while negotiating contracts.

use crate::error::Error;
use crate::ContractId;
use bitcoin::hashes::Hash;
use bitcoin::{Amount, Txid};
use dlc::util::weight_to_fee;
use dlc::{
    CET_BASE_WEIGHT, FUND_TX_BASE_WEIGHT, OUTPUT_BASE_WEIGHT, P2WPKH_WITNESS_SIZE,
    TX_INPUT_BASE_WEIGHT,
};
use secp256k1_zkp::rand::{thread_rng, Rng, RngCore};

// Length of a P2WPKH script pubkey.
const P2WPKH_SPK_LEN: usize = 22;

/// Estimates the fees a party pays for its share of the fund transaction and of
/// a CET, assuming `nb_inputs` P2WPKH inputs and P2WPKH change and payout
/// outputs.
pub fn get_own_fee(fee_rate_per_vb: u64, nb_inputs: usize) -> Result<Amount, Error> {
    let inputs_weight = (TX_INPUT_BASE_WEIGHT + P2WPKH_WITNESS_SIZE) * nb_inputs;
    let change_weight = P2WPKH_SPK_LEN * 4 + OUTPUT_BASE_WEIGHT;
    let fund_fee = weight_to_fee(
        FUND_TX_BASE_WEIGHT / 2 + inputs_weight + change_weight,
        fee_rate_per_vb,
    )?;
    let cet_fee = weight_to_fee(CET_BASE_WEIGHT / 2 + P2WPKH_SPK_LEN * 4, fee_rate_per_vb)?;

    fund_fee
        .checked_add(cet_fee)
        .ok_or_else(|| Error::InvalidParameters("Fee overflow.".to_string()))
}

pub(crate) fn get_new_serial_id() -> u64 {
    thread_rng().next_u64()
}

pub(crate) fn get_new_temporary_id() -> ContractId {
    thread_rng().gen::<[u8; 32]>()
}

/// Returns the hex representation of a contract id, prefixed with `0x`.
pub fn get_contract_id_string(contract_id: &ContractId) -> String {
    let mut string_id = String::with_capacity(32 * 2 + 2);
    string_id.push_str("0x");
    for i in contract_id {
        string_id.push_str(&std::format!("{:02x}", i));
    }

    string_id
}

/// Computes the id of a contract from its fund transaction, as specified in
/// <https://github.com/discreetlogcontracts/dlcspecs/blob/master/Protocol.md#requirements-2>
pub fn compute_id(
    fund_tx_id: Txid,
    fund_output_index: u16,
    temporary_id: &ContractId,
) -> ContractId {
    let mut res = [0; 32];
    let txid_bytes = fund_tx_id.to_byte_array();
    for i in 0..32 {
        res[i] = txid_bytes[31 - i] ^ temporary_id[i];
    }

    res[30] ^= ((fund_output_index >> 8) & 0xff) as u8;
    res[31] ^= (fund_output_index & 0xff) as u8;

    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlc::PartyParams;

    #[test]
    fn own_fee_matches_change_computation() {
        let pk = secp256k1_zkp::PublicKey::from_secret_key(
            secp256k1_zkp::SECP256K1,
            &secp256k1_zkp::SecretKey::from_slice(&[1; 32]).unwrap(),
        );
        let spk =
            bitcoin::ScriptBuf::new_p2wpkh(&bitcoin::CompressedPublicKey(pk).wpubkey_hash());
        let input = dlc::TxInputInfo {
            outpoint: bitcoin::OutPoint::default(),
            max_witness_len: P2WPKH_WITNESS_SIZE,
            redeem_script: bitcoin::ScriptBuf::new(),
            serial_id: 0,
        };
        let params = PartyParams {
            fund_pubkey: pk,
            change_script_pubkey: spk.clone(),
            change_serial_id: 0,
            payout_script_pubkey: spk,
            payout_serial_id: 0,
            inputs: vec![input.clone(), input],
            input_amount: Amount::from_sat(100_000),
            collateral: Amount::from_sat(50_000),
        };

        let (change, fund_fee, cet_fee) = params.get_change_output_and_fees(4).unwrap();

        assert_eq!(fund_fee + cet_fee, get_own_fee(4, 2).unwrap());
        assert_eq!(
            Amount::from_sat(50_000) - get_own_fee(4, 2).unwrap(),
            change.value
        );
    }

    #[test]
    fn own_fee_grows_with_inputs() {
        assert!(get_own_fee(10, 1).unwrap() < get_own_fee(10, 2).unwrap());
        assert_eq!(Amount::ZERO, get_own_fee(0, 2).unwrap());
    }

    #[test]
    fn compute_id_test() {
        let txid = Txid::from_byte_array([1; 32]);
        let temporary_id = [3u8; 32];

        let id = compute_id(txid, 0x0102, &temporary_id);

        assert_eq!([2u8; 30], id[..30]);
        assert_eq!(2 ^ 1, id[30]);
        assert_eq!(2 ^ 2, id[31]);
    }

    #[test]
    fn contract_id_string_test() {
        let mut id = [0u8; 32];
        id[0] = 0xab;
        id[31] = 0x01;

        let s = get_contract_id_string(&id);

        assert_eq!(66, s.len());
        assert!(s.starts_with("0xab00"));
        assert!(s.ends_with("0001"));
    }

    #[test]
    fn temporary_ids_are_random() {
        assert_ne!(get_new_temporary_id(), get_new_temporary_id());
    }
}
