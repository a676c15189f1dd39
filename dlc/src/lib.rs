//! # Rust DLC Library
//! Library for creating, signing and verifying transactions for the
//! Discreet Log Contract protocol.
//!

#![crate_name = "dlc"]
// Coding conventions
#![forbid(unsafe_code)]
#![deny(non_upper_case_globals)]
#![deny(non_camel_case_types)]
#![deny(non_snake_case)]
#![deny(unused_mut)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(missing_docs)]

extern crate bitcoin;
extern crate secp256k1_zkp;
#[cfg(feature = "use-serde")]
extern crate serde;

use bitcoin::absolute::LockTime;
use bitcoin::opcodes;
use bitcoin::script::Builder;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Script, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};
use secp256k1_zkp::ecdsa::Signature;
use secp256k1_zkp::{
    EcdsaAdaptorSignature, Message, PublicKey, Secp256k1, SecretKey, Signing, Verification,
    XOnlyPublicKey,
};
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod secp_utils;
pub mod serial_id;
pub mod util;

use serial_id::SerialIdOrderer;

/// Minimum value that can be included in a transaction output. Under this value,
/// outputs are discarded
/// See: https://github.com/discreetlogcontracts/dlcspecs/blob/master/Transactions.md#change-outputs
const DUST_LIMIT: Amount = Amount::from_sat(1000);

/// The transaction version
/// See: https://github.com/discreetlogcontracts/dlcspecs/blob/master/Transactions.md#funding-transaction
const TX_VERSION: Version = Version::TWO;

/// The base weight of a fund transaction
/// See: https://github.com/discreetlogcontracts/dlcspecs/blob/master/Transactions.md#fees
pub const FUND_TX_BASE_WEIGHT: usize = 214;

/// The weight of a CET excluding payout outputs
/// See: https://github.com/discreetlogcontracts/dlcspecs/blob/master/Transactions.md#fees
pub const CET_BASE_WEIGHT: usize = 500;

/// The base weight of a transaction input computed as: (outpoint(36) + sequence(4) + scriptPubKeySize(1)) * 4
/// See: https://github.com/discreetlogcontracts/dlcspecs/blob/master/Transactions.md#fees
pub const TX_INPUT_BASE_WEIGHT: usize = 164;

/// The witness size of a P2WPKH input
/// See: https://github.com/discreetlogcontracts/dlcspecs/blob/master/Transactions.md#fees
pub const P2WPKH_WITNESS_SIZE: usize = 107;

/// Weight of the value and script length prefix of an output.
/// See: https://github.com/discreetlogcontracts/dlcspecs/blob/master/Transactions.md#fees
pub const OUTPUT_BASE_WEIGHT: usize = 36;

/// Represents the payouts for a unique contract outcome. Offer party represents
/// the initiator of the contract while accept party represents the party
/// accepting the contract.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct Payout {
    /// Payout for the offering party
    pub offer: Amount,
    /// Payout for the accepting party
    pub accept: Amount,
}

#[derive(Eq, PartialEq, Debug, Clone)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
/// Representation of a set of contiguous outcomes that share a single payout.
pub struct RangePayout {
    /// The start of the range
    pub start: usize,
    /// The number of outcomes in the range
    pub count: usize,
    /// The payout associated with all outcomes
    pub payout: Payout,
}

/// Representation of a payout for an enumeration outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct EnumerationPayout {
    /// The outcome value (prior to hashing)
    pub outcome: String,
    /// The corresponding payout
    pub payout: Payout,
}

/// Contains the necessary transactions for establishing a DLC
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DlcTransactions {
    /// The fund transaction locking both parties collaterals
    pub fund: Transaction,
    /// The contract execution transactions for closing the contract on a
    /// certain outcome
    pub cets: Vec<Transaction>,
    /// The refund transaction for returning the collateral for each party in
    /// case of an oracle misbehavior
    pub refund: Transaction,

    /// The script pubkey of the fund output in the fund transaction
    pub funding_script_pubkey: ScriptBuf,
}

impl DlcTransactions {
    /// Get the fund output in the fund transaction
    pub fn get_fund_output(&self) -> Result<&TxOut, Error> {
        let v0_witness_fund_script = self.funding_script_pubkey.to_p2wsh();
        util::get_output_for_script_pubkey(&self.fund, &v0_witness_fund_script)
            .map(|x| x.1)
            .ok_or(Error::InvalidArgument)
    }

    /// Get the index of the fund output in the fund transaction
    pub fn get_fund_output_index(&self) -> Result<usize, Error> {
        let v0_witness_fund_script = self.funding_script_pubkey.to_p2wsh();
        util::get_output_for_script_pubkey(&self.fund, &v0_witness_fund_script)
            .map(|x| x.0)
            .ok_or(Error::InvalidArgument)
    }
}

/// Contains info about a utxo used for funding a DLC contract
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct TxInputInfo {
    /// The outpoint for the utxo
    pub outpoint: OutPoint,
    /// The maximum witness length
    pub max_witness_len: usize,
    /// The redeem script
    pub redeem_script: ScriptBuf,
    /// The serial id for the input that will be used for ordering inputs of
    /// the fund transaction
    pub serial_id: u64,
}

/// Structure containing oracle information for a single event.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct OracleInfo {
    /// The public key of the oracle.
    pub public_key: XOnlyPublicKey,
    /// The nonces that the oracle will use to attest to the event.
    pub nonces: Vec<XOnlyPublicKey>,
}

/// An error code.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Error {
    /// Secp256k1 error
    Secp256k1(secp256k1_zkp::Error),
    /// An invalid argument was provided
    InvalidArgument,
    /// A signature hash could not be computed for a transaction input
    Sighash(String),
}

impl From<secp256k1_zkp::Error> for Error {
    fn from(error: secp256k1_zkp::Error) -> Error {
        Error::Secp256k1(error)
    }
}

impl From<secp256k1_zkp::UpstreamError> for Error {
    fn from(error: secp256k1_zkp::UpstreamError) -> Error {
        Error::Secp256k1(secp256k1_zkp::Error::Upstream(error))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Secp256k1(ref e) => write!(f, "Secp256k1 error {}", e),
            Error::InvalidArgument => write!(f, "Invalid argument"),
            Error::Sighash(ref e) => write!(f, "Error computing signature hash: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Secp256k1(e) => Some(e),
            Error::InvalidArgument | Error::Sighash(_) => None,
        }
    }
}

/// Contains the parameters required for creating DLC transactions for a single
/// party. Specifically these are the common fields between Offer and Accept
/// messages.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PartyParams {
    /// The public key for the fund multisig script
    pub fund_pubkey: PublicKey,
    /// An address to receive change
    pub change_script_pubkey: ScriptBuf,
    /// Id used to order fund outputs
    pub change_serial_id: u64,
    /// An address to receive the outcome amount
    pub payout_script_pubkey: ScriptBuf,
    /// Id used to order CET outputs
    pub payout_serial_id: u64,
    /// A list of inputs to fund the contract
    pub inputs: Vec<TxInputInfo>,
    /// The sum of the inputs values.
    pub input_amount: Amount,
    /// The collateral put in the contract by the party
    pub collateral: Amount,
}

impl PartyParams {
    /// Returns the change output for a single party as well as the fees that
    /// they are required to pay for the fund transaction and the cet or refund transaction.
    /// The change output value already accounts for the required fees.
    /// If input amount (sum of all input values) is lower than the sum of the collateral
    /// plus the required fees, an error is returned.
    pub fn get_change_output_and_fees(
        &self,
        fee_rate_per_vb: u64,
    ) -> Result<(TxOut, Amount, Amount), Error> {
        let mut inputs_weight: usize = 0;
        for input in &self.inputs {
            let script_size = util::redeem_script_to_script_sig(&input.redeem_script)?.len();
            // Base tx input weight + redeem script weight (*4 because non witness)
            // + max witness weight (*1 because witness)
            inputs_weight += TX_INPUT_BASE_WEIGHT + 4 * script_size + input.max_witness_len;
        }

        // Change size is scaled by 4 from vBytes to weight units
        let change_weight = self.change_script_pubkey.len() * 4 + OUTPUT_BASE_WEIGHT;

        // Base weight (nLocktime, nVersion, ...) is distributed among parties
        // independently of inputs contributed
        let this_party_fund_base_weight = FUND_TX_BASE_WEIGHT / 2;

        let total_fund_weight = this_party_fund_base_weight + inputs_weight + change_weight;
        let fund_fee = util::weight_to_fee(total_fund_weight, fee_rate_per_vb)?;

        // Base weight (nLocktime, nVersion, funding input ...) is distributed
        // among parties independently of output types
        let this_party_cet_base_weight = CET_BASE_WEIGHT / 2;

        let output_spk_weight = self.payout_script_pubkey.len() * 4;
        let total_cet_weight = this_party_cet_base_weight + output_spk_weight;
        let cet_or_refund_fee = util::weight_to_fee(total_cet_weight, fee_rate_per_vb)?;

        let required_input_funds = self
            .collateral
            .checked_add(fund_fee)
            .and_then(|x| x.checked_add(cet_or_refund_fee))
            .ok_or(Error::InvalidArgument)?;
        if self.input_amount < required_input_funds {
            return Err(Error::InvalidArgument);
        }

        let change_output = TxOut {
            value: self.input_amount - required_input_funds,
            script_pubkey: self.change_script_pubkey.clone(),
        };

        Ok((change_output, fund_fee, cet_or_refund_fee))
    }

    fn get_unsigned_tx_inputs_and_serial_ids(
        &self,
        sequence: Sequence,
    ) -> Result<(Vec<TxIn>, Vec<u64>), Error> {
        let mut tx_ins = Vec::with_capacity(self.inputs.len());
        let mut serial_ids = Vec::with_capacity(self.inputs.len());

        for input in &self.inputs {
            let tx_in = TxIn {
                previous_output: input.outpoint,
                script_sig: util::redeem_script_to_script_sig(&input.redeem_script)?,
                sequence,
                witness: Witness::new(),
            };
            tx_ins.push(tx_in);
            serial_ids.push(input.serial_id);
        }

        Ok((tx_ins, serial_ids))
    }
}

/// Create the transactions for a DLC contract based on the provided parameters
#[allow(clippy::too_many_arguments)]
pub fn create_dlc_transactions(
    offer_params: &PartyParams,
    accept_params: &PartyParams,
    payouts: &[Payout],
    refund_lock_time: u32,
    fee_rate_per_vb: u64,
    fund_lock_time: u32,
    cet_lock_time: u32,
    fund_output_serial_id: u64,
) -> Result<DlcTransactions, Error> {
    let total_collateral = offer_params
        .collateral
        .checked_add(accept_params.collateral)
        .ok_or(Error::InvalidArgument)?;

    let has_proper_outcomes = payouts
        .iter()
        .all(|o| o.offer.checked_add(o.accept) == Some(total_collateral));

    if !has_proper_outcomes {
        return Err(Error::InvalidArgument);
    }

    let (offer_change_output, _, offer_cet_fee) =
        offer_params.get_change_output_and_fees(fee_rate_per_vb)?;
    let (accept_change_output, _, accept_cet_fee) =
        accept_params.get_change_output_and_fees(fee_rate_per_vb)?;

    let fund_output_value = total_collateral + offer_cet_fee + accept_cet_fee;

    let fund_sequence = util::get_sequence(fund_lock_time);
    let (offer_tx_ins, offer_inputs_serial_ids) =
        offer_params.get_unsigned_tx_inputs_and_serial_ids(fund_sequence)?;
    let (accept_tx_ins, accept_inputs_serial_ids) =
        accept_params.get_unsigned_tx_inputs_and_serial_ids(fund_sequence)?;

    let funding_script_pubkey =
        make_funding_redeemscript(&offer_params.fund_pubkey, &accept_params.fund_pubkey);

    let fund_tx = create_funding_transaction(
        &funding_script_pubkey,
        fund_output_value,
        &offer_tx_ins,
        &offer_inputs_serial_ids,
        &accept_tx_ins,
        &accept_inputs_serial_ids,
        offer_change_output,
        offer_params.change_serial_id,
        accept_change_output,
        accept_params.change_serial_id,
        fund_output_serial_id,
        fund_lock_time,
    )?;

    let (fund_vout, _) =
        util::get_output_for_script_pubkey(&fund_tx, &funding_script_pubkey.to_p2wsh())
            .ok_or(Error::InvalidArgument)?;

    let fund_tx_in = TxIn {
        previous_output: OutPoint {
            txid: fund_tx.compute_txid(),
            vout: fund_vout as u32,
        },
        witness: Witness::new(),
        script_sig: ScriptBuf::new(),
        sequence: util::get_sequence(cet_lock_time),
    };

    let cets = create_cets(
        &fund_tx_in,
        &offer_params.payout_script_pubkey,
        offer_params.payout_serial_id,
        &accept_params.payout_script_pubkey,
        accept_params.payout_serial_id,
        payouts,
        cet_lock_time,
    );

    let offer_refund_output = TxOut {
        value: offer_params.collateral,
        script_pubkey: offer_params.payout_script_pubkey.clone(),
    };

    let accept_refund_ouput = TxOut {
        value: accept_params.collateral,
        script_pubkey: accept_params.payout_script_pubkey.clone(),
    };

    let refund_tx = create_refund_transaction(
        offer_refund_output,
        accept_refund_ouput,
        fund_tx_in,
        refund_lock_time,
    );

    Ok(DlcTransactions {
        fund: fund_tx,
        cets,
        refund: refund_tx,
        funding_script_pubkey,
    })
}

/// Create a contract execution transaction
pub fn create_cet(
    offer_output: TxOut,
    offer_payout_serial_id: u64,
    accept_output: TxOut,
    accept_payout_serial_id: u64,
    fund_tx_in: &TxIn,
    lock_time: u32,
) -> Transaction {
    let output: Vec<TxOut> = if offer_payout_serial_id < accept_payout_serial_id {
        vec![offer_output, accept_output]
    } else {
        vec![accept_output, offer_output]
    };

    Transaction {
        version: TX_VERSION,
        lock_time: LockTime::from_consensus(lock_time),
        input: vec![fund_tx_in.clone()],
        output: util::discard_dust(output, DUST_LIMIT),
    }
}

/// Create a set of contract execution transaction for each provided outcome
pub fn create_cets(
    fund_tx_input: &TxIn,
    offer_payout_script_pubkey: &Script,
    offer_payout_serial_id: u64,
    accept_payout_script_pubkey: &Script,
    accept_payout_serial_id: u64,
    payouts: &[Payout],
    lock_time: u32,
) -> Vec<Transaction> {
    payouts
        .iter()
        .map(|payout| {
            let offer_output = TxOut {
                value: payout.offer,
                script_pubkey: offer_payout_script_pubkey.to_owned(),
            };
            let accept_output = TxOut {
                value: payout.accept,
                script_pubkey: accept_payout_script_pubkey.to_owned(),
            };
            create_cet(
                offer_output,
                offer_payout_serial_id,
                accept_output,
                accept_payout_serial_id,
                fund_tx_input,
                lock_time,
            )
        })
        .collect()
}

/// Create a funding transaction. Inputs of both parties are interleaved following
/// the ascending order of their serial ids, and so are the fund and change outputs.
#[allow(clippy::too_many_arguments)]
pub fn create_funding_transaction(
    funding_script_pubkey: &Script,
    output_amount: Amount,
    offer_inputs: &[TxIn],
    offer_inputs_serial_ids: &[u64],
    accept_inputs: &[TxIn],
    accept_inputs_serial_ids: &[u64],
    offer_change_output: TxOut,
    offer_change_serial_id: u64,
    accept_change_output: TxOut,
    accept_change_serial_id: u64,
    fund_output_serial_id: u64,
    lock_time: u32,
) -> Result<Transaction, Error> {
    let fund_tx_out = TxOut {
        value: output_amount,
        script_pubkey: funding_script_pubkey.to_p2wsh(),
    };

    let output_serial_ids = [
        fund_output_serial_id,
        offer_change_serial_id,
        accept_change_serial_id,
    ];
    let output_orderer = SerialIdOrderer::new(&output_serial_ids)?;
    let output = util::discard_dust(
        output_orderer.order(
            vec![fund_tx_out, offer_change_output, accept_change_output],
            &output_serial_ids,
        )?,
        DUST_LIMIT,
    );

    let input_serial_ids = [offer_inputs_serial_ids, accept_inputs_serial_ids].concat();
    let input_orderer = SerialIdOrderer::new(&input_serial_ids)?;
    let input = input_orderer.order([offer_inputs, accept_inputs].concat(), &input_serial_ids)?;

    Ok(Transaction {
        version: TX_VERSION,
        lock_time: LockTime::from_consensus(lock_time),
        input,
        output,
    })
}

/// Create a refund transaction
pub fn create_refund_transaction(
    offer_output: TxOut,
    accept_output: TxOut,
    funding_input: TxIn,
    locktime: u32,
) -> Transaction {
    Transaction {
        version: TX_VERSION,
        lock_time: LockTime::from_consensus(locktime),
        input: vec![funding_input],
        output: vec![offer_output, accept_output],
    }
}

/// Create the multisig redeem script for the funding output
pub fn make_funding_redeemscript(a: &PublicKey, b: &PublicKey) -> ScriptBuf {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };

    Builder::new()
        .push_opcode(opcodes::all::OP_PUSHNUM_2)
        .push_key(&bitcoin::PublicKey::new(*first))
        .push_key(&bitcoin::PublicKey::new(*second))
        .push_opcode(opcodes::all::OP_PUSHNUM_2)
        .push_opcode(opcodes::all::OP_CHECKMULTISIG)
        .into_script()
}

fn combine_pubkeys(pubkeys: &[PublicKey]) -> Result<PublicKey, Error> {
    let (first, rest) = pubkeys.split_first().ok_or(Error::InvalidArgument)?;
    Ok(rest.iter().try_fold(*first, |acc, pk| acc.combine(pk))?)
}

/// Get an adaptor point generated using the given oracle information and messages.
/// The i-th message is attested using the i-th nonce of the oracle, so that
/// messages can cover a prefix of the nonces.
pub fn get_adaptor_point_from_oracle_info<C: Verification>(
    secp: &Secp256k1<C>,
    oracle_info: &OracleInfo,
    msgs: &[Message],
) -> Result<PublicKey, Error> {
    if msgs.is_empty() || oracle_info.nonces.len() < msgs.len() {
        return Err(Error::InvalidArgument);
    }

    let sig_points = oracle_info
        .nonces
        .iter()
        .zip(msgs.iter())
        .map(|(nonce, msg)| {
            secp_utils::schnorrsig_compute_sig_point(secp, &oracle_info.public_key, nonce, msg)
        })
        .collect::<Result<Vec<PublicKey>, Error>>()?;
    combine_pubkeys(&sig_points)
}

/// Create an adaptor signature for the given cet using the provided adaptor point.
pub fn create_cet_adaptor_sig_from_point<C: Signing>(
    secp: &Secp256k1<C>,
    cet: &Transaction,
    adaptor_point: &PublicKey,
    funding_sk: &SecretKey,
    funding_script_pubkey: &Script,
    fund_output_value: Amount,
) -> Result<EcdsaAdaptorSignature, Error> {
    let sig_hash = util::get_sig_hash_msg(cet, 0, funding_script_pubkey, fund_output_value)?;

    Ok(EcdsaAdaptorSignature::encrypt(
        secp,
        &sig_hash,
        funding_sk,
        adaptor_point,
    ))
}

/// Create an adaptor signature for the given cet using the provided oracle info.
pub fn create_cet_adaptor_sig_from_oracle_info<C: Signing + Verification>(
    secp: &Secp256k1<C>,
    cet: &Transaction,
    oracle_info: &OracleInfo,
    funding_sk: &SecretKey,
    funding_script_pubkey: &Script,
    fund_output_value: Amount,
    msgs: &[Message],
) -> Result<EcdsaAdaptorSignature, Error> {
    let adaptor_point = get_adaptor_point_from_oracle_info(secp, oracle_info, msgs)?;
    create_cet_adaptor_sig_from_point(
        secp,
        cet,
        &adaptor_point,
        funding_sk,
        funding_script_pubkey,
        fund_output_value,
    )
}

/// Verify that a given adaptor signature for a given cet is valid with respect
/// to an adaptor point.
pub fn verify_cet_adaptor_sig_from_point<C: Verification>(
    secp: &Secp256k1<C>,
    adaptor_sig: &EcdsaAdaptorSignature,
    cet: &Transaction,
    adaptor_point: &PublicKey,
    pubkey: &PublicKey,
    funding_script_pubkey: &Script,
    fund_output_value: Amount,
) -> Result<(), Error> {
    let sig_hash = util::get_sig_hash_msg(cet, 0, funding_script_pubkey, fund_output_value)?;
    adaptor_sig.verify(secp, &sig_hash, pubkey, adaptor_point)?;
    Ok(())
}

/// Verify that a given adaptor signature for a given cet is valid with respect
/// to an oracle public key, nonces and a given set of messages.
#[allow(clippy::too_many_arguments)]
pub fn verify_cet_adaptor_sig_from_oracle_info<C: Verification>(
    secp: &Secp256k1<C>,
    adaptor_sig: &EcdsaAdaptorSignature,
    cet: &Transaction,
    oracle_info: &OracleInfo,
    pubkey: &PublicKey,
    funding_script_pubkey: &Script,
    fund_output_value: Amount,
    msgs: &[Message],
) -> Result<(), Error> {
    let adaptor_point = get_adaptor_point_from_oracle_info(secp, oracle_info, msgs)?;
    verify_cet_adaptor_sig_from_point(
        secp,
        adaptor_sig,
        cet,
        &adaptor_point,
        pubkey,
        funding_script_pubkey,
        fund_output_value,
    )
}

/// Verify a signature for a given transaction input.
pub fn verify_tx_input_sig<V: Verification>(
    secp: &Secp256k1<V>,
    signature: &Signature,
    tx: &Transaction,
    input_index: usize,
    script_pubkey: &Script,
    value: Amount,
    pk: &PublicKey,
) -> Result<(), Error> {
    let sig_hash_msg = util::get_sig_hash_msg(tx, input_index, script_pubkey, value)?;
    secp.verify_ecdsa(&sig_hash_msg, signature, pk)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::{sha256, Hash};
    use bitcoin::{Address, CompressedPublicKey, Network, Txid};
    use secp256k1_zkp::{rand::thread_rng, Keypair, SECP256K1};
    use std::str::FromStr;

    fn create_txin_vec(sequence: Sequence) -> Vec<TxIn> {
        vec![TxIn {
            previous_output: OutPoint::default(),
            script_sig: ScriptBuf::new(),
            sequence,
            witness: Witness::new(),
        }]
    }

    fn create_multi_party_pub_keys() -> (PublicKey, PublicKey) {
        let sk1 =
            SecretKey::from_str("0000000000000000000000000000000000000000000000000000000000000001")
                .unwrap();
        let sk2 =
            SecretKey::from_str("0000000000000000000000000000000000000000000000000000000000000002")
                .unwrap();

        (
            PublicKey::from_secret_key(SECP256K1, &sk1),
            PublicKey::from_secret_key(SECP256K1, &sk2),
        )
    }

    fn create_test_tx_io() -> (TxOut, TxOut, TxIn) {
        let offer = TxOut {
            value: Amount::from_sat(1),
            script_pubkey: ScriptBuf::new(),
        };

        let accept = TxOut {
            value: Amount::from_sat(2),
            script_pubkey: ScriptBuf::new(),
        };

        let funding = TxIn {
            previous_output: OutPoint::default(),
            script_sig: ScriptBuf::new(),
            sequence: Sequence(3),
            witness: Witness::new(),
        };

        (offer, accept, funding)
    }

    fn get_p2wpkh_script_pubkey() -> ScriptBuf {
        let sk = SecretKey::new(&mut thread_rng());
        let pk = CompressedPublicKey(PublicKey::from_secret_key(SECP256K1, &sk));
        Address::p2wpkh(&pk, Network::Regtest).script_pubkey()
    }

    fn get_party_params(
        input_amount: Amount,
        collateral: Amount,
        serial_id: u64,
    ) -> (PartyParams, SecretKey) {
        let fund_privkey = SecretKey::new(&mut thread_rng());
        (
            PartyParams {
                fund_pubkey: PublicKey::from_secret_key(SECP256K1, &fund_privkey),
                change_script_pubkey: get_p2wpkh_script_pubkey(),
                change_serial_id: serial_id,
                payout_script_pubkey: get_p2wpkh_script_pubkey(),
                payout_serial_id: serial_id,
                input_amount,
                collateral,
                inputs: vec![TxInputInfo {
                    max_witness_len: 108,
                    redeem_script: ScriptBuf::new(),
                    outpoint: OutPoint {
                        txid: Txid::from_str(
                            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456",
                        )
                        .unwrap(),
                        vout: serial_id as u32,
                    },
                    serial_id,
                }],
            },
            fund_privkey,
        )
    }

    fn payouts() -> Vec<Payout> {
        vec![
            Payout {
                offer: Amount::from_sat(200_000_000),
                accept: Amount::ZERO,
            },
            Payout {
                offer: Amount::ZERO,
                accept: Amount::from_sat(200_000_000),
            },
        ]
    }

    fn oracle_info_and_keys(nb_nonces: usize) -> (OracleInfo, Keypair, Vec<Keypair>) {
        let oracle_kp = Keypair::new(SECP256K1, &mut thread_rng());
        let nonce_kps: Vec<Keypair> = (0..nb_nonces)
            .map(|_| Keypair::new(SECP256K1, &mut thread_rng()))
            .collect();
        let oracle_info = OracleInfo {
            public_key: oracle_kp.x_only_public_key().0,
            nonces: nonce_kps.iter().map(|x| x.x_only_public_key().0).collect(),
        };
        (oracle_info, oracle_kp, nonce_kps)
    }

    fn message(value: &str) -> Message {
        Message::from_digest(sha256::Hash::hash(value.as_bytes()).to_byte_array())
    }

    #[test]
    fn create_refund_transaction_test() {
        let (offer, accept, funding) = create_test_tx_io();

        let refund_transaction = create_refund_transaction(offer, accept, funding, 0);
        assert_eq!(Version::TWO, refund_transaction.version);
        assert_eq!(0, refund_transaction.lock_time.to_consensus_u32());
        assert_eq!(Amount::from_sat(1), refund_transaction.output[0].value);
        assert_eq!(Amount::from_sat(2), refund_transaction.output[1].value);
        assert_eq!(Sequence(3), refund_transaction.input[0].sequence);
    }

    #[test]
    fn create_funding_transaction_test() {
        let (pk, pk1) = create_multi_party_pub_keys();

        let offer_inputs = create_txin_vec(Sequence::ZERO);
        let accept_inputs = create_txin_vec(Sequence(1));

        let change = Amount::from_sat(1000);
        let total_collateral = Amount::from_sat(31415);

        let offer_change_output = TxOut {
            value: change,
            script_pubkey: ScriptBuf::new(),
        };
        let accept_change_output = TxOut {
            value: change,
            script_pubkey: ScriptBuf::new(),
        };
        let funding_script_pubkey = make_funding_redeemscript(&pk, &pk1);

        let transaction = create_funding_transaction(
            &funding_script_pubkey,
            total_collateral,
            &offer_inputs,
            &[1],
            &accept_inputs,
            &[2],
            offer_change_output,
            1,
            accept_change_output,
            2,
            0,
            0,
        )
        .unwrap();

        assert_eq!(transaction.input[0].sequence, Sequence::ZERO);
        assert_eq!(transaction.input[1].sequence, Sequence(1));

        assert_eq!(transaction.output[0].value, total_collateral);
        assert_eq!(transaction.output[1].value, change);
        assert_eq!(transaction.output[2].value, change);
        assert_eq!(transaction.output.len(), 3);
    }

    #[test]
    fn create_funding_transaction_with_outputs_less_than_dust_limit_test() {
        let (pk, pk1) = create_multi_party_pub_keys();

        let offer_inputs = create_txin_vec(Sequence::ZERO);
        let accept_inputs = create_txin_vec(Sequence(1));

        let total_collateral = Amount::from_sat(31415);
        let change = Amount::from_sat(999);

        let offer_change_output = TxOut {
            value: change,
            script_pubkey: ScriptBuf::new(),
        };
        let accept_change_output = TxOut {
            value: change,
            script_pubkey: ScriptBuf::new(),
        };

        let funding_script_pubkey = make_funding_redeemscript(&pk, &pk1);

        let transaction = create_funding_transaction(
            &funding_script_pubkey,
            total_collateral,
            &offer_inputs,
            &[1],
            &accept_inputs,
            &[2],
            offer_change_output,
            1,
            accept_change_output,
            2,
            0,
            0,
        )
        .unwrap();

        assert_eq!(transaction.output[0].value, total_collateral);
        assert_eq!(transaction.output.len(), 1);
    }

    #[test]
    fn create_funding_transaction_duplicate_input_serial_ids_fails() {
        let (pk, pk1) = create_multi_party_pub_keys();
        let funding_script_pubkey = make_funding_redeemscript(&pk, &pk1);
        let change = TxOut {
            value: Amount::from_sat(5000),
            script_pubkey: ScriptBuf::new(),
        };

        let res = create_funding_transaction(
            &funding_script_pubkey,
            Amount::from_sat(31415),
            &create_txin_vec(Sequence::ZERO),
            &[7],
            &create_txin_vec(Sequence::ZERO),
            &[7],
            change.clone(),
            1,
            change,
            2,
            0,
            0,
        );

        assert_eq!(Err(Error::InvalidArgument), res);
    }

    #[test]
    fn funding_redeemscript_is_independent_of_key_order() {
        let (pk, pk1) = create_multi_party_pub_keys();
        assert_eq!(
            make_funding_redeemscript(&pk, &pk1),
            make_funding_redeemscript(&pk1, &pk)
        );
    }

    #[test]
    fn get_change_output_and_fees_enough_funds() {
        let (party_params, _) =
            get_party_params(Amount::from_sat(100000), Amount::from_sat(10000), 1);

        let (change_out, fund_fee, cet_fee) = party_params.get_change_output_and_fees(4).unwrap();

        assert!(change_out.value > Amount::ZERO && fund_fee > Amount::ZERO && cet_fee > Amount::ZERO);
        assert_eq!(
            Amount::from_sat(100000),
            change_out.value + fund_fee + cet_fee + Amount::from_sat(10000)
        );
    }

    #[test]
    fn get_change_output_and_fees_not_enough_funds() {
        let (party_params, _) =
            get_party_params(Amount::from_sat(100000), Amount::from_sat(100000), 1);

        let res = party_params.get_change_output_and_fees(4);

        assert_eq!(Err(Error::InvalidArgument), res);
    }

    #[test]
    fn create_dlc_transactions_no_error() {
        let (offer_party_params, _) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            1,
        );
        let (accept_party_params, _) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            2,
        );

        let dlc_txs = create_dlc_transactions(
            &offer_party_params,
            &accept_party_params,
            &payouts(),
            100,
            4,
            10,
            10,
            0,
        )
        .unwrap();

        assert_eq!(10, dlc_txs.fund.lock_time.to_consensus_u32());
        assert_eq!(100, dlc_txs.refund.lock_time.to_consensus_u32());
        assert!(dlc_txs
            .cets
            .iter()
            .all(|x| x.lock_time.to_consensus_u32() == 10));
        assert_eq!(2, dlc_txs.cets.len());
        let fund_output = dlc_txs.get_fund_output().unwrap();
        assert!(fund_output.value > Amount::from_sat(200_000_000));
    }

    #[test]
    fn create_dlc_transactions_bad_payouts_fails() {
        let (offer_party_params, _) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            1,
        );
        let (accept_party_params, _) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            2,
        );

        let res = create_dlc_transactions(
            &offer_party_params,
            &accept_party_params,
            &[Payout {
                offer: Amount::from_sat(1),
                accept: Amount::from_sat(1),
            }],
            100,
            4,
            10,
            10,
            0,
        );

        assert!(res.is_err());
    }

    #[test]
    fn create_cet_adaptor_sig_is_valid() {
        let (offer_party_params, offer_fund_sk) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            1,
        );
        let (accept_party_params, _) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            2,
        );

        let dlc_txs = create_dlc_transactions(
            &offer_party_params,
            &accept_party_params,
            &payouts(),
            100,
            4,
            10,
            10,
            0,
        )
        .unwrap();

        const NB_DIGITS: usize = 20;
        let (oracle_info, _, _) = oracle_info_and_keys(NB_DIGITS);
        let messages: Vec<Vec<Message>> = (0..dlc_txs.cets.len())
            .map(|x| {
                (0..NB_DIGITS)
                    .map(|y| message(&((x + y) % 2).to_string()))
                    .collect()
            })
            .collect();

        let fund_output_value = dlc_txs.get_fund_output().unwrap().value;

        let cet_sigs = dlc_txs
            .cets
            .iter()
            .zip(messages.iter())
            .map(|(cet, msgs)| {
                create_cet_adaptor_sig_from_oracle_info(
                    SECP256K1,
                    cet,
                    &oracle_info,
                    &offer_fund_sk,
                    &dlc_txs.funding_script_pubkey,
                    fund_output_value,
                    msgs,
                )
            })
            .collect::<Result<Vec<_>, Error>>()
            .unwrap();

        assert!(cet_sigs.iter().enumerate().all(|(i, x)| {
            verify_cet_adaptor_sig_from_oracle_info(
                SECP256K1,
                x,
                &dlc_txs.cets[i],
                &oracle_info,
                &offer_party_params.fund_pubkey,
                &dlc_txs.funding_script_pubkey,
                fund_output_value,
                &messages[i],
            )
            .is_ok()
        }));

        // Signature for the first CET does not verify against the second one.
        assert!(verify_cet_adaptor_sig_from_oracle_info(
            SECP256K1,
            &cet_sigs[0],
            &dlc_txs.cets[1],
            &oracle_info,
            &offer_party_params.fund_pubkey,
            &dlc_txs.funding_script_pubkey,
            fund_output_value,
            &messages[0],
        )
        .is_err());
    }

    #[test]
    fn adaptor_point_requires_enough_nonces() {
        let (oracle_info, _, _) = oracle_info_and_keys(2);
        let msgs = vec![message("1"), message("0"), message("1")];

        assert_eq!(
            Err(Error::InvalidArgument),
            get_adaptor_point_from_oracle_info(SECP256K1, &oracle_info, &msgs)
        );
        assert_eq!(
            Err(Error::InvalidArgument),
            get_adaptor_point_from_oracle_info(SECP256K1, &oracle_info, &[])
        );
    }

    #[test]
    fn refund_signature_verifies() {
        let (offer_party_params, offer_fund_sk) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            1,
        );
        let (accept_party_params, _) = get_party_params(
            Amount::from_sat(1_000_000_000),
            Amount::from_sat(100_000_000),
            2,
        );
        let dlc_txs = create_dlc_transactions(
            &offer_party_params,
            &accept_party_params,
            &payouts(),
            100,
            4,
            10,
            10,
            0,
        )
        .unwrap();
        let fund_output_value = dlc_txs.get_fund_output().unwrap().value;

        let sig = util::get_raw_sig_for_tx_input(
            SECP256K1,
            &dlc_txs.refund,
            0,
            &dlc_txs.funding_script_pubkey,
            fund_output_value,
            &offer_fund_sk,
        )
        .unwrap();

        verify_tx_input_sig(
            SECP256K1,
            &sig,
            &dlc_txs.refund,
            0,
            &dlc_txs.funding_script_pubkey,
            fund_output_value,
            &offer_party_params.fund_pubkey,
        )
        .expect("a valid refund signature");
        assert!(verify_tx_input_sig(
            SECP256K1,
            &sig,
            &dlc_txs.refund,
            0,
            &dlc_txs.funding_script_pubkey,
            fund_output_value,
            &accept_party_params.fund_pubkey,
        )
        .is_err());
    }

    #[test]
    fn input_output_ordering_test() {
        struct OrderingCase {
            serials: [u64; 3],
            expected_input_order: [usize; 2],
            expected_fund_output_order: [usize; 3],
            expected_payout_order: [usize; 2],
        }

        let cases = vec![
            OrderingCase {
                serials: [0, 1, 2],
                expected_input_order: [0, 1],
                expected_fund_output_order: [0, 1, 2],
                expected_payout_order: [0, 1],
            },
            OrderingCase {
                serials: [1, 0, 2],
                expected_input_order: [0, 1],
                expected_fund_output_order: [1, 0, 2],
                expected_payout_order: [0, 1],
            },
            OrderingCase {
                serials: [2, 0, 1],
                expected_input_order: [0, 1],
                expected_fund_output_order: [2, 0, 1],
                expected_payout_order: [0, 1],
            },
            OrderingCase {
                serials: [2, 1, 0],
                expected_input_order: [1, 0],
                expected_fund_output_order: [2, 1, 0],
                expected_payout_order: [1, 0],
            },
        ];

        for case in cases {
            let (offer_party_params, _) = get_party_params(
                Amount::from_sat(1_000_000_000),
                Amount::from_sat(100_000_000),
                case.serials[1],
            );
            let (accept_party_params, _) = get_party_params(
                Amount::from_sat(1_000_000_000),
                Amount::from_sat(100_000_000),
                case.serials[2],
            );

            let dlc_txs = create_dlc_transactions(
                &offer_party_params,
                &accept_party_params,
                &[Payout {
                    offer: Amount::from_sat(100_000_000),
                    accept: Amount::from_sat(100_000_000),
                }],
                100,
                4,
                10,
                10,
                case.serials[0],
            )
            .unwrap();

            assert_eq!(
                dlc_txs.fund.input[case.expected_input_order[0]].previous_output,
                offer_party_params.inputs[0].outpoint
            );
            assert_eq!(
                dlc_txs.fund.input[case.expected_input_order[1]].previous_output,
                accept_party_params.inputs[0].outpoint
            );

            assert_eq!(
                dlc_txs.fund.output[case.expected_fund_output_order[0]].script_pubkey,
                dlc_txs.funding_script_pubkey.to_p2wsh()
            );
            assert_eq!(
                dlc_txs.fund.output[case.expected_fund_output_order[1]].script_pubkey,
                offer_party_params.change_script_pubkey
            );
            assert_eq!(
                dlc_txs.fund.output[case.expected_fund_output_order[2]].script_pubkey,
                accept_party_params.change_script_pubkey
            );

            assert_eq!(
                dlc_txs.cets[0].output[case.expected_payout_order[0]].script_pubkey,
                offer_party_params.payout_script_pubkey
            );
            assert_eq!(
                dlc_txs.cets[0].output[case.expected_payout_order[1]].script_pubkey,
                accept_party_params.payout_script_pubkey
            );

            assert_eq!(
                case.expected_fund_output_order[0],
                dlc_txs.get_fund_output_index().unwrap()
            );
        }
    }
}
