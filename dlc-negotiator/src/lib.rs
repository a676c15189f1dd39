//! # Library providing data structures and functions supporting the
//! negotiation of DLC between two parties, from the offer up to the broadcast
//! of the funding transaction.

#![crate_name = "dlc_negotiator"]
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
extern crate dlc;
extern crate dlc_trie;
#[macro_use]
extern crate log;
#[cfg(feature = "parallel")]
extern crate rayon;
extern crate secp256k1_zkp;
#[cfg(feature = "use-serde")]
extern crate serde;

pub mod contract;
pub mod contract_updater;
pub mod error;
pub mod messages;
pub mod oracle;
pub mod outcome_info;
pub mod payout_curve;
pub mod primitives;
#[cfg(feature = "use-serde")]
mod serde_utils;
pub mod utils;

use bitcoin::{Address, Amount, OutPoint, Script, ScriptBuf, Transaction, TxOut, Txid};
use dlc::{DlcTransactions, PartyParams, Payout};
use error::Error;
use secp256k1_zkp::ecdsa::Signature;
use secp256k1_zkp::{EcdsaAdaptorSignature, Message, PublicKey, SecretKey};

/// Type alias for a contract id.
pub type ContractId = [u8; 32];

/// Represents a UTXO.
#[derive(Clone, Debug)]
pub struct Utxo {
    /// The TxOut containing the value and script pubkey of the referenced output.
    pub tx_out: TxOut,
    /// The outpoint containing the txid and vout of the referenced output.
    pub outpoint: OutPoint,
    /// The address associated with the referenced output.
    pub address: Address,
    /// The redeem script for the referenced output.
    pub redeem_script: ScriptBuf,
    /// Whether this Utxo has been reserved (and so is now being used for a
    /// contract).
    pub reserved: bool,
}

/// Wallet trait to provide functionalities related to generating, storing and
/// managing bitcoin addresses, keys and UTXOs.
pub trait Wallet {
    /// Returns a new public key whose secret key is kept by the wallet.
    fn get_new_public_key(&self) -> Result<PublicKey, Error>;
    /// Returns a new (unused) address.
    fn get_new_address(&self) -> Result<Address, Error>;
    /// Returns a new (unused) change address.
    fn get_new_change_address(&self) -> Result<Address, Error>;
    /// Get a set of UTXOs to fund the given amount. Already reserved UTXOs are
    /// never returned, and the returned ones are reserved if `lock_utxos` is set.
    fn get_utxos_for_amount(
        &self,
        amount: Amount,
        fee_rate: u64,
        lock_utxos: bool,
    ) -> Result<Vec<Utxo>, Error>;
    /// Get the secret key associated with the provided public key.
    fn get_secret_key_for_pubkey(&self, pubkey: &PublicKey) -> Result<SecretKey, Error>;
    /// Sign the P2WPKH input at `input_index` of `tx` which spends an output of
    /// the given value locked to `address`, placing the witness on the input.
    fn sign_p2wpkh_input(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        value: Amount,
        address: &Address,
    ) -> Result<(), Error>;
    /// Returns a signature for the segwit input at `input_index` of `tx`, using
    /// the secret key associated with `pubkey`.
    fn get_der_signature(
        &self,
        tx: &Transaction,
        input_index: usize,
        value: Amount,
        pubkey: &PublicKey,
        script_pubkey: &Script,
    ) -> Result<Signature, Error>;
    /// Unlock reserved utxo
    fn unreserve_utxos(&self, outpoints: &[OutPoint]) -> Result<(), Error>;
}

/// Blockchain trait provides access to the bitcoin blockchain.
pub trait Blockchain {
    /// Broadcast the given transaction to the bitcoin network.
    fn send_transaction(&self, transaction: &Transaction) -> Result<(), Error>;
    /// Get the transaction with given id.
    fn get_transaction(&self, tx_id: &Txid) -> Result<Transaction, Error>;
}

/// Transaction and adaptor signature primitives used to build and verify the
/// contract transactions. Implementations are expected to be deterministic
/// and free of side effects.
pub trait DlcPrimitives: Send + Sync {
    /// Create the fund, CETs and refund transactions of a contract.
    #[allow(clippy::too_many_arguments)]
    fn create_dlc_transactions(
        &self,
        offer_params: &PartyParams,
        accept_params: &PartyParams,
        payouts: &[Payout],
        refund_lock_time: u32,
        fee_rate_per_vb: u64,
        fund_lock_time: u32,
        cet_lock_time: u32,
        fund_output_serial_id: u64,
    ) -> Result<DlcTransactions, Error>;

    /// Create an adaptor signature for `cet` encrypted under the point the
    /// oracle will reveal when attesting to `msgs`.
    fn create_cet_adaptor_signature(
        &self,
        cet: &Transaction,
        funding_sk: &SecretKey,
        funding_script_pubkey: &Script,
        fund_output_value: Amount,
        oracle_info: &dlc::OracleInfo,
        msgs: &[Message],
    ) -> Result<EcdsaAdaptorSignature, Error>;

    /// Returns whether `adaptor_sig` is a valid adaptor signature for `cet` by
    /// the owner of `pubkey`, encrypted under the point matching `msgs`.
    #[allow(clippy::too_many_arguments)]
    fn verify_cet_adaptor_signature(
        &self,
        adaptor_sig: &EcdsaAdaptorSignature,
        cet: &Transaction,
        oracle_info: &dlc::OracleInfo,
        pubkey: &PublicKey,
        funding_script_pubkey: &Script,
        fund_output_value: Amount,
        msgs: &[Message],
    ) -> Result<bool, Error>;

    /// Returns whether `signature` is a valid signature by the owner of `pubkey`
    /// for the segwit input at `input_index` of `tx`.
    fn verify_tx_input_signature(
        &self,
        signature: &Signature,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &Script,
        value: Amount,
        pubkey: &PublicKey,
    ) -> Result<bool, Error>;
}
