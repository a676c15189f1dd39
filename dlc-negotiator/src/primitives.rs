//! [`DlcPrimitives`] implementation backed by the `dlc` crate.

use crate::error::Error;
use crate::DlcPrimitives;
use bitcoin::{Amount, Script, Transaction};
use dlc::{DlcTransactions, PartyParams, Payout};
use secp256k1_zkp::ecdsa::Signature;
use secp256k1_zkp::{All, EcdsaAdaptorSignature, Message, PublicKey, Secp256k1, SecretKey};

/// Creates and verifies contract transactions and signatures using its own
/// secp256k1 context.
pub struct SecpPrimitives {
    secp: Secp256k1<All>,
}

impl SecpPrimitives {
    /// Creates a new instance with a fresh context.
    pub fn new() -> Self {
        SecpPrimitives {
            secp: Secp256k1::new(),
        }
    }
}

impl Default for SecpPrimitives {
    fn default() -> Self {
        Self::new()
    }
}

// A failed verification is reported as `Ok(false)`, other errors are
// propagated.
fn verification_result(res: Result<(), dlc::Error>) -> Result<bool, Error> {
    match res {
        Ok(()) => Ok(true),
        Err(dlc::Error::Secp256k1(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

impl DlcPrimitives for SecpPrimitives {
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
    ) -> Result<DlcTransactions, Error> {
        Ok(dlc::create_dlc_transactions(
            offer_params,
            accept_params,
            payouts,
            refund_lock_time,
            fee_rate_per_vb,
            fund_lock_time,
            cet_lock_time,
            fund_output_serial_id,
        )?)
    }

    fn create_cet_adaptor_signature(
        &self,
        cet: &Transaction,
        funding_sk: &SecretKey,
        funding_script_pubkey: &Script,
        fund_output_value: Amount,
        oracle_info: &dlc::OracleInfo,
        msgs: &[Message],
    ) -> Result<EcdsaAdaptorSignature, Error> {
        Ok(dlc::create_cet_adaptor_sig_from_oracle_info(
            &self.secp,
            cet,
            oracle_info,
            funding_sk,
            funding_script_pubkey,
            fund_output_value,
            msgs,
        )?)
    }

    fn verify_cet_adaptor_signature(
        &self,
        adaptor_sig: &EcdsaAdaptorSignature,
        cet: &Transaction,
        oracle_info: &dlc::OracleInfo,
        pubkey: &PublicKey,
        funding_script_pubkey: &Script,
        fund_output_value: Amount,
        msgs: &[Message],
    ) -> Result<bool, Error> {
        verification_result(dlc::verify_cet_adaptor_sig_from_oracle_info(
            &self.secp,
            adaptor_sig,
            cet,
            oracle_info,
            pubkey,
            funding_script_pubkey,
            fund_output_value,
            msgs,
        ))
    }

    fn verify_tx_input_signature(
        &self,
        signature: &Signature,
        tx: &Transaction,
        input_index: usize,
        script_pubkey: &Script,
        value: Amount,
        pubkey: &PublicKey,
    ) -> Result<bool, Error> {
        verification_result(dlc::verify_tx_input_sig(
            &self.secp,
            signature,
            tx,
            input_index,
            script_pubkey,
            value,
            pubkey,
        ))
    }
}
