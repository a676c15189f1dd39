//! # AcceptedContract

use super::offered_contract::OfferedContract;
use super::FundingInputInfo;
use crate::error::Error;
use crate::messages::AcceptDlc;
use crate::outcome_info::OutcomeInfo;
use crate::ContractId;
use bitcoin::{Amount, OutPoint};
use dlc::{DlcTransactions, PartyParams};
use secp256k1_zkp::ecdsa::Signature;
use secp256k1_zkp::EcdsaAdaptorSignature;

/// An AcceptedContract represents a contract in the accepted state.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AcceptedContract {
    /// The offered contract that was accepted.
    pub offered_contract: OfferedContract,
    /// The parameters of the accepting party.
    pub accept_params: PartyParams,
    /// The funding inputs provided by the accepting party.
    pub funding_inputs_info: Vec<FundingInputInfo>,
    /// The relation between adaptor signatures and outcomes.
    pub outcome_info: OutcomeInfo,
    /// The adaptor signatures of the accepting party.
    pub adaptor_signatures: Vec<EcdsaAdaptorSignature>,
    /// The signature for the refund transaction from the accepting party.
    pub accept_refund_signature: Signature,
    /// The bitcoin set of bitcoin transactions for the contract.
    pub dlc_transactions: DlcTransactions,
    /// The id of the contract, derived from the fund output and the temporary
    /// id.
    pub contract_id: ContractId,
}

impl AcceptedContract {
    /// Utility function to get the contract id as a string.
    pub fn get_contract_id_string(&self) -> String {
        crate::utils::get_contract_id_string(&self.contract_id)
    }

    /// The value locked in the fund output.
    pub fn get_fund_output_value(&self) -> Result<Amount, Error> {
        Ok(self.dlc_transactions.get_fund_output()?.value)
    }

    /// The outpoints spent by the accepting party.
    pub fn get_accept_outpoints(&self) -> Vec<OutPoint> {
        self.accept_params
            .inputs
            .iter()
            .map(|x| x.outpoint)
            .collect()
    }

    /// Creates the accept message to send to the offering party.
    pub fn get_accept_dlc(&self) -> AcceptDlc {
        AcceptDlc {
            temporary_contract_id: self.offered_contract.id,
            accept_collateral: self.accept_params.collateral,
            funding_pubkey: self.accept_params.fund_pubkey,
            payout_spk: self.accept_params.payout_script_pubkey.clone(),
            payout_serial_id: self.accept_params.payout_serial_id,
            funding_inputs: self
                .funding_inputs_info
                .iter()
                .map(|x| x.funding_input.clone())
                .collect(),
            change_spk: self.accept_params.change_script_pubkey.clone(),
            change_serial_id: self.accept_params.change_serial_id,
            cet_adaptor_signatures: self.adaptor_signatures.clone(),
            refund_signature: self.accept_refund_signature,
        }
    }
}
