//! #OfferedContract

use super::contract_info::ContractInfo;
use super::contract_input::ContractInput;
use super::FundingInputInfo;
use crate::error::Error;
use crate::messages::{OfferDlc, PROTOCOL_VERSION};
use crate::ContractId;
use bitcoin::constants::ChainHash;
use bitcoin::{Amount, Network};
use dlc::{PartyParams, TxInputInfo};
use std::convert::TryFrom;

/// Contains information about a contract that was offered.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct OfferedContract {
    /// The temporary id of the contract.
    pub id: ContractId,
    /// Indicated whether the contract was proposed or received.
    pub is_offer_party: bool,
    /// The contract information used to generate CET and adaptor signatures.
    pub contract_info: ContractInfo,
    /// The parameters of the offering party.
    pub offer_params: PartyParams,
    /// The sum of both parties collateral.
    pub total_collateral: Amount,
    /// Information about the offering party's funding inputs.
    pub funding_inputs_info: Vec<FundingInputInfo>,
    /// The serial id of the fund output used for output ordering.
    pub fund_output_serial_id: u64,
    /// The fee rate to be used to construct the DLC transactions.
    pub fee_rate_per_vb: u64,
    /// The time at which the contract is expected to be closeable.
    pub contract_maturity_bound: u32,
    /// The time at which the contract becomes refundable.
    pub contract_timeout: u32,
}

impl OfferedContract {
    /// Creates a new offered contract from the given input, as the offering
    /// party.
    pub fn new(
        id: ContractId,
        contract: &ContractInput,
        offer_params: PartyParams,
        funding_inputs_info: Vec<FundingInputInfo>,
        fund_output_serial_id: u64,
    ) -> Result<Self, Error> {
        Ok(OfferedContract {
            id,
            is_offer_party: true,
            contract_info: contract.contract_info.clone(),
            offer_params,
            total_collateral: contract.get_total_collateral()?,
            funding_inputs_info,
            fund_output_serial_id,
            fee_rate_per_vb: contract.fee_rate,
            contract_maturity_bound: contract.contract_maturity_bound,
            contract_timeout: contract.contract_timeout,
        })
    }

    /// Validate that the contract info covers all the possible outcomes that
    /// can be attested by the oracle and that the terms are consistent.
    pub fn validate(&self) -> Result<(), Error> {
        dlc::util::validate_fee_rate(self.fee_rate_per_vb)
            .map_err(|_| Error::InvalidParameters("Fee rate too high.".to_string()))?;

        self.get_accept_collateral()?;

        if self.contract_maturity_bound >= self.contract_timeout {
            return Err(Error::InvalidParameters(
                "Contract timeout must be after its maturity.".to_string(),
            ));
        }

        self.contract_info.validate(self.total_collateral)
    }

    /// Returns the collateral the accepting party needs to provide.
    pub fn get_accept_collateral(&self) -> Result<Amount, Error> {
        self.total_collateral
            .checked_sub(self.offer_params.collateral)
            .ok_or_else(|| {
                Error::InvalidParameters(
                    "Offer collateral is greater than total collateral.".to_string(),
                )
            })
    }

    /// Creates the offer message to send to the counter party.
    pub fn get_offer_dlc(&self, network: Network) -> OfferDlc {
        OfferDlc {
            protocol_version: PROTOCOL_VERSION,
            contract_flags: 0,
            chain_hash: *ChainHash::using_genesis_block(network).as_bytes(),
            temporary_contract_id: self.id,
            contract_info: self.contract_info.clone(),
            total_collateral: self.total_collateral,
            funding_pubkey: self.offer_params.fund_pubkey,
            payout_spk: self.offer_params.payout_script_pubkey.clone(),
            payout_serial_id: self.offer_params.payout_serial_id,
            offer_collateral: self.offer_params.collateral,
            funding_inputs: self
                .funding_inputs_info
                .iter()
                .map(|x| x.funding_input.clone())
                .collect(),
            change_spk: self.offer_params.change_script_pubkey.clone(),
            change_serial_id: self.offer_params.change_serial_id,
            fund_output_serial_id: self.fund_output_serial_id,
            fee_rate_per_vb: self.fee_rate_per_vb,
            contract_maturity_bound: self.contract_maturity_bound,
            contract_timeout: self.contract_timeout,
        }
    }

    /// Creates an offered contract from a received offer message, as the
    /// accepting party.
    pub fn try_from_offer_dlc(offer_dlc: &OfferDlc) -> Result<OfferedContract, Error> {
        let mut input_amount = Amount::ZERO;
        let mut inputs = Vec::with_capacity(offer_dlc.funding_inputs.len());
        for funding_input in &offer_dlc.funding_inputs {
            input_amount = input_amount
                .checked_add(funding_input.get_prev_output()?.value)
                .ok_or_else(|| Error::InvalidParameters("Input amount overflow.".to_string()))?;
            inputs.push(TxInputInfo::try_from(funding_input)?);
        }

        let offered_contract = OfferedContract {
            id: offer_dlc.temporary_contract_id,
            is_offer_party: false,
            contract_info: offer_dlc.contract_info.clone(),
            offer_params: PartyParams {
                fund_pubkey: offer_dlc.funding_pubkey,
                change_script_pubkey: offer_dlc.change_spk.clone(),
                change_serial_id: offer_dlc.change_serial_id,
                payout_script_pubkey: offer_dlc.payout_spk.clone(),
                payout_serial_id: offer_dlc.payout_serial_id,
                inputs,
                input_amount,
                collateral: offer_dlc.offer_collateral,
            },
            total_collateral: offer_dlc.total_collateral,
            funding_inputs_info: offer_dlc
                .funding_inputs
                .iter()
                .map(|x| FundingInputInfo {
                    funding_input: x.clone(),
                    address: None,
                })
                .collect(),
            fund_output_serial_id: offer_dlc.fund_output_serial_id,
            fee_rate_per_vb: offer_dlc.fee_rate_per_vb,
            contract_maturity_bound: offer_dlc.contract_maturity_bound,
            contract_timeout: offer_dlc.contract_timeout,
        };

        offered_contract.validate()?;

        Ok(offered_contract)
    }
}
