//! # State transitions of a contract, from the offer up to the broadcast of
//! its fund transaction.
//!
//! The [`ContractUpdater`] drives the transitions, using a [`Wallet`] to
//! select, reserve and sign funding inputs, a [`Blockchain`] to fetch previous
//! transactions and broadcast the fund transaction, and a [`DlcPrimitives`]
//! implementation to build the contract transactions and their adaptor
//! signatures.

use std::convert::TryFrom;
use std::ops::Deref;

use bitcoin::{Amount, OutPoint, Transaction, Witness};
use dlc::serial_id::SerialIdOrderer;
use dlc::{DlcTransactions, PartyParams, TxInputInfo, P2WPKH_WITNESS_SIZE};
use secp256k1_zkp::ecdsa::Signature;
use secp256k1_zkp::EcdsaAdaptorSignature;

use crate::contract::accepted_contract::AcceptedContract;
use crate::contract::contract_input::ContractInput;
use crate::contract::offered_contract::OfferedContract;
use crate::contract::signed_contract::SignedContract;
use crate::contract::{
    BroadcastContract, ContractState, FailedContract, FundedContract, FundingInputInfo,
    PendingContract, RejectedContract,
};
use crate::error::Error;
use crate::messages::{AcceptDlc, FundingInput, FundingSignature, FundingSignatures, SignDlc};
use crate::outcome_info::{generate_outcome_groups, get_outcome_info, verify_outcome_signatures};
use crate::utils::{
    compute_id, get_contract_id_string, get_new_serial_id, get_new_temporary_id, get_own_fee,
};
use crate::{Blockchain, DlcPrimitives, Wallet};

// Number of inputs assumed when estimating the fees a party has to cover.
const ESTIMATED_NB_INPUTS: usize = 2;
const FUNDING_INPUT_SEQUENCE: u32 = 0xffffffff;

/// Describes from which states the UTXOs reserved for a contract are released
/// to the wallet when the contract is rejected or fails.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UtxoReleasePolicy {
    /// States in which a rejection releases the reserved UTXOs.
    pub on_reject: Vec<ContractState>,
    /// States in which a failure releases the reserved UTXOs.
    pub on_failure: Vec<ContractState>,
}

impl Default for UtxoReleasePolicy {
    fn default() -> Self {
        UtxoReleasePolicy {
            on_reject: vec![ContractState::Accepted, ContractState::Signed],
            on_failure: vec![ContractState::Offered, ContractState::Accepted],
        }
    }
}

/// Performs the transitions between the states of a contract.
pub struct ContractUpdater<W: Deref, B: Deref, P: Deref>
where
    W::Target: Wallet,
    B::Target: Blockchain,
    P::Target: DlcPrimitives,
{
    wallet: W,
    blockchain: B,
    primitives: P,
    release_policy: UtxoReleasePolicy,
}

impl<W: Deref, B: Deref, P: Deref> ContractUpdater<W, B, P>
where
    W::Target: Wallet,
    B::Target: Blockchain,
    P::Target: DlcPrimitives,
{
    /// Create a new updater using the default [`UtxoReleasePolicy`].
    pub fn new(wallet: W, blockchain: B, primitives: P) -> Self {
        Self::with_release_policy(wallet, blockchain, primitives, UtxoReleasePolicy::default())
    }

    /// Create a new updater releasing UTXOs according to `release_policy`.
    pub fn with_release_policy(
        wallet: W,
        blockchain: B,
        primitives: P,
        release_policy: UtxoReleasePolicy,
    ) -> Self {
        ContractUpdater {
            wallet,
            blockchain,
            primitives,
            release_policy,
        }
    }

    /// The policy used to release UTXOs on rejection and failure.
    pub fn release_policy(&self) -> &UtxoReleasePolicy {
        &self.release_policy
    }

    /// Creates an [`OfferedContract`] from the provided contract input,
    /// selecting and reserving the UTXOs funding the offering party's
    /// collateral.
    pub fn offer_contract(&self, contract_input: &ContractInput) -> Result<OfferedContract, Error> {
        contract_input.validate()?;

        let (offer_params, funding_inputs_info) =
            self.get_party_params(contract_input.offer_collateral, contract_input.fee_rate)?;

        let outpoints = get_outpoints(&offer_params.inputs);
        let id = get_new_temporary_id();

        match OfferedContract::new(
            id,
            contract_input,
            offer_params,
            funding_inputs_info,
            get_new_serial_id(),
        ) {
            Ok(offered_contract) => {
                debug!("Offered contract {}", get_contract_id_string(&id));
                Ok(offered_contract)
            }
            Err(e) => {
                self.release_outpoints(&outpoints);
                Err(e)
            }
        }
    }

    /// Accepts the given offer: reserves the accepting party's funding inputs,
    /// builds the contract transactions, and produces the accepting party's
    /// CET adaptor signatures and refund signature. If anything fails after
    /// the UTXOs were selected, they are released before returning the error.
    pub fn to_accept_contract(
        &self,
        offered_contract: &OfferedContract,
    ) -> Result<AcceptedContract, Error> {
        let accept_collateral = offered_contract.get_accept_collateral()?;

        let (accept_params, funding_inputs_info) =
            self.get_party_params(accept_collateral, offered_contract.fee_rate_per_vb)?;

        let outpoints = get_outpoints(&accept_params.inputs);

        match self.accept_contract_internal(offered_contract, accept_params, funding_inputs_info) {
            Ok(accepted_contract) => {
                debug!(
                    "Accepted contract {}",
                    accepted_contract.get_contract_id_string()
                );
                Ok(accepted_contract)
            }
            Err(e) => {
                warn!(
                    "Could not accept contract {}: {}",
                    get_contract_id_string(&offered_contract.id),
                    e
                );
                self.release_outpoints(&outpoints);
                Err(e)
            }
        }
    }

    fn accept_contract_internal(
        &self,
        offered_contract: &OfferedContract,
        accept_params: PartyParams,
        funding_inputs_info: Vec<FundingInputInfo>,
    ) -> Result<AcceptedContract, Error> {
        let dlc_transactions = self.create_dlc_transactions(offered_contract, &accept_params)?;
        let fund_output_value = dlc_transactions.get_fund_output()?.value;

        let fund_privkey = self
            .wallet
            .get_secret_key_for_pubkey(&accept_params.fund_pubkey)?;

        let (outcome_info, adaptor_signatures) = get_outcome_info(
            &*self.primitives,
            &offered_contract.contract_info,
            offered_contract.total_collateral,
            &dlc_transactions.cets,
            &fund_privkey,
            &dlc_transactions.funding_script_pubkey,
            fund_output_value,
        )?;

        let accept_refund_signature = self.wallet.get_der_signature(
            &dlc_transactions.refund,
            0,
            fund_output_value,
            &accept_params.fund_pubkey,
            &dlc_transactions.funding_script_pubkey,
        )?;

        let contract_id = get_contract_id(offered_contract, &dlc_transactions)?;

        Ok(AcceptedContract {
            offered_contract: offered_contract.clone(),
            accept_params,
            funding_inputs_info,
            outcome_info,
            adaptor_signatures,
            accept_refund_signature,
            dlc_transactions,
            contract_id,
        })
    }

    /// Produces the offering party's signatures for a contract accepted by the
    /// counter party. The accepting party's refund and CET adaptor signatures
    /// are verified first.
    pub fn sign_as_offer_party(
        &self,
        offered_contract: &OfferedContract,
        accept_dlc: &AcceptDlc,
    ) -> Result<SignDlc, Error> {
        if accept_dlc.temporary_contract_id != offered_contract.id {
            return Err(Error::InvalidParameters(
                "Accept message does not match the offered contract.".to_string(),
            ));
        }

        if accept_dlc.accept_collateral != offered_contract.get_accept_collateral()? {
            return Err(Error::InvalidParameters(
                "Accept collateral does not match the offered contract.".to_string(),
            ));
        }

        let accept_params = get_accept_params(accept_dlc)?;
        let dlc_transactions = self.create_dlc_transactions(offered_contract, &accept_params)?;
        let fund_output_value = dlc_transactions.get_fund_output()?.value;
        let funding_script_pubkey = &dlc_transactions.funding_script_pubkey;

        if !self.primitives.verify_tx_input_signature(
            &accept_dlc.refund_signature,
            &dlc_transactions.refund,
            0,
            funding_script_pubkey,
            fund_output_value,
            &accept_params.fund_pubkey,
        )? {
            return Err(Error::InvalidParameters(
                "Invalid refund signature.".to_string(),
            ));
        }

        let (accept_outcome_info, _) = generate_outcome_groups(
            &offered_contract.contract_info,
            offered_contract.total_collateral,
        )?;
        if !verify_outcome_signatures(
            &*self.primitives,
            &offered_contract.contract_info,
            &accept_outcome_info,
            &dlc_transactions.cets,
            &accept_dlc.cet_adaptor_signatures,
            &accept_params.fund_pubkey,
            funding_script_pubkey,
            fund_output_value,
        )? {
            return Err(Error::InvalidParameters(
                "Invalid CET adaptor signature.".to_string(),
            ));
        }

        let fund_privkey = self
            .wallet
            .get_secret_key_for_pubkey(&offered_contract.offer_params.fund_pubkey)?;
        let (_, cet_adaptor_signatures) = get_outcome_info(
            &*self.primitives,
            &offered_contract.contract_info,
            offered_contract.total_collateral,
            &dlc_transactions.cets,
            &fund_privkey,
            funding_script_pubkey,
            fund_output_value,
        )?;

        let refund_signature = self.wallet.get_der_signature(
            &dlc_transactions.refund,
            0,
            fund_output_value,
            &offered_contract.offer_params.fund_pubkey,
            funding_script_pubkey,
        )?;

        let orderer = get_input_orderer(&offered_contract.offer_params, &accept_params)?;
        let mut fund_tx = dlc_transactions.fund.clone();
        let mut funding_signatures = Vec::with_capacity(offered_contract.funding_inputs_info.len());
        for funding_input_info in &offered_contract.funding_inputs_info {
            let input_index = self.sign_own_input(&orderer, &mut fund_tx, funding_input_info)?;
            funding_signatures.push(FundingSignature::from(&fund_tx.input[input_index].witness));
        }

        let contract_id = get_contract_id(offered_contract, &dlc_transactions)?;

        debug!(
            "Signed contract {} as offer party",
            get_contract_id_string(&contract_id)
        );

        Ok(SignDlc {
            contract_id,
            cet_adaptor_signatures,
            refund_signature,
            funding_signatures: FundingSignatures { funding_signatures },
        })
    }

    /// Merges the offering party's signatures into an accepted contract. No
    /// verification is performed, see [`verify_contract_signatures`].
    pub fn to_signed_contract(
        &self,
        accepted_contract: AcceptedContract,
        offer_refund_signature: Signature,
        offer_adaptor_signatures: Vec<EcdsaAdaptorSignature>,
        offer_funding_signatures: FundingSignatures,
    ) -> SignedContract {
        trace!(
            "Contract {} signed with {} adaptor signatures",
            accepted_contract.get_contract_id_string(),
            offer_adaptor_signatures.len()
        );
        SignedContract {
            accepted_contract,
            offer_refund_signature,
            offer_adaptor_signatures,
            offer_funding_signatures,
        }
    }

    /// Merges the content of a received sign message into an accepted
    /// contract.
    pub fn on_sign_dlc(
        &self,
        accepted_contract: AcceptedContract,
        sign_dlc: &SignDlc,
    ) -> Result<SignedContract, Error> {
        if sign_dlc.contract_id != accepted_contract.contract_id {
            return Err(Error::InvalidParameters(format!(
                "Sign message for contract {} does not match contract {}.",
                get_contract_id_string(&sign_dlc.contract_id),
                accepted_contract.get_contract_id_string()
            )));
        }

        Ok(self.to_signed_contract(
            accepted_contract,
            sign_dlc.refund_signature,
            sign_dlc.cet_adaptor_signatures.clone(),
            sign_dlc.funding_signatures.clone(),
        ))
    }

    /// Completes the fund transaction of a signed contract with the witnesses
    /// of both parties and broadcasts it. Inputs are placed following the
    /// ascending order of their serial ids.
    pub fn to_broadcast(&self, signed_contract: SignedContract) -> Result<BroadcastContract, Error> {
        let fund_transaction = self.get_signed_fund_transaction(&signed_contract)?;

        self.blockchain.send_transaction(&fund_transaction)?;

        info!(
            "Broadcast fund transaction {} of contract {}",
            fund_transaction.compute_txid(),
            signed_contract.accepted_contract.get_contract_id_string()
        );

        Ok(BroadcastContract {
            signed_contract,
            fund_transaction,
        })
    }

    fn get_signed_fund_transaction(
        &self,
        signed_contract: &SignedContract,
    ) -> Result<Transaction, Error> {
        let accepted_contract = &signed_contract.accepted_contract;
        let offered_contract = &accepted_contract.offered_contract;

        let orderer = get_input_orderer(
            &offered_contract.offer_params,
            &accepted_contract.accept_params,
        )?;
        let mut fund_tx = accepted_contract.dlc_transactions.fund.clone();
        if fund_tx.input.len() != orderer.len() {
            return Err(Error::InvalidState(
                "Fund transaction inputs do not match the funding inputs.".to_string(),
            ));
        }

        for funding_input_info in &accepted_contract.funding_inputs_info {
            self.sign_own_input(&orderer, &mut fund_tx, funding_input_info)?;
        }

        let funding_signatures = &signed_contract.offer_funding_signatures.funding_signatures;
        if funding_signatures.len() != offered_contract.offer_params.inputs.len() {
            return Err(Error::InvalidParameters(format!(
                "Expected {} funding signatures, got {}.",
                offered_contract.offer_params.inputs.len(),
                funding_signatures.len()
            )));
        }

        for (input, funding_signature) in offered_contract
            .offer_params
            .inputs
            .iter()
            .zip(funding_signatures.iter())
        {
            let input_index = get_input_index(&orderer, input.serial_id)?;
            fund_tx.input[input_index].witness = Witness::from(funding_signature);
        }

        Ok(fund_tx)
    }

    /// Moves a contract that did not reach the broadcast to the rejected
    /// state, releasing its reserved UTXOs if the release policy says so.
    pub fn to_rejected_contract(
        &self,
        contract: PendingContract,
        reason: Option<String>,
    ) -> Result<RejectedContract, Error> {
        let state = contract.get_state();
        if self.release_policy.on_reject.contains(&state) {
            if let Some(accepted_contract) = contract.get_accepted_contract() {
                self.unlock_utxos(accepted_contract)?;
            } else if let PendingContract::Offered(o) = &contract {
                if o.is_offer_party {
                    self.wallet
                        .unreserve_utxos(&get_outpoints(&o.offer_params.inputs))?;
                }
            }
        }

        debug!(
            "Rejected contract {} in state {:?}",
            get_contract_id_string(&contract.get_id()),
            state
        );

        Ok(RejectedContract { contract, reason })
    }

    /// Moves a contract to which funds were committed to the failed state,
    /// releasing its reserved UTXOs if the release policy says so.
    pub fn to_failed_contract(
        &self,
        contract: FundedContract,
        reason: String,
    ) -> Result<FailedContract, Error> {
        let state = contract.get_state();
        if self.release_policy.on_failure.contains(&state) {
            self.unlock_utxos(contract.get_accepted_contract())?;
        }

        error!(
            "Contract {} failed in state {:?}: {}",
            get_contract_id_string(&contract.get_id()),
            state,
            reason
        );

        Ok(FailedContract { contract, reason })
    }

    /// Releases all the UTXOs used by the accepting party to fund the contract.
    pub fn unlock_utxos(&self, accepted_contract: &AcceptedContract) -> Result<(), Error> {
        self.wallet
            .unreserve_utxos(&accepted_contract.get_accept_outpoints())
    }

    fn create_dlc_transactions(
        &self,
        offered_contract: &OfferedContract,
        accept_params: &PartyParams,
    ) -> Result<DlcTransactions, Error> {
        let payouts = offered_contract
            .contract_info
            .get_payouts(offered_contract.total_collateral)?;

        self.primitives.create_dlc_transactions(
            &offered_contract.offer_params,
            accept_params,
            &payouts,
            offered_contract.contract_timeout,
            offered_contract.fee_rate_per_vb,
            0,
            offered_contract.contract_maturity_bound,
            offered_contract.fund_output_serial_id,
        )
    }

    // Signs the input of `fund_tx` spending an output owned by the wallet and
    // returns its index.
    fn sign_own_input(
        &self,
        orderer: &SerialIdOrderer,
        fund_tx: &mut Transaction,
        funding_input_info: &FundingInputInfo,
    ) -> Result<usize, Error> {
        let funding_input = &funding_input_info.funding_input;
        let address = funding_input_info
            .address
            .as_ref()
            .ok_or(Error::MissingAddress)?;
        let input_index = get_input_index(orderer, funding_input.input_serial_id)?;
        let value = funding_input.get_prev_output()?.value;

        self.wallet
            .sign_p2wpkh_input(fund_tx, input_index, value, address)?;

        Ok(input_index)
    }

    // Selects and reserves UTXOs for `own_collateral` and derives the party
    // parameters funded by them. Failures are reported as insufficient funds,
    // and release the selected UTXOs.
    fn get_party_params(
        &self,
        own_collateral: Amount,
        fee_rate: u64,
    ) -> Result<(PartyParams, Vec<FundingInputInfo>), Error> {
        let required_amount = own_collateral
            .checked_add(get_own_fee(fee_rate, ESTIMATED_NB_INPUTS)?)
            .ok_or_else(|| Error::InvalidParameters("Required amount overflow.".to_string()))?;

        let utxos = self
            .wallet
            .get_utxos_for_amount(required_amount, fee_rate, true)
            .map_err(|e| {
                warn!("Could not get UTXOs for {}: {}", required_amount, e);
                Error::InsufficientFunds
            })?;

        if utxos.is_empty() {
            return Err(Error::InsufficientFunds);
        }

        let outpoints = utxos.iter().map(|x| x.outpoint).collect::<Vec<_>>();

        match self.get_party_params_internal(own_collateral, utxos) {
            Ok(res) => Ok(res),
            Err(e) => {
                warn!("Could not derive party parameters: {}", e);
                self.release_outpoints(&outpoints);
                Err(Error::InsufficientFunds)
            }
        }
    }

    fn get_party_params_internal(
        &self,
        own_collateral: Amount,
        utxos: Vec<crate::Utxo>,
    ) -> Result<(PartyParams, Vec<FundingInputInfo>), Error> {
        let fund_pubkey = self.wallet.get_new_public_key()?;
        let payout_script_pubkey = self.wallet.get_new_address()?.script_pubkey();
        let change_script_pubkey = self.wallet.get_new_change_address()?.script_pubkey();

        let mut funding_inputs_info = Vec::with_capacity(utxos.len());
        let mut inputs = Vec::with_capacity(utxos.len());
        let mut input_amount = Amount::ZERO;
        for utxo in utxos {
            let prev_tx = self.blockchain.get_transaction(&utxo.outpoint.txid)?;
            let prev_output = prev_tx
                .output
                .get(utxo.outpoint.vout as usize)
                .ok_or_else(|| {
                    Error::InvalidParameters(format!(
                        "Previous transaction has no output {}.",
                        utxo.outpoint.vout
                    ))
                })?;
            input_amount = input_amount
                .checked_add(prev_output.value)
                .ok_or_else(|| Error::InvalidParameters("Input amount overflow.".to_string()))?;

            let funding_input = FundingInput {
                input_serial_id: get_new_serial_id(),
                prev_tx: bitcoin::consensus::serialize(&prev_tx),
                prev_tx_vout: utxo.outpoint.vout,
                sequence: FUNDING_INPUT_SEQUENCE,
                max_witness_len: P2WPKH_WITNESS_SIZE as u16,
                redeem_script: utxo.redeem_script,
            };
            inputs.push(TxInputInfo::try_from(&funding_input)?);
            funding_inputs_info.push(FundingInputInfo {
                funding_input,
                address: Some(utxo.address),
            });
        }

        if input_amount < own_collateral {
            return Err(Error::InsufficientFunds);
        }

        let party_params = PartyParams {
            fund_pubkey,
            change_script_pubkey,
            change_serial_id: get_new_serial_id(),
            payout_script_pubkey,
            payout_serial_id: get_new_serial_id(),
            inputs,
            input_amount,
            collateral: own_collateral,
        };

        Ok((party_params, funding_inputs_info))
    }

    fn release_outpoints(&self, outpoints: &[OutPoint]) {
        if let Err(e) = self.wallet.unreserve_utxos(outpoints) {
            warn!("Could not release {} UTXOs: {}", outpoints.len(), e);
        }
    }
}

/// Verifies the signatures produced by the offering party for a signed
/// contract: the CET adaptor signatures of every outcome group and the refund
/// signature. The adaptor signatures are checked against the value of the fund
/// transaction output and the refund signature against `fund_output_value`.
/// Returns `Ok(false)` if any of them is invalid.
pub fn verify_contract_signatures<P: DlcPrimitives + ?Sized>(
    primitives: &P,
    signed_contract: &SignedContract,
    fund_output_value: Amount,
) -> Result<bool, Error> {
    let accepted_contract = &signed_contract.accepted_contract;
    let offered_contract = &accepted_contract.offered_contract;
    let dlc_transactions = &accepted_contract.dlc_transactions;
    let offer_fund_pubkey = &offered_contract.offer_params.fund_pubkey;

    if !verify_outcome_signatures(
        primitives,
        &offered_contract.contract_info,
        &accepted_contract.outcome_info,
        &dlc_transactions.cets,
        &signed_contract.offer_adaptor_signatures,
        offer_fund_pubkey,
        &dlc_transactions.funding_script_pubkey,
        dlc_transactions.get_fund_output()?.value,
    )? {
        return Ok(false);
    }

    primitives.verify_tx_input_signature(
        &signed_contract.offer_refund_signature,
        &dlc_transactions.refund,
        0,
        &dlc_transactions.funding_script_pubkey,
        fund_output_value,
        offer_fund_pubkey,
    )
}

fn get_outpoints(inputs: &[TxInputInfo]) -> Vec<OutPoint> {
    inputs.iter().map(|x| x.outpoint).collect()
}

fn get_accept_params(accept_dlc: &AcceptDlc) -> Result<PartyParams, Error> {
    let mut input_amount = Amount::ZERO;
    let mut inputs = Vec::with_capacity(accept_dlc.funding_inputs.len());
    for funding_input in &accept_dlc.funding_inputs {
        input_amount = input_amount
            .checked_add(funding_input.get_prev_output()?.value)
            .ok_or_else(|| Error::InvalidParameters("Input amount overflow.".to_string()))?;
        inputs.push(TxInputInfo::try_from(funding_input)?);
    }

    Ok(PartyParams {
        fund_pubkey: accept_dlc.funding_pubkey,
        change_script_pubkey: accept_dlc.change_spk.clone(),
        change_serial_id: accept_dlc.change_serial_id,
        payout_script_pubkey: accept_dlc.payout_spk.clone(),
        payout_serial_id: accept_dlc.payout_serial_id,
        inputs,
        input_amount,
        collateral: accept_dlc.accept_collateral,
    })
}

fn get_input_orderer(
    offer_params: &PartyParams,
    accept_params: &PartyParams,
) -> Result<SerialIdOrderer, Error> {
    let serial_ids = offer_params
        .inputs
        .iter()
        .chain(accept_params.inputs.iter())
        .map(|x| x.serial_id)
        .collect::<Vec<_>>();
    Ok(SerialIdOrderer::new(&serial_ids)?)
}

fn get_input_index(orderer: &SerialIdOrderer, serial_id: u64) -> Result<usize, Error> {
    orderer.get_index_for_id(serial_id).ok_or_else(|| {
        Error::InvalidState(format!("Could not find input for serial id {}", serial_id))
    })
}

fn get_contract_id(
    offered_contract: &OfferedContract,
    dlc_transactions: &DlcTransactions,
) -> Result<crate::ContractId, Error> {
    let fund_output_index = dlc_transactions.get_fund_output_index()?;
    Ok(compute_id(
        dlc_transactions.fund.compute_txid(),
        fund_output_index as u16,
        &offered_contract.id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_release_policy_test() {
        let policy = UtxoReleasePolicy::default();

        assert!(policy.on_reject.contains(&ContractState::Accepted));
        assert!(policy.on_reject.contains(&ContractState::Signed));
        assert!(!policy.on_reject.contains(&ContractState::Offered));
        assert!(policy.on_failure.contains(&ContractState::Offered));
        assert!(policy.on_failure.contains(&ContractState::Accepted));
        assert!(!policy.on_failure.contains(&ContractState::Signed));
    }
}
