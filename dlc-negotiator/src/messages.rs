//! Payloads exchanged by the parties while negotiating a contract.

use crate::contract::contract_info::ContractInfo;
use crate::error::Error;
use crate::ContractId;
use bitcoin::{Amount, OutPoint, ScriptBuf, Transaction, TxOut, Witness};
use dlc::TxInputInfo;
use secp256k1_zkp::ecdsa::Signature;
use secp256k1_zkp::{EcdsaAdaptorSignature, PublicKey};
use std::convert::TryFrom;

/// The protocol version of the payloads.
pub const PROTOCOL_VERSION: u32 = 1;

/// Contains information about a specific input to be used in a funding transaction,
/// as well as its corresponding on-chain UTXO.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct FundingInput {
    /// Serial id used for ordering the inputs of the fund transaction.
    pub input_serial_id: u64,
    /// The consensus serialized transaction containing the spent output.
    #[cfg_attr(
        feature = "use-serde",
        serde(
            serialize_with = "crate::serde_utils::serialize_hex",
            deserialize_with = "crate::serde_utils::deserialize_hex_string"
        )
    )]
    pub prev_tx: Vec<u8>,
    /// The index of the spent output in `prev_tx`.
    pub prev_tx_vout: u32,
    /// The sequence number to use for the input.
    pub sequence: u32,
    /// The maximum length of the witness that will satisfy the input.
    pub max_witness_len: u16,
    /// The redeem script of the input, empty for native segwit inputs.
    pub redeem_script: ScriptBuf,
}

impl FundingInput {
    /// Decodes the previous transaction of the input.
    pub fn get_prev_tx(&self) -> Result<Transaction, Error> {
        Ok(bitcoin::consensus::deserialize(&self.prev_tx)?)
    }

    /// Returns the output spent by this input.
    pub fn get_prev_output(&self) -> Result<TxOut, Error> {
        self.get_prev_tx()?
            .output
            .get(self.prev_tx_vout as usize)
            .cloned()
            .ok_or_else(|| {
                Error::InvalidParameters(format!(
                    "Funding input refers to missing output {}",
                    self.prev_tx_vout
                ))
            })
    }
}

impl TryFrom<&FundingInput> for TxInputInfo {
    type Error = Error;

    fn try_from(funding_input: &FundingInput) -> Result<TxInputInfo, Error> {
        Ok(TxInputInfo {
            outpoint: OutPoint {
                txid: funding_input.get_prev_tx()?.compute_txid(),
                vout: funding_input.prev_tx_vout,
            },
            max_witness_len: funding_input.max_witness_len as usize,
            redeem_script: funding_input.redeem_script.clone(),
            serial_id: funding_input.input_serial_id,
        })
    }
}

/// Contains serialized data representing a single witness stack element.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct WitnessElement {
    /// The witness element.
    #[cfg_attr(
        feature = "use-serde",
        serde(
            serialize_with = "crate::serde_utils::serialize_hex",
            deserialize_with = "crate::serde_utils::deserialize_hex_string"
        )
    )]
    pub witness: Vec<u8>,
}

/// Contains the witness elements satisfying the spending conditions of a
/// funding input.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct FundingSignature {
    /// The witness stack elements.
    pub witness_elements: Vec<WitnessElement>,
}

impl From<&Witness> for FundingSignature {
    fn from(witness: &Witness) -> FundingSignature {
        FundingSignature {
            witness_elements: witness
                .iter()
                .map(|x| WitnessElement {
                    witness: x.to_vec(),
                })
                .collect(),
        }
    }
}

impl From<&FundingSignature> for Witness {
    fn from(funding_signature: &FundingSignature) -> Witness {
        Witness::from_slice(
            &funding_signature
                .witness_elements
                .iter()
                .map(|x| x.witness.clone())
                .collect::<Vec<_>>(),
        )
    }
}

/// Contains a list of witnesses, one per funding input of the offering party,
/// in the order the inputs were offered.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct FundingSignatures {
    /// The funding signatures.
    pub funding_signatures: Vec<FundingSignature>,
}

/// Contains information about a party wishing to enter into a DLC with
/// another party. The contained information is sufficient for any other party
/// to create a set of transactions representing the contract and its terms.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct OfferDlc {
    /// The version of the protocol used by the offering party.
    pub protocol_version: u32,
    /// Feature flags, currently always zero.
    pub contract_flags: u8,
    /// The hash of the genesis block of the chain the contract lives on.
    #[cfg_attr(
        feature = "use-serde",
        serde(
            serialize_with = "crate::serde_utils::serialize_hex",
            deserialize_with = "crate::serde_utils::deserialize_hex_array"
        )
    )]
    pub chain_hash: [u8; 32],
    /// The temporary id of the contract.
    #[cfg_attr(
        feature = "use-serde",
        serde(
            serialize_with = "crate::serde_utils::serialize_hex",
            deserialize_with = "crate::serde_utils::deserialize_hex_array"
        )
    )]
    pub temporary_contract_id: ContractId,
    /// The payout conditions and oracle of the contract.
    pub contract_info: ContractInfo,
    /// The sum of both parties collateral.
    pub total_collateral: Amount,
    /// The public key of the offering party used in the funding output.
    pub funding_pubkey: PublicKey,
    /// The script pubkey receiving the offering party's payout.
    pub payout_spk: ScriptBuf,
    /// Serial id used for ordering the CET outputs.
    pub payout_serial_id: u64,
    /// The collateral of the offering party.
    pub offer_collateral: Amount,
    /// The inputs of the offering party.
    pub funding_inputs: Vec<FundingInput>,
    /// The script pubkey receiving the offering party's change.
    pub change_spk: ScriptBuf,
    /// Serial id used for ordering the fund transaction outputs.
    pub change_serial_id: u64,
    /// Serial id of the fund output.
    pub fund_output_serial_id: u64,
    /// The fee rate used for the contract transactions.
    pub fee_rate_per_vb: u64,
    /// The lock time of the CETs.
    pub contract_maturity_bound: u32,
    /// The lock time of the refund transaction.
    pub contract_timeout: u32,
}

/// Contains information about a party accepting a contract offer.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct AcceptDlc {
    /// The temporary id of the accepted contract.
    #[cfg_attr(
        feature = "use-serde",
        serde(
            serialize_with = "crate::serde_utils::serialize_hex",
            deserialize_with = "crate::serde_utils::deserialize_hex_array"
        )
    )]
    pub temporary_contract_id: ContractId,
    /// The collateral of the accepting party.
    pub accept_collateral: Amount,
    /// The public key of the accepting party used in the funding output.
    pub funding_pubkey: PublicKey,
    /// The script pubkey receiving the accepting party's payout.
    pub payout_spk: ScriptBuf,
    /// Serial id used for ordering the CET outputs.
    pub payout_serial_id: u64,
    /// The inputs of the accepting party.
    pub funding_inputs: Vec<FundingInput>,
    /// The script pubkey receiving the accepting party's change.
    pub change_spk: ScriptBuf,
    /// Serial id used for ordering the fund transaction outputs.
    pub change_serial_id: u64,
    /// The adaptor signatures of the accepting party, one per outcome group.
    pub cet_adaptor_signatures: Vec<EcdsaAdaptorSignature>,
    /// The signature of the accepting party for the refund transaction.
    pub refund_signature: Signature,
}

/// Contains all the required signatures for the DLC transactions from the
/// offering party.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct SignDlc {
    /// The id of the contract.
    #[cfg_attr(
        feature = "use-serde",
        serde(
            serialize_with = "crate::serde_utils::serialize_hex",
            deserialize_with = "crate::serde_utils::deserialize_hex_array"
        )
    )]
    pub contract_id: ContractId,
    /// The adaptor signatures of the offering party, one per outcome group.
    pub cet_adaptor_signatures: Vec<EcdsaAdaptorSignature>,
    /// The signature of the offering party for the refund transaction.
    pub refund_signature: Signature,
    /// The witnesses for the funding inputs of the offering party.
    pub funding_signatures: FundingSignatures,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::consensus::encode::serialize;
    use bitcoin::{absolute::LockTime, transaction::Version, TxIn};

    fn prev_tx() -> Transaction {
        Transaction {
            version: Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn::default()],
            output: vec![
                TxOut {
                    value: Amount::from_sat(1000),
                    script_pubkey: ScriptBuf::new(),
                },
                TxOut {
                    value: Amount::from_sat(2000),
                    script_pubkey: ScriptBuf::new(),
                },
            ],
        }
    }

    fn funding_input(prev_tx_vout: u32) -> FundingInput {
        FundingInput {
            input_serial_id: 42,
            prev_tx: serialize(&prev_tx()),
            prev_tx_vout,
            sequence: 0xffffffff,
            max_witness_len: 107,
            redeem_script: ScriptBuf::new(),
        }
    }

    #[test]
    fn funding_input_to_tx_input_info() {
        let info = TxInputInfo::try_from(&funding_input(1)).unwrap();

        assert_eq!(prev_tx().compute_txid(), info.outpoint.txid);
        assert_eq!(1, info.outpoint.vout);
        assert_eq!(42, info.serial_id);
        assert_eq!(107, info.max_witness_len);
    }

    #[test]
    fn funding_input_prev_output() {
        assert_eq!(
            Amount::from_sat(2000),
            funding_input(1).get_prev_output().unwrap().value
        );
        assert!(funding_input(2).get_prev_output().is_err());
    }

    #[test]
    fn funding_input_bad_prev_tx() {
        let mut input = funding_input(0);
        input.prev_tx = vec![1, 2, 3];

        assert!(matches!(
            TxInputInfo::try_from(&input),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn funding_signature_witness_conversion() {
        let witness = Witness::from_slice(&[vec![1u8, 2, 3], vec![4u8, 5]]);
        let funding_signature = FundingSignature::from(&witness);

        assert_eq!(2, funding_signature.witness_elements.len());
        assert_eq!(witness, Witness::from(&funding_signature));
    }
}
