//! #SignedContract

use super::accepted_contract::AcceptedContract;
use crate::messages::{FundingSignatures, SignDlc};
use secp256k1_zkp::ecdsa::Signature;
use secp256k1_zkp::EcdsaAdaptorSignature;

/// Contain information about a contract that was fully signed.
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "use-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct SignedContract {
    /// The accepted contract that was signed.
    pub accepted_contract: AcceptedContract,
    /// The refund signature of the offering party.
    pub offer_refund_signature: Signature,
    /// The adaptor signatures of the offering party.
    pub offer_adaptor_signatures: Vec<EcdsaAdaptorSignature>,
    /// The signatures for the funding inputs of the offering party.
    pub offer_funding_signatures: FundingSignatures,
}

impl SignedContract {
    /// Creates the sign message carrying the offering party's signatures.
    pub fn get_sign_dlc(&self) -> SignDlc {
        SignDlc {
            contract_id: self.accepted_contract.contract_id,
            cet_adaptor_signatures: self.offer_adaptor_signatures.clone(),
            refund_signature: self.offer_refund_signature,
            funding_signatures: self.offer_funding_signatures.clone(),
        }
    }
}
