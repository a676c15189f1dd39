//! #ContractInput

use super::contract_info::ContractInfo;
use crate::error::Error;
use bitcoin::Amount;
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
/// Contains all the information necessary for the initialization of a DLC.
pub struct ContractInput {
    /// The collateral for the offering party.
    pub offer_collateral: Amount,
    /// The collateral for the accepting party.
    pub accept_collateral: Amount,
    /// The fee rate used to construct the transactions.
    pub fee_rate: u64,
    /// The contract conditions and oracle.
    pub contract_info: ContractInfo,
    /// The lock time of the CETs.
    pub contract_maturity_bound: u32,
    /// The lock time of the refund transaction.
    pub contract_timeout: u32,
}

impl ContractInput {
    /// Returns the sum of both parties collateral.
    pub fn get_total_collateral(&self) -> Result<Amount, Error> {
        self.offer_collateral
            .checked_add(self.accept_collateral)
            .ok_or_else(|| Error::InvalidParameters("Collateral overflow.".to_string()))
    }

    /// Validate the contract input parameters
    pub fn validate(&self) -> Result<(), Error> {
        dlc::util::validate_fee_rate(self.fee_rate)
            .map_err(|_| Error::InvalidParameters("Fee rate too high.".to_string()))?;

        let total_collateral = self.get_total_collateral()?;
        if total_collateral == Amount::ZERO {
            return Err(Error::InvalidParameters(
                "Total collateral cannot be zero.".to_string(),
            ));
        }

        if self.contract_maturity_bound >= self.contract_timeout {
            return Err(Error::InvalidParameters(
                "Contract timeout must be after its maturity.".to_string(),
            ));
        }

        self.contract_info.validate(total_collateral)
    }
}
