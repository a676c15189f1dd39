//! #ContractInfo

use super::ContractDescriptor;
use crate::error::Error;
use crate::oracle::{EventDescriptor, OracleInfo};
use bitcoin::Amount;
use dlc::{Payout, RangePayout};
use dlc_trie::digit_decomposition::pad_range_payouts;
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

/// Contains information about the contract conditions and oracle used.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct ContractInfo {
    /// The descriptor for the contract
    pub contract_descriptor: ContractDescriptor,
    /// The oracle used for the contract.
    pub oracle_info: OracleInfo,
}

impl ContractInfo {
    /// Checks that the descriptor can be used with the event of the oracle and
    /// that it covers every outcome the oracle can attest to.
    pub fn validate(&self, total_collateral: Amount) -> Result<(), Error> {
        match (
            &self.contract_descriptor,
            &self.oracle_info.event_descriptor,
        ) {
            (ContractDescriptor::Enum(e), EventDescriptor::EnumEvent(ee)) => {
                self.oracle_info.validate()?;
                e.validate(ee, total_collateral)
            }
            (ContractDescriptor::Enum(_), EventDescriptor::DigitDecompositionEvent(_)) => {
                Err(Error::UnsupportedDescriptor(
                    "Enum contract descriptor cannot be used with a numeric event.".to_string(),
                ))
            }
            (ContractDescriptor::Numerical(_), EventDescriptor::EnumEvent(_)) => {
                Err(Error::DescriptorMismatch(
                    "Numerical contract descriptor requires a digit decomposition event."
                        .to_string(),
                ))
            }
            (ContractDescriptor::Numerical(n), EventDescriptor::DigitDecompositionEvent(d)) => {
                self.oracle_info.validate()?;
                n.validate(d.max_value())?;
                n.get_range_payouts(total_collateral).map(|_| ())
            }
        }
    }

    /// Get the payouts associated with the contract, one per CET.
    pub fn get_payouts(&self, total_collateral: Amount) -> Result<Vec<Payout>, Error> {
        match &self.contract_descriptor {
            ContractDescriptor::Enum(e) => Ok(e.get_payouts()),
            ContractDescriptor::Numerical(n) => n.get_payouts(total_collateral),
        }
    }

    /// Returns the base and number of digits of the numeric event of the
    /// oracle. The number of digits is the number of nonces the oracle
    /// committed to.
    pub fn get_digit_params(&self) -> Result<(usize, usize), Error> {
        match &self.oracle_info.event_descriptor {
            EventDescriptor::DigitDecompositionEvent(d) => {
                Ok((d.base as usize, self.oracle_info.nonces.len()))
            }
            EventDescriptor::EnumEvent(_) => Err(Error::DescriptorMismatch(
                "Oracle event is not a digit decomposition event.".to_string(),
            )),
        }
    }

    /// Returns the range payouts of a numerical contract, extended to cover
    /// every value the oracle can attest to.
    pub fn get_range_payouts(&self, total_collateral: Amount) -> Result<Vec<RangePayout>, Error> {
        match &self.contract_descriptor {
            ContractDescriptor::Numerical(n) => {
                let (base, nb_digits) = self.get_digit_params()?;
                Ok(pad_range_payouts(
                    n.get_range_payouts(total_collateral)?,
                    base,
                    nb_digits,
                ))
            }
            ContractDescriptor::Enum(_) => Err(Error::UnsupportedDescriptor(
                "Enum contract descriptor has no range payouts.".to_string(),
            )),
        }
    }
}
