//! #NumericalDescriptor

use crate::error::Error;
use crate::payout_curve::{PayoutFunction, RoundingIntervals};
use bitcoin::Amount;
use dlc::{Payout, RangePayout};
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
/// Contains information about a contract based on a numerical outcome.
pub struct NumericalDescriptor {
    /// The function representing the set of payouts.
    pub payout_function: PayoutFunction,
    /// Rounding intervals enabling reducing the precision of the payout values
    /// which in turns reduces the number of required adaptor signatures.
    pub rounding_intervals: RoundingIntervals,
}

impl NumericalDescriptor {
    /// Returns the set of RangePayout for the descriptor generated from the
    /// payout function.
    pub fn get_range_payouts(&self, total_collateral: Amount) -> Result<Vec<RangePayout>, Error> {
        self.payout_function
            .to_range_payouts(total_collateral, &self.rounding_intervals)
    }

    /// Validate that the descriptor covers all possible outcomes up to
    /// `max_value`.
    pub fn validate(&self, max_value: u64) -> Result<(), Error> {
        self.payout_function.validate(max_value)
    }

    /// Returns the set of payouts for the descriptor generated from the payout
    /// function, one per range.
    pub fn get_payouts(&self, total_collateral: Amount) -> Result<Vec<Payout>, Error> {
        Ok(self
            .get_range_payouts(total_collateral)?
            .iter()
            .map(|x| x.payout)
            .collect())
    }
}
