//! #EnumDescriptor

use super::utils::unordered_equal;
use crate::error::Error;
use crate::oracle::EnumEventDescriptor;
use bitcoin::Amount;
use dlc::{EnumerationPayout, Payout};
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

/// A descriptor for a contract whose outcomes are represented as an enumeration.
/// The CET for the i-th outcome pays the i-th payout.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct EnumDescriptor {
    /// The set of outcomes.
    pub outcome_payouts: Vec<EnumerationPayout>,
}

impl EnumDescriptor {
    /// Returns the set of payouts.
    pub fn get_payouts(&self) -> Vec<Payout> {
        self.outcome_payouts.iter().map(|x| x.payout).collect()
    }

    /// Returns the outcomes, in the order of their payouts.
    pub fn get_outcomes(&self) -> Vec<String> {
        self.outcome_payouts
            .iter()
            .map(|x| x.outcome.clone())
            .collect()
    }

    /// Validate that the descriptor covers all possible outcomes of the given
    /// enum event descriptor and that every payout distributes exactly the
    /// total collateral.
    pub fn validate(
        &self,
        enum_event_descriptor: &EnumEventDescriptor,
        total_collateral: Amount,
    ) -> Result<(), Error> {
        if !unordered_equal(
            &enum_event_descriptor.outcomes.iter().collect::<Vec<_>>(),
            &self
                .outcome_payouts
                .iter()
                .map(|x| &x.outcome)
                .collect::<Vec<_>>(),
        ) {
            return Err(Error::InvalidParameters(
                "Oracle outcomes do not each have a single associated payout.".to_string(),
            ));
        }

        for outcome_payout in &self.outcome_payouts {
            let payout = &outcome_payout.payout;
            if payout.offer.checked_add(payout.accept) != Some(total_collateral) {
                return Err(Error::InvalidParameters(format!(
                    "Payout for outcome {} does not match total collateral.",
                    outcome_payout.outcome
                )));
            }
        }

        Ok(())
    }
}
