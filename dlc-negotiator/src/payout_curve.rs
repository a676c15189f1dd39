//! #PayoutFunction

use crate::error::Error;
use bitcoin::Amount;
use dlc::{Payout, RangePayout};
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

/// Contains information to compute the set of payouts based on the outcomes.
/// The pieces are contiguous: each piece starts at the outcome where the
/// previous one ends.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PayoutFunction {
    /// The pieces making up the function.
    pub payout_function_pieces: Vec<PolynomialPayoutCurvePiece>,
}

impl PayoutFunction {
    /// Generate the range payouts from the function. Consecutive outcomes that
    /// round to the same payout are merged into a single range, including
    /// across pieces.
    pub fn to_range_payouts(
        &self,
        total_collateral: Amount,
        rounding_intervals: &RoundingIntervals,
    ) -> Result<Vec<RangePayout>, Error> {
        let mut res: Vec<RangePayout> = Vec::new();

        for (i, piece) in self.payout_function_pieces.iter().enumerate() {
            let first_outcome = piece.get_first_outcome()?;
            let last_outcome = piece.get_last_outcome()?;
            // The end point of a piece is the start point of the next one.
            let start = if i == 0 {
                first_outcome
            } else {
                first_outcome + 1
            };

            for outcome in start..=last_outcome {
                let offer = rounding_intervals.round(outcome, piece.evaluate(outcome));
                let payout = get_payout(offer, total_collateral)?;
                match res.last_mut() {
                    Some(cur) if cur.payout == payout => cur.count += 1,
                    _ => res.push(RangePayout {
                        start: outcome as usize,
                        count: 1,
                        payout,
                    }),
                }
            }
        }

        Ok(res)
    }

    /// Checks that the function is well formed and that it ends on
    /// `max_value`, the largest outcome that can be attested.
    pub fn validate(&self, max_value: u64) -> Result<(), Error> {
        let first = self.payout_function_pieces.first().ok_or_else(|| {
            Error::InvalidParameters("Payout function has no piece.".to_string())
        })?;

        if first.get_first_outcome()? != 0 {
            return Err(Error::InvalidParameters(
                "Payout function does not start at zero.".to_string(),
            ));
        }

        let mut prev_end: Option<&PayoutPoint> = None;
        for piece in &self.payout_function_pieces {
            piece.validate()?;
            if let Some(prev) = prev_end {
                if prev != &piece.payout_points[0] {
                    return Err(Error::InvalidParameters(
                        "Payout function is not continuous.".to_string(),
                    ));
                }
            }
            prev_end = piece.payout_points.last();
        }

        match prev_end {
            Some(last) if last.event_outcome == max_value => Ok(()),
            _ => Err(Error::InvalidParameters(format!(
                "Payout function should end at {}.",
                max_value
            ))),
        }
    }
}

fn get_payout(offer: u64, total_collateral: Amount) -> Result<Payout, Error> {
    let offer = Amount::from_sat(offer);
    let accept = total_collateral.checked_sub(offer).ok_or_else(|| {
        Error::InvalidParameters(format!(
            "Payout {} is greater than total collateral {}.",
            offer, total_collateral
        ))
    })?;
    Ok(Payout { offer, accept })
}

/// A function piece represented by a polynomial interpolated from a set of
/// points.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PolynomialPayoutCurvePiece {
    /// The set of points to be used to interpolate the polynomial.
    pub payout_points: Vec<PayoutPoint>,
}

impl PolynomialPayoutCurvePiece {
    fn evaluate(&self, outcome: u64) -> f64 {
        let mut result = 0.0;
        let outcome = outcome as f64;

        for (i, point_i) in self.payout_points.iter().enumerate() {
            let mut l = point_i.get_outcome_payout();
            for (j, point_j) in self.payout_points.iter().enumerate() {
                if i != j {
                    let i_outcome = point_i.event_outcome as f64;
                    let j_outcome = point_j.event_outcome as f64;
                    l *= (outcome - j_outcome) / (i_outcome - j_outcome);
                }
            }
            result += l;
        }

        result
    }

    fn get_first_outcome(&self) -> Result<u64, Error> {
        self.payout_points
            .first()
            .map(|x| x.event_outcome)
            .ok_or_else(|| Error::InvalidParameters("Empty payout curve piece.".to_string()))
    }

    fn get_last_outcome(&self) -> Result<u64, Error> {
        self.payout_points
            .last()
            .map(|x| x.event_outcome)
            .ok_or_else(|| Error::InvalidParameters("Empty payout curve piece.".to_string()))
    }

    fn validate(&self) -> Result<(), Error> {
        if self.payout_points.len() < 2 {
            return Err(Error::InvalidParameters(
                "A payout curve piece needs at least two points.".to_string(),
            ));
        }

        if self
            .payout_points
            .windows(2)
            .any(|w| w[0].event_outcome >= w[1].event_outcome)
        {
            return Err(Error::InvalidParameters(
                "Payout points must have increasing outcomes.".to_string(),
            ));
        }

        Ok(())
    }
}

/// A payout point representing a payout for a given outcome.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct PayoutPoint {
    /// The event outcome.
    pub event_outcome: u64,
    /// The payout for the outcome, in satoshis.
    pub outcome_payout: u64,
    /// Extra precision to use when computing the payout.
    pub extra_precision: u16,
}

impl PayoutPoint {
    fn get_outcome_payout(&self) -> f64 {
        (self.outcome_payout as f64) + ((self.extra_precision as f64) / ((1 << 16) as f64))
    }
}

/// Provides information on if and how to round the payouts of a payout function
/// to reduce the number of adaptor signatures required. A `rounding_mod` value
/// of 1 indicates that no rounding is performed.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RoundingInterval {
    /// The start of the rounding interval.
    pub begin_interval: u64,
    /// The rounding modulus value.
    pub rounding_mod: u64,
}

/// A set of rounding intervals, sorted by `begin_interval`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct RoundingIntervals {
    /// Contains the rounding intervals.
    pub intervals: Vec<RoundingInterval>,
}

impl RoundingIntervals {
    /// Round the given payout based on the rounding modulus matching the given
    /// outcome. Outcomes before the first interval are not rounded. Negative
    /// payouts are clamped to zero.
    pub fn round(&self, outcome: u64, payout: f64) -> u64 {
        let rounding_mod = match self
            .intervals
            .binary_search_by(|x| x.begin_interval.cmp(&outcome))
        {
            Ok(index) => self.intervals[index].rounding_mod,
            Err(index) if index != 0 => self.intervals[index - 1].rounding_mod,
            _ => 1,
        }
        .max(1) as f64;

        let m = if payout >= 0.0 {
            payout % rounding_mod
        } else {
            payout % rounding_mod + rounding_mod
        };

        let rounded = if m >= rounding_mod / 2.0 {
            (payout + rounding_mod - m).round()
        } else {
            (payout - m).round()
        };

        if rounded <= 0.0 {
            0
        } else {
            rounded as u64
        }
    }
}
