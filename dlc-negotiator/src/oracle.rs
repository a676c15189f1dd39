//! #Oracle
//! Description of the oracle and of the event it will attest to.

use crate::error::Error;
use secp256k1_zkp::XOnlyPublicKey;
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

/// Describes an event whose outcome is one of a fixed set of strings.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct EnumEventDescriptor {
    /// The possible outcomes of the event.
    pub outcomes: Vec<String>,
}

/// Describes a numeric event whose outcome is attested digit by digit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DigitDecompositionEventDescriptor {
    /// The base in which the outcome value is decomposed.
    pub base: u16,
    /// Whether the outcome can be negative.
    pub is_signed: bool,
    /// The unit of the outcome value.
    pub unit: String,
    /// The precision of the outcome, as a power of ten.
    pub precision: i32,
    /// The number of digits the oracle will sign.
    pub nb_digits: u16,
}

impl DigitDecompositionEventDescriptor {
    /// The largest outcome value the oracle can attest to.
    pub fn max_value(&self) -> u64 {
        (self.base as u64)
            .checked_pow(self.nb_digits as u32)
            .map(|x| x - 1)
            .unwrap_or(u64::MAX)
    }
}

/// The type of event an oracle will attest to.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum EventDescriptor {
    /// An enumerated outcome event.
    EnumEvent(EnumEventDescriptor),
    /// A numeric outcome event.
    DigitDecompositionEvent(DigitDecompositionEventDescriptor),
}

/// Information about the oracle used for a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct OracleInfo {
    /// The public key of the oracle.
    pub public_key: XOnlyPublicKey,
    /// The nonces the oracle committed to use for the event, one per signed
    /// message.
    pub nonces: Vec<XOnlyPublicKey>,
    /// The id of the event.
    pub event_id: String,
    /// The description of the event.
    pub event_descriptor: EventDescriptor,
}

impl OracleInfo {
    /// Checks that the number of nonces matches the event.
    pub fn validate(&self) -> Result<(), Error> {
        match &self.event_descriptor {
            EventDescriptor::EnumEvent(e) => {
                if self.nonces.len() != 1 {
                    return Err(Error::InvalidParameters(
                        "Enum events require a single nonce.".to_string(),
                    ));
                }
                if e.outcomes.is_empty() {
                    return Err(Error::InvalidParameters(
                        "Enum event has no outcome.".to_string(),
                    ));
                }
            }
            EventDescriptor::DigitDecompositionEvent(d) => {
                if d.is_signed {
                    return Err(Error::UnsupportedDescriptor(
                        "Signed numeric events are not supported.".to_string(),
                    ));
                }
                if d.base < 2 {
                    return Err(Error::InvalidParameters(format!(
                        "Invalid base {}.",
                        d.base
                    )));
                }
                if d.nb_digits == 0 || self.nonces.len() != d.nb_digits as usize {
                    return Err(Error::InvalidParameters(format!(
                        "Expected {} nonces, got {}.",
                        d.nb_digits,
                        self.nonces.len()
                    )));
                }
            }
        }

        Ok(())
    }

    /// The oracle information used by the transaction primitives.
    pub fn to_dlc_oracle_info(&self) -> dlc::OracleInfo {
        dlc::OracleInfo {
            public_key: self.public_key,
            nonces: self.nonces.clone(),
        }
    }
}
