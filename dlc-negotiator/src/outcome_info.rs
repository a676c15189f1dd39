//! # Outcome information
//! Maps the outcomes of a contract to the adaptor signatures that unlock its
//! CETs, and creates or verifies those signatures.

use crate::contract::contract_info::ContractInfo;
use crate::contract::ContractDescriptor;
use crate::error::Error;
use crate::oracle::EventDescriptor;
use crate::DlcPrimitives;
use bitcoin::hashes::{sha256, Hash};
use bitcoin::{Amount, Script, Transaction};
use dlc_trie::digit_decomposition::group_by_ignoring_digits;
use dlc_trie::digit_trie::DigitTrie;
use dlc_trie::RangeInfo;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use secp256k1_zkp::{EcdsaAdaptorSignature, Message, PublicKey, SecretKey};
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

/// Relates the adaptor signatures of a contract to its outcomes.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum OutcomeInfo {
    /// The i-th adaptor signature and CET correspond to the i-th outcome.
    Enum(Vec<String>),
    /// Digit prefixes of the outcome value, each mapped to the indexes of its
    /// CET and adaptor signature.
    Numerical(DigitTrie<RangeInfo>),
}

impl OutcomeInfo {
    /// The number of adaptor signatures required for the contract.
    pub fn nb_adaptor_signatures(&self) -> usize {
        match self {
            OutcomeInfo::Enum(outcomes) => outcomes.len(),
            OutcomeInfo::Numerical(trie) => trie.len(),
        }
    }

    fn get_signature_groups(&self) -> Vec<SignatureGroup> {
        match self {
            OutcomeInfo::Enum(outcomes) => outcomes
                .iter()
                .enumerate()
                .map(|(i, outcome)| (i, i, vec![get_outcome_message(outcome)]))
                .collect(),
            OutcomeInfo::Numerical(trie) => trie
                .explore()
                .map(|x| {
                    (
                        x.value.adaptor_index,
                        x.value.cet_index,
                        get_digits_messages(&x.path),
                    )
                })
                .collect(),
        }
    }
}

// (adaptor index, cet index, messages)
type SignatureGroup = (usize, usize, Vec<Message>);

/// The messages an oracle attestation must cover to decrypt the adaptor
/// signature of a given CET.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutcomeGroup {
    /// The index of the CET unlocked by the group.
    pub cet_index: usize,
    /// The messages, one per oracle nonce used.
    pub messages: Vec<Message>,
}

/// Returns the message an oracle signs to attest to `outcome`.
pub fn get_outcome_message(outcome: &str) -> Message {
    Message::from_digest(sha256::Hash::hash(outcome.as_bytes()).to_byte_array())
}

/// Returns the messages an oracle signs to attest to the given digits.
pub fn get_digits_messages(digits: &[usize]) -> Vec<Message> {
    digits
        .iter()
        .map(|d| get_outcome_message(&d.to_string()))
        .collect()
}

/// Computes the outcome information of a contract together with the outcome
/// groups that need an adaptor signature, in adaptor signature order.
pub fn generate_outcome_groups(
    contract_info: &ContractInfo,
    total_collateral: Amount,
) -> Result<(OutcomeInfo, Vec<OutcomeGroup>), Error> {
    match (
        &contract_info.contract_descriptor,
        &contract_info.oracle_info.event_descriptor,
    ) {
        (ContractDescriptor::Enum(e), EventDescriptor::EnumEvent(_)) => {
            let outcomes = e.get_outcomes();
            let groups = outcomes
                .iter()
                .enumerate()
                .map(|(cet_index, outcome)| OutcomeGroup {
                    cet_index,
                    messages: vec![get_outcome_message(outcome)],
                })
                .collect();
            Ok((OutcomeInfo::Enum(outcomes), groups))
        }
        (ContractDescriptor::Enum(_), EventDescriptor::DigitDecompositionEvent(_)) => {
            Err(Error::UnsupportedDescriptor(
                "Enum contract descriptor cannot be used with a numeric event.".to_string(),
            ))
        }
        (ContractDescriptor::Numerical(_), EventDescriptor::EnumEvent(_)) => {
            Err(Error::DescriptorMismatch(
                "Numerical contract descriptor requires a digit decomposition event.".to_string(),
            ))
        }
        (ContractDescriptor::Numerical(_), EventDescriptor::DigitDecompositionEvent(_)) => {
            generate_numerical_outcome_groups(contract_info, total_collateral)
        }
    }
}

fn generate_numerical_outcome_groups(
    contract_info: &ContractInfo,
    total_collateral: Amount,
) -> Result<(OutcomeInfo, Vec<OutcomeGroup>), Error> {
    let (base, nb_digits) = contract_info.get_digit_params()?;
    if base < 2 || nb_digits == 0 {
        return Err(Error::InvalidParameters(
            "Invalid digit decomposition parameters.".to_string(),
        ));
    }
    let max_value = base.checked_pow(nb_digits as u32).map(|x| x - 1);

    let range_payouts = contract_info.get_range_payouts(total_collateral)?;
    let mut trie = DigitTrie::new(base);
    let mut groups = Vec::new();

    for (cet_index, range) in range_payouts.iter().enumerate() {
        let end = (range.start + range.count)
            .checked_sub(1)
            .ok_or_else(|| Error::InvalidParameters("Empty outcome range.".to_string()))?;
        if max_value.map_or(false, |max| end > max) {
            return Err(Error::InvalidParameters(format!(
                "Outcome {} cannot be attested with {} digits.",
                end, nb_digits
            )));
        }

        for digits in get_signable_prefixes(range.start, end, base, nb_digits) {
            trie.insert(
                &digits,
                RangeInfo {
                    cet_index,
                    adaptor_index: groups.len(),
                },
            )?;
            groups.push(OutcomeGroup {
                cet_index,
                messages: get_digits_messages(&digits),
            });
        }
    }

    debug!(
        "Generated {} outcome groups for {} ranges",
        groups.len(),
        range_payouts.len()
    );

    Ok((OutcomeInfo::Numerical(trie), groups))
}

// An adaptor signature needs at least one attested digit, so a range covering
// the whole domain is signed once per first digit instead of under the empty
// prefix.
fn get_signable_prefixes(
    start: usize,
    end: usize,
    base: usize,
    nb_digits: usize,
) -> Vec<Vec<usize>> {
    let groups = group_by_ignoring_digits(start, end, base, nb_digits);
    if groups.len() == 1 && groups[0].is_empty() {
        return (0..base).map(|digit| vec![digit]).collect();
    }
    groups
}

/// Generates the outcome information of a contract and the adaptor signatures
/// for each of its outcome groups, in group order.
#[allow(clippy::too_many_arguments)]
pub fn get_outcome_info<P: DlcPrimitives + ?Sized>(
    primitives: &P,
    contract_info: &ContractInfo,
    total_collateral: Amount,
    cets: &[Transaction],
    fund_privkey: &SecretKey,
    funding_script_pubkey: &Script,
    fund_output_value: Amount,
) -> Result<(OutcomeInfo, Vec<EcdsaAdaptorSignature>), Error> {
    let (outcome_info, groups) = generate_outcome_groups(contract_info, total_collateral)?;
    let oracle_info = contract_info.oracle_info.to_dlc_oracle_info();

    let sign = |group: &OutcomeGroup| -> Result<EcdsaAdaptorSignature, Error> {
        let cet = get_cet(cets, group.cet_index)?;
        primitives.create_cet_adaptor_signature(
            cet,
            fund_privkey,
            funding_script_pubkey,
            fund_output_value,
            &oracle_info,
            &group.messages,
        )
    };

    #[cfg(feature = "parallel")]
    let adaptor_sigs = groups
        .par_iter()
        .map(sign)
        .collect::<Result<Vec<_>, Error>>()?;
    #[cfg(not(feature = "parallel"))]
    let adaptor_sigs = groups.iter().map(sign).collect::<Result<Vec<_>, Error>>()?;

    Ok((outcome_info, adaptor_sigs))
}

/// Verifies that `adaptor_sigs` holds a valid adaptor signature by the owner
/// of `pubkey` for every outcome group of `outcome_info`. Returns `Ok(false)`
/// as soon as a signature is found invalid, and an error if the signatures do
/// not match the outcome information.
#[allow(clippy::too_many_arguments)]
pub fn verify_outcome_signatures<P: DlcPrimitives + ?Sized>(
    primitives: &P,
    contract_info: &ContractInfo,
    outcome_info: &OutcomeInfo,
    cets: &[Transaction],
    adaptor_sigs: &[EcdsaAdaptorSignature],
    pubkey: &PublicKey,
    funding_script_pubkey: &Script,
    fund_output_value: Amount,
) -> Result<bool, Error> {
    match (&contract_info.contract_descriptor, outcome_info) {
        (ContractDescriptor::Enum(_), OutcomeInfo::Enum(_))
        | (ContractDescriptor::Numerical(_), OutcomeInfo::Numerical(_)) => {}
        _ => {
            return Err(Error::InvalidState(
                "Outcome information does not match contract descriptor.".to_string(),
            ))
        }
    }

    let groups = outcome_info.get_signature_groups();
    if groups.len() != adaptor_sigs.len() {
        return Err(Error::InvalidParameters(format!(
            "Expected {} adaptor signatures, got {}.",
            groups.len(),
            adaptor_sigs.len()
        )));
    }

    let oracle_info = contract_info.oracle_info.to_dlc_oracle_info();

    let verify = |(adaptor_index, cet_index, msgs): &SignatureGroup| -> Result<bool, Error> {
        let adaptor_sig = adaptor_sigs.get(*adaptor_index).ok_or_else(|| {
            Error::InvalidParameters(format!("Missing adaptor signature {}.", adaptor_index))
        })?;
        primitives.verify_cet_adaptor_signature(
            adaptor_sig,
            get_cet(cets, *cet_index)?,
            &oracle_info,
            pubkey,
            funding_script_pubkey,
            fund_output_value,
            msgs,
        )
    };

    #[cfg(feature = "parallel")]
    let first_failure = groups
        .par_iter()
        .map(verify)
        .find_any(|res| !matches!(res, Ok(true)));
    #[cfg(not(feature = "parallel"))]
    let first_failure = groups
        .iter()
        .map(verify)
        .find(|res| !matches!(res, Ok(true)));

    match first_failure {
        Some(res) => res,
        None => Ok(true),
    }
}

fn get_cet(cets: &[Transaction], cet_index: usize) -> Result<&Transaction, Error> {
    cets.get(cet_index)
        .ok_or_else(|| Error::InvalidState(format!("Missing CET {}.", cet_index)))
}
