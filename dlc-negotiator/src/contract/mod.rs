//! Module containing structures and functions related to contracts.

use crate::messages::FundingInput;
use crate::ContractId;
use bitcoin::{Address, Transaction};
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

pub mod accepted_contract;
pub mod contract_info;
pub mod contract_input;
pub mod enum_descriptor;
pub mod numerical_descriptor;
pub mod offered_contract;
pub mod signed_contract;
pub(crate) mod utils;

use accepted_contract::AcceptedContract;
use offered_contract::OfferedContract;
use signed_contract::SignedContract;

/// The lifecycle state of a contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum ContractState {
    /// The contract was offered.
    Offered,
    /// The contract was accepted.
    Accepted,
    /// Both parties signed the contract.
    Signed,
    /// The fund transaction was broadcast.
    Broadcast,
    /// The contract was rejected.
    Rejected,
    /// The contract could not be completed.
    Failed,
}

#[derive(Clone)]
/// Enum representing the possible states of a DLC.
pub enum Contract {
    /// Initial state where a contract is being proposed.
    Offered(OfferedContract),
    /// A contract that was accepted.
    Accepted(AcceptedContract),
    /// A contract for which signatures have been produced.
    Signed(SignedContract),
    /// A contract whose fund transaction was broadcast.
    Broadcast(BroadcastContract),
    /// A contract that was rejected by one of the parties.
    Rejected(RejectedContract),
    /// A contract that failed after funds were committed to it.
    Failed(FailedContract),
}

impl std::fmt::Debug for Contract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contract")
            .field("state", &self.get_state())
            .finish()
    }
}

impl Contract {
    /// Get the id of a contract. Returns the temporary contract id for contracts
    /// that have no fund transaction yet.
    pub fn get_id(&self) -> ContractId {
        match self {
            Contract::Offered(o) => o.id,
            Contract::Accepted(a) => a.contract_id,
            Contract::Signed(s) => s.accepted_contract.contract_id,
            Contract::Broadcast(b) => b.signed_contract.accepted_contract.contract_id,
            Contract::Rejected(r) => r.contract.get_id(),
            Contract::Failed(f) => f.contract.get_id(),
        }
    }

    /// Returns the temporary contract id of a contract.
    pub fn get_temporary_id(&self) -> ContractId {
        match self {
            Contract::Offered(o) => o.id,
            Contract::Accepted(a) => a.offered_contract.id,
            Contract::Signed(s) => s.accepted_contract.offered_contract.id,
            Contract::Broadcast(b) => b.signed_contract.accepted_contract.offered_contract.id,
            Contract::Rejected(r) => r.contract.get_temporary_id(),
            Contract::Failed(f) => f.contract.get_temporary_id(),
        }
    }

    /// Returns the state of the contract.
    pub fn get_state(&self) -> ContractState {
        match self {
            Contract::Offered(_) => ContractState::Offered,
            Contract::Accepted(_) => ContractState::Accepted,
            Contract::Signed(_) => ContractState::Signed,
            Contract::Broadcast(_) => ContractState::Broadcast,
            Contract::Rejected(_) => ContractState::Rejected,
            Contract::Failed(_) => ContractState::Failed,
        }
    }
}

/// A contract that can still be rejected.
#[derive(Clone)]
pub enum PendingContract {
    /// An offered contract.
    Offered(OfferedContract),
    /// An accepted contract.
    Accepted(AcceptedContract),
    /// A signed contract whose fund transaction was not broadcast.
    Signed(SignedContract),
}

impl PendingContract {
    /// The state the contract was in.
    pub fn get_state(&self) -> ContractState {
        match self {
            PendingContract::Offered(_) => ContractState::Offered,
            PendingContract::Accepted(_) => ContractState::Accepted,
            PendingContract::Signed(_) => ContractState::Signed,
        }
    }

    /// The id of the contract, temporary if it was only offered.
    pub fn get_id(&self) -> ContractId {
        match self {
            PendingContract::Offered(o) => o.id,
            PendingContract::Accepted(a) => a.contract_id,
            PendingContract::Signed(s) => s.accepted_contract.contract_id,
        }
    }

    /// The temporary id of the contract.
    pub fn get_temporary_id(&self) -> ContractId {
        match self {
            PendingContract::Offered(o) => o.id,
            PendingContract::Accepted(a) => a.offered_contract.id,
            PendingContract::Signed(s) => s.accepted_contract.offered_contract.id,
        }
    }

    pub(crate) fn get_accepted_contract(&self) -> Option<&AcceptedContract> {
        match self {
            PendingContract::Offered(_) => None,
            PendingContract::Accepted(a) => Some(a),
            PendingContract::Signed(s) => Some(&s.accepted_contract),
        }
    }
}

impl From<OfferedContract> for PendingContract {
    fn from(c: OfferedContract) -> Self {
        PendingContract::Offered(c)
    }
}

impl From<AcceptedContract> for PendingContract {
    fn from(c: AcceptedContract) -> Self {
        PendingContract::Accepted(c)
    }
}

impl From<SignedContract> for PendingContract {
    fn from(c: SignedContract) -> Self {
        PendingContract::Signed(c)
    }
}

/// A contract for which funding inputs were committed.
#[derive(Clone)]
pub enum FundedContract {
    /// An accepted contract.
    Accepted(AcceptedContract),
    /// A signed contract.
    Signed(SignedContract),
}

impl FundedContract {
    /// The state the contract was in.
    pub fn get_state(&self) -> ContractState {
        match self {
            FundedContract::Accepted(_) => ContractState::Accepted,
            FundedContract::Signed(_) => ContractState::Signed,
        }
    }

    /// The accepted contract data.
    pub fn get_accepted_contract(&self) -> &AcceptedContract {
        match self {
            FundedContract::Accepted(a) => a,
            FundedContract::Signed(s) => &s.accepted_contract,
        }
    }

    /// The id of the contract.
    pub fn get_id(&self) -> ContractId {
        self.get_accepted_contract().contract_id
    }

    /// The temporary id of the contract.
    pub fn get_temporary_id(&self) -> ContractId {
        self.get_accepted_contract().offered_contract.id
    }
}

impl From<AcceptedContract> for FundedContract {
    fn from(c: AcceptedContract) -> Self {
        FundedContract::Accepted(c)
    }
}

impl From<SignedContract> for FundedContract {
    fn from(c: SignedContract) -> Self {
        FundedContract::Signed(c)
    }
}

/// A contract whose fund transaction was broadcast.
#[derive(Clone)]
pub struct BroadcastContract {
    /// The signed contract.
    pub signed_contract: SignedContract,
    /// The fully signed fund transaction that was broadcast.
    pub fund_transaction: Transaction,
}

/// A contract that was rejected.
#[derive(Clone)]
pub struct RejectedContract {
    /// The contract as it was when rejected.
    pub contract: PendingContract,
    /// Why the contract was rejected, if known.
    pub reason: Option<String>,
}

/// A contract that failed.
#[derive(Clone)]
pub struct FailedContract {
    /// The contract as it was when it failed.
    pub contract: FundedContract,
    /// What caused the failure.
    pub reason: String,
}

/// Information about a funding input.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct FundingInputInfo {
    /// The funding input as used in messages.
    pub funding_input: FundingInput,
    /// The address corresponding to the input if it belongs to us.
    #[cfg_attr(
        feature = "use-serde",
        serde(
            serialize_with = "crate::serde_utils::serialize_address",
            deserialize_with = "crate::serde_utils::deserialize_address"
        )
    )]
    pub address: Option<Address>,
}

/// The descriptor of a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum ContractDescriptor {
    /// Case for enumeration outcome DLC.
    Enum(enum_descriptor::EnumDescriptor),
    /// Case for numerical outcome DLC.
    Numerical(numerical_descriptor::NumericalDescriptor),
}
