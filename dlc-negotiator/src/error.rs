//! #Error
use std::fmt;

/// An error code.
#[derive(Debug)]
pub enum Error {
    /// The wallet could not provide enough funds to cover the collateral and
    /// fees of the contract.
    InsufficientFunds,
    /// The contract descriptor cannot be used with the event of the oracle.
    UnsupportedDescriptor(String),
    /// A numerical contract descriptor was paired with an oracle event that is
    /// not a digit decomposition one.
    DescriptorMismatch(String),
    /// Two outcome groups overlap, the path is the one that failed to insert.
    Conflict(Vec<usize>),
    /// An input of the accepting party has no address to sign it with.
    MissingAddress,
    /// Some invalid parameters were provided.
    InvalidParameters(String),
    /// An invalid state was encounter, likely to indicate a bug.
    InvalidState(String),
    /// An error occurred in the wallet component.
    WalletError(Box<dyn std::error::Error + Send + Sync + 'static>),
    /// An error occurred in the blockchain component.
    BlockchainError(String),
    /// An error occurred in the DLC library.
    DlcError(dlc::Error),
    /// An error occurred in the Secp library.
    SecpError(secp256k1_zkp::Error),
    /// Deserialize error
    Deserialize(bitcoin::consensus::encode::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InsufficientFunds => write!(f, "Not enough UTXO for collateral and fees."),
            Error::UnsupportedDescriptor(ref s) => write!(f, "Unsupported descriptor: {}", s),
            Error::DescriptorMismatch(ref s) => write!(f, "Descriptor mismatch: {}", s),
            Error::Conflict(ref p) => write!(f, "Conflicting outcome group {:?}", p),
            Error::MissingAddress => {
                write!(f, "Accept party should have its input addresses set")
            }
            Error::InvalidParameters(ref s) => write!(f, "Invalid parameters were provided: {}", s),
            Error::InvalidState(ref s) => write!(f, "Invalid state: {}", s),
            Error::WalletError(ref e) => write!(f, "Wallet error {}", e),
            Error::BlockchainError(ref s) => write!(f, "Blockchain error {}", s),
            Error::DlcError(ref e) => write!(f, "Dlc error {}", e),
            Error::SecpError(ref e) => write!(f, "Secp error {}", e),
            Error::Deserialize(ref e) => write!(f, "Deserialize error: {}", e),
        }
    }
}

impl From<dlc::Error> for Error {
    fn from(e: dlc::Error) -> Error {
        Error::DlcError(e)
    }
}

impl From<dlc_trie::Error> for Error {
    fn from(e: dlc_trie::Error) -> Error {
        match e {
            dlc_trie::Error::Conflict(path) => Error::Conflict(path),
            dlc_trie::Error::InvalidPath => {
                Error::InvalidParameters("Invalid outcome digit path".to_string())
            }
        }
    }
}

impl From<secp256k1_zkp::Error> for Error {
    fn from(e: secp256k1_zkp::Error) -> Error {
        Error::SecpError(e)
    }
}

impl From<secp256k1_zkp::UpstreamError> for Error {
    fn from(e: secp256k1_zkp::UpstreamError) -> Error {
        Error::SecpError(secp256k1_zkp::Error::Upstream(e))
    }
}

impl From<bitcoin::consensus::encode::Error> for Error {
    fn from(e: bitcoin::consensus::encode::Error) -> Self {
        Error::Deserialize(e)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::WalletError(e) => Some(e.as_ref()),
            Error::DlcError(e) => Some(e),
            Error::SecpError(e) => Some(e),
            Error::Deserialize(e) => Some(e),
            _ => None,
        }
    }
}
