pub mod mock_blockchain;
pub mod mock_wallet;

pub use dlc_negotiator;
