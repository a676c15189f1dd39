use std::collections::HashMap;
use std::sync::Mutex;

use bitcoin::{Transaction, Txid};
use dlc_negotiator::{error::Error, Blockchain};

/// In memory blockchain keeping track of known and broadcast transactions.
pub struct MockBlockchain {
    transactions: Mutex<HashMap<Txid, Transaction>>,
    broadcast: Mutex<Vec<Transaction>>,
    discard: Mutex<bool>,
}

impl MockBlockchain {
    pub fn new() -> Self {
        Self {
            transactions: Mutex::new(HashMap::new()),
            broadcast: Mutex::new(Vec::new()),
            discard: Mutex::new(false),
        }
    }

    /// Make the blockchain aware of a transaction without broadcasting it.
    pub fn add_transaction(&self, tx: &Transaction) {
        self.transactions
            .lock()
            .unwrap()
            .insert(tx.compute_txid(), tx.clone());
    }

    /// Make all subsequent broadcasts fail.
    pub fn start_discard(&self) {
        *self.discard.lock().unwrap() = true;
    }

    pub fn get_broadcast_transactions(&self) -> Vec<Transaction> {
        self.broadcast.lock().unwrap().clone()
    }
}

impl Default for MockBlockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl Blockchain for MockBlockchain {
    fn send_transaction(&self, transaction: &Transaction) -> Result<(), Error> {
        if *self.discard.lock().unwrap() {
            return Err(Error::BlockchainError(
                "Transaction was discarded".to_string(),
            ));
        }
        self.add_transaction(transaction);
        self.broadcast.lock().unwrap().push(transaction.clone());
        Ok(())
    }

    fn get_transaction(&self, tx_id: &Txid) -> Result<Transaction, Error> {
        self.transactions
            .lock()
            .unwrap()
            .get(tx_id)
            .cloned()
            .ok_or_else(|| Error::BlockchainError(format!("Unknown transaction {}", tx_id)))
    }
}
