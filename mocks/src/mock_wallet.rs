use std::collections::HashMap;
use std::sync::Mutex;

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{
    Address, Amount, CompressedPublicKey, EcdsaSighashType, Network, OutPoint, Script, ScriptBuf,
    Sequence, Transaction, TxIn, TxOut, Txid, Witness,
};
use dlc_negotiator::{error::Error, Utxo, Wallet};
use secp256k1_zkp::{ecdsa::Signature, rand::thread_rng, PublicKey, SecretKey, SECP256K1};

use crate::mock_blockchain::MockBlockchain;

/// Wallet holding its keys in memory, funded with one P2WPKH UTXO per amount
/// given at creation.
pub struct MockWallet {
    keys: Mutex<HashMap<PublicKey, SecretKey>>,
    address_keys: Mutex<HashMap<ScriptBuf, SecretKey>>,
    utxos: Mutex<Vec<Utxo>>,
}

impl MockWallet {
    pub fn new(blockchain: &MockBlockchain, amounts: &[Amount]) -> Self {
        let wallet = MockWallet {
            keys: Mutex::new(HashMap::new()),
            address_keys: Mutex::new(HashMap::new()),
            utxos: Mutex::new(Vec::with_capacity(amounts.len())),
        };

        for (i, amount) in amounts.iter().enumerate() {
            let address = wallet.new_address();
            let tx_out = TxOut {
                value: *amount,
                script_pubkey: address.script_pubkey(),
            };
            let tx = Transaction {
                version: Version::TWO,
                lock_time: LockTime::ZERO,
                input: vec![TxIn {
                    previous_output: OutPoint {
                        txid: Txid::all_zeros(),
                        vout: i as u32,
                    },
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::new(),
                }],
                output: vec![tx_out.clone()],
            };
            blockchain.add_transaction(&tx);
            wallet.utxos.lock().unwrap().push(Utxo {
                tx_out,
                outpoint: OutPoint {
                    txid: tx.compute_txid(),
                    vout: 0,
                },
                address,
                redeem_script: ScriptBuf::new(),
                reserved: false,
            });
        }

        wallet
    }

    /// The outpoints currently reserved.
    pub fn get_reserved_outpoints(&self) -> Vec<OutPoint> {
        self.utxos
            .lock()
            .unwrap()
            .iter()
            .filter(|x| x.reserved)
            .map(|x| x.outpoint)
            .collect()
    }

    pub fn get_utxos(&self) -> Vec<Utxo> {
        self.utxos.lock().unwrap().clone()
    }

    fn new_secret_key(&self) -> (SecretKey, PublicKey) {
        let sk = SecretKey::new(&mut thread_rng());
        let pk = PublicKey::from_secret_key(SECP256K1, &sk);
        self.keys.lock().unwrap().insert(pk, sk);
        (sk, pk)
    }

    fn new_address(&self) -> Address {
        let (sk, pk) = self.new_secret_key();
        let address = Address::p2wpkh(&CompressedPublicKey(pk), Network::Regtest);
        self.address_keys
            .lock()
            .unwrap()
            .insert(address.script_pubkey(), sk);
        address
    }

    fn get_secret_key_for_address(&self, address: &Address) -> Result<SecretKey, Error> {
        self.address_keys
            .lock()
            .unwrap()
            .get(&address.script_pubkey())
            .cloned()
            .ok_or_else(|| Error::InvalidParameters(format!("Unknown address {}", address)))
    }
}

impl Wallet for MockWallet {
    fn get_new_public_key(&self) -> Result<PublicKey, Error> {
        Ok(self.new_secret_key().1)
    }

    fn get_new_address(&self) -> Result<Address, Error> {
        Ok(self.new_address())
    }

    fn get_new_change_address(&self) -> Result<Address, Error> {
        Ok(self.new_address())
    }

    fn get_utxos_for_amount(
        &self,
        amount: Amount,
        _fee_rate: u64,
        lock_utxos: bool,
    ) -> Result<Vec<Utxo>, Error> {
        let mut utxos = self.utxos.lock().unwrap();
        let mut sum = Amount::ZERO;
        let mut selected = Vec::new();

        for (i, utxo) in utxos.iter().enumerate() {
            if sum >= amount {
                break;
            }
            if utxo.reserved {
                continue;
            }
            sum += utxo.tx_out.value;
            selected.push(i);
        }

        if sum < amount {
            return Err(Error::InsufficientFunds);
        }

        if lock_utxos {
            for i in &selected {
                utxos[*i].reserved = true;
            }
        }

        Ok(selected.iter().map(|i| utxos[*i].clone()).collect())
    }

    fn get_secret_key_for_pubkey(&self, pubkey: &PublicKey) -> Result<SecretKey, Error> {
        self.keys
            .lock()
            .unwrap()
            .get(pubkey)
            .cloned()
            .ok_or_else(|| Error::InvalidParameters("Unknown public key".to_string()))
    }

    fn sign_p2wpkh_input(
        &self,
        tx: &mut Transaction,
        input_index: usize,
        value: Amount,
        address: &Address,
    ) -> Result<(), Error> {
        let sk = self.get_secret_key_for_address(address)?;
        dlc::util::sign_p2wpkh_input(
            SECP256K1,
            &sk,
            tx,
            input_index,
            EcdsaSighashType::All,
            value,
        )?;
        Ok(())
    }

    fn get_der_signature(
        &self,
        tx: &Transaction,
        input_index: usize,
        value: Amount,
        pubkey: &PublicKey,
        script_pubkey: &Script,
    ) -> Result<Signature, Error> {
        let sk = self.get_secret_key_for_pubkey(pubkey)?;
        Ok(dlc::util::get_raw_sig_for_tx_input(
            SECP256K1,
            tx,
            input_index,
            script_pubkey,
            value,
            &sk,
        )?)
    }

    fn unreserve_utxos(&self, outpoints: &[OutPoint]) -> Result<(), Error> {
        for utxo in self.utxos.lock().unwrap().iter_mut() {
            if outpoints.contains(&utxo.outpoint) {
                utxo.reserved = false;
            }
        }
        Ok(())
    }
}
