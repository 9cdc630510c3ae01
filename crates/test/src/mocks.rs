use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use qbft_core_types::{
    Height, Identifier, Network, NetworkError, Round, RoundTimer, SignedMessage, Storage,
    StorageError,
};

use crate::context::TestContext;

#[derive(Default, Debug)]
struct NetworkLog {
    broadcasts: Vec<SignedMessage<TestContext>>,
    decided: Vec<SignedMessage<TestContext>>,
    failing: bool,
}

/// A network recording every message handed to it.
#[derive(Clone, Default, Debug)]
pub struct RecordingNetwork {
    log: Arc<Mutex<NetworkLog>>,
}

impl RecordingNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent broadcast fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.log.lock().unwrap().failing = failing;
    }

    /// All consensus messages broadcast so far.
    pub fn broadcasts(&self) -> Vec<SignedMessage<TestContext>> {
        self.log.lock().unwrap().broadcasts.clone()
    }

    /// Drain the consensus messages broadcast so far.
    pub fn take_broadcasts(&self) -> Vec<SignedMessage<TestContext>> {
        std::mem::take(&mut self.log.lock().unwrap().broadcasts)
    }

    /// All decisions announced so far.
    pub fn decided(&self) -> Vec<SignedMessage<TestContext>> {
        self.log.lock().unwrap().decided.clone()
    }
}

impl Network<TestContext> for RecordingNetwork {
    fn broadcast(&self, msg: &SignedMessage<TestContext>) -> Result<(), NetworkError> {
        let mut log = self.log.lock().unwrap();
        if log.failing {
            return Err(NetworkError("network is down".to_string()));
        }

        log.broadcasts.push(msg.clone());
        Ok(())
    }

    fn broadcast_decided(&self, msg: &SignedMessage<TestContext>) -> Result<(), NetworkError> {
        let mut log = self.log.lock().unwrap();
        if log.failing {
            return Err(NetworkError("network is down".to_string()));
        }

        log.decided.push(msg.clone());
        Ok(())
    }
}

#[derive(Default, Debug)]
struct Store {
    decided: HashMap<Identifier, SignedMessage<TestContext>>,
    saves: usize,
    failing: bool,
}

/// A decision store kept in memory.
#[derive(Clone, Default, Debug)]
pub struct InMemoryStorage {
    store: Arc<Mutex<Store>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent access fail, or succeed again.
    pub fn set_failing(&self, failing: bool) {
        self.store.lock().unwrap().failing = failing;
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.store.lock().unwrap().saves
    }

    /// The stored decision for the identifier, bypassing failure injection.
    pub fn stored(&self, identifier: &Identifier) -> Option<SignedMessage<TestContext>> {
        self.store.lock().unwrap().decided.get(identifier).cloned()
    }
}

impl Storage<TestContext> for InMemoryStorage {
    fn save_highest_decided(
        &self,
        identifier: &Identifier,
        msg: &SignedMessage<TestContext>,
    ) -> Result<(), StorageError> {
        let mut store = self.store.lock().unwrap();
        if store.failing {
            return Err(StorageError("disk is full".to_string()));
        }

        store.decided.insert(identifier.clone(), msg.clone());
        store.saves += 1;
        Ok(())
    }

    fn get_highest_decided(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<SignedMessage<TestContext>>, StorageError> {
        let store = self.store.lock().unwrap();
        if store.failing {
            return Err(StorageError("disk is unreadable".to_string()));
        }

        Ok(store.decided.get(identifier).cloned())
    }
}

/// A timer recording every scheduled timeout.
#[derive(Clone, Default, Debug)]
pub struct RecordingTimer {
    scheduled: Arc<Mutex<Vec<(Height, Round)>>>,
    cancelled: Arc<Mutex<Vec<Height>>>,
}

impl RecordingTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<(Height, Round)> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn last_scheduled(&self) -> Option<(Height, Round)> {
        self.scheduled.lock().unwrap().last().copied()
    }

    pub fn cancelled(&self) -> usize {
        self.cancelled.lock().unwrap().len()
    }

    /// Heights of the cancellations, in order.
    pub fn cancelled_heights(&self) -> Vec<Height> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl RoundTimer for RecordingTimer {
    fn schedule(&self, height: Height, round: Round) {
        self.scheduled.lock().unwrap().push((height, round));
    }

    fn cancel(&self, height: Height) {
        self.cancelled.lock().unwrap().push(height);
    }
}
