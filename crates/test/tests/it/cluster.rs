use std::sync::Arc;

use bytes::Bytes;

use qbft_codec::{CanonicalCodec, Codec};
use qbft_config::ConsensusConfig;
use qbft_core_controller::{Controller, Decided, Params};
use qbft_core_instance::Environment;
use qbft_core_types::{Height, Round, Value};
use qbft_metrics::Metrics;
use qbft_test::*;

/// Size of the simulated committee.
pub const N: usize = 4;

pub struct Member {
    pub controller: Controller<TestContext>,
    pub network: RecordingNetwork,
    pub storage: InMemoryStorage,
    pub timer: RecordingTimer,
    pub decisions: Vec<Decided<TestContext>>,
    pub online: bool,
}

impl Member {
    pub fn height(&self) -> Option<Height> {
        self.controller.height()
    }

    /// Current round of the latest instance.
    pub fn round(&self) -> Option<Round> {
        let height = self.height()?;
        self.controller
            .instance_for_height(height)
            .map(|instance| instance.round())
    }

    pub fn decided_value(&self, height: u64) -> Option<Value> {
        self.controller
            .instance_for_height(Height::new(height))
            .and_then(|instance| instance.decided_value().cloned())
    }
}

/// A committee of controllers exchanging messages through the wire codec.
pub struct Cluster {
    pub members: Vec<Member>,
    pub signers: [TestSigner; N],
}

impl Cluster {
    pub fn new() -> Self {
        Self::with_config(&ConsensusConfig::default())
    }

    pub fn with_config(config: &ConsensusConfig) -> Self {
        init_logging();

        let (signers, committee) = make_committee::<N>();

        let members = signers
            .iter()
            .map(|signer| {
                let network = RecordingNetwork::new();
                let storage = InMemoryStorage::new();
                let timer = RecordingTimer::new();

                let env = Environment::new(
                    TestContext,
                    Arc::new(signer.provider.clone()),
                    Arc::new(network.clone()),
                    Arc::new(timer.clone()),
                );

                let controller = Controller::new(
                    identifier(),
                    Arc::clone(&committee),
                    env,
                    Arc::new(storage.clone()),
                    Params::from(config),
                    Metrics::new(),
                );

                Member {
                    controller,
                    network,
                    storage,
                    timer,
                    decisions: Vec::new(),
                    online: true,
                }
            })
            .collect();

        Self { members, signers }
    }

    pub fn member(&self, id: u64) -> &Member {
        &self.members[id as usize - 1]
    }

    pub fn set_online(&mut self, id: u64, online: bool) {
        self.members[id as usize - 1].online = online;
    }

    /// Start the next height on every online member, each proposing its own value.
    pub fn start(&mut self) {
        for (index, member) in self.members.iter_mut().enumerate() {
            if member.online {
                let value = value_from(index as u64 + 1);
                member.controller.start_new_instance(value).unwrap();
            }
        }
    }

    /// Drain the messages broadcast by online members, in member order.
    ///
    /// Messages of offline members are lost.
    pub fn collect(&mut self) -> Vec<TestSignedMessage> {
        self.members
            .iter()
            .flat_map(|member| {
                let msgs = member.network.take_broadcasts();
                if member.online {
                    msgs
                } else {
                    Vec::new()
                }
            })
            .map(|msg| over_the_wire(&msg))
            .collect()
    }

    /// Deliver a message to member `index`, ignoring rejections.
    pub fn deliver(&mut self, index: usize, msg: TestSignedMessage) {
        let member = &mut self.members[index];
        if !member.online {
            return;
        }

        if let Ok(Some(decided)) = member.controller.process_msg(msg) {
            member.decisions.push(decided);
        }
    }

    /// Broadcast every pending message to every member until no new message is produced.
    pub fn run(&mut self) {
        loop {
            let msgs = self.collect();
            if msgs.is_empty() {
                break;
            }

            for msg in msgs {
                for index in 0..N {
                    self.deliver(index, msg.clone());
                }
            }
        }
    }

    /// Fire the timeout of the current round on every online member.
    pub fn timeout_all(&mut self) {
        for index in 0..N {
            self.timeout(index);
        }
    }

    pub fn timeout(&mut self, index: usize) {
        let member = &mut self.members[index];
        if !member.online {
            return;
        }

        if let (Some(height), Some(round)) = (member.height(), member.round()) {
            let _ = member.controller.on_timeout(height, round);
        }
    }
}

/// Encode and decode a message as peers would.
pub fn over_the_wire(msg: &TestSignedMessage) -> TestSignedMessage {
    let bytes: Bytes = Codec::<TestSignedMessage>::encode(&CanonicalCodec, msg).unwrap();
    Codec::<TestSignedMessage>::decode(&CanonicalCodec, bytes).unwrap()
}
