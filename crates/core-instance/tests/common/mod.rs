#![allow(dead_code)]

use std::sync::Arc;

use qbft_core_instance::{Environment, Instance, Params};
use qbft_core_types::Height;
use qbft_test::*;

pub struct Node {
    pub instance: Instance<TestContext>,
    pub network: RecordingNetwork,
    pub timer: RecordingTimer,
    pub signers: [TestSigner; 4],
}

/// An instance at height 0 run by operator `id` of a committee of 4.
pub fn node(id: u64) -> Node {
    node_with_params(id, Params::default())
}

pub fn node_with_params(id: u64, params: Params) -> Node {
    let (signers, committee) = make_committee::<4>();
    let network = RecordingNetwork::new();
    let timer = RecordingTimer::new();

    let env = Environment::new(
        TestContext,
        Arc::new(signers[id as usize - 1].provider.clone()),
        Arc::new(network.clone()),
        Arc::new(timer.clone()),
    );

    let instance = Instance::new(env, params, committee, identifier(), Height::new(0));

    Node {
        instance,
        network,
        timer,
        signers,
    }
}

impl Node {
    pub fn last_broadcast(&self) -> Option<TestSignedMessage> {
        self.network.broadcasts().last().cloned()
    }

    /// Deliver the first round proposal of operator 1.
    pub fn accept_first_proposal(&mut self) {
        let proposal = self.signers[0].propose(0, 1, value());
        assert_eq!(self.instance.process_msg(proposal), Ok(None));
    }
}
