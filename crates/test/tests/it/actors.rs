use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use qbft_config::RoundTimeouts;
use qbft_consensus_async::{Consensus, Handle, TokioRoundTimer};
use qbft_core_controller::{Controller, Params};
use qbft_core_instance::Environment;
use qbft_core_types::Height;
use qbft_metrics::Metrics;
use qbft_test::*;

use crate::cluster::{over_the_wire, N};

struct Peer {
    handle: Handle<TestContext>,
    network: RecordingNetwork,
}

fn spawn_peers() -> Vec<Peer> {
    init_logging();

    let (signers, committee) = make_committee::<N>();

    let timeouts = RoundTimeouts {
        quick: Duration::from_secs(60),
        ..RoundTimeouts::default()
    };

    signers
        .iter()
        .map(|signer| {
            let network = RecordingNetwork::new();
            let (timer, rx_timeout) = TokioRoundTimer::new(timeouts);

            let env = Environment::new(
                TestContext,
                Arc::new(signer.provider.clone()),
                Arc::new(network.clone()),
                Arc::new(timer),
            );

            let controller = Controller::new(
                identifier(),
                Arc::clone(&committee),
                env,
                Arc::new(InMemoryStorage::new()),
                Params::default(),
                Metrics::new(),
            );

            let (consensus, handle) = Consensus::new(controller, rx_timeout, 64);
            tokio::spawn(consensus.run());

            Peer { handle, network }
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn actors_decide_over_the_wire() {
    let peers = spawn_peers();

    for (index, peer) in peers.iter().enumerate() {
        let height = peer.handle.start(value_from(index as u64 + 1)).await.unwrap();
        assert_eq!(height, Height::ZERO);
    }

    let mut decisions = Vec::new();

    loop {
        let msgs: Vec<_> = peers
            .iter()
            .flat_map(|peer| peer.network.take_broadcasts())
            .map(|msg| over_the_wire(&msg))
            .collect();

        if msgs.is_empty() {
            break;
        }

        for msg in msgs {
            for peer in &peers {
                if let Ok(Some(decided)) = peer.handle.process_msg(msg.clone()).await {
                    decisions.push(decided);
                }
            }
        }
    }

    assert_eq!(decisions.len(), N);
    assert!(decisions.iter().all(|d| d.value == value_from(1)));
    assert!(peers.iter().all(|peer| peer.network.decided().len() == 1));
}
