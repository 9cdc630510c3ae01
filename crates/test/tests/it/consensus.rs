use pretty_assertions::assert_eq;

use qbft_config::ConsensusConfig;
use qbft_core_types::{Height, MessageType, Round};
use qbft_test::*;

use crate::cluster::{Cluster, N};

#[test]
fn every_member_decides_the_leader_value() {
    let mut cluster = Cluster::new();

    cluster.start();
    cluster.run();

    for member in &cluster.members {
        assert_eq!(member.decided_value(0), Some(value_from(1)));
        assert_eq!(member.decisions.len(), 1);

        let decided = &member.decisions[0];
        assert_eq!(decided.height, Height::ZERO);
        assert_eq!(decided.commit.round(), Round::new(1));
        assert!(decided.commit.signers.len() >= 3);
        assert!(decided.side_effect_errors.is_empty());

        assert_eq!(member.storage.saves(), 1);
        assert_eq!(member.network.decided().len(), 1);
    }
}

#[test]
fn heights_follow_each_other_with_rotating_leaders() {
    let mut cluster = Cluster::new();

    for height in 0..6 {
        cluster.start();
        cluster.run();

        let leader = height % N as u64 + 1;
        for member in &cluster.members {
            assert_eq!(member.height(), Some(Height::new(height)));
            assert_eq!(member.decided_value(height), Some(value_from(leader)));
        }
    }

    // Only the five most recent heights are kept.
    let member = cluster.member(1);
    assert_eq!(member.controller.instances().count(), 5);
    assert!(member.controller.instance_for_height(Height::ZERO).is_none());

    let stored = member.storage.stored(&identifier()).unwrap();
    assert_eq!(stored.height(), Height::new(5));
}

#[test]
fn crashed_leader_is_replaced_in_the_next_round() {
    let mut cluster = Cluster::new();
    cluster.set_online(1, false);

    cluster.start();
    cluster.run();

    assert!(cluster.members.iter().all(|m| m.decisions.is_empty()));

    cluster.timeout_all();
    cluster.run();

    for id in 2..=4 {
        let member = cluster.member(id);
        assert_eq!(member.decided_value(0), Some(value_from(2)));
        assert_eq!(member.decisions[0].commit.round(), Round::new(2));
    }

    assert!(cluster.member(1).decisions.is_empty());
}

#[test]
fn prepared_value_survives_a_round_change() {
    let mut cluster = Cluster::new();
    cluster.start();

    // Proposal, then prepares, reach everyone.
    for _ in 0..2 {
        for msg in cluster.collect() {
            for index in 0..N {
                cluster.deliver(index, msg.clone());
            }
        }
    }

    // Commits are lost.
    let commits = cluster.collect();
    assert_eq!(commits.len(), N);
    assert!(commits.iter().all(|msg| msg.msg_type() == MessageType::Commit));

    cluster.timeout_all();
    cluster.run();

    // The leader of round 2 re-proposes what was prepared, not its own value.
    for member in &cluster.members {
        assert_eq!(member.decided_value(0), Some(value_from(1)));
        assert_eq!(member.decisions[0].commit.round(), Round::new(2));
    }
}

#[test]
fn lagging_member_catches_up_through_decided_messages() {
    let mut cluster = Cluster::new();
    cluster.set_online(4, false);

    cluster.start();
    cluster.run();

    let announcement = cluster.member(1).network.decided()[0].clone();

    cluster.set_online(4, true);
    cluster.deliver(3, announcement.clone());

    let lagging = cluster.member(4);
    assert_eq!(lagging.height(), Some(Height::ZERO));
    assert_eq!(lagging.storage.stored(&identifier()), Some(announcement));

    cluster.start();
    cluster.run();

    for member in &cluster.members {
        assert_eq!(member.decided_value(1), Some(value_from(2)));
    }
}

#[test]
fn members_stop_at_the_configured_round_cutoff() {
    let config = ConsensusConfig {
        round_cutoff: 3,
        ..ConsensusConfig::default()
    };

    let mut cluster = Cluster::with_config(&config);
    cluster.set_online(1, false);
    cluster.set_online(2, false);

    cluster.start();

    for _ in 0..4 {
        cluster.timeout_all();
        cluster.run();
    }

    for id in 3..=4 {
        let member = cluster.member(id);
        let instance = member.controller.instance_for_height(Height::ZERO).unwrap();

        assert!(instance.is_stopped());
        assert_eq!(instance.round(), Round::new(3));
        assert!(member.decisions.is_empty());
    }
}
