use std::collections::BTreeSet;

use arbtest::arbtest;

use qbft_test::*;

use crate::cluster::{Cluster, N};

const MAX_STEPS: usize = 2_000;

/// Whatever the delivery order and the timeouts, members never decide
/// different values at the same height.
#[test]
fn one_value_per_height_under_any_schedule() {
    arbtest(|u| {
        let mut cluster = Cluster::new();
        cluster.start();

        let mut pending: Vec<(usize, TestSignedMessage)> = Vec::new();

        for _ in 0..MAX_STEPS {
            for msg in cluster.collect() {
                pending.extend((0..N).map(|index| (index, msg.clone())));
            }

            if !u.ratio(19, 20)? {
                let index = u.choose_index(N)?;
                cluster.timeout(index);
                continue;
            }

            if pending.is_empty() {
                break;
            }

            let next = u.choose_index(pending.len())?;
            let (index, msg) = pending.swap_remove(next);
            cluster.deliver(index, msg);
        }

        let roots: BTreeSet<_> = cluster
            .members
            .iter()
            .filter_map(|member| member.decided_value(0))
            .map(|value| value.root())
            .collect();

        assert!(roots.len() <= 1, "conflicting decisions: {roots:?}");

        for member in &cluster.members {
            assert!(member.decisions.len() <= 1);
        }

        Ok(())
    })
    .budget_ms(2_000);
}
