//! Property tests for the vector-clock algebra: merge commutativity,
//! associativity, and idempotence, plus the replay/reorder laws from the
//! causal-delivery spec.

use proptest::prelude::*;
use vclock_kv::clock::{Stamp, VectorClock};

const CLUSTER_SIZE: usize = 4;

fn arb_counts() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(0u64..1000, CLUSTER_SIZE)
}

fn merged(a: &[u64], b: &[u64]) -> Vec<u64> {
    a.iter().zip(b).map(|(x, y)| *x.max(y)).collect()
}

proptest! {
    #[test]
    fn merge_is_commutative(a in arb_counts(), b in arb_counts()) {
        let vc1 = VectorClock::new(0, CLUSTER_SIZE);
        vc1.merge(&Stamp::from(a.clone())).unwrap();
        vc1.merge(&Stamp::from(b.clone())).unwrap();

        let vc2 = VectorClock::new(0, CLUSTER_SIZE);
        vc2.merge(&Stamp::from(b)).unwrap();
        vc2.merge(&Stamp::from(a)).unwrap();

        prop_assert_eq!(vc1.snapshot(), vc2.snapshot());
    }

    #[test]
    fn merge_is_associative(a in arb_counts(), b in arb_counts(), c in arb_counts()) {
        // (a merge b) merge c
        let left = VectorClock::new(0, CLUSTER_SIZE);
        left.merge(&Stamp::from(a.clone())).unwrap();
        left.merge(&Stamp::from(b.clone())).unwrap();
        left.merge(&Stamp::from(c.clone())).unwrap();

        // a merge (b merge c), computed by folding in the other grouping's result
        let bc = merged(&b, &c);
        let right = VectorClock::new(0, CLUSTER_SIZE);
        right.merge(&Stamp::from(a)).unwrap();
        right.merge(&Stamp::from(bc)).unwrap();

        prop_assert_eq!(left.snapshot(), right.snapshot());
    }

    #[test]
    fn merging_the_same_stamp_twice_is_a_no_op(a in arb_counts()) {
        let vc = VectorClock::new(0, CLUSTER_SIZE);
        vc.merge(&Stamp::from(a.clone())).unwrap();
        let once = vc.snapshot();
        vc.merge(&Stamp::from(a)).unwrap();
        prop_assert_eq!(vc.snapshot(), once);
    }

    #[test]
    fn increment_never_decreases_any_component(a in arb_counts()) {
        let vc = VectorClock::new(2, CLUSTER_SIZE);
        vc.merge(&Stamp::from(a.clone())).unwrap();
        let before = vc.snapshot();
        let after = vc.increment();
        for i in 0..CLUSTER_SIZE {
            prop_assert!(after.get(i).unwrap() >= before.get(i).unwrap());
        }
    }

    #[test]
    fn wrong_length_stamps_are_always_rejected(len in 0usize..10) {
        prop_assume!(len != CLUSTER_SIZE);
        let vc = VectorClock::new(0, CLUSTER_SIZE);
        let stamp = Stamp::from(vec![0u64; len]);
        prop_assert!(vc.merge(&stamp).is_err());
        prop_assert!(!vc.ready_for(&stamp, 1));
    }
}
