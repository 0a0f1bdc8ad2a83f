use {
    super::*,
    approx::assert_relative_eq,
    proptest::prelude::*,
};

fn cores(n: usize) -> CoreCount {
    CoreCount::new(n).unwrap()
}

fn snapshot(ticks: &[(u64, u64, u64, u64)]) -> TickSnapshot {
    ticks.iter().copied().map(Ticks::from).collect()
}

mod update_tests {
    use super::*;

    #[test]
    fn first_update_bootstraps() {
        let mut sentinel = Sentinel::new(cores(1));
        assert!(!sentinel.is_bootstrapped());
        let sample = sentinel.update(snapshot(&[(1, 2, 3, 4)])).unwrap();
        assert_eq!(sample, None);
        assert!(sentinel.is_bootstrapped());
    }

    #[test]
    fn identical_snapshots_are_idle() {
        let ticks = [(100, 50, 800, 7), (200, 100, 700, 0), (0, 0, 0, 0)];
        let mut sentinel = Sentinel::new(cores(3));
        sentinel.update(snapshot(&ticks)).unwrap();
        let sample = sentinel.update(snapshot(&ticks)).unwrap().unwrap();
        for percent in sample.iter() {
            assert_eq!(percent, Percent::ZERO);
            assert!(!percent.get().is_nan());
        }
    }

    #[test]
    fn half_busy() {
        let mut sentinel = Sentinel::new(cores(1));
        sentinel.update(snapshot(&[(0, 0, 0, 0)])).unwrap();
        let sample = sentinel.update(snapshot(&[(30, 20, 50, 0)])).unwrap().unwrap();
        assert_relative_eq!(sample.get(0).unwrap().get(), 50.0);
    }

    #[test]
    fn two_cores_end_to_end() {
        let mut sentinel = Sentinel::new(cores(2));

        let first = snapshot(&[(100, 50, 800, 0), (200, 100, 700, 0)]);
        assert_eq!(sentinel.update(first).unwrap(), None);

        let second = snapshot(&[(110, 60, 810, 0), (220, 110, 720, 0)]);
        let sample = sentinel.update(second).unwrap().unwrap();
        assert_eq!(sample.len(), 2);
        assert_relative_eq!(sample.get(0).unwrap().get(), 200.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(sample.get(1).unwrap().get(), 60.0, epsilon = 1e-9);
        assert_relative_eq!(sample.average().get(), (200.0 / 3.0 + 60.0) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn nice_time_is_active() {
        let mut sentinel = Sentinel::new(cores(1));
        sentinel.update(snapshot(&[(0, 0, 0, 0)])).unwrap();
        let sample = sentinel.update(snapshot(&[(0, 0, 25, 75)])).unwrap().unwrap();
        assert_relative_eq!(sample.get(0).unwrap().get(), 75.0);
    }

    /// each update compares against the snapshot before it, not the first one.
    #[test]
    fn retained_snapshot_is_replaced() {
        let mut sentinel = Sentinel::new(cores(1));
        sentinel.update(snapshot(&[(0, 0, 0, 0)])).unwrap();
        sentinel.update(snapshot(&[(100, 0, 0, 0)])).unwrap();
        let sample = sentinel.update(snapshot(&[(100, 0, 100, 0)])).unwrap().unwrap();
        assert_eq!(sample.get(0), Some(Percent::ZERO));
    }

    #[test]
    fn reset_returns_to_bootstrap() {
        let mut sentinel = Sentinel::new(cores(1));
        sentinel.update(snapshot(&[(0, 0, 0, 0)])).unwrap();
        sentinel.reset();
        assert!(!sentinel.is_bootstrapped());
        assert_eq!(sentinel.update(snapshot(&[(10, 0, 0, 0)])).unwrap(), None);
    }

    #[test]
    fn wrong_core_count_is_rejected() {
        let mut sentinel = Sentinel::new(cores(2));
        sentinel.update(snapshot(&[(0, 0, 0, 0), (0, 0, 0, 0)])).unwrap();

        let err = sentinel.update(snapshot(&[(10, 0, 0, 0)])).unwrap_err();
        assert!(matches!(
            err,
            SampleError::InconsistentCoreCount { found: 1, .. }
        ));

        // the retained snapshot survives the rejected one.
        let sample = sentinel
            .update(snapshot(&[(10, 0, 10, 0), (0, 0, 10, 0)]))
            .unwrap()
            .unwrap();
        assert_relative_eq!(sample.get(0).unwrap().get(), 50.0);
        assert_eq!(sample.get(1), Some(Percent::ZERO));
    }

    #[test]
    fn wrong_core_count_does_not_bootstrap() {
        let mut sentinel = Sentinel::new(cores(2));
        assert!(sentinel.update(snapshot(&[(0, 0, 0, 0)])).is_err());
        assert!(!sentinel.is_bootstrapped());
    }
}

mod measurement_tests {
    use super::*;

    #[test]
    fn regressed_counter_is_clamped() {
        let a = Ticks::new(100, 100, 100, 100);
        let b = Ticks::new(50, 110, 120, 100);
        let measurement = Measurement::new(&a, &b);
        assert_eq!(
            measurement,
            Measurement {
                user: 0,
                system: 10,
                idle: 20,
                nice: 0,
            }
        );
        assert_relative_eq!(measurement.percentage().get(), 100.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn fully_regressed_snapshot_is_idle() {
        let a = Ticks::new(100, 100, 100, 100);
        let b = Ticks::default();
        assert_eq!(Measurement::new(&a, &b).percentage(), Percent::ZERO);
    }

    #[test]
    fn huge_deltas_do_not_overflow() {
        let a = Ticks::default();
        let b = Ticks::new(u64::MAX, u64::MAX, u64::MAX, u64::MAX);
        let measurement = Measurement::new(&a, &b);
        assert_eq!(measurement.total(), u64::MAX);
        assert_eq!(measurement.percentage(), Percent::FULL);
    }
}

fn ticks() -> impl Strategy<Value = Ticks> {
    (any::<u64>(), any::<u64>(), any::<u64>(), any::<u64>()).prop_map(Ticks::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// the first update never produces a sample.
    #[test]
    fn prop_bootstrap(n in 1usize..64, seed in ticks()) {
        let mut sentinel = Sentinel::new(cores(n));
        let first = std::iter::repeat_n(seed, n).collect::<TickSnapshot>();
        prop_assert_eq!(sentinel.update(first).unwrap(), None);
    }

    /// arbitrary counters, including regressed ones, stay within range.
    #[test]
    fn prop_utilization_in_range(
        pairs in prop::collection::vec((ticks(), ticks()), 1..32)
    ) {
        let (a, b): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        let mut sentinel = Sentinel::new(cores(a.len()));
        sentinel.update(a.into()).unwrap();
        let sample = sentinel.update(b.into()).unwrap().unwrap();
        for percent in sample.iter() {
            let value = percent.get();
            prop_assert!(value.is_finite());
            prop_assert!((0.0..=100.0).contains(&value), "{value} out of range");
        }
    }

    /// an update with no time passing reads as idle, never nan.
    #[test]
    fn prop_unchanged_is_idle(cores_ticks in prop::collection::vec(ticks(), 1..32)) {
        let snapshot = TickSnapshot::from(cores_ticks.clone());
        let mut sentinel = Sentinel::new(cores(cores_ticks.len()));
        sentinel.update(snapshot.clone()).unwrap();
        let sample = sentinel.update(snapshot).unwrap().unwrap();
        prop_assert!(sample.iter().all(|p| p == Percent::ZERO));
    }
}
