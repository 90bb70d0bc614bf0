//! Property tests over seeded workloads.

use proptest::prelude::*;
use sprint_runner::{simulate, LedgerConfig, WorkloadConfig};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Any seed yields an audited ledger whose custody covers open principal,
    /// and replaying the seed reproduces the digest.
    #[test]
    fn any_seed_is_sound_and_reproducible(seed in any::<u64>(), accounts in 1usize..6) {
        let config = WorkloadConfig {
            seed,
            accounts,
            steps: 150,
            ..WorkloadConfig::default()
        };
        let ledger_config = LedgerConfig::default();
        let first = simulate(&config, &ledger_config).unwrap();
        let second = simulate(&config, &ledger_config).unwrap();

        prop_assert_eq!(&first.digest, &second.digest);
        prop_assert!(first.audit.open_principal <= first.audit.custody_balance);
        prop_assert_eq!(first.stats.open_principal, first.audit.open_principal);
        prop_assert_eq!(first.outcomes.values().sum::<u64>(), 150);
    }
}
