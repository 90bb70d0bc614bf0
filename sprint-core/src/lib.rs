//! Sprint Core: tier catalog, token collaborator, and the position ledger.
//!
//! This crate contains the StableSprints settlement engine:
//! - Domain types (accounts, tiers, positions, ledger events)
//! - Fungible token seam (`TokenLedger`) with an in-memory `MockUsdc`
//! - Position ledger state machine (open, settle, early withdrawal)
//! - Integer basis-point payout math
//! - Invariant checks and full audits
//! - Snapshots with restore-time audit and BLAKE3 digests
//! - A mutex-backed shared handle for multi-threaded callers

pub mod domain;
pub mod ledger;
pub mod token;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: ledger types can cross thread boundaries.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::AccountId>();
        require_sync::<domain::AccountId>();
        require_send::<domain::Position>();
        require_sync::<domain::Position>();
        require_send::<domain::TierCatalog>();
        require_sync::<domain::TierCatalog>();
        require_send::<domain::EventRecord>();
        require_sync::<domain::EventRecord>();

        // Token
        require_send::<token::MockUsdc>();
        require_sync::<token::MockUsdc>();

        // Ledger
        require_send::<ledger::PositionLedger<token::MockUsdc>>();
        require_sync::<ledger::PositionLedger<token::MockUsdc>>();
        require_send::<ledger::SharedLedger<token::MockUsdc>>();
        require_sync::<ledger::SharedLedger<token::MockUsdc>>();
        require_send::<ledger::LedgerError>();
        require_sync::<ledger::LedgerError>();
        require_send::<ledger::LedgerSnapshot<token::MockUsdc>>();
        require_sync::<ledger::LedgerSnapshot<token::MockUsdc>>();
    }

    #[test]
    fn default_catalog_has_three_tiers() {
        let catalog = domain::TierCatalog::sprint_default();
        assert_eq!(catalog.len(), 3);
    }
}
