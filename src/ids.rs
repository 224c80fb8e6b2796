//! Prefixed, monotonically increasing identifier allocation.

/// Global prefix marking every generated id as test data.
const GLOBAL_PREFIX: &str = "test_";

/// Allocates unique string identifiers for one engine instance.
///
/// Ids have the form `test_<prefix>_<n>` with `n` strictly increasing from 1.
/// A counter never goes backwards, so ids are never reused even after the
/// record they named is deleted. Balance transactions and application fees
/// keep their own counters because the upstream service uses visually
/// distinct id families for them.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counter: u64,
    transaction_counter: u64,
    fee_counter: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a general entity id.
    pub fn new_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{GLOBAL_PREFIX}{prefix}_{}", self.counter)
    }

    /// Allocate a balance-transaction id.
    pub fn new_transaction_id(&mut self, prefix: &str) -> String {
        self.transaction_counter += 1;
        format!("{GLOBAL_PREFIX}{prefix}_{}", self.transaction_counter)
    }

    /// Allocate an application-fee id.
    pub fn new_fee_id(&mut self, prefix: &str) -> String {
        self.fee_counter += 1;
        format!("{GLOBAL_PREFIX}{prefix}_{}", self.fee_counter)
    }
}
