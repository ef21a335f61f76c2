//! One-shot environment snapshot collection.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::watch;

use crate::environment::inventory::{InventoryFact, InventorySource};

/// Text returned by `get` before the collection job has finished.
pub const PLACEHOLDER: &str = "Environment inventory not yet retrieved.";

/// Text stored when collection was disabled by configuration.
pub const DISABLED: &str = "Environment inventory collection disabled.";

/// Write-once holder for the host environment snapshot.
///
/// Exactly one writer (the collection job) publishes the block; any
/// number of readers may call `get` concurrently. Readers that need to
/// wait for the single write observe it through the watch signal.
pub struct EnvironmentCollector {
    snapshot: ArcSwap<String>,
    ready_tx: watch::Sender<bool>,
}

impl Default for EnvironmentCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentCollector {
    pub fn new() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            snapshot: ArcSwap::from_pointee(PLACEHOLDER.to_string()),
            ready_tx,
        }
    }

    /// The snapshot block, or the placeholder text before completion.
    pub fn get(&self) -> Arc<String> {
        self.snapshot.load_full()
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    /// Subscribe to the completion signal. The receiver observes `true`
    /// once the snapshot (or its failure text) has been published.
    pub fn subscribe_ready(&self) -> watch::Receiver<bool> {
        self.ready_tx.subscribe()
    }

    /// Record that collection will never run in this process.
    pub(crate) fn mark_disabled(&self) {
        self.snapshot.store(Arc::new(DISABLED.to_string()));
    }

    /// Store the collected block (or failure text). Called exactly once,
    /// by the collection job, before the completion signal fires.
    pub(crate) fn store_block(&self, block: String) {
        self.snapshot.store(Arc::new(block));
    }

    /// Fire the completion signal.
    pub(crate) fn signal_ready(&self) {
        // Receivers may have come and gone; send_replace never fails.
        self.ready_tx.send_replace(true);
    }

    /// Store and signal in one step.
    pub(crate) fn publish(&self, block: String) {
        self.store_block(block);
        self.signal_ready();
    }
}

/// Assemble the snapshot text block from the application identity and the
/// collected facts.
pub(crate) fn render_block(app_identity: &str, facts: &[InventoryFact]) -> String {
    let mut block = String::new();
    block.push_str("Application: ");
    block.push_str(app_identity);
    block.push('\n');
    for fact in facts {
        block.push_str(fact.section);
        block.push(' ');
        block.push_str(&fact.name);
        block.push_str(": ");
        block.push_str(&fact.value);
        block.push('\n');
    }
    block
}

/// Run one collection against `source`, converting failure into the
/// error-text block. Never fails.
pub(crate) fn collect_block(app_identity: &str, source: &dyn InventorySource) -> String {
    match source.collect() {
        Ok(facts) => render_block(app_identity, &facts),
        Err(e) => format!("Environment inventory unavailable: {}", e),
    }
}
