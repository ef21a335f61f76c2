//! Host inventory sources.
//!
//! The collector only needs a set of key/value facts; where they come
//! from is a collaborator concern. `SysinfoInventory` is the default
//! source for ordinary hosts.

use thiserror::Error;

/// One host fact, grouped into a section (os, cpu, memory, network, disk).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryFact {
    pub section: &'static str,
    pub name: String,
    pub value: String,
}

impl InventoryFact {
    pub fn new(section: &'static str, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            section,
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory query failed: {0}")]
    Query(String),
}

/// A source of host/platform facts, queried once per process lifetime.
///
/// `collect` runs on a blocking task and may take its time; it must not
/// be called on the engine's drain paths.
pub trait InventorySource: Send + Sync {
    fn collect(&self) -> Result<Vec<InventoryFact>, InventoryError>;
}

/// Default inventory source backed by the `sysinfo` crate.
pub struct SysinfoInventory;

impl InventorySource for SysinfoInventory {
    fn collect(&self) -> Result<Vec<InventoryFact>, InventoryError> {
        use sysinfo::{Disks, Networks, System};

        let mut sys = System::new_all();
        sys.refresh_all();

        let mut facts = Vec::new();

        if let Some(name) = System::name() {
            facts.push(InventoryFact::new("os", "name", name));
        }
        if let Some(version) = System::os_version() {
            facts.push(InventoryFact::new("os", "version", version));
        }
        if let Some(kernel) = System::kernel_version() {
            facts.push(InventoryFact::new("os", "kernel", kernel));
        }
        if let Some(host) = System::host_name() {
            facts.push(InventoryFact::new("os", "hostname", host));
        }
        facts.push(InventoryFact::new("os", "arch", std::env::consts::ARCH));
        facts.push(InventoryFact::new(
            "os",
            "uptime_secs",
            System::uptime().to_string(),
        ));

        let cpus = sys.cpus();
        facts.push(InventoryFact::new(
            "cpu",
            "logical_cores",
            cpus.len().to_string(),
        ));
        if let Some(physical) = sys.physical_core_count() {
            facts.push(InventoryFact::new(
                "cpu",
                "physical_cores",
                physical.to_string(),
            ));
        }
        if let Some(cpu) = cpus.first() {
            facts.push(InventoryFact::new("cpu", "brand", cpu.brand()));
            facts.push(InventoryFact::new(
                "cpu",
                "frequency_mhz",
                cpu.frequency().to_string(),
            ));
        }

        facts.push(InventoryFact::new(
            "memory",
            "total_bytes",
            sys.total_memory().to_string(),
        ));
        facts.push(InventoryFact::new(
            "memory",
            "available_bytes",
            sys.available_memory().to_string(),
        ));
        facts.push(InventoryFact::new(
            "memory",
            "total_swap_bytes",
            sys.total_swap().to_string(),
        ));

        let networks = Networks::new_with_refreshed_list();
        for (name, data) in &networks {
            facts.push(InventoryFact::new(
                "network",
                format!("{} mac", name),
                data.mac_address().to_string(),
            ));
            facts.push(InventoryFact::new(
                "network",
                format!("{} rx_bytes", name),
                data.total_received().to_string(),
            ));
        }

        let disks = Disks::new_with_refreshed_list();
        for disk in &disks {
            let name = disk.name().to_string_lossy();
            facts.push(InventoryFact::new(
                "disk",
                format!("{} filesystem", name),
                disk.file_system().to_string_lossy().to_string(),
            ));
            facts.push(InventoryFact::new(
                "disk",
                format!("{} total_bytes", name),
                disk.total_space().to_string(),
            ));
            facts.push(InventoryFact::new(
                "disk",
                format!("{} available_bytes", name),
                disk.available_space().to_string(),
            ));
        }

        Ok(facts)
    }
}
