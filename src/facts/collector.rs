use serde::Serialize;
use tracing::{info, warn};

use crate::config::ConnectionConfig;
use crate::error::{FactsError, FactsResult};
use crate::facts;
use crate::inventory::Inventory;
use crate::vcenter::Session;

/// Ordered records handed back to the caller.
pub type ResultSet<T> = Vec<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactKind {
    Vm,
    Cluster,
    Datastore,
    DatastoreCluster,
    Vlan,
}

impl FactKind {
    /// Key under which an Ansible module returns the records.
    pub fn result_key(&self) -> &'static str {
        match self {
            FactKind::Vm => "vm_facts",
            FactKind::Cluster => "cluster_facts",
            FactKind::Datastore => "datastore_facts",
            FactKind::DatastoreCluster => "datastore_cluster_facts",
            FactKind::Vlan => "vlan_facts",
        }
    }
}

/// Records in enumeration order.
pub fn assemble<T>(records: Vec<T>) -> ResultSet<T> {
    records
}

/// Records sorted by `key` alone. The sort is stable, so equal keys keep
/// their enumeration order.
pub fn assemble_sorted<T, K, F>(mut records: Vec<T>, key: F, descending: bool) -> ResultSet<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    if descending {
        records.sort_by(|a, b| key(b).cmp(&key(a)));
    } else {
        records.sort_by(|a, b| key(a).cmp(&key(b)));
    }
    records
}

/// Collect one kind of facts from an already-open inventory.
pub fn collect_facts<I: Inventory + ?Sized>(
    kind: FactKind,
    inventory: &I,
) -> FactsResult<serde_json::Value> {
    match kind {
        FactKind::Vm => to_value(facts::collect_vm_facts(inventory)?),
        FactKind::Cluster => to_value(facts::collect_cluster_facts(inventory)?),
        FactKind::Datastore => to_value(facts::collect_datastore_facts(inventory)?),
        FactKind::DatastoreCluster => to_value(facts::collect_datastore_cluster_facts(inventory)?),
        FactKind::Vlan => to_value(facts::collect_vlan_facts(inventory)?),
    }
}

/// Open a session, collect, and log out again.
pub fn collect_from_vcenter(
    config: &ConnectionConfig,
    kind: FactKind,
) -> FactsResult<serde_json::Value> {
    let session = Session::open(config)?;
    let facts = collect_facts(kind, &session)?;

    if let Err(e) = session.close() {
        warn!(endpoint = %config.endpoint, error = %e, "logout failed after collecting facts");
    }

    info!(kind = kind.result_key(), count = record_count(&facts), "facts collected");
    Ok(facts)
}

fn to_value<T: Serialize>(records: ResultSet<T>) -> FactsResult<serde_json::Value> {
    serde_json::to_value(records)
        .map_err(|e| FactsError::parse(format!("could not serialize facts: {e}")))
}

fn record_count(value: &serde_json::Value) -> usize {
    value.as_array().map(Vec::len).unwrap_or(0)
}
