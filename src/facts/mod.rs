// vCenter fact collection modules
pub mod types;
pub mod collect_vm;
pub mod collect_cluster;
pub mod collect_datastore;
pub mod collect_vlan;
pub mod collector;

// Re-export main collection functions
pub use collect_vm::collect_vm_facts;
pub use collect_cluster::collect_cluster_facts;
pub use collect_datastore::{collect_datastore_cluster_facts, collect_datastore_facts};
pub use collect_vlan::collect_vlan_facts;
pub use collector::{collect_facts, collect_from_vcenter, FactKind};
