// Read-only access to the virtualization inventory
pub mod model;
pub mod chain;
#[cfg(test)]
pub mod fake;

pub use chain::ParentResolver;
pub use model::{DeviceKind, ManagedObject, MoRef, PropertyValue, VirtualDevice};

use crate::error::FactsResult;

/// Entity kinds the collectors enumerate or follow parent links into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    VirtualMachine,
    HostSystem,
    Cluster,
    Datacenter,
    Datastore,
    DatastoreCluster,
    Network,
}

impl EntityKind {
    /// Managed object type name used on the wire.
    pub fn vim_type(&self) -> &'static str {
        match self {
            EntityKind::VirtualMachine => "VirtualMachine",
            EntityKind::HostSystem => "HostSystem",
            EntityKind::Cluster => "ClusterComputeResource",
            EntityKind::Datacenter => "Datacenter",
            EntityKind::Datastore => "Datastore",
            EntityKind::DatastoreCluster => "StoragePod",
            EntityKind::Network => "Network",
        }
    }

    /// Whether an object of the given wire type belongs to this kind.
    /// Portgroups and opaque networks are networks too.
    pub fn matches(&self, vim_type: &str) -> bool {
        match self {
            EntityKind::Network => matches!(
                vim_type,
                "Network" | "DistributedVirtualPortgroup" | "OpaqueNetwork"
            ),
            other => other.vim_type() == vim_type,
        }
    }
}

/// An inventory service the fact collectors can walk.
///
/// Implementations hand out [`ManagedObject`] snapshots holding only the
/// requested properties. Unset properties are simply absent.
pub trait Inventory {
    /// All objects of `kind` under the inventory root. With `recursive` off
    /// only direct children of the root are considered. No match is an
    /// empty vector, not an error.
    fn enumerate(
        &self,
        kind: EntityKind,
        recursive: bool,
        properties: &[&str],
    ) -> FactsResult<Vec<ManagedObject>>;

    /// Properties of specific objects. Objects that no longer exist are left
    /// out of the result.
    fn retrieve(&self, objects: &[MoRef], properties: &[&str]) -> FactsResult<Vec<ManagedObject>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_kind_matches_portgroups() {
        assert!(EntityKind::Network.matches("Network"));
        assert!(EntityKind::Network.matches("DistributedVirtualPortgroup"));
        assert!(!EntityKind::Network.matches("Datastore"));
    }

    #[test]
    fn test_cluster_kind_excludes_standalone_compute() {
        assert!(EntityKind::Cluster.matches("ClusterComputeResource"));
        assert!(!EntityKind::Cluster.matches("ComputeResource"));
    }
}
