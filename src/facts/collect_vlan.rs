use std::collections::HashMap;

use crate::error::FactsResult;
use crate::facts::collector::{assemble, ResultSet};
use crate::facts::types::VlanFacts;
use crate::inventory::{EntityKind, Inventory, ManagedObject, MoRef, ParentResolver};

const CLUSTER_NETWORK_PROPERTIES: &[&str] = &["name", "network", "parent"];

const PORTGROUP_VLAN: &str = "config.defaultPortConfig.vlan";

/// Entry point: one record per network visible to each cluster.
pub fn collect_vlan_facts<I: Inventory + ?Sized>(
    inventory: &I,
) -> FactsResult<ResultSet<VlanFacts>> {
    let resolver = ParentResolver::new(inventory);
    let clusters = inventory.enumerate(EntityKind::Cluster, true, CLUSTER_NETWORK_PROPERTIES)?;
    let vlan_ids = portgroup_vlan_ids(&clusters, inventory)?;

    let mut facts = Vec::new();
    for cluster in &clusters {
        facts.extend(project_cluster_networks(cluster, &resolver, &vlan_ids)?);
    }
    Ok(assemble(facts))
}

pub fn project_cluster_networks<I: Inventory + ?Sized>(
    cluster: &ManagedObject,
    resolver: &ParentResolver<I>,
    vlan_ids: &HashMap<MoRef, i64>,
) -> FactsResult<Vec<VlanFacts>> {
    let networks = cluster.references("network");
    let names = resolver.names_of(networks)?;
    let cluster_name = cluster.name().map(str::to_string);
    let datacenter = resolver
        .chain(cluster.parent())?
        .nearest(EntityKind::Datacenter)
        .map(str::to_string);

    Ok(networks
        .iter()
        .zip(names)
        .map(|(network, name)| VlanFacts {
            vlan_name: name,
            vlan_id: vlan_ids.get(network).copied(),
            network_type: network_type(network).to_string(),
            cluster: cluster_name.clone(),
            datacenter: datacenter.clone(),
        })
        .collect())
}

// Portgroups are shared between clusters; fetch each one once
fn portgroup_vlan_ids<I: Inventory + ?Sized>(
    clusters: &[ManagedObject],
    inventory: &I,
) -> FactsResult<HashMap<MoRef, i64>> {
    let mut portgroups: Vec<MoRef> = Vec::new();
    for network in clusters.iter().flat_map(|c| c.references("network")) {
        if network.kind == "DistributedVirtualPortgroup" && !portgroups.contains(network) {
            portgroups.push(network.clone());
        }
    }

    Ok(inventory
        .retrieve(&portgroups, &[PORTGROUP_VLAN])?
        .into_iter()
        .filter_map(|pg| pg.integer(PORTGROUP_VLAN).map(|id| (pg.moref, id)))
        .collect())
}

fn network_type(network: &MoRef) -> &str {
    match network.kind.as_str() {
        "Network" => "standard",
        "DistributedVirtualPortgroup" => "distributed",
        "OpaqueNetwork" => "opaque",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::fake::{entity, FakeInventory};
    use crate::inventory::PropertyValue;

    #[test]
    fn test_vlan_facts_per_cluster_network() {
        let mut inv = FakeInventory::new();
        let root = inv.root().clone();
        let dc = entity("Datacenter", "datacenter-1", "DC1", Some(&root));
        let folder = entity("Folder", "group-h4", "host", Some(&dc.moref));
        let net_folder = entity("Folder", "group-n6", "network", Some(&dc.moref));
        let vm_net = entity("Network", "network-13", "VM Network", Some(&net_folder.moref));
        let pg = entity("DistributedVirtualPortgroup", "dvportgroup-21", "VLAN-210", Some(&net_folder.moref))
            .with(PORTGROUP_VLAN, PropertyValue::Integer(210));
        let cluster = entity("ClusterComputeResource", "domain-c7", "Prod", Some(&folder.moref))
            .with(
                "network",
                PropertyValue::References(vec![vm_net.moref.clone(), pg.moref.clone()]),
            );
        let bare = entity("ClusterComputeResource", "domain-c8", "Lab", Some(&folder.moref));
        inv.add(dc)
            .add(folder)
            .add(net_folder)
            .add(vm_net)
            .add(pg)
            .add(cluster)
            .add(bare);

        let facts = collect_vlan_facts(&inv).unwrap();
        assert_eq!(
            facts,
            vec![
                VlanFacts {
                    vlan_name: Some("VM Network".to_string()),
                    vlan_id: None,
                    network_type: "standard".to_string(),
                    cluster: Some("Prod".to_string()),
                    datacenter: Some("DC1".to_string()),
                },
                VlanFacts {
                    vlan_name: Some("VLAN-210".to_string()),
                    vlan_id: Some(210),
                    network_type: "distributed".to_string(),
                    cluster: Some("Prod".to_string()),
                    datacenter: Some("DC1".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_cluster_outside_datacenter_has_null_datacenter() {
        let mut inv = FakeInventory::new();
        let net = entity("Network", "network-1", "Isolated", None);
        let cluster = entity("ClusterComputeResource", "domain-c1", "Orphan", None)
            .with("network", PropertyValue::References(vec![net.moref.clone()]));
        inv.add(net).add(cluster);

        let facts = collect_vlan_facts(&inv).unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].vlan_name.as_deref(), Some("Isolated"));
        assert_eq!(facts[0].datacenter, None);
    }

    #[test]
    fn test_trunk_portgroup_has_null_vlan_id() {
        let mut inv = FakeInventory::new();
        // Trunk specs decode to no value, so the property is absent
        let trunk = entity("DistributedVirtualPortgroup", "dvportgroup-30", "Uplinks", None);
        let tagged = entity("DistributedVirtualPortgroup", "dvportgroup-31", "VLAN-31", None)
            .with(PORTGROUP_VLAN, PropertyValue::Integer(31));
        let a = entity("ClusterComputeResource", "domain-c1", "A", None).with(
            "network",
            PropertyValue::References(vec![trunk.moref.clone(), tagged.moref.clone()]),
        );
        let b = entity("ClusterComputeResource", "domain-c2", "B", None)
            .with("network", PropertyValue::References(vec![tagged.moref.clone()]));
        inv.add(trunk).add(tagged).add(a).add(b);

        let facts = collect_vlan_facts(&inv).unwrap();
        let ids: Vec<(Option<&str>, Option<i64>)> = facts
            .iter()
            .map(|f| (f.vlan_name.as_deref(), f.vlan_id))
            .collect();
        assert_eq!(
            ids,
            vec![
                (Some("Uplinks"), None),
                (Some("VLAN-31"), Some(31)),
                (Some("VLAN-31"), Some(31)),
            ]
        );

        let json = serde_json::to_value(&facts[0]).unwrap();
        assert!(json["vlan_id"].is_null());
    }
}
