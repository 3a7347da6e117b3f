use std::collections::HashMap;

use crate::error::FactsResult;
use crate::facts::collector::{assemble_sorted, ResultSet};
use crate::facts::types::{DatastoreClusterFacts, DatastoreFacts, MemberDatastore};
use crate::inventory::{EntityKind, Inventory, ManagedObject, MoRef, ParentResolver};

const DATASTORE_PROPERTIES: &[&str] = &[
    "name",
    "summary.capacity",
    "summary.freeSpace",
    "summary.type",
    "parent",
];

const STORAGE_POD_PROPERTIES: &[&str] = &[
    "name",
    "summary.capacity",
    "summary.freeSpace",
    "childEntity",
    "parent",
];

const MEMBER_PROPERTIES: &[&str] = &["name", "summary.capacity"];

/// Entry point: every datastore, largest first.
pub fn collect_datastore_facts<I: Inventory + ?Sized>(
    inventory: &I,
) -> FactsResult<ResultSet<DatastoreFacts>> {
    let resolver = ParentResolver::new(inventory);
    let datastores = inventory.enumerate(EntityKind::Datastore, true, DATASTORE_PROPERTIES)?;

    let mut facts = Vec::with_capacity(datastores.len());
    for ds in &datastores {
        facts.push(DatastoreFacts {
            name: ds.name().map(str::to_string),
            capacity: ds.integer("summary.capacity"),
            free_space: ds.integer("summary.freeSpace"),
            datastore_type: ds.text("summary.type").map(str::to_string),
            datacenter: enclosing_datacenter(ds, &resolver)?,
        });
    }

    Ok(assemble_sorted(facts, |f| f.capacity, true))
}

/// Entry point: every datastore cluster with its members, largest first.
pub fn collect_datastore_cluster_facts<I: Inventory + ?Sized>(
    inventory: &I,
) -> FactsResult<ResultSet<DatastoreClusterFacts>> {
    let resolver = ParentResolver::new(inventory);
    let pods = inventory.enumerate(EntityKind::DatastoreCluster, true, STORAGE_POD_PROPERTIES)?;

    let mut facts = Vec::with_capacity(pods.len());
    for pod in &pods {
        facts.push(DatastoreClusterFacts {
            name: pod.name().map(str::to_string),
            capacity: pod.integer("summary.capacity"),
            free_space: pod.integer("summary.freeSpace"),
            datacenter: enclosing_datacenter(pod, &resolver)?,
            datastores: member_datastores(pod, inventory)?,
        });
    }

    Ok(assemble_sorted(facts, |f| f.capacity, true))
}

fn enclosing_datacenter<I: Inventory + ?Sized>(
    obj: &ManagedObject,
    resolver: &ParentResolver<I>,
) -> FactsResult<Option<String>> {
    Ok(resolver
        .chain(obj.parent())?
        .nearest(EntityKind::Datacenter)
        .map(str::to_string))
}

// Members keep the pod's child order; vanished children are dropped
fn member_datastores<I: Inventory + ?Sized>(
    pod: &ManagedObject,
    inventory: &I,
) -> FactsResult<Vec<MemberDatastore>> {
    let children: Vec<MoRef> = pod
        .references("childEntity")
        .iter()
        .filter(|c| c.is(EntityKind::Datastore))
        .cloned()
        .collect();

    let mut fetched: HashMap<MoRef, ManagedObject> = inventory
        .retrieve(&children, MEMBER_PROPERTIES)?
        .into_iter()
        .map(|obj| (obj.moref.clone(), obj))
        .collect();

    Ok(children
        .iter()
        .filter_map(|c| fetched.remove(c))
        .map(|ds| MemberDatastore {
            name: ds.name().map(str::to_string),
            capacity: ds.integer("summary.capacity"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::fake::{entity, text, FakeInventory};
    use crate::inventory::PropertyValue;

    const TB: i64 = 1 << 40;

    fn datastore(id: &str, name: &str, parent: &MoRef, capacity: i64) -> ManagedObject {
        entity("Datastore", id, name, Some(parent))
            .with("summary.capacity", PropertyValue::Integer(capacity))
            .with("summary.freeSpace", PropertyValue::Integer(capacity / 2))
            .with("summary.type", text("VMFS"))
    }

    fn inventory() -> FakeInventory {
        let mut inv = FakeInventory::new();
        let root = inv.root().clone();
        let dc = entity("Datacenter", "datacenter-1", "DC1", Some(&root));
        let ds_folder = entity("Folder", "group-s5", "datastore", Some(&dc.moref));
        let pod = entity("StoragePod", "group-p1", "Gold", Some(&ds_folder.moref))
            .with("summary.capacity", PropertyValue::Integer(3 * TB))
            .with(
                "childEntity",
                PropertyValue::References(vec![
                    MoRef::new("Datastore", "datastore-12"),
                    MoRef::new("Datastore", "datastore-11"),
                ]),
            );
        let small_pod = entity("StoragePod", "group-p2", "Bronze", Some(&ds_folder.moref))
            .with("summary.capacity", PropertyValue::Integer(TB));

        let a = datastore("datastore-11", "gold-a", &pod.moref, TB);
        let b = datastore("datastore-12", "gold-b", &pod.moref, 2 * TB);
        let c = datastore("datastore-13", "local-c", &ds_folder.moref, 2 * TB);
        let d = datastore("datastore-14", "local-d", &ds_folder.moref, 4 * TB);

        inv.add(dc)
            .add(ds_folder)
            .add(small_pod)
            .add(pod)
            .add(a)
            .add(b)
            .add(c)
            .add(d);
        inv
    }

    #[test]
    fn test_datastores_sorted_by_capacity_descending_and_stable() {
        let inv = inventory();
        let facts = collect_datastore_facts(&inv).unwrap();

        let names: Vec<&str> = facts.iter().filter_map(|f| f.name.as_deref()).collect();
        // gold-b and local-c tie at 2 TB and keep enumeration order
        assert_eq!(names, vec!["local-d", "gold-b", "local-c", "gold-a"]);
        assert!(facts.iter().all(|f| f.datacenter.as_deref() == Some("DC1")));
        assert_eq!(facts[0].datastore_type.as_deref(), Some("VMFS"));
        assert_eq!(facts[0].free_space, Some(2 * TB));
    }

    #[test]
    fn test_datastore_clusters_with_members() {
        let inv = inventory();
        let facts = collect_datastore_cluster_facts(&inv).unwrap();

        assert_eq!(facts.len(), 2);
        assert_eq!(facts[0].name.as_deref(), Some("Gold"));
        assert_eq!(facts[0].capacity, Some(3 * TB));
        assert_eq!(facts[0].datacenter.as_deref(), Some("DC1"));
        assert_eq!(
            facts[0].datastores,
            vec![
                MemberDatastore {
                    name: Some("gold-b".to_string()),
                    capacity: Some(2 * TB),
                },
                MemberDatastore {
                    name: Some("gold-a".to_string()),
                    capacity: Some(TB),
                },
            ]
        );

        assert_eq!(facts[1].name.as_deref(), Some("Bronze"));
        assert!(facts[1].datastores.is_empty());
        assert_eq!(facts[1].free_space, None);
    }

    #[test]
    fn test_datastore_serializes_type_field() {
        let inv = inventory();
        let facts = collect_datastore_facts(&inv).unwrap();
        let json = serde_json::to_value(&facts[0]).unwrap();
        assert_eq!(json["type"], "VMFS");
        assert_eq!(json["name"], "local-d");
    }

    #[test]
    fn test_no_datastore_clusters_is_empty() {
        let inv = FakeInventory::new();
        assert!(collect_datastore_cluster_facts(&inv).unwrap().is_empty());
    }
}
