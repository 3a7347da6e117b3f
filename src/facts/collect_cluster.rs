use crate::error::FactsResult;
use crate::facts::collector::{assemble, ResultSet};
use crate::facts::types::ClusterFacts;
use crate::inventory::{EntityKind, Inventory, ManagedObject, ParentResolver};

const CLUSTER_PROPERTIES: &[&str] = &["name", "host", "resourcePool", "parent"];

/// Entry point: facts for every host cluster in the inventory.
pub fn collect_cluster_facts<I: Inventory + ?Sized>(
    inventory: &I,
) -> FactsResult<ResultSet<ClusterFacts>> {
    let resolver = ParentResolver::new(inventory);
    let clusters = inventory.enumerate(EntityKind::Cluster, true, CLUSTER_PROPERTIES)?;

    let mut facts = Vec::with_capacity(clusters.len());
    for cluster in &clusters {
        facts.push(project_cluster(cluster, &resolver)?);
    }
    Ok(assemble(facts))
}

pub fn project_cluster<I: Inventory + ?Sized>(
    cluster: &ManagedObject,
    resolver: &ParentResolver<I>,
) -> FactsResult<ClusterFacts> {
    let hosts = cluster.references("host");
    let host_names = resolver.names_of(hosts)?.into_iter().flatten().collect();

    let resource_pool = match cluster.reference("resourcePool") {
        Some(pool) => resolver.name_of(pool)?,
        None => None,
    };

    let datacenter = resolver
        .chain(cluster.parent())?
        .nearest(EntityKind::Datacenter)
        .map(str::to_string);

    Ok(ClusterFacts {
        name: cluster.name().map(str::to_string),
        hosts: hosts.len(),
        host_names,
        resource_pool,
        datacenter,
    })
}
