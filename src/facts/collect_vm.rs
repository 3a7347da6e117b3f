use tracing::debug;

use crate::error::FactsResult;
use crate::facts::collector::{assemble, ResultSet};
use crate::facts::types::{DiskFacts, NicFacts, VmFacts};
use crate::inventory::{
    DeviceKind, EntityKind, Inventory, ManagedObject, ParentResolver, VirtualDevice,
};

const VM_PROPERTIES: &[&str] = &[
    "name",
    "runtime.host",
    "runtime.powerState",
    "config.hardware.numCPU",
    "config.hardware.memoryMB",
    "config.guestFullName",
    "config.hardware.device",
];

/// Entry point: facts for every virtual machine in the inventory.
pub fn collect_vm_facts<I: Inventory + ?Sized>(inventory: &I) -> FactsResult<ResultSet<VmFacts>> {
    let resolver = ParentResolver::new(inventory);
    let vms = inventory.enumerate(EntityKind::VirtualMachine, true, VM_PROPERTIES)?;

    let mut facts = Vec::with_capacity(vms.len());
    for vm in &vms {
        facts.push(project_vm(vm, &resolver)?);
    }
    Ok(assemble(facts))
}

/// Project one VM. Host, cluster and datacenter come from the parent chain of
/// the VM's host; any missing link leaves the field empty.
pub fn project_vm<I: Inventory + ?Sized>(
    vm: &ManagedObject,
    resolver: &ParentResolver<I>,
) -> FactsResult<VmFacts> {
    let chain = resolver.chain(vm.reference("runtime.host"))?;
    if let Some(gap) = chain.break_point() {
        debug!(vm = %vm.moref, missing = %gap, "host parent chain is incomplete");
    }
    let devices = vm.devices("config.hardware.device");

    let disk_info = devices
        .iter()
        .filter(|d| d.kind == DeviceKind::Disk)
        .map(|d| DiskFacts {
            disk_label: d.label.clone(),
            disk_size: d.capacity_kb,
            datastore: d.datastore().map(str::to_string),
        })
        .collect();

    let mut nic_info = Vec::new();
    for nic in devices.iter().filter(|d| d.kind == DeviceKind::EthernetCard) {
        nic_info.push(NicFacts {
            nic_label: nic.label.clone(),
            mac_address: nic.mac_address.clone(),
            network: nic_network(nic, resolver)?,
        });
    }
    let vlan = nic_info.iter().find_map(|n| n.network.clone());

    Ok(VmFacts {
        name: vm.name().map(str::to_string),
        host: chain.nearest(EntityKind::HostSystem).map(str::to_string),
        cluster: chain.nearest(EntityKind::Cluster).map(str::to_string),
        datacenter: chain.nearest(EntityKind::Datacenter).map(str::to_string),
        power_state: vm.text("runtime.powerState").map(str::to_string),
        cores: vm.integer("config.hardware.numCPU"),
        memory_mb: vm.integer("config.hardware.memoryMB"),
        guest_os: vm.text("config.guestFullName").map(str::to_string),
        vlan,
        disk_info,
        nic_info,
    })
}

// Standard backings carry the network name; distributed ones only a key
fn nic_network<I: Inventory + ?Sized>(
    nic: &VirtualDevice,
    resolver: &ParentResolver<I>,
) -> FactsResult<Option<String>> {
    if let Some(name) = &nic.network_name {
        return Ok(Some(name.clone()));
    }
    match &nic.network {
        Some(network) => resolver.name_of(network),
        None => Ok(None),
    }
}
