use serde::Serialize;

// Optional fields serialize as `null` when a parent link or property is missing

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VmFacts {
    pub name: Option<String>,
    pub host: Option<String>,
    pub cluster: Option<String>,
    pub datacenter: Option<String>,
    pub power_state: Option<String>,
    pub cores: Option<i64>,
    pub memory_mb: Option<i64>,
    pub guest_os: Option<String>,
    /// Network of the first NIC that has one
    pub vlan: Option<String>,
    pub disk_info: Vec<DiskFacts>,
    pub nic_info: Vec<NicFacts>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiskFacts {
    pub disk_label: Option<String>,
    /// Provisioned size in KB
    pub disk_size: Option<i64>,
    pub datastore: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NicFacts {
    pub nic_label: Option<String>,
    pub mac_address: Option<String>,
    pub network: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterFacts {
    pub name: Option<String>,
    /// Number of hosts in the cluster
    pub hosts: usize,
    pub host_names: Vec<String>,
    pub resource_pool: Option<String>,
    pub datacenter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatastoreFacts {
    pub name: Option<String>,
    /// Bytes
    pub capacity: Option<i64>,
    pub free_space: Option<i64>,
    #[serde(rename = "type")]
    pub datastore_type: Option<String>,
    pub datacenter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatastoreClusterFacts {
    pub name: Option<String>,
    pub capacity: Option<i64>,
    pub free_space: Option<i64>,
    pub datacenter: Option<String>,
    pub datastores: Vec<MemberDatastore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberDatastore {
    pub name: Option<String>,
    pub capacity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VlanFacts {
    pub vlan_name: Option<String>,
    /// Default VLAN of a distributed portgroup; null for other networks
    pub vlan_id: Option<i64>,
    /// "standard", "distributed" or "opaque"
    pub network_type: String,
    pub cluster: Option<String>,
    pub datacenter: Option<String>,
}
