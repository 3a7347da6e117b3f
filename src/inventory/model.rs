use std::collections::HashMap;
use std::fmt;

/// Managed object reference: wire type plus server-side id (`vm-42`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MoRef {
    pub kind: String,
    pub value: String,
}

impl MoRef {
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }

    pub fn is(&self, kind: super::EntityKind) -> bool {
        kind.matches(&self.kind)
    }
}

impl fmt::Display for MoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Disk,
    EthernetCard,
    Other,
}

/// The parts of a virtual hardware device the collectors project.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualDevice {
    pub kind: DeviceKind,
    pub label: Option<String>,
    pub capacity_kb: Option<i64>,
    pub mac_address: Option<String>,
    /// Disk backing file, `[datastore] folder/file.vmdk`
    pub backing_file: Option<String>,
    /// Standard or distributed portgroup the NIC is attached to
    pub network: Option<MoRef>,
    /// Network name carried inline by standard NIC backings
    pub network_name: Option<String>,
}

impl VirtualDevice {
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            label: None,
            capacity_kb: None,
            mac_address: None,
            backing_file: None,
            network: None,
            network_name: None,
        }
    }

    /// Datastore name from the backing file path.
    pub fn datastore(&self) -> Option<&str> {
        let path = self.backing_file.as_deref()?;
        let rest = path.strip_prefix('[')?;
        let end = rest.find(']')?;
        let name = rest[..end].trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Reference(MoRef),
    References(Vec<MoRef>),
    Devices(Vec<VirtualDevice>),
}

/// Snapshot of one inventory object with the properties that were asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedObject {
    pub moref: MoRef,
    properties: HashMap<String, PropertyValue>,
}

impl ManagedObject {
    pub fn new(moref: MoRef) -> Self {
        Self {
            moref,
            properties: HashMap::new(),
        }
    }

    pub fn with(mut self, path: &str, value: PropertyValue) -> Self {
        self.set(path, value);
        self
    }

    pub fn set(&mut self, path: &str, value: PropertyValue) {
        self.properties.insert(path.to_string(), value);
    }

    pub fn get(&self, path: &str) -> Option<&PropertyValue> {
        self.properties.get(path)
    }

    /// Copy holding only the listed properties.
    pub fn select(&self, paths: &[&str]) -> Self {
        let properties = paths
            .iter()
            .filter_map(|p| self.properties.get(*p).map(|v| (p.to_string(), v.clone())))
            .collect();
        Self {
            moref: self.moref.clone(),
            properties,
        }
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, path: &str) -> Option<i64> {
        match self.get(path)? {
            PropertyValue::Integer(n) => Some(*n),
            PropertyValue::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn reference(&self, path: &str) -> Option<&MoRef> {
        match self.get(path)? {
            PropertyValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    /// Reference list; an unset property reads as empty.
    pub fn references(&self, path: &str) -> &[MoRef] {
        match self.get(path) {
            Some(PropertyValue::References(refs)) => refs,
            _ => &[],
        }
    }

    pub fn devices(&self, path: &str) -> &[VirtualDevice] {
        match self.get(path) {
            Some(PropertyValue::Devices(devices)) => devices,
            _ => &[],
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.text("name")
    }

    pub fn parent(&self) -> Option<&MoRef> {
        self.reference("parent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_datastore_from_backing_file() {
        let mut disk = VirtualDevice::new(DeviceKind::Disk);
        disk.backing_file = Some("[ssd-01] web01/web01.vmdk".to_string());
        assert_eq!(disk.datastore(), Some("ssd-01"));

        disk.backing_file = Some("web01.vmdk".to_string());
        assert_eq!(disk.datastore(), None);

        disk.backing_file = Some("[] web01.vmdk".to_string());
        assert_eq!(disk.datastore(), None);
    }

    #[test]
    fn test_select_keeps_only_requested() {
        let obj = ManagedObject::new(MoRef::new("VirtualMachine", "vm-1"))
            .with("name", PropertyValue::Text("web01".to_string()))
            .with("runtime.powerState", PropertyValue::Text("poweredOn".to_string()));

        let picked = obj.select(&["name", "config.hardware.numCPU"]);
        assert_eq!(picked.name(), Some("web01"));
        assert!(picked.get("runtime.powerState").is_none());
        assert!(picked.get("config.hardware.numCPU").is_none());
    }

    #[test]
    fn test_unset_references_read_empty() {
        let obj = ManagedObject::new(MoRef::new("ClusterComputeResource", "domain-c7"));
        assert!(obj.references("host").is_empty());
        assert!(obj.parent().is_none());
    }

    #[test]
    fn test_integer_accepts_numeric_text() {
        let obj = ManagedObject::new(MoRef::new("Datastore", "datastore-1"))
            .with("summary.capacity", PropertyValue::Text("1024".to_string()));
        assert_eq!(obj.integer("summary.capacity"), Some(1024));
    }
}
