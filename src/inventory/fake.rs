// In-memory inventory used by unit tests
use std::cell::Cell;

use super::{EntityKind, Inventory, ManagedObject, MoRef, PropertyValue};
use crate::error::FactsResult;

pub struct FakeInventory {
    root: MoRef,
    objects: Vec<ManagedObject>,
    retrieve_calls: Cell<usize>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self {
            root: MoRef::new("Folder", "group-d1"),
            objects: Vec::new(),
            retrieve_calls: Cell::new(0),
        }
    }

    pub fn root(&self) -> &MoRef {
        &self.root
    }

    pub fn add(&mut self, obj: ManagedObject) -> &mut Self {
        self.objects.push(obj);
        self
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.get()
    }
}

impl Inventory for FakeInventory {
    fn enumerate(
        &self,
        kind: EntityKind,
        recursive: bool,
        properties: &[&str],
    ) -> FactsResult<Vec<ManagedObject>> {
        Ok(self
            .objects
            .iter()
            .filter(|obj| kind.matches(&obj.moref.kind))
            .filter(|obj| recursive || obj.parent() == Some(&self.root))
            .map(|obj| obj.select(properties))
            .collect())
    }

    fn retrieve(&self, objects: &[MoRef], properties: &[&str]) -> FactsResult<Vec<ManagedObject>> {
        self.retrieve_calls.set(self.retrieve_calls.get() + 1);
        Ok(objects
            .iter()
            .filter_map(|moref| self.objects.iter().find(|obj| &obj.moref == moref))
            .map(|obj| obj.select(properties))
            .collect())
    }
}

/// Object with a name and an optional parent link.
pub fn entity(kind: &str, id: &str, name: &str, parent: Option<&MoRef>) -> ManagedObject {
    let mut obj = ManagedObject::new(MoRef::new(kind, id))
        .with("name", PropertyValue::Text(name.to_string()));
    if let Some(parent) = parent {
        obj.set("parent", PropertyValue::Reference(parent.clone()));
    }
    obj
}

pub fn text(value: &str) -> PropertyValue {
    PropertyValue::Text(value.to_string())
}

pub fn reference(kind: &str, id: &str) -> PropertyValue {
    PropertyValue::Reference(MoRef::new(kind, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_without_matches_is_empty() {
        let inv = FakeInventory::new();
        let found = inv.enumerate(EntityKind::VirtualMachine, true, &["name"]).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_non_recursive_enumerate_sees_only_root_children() {
        let mut inv = FakeInventory::new();
        let root = inv.root().clone();
        let top = entity("Datacenter", "datacenter-1", "DC1", Some(&root));
        let nested_folder = entity("Folder", "group-f1", "Region", Some(&root));
        let nested = entity("Datacenter", "datacenter-2", "DC2", Some(&nested_folder.moref));
        inv.add(top).add(nested_folder).add(nested);

        let shallow = inv.enumerate(EntityKind::Datacenter, false, &["name"]).unwrap();
        assert_eq!(shallow.len(), 1);
        assert_eq!(shallow[0].name(), Some("DC1"));

        let deep = inv.enumerate(EntityKind::Datacenter, true, &["name"]).unwrap();
        assert_eq!(deep.len(), 2);
    }
}
