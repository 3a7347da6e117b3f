use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{EntityKind, Inventory, MoRef};
use crate::error::FactsResult;

/// Upper bound on parent hops; inventories are a handful of levels deep.
pub const MAX_DEPTH: usize = 16;

const LINK_PROPERTIES: &[&str] = &["name", "parent"];

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: Option<String>,
    pub parent: Option<MoRef>,
}

/// Ancestors of an object, nearest first, up to the first break point.
#[derive(Debug, Default, Clone)]
pub struct ParentChain {
    links: Vec<(MoRef, Option<String>)>,
    broken_at: Option<MoRef>,
}

impl ParentChain {
    /// Name of the nearest link of `kind`.
    pub fn nearest(&self, kind: EntityKind) -> Option<&str> {
        self.links
            .iter()
            .find(|(moref, _)| moref.is(kind))
            .and_then(|(_, name)| name.as_deref())
    }

    /// Reference whose lookup failed, if the walk stopped early.
    pub fn break_point(&self) -> Option<&MoRef> {
        self.broken_at.as_ref()
    }
}

/// Follows name/parent links for one invocation, remembering what it saw.
pub struct ParentResolver<'a, I: Inventory + ?Sized> {
    inventory: &'a I,
    links: RefCell<HashMap<MoRef, Option<Link>>>,
}

impl<'a, I: Inventory + ?Sized> ParentResolver<'a, I> {
    pub fn new(inventory: &'a I) -> Self {
        Self {
            inventory,
            links: RefCell::new(HashMap::new()),
        }
    }

    /// Name and parent of one object; `None` when it no longer exists.
    pub fn link(&self, moref: &MoRef) -> FactsResult<Option<Link>> {
        if let Some(cached) = self.links.borrow().get(moref) {
            return Ok(cached.clone());
        }
        self.fetch(std::slice::from_ref(moref))?;
        Ok(self.links.borrow().get(moref).cloned().flatten())
    }

    pub fn name_of(&self, moref: &MoRef) -> FactsResult<Option<String>> {
        Ok(self.link(moref)?.and_then(|link| link.name))
    }

    /// Names for several references, in input order, fetched in one round trip.
    pub fn names_of(&self, morefs: &[MoRef]) -> FactsResult<Vec<Option<String>>> {
        let missing: Vec<MoRef> = {
            let cache = self.links.borrow();
            morefs
                .iter()
                .filter(|m| !cache.contains_key(*m))
                .cloned()
                .collect()
        };
        if !missing.is_empty() {
            self.fetch(&missing)?;
        }

        let cache = self.links.borrow();
        let names = morefs
            .iter()
            .map(|m| cache.get(m).cloned().flatten().and_then(|link| link.name))
            .collect();
        Ok(names)
    }

    /// Walk parent links starting at `start` (inclusive).
    pub fn chain(&self, start: Option<&MoRef>) -> FactsResult<ParentChain> {
        let mut chain = ParentChain::default();
        let mut seen = HashSet::new();
        let mut next = start.cloned();

        while let Some(current) = next.take() {
            if chain.links.len() >= MAX_DEPTH || !seen.insert(current.clone()) {
                debug!(object = %current, "parent walk stopped at depth limit or cycle");
                break;
            }
            match self.link(&current)? {
                Some(link) => {
                    next = link.parent.clone();
                    chain.links.push((current, link.name));
                }
                None => {
                    debug!(object = %current, "parent link points to a missing object");
                    chain.broken_at = Some(current);
                }
            }
        }

        Ok(chain)
    }

    fn fetch(&self, morefs: &[MoRef]) -> FactsResult<()> {
        let found = self.inventory.retrieve(morefs, LINK_PROPERTIES)?;
        let mut cache = self.links.borrow_mut();
        for obj in found {
            let link = Link {
                name: obj.name().map(str::to_string),
                parent: obj.parent().cloned(),
            };
            cache.insert(obj.moref, Some(link));
        }
        for moref in morefs {
            cache.entry(moref.clone()).or_insert(None);
        }
        Ok(())
    }
}
