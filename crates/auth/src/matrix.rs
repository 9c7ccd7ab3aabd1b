use std::collections::{BTreeMap, BTreeSet};

use crate::flags::{PermissionKind, decode_flags};

/// Group codes holding one permission kind on one object.
pub type GroupSet = BTreeSet<String>;

/// Grants on a single object, by permission kind.
pub type ObjectGrants = BTreeMap<PermissionKind, GroupSet>;

/// Grants on every object of a single product.
pub type ProductGrants = BTreeMap<String, ObjectGrants>;

/// product → object → permission kind → group codes.
///
/// Strictly tree-shaped and append-only: a build only ever adds group codes.
/// Ordered maps keep two builds of the same claims structurally equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionMatrix {
    products: BTreeMap<String, ProductGrants>,
}

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, product: &str, object: &str, kind: PermissionKind, group: &str) {
        self.products
            .entry(product.to_string())
            .or_default()
            .entry(object.to_string())
            .or_default()
            .entry(kind)
            .or_default()
            .insert(group.to_string());
    }

    /// Decode `flags` and grant every resulting kind to `group`.
    pub fn grant_flags(&mut self, product: &str, object: &str, flags: &str, group: &str) {
        for kind in decode_flags(flags) {
            self.grant(product, object, kind, group);
        }
    }

    pub fn object(&self, product: &str, object: &str) -> Option<&ObjectGrants> {
        self.products.get(product)?.get(object)
    }

    pub fn groups(&self, product: &str, object: &str, kind: PermissionKind) -> Option<&GroupSet> {
        self.object(product, object)?.get(&kind)
    }

    /// Whether `group` holds Create, Read, Update and Delete on the object.
    pub fn holds_crud(&self, product: &str, object: &str, group: &str) -> bool {
        let Some(grants) = self.object(product, object) else {
            return false;
        };
        [
            PermissionKind::Create,
            PermissionKind::Read,
            PermissionKind::Update,
            PermissionKind::Delete,
        ]
        .iter()
        .all(|kind| grants.get(kind).is_some_and(|groups| groups.contains(group)))
    }

    /// Every group code granted anything anywhere in the matrix.
    pub fn grantees(&self) -> BTreeSet<String> {
        self.products
            .values()
            .flat_map(|objects| objects.values())
            .flat_map(|kinds| kinds.values())
            .flat_map(|groups| groups.iter().cloned())
            .collect()
    }

    pub fn products(&self) -> impl Iterator<Item = (&str, &ProductGrants)> {
        self.products.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
