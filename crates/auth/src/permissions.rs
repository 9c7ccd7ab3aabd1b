//! Read-only queries over a built permission matrix and group trees.

use std::collections::{BTreeMap, BTreeSet};

use tollgate_core::ClaimShapeIssue;

use crate::flags::PermissionKind;
use crate::matrix::{GroupSet, PermissionMatrix};
use crate::tree::{self, AncestorTree, GroupForest};

/// Group code that, when granted, matches any requested group filter.
pub const WILDCARD_GROUP: &str = "all";

/// Object name used for permissions a group holds over groups.
pub const GROUP_OBJECT: &str = "grp";

/// The group-model entitlements of one caller.
///
/// Built once by [`crate::PermissionTreeBuilder`]; immutable afterwards and
/// safe to share across threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    matrix: PermissionMatrix,
    roots: Vec<GroupForest>,
    is_admin: bool,
    issues: Vec<ClaimShapeIssue>,
}

impl Permissions {
    pub(crate) fn from_parts(
        matrix: PermissionMatrix,
        roots: Vec<GroupForest>,
        is_admin: bool,
        issues: Vec<ClaimShapeIssue>,
    ) -> Self {
        Self {
            matrix,
            roots,
            is_admin,
            issues,
        }
    }

    pub fn matrix(&self) -> &PermissionMatrix {
        &self.matrix
    }

    pub fn roots(&self) -> &[GroupForest] {
        &self.roots
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    /// Malformed claim elements skipped while building.
    pub fn issues(&self) -> &[ClaimShapeIssue] {
        &self.issues
    }

    /// Which groups may perform `kind` on `object` of `product`.
    ///
    /// - Admin callers get `(vec![], true)` for anything.
    /// - With an empty `groups` filter, every granted group is returned.
    /// - Otherwise only the filter entries that are granted are returned; a
    ///   filter entry that is not granted itself matches through
    ///   [`WILDCARD_GROUP`] when that is granted, which is reported once as
    ///   `"all"`.
    ///
    /// The boolean is `true` iff the returned list is non-empty.
    pub fn check_permission(
        &self,
        product: &str,
        object: &str,
        kind: PermissionKind,
        groups: &[&str],
    ) -> (Vec<String>, bool) {
        if self.is_admin {
            return (Vec::new(), true);
        }

        let Some(granted) = self.matrix.groups(product, object, kind) else {
            return (Vec::new(), false);
        };

        let matched: Vec<String> = if groups.is_empty() {
            granted.iter().cloned().collect()
        } else {
            let wildcard = granted.contains(WILDCARD_GROUP);
            let mut matched = Vec::with_capacity(groups.len());
            let mut wildcard_used = false;
            for group in groups {
                if granted.contains(*group) {
                    matched.push(group.to_string());
                } else if wildcard && !wildcard_used {
                    matched.push(WILDCARD_GROUP.to_string());
                    wildcard_used = true;
                }
            }
            matched
        };

        let ok = !matched.is_empty();
        (matched, ok)
    }

    /// Boolean shorthand for [`Permissions::check_permission`].
    pub fn has_permission(
        &self,
        product: &str,
        object: &str,
        kind: PermissionKind,
        groups: &[&str],
    ) -> bool {
        self.check_permission(product, object, kind, groups).1
    }

    /// Whether `group` holds `kind` over groups (the [`GROUP_OBJECT`] object).
    pub fn check_group_permission(&self, product: &str, group: &str, kind: PermissionKind) -> bool {
        self.has_permission(product, GROUP_OBJECT, kind, &[group])
    }

    /// Raw lookup of the groups holding `kind`; no admin short-circuit.
    pub fn valid_groups(&self, product: &str, object: &str, kind: PermissionKind) -> GroupSet {
        self.matrix
            .groups(product, object, kind)
            .cloned()
            .unwrap_or_default()
    }

    /// Every group code of `group_type`, across all roots and depths.
    pub fn groups(&self, group_type: &str) -> Vec<String> {
        let mut out = Vec::new();
        for root in &self.roots {
            tree::collect_of_type(root, group_type, &mut out);
        }
        out
    }

    /// Every group code in the trees, bucketed by type.
    pub fn groups_by_type(&self) -> BTreeMap<String, Vec<String>> {
        let mut out = BTreeMap::new();
        for root in &self.roots {
            tree::bucket_by_type(root, &mut out);
        }
        out
    }

    /// Every group granted any permission in the matrix.
    pub fn all_groups(&self) -> BTreeSet<String> {
        self.matrix.grantees()
    }

    /// Ancestors of `group` in the first root that contains it.
    pub fn parents(&self, group: &str) -> Option<AncestorTree> {
        self.roots
            .iter()
            .find_map(|root| tree::ancestors_of(root, group))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PermissionTreeBuilder;
    use proptest::prelude::*;
    use serde_json::json;
    use tollgate_core::ClaimValue;

    use PermissionKind::*;

    fn build(value: serde_json::Value, admin: Option<&str>) -> Permissions {
        let claims = ClaimValue::from_json(value).unwrap();
        PermissionTreeBuilder::new()
            .admin_group(admin)
            .build([&claims])
            .unwrap()
    }

    fn sample() -> Permissions {
        build(
            json!([
                {
                    "c": "A", "t": "org",
                    "p": { "hotels": { "booking": ["crud1"], "grp": ["r1"] } },
                    "g": [
                        {
                            "c": "B", "t": "team",
                            "p": { "hotels": { "booking": ["r1"] } },
                            "g": [ { "c": "C", "t": "team" } ]
                        },
                        { "c": "D", "t": "client" }
                    ]
                }
            ]),
            None,
        )
    }

    #[test]
    fn check_permission_without_filter_returns_all_grantees() {
        let perms = sample();
        let (groups, ok) = perms.check_permission("hotels", "booking", Read, &[]);
        assert!(ok);
        assert_eq!(groups, vec!["A", "B"]);
    }

    #[test]
    fn check_permission_with_filter_returns_only_granted_entries() {
        let perms = sample();
        let (groups, ok) = perms.check_permission("hotels", "booking", Delete, &["B", "A", "Z"]);
        assert!(ok);
        assert_eq!(groups, vec!["A"]);

        let (groups, ok) = perms.check_permission("hotels", "booking", Delete, &["B"]);
        assert!(!ok);
        assert!(groups.is_empty());
    }

    #[test]
    fn check_permission_on_missing_entry_is_denied() {
        let perms = sample();
        assert_eq!(
            perms.check_permission("flights", "booking", Read, &[]),
            (vec![], false)
        );
        assert_eq!(
            perms.check_permission("hotels", "booking", PermissionKind::EXECUTE, &[]),
            (vec![], false)
        );
    }

    #[test]
    fn wildcard_all_matches_any_filter_entry_once() {
        let perms = build(
            json!([{ "c": "all", "t": "any", "p": { "hotels": { "booking": ["r1"] } } }]),
            None,
        );
        let (groups, ok) = perms.check_permission("hotels", "booking", Read, &["X", "Y"]);
        assert!(ok);
        assert_eq!(groups, vec!["all"]);
    }

    #[test]
    fn admin_is_granted_everything_with_no_groups() {
        let perms = build(
            json!([{ "c": "ADM", "t": "root", "p": { "iam": { "ADM": ["crud1"] } } }]),
            Some("ADM"),
        );
        assert_eq!(
            perms.check_permission("never", "seen", Extension('q'), &["G"]),
            (vec![], true)
        );
        // Raw lookups are not short-circuited.
        assert!(perms.valid_groups("never", "seen", Read).is_empty());
    }

    #[test]
    fn group_level_permission_uses_the_grp_object() {
        let perms = sample();
        assert!(perms.check_group_permission("hotels", "A", Read));
        assert!(!perms.check_group_permission("hotels", "B", Read));
        assert!(!perms.check_group_permission("hotels", "A", Update));
    }

    #[test]
    fn valid_groups_is_a_raw_lookup() {
        let perms = sample();
        let readers = perms.valid_groups("hotels", "booking", Read);
        assert_eq!(readers.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
        assert!(perms.valid_groups("hotels", "nothing", Read).is_empty());
    }

    #[test]
    fn groups_by_type_and_groups_agree() {
        let perms = sample();
        let by_type = perms.groups_by_type();
        for (group_type, codes) in &by_type {
            let mut expected = perms.groups(group_type);
            let mut codes = codes.clone();
            expected.sort();
            codes.sort();
            assert_eq!(codes, expected);
        }
        let mut teams = perms.groups("team");
        teams.sort();
        assert_eq!(teams, vec!["B", "C"]);
        assert!(perms.groups("unknown").is_empty());
    }

    #[test]
    fn groups_span_every_root() {
        let first = ClaimValue::from_json(json!([{ "c": "A", "t": "org" }])).unwrap();
        let second = ClaimValue::from_json(json!([
            { "c": "B", "t": "org", "g": [ { "c": "A", "t": "org" } ] }
        ]))
        .unwrap();
        let perms = PermissionTreeBuilder::new().build([&first, &second]).unwrap();
        let mut orgs = perms.groups("org");
        orgs.sort();
        // Cross-root duplicates are kept.
        assert_eq!(orgs, vec!["A", "A", "B"]);
    }

    #[test]
    fn all_groups_come_from_the_matrix_not_the_tree() {
        let perms = sample();
        let all: Vec<_> = perms.all_groups().into_iter().collect();
        // D and C hold no permissions.
        assert_eq!(all, vec!["A", "B"]);
    }

    #[test]
    fn parents_of_direct_child_is_the_root() {
        let perms = build(json!([{ "c": "A", "t": "org", "g": [ { "c": "g", "t": "team" } ] }]), None);
        assert_eq!(
            perms.parents("g"),
            Some(AncestorTree::new().with("A", AncestorTree::new()))
        );
    }

    #[test]
    fn parents_of_unknown_group_is_none() {
        assert_eq!(sample().parents("nope"), None);
    }

    #[test]
    fn parents_come_from_the_first_root_containing_the_group() {
        let first = ClaimValue::from_json(json!([
            { "c": "R1", "t": "org", "g": [ { "c": "X", "t": "team" } ] }
        ]))
        .unwrap();
        let second = ClaimValue::from_json(json!([
            { "c": "R2", "t": "org", "g": [ { "c": "X", "t": "team" } ] }
        ]))
        .unwrap();
        let perms = PermissionTreeBuilder::new().build([&first, &second]).unwrap();
        let parents = perms.parents("X").unwrap();
        assert_eq!(parents.codes(), vec!["R1"]);
    }

    #[test]
    fn empty_permissions_deny_everything() {
        let perms = Permissions::default();
        assert_eq!(perms.check_permission("p", "o", Read, &[]), (vec![], false));
        assert!(perms.all_groups().is_empty());
        assert!(perms.groups_by_type().is_empty());
    }

    proptest! {
        #[test]
        fn admin_short_circuits_every_triple(
            product in "[a-z]{1,8}",
            object in "[a-z]{1,8}",
            flag in any::<char>(),
            filter in prop::collection::vec("[A-Z]{1,3}", 0..4),
        ) {
            let perms = build(
                json!([{ "c": "ADM", "t": "root", "p": { "iam": { "ADM": ["crud1"] } } }]),
                Some("ADM"),
            );
            let filter: Vec<&str> = filter.iter().map(String::as_str).collect();
            let kind = PermissionKind::from_char(flag);
            prop_assert_eq!(perms.check_permission(&product, &object, kind, &filter), (vec![], true));
        }
    }
}
