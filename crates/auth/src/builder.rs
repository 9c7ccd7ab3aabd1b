//! Permission tree construction.
//!
//! Turns the nested group claims of a verified token into a
//! [`PermissionMatrix`] plus one [`GroupForest`] per groups claim.
//!
//! Each group entry is a map with these keys:
//!
//! | key | meaning                                                      |
//! |-----|--------------------------------------------------------------|
//! | `c` | group code (required)                                        |
//! | `t` | group type (required)                                        |
//! | `p` | products: product → object → list of flag strings            |
//! | `a` | additional: group → product → object → list of flag strings  |
//! | `g` | child group entries (a list, recursed into)                  |
//!
//! Malformed elements are skipped one at a time; siblings keep being read.
//! Every skipped element is logged and kept as a [`ClaimShapeIssue`] on the
//! result, or aborts the build under [`BuildPolicy::Strict`].

use tracing::{debug, info, warn};

use tollgate_core::{AuthResult, ClaimShapeIssue, ClaimValue};

use crate::matrix::PermissionMatrix;
use crate::permissions::Permissions;
use crate::tree::{GroupForest, GroupTree};

pub const GROUP_CODE_KEY: &str = "c";
pub const GROUP_TYPE_KEY: &str = "t";
pub const PRODUCTS_KEY: &str = "p";
pub const ADDITIONAL_KEY: &str = "a";
pub const CHILDREN_KEY: &str = "g";

/// What to do with a malformed claim element.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum BuildPolicy {
    /// Skip the element, log it and record it on the result.
    #[default]
    Lenient,
    /// Fail the whole build with `MalformedClaimShape`.
    Strict,
}

/// Builds [`Permissions`] from group claims.
///
/// The admin group is passed in explicitly. Without one, admin detection is
/// off and the admin flag is never set.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionTreeBuilder<'a> {
    admin_group: Option<&'a str>,
    policy: BuildPolicy,
}

impl<'a> PermissionTreeBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admin_group(mut self, admin_group: Option<&'a str>) -> Self {
        self.admin_group = admin_group.filter(|g| !g.is_empty());
        self
    }

    pub fn policy(mut self, policy: BuildPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build from a sequence of group claims; each one seeds its own root.
    pub fn build<'c, I>(&self, roots: I) -> AuthResult<Permissions>
    where
        I: IntoIterator<Item = &'c ClaimValue>,
    {
        let mut state = BuildState {
            admin_group: self.admin_group,
            policy: self.policy,
            matrix: PermissionMatrix::new(),
            is_admin: false,
            issues: Vec::new(),
        };

        let mut forests = Vec::new();
        for (idx, root) in roots.into_iter().enumerate() {
            let path = format!("groups[{idx}]");
            if root.as_list().is_none() {
                state.report(ClaimShapeIssue::new(
                    path,
                    format!("expected a list of groups, got {}", root.kind()),
                ))?;
                continue;
            }
            let mut ancestors = Vec::new();
            forests.push(state.read_level(root, &path, &mut ancestors)?);
        }

        debug!(
            roots = forests.len(),
            is_admin = state.is_admin,
            issues = state.issues.len(),
            "permission tree built"
        );

        Ok(Permissions::from_parts(
            state.matrix,
            forests,
            state.is_admin,
            state.issues,
        ))
    }
}

/// Lenient build of `roots` with an optional admin group.
pub fn build_permissions<'c, I>(roots: I, admin_group: Option<&str>) -> Permissions
where
    I: IntoIterator<Item = &'c ClaimValue>,
{
    // Lenient builds record issues instead of failing.
    PermissionTreeBuilder::new()
        .admin_group(admin_group)
        .build(roots)
        .unwrap_or_default()
}

struct BuildState<'a> {
    admin_group: Option<&'a str>,
    policy: BuildPolicy,
    matrix: PermissionMatrix,
    is_admin: bool,
    issues: Vec<ClaimShapeIssue>,
}

impl BuildState<'_> {
    fn report(&mut self, issue: ClaimShapeIssue) -> AuthResult<()> {
        match self.policy {
            BuildPolicy::Strict => Err(issue.into()),
            BuildPolicy::Lenient => {
                warn!(path = %issue.path, reason = %issue.reason, "skipping malformed group claim");
                self.issues.push(issue);
                Ok(())
            }
        }
    }

    fn read_level(
        &mut self,
        node: &ClaimValue,
        path: &str,
        ancestors: &mut Vec<String>,
    ) -> AuthResult<GroupForest> {
        let mut forest = GroupForest::new();

        let Some(entries) = node.as_list() else {
            self.report(ClaimShapeIssue::new(
                path,
                format!("expected a list of groups, got {}", node.kind()),
            ))?;
            return Ok(forest);
        };

        for (idx, entry) in entries.iter().enumerate() {
            let entry_path = format!("{path}[{idx}]");
            if let Some((code, tree)) = self.read_group(entry, &entry_path, ancestors)? {
                forest.insert(code, tree);
            }
        }
        Ok(forest)
    }

    fn read_group(
        &mut self,
        entry: &ClaimValue,
        path: &str,
        ancestors: &mut Vec<String>,
    ) -> AuthResult<Option<(String, GroupTree)>> {
        let Some(fields) = entry.as_map() else {
            self.report(ClaimShapeIssue::new(
                path,
                format!("expected a group map, got {}", entry.kind()),
            ))?;
            return Ok(None);
        };

        let Some(code) = fields.get(GROUP_CODE_KEY).and_then(ClaimValue::as_str) else {
            self.report(ClaimShapeIssue::new(
                format!("{path}.{GROUP_CODE_KEY}"),
                "missing group code",
            ))?;
            return Ok(None);
        };

        let Some(group_type) = fields.get(GROUP_TYPE_KEY).and_then(ClaimValue::as_str) else {
            self.report(ClaimShapeIssue::new(
                format!("{path}.{GROUP_TYPE_KEY}"),
                format!("missing group type for '{code}'"),
            ))?;
            return Ok(None);
        };

        if ancestors.iter().any(|a| a == code) {
            self.report(ClaimShapeIssue::new(
                path,
                format!("group '{code}' is its own ancestor"),
            ))?;
            return Ok(None);
        }

        if let Some(additional) = fields.get(ADDITIONAL_KEY) {
            self.merge_additional(additional, &format!("{path}.{ADDITIONAL_KEY}"))?;
        }

        if let Some(products) = fields.get(PRODUCTS_KEY) {
            let touched = self.merge_products(products, code, &format!("{path}.{PRODUCTS_KEY}"))?;
            self.detect_admin(code, &touched);
        }

        let children = match fields.get(CHILDREN_KEY) {
            Some(node) => {
                ancestors.push(code.to_string());
                let children = self.read_level(node, &format!("{path}.{CHILDREN_KEY}"), ancestors);
                ancestors.pop();
                children?
            }
            None => GroupForest::new(),
        };

        Ok(Some((
            code.to_string(),
            GroupTree {
                group_type: group_type.to_string(),
                children,
            },
        )))
    }

    fn merge_additional(&mut self, value: &ClaimValue, path: &str) -> AuthResult<()> {
        let Some(groups) = value.as_map() else {
            return self.report(ClaimShapeIssue::new(
                path,
                format!("expected a map of groups, got {}", value.kind()),
            ));
        };
        for (group, products) in groups {
            self.merge_products(products, group, &format!("{path}.{group}"))?;
        }
        Ok(())
    }

    /// Merge `product → object → [flags]` under `group`, returning every
    /// (product, object) pair that was read.
    fn merge_products(
        &mut self,
        value: &ClaimValue,
        group: &str,
        path: &str,
    ) -> AuthResult<Vec<(String, String)>> {
        let mut touched = Vec::new();

        let Some(products) = value.as_map() else {
            self.report(ClaimShapeIssue::new(
                path,
                format!("expected a map of products, got {}", value.kind()),
            ))?;
            return Ok(touched);
        };

        for (product, objects) in products {
            let Some(objects) = objects.as_map() else {
                self.report(ClaimShapeIssue::new(
                    format!("{path}.{product}"),
                    format!("expected a map of objects, got {}", objects.kind()),
                ))?;
                continue;
            };

            for (object, flags) in objects {
                let object_path = format!("{path}.{product}.{object}");
                let Some(flags) = flags.as_list() else {
                    self.report(ClaimShapeIssue::new(
                        object_path,
                        format!("expected a list of flag strings, got {}", flags.kind()),
                    ))?;
                    continue;
                };

                for (idx, flag) in flags.iter().enumerate() {
                    match flag.as_str() {
                        Some(flag) => self.matrix.grant_flags(product, object, flag, group),
                        None => self.report(ClaimShapeIssue::new(
                            format!("{object_path}[{idx}]"),
                            format!("flag entry must be a string, got {}", flag.kind()),
                        ))?,
                    }
                }
                touched.push((product.clone(), object.clone()));
            }
        }

        Ok(touched)
    }

    fn detect_admin(&mut self, group: &str, touched: &[(String, String)]) {
        if self.admin_group != Some(group) {
            return;
        }
        let full = touched
            .iter()
            .any(|(product, object)| self.matrix.holds_crud(product, object, group));
        if full && !self.is_admin {
            info!(group, "admin group holds full access on itself");
            self.is_admin = true;
        }
    }
}
