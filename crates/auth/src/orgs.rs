//! Organization/role model.
//!
//! The orgs claim is a flat list, one entry per organization:
//!
//! ```json
//! [
//!   { "o": "org1", "r": "ADMIN" },
//!   { "o": "org2", "r": "VIEWER", "s": [ { "s": "ENTITIES", "r": "ADMIN" } ] }
//! ]
//! ```
//!
//! `r` falls back to `VIEWER` when absent or unknown. `s` holds per-service
//! overrides that can only raise the role for that service.

use serde::{Deserialize, Serialize};
use tracing::warn;

use tollgate_core::{AuthResult, ClaimShapeIssue, ClaimValue};

use crate::builder::BuildPolicy;
use crate::roles::Role;
use crate::service::Service;

pub const ORG_KEY: &str = "o";
pub const ROLE_KEY: &str = "r";
pub const SERVICES_KEY: &str = "s";
pub const SERVICE_KEY: &str = "s";

/// A role override for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRole {
    pub service: Service,
    #[serde(default)]
    pub role: Role,
}

/// The caller's role in one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgRoleEntry {
    pub org: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceRole>,
}

impl OrgRoleEntry {
    pub fn new(org: impl Into<String>, role: Role) -> Self {
        Self {
            org: org.into(),
            role,
            services: Vec::new(),
        }
    }

    pub fn with_service(mut self, service: Service, role: Role) -> Self {
        self.services.push(ServiceRole { service, role });
        self
    }

    /// Role for `service`: the base role raised by any matching override.
    /// Never lower than the base role.
    pub fn effective_role(&self, service: Option<&Service>) -> Role {
        let Some(service) = service else {
            return self.role;
        };
        self.services
            .iter()
            .filter(|o| &o.service == service)
            .map(|o| o.role)
            .fold(self.role, Ord::max)
    }
}

/// All org roles of one caller, in claim order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgRoles {
    entries: Vec<OrgRoleEntry>,
    issues: Vec<ClaimShapeIssue>,
}

impl OrgRoles {
    pub fn new(entries: Vec<OrgRoleEntry>) -> Self {
        Self {
            entries,
            issues: Vec::new(),
        }
    }

    /// Read the orgs claim. Entries without an org code are skipped (and
    /// recorded) under `Lenient`, or fail the read under `Strict`.
    pub fn from_claim(claim: &ClaimValue, policy: BuildPolicy) -> AuthResult<Self> {
        let mut reader = Reader {
            policy,
            issues: Vec::new(),
        };

        let Some(items) = claim.as_list() else {
            reader.report(ClaimShapeIssue::new(
                "orgs",
                format!("expected a list of orgs, got {}", claim.kind()),
            ))?;
            return Ok(Self {
                entries: Vec::new(),
                issues: reader.issues,
            });
        };

        let mut entries = Vec::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if let Some(entry) = reader.read_entry(item, &format!("orgs[{idx}]"))? {
                entries.push(entry);
            }
        }

        Ok(Self {
            entries,
            issues: reader.issues,
        })
    }

    pub fn entries(&self) -> &[OrgRoleEntry] {
        &self.entries
    }

    pub fn issues(&self) -> &[ClaimShapeIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Orgs where the base role is at least `min_role`.
    pub fn orgs(&self, min_role: Role) -> Vec<String> {
        self.matching(min_role, None)
    }

    /// Orgs where the role for `service` is at least `min_role`.
    pub fn orgs_for_service(&self, min_role: Role, service: &Service) -> Vec<String> {
        self.matching(min_role, Some(service))
    }

    /// Effective role in `org`, or `None` without an entry for it.
    ///
    /// With several entries for the same org the highest role wins.
    pub fn role_in(&self, org: &str, service: Option<&Service>) -> Option<Role> {
        self.entries
            .iter()
            .filter(|e| e.org == org)
            .map(|e| e.effective_role(service))
            .max()
    }

    pub fn has_role_in(&self, org: &str, min_role: Role, service: Option<&Service>) -> bool {
        self.role_in(org, service).is_some_and(|r| r >= min_role)
    }

    fn matching(&self, min_role: Role, service: Option<&Service>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.effective_role(service) >= min_role)
            .map(|e| e.org.clone())
            .collect()
    }
}

struct Reader {
    policy: BuildPolicy,
    issues: Vec<ClaimShapeIssue>,
}

impl Reader {
    fn report(&mut self, issue: ClaimShapeIssue) -> AuthResult<()> {
        match self.policy {
            BuildPolicy::Strict => Err(issue.into()),
            BuildPolicy::Lenient => {
                warn!(path = %issue.path, reason = %issue.reason, "skipping malformed org claim");
                self.issues.push(issue);
                Ok(())
            }
        }
    }

    fn read_entry(&mut self, item: &ClaimValue, path: &str) -> AuthResult<Option<OrgRoleEntry>> {
        let Some(org) = item.get(ORG_KEY).and_then(ClaimValue::as_str) else {
            self.report(ClaimShapeIssue::new(format!("{path}.{ORG_KEY}"), "missing org code"))?;
            return Ok(None);
        };

        let mut entry = OrgRoleEntry::new(org, Role::from_claim_value(item.get(ROLE_KEY)));

        match item.get(SERVICES_KEY) {
            None => {}
            Some(ClaimValue::List(overrides)) => {
                for (idx, o) in overrides.iter().enumerate() {
                    let Some(service) = o.get(SERVICE_KEY).and_then(ClaimValue::as_str) else {
                        self.report(ClaimShapeIssue::new(
                            format!("{path}.{SERVICES_KEY}[{idx}].{SERVICE_KEY}"),
                            "missing service code",
                        ))?;
                        continue;
                    };
                    entry = entry.with_service(
                        Service::from(service),
                        Role::from_claim_value(o.get(ROLE_KEY)),
                    );
                }
            }
            Some(other) => {
                self.report(ClaimShapeIssue::new(
                    format!("{path}.{SERVICES_KEY}"),
                    format!("expected a list of service roles, got {}", other.kind()),
                ))?;
            }
        }

        Ok(Some(entry))
    }
}
