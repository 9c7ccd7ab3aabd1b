//! The authenticated caller attached to a request.

use crate::orgs::OrgRoles;
use crate::permissions::Permissions;
use crate::roles::Role;
use crate::service::Service;

/// A parsed `Authorization` header.
///
/// Built once per credential and immutable afterwards; request handlers and
/// caches share it behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// The header value the user was parsed from. For exchanged tokens this
    /// stays the original reduced credential.
    pub authorization: String,

    /// Group-model permissions (empty when the token carries no groups).
    pub permissions: Permissions,

    /// Org-model roles (empty when the token carries no orgs claim).
    pub orgs: OrgRoles,

    pub member_ids: Vec<String>,

    /// Parsed from the configured dummy token; carries no entitlements.
    pub is_dummy: bool,

    /// Flagged as a member of the privileged internal organization.
    pub privileged_member: bool,

    /// Org code whose members count as privileged, copied from the config
    /// the user was parsed with.
    pub privileged_org: Option<String>,
}

impl User {
    /// The fixed user for the dummy credential.
    pub fn dummy(authorization: impl Into<String>) -> Self {
        Self {
            authorization: authorization.into(),
            is_dummy: true,
            ..Default::default()
        }
    }

    /// Orgs where the caller's base role is at least `min_role`.
    pub fn orgs(&self, min_role: Role) -> Vec<String> {
        self.orgs.orgs(min_role)
    }

    /// Orgs where the caller's role for `service` is at least `min_role`.
    pub fn orgs_for_service(&self, min_role: Role, service: &Service) -> Vec<String> {
        self.orgs.orgs_for_service(min_role, service)
    }

    /// True iff the caller carries the privileged flag and holds at least
    /// `min_role` in the privileged org (for `service`, when given). Always
    /// false without a configured privileged org.
    pub fn is_privileged_member_with_role(&self, min_role: Role, service: Option<&Service>) -> bool {
        match self.privileged_org.as_deref() {
            Some(org) => self.privileged_member && self.orgs.has_role_in(org, min_role, service),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orgs::OrgRoleEntry;

    fn privileged(role: Role) -> User {
        User {
            authorization: "Bearer reduced".to_string(),
            orgs: OrgRoles::new(vec![OrgRoleEntry::new("tgx", role)]),
            privileged_member: true,
            privileged_org: Some("tgx".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn privileged_member_with_admin_role() {
        assert!(privileged(Role::Admin).is_privileged_member_with_role(Role::Admin, None));
    }

    #[test]
    fn privileged_member_with_viewer_role_is_not_enough() {
        assert!(!privileged(Role::Viewer).is_privileged_member_with_role(Role::Admin, None));
    }

    #[test]
    fn privileged_check_requires_the_flag() {
        let mut user = privileged(Role::Owner);
        user.privileged_member = false;
        assert!(!user.is_privileged_member_with_role(Role::Viewer, None));
    }

    #[test]
    fn privileged_check_honours_service_overrides() {
        let user = User {
            orgs: OrgRoles::new(vec![
                OrgRoleEntry::new("tgx", Role::Viewer).with_service(Service::ENTITIES, Role::Admin),
            ]),
            privileged_member: true,
            privileged_org: Some("tgx".to_string()),
            ..Default::default()
        };
        assert!(user.is_privileged_member_with_role(Role::Admin, Some(&Service::ENTITIES)));
        assert!(!user.is_privileged_member_with_role(Role::Admin, None));
    }

    #[test]
    fn privileged_check_only_looks_at_the_privileged_org() {
        let mut user = privileged(Role::Owner);
        user.privileged_org = Some("other".to_string());
        assert!(!user.is_privileged_member_with_role(Role::Viewer, None));

        user.privileged_org = None;
        assert!(!user.is_privileged_member_with_role(Role::Viewer, None));
    }

    #[test]
    fn dummy_user_has_no_entitlements() {
        let user = User::dummy("Bearer dummy");
        assert!(user.is_dummy);
        assert!(user.orgs(Role::Viewer).is_empty());
        assert!(user.permissions.all_groups().is_empty());
    }
}
