//! One capability interface over both entitlement models.
//!
//! The group model answers permission checks and the org model answers role
//! queries; each reports "nothing granted" for the question it cannot answer.
//! Callers that hold a [`User`] get both through the same trait.

use crate::flags::PermissionKind;
use crate::orgs::OrgRoles;
use crate::permissions::Permissions;
use crate::roles::Role;
use crate::service::Service;
use crate::user::User;

pub trait Entitlements {
    /// See [`Permissions::check_permission`].
    fn check_permission(
        &self,
        product: &str,
        object: &str,
        kind: PermissionKind,
        groups: &[&str],
    ) -> (Vec<String>, bool);

    /// Orgs where the caller holds at least `min_role`, optionally for a
    /// specific service.
    fn orgs_with_role(&self, min_role: Role, service: Option<&Service>) -> Vec<String>;
}

impl Entitlements for Permissions {
    fn check_permission(
        &self,
        product: &str,
        object: &str,
        kind: PermissionKind,
        groups: &[&str],
    ) -> (Vec<String>, bool) {
        Permissions::check_permission(self, product, object, kind, groups)
    }

    fn orgs_with_role(&self, _min_role: Role, _service: Option<&Service>) -> Vec<String> {
        Vec::new()
    }
}

impl Entitlements for OrgRoles {
    fn check_permission(
        &self,
        _product: &str,
        _object: &str,
        _kind: PermissionKind,
        _groups: &[&str],
    ) -> (Vec<String>, bool) {
        (Vec::new(), false)
    }

    fn orgs_with_role(&self, min_role: Role, service: Option<&Service>) -> Vec<String> {
        match service {
            Some(service) => self.orgs_for_service(min_role, service),
            None => self.orgs(min_role),
        }
    }
}

impl Entitlements for User {
    fn check_permission(
        &self,
        product: &str,
        object: &str,
        kind: PermissionKind,
        groups: &[&str],
    ) -> (Vec<String>, bool) {
        if self.is_dummy {
            return (Vec::new(), false);
        }
        self.permissions.check_permission(product, object, kind, groups)
    }

    fn orgs_with_role(&self, min_role: Role, service: Option<&Service>) -> Vec<String> {
        if self.is_dummy {
            return Vec::new();
        }
        self.orgs.orgs_with_role(min_role, service)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_permissions;
    use crate::orgs::OrgRoleEntry;
    use serde_json::json;
    use tollgate_core::ClaimValue;

    fn user() -> User {
        let groups = ClaimValue::from_json(json!([
            { "c": "G", "t": "org", "p": { "hotels": { "booking": ["r1"] } } }
        ]))
        .unwrap();
        User {
            authorization: "Bearer t".to_string(),
            permissions: build_permissions([&groups], None),
            orgs: OrgRoles::new(vec![
                OrgRoleEntry::new("org1", Role::Viewer).with_service(Service::ENTITIES, Role::Owner),
            ]),
            ..Default::default()
        }
    }

    fn check_through(e: &dyn Entitlements) -> bool {
        e.check_permission("hotels", "booking", PermissionKind::Read, &[]).1
    }

    #[test]
    fn user_answers_both_models() {
        let user = user();
        assert!(check_through(&user));
        assert_eq!(user.orgs_with_role(Role::Owner, Some(&Service::ENTITIES)), vec!["org1"]);
        assert!(user.orgs_with_role(Role::Owner, None).is_empty());
    }

    #[test]
    fn each_model_denies_what_it_cannot_answer() {
        let user = user();
        assert!(user.permissions.orgs_with_role(Role::Viewer, None).is_empty());
        assert!(!check_through(&user.orgs));
    }

    #[test]
    fn dummy_user_is_denied_everything() {
        let mut user = user();
        user.is_dummy = true;
        assert!(!check_through(&user));
        assert!(user.orgs_with_role(Role::Viewer, None).is_empty());
    }
}
