use core::convert::Infallible;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tollgate_core::ClaimValue;

/// Privilege level inside an organization.
///
/// Totally ordered: `Viewer < Editor < Admin < Owner`. Unknown or absent role
/// strings map to [`Role::Viewer`]; an unrecognised role is never an error.
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum Role {
    #[default]
    Viewer,
    Editor,
    Admin,
    Owner,
}

impl Role {
    /// Parse a role claim. Exact, case-sensitive match; anything else is `Viewer`.
    pub fn from_claim(role: &str) -> Self {
        match role {
            "OWNER" => Role::Owner,
            "ADMIN" => Role::Admin,
            "EDITOR" => Role::Editor,
            _ => Role::Viewer,
        }
    }

    /// Parse an optional claim value; non-strings and `None` yield `Viewer`.
    pub fn from_claim_value(value: Option<&ClaimValue>) -> Self {
        value
            .and_then(ClaimValue::as_str)
            .map(Self::from_claim)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "VIEWER",
            Role::Editor => "EDITOR",
            Role::Admin => "ADMIN",
            Role::Owner => "OWNER",
        }
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_claim(s))
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        Self::from_claim(&role)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roles_are_totally_ordered() {
        assert!(Role::Viewer < Role::Editor);
        assert!(Role::Editor < Role::Admin);
        assert!(Role::Admin < Role::Owner);
    }

    #[test]
    fn known_roles_parse_exactly() {
        assert_eq!(Role::from_claim("OWNER"), Role::Owner);
        assert_eq!(Role::from_claim("ADMIN"), Role::Admin);
        assert_eq!(Role::from_claim("EDITOR"), Role::Editor);
        assert_eq!(Role::from_claim("VIEWER"), Role::Viewer);
        // Case-sensitive.
        assert_eq!(Role::from_claim("owner"), Role::Viewer);
    }

    #[test]
    fn absent_or_non_string_claim_is_viewer() {
        assert_eq!(Role::from_claim_value(None), Role::Viewer);
        assert_eq!(
            Role::from_claim_value(Some(&ClaimValue::Bool(true))),
            Role::Viewer
        );
    }

    #[test]
    fn display_round_trips_through_from_claim() {
        for role in [Role::Viewer, Role::Editor, Role::Admin, Role::Owner] {
            assert_eq!(Role::from_claim(&role.to_string()), role);
        }
    }

    #[test]
    fn deserializing_unknown_roles_yields_viewer() {
        let role: Role = serde_json::from_str("\"SUPERUSER\"").unwrap();
        assert_eq!(role, Role::Viewer);
        let role: Role = serde_json::from_str("\"OWNER\"").unwrap();
        assert_eq!(role, Role::Owner);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
    }

    proptest! {
        #[test]
        fn unknown_role_strings_default_to_viewer(s in ".*") {
            prop_assume!(s != "OWNER" && s != "ADMIN" && s != "EDITOR");
            prop_assert_eq!(Role::from_claim(&s), Role::Viewer);
        }
    }
}
