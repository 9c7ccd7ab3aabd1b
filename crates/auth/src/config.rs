//! Parser configuration.

use serde::{Deserialize, Serialize};

use tollgate_core::{AuthError, AuthResult};

use crate::builder::BuildPolicy;

/// Everything the claims parser needs to know about a deployment.
///
/// Nothing here is process-global: a config value is handed to each parser
/// and flows explicitly into every build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PEM-encoded RSA public key used to verify RS256 tokens.
    pub public_key: String,

    /// Group code whose full CRUD on itself marks the caller as admin.
    pub admin_group: Option<String>,

    /// Sentinel bearer that bypasses verification and yields a dummy user.
    pub dummy_token: Option<String>,

    /// Skip `exp`/`nbf` validation.
    pub ignore_expiration: bool,

    /// Fail on malformed claim elements instead of skipping them.
    pub strict_claims: bool,

    /// Claims holding group trees; each present one seeds its own root.
    pub groups_claims: Vec<String>,

    /// Claims holding member identifiers (string values only).
    pub member_id_claims: Vec<String>,

    /// Claim holding the flat org/role list.
    pub orgs_claim: Option<String>,

    /// Boolean claim marking a reduced token that must be exchanged.
    pub fetch_needed_claim: Option<String>,

    /// Boolean claim marking a privileged internal member.
    pub privileged_member_claim: Option<String>,

    /// Org code whose members count as privileged.
    pub privileged_org: Option<String>,

    /// Endpoint of the full-token exchange service.
    pub fetcher_url: Option<String>,
}

impl AuthConfig {
    /// Read `TOLLGATE_*` environment variables.
    ///
    /// List values are comma separated; empty values count as unset.
    pub fn from_env() -> AuthResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AuthResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let list = |key: &str| {
            get(key)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<String>>()
                })
                .unwrap_or_default()
        };
        let flag = |key: &str| -> AuthResult<bool> {
            match get(key) {
                None => Ok(false),
                Some(v) => v
                    .parse::<bool>()
                    .map_err(|_| AuthError::configuration(format!("{key} must be true or false, got '{v}'"))),
            }
        };

        Ok(Self {
            public_key: get("TOLLGATE_PUBLIC_KEY").unwrap_or_default(),
            admin_group: get("TOLLGATE_ADMIN_GROUP"),
            dummy_token: get("TOLLGATE_DUMMY_TOKEN"),
            ignore_expiration: flag("TOLLGATE_IGNORE_EXPIRATION")?,
            strict_claims: flag("TOLLGATE_STRICT_CLAIMS")?,
            groups_claims: list("TOLLGATE_GROUPS_CLAIMS"),
            member_id_claims: list("TOLLGATE_MEMBER_ID_CLAIMS"),
            orgs_claim: get("TOLLGATE_ORGS_CLAIM"),
            fetch_needed_claim: get("TOLLGATE_FETCH_NEEDED_CLAIM"),
            privileged_member_claim: get("TOLLGATE_PRIVILEGED_MEMBER_CLAIM"),
            privileged_org: get("TOLLGATE_PRIVILEGED_ORG"),
            fetcher_url: get("TOLLGATE_FETCHER_URL"),
        })
    }

    pub fn build_policy(&self) -> BuildPolicy {
        if self.strict_claims {
            BuildPolicy::Strict
        } else {
            BuildPolicy::Lenient
        }
    }

    /// The dummy token, if one is configured and non-empty.
    pub fn dummy_token(&self) -> Option<&str> {
        self.dummy_token.as_deref().filter(|t| !t.is_empty())
    }
}
