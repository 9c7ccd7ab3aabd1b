use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Product-area tag used to scope per-service role overrides.
///
/// Services are opaque strings at this layer; well-known ones are exposed as
/// associated constants.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Service(Cow<'static, str>);

impl Service {
    pub const ENTITIES: Service = Service(Cow::Borrowed("ENTITIES"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Service {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Service {
    fn from(value: &str) -> Self {
        Self(Cow::Owned(value.to_string()))
    }
}
