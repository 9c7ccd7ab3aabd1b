//! Permission flag codec.
//!
//! Claims carry permissions as compact strings of the form
//! `[c][r][u][d](0|1)[extension chars]*`, e.g. `"cru1"` or `"r1x"`.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An atomic action that can be granted on an object.
///
/// Anything outside `c`/`r`/`u`/`d` travels as an [`PermissionKind::Extension`]
/// tag and is preserved verbatim, so new tags need no code change here.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionKind {
    Create,
    Read,
    Update,
    Delete,
    Extension(char),
}

impl PermissionKind {
    pub const EXECUTE: PermissionKind = PermissionKind::Extension('x');
    pub const ADMIN: PermissionKind = PermissionKind::Extension('a');

    /// The wire character for this kind.
    pub fn as_char(self) -> char {
        match self {
            PermissionKind::Create => 'c',
            PermissionKind::Read => 'r',
            PermissionKind::Update => 'u',
            PermissionKind::Delete => 'd',
            PermissionKind::Extension(c) => c,
        }
    }

    pub fn from_char(c: char) -> Self {
        match c {
            'c' => PermissionKind::Create,
            'r' => PermissionKind::Read,
            'u' => PermissionKind::Update,
            'd' => PermissionKind::Delete,
            other => PermissionKind::Extension(other),
        }
    }

    pub fn is_crud(self) -> bool {
        !matches!(self, PermissionKind::Extension(_))
    }
}

impl core::fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl Serialize for PermissionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.as_char())
    }
}

impl<'de> Deserialize<'de> for PermissionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        char::deserialize(deserializer).map(Self::from_char)
    }
}

/// Decode one permission flag string into the set of granted kinds.
///
/// The enable digit gates only the c/r/u/d flags; when several digits occur
/// the last one wins, and without one those flags are not granted. Every other
/// character is granted unconditionally as an extension tag.
pub fn decode_flags(flags: &str) -> BTreeSet<PermissionKind> {
    let mut crud = BTreeSet::new();
    let mut granted = BTreeSet::new();
    let mut enabled = false;

    for ch in flags.chars() {
        match ch {
            'c' | 'r' | 'u' | 'd' => {
                crud.insert(PermissionKind::from_char(ch));
            }
            '0' => enabled = false,
            '1' => enabled = true,
            other => {
                granted.insert(PermissionKind::Extension(other));
            }
        }
    }

    if enabled {
        granted.extend(crud);
    }
    granted
}
