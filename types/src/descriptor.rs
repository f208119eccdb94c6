//! Action descriptors: namespaced action names.
//!
//! A descriptor is a stem verb plus an object, e.g. `"Create:Document"`.
//! The engine treats it as an opaque lookup key into the governance tables;
//! the object part is split out only to default the domain at creation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A namespaced string identifying an action kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActionDescriptor(String);

impl ActionDescriptor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The object part (`"Document"` in `"Create:Document"`), if present.
    pub fn object(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, o)| o)
    }
}

impl fmt::Display for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActionDescriptor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
