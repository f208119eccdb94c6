//! Actor categories: the closed set of governance profiles.
//!
//! Categories are a closed enum rather than free-form strings so that an
//! unknown category is unrepresentable and every dispatch over categories is
//! exhaustiveness-checked at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The governance profile an actor belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorCategory {
    Individual,
    Professional,
    Enterprise,
    Student,
    Research,
    Government,
}

impl ActorCategory {
    /// Every category, in declaration order. Used to build the policy table
    /// eagerly at load time.
    pub const ALL: [ActorCategory; 6] = [
        Self::Individual,
        Self::Professional,
        Self::Enterprise,
        Self::Student,
        Self::Research,
        Self::Government,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
            Self::Student => "student",
            Self::Research => "research",
            Self::Government => "government",
        }
    }
}

impl fmt::Display for ActorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
