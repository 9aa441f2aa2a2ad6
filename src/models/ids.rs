//! Remote identifiers
//!
//! TestRail hands out plain integers for cases, runs and tests. Each kind gets
//! its own newtype so a run id can never be submitted where a test id belongs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

remote_id!(
    /// Test case identifier, unique within a project
    CaseId,
    "C"
);

remote_id!(
    /// Run identifier, unique within a plan
    RunId,
    "R"
);

remote_id!(
    /// Identifier of one (run, case) pairing; the target of a result
    InstanceId,
    "T"
);
