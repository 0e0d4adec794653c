// ── Identifier newtypes ──
//
// InfoPoint uses bare integers for every id. Wrapping them keeps a RouteId
// from being passed where a VehicleId is expected.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }
    };
}

numeric_id!(
    /// InfoPoint `RouteId`.
    RouteId
);
numeric_id!(
    /// InfoPoint `VehicleId`.
    VehicleId
);
numeric_id!(
    /// InfoPoint `StopId`.
    StopId
);
numeric_id!(
    /// Service message id (`MessageId`).
    MessageId
);
