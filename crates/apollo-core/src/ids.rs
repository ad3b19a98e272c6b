//! Strongly-typed numeric identifiers for admin service records.
//!
//! The admin service keys releases, items and the rest by 64-bit database ids.
//! Wrapping them keeps a release id from being passed where an item id is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Macro to generate strongly-typed id wrapper types.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw id.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(wrapper: $name) -> Self {
                wrapper.0
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                s.trim()
                    .parse::<i64>()
                    .map(Self)
                    .map_err(|_| Error::InvalidRequest(format!("invalid {}: {s}", stringify!($name))))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(ReleaseId, "Release id");
id_type!(ItemId, "Configuration item id");
id_type!(ClusterId, "Cluster id");
id_type!(NamespaceId, "Namespace id");
id_type!(InstanceId, "Instance id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = ReleaseId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<ReleaseId>().unwrap(), id);
        assert_eq!(" 7 ".parse::<ItemId>().unwrap().get(), 7);
    }

    #[test]
    fn test_id_parse_invalid() {
        let err = "abc".parse::<ReleaseId>().unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(err.to_string().contains("ReleaseId"));
    }

    #[test]
    fn test_id_serde_transparent() {
        let json = serde_json::to_string(&ItemId::new(9)).unwrap();
        assert_eq!(json, "9");
        let id: NamespaceId = serde_json::from_str("11").unwrap();
        assert_eq!(i64::from(id), 11);
    }

    #[test]
    fn test_id_ordering() {
        let mut ids = vec![ReleaseId::new(3), ReleaseId::new(1), ReleaseId::new(2)];
        ids.sort();
        assert_eq!(ids, vec![ReleaseId::new(1), ReleaseId::new(2), ReleaseId::new(3)]);
    }
}
