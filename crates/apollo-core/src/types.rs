//! Core portal types.
//!
//! This module provides the deployment environment enumeration every admin
//! service call is routed by.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Name the admin service registers under in the meta server.
pub const ADMIN_SERVICE_APP_NAME: &str = "apollo-adminservice";

/// Deployment environments the portal can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Env {
    /// Local development
    Local,
    /// Shared development
    Dev,
    /// Feature web service
    Fws,
    /// Feature acceptance test
    Fat,
    /// User acceptance test
    Uat,
    /// Load and performance test
    Lpt,
    /// Production
    Pro,
    /// Tooling
    Tools,
}

impl Env {
    /// Returns the canonical environment name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Dev => "DEV",
            Self::Fws => "FWS",
            Self::Fat => "FAT",
            Self::Uat => "UAT",
            Self::Lpt => "LPT",
            Self::Pro => "PRO",
            Self::Tools => "TOOLS",
        }
    }

    /// Returns all known environments.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Local,
            Self::Dev,
            Self::Fws,
            Self::Fat,
            Self::Uat,
            Self::Lpt,
            Self::Pro,
            Self::Tools,
        ]
    }

    /// Returns true for environments that serve real traffic.
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Pro)
    }
}

impl FromStr for Env {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "dev" => Ok(Self::Dev),
            "fws" => Ok(Self::Fws),
            "fat" | "test" => Ok(Self::Fat),
            "uat" => Ok(Self::Uat),
            "lpt" => Ok(Self::Lpt),
            "pro" | "prod" => Ok(Self::Pro),
            "tools" => Ok(Self::Tools),
            _ => Err(Error::InvalidEnv(s.to_string())),
        }
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
