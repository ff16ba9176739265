// ABOUTME: Tenant identity derived from the tenant directory count.
// ABOUTME: Validates the `tenant<N>` form and derives per-tenant resource names.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::ContainerId;

const PREFIX: &str = "tenant";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TenantIdError {
    #[error("tenant id cannot be empty")]
    Empty,

    #[error("tenant id must start with 'tenant'")]
    MissingPrefix,

    #[error("tenant id must end with a positive number")]
    InvalidOrdinal,
}

/// Identity of one tenant, rendered as `tenant<N>` with `N >= 1`.
///
/// The ordinal is assigned once from the number of existing tenant
/// directories and never changes for the tenant's lifetime. All container,
/// volume, network and compose project names are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TenantId(u32);

impl TenantId {
    pub fn from_ordinal(ordinal: u32) -> Result<Self, TenantIdError> {
        if ordinal == 0 {
            return Err(TenantIdError::InvalidOrdinal);
        }
        Ok(Self(ordinal))
    }

    pub fn parse(value: &str) -> Result<Self, TenantIdError> {
        if value.is_empty() {
            return Err(TenantIdError::Empty);
        }

        let digits = value
            .strip_prefix(PREFIX)
            .ok_or(TenantIdError::MissingPrefix)?;

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) || digits.starts_with('0')
        {
            return Err(TenantIdError::InvalidOrdinal);
        }

        let ordinal = digits
            .parse::<u32>()
            .map_err(|_| TenantIdError::InvalidOrdinal)?;
        Self::from_ordinal(ordinal)
    }

    pub fn ordinal(&self) -> u32 {
        self.0
    }

    /// Compose project name; also the prefix of every resource name.
    pub fn project_name(&self) -> String {
        self.to_string()
    }

    pub fn database_container(&self) -> ContainerId {
        ContainerId::new(format!("{self}_db"))
    }

    pub fn application_container(&self) -> ContainerId {
        ContainerId::new(format!("{self}_shop"))
    }

    pub fn database_volume(&self) -> String {
        format!("db_data_{self}")
    }

    pub fn application_volume(&self) -> String {
        format!("shop_data_{self}")
    }

    pub fn network(&self) -> String {
        format!("{self}_net")
    }

    /// Both containers of the stack, database first.
    pub fn containers(&self) -> [ContainerId; 2] {
        [self.database_container(), self.application_container()]
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = TenantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for TenantId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for TenantId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
