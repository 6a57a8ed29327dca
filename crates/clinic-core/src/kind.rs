use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// The record families served by the clinic API.
///
/// Each kind owns exactly one store collection (or table) and one route
/// group under `/api/<collection>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Medicines,
    Supplies,
    Equipment,
    Patients,
    Consultations,
    AdminUsers,
    Logs,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Medicines,
        ResourceKind::Supplies,
        ResourceKind::Equipment,
        ResourceKind::Patients,
        ResourceKind::Consultations,
        ResourceKind::AdminUsers,
        ResourceKind::Logs,
    ];

    /// Collection name, also used as the PostgreSQL table name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Medicines => "medicines",
            ResourceKind::Supplies => "supplies",
            ResourceKind::Equipment => "equipment",
            ResourceKind::Patients => "patients",
            ResourceKind::Consultations => "consultations",
            ResourceKind::AdminUsers => "admin_users",
            ResourceKind::Logs => "logs",
        }
    }

    /// Singular, human-facing name used in error messages ("Equipment not found").
    pub const fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Medicines => "Medicine",
            ResourceKind::Supplies => "Supply",
            ResourceKind::Equipment => "Equipment",
            ResourceKind::Patients => "Patient",
            ResourceKind::Consultations => "Consultation",
            ResourceKind::AdminUsers => "Admin user",
            ResourceKind::Logs => "Log",
        }
    }

    /// Whether records of this kind carry the `is_active` soft-delete flag.
    pub const fn has_active_flag(&self) -> bool {
        !matches!(self, ResourceKind::Logs | ResourceKind::Consultations)
    }

    /// Field that list queries sort on (descending) before pagination.
    ///
    /// Kinds without a sort field keep insertion order.
    pub const fn newest_first_field(&self) -> Option<&'static str> {
        match self {
            ResourceKind::Logs => Some("timestamp"),
            ResourceKind::AdminUsers => Some("created_at"),
            _ => None,
        }
    }

    /// Message used when a record of this kind is missing.
    pub fn not_found_message(&self) -> String {
        format!("{} not found", self.display_name())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "medicines" => Ok(ResourceKind::Medicines),
            "supplies" => Ok(ResourceKind::Supplies),
            "equipment" => Ok(ResourceKind::Equipment),
            "patients" => Ok(ResourceKind::Patients),
            "consultations" => Ok(ResourceKind::Consultations),
            "admin_users" | "admin-users" => Ok(ResourceKind::AdminUsers),
            "logs" => Ok(ResourceKind::Logs),
            other => Err(CoreError::unknown_resource_kind(other)),
        }
    }
}
