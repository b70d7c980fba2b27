use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::query::blank_as_null;

/// Roles the backend puts in the bearer token.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Employee => "Employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Admin" => Ok(Role::Admin),
            "Employee" => Ok(Role::Employee),
            _ => Err(()),
        }
    }
}

/// Who is signed in, as read from the token's claims. Every field is
/// optional because each claim may be missing independently.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Identity {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub role: Option<Role>,
}

#[derive(Serialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// --- Resource records (camelCase on the wire, every field tolerant of absence) ---

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<i64>,
    pub asset_name: Option<String>,
    pub asset_model: Option<String>,
    pub category_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub role_id: Option<i64>,
    pub address: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub asset_id: i64,
    pub employee_id: i64,
    pub allocation_date: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_request_id: Option<i64>,
    pub asset_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    pub employee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    pub issue_type: Option<String>,
    pub description: Option<String>,
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    pub request_date: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuditRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_request_id: Option<i64>,
    pub asset_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_name: Option<String>,
    pub employee_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_name: Option<String>,
    pub status_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    pub request_date: Option<String>,
    pub verified_date: Option<String>,
}

/// Admin log entries arrive camelCase from search and PascalCase from some
/// list endpoints, so every field accepts both.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminLog {
    #[serde(alias = "AdminLogId", skip_serializing_if = "Option::is_none")]
    pub admin_log_id: Option<i64>,
    #[serde(alias = "AdminId")]
    pub admin_id: Option<i64>,
    #[serde(alias = "Action")]
    pub action: Option<String>,
    #[serde(alias = "EntityAffected")]
    pub entity_affected: Option<String>,
    #[serde(alias = "Description")]
    pub description: Option<String>,
    #[serde(alias = "Timestamp")]
    pub timestamp: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetCategory {
    #[serde(alias = "CategoryId")]
    pub category_id: i64,
    #[serde(alias = "CategoryName")]
    pub category_name: Option<String>,
}

/// Asset status lookup, normalized from the backend's `{id, name}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetStatus {
    #[serde(alias = "id", alias = "Id")]
    pub status_id: i64,
    #[serde(alias = "name", alias = "Name")]
    pub status_name: Option<String>,
}

/// Composite key of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AllocationKey {
    pub asset_id: i64,
    pub employee_id: i64,
}

impl fmt::Display for AllocationKey {
    /// Renders the path segment used by the allocation endpoints.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "asset/{}/employee/{}", self.asset_id, self.employee_id)
    }
}

impl FromStr for AllocationKey {
    type Err = String;

    /// Accepts `ASSET:EMPLOYEE`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (asset, employee) = raw
            .split_once(':')
            .ok_or_else(|| format!("allocation key must look like ASSET:EMPLOYEE, got {raw:?}"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| format!("allocation key part {part:?} is not a number"))
        };
        Ok(Self {
            asset_id: parse(asset)?,
            employee_id: parse(employee)?,
        })
    }
}

// --- Search filters. Blank text is always sent as null. ---

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct AssetFilter {
    #[serde(serialize_with = "blank_as_null")]
    pub asset_name: Option<String>,
    #[serde(serialize_with = "blank_as_null")]
    pub asset_model: Option<String>,
    pub category_id: Option<i64>,
    pub status_id: Option<i64>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct EmployeeFilter {
    #[serde(serialize_with = "blank_as_null")]
    pub first_name: Option<String>,
    #[serde(serialize_with = "blank_as_null")]
    pub last_name: Option<String>,
    #[serde(serialize_with = "blank_as_null")]
    pub email: Option<String>,
    pub role_id: Option<i64>,
    #[serde(serialize_with = "blank_as_null")]
    pub phone_number: Option<String>,
    #[serde(serialize_with = "blank_as_null")]
    pub gender: Option<String>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AllocationFilter {
    pub asset_id: Option<i64>,
    pub employee_id: Option<i64>,
}

/// Shared by service requests and audit requests.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilter {
    pub asset_id: Option<i64>,
    pub employee_id: Option<i64>,
    pub status_id: Option<i64>,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdminLogFilter {
    pub admin_id: Option<i64>,
    #[serde(serialize_with = "blank_as_null")]
    pub action: Option<String>,
    #[serde(serialize_with = "blank_as_null")]
    pub entity_affected: Option<String>,
}
