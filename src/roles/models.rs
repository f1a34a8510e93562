// Role records and role assignment DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const ADMIN: &str = "Admin";
pub const USER: &str = "User";
pub const VISITOR: &str = "Visitor";

/// A role that exists from first start
#[derive(Debug, Clone, Copy)]
pub struct BootstrapRole {
    pub id: Uuid,
    pub name: &'static str,
    pub description: &'static str,
}

/// Roles created by the initial migration; the ids are fixed there too
pub const BOOTSTRAP_ROLES: [BootstrapRole; 3] = [
    BootstrapRole {
        id: Uuid::from_u128(0x6f1c1f7e_3b0a_4c52_9d3e_0a1b2c3d4e01),
        name: ADMIN,
        description: "Full system access with all privileges",
    },
    BootstrapRole {
        id: Uuid::from_u128(0x6f1c1f7e_3b0a_4c52_9d3e_0a1b2c3d4e02),
        name: USER,
        description: "Regular user with standard access",
    },
    BootstrapRole {
        id: Uuid::from_u128(0x6f1c1f7e_3b0a_4c52_9d3e_0a1b2c3d4e03),
        name: VISITOR,
        description: "Limited access for viewing public content",
    },
];

/// Role model representing a role in the database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<BootstrapRole> for Role {
    fn from(role: BootstrapRole) -> Self {
        Self {
            id: role.id,
            name: role.name.to_string(),
            description: Some(role.description.to_string()),
        }
    }
}

/// Request DTO for granting a role to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

/// A granted role, as stored and as returned to the client
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub role_name: String,
    pub assigned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_roles_are_distinct() {
        let names: Vec<&str> = BOOTSTRAP_ROLES.iter().map(|r| r.name).collect();
        assert_eq!(names, vec![ADMIN, USER, VISITOR]);
        assert_eq!(
            BOOTSTRAP_ROLES[0].id.to_string(),
            "6f1c1f7e-3b0a-4c52-9d3e-0a1b2c3d4e01"
        );
        assert_ne!(BOOTSTRAP_ROLES[1].id, BOOTSTRAP_ROLES[2].id);
    }

    #[test]
    fn test_assignment_serializes_camel_case() {
        let assignment = RoleAssignment {
            user_id: Uuid::nil(),
            role_id: BOOTSTRAP_ROLES[0].id,
            role_name: ADMIN.to_string(),
            assigned_at: Utc::now(),
        };
        let json = serde_json::to_value(&assignment).unwrap();

        assert_eq!(json["roleName"], "Admin");
        assert!(json.get("userId").is_some());
        assert!(json.get("assignedAt").is_some());
    }
}
