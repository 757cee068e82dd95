//! Core types for the JWT Pizza domain

use serde::{Deserialize, Serialize};

/// Numeric identifier shared by users, franchises, stores, menu items and orders
pub type EntityId = u64;

/// Kind of role an identity can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleKind {
    #[serde(rename = "diner")]
    Diner,
    #[serde(rename = "franchisee")]
    FranchiseOwner,
    #[serde(rename = "admin")]
    Administrator,
}

impl std::fmt::Display for RoleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleKind::Diner => write!(f, "diner"),
            RoleKind::FranchiseOwner => write!(f, "franchisee"),
            RoleKind::Administrator => write!(f, "admin"),
        }
    }
}

/// A role assignment. `scope_id` names the franchise for franchise owners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: RoleKind,
    #[serde(rename = "objectId", default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<EntityId>,
}

impl RoleAssignment {
    pub fn diner() -> Self {
        Self { role: RoleKind::Diner, scope_id: None }
    }

    pub fn franchise_owner(franchise_id: EntityId) -> Self {
        Self { role: RoleKind::FranchiseOwner, scope_id: Some(franchise_id) }
    }

    pub fn administrator() -> Self {
        Self { role: RoleKind::Administrator, scope_id: None }
    }
}

/// A simulated user account
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: EntityId,
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub roles: Vec<RoleAssignment>,
}

impl Identity {
    pub fn has_role(&self, role: RoleKind) -> bool {
        self.roles.iter().any(|r| r.role == role)
    }

    /// Franchise ids this identity owns, in role order
    pub fn owned_franchise_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.roles
            .iter()
            .filter(|r| r.role == RoleKind::FranchiseOwner)
            .filter_map(|r| r.scope_id)
    }

    /// The fields the backend exposes about a user. Never carries the password.
    pub fn public(&self) -> PublicIdentity {
        PublicIdentity {
            id: self.id,
            name: self.display_name.clone(),
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Wire form of an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicIdentity {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub roles: Vec<RoleAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: EntityId,
    pub title: String,
    #[serde(rename = "image")]
    pub image_ref: String,
    pub price: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseAdmin {
    pub id: EntityId,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: EntityId,
    pub name: String,
    pub total_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Franchise {
    pub id: EntityId,
    pub name: String,
    pub admins: Vec<FranchiseAdmin>,
    pub stores: Vec<Store>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: EntityId,
    pub menu_id: EntityId,
    pub description: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: EntityId,
    pub franchise_id: EntityId,
    pub store_id: EntityId,
    pub date: String,
    pub items: Vec<OrderItem>,
}

/// One entry of the API description document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDoc {
    pub method: String,
    pub path: String,
    pub description: String,
    pub requires_auth: bool,
}
