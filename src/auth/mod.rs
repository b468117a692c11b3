//! Authentication and authorization module
//!
//! Identity comes from an external provider as a signed JWT. This module
//! turns the token into the workflow `Actor` and maps roles to review
//! capabilities.

mod jwt;
mod middleware;

pub use jwt::{create_token, decode_token, Claims};
pub use middleware::auth_middleware;

use crate::workflow::CapabilitySet;
use serde::{Deserialize, Serialize};

/// User roles for authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Read-only access
    Viewer,
    /// Can author and submit entities
    Editor,
    /// Can author and perform peer review
    PeerReviewer,
    /// Can author and give final approval
    Approver,
    /// Everything
    Admin,
}

impl Role {
    pub fn capabilities(&self) -> CapabilitySet {
        match self {
            Role::Viewer => CapabilitySet::default(),
            Role::Editor => CapabilitySet {
                author: true,
                ..Default::default()
            },
            Role::PeerReviewer => CapabilitySet {
                author: true,
                peer_review: true,
                final_approval: false,
            },
            Role::Approver => CapabilitySet {
                author: true,
                peer_review: false,
                final_approval: true,
            },
            Role::Admin => CapabilitySet::all(),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Viewer
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Viewer => write!(f, "viewer"),
            Role::Editor => write!(f, "editor"),
            Role::PeerReviewer => write!(f, "peerReviewer"),
            Role::Approver => write!(f, "approver"),
            Role::Admin => write!(f, "admin"),
        }
    }
}
