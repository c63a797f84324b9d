use crate::domain::{Actor, Capability};
use anyhow::Result;
use async_trait::async_trait;

pub mod static_authorizer;

pub use static_authorizer::{Membership, StaticAuthorizer};

/// Group permission needed to see private pages of an organization or group.
pub const READ_PERMISSION: &str = "read";

// the host platform decides who may do what; pages only ask
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Whether `actor` (None = anonymous) holds `capability`, optionally within
    /// the organization or group `group_id`. Called before the request's scope
    /// id has been validated, so `group_id` may be missing for scoped capabilities.
    async fn check_access(
        &self,
        capability: &Capability,
        actor: Option<&Actor>,
        group_id: Option<&str>,
    ) -> Result<bool>;

    /// Canonical id of an organization or group given its id or name.
    async fn resolve_group(&self, id_or_name: &str) -> Result<Option<String>>;

    async fn has_group_permission(
        &self,
        group_id: &str,
        actor: Option<&Actor>,
        permission: &str,
    ) -> Result<bool>;
}
