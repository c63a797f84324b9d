use crate::auth::{Authorizer, READ_PERMISSION};
use crate::domain::scope::parse_operation_name;
use crate::domain::{Action, Actor, Capability, ScopeKind};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Membership {
    pub group: String,
    pub user: String,
    pub capacity: String,
}

impl FromStr for Membership {
    type Err = anyhow::Error;

    // "group:user:capacity"
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(group), Some(user), Some(capacity))
                if !group.is_empty() && !user.is_empty() && !capacity.is_empty() =>
            {
                Ok(Membership {
                    group: group.to_string(),
                    user: user.to_string(),
                    capacity: capacity.to_lowercase(),
                })
            }
            _ => Err(anyhow!("Invalid membership '{}', expected group:user:capacity", s)),
        }
    }
}

/// Authorizer backed by a fixed list of sysadmins and group memberships.
///
/// Anyone may show and list pages. Site pages and uploads are managed by
/// sysadmins; organization and group pages also by that group's admins and
/// editors. Every group id resolves to itself.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizer {
    sysadmins: HashSet<String>,
    memberships: Vec<Membership>,
}

impl StaticAuthorizer {
    pub fn new(sysadmins: impl IntoIterator<Item = String>, memberships: Vec<Membership>) -> Self {
        Self {
            sysadmins: sysadmins.into_iter().collect(),
            memberships,
        }
    }

    fn is_sysadmin(&self, actor: Option<&Actor>) -> bool {
        actor.is_some_and(|a| self.sysadmins.contains(&a.name))
    }

    fn capacity_in(&self, group_id: &str, actor: Option<&Actor>) -> Option<&str> {
        let actor = actor?;
        self.memberships
            .iter()
            .find(|m| m.group == group_id && (m.user == actor.name || m.user == actor.id))
            .map(|m| m.capacity.as_str())
    }

    fn can_manage(&self, group_id: &str, actor: Option<&Actor>) -> bool {
        matches!(self.capacity_in(group_id, actor), Some("admin") | Some("editor"))
    }
}

#[async_trait]
impl Authorizer for StaticAuthorizer {
    async fn check_access(
        &self,
        capability: &Capability,
        actor: Option<&Actor>,
        group_id: Option<&str>,
    ) -> Result<bool> {
        if self.is_sysadmin(actor) {
            return Ok(true);
        }

        let operation = capability
            .as_str()
            .strip_prefix("ckanext_")
            .and_then(parse_operation_name);

        let allowed = match operation {
            Some((_, Action::Show)) | Some((_, Action::List)) => true,
            Some((ScopeKind::Site, _)) => false,
            Some((_, Action::Update)) | Some((_, Action::Delete)) => {
                group_id.is_some_and(|group_id| self.can_manage(group_id, actor))
            }
            // uploads and anything unknown
            None => false,
        };

        Ok(allowed)
    }

    async fn resolve_group(&self, id_or_name: &str) -> Result<Option<String>> {
        Ok(Some(id_or_name.to_string()))
    }

    async fn has_group_permission(
        &self,
        group_id: &str,
        actor: Option<&Actor>,
        permission: &str,
    ) -> Result<bool> {
        if self.is_sysadmin(actor) {
            return Ok(true);
        }

        let granted = match permission {
            READ_PERMISSION => self.capacity_in(group_id, actor).is_some(),
            _ => self.can_manage(group_id, actor),
        };

        Ok(granted)
    }
}
