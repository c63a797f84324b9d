use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Visibility/ownership domain of a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum Scope {
    #[display("site")]
    Site,
    #[display("organization {}", _0)]
    Organization(String),
    #[display("group {}", _0)]
    Group(String),
}

impl Scope {
    /// The id stored in the `group_id` column, `None` for site pages.
    pub fn group_id(&self) -> Option<&str> {
        match self {
            Scope::Site => None,
            Scope::Organization(id) | Scope::Group(id) => Some(id),
        }
    }

    pub fn kind(&self) -> ScopeKind {
        match self {
            Scope::Site => ScopeKind::Site,
            Scope::Organization(_) => ScopeKind::Organization,
            Scope::Group(_) => ScopeKind::Group,
        }
    }
}

/// The three operation families exposed at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum ScopeKind {
    #[display("site")]
    Site,
    #[display("organization")]
    Organization,
    #[display("group")]
    Group,
}

impl ScopeKind {
    // builds a scope, `None` when a scoped family was called without an id
    pub fn with_id(self, id: Option<String>) -> Option<Scope> {
        match self {
            ScopeKind::Site => Some(Scope::Site),
            ScopeKind::Organization => id.filter(|id| !id.is_empty()).map(Scope::Organization),
            ScopeKind::Group => id.filter(|id| !id.is_empty()).map(Scope::Group),
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            ScopeKind::Site => "",
            ScopeKind::Organization => "org_",
            ScopeKind::Group => "group_",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Action {
    #[display("show")]
    Show,
    #[display("list")]
    List,
    #[display("update")]
    Update,
    #[display("delete")]
    Delete,
}

/// A named authorization capability, e.g. `ckanext_org_pages_update`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
#[display("{}", _0)]
pub struct Capability(pub String);

impl Capability {
    pub fn for_operation(kind: ScopeKind, action: Action) -> Self {
        Capability(format!("ckanext_{}", operation_name(kind, action)))
    }

    pub fn upload() -> Self {
        Capability("ckanext_pages_upload".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Public operation name for a family and action, e.g. `group_pages_list`.
pub fn operation_name(kind: ScopeKind, action: Action) -> String {
    format!("{}pages_{}", kind.prefix(), action)
}

/// Inverse of [`operation_name`]. `pages_upload` is not a scoped operation and yields `None`.
pub fn parse_operation_name(name: &str) -> Option<(ScopeKind, Action)> {
    let (kind, rest) = if let Some(rest) = name.strip_prefix("org_") {
        (ScopeKind::Organization, rest)
    } else if let Some(rest) = name.strip_prefix("group_") {
        (ScopeKind::Group, rest)
    } else {
        (ScopeKind::Site, name)
    };

    let action = match rest.strip_prefix("pages_")? {
        "show" => Action::Show,
        "list" => Action::List,
        "update" => Action::Update,
        "delete" => Action::Delete,
        _ => return None,
    };

    Some((kind, action))
}
