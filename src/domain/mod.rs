pub mod page;
pub mod scope;

pub use page::{Extras, Page};
pub use scope::{Action, Capability, Scope, ScopeKind};

/// An authenticated user of the portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Per-request state every operation receives: who is calling, and in which language.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub actor: Option<Actor>,
    pub lang: String,
}

impl RequestContext {
    pub fn new(actor: Option<Actor>, lang: impl Into<String>) -> Self {
        Self {
            actor,
            lang: lang.into(),
        }
    }

    pub fn anonymous(lang: impl Into<String>) -> Self {
        Self::new(None, lang)
    }
}
