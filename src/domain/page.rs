use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Schema-declared fields without a dedicated column, kept as a JSON blob in the store.
pub type Extras = BTreeMap<String, Value>;

pub const DEFAULT_PAGE_TYPE: &str = "page";
pub const BLOG_PAGE_TYPE: &str = "blog";

/// One localized page row. The scope kind (site/org/group) is not stored, only the scope id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub name: String,
    pub group_id: Option<String>,
    pub lang: String,
    pub title: String,
    pub content: Option<String>,
    pub page_type: String,
    pub order: Option<String>,
    pub private: bool,
    pub publish_date: Option<NaiveDateTime>,
    pub user_id: Option<String>,
    pub created: NaiveDateTime,
    pub modified: Option<NaiveDateTime>,
    pub extras: Extras,
}

impl Page {
    // a fresh, unsaved row for the given scope and name
    pub fn new(group_id: Option<String>, name: String, now: NaiveDateTime) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            group_id,
            lang: String::new(),
            title: String::new(),
            content: None,
            page_type: DEFAULT_PAGE_TYPE.to_string(),
            order: None,
            private: true,
            publish_date: None,
            user_id: None,
            created: now,
            modified: None,
            extras: Extras::new(),
        }
    }

    pub fn is_blog(&self) -> bool {
        self.page_type == BLOG_PAGE_TYPE
    }
}
