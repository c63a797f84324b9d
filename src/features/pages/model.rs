use crate::domain::{Extras, Page};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use derive_more::Display;
use serde_json::{Map, Value};

#[derive(sqlx::FromRow, Debug, PartialEq, Clone, Display)]
#[display("{}/{}", name, lang)]
pub struct DbPage {
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
    pub extras: Option<String>,
}

impl From<&Page> for DbPage {
    fn from(page: &Page) -> Self {
        // a BTreeMap of JSON values always serializes
        let extras = serde_json::to_string(&page.extras).unwrap_or_else(|_| "{}".to_string());

        DbPage {
            id: page.id.clone(),
            name: page.name.clone(),
            group_id: page.group_id.clone(),
            lang: page.lang.clone(),
            title: page.title.clone(),
            content: page.content.clone(),
            page_type: page.page_type.clone(),
            order: page.order.clone(),
            private: page.private,
            publish_date: page.publish_date,
            user_id: page.user_id.clone(),
            created: page.created,
            modified: page.modified,
            extras: Some(extras),
        }
    }
}

impl TryFrom<DbPage> for Page {
    type Error = anyhow::Error;

    fn try_from(db_page: DbPage) -> Result<Self> {
        let extras: Extras = match db_page.extras.as_deref() {
            None | Some("") => Extras::new(),
            Some(raw) => serde_json::from_str(raw)
                .with_context(|| format!("Malformed extras on page {}", db_page))?,
        };

        Ok(Page {
            id: db_page.id,
            name: db_page.name,
            group_id: db_page.group_id,
            lang: db_page.lang,
            title: db_page.title,
            content: db_page.content,
            page_type: db_page.page_type,
            order: db_page.order,
            private: db_page.private,
            publish_date: db_page.publish_date,
            user_id: db_page.user_id,
            created: db_page.created,
            modified: db_page.modified,
            extras,
        })
    }
}

/// A page as it appears in a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PageListing {
    pub title: String,
    pub content: Option<String>,
    pub name: String,
    pub publish_date: Option<NaiveDateTime>,
    pub lang: String,
    pub group_id: Option<String>,
    pub page_type: String,
    pub image: Option<String>,
    pub extras: Extras,
}

impl PageListing {
    pub fn new(page: Page, image: Option<String>) -> Self {
        PageListing {
            title: page.title,
            content: page.content,
            name: page.name,
            publish_date: page.publish_date,
            lang: page.lang,
            group_id: page.group_id,
            page_type: page.page_type,
            image,
            extras: page.extras,
        }
    }

    /// Flattens into one JSON object. Extras are merged last, so an extras key
    /// that collides with a fixed field replaces it.
    pub fn to_row(&self) -> Map<String, Value> {
        let mut row = Map::new();
        row.insert("title".into(), Value::from(self.title.clone()));
        row.insert("content".into(), Value::from(self.content.clone()));
        row.insert("name".into(), Value::from(self.name.clone()));
        row.insert(
            "publish_date".into(),
            self.publish_date
                .map(|d| Value::from(format_iso(&d)))
                .unwrap_or(Value::Null),
        );
        row.insert("lang".into(), Value::from(self.lang.clone()));
        row.insert("group_id".into(), Value::from(self.group_id.clone()));
        row.insert("page_type".into(), Value::from(self.page_type.clone()));
        if let Some(image) = self.image.as_ref().filter(|i| !i.is_empty()) {
            row.insert("image".into(), Value::from(image.clone()));
        }

        for (key, value) in &self.extras {
            row.insert(key.clone(), value.clone());
        }

        row
    }
}

impl serde::Serialize for PageListing {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_row().serialize(serializer)
    }
}

/// Same shape chrono's serde gives `Page` dates, fractional seconds only when present.
pub fn format_iso(datetime: &NaiveDateTime) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}
