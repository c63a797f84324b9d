use crate::database::{DuplicatePage, ListOrder, PageQuery, PageRepository};
use crate::domain::Page;
use crate::features::pages::model::DbPage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Pool, QueryBuilder, Sqlite};

const PAGE_COLUMNS: &str = r#"id, name, group_id, lang, title, content, page_type, "order",
    private, publish_date, user_id, created, modified, extras"#;

pub struct SqliteRepository {
    pool: Pool<Sqlite>,
}

impl SqliteRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    fn select() -> QueryBuilder<'static, Sqlite> {
        QueryBuilder::new(format!("SELECT {} FROM pages WHERE ", PAGE_COLUMNS))
    }
}

// `group_id = NULL` never matches in SQL, site pages need IS NULL
fn push_scope(builder: &mut QueryBuilder<'_, Sqlite>, group_id: Option<&str>) {
    match group_id {
        Some(id) => {
            builder.push("group_id = ").push_bind(id.to_string());
        }
        None => {
            builder.push("group_id IS NULL");
        }
    }
}

#[async_trait]
impl PageRepository for SqliteRepository {
    async fn get_page(
        &self,
        group_id: Option<&str>,
        name: &str,
        lang: Option<&str>,
    ) -> Result<Option<Page>> {
        let mut builder = Self::select();
        push_scope(&mut builder, group_id);
        builder.push(" AND name = ").push_bind(name.to_string());
        if let Some(lang) = lang {
            builder.push(" AND lang = ").push_bind(lang.to_string());
        }
        builder.push(" ORDER BY created ASC LIMIT 1");

        let db_page_opt = builder
            .build_query_as::<DbPage>()
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to load page {}", name))?;

        // translate to pure Page model
        match db_page_opt {
            Some(db_page) => Ok(Some(db_page.try_into()?)),
            None => Ok(None),
        }
    }

    async fn page_name_exists(&self, group_id: Option<&str>, name: &str) -> Result<bool> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM pages WHERE ");
        push_scope(&mut builder, group_id);
        builder.push(" AND name = ").push_bind(name.to_string());

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to look up page name {}", name))?;

        Ok(count > 0)
    }

    async fn list_pages(&self, query: &PageQuery) -> Result<Vec<Page>> {
        let mut builder = Self::select();
        push_scope(&mut builder, query.group_id.as_deref());

        if let Some(page_type) = &query.page_type {
            builder.push(" AND page_type = ").push_bind(page_type.clone());
        }
        if let Some(private) = query.private {
            builder.push(" AND private = ").push_bind(private);
        }

        match query.order {
            ListOrder::Order => {
                builder.push(r#" AND "order" IS NOT NULL AND "order" != '' ORDER BY "order" ASC"#);
            }
            ListOrder::PublishDate => {
                builder.push(" AND publish_date IS NOT NULL ORDER BY publish_date DESC");
            }
            ListOrder::Created => {
                builder.push(" ORDER BY created DESC");
            }
        }

        let db_pages = builder
            .build_query_as::<DbPage>()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list pages")?;

        let mut pages: Vec<Page> = Vec::with_capacity(db_pages.len());
        for db_page in db_pages {
            pages.push(db_page.try_into()?);
        }

        Ok(pages)
    }

    async fn save_page(&self, page: &Page) -> Result<()> {
        // translate the pure Page down into a DbPage for SQLite
        let db_page: DbPage = page.into();

        // upsert on id; `created` is only written by the insert
        let result = sqlx::query(
            r#"
            INSERT INTO pages (
                id, name, group_id, lang, title, content, page_type, "order",
                private, publish_date, user_id, created, modified, extras
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                group_id = excluded.group_id,
                lang = excluded.lang,
                title = excluded.title,
                content = excluded.content,
                page_type = excluded.page_type,
                "order" = excluded."order",
                private = excluded.private,
                publish_date = excluded.publish_date,
                user_id = excluded.user_id,
                modified = excluded.modified,
                extras = excluded.extras
            "#,
        )
        .bind(&db_page.id)
        .bind(&db_page.name)
        .bind(&db_page.group_id)
        .bind(&db_page.lang)
        .bind(&db_page.title)
        .bind(&db_page.content)
        .bind(&db_page.page_type)
        .bind(&db_page.order)
        .bind(db_page.private)
        .bind(db_page.publish_date)
        .bind(&db_page.user_id)
        .bind(db_page.created)
        .bind(db_page.modified)
        .bind(&db_page.extras)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(anyhow::Error::new(DuplicatePage {
                    name: page.name.clone(),
                    lang: page.lang.clone(),
                }))
            }
            Err(e) => Err(e).context(format!("Failed to save page {}", db_page)),
        }
    }

    async fn delete_page(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context(format!("Failed to delete page {}", id))?;

        Ok(())
    }
}
