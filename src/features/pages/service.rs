use crate::auth::{Authorizer, READ_PERMISSION};
use crate::database::{DuplicatePage, ListOrder, PageQuery, PageRepository};
use crate::domain::page::DEFAULT_PAGE_TYPE;
use crate::domain::{Action, Capability, Extras, Page, RequestContext, Scope, ScopeKind};
use crate::error::{PageError, PageResult};
use crate::features::pages::first_image::first_image;
use crate::features::pages::model::PageListing;
use crate::features::pages::schema::{
    DUPLICATE_NAME_MESSAGE, PageSchema, SchemaError, ValidatedInput, ValidationContext,
};
use crate::features::pages::upload::{
    UploadParams, UploadResult, qualified_image_url, stored_filename,
};
use crate::io::ImageStore;
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Listing filters as the caller asked for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilters {
    pub order: bool,
    pub order_publish_date: bool,
    pub page_type: Option<String>,
    /// `false` asks for public pages only; `true` means "do not force-exclude"
    pub private: bool,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            order: false,
            order_publish_date: false,
            page_type: None,
            private: true,
        }
    }
}

/// Page operations over an explicit store, authorizer and image store.
///
/// The methods here are scope-agnostic; the per-family entry points with
/// their authorization checks live in `actions`.
pub struct PagesService {
    pub(crate) repo: Arc<dyn PageRepository>,
    pub(crate) authorizer: Arc<dyn Authorizer>,
    pub(crate) images: Arc<dyn ImageStore>,
    pub(crate) schema: PageSchema,
    pub(crate) site_url: String,
}

impl PagesService {
    pub fn new(
        repo: Arc<dyn PageRepository>,
        authorizer: Arc<dyn Authorizer>,
        images: Arc<dyn ImageStore>,
        site_url: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            authorizer,
            images,
            schema: PageSchema::default(),
            site_url: site_url.into(),
        }
    }

    pub fn with_schema(mut self, schema: PageSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn schema(&self) -> &PageSchema {
        &self.schema
    }

    /// The page for (scope, name, active language). No name given means no page, not an error.
    pub async fn show(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
        page: Option<&str>,
    ) -> PageResult<Option<Page>> {
        let Some(name) = page.filter(|p| !p.is_empty()) else {
            return Ok(None);
        };

        debug!("Showing page {} ({}) in {}", name, ctx.lang, scope);

        match self
            .repo
            .get_page(scope.group_id(), name, Some(&ctx.lang))
            .await?
        {
            Some(found) => Ok(Some(found)),
            None => Err(PageError::not_localized(name)),
        }
    }

    pub async fn list(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
        filters: &ListFilters,
    ) -> PageResult<Vec<PageListing>> {
        let order = if filters.order {
            ListOrder::Order
        } else if filters.order_publish_date {
            ListOrder::PublishDate
        } else {
            ListOrder::Created
        };

        let mut query = PageQuery {
            group_id: None,
            page_type: filters.page_type.clone().filter(|t| !t.is_empty()),
            private: None,
            order,
        };

        match scope {
            Scope::Site => {
                // only site editors may opt in to private pages
                let capability = Capability::for_operation(ScopeKind::Site, Action::Update);
                let can_update = self
                    .authorizer
                    .check_access(&capability, ctx.actor.as_ref(), None)
                    .await?;
                if !can_update || !filters.private {
                    query.private = Some(false);
                }
            }
            Scope::Organization(id) | Scope::Group(id) => {
                let group = self
                    .authorizer
                    .resolve_group(id)
                    .await?
                    .ok_or_else(|| PageError::NotFound("Group not found".to_string()))?;
                let member = self
                    .authorizer
                    .has_group_permission(&group, ctx.actor.as_ref(), READ_PERMISSION)
                    .await?;

                query.group_id = Some(id.clone());
                if !member {
                    query.private = Some(false);
                }
            }
        }

        debug!("Listing pages in {} with {:?}", scope, query);

        let pages = self.repo.list_pages(&query).await?;

        Ok(pages
            .into_iter()
            .map(|page| {
                let image = page.content.as_deref().and_then(first_image);
                PageListing::new(page, image)
            })
            .collect())
    }

    /// Validates `input` and writes it over the (scope, `page`, active language) row,
    /// creating the row if there is none. Every fixed field and the extras are replaced.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        scope: &Scope,
        page: Option<&str>,
        input: &Map<String, Value>,
    ) -> PageResult<Page> {
        let group_id = scope.group_id();
        let current_page = page.filter(|p| !p.is_empty());

        let validation_ctx = ValidationContext {
            repo: self.repo.as_ref(),
            current_page,
            group_id,
            lang: &ctx.lang,
        };

        let data = match self.schema.validate(input, &validation_ctx).await {
            Ok(data) => data,
            Err(SchemaError::Invalid(errors)) => {
                debug!("Rejected page update in {}: {}", scope, errors);
                return Err(PageError::Validation(errors));
            }
            Err(SchemaError::Storage(err)) => return Err(err.into()),
        };

        let now = Utc::now().naive_utc();

        let existing = match current_page {
            Some(name) => self.repo.get_page(group_id, name, Some(&ctx.lang)).await?,
            None => None,
        };
        let is_new = existing.is_none();
        let mut record = existing.unwrap_or_else(|| {
            Page::new(
                group_id.map(str::to_string),
                current_page.unwrap_or_default().to_string(),
                now,
            )
        });

        self.apply_fields(&mut record, &data);
        record.modified = Some(now);
        record.user_id = ctx.actor.as_ref().map(|a| a.id.clone());

        if let Err(err) = self.repo.save_page(&record).await {
            if err.downcast_ref::<DuplicatePage>().is_some() {
                // lost a race with a concurrent create of the same page
                return Err(PageError::validation("name", DUPLICATE_NAME_MESSAGE));
            }
            return Err(err.into());
        }

        info!(
            "{} page {} ({}) in {}",
            if is_new { "Created" } else { "Updated" },
            record.name,
            record.lang,
            scope
        );

        Ok(record)
    }

    fn apply_fields(&self, record: &mut Page, data: &ValidatedInput) {
        record.title = data.text("title").unwrap_or_default();
        record.content = data.text("content");
        record.lang = data.text("lang").unwrap_or_default();
        record.name = data.text("name").unwrap_or_default();
        record.private = data.boolean("private").unwrap_or(true);
        record.order = data.text("order");
        record.page_type = data
            .text("page_type")
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_PAGE_TYPE.to_string());
        record.publish_date = data.date("publish_date");

        let mut extras = Extras::new();
        for key in self.schema.extras_keys() {
            if let Some(value) = data.get(key) {
                extras.insert(key.to_string(), value.clone());
            }
        }
        record.extras = extras;
    }

    /// Deletes the (scope, name, active language) row.
    ///
    /// When that language has no row, the first row for (scope, name) in any
    /// other language is deleted instead.
    pub async fn delete(&self, ctx: &RequestContext, scope: &Scope, page: &str) -> PageResult<()> {
        let group_id = scope.group_id();

        let target = match self.repo.get_page(group_id, page, Some(&ctx.lang)).await? {
            Some(found) => Some(found),
            None => {
                let fallback = self.repo.get_page(group_id, page, None).await?;
                if let Some(other) = &fallback {
                    info!(
                        "No {} variant of page {} in {}, deleting its {} variant",
                        ctx.lang, page, scope, other.lang
                    );
                }
                fallback
            }
        };

        if let Some(found) = target {
            self.repo.delete_page(&found.id).await?;
            info!("Deleted page {} ({}) in {}", found.name, found.lang, scope);
        }

        Ok(())
    }

    pub async fn upload(&self, params: &UploadParams) -> PageResult<UploadResult> {
        if params.clear_upload {
            return Ok(UploadResult { url: None });
        }

        let image = match &params.upload {
            Some(file) => {
                let filename = stored_filename(&file.filename, Utc::now().naive_utc());
                self.images.store(&filename, &file.data).await?;
                info!("Stored page image {}", filename);
                Some(filename)
            }
            None => params.image_url.clone().filter(|url| !url.is_empty()),
        };

        Ok(UploadResult {
            url: image.map(|image| qualified_image_url(&self.site_url, &image)),
        })
    }
}
