use crate::domain::scope::operation_name;
use crate::domain::{Action, Capability, Page, RequestContext, Scope, ScopeKind};
use crate::error::{PageError, PageResult};
use crate::features::pages::model::PageListing;
use crate::features::pages::service::{ListFilters, PagesService};
use crate::features::pages::upload::{UploadParams, UploadResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Identifies one page for show/delete.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageRef {
    #[serde(default, alias = "group_id")]
    pub org_id: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListParams {
    #[serde(default, alias = "group_id")]
    pub org_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub order: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub order_publish_date: bool,
    #[serde(default)]
    pub page_type: Option<String>,
    #[serde(default = "default_private", deserialize_with = "lenient_bool")]
    pub private: bool,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            org_id: None,
            order: false,
            order_publish_date: false,
            page_type: None,
            private: default_private(),
        }
    }
}

fn default_private() -> bool {
    true
}

/// Update payload: the scope id, the page being edited, and the raw page fields.
///
/// `group_id` is a page field here, so only `org_id` selects the scope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateParams {
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Accepts JSON bools, numbers, and the usual truthy strings.
pub(crate) fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(
            s.to_lowercase().as_str(),
            "true" | "yes" | "t" | "y" | "1" | "on"
        ),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    })
}

fn parse_params<T: DeserializeOwned>(payload: Value) -> PageResult<T> {
    let payload = match payload {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(payload).map_err(|e| PageError::validation("payload", e.to_string()))
}

impl PagesService {
    async fn authorize(
        &self,
        ctx: &RequestContext,
        capability: Capability,
        group_id: Option<&str>,
    ) -> PageResult<()> {
        let allowed = self
            .authorizer
            .check_access(&capability, ctx.actor.as_ref(), group_id)
            .await?;
        let target = group_id.unwrap_or("site");

        if !allowed {
            warn!(
                "Denied {} to {} on {}",
                capability,
                ctx.actor.as_ref().map(|a| a.name.as_str()).unwrap_or("anonymous"),
                target
            );
            return Err(PageError::unauthorized());
        }

        debug!("Granted {} on {}", capability, target);
        Ok(())
    }

    // capability first, then the scope id: org/group families need one, site ignores it
    async fn authorize_scope(
        &self,
        ctx: &RequestContext,
        kind: ScopeKind,
        action: Action,
        id: Option<String>,
    ) -> PageResult<Scope> {
        let id = match kind {
            ScopeKind::Site => None,
            _ => id.filter(|id| !id.is_empty()),
        };

        self.authorize(ctx, Capability::for_operation(kind, action), id.as_deref())
            .await?;

        kind.with_id(id)
            .ok_or_else(|| PageError::validation("org_id", "Missing value"))
    }

    pub async fn show_in(
        &self,
        kind: ScopeKind,
        ctx: &RequestContext,
        params: PageRef,
    ) -> PageResult<Option<Page>> {
        let scope = self
            .authorize_scope(ctx, kind, Action::Show, params.org_id)
            .await?;
        self.show(ctx, &scope, params.page.as_deref()).await
    }

    pub async fn list_in(
        &self,
        kind: ScopeKind,
        ctx: &RequestContext,
        params: ListParams,
    ) -> PageResult<Vec<PageListing>> {
        let scope = self
            .authorize_scope(ctx, kind, Action::List, params.org_id)
            .await?;

        let filters = ListFilters {
            order: params.order,
            order_publish_date: params.order_publish_date,
            page_type: params.page_type,
            private: params.private,
        };
        self.list(ctx, &scope, &filters).await
    }

    pub async fn update_in(
        &self,
        kind: ScopeKind,
        ctx: &RequestContext,
        params: UpdateParams,
    ) -> PageResult<Page> {
        let scope = self
            .authorize_scope(ctx, kind, Action::Update, params.org_id)
            .await?;
        self.update(ctx, &scope, params.page.as_deref(), &params.fields)
            .await
    }

    pub async fn delete_in(
        &self,
        kind: ScopeKind,
        ctx: &RequestContext,
        params: PageRef,
    ) -> PageResult<()> {
        let scope = self
            .authorize_scope(ctx, kind, Action::Delete, params.org_id)
            .await?;

        match params.page.as_deref() {
            Some(page) if !page.is_empty() => self.delete(ctx, &scope, page).await,
            _ => Ok(()),
        }
    }

    /// Runs a scoped operation from an untyped payload, returning its JSON result.
    pub async fn run(
        &self,
        kind: ScopeKind,
        action: Action,
        ctx: &RequestContext,
        payload: Value,
    ) -> PageResult<Value> {
        debug!("Running {}", operation_name(kind, action));

        let result = match action {
            Action::Show => to_json(self.show_in(kind, ctx, parse_params(payload)?).await?)?,
            Action::List => to_json(self.list_in(kind, ctx, parse_params(payload)?).await?)?,
            Action::Update => to_json(self.update_in(kind, ctx, parse_params(payload)?).await?)?,
            Action::Delete => {
                self.delete_in(kind, ctx, parse_params(payload)?).await?;
                Value::Null
            }
        };

        Ok(result)
    }

    pub async fn pages_show(&self, ctx: &RequestContext, params: PageRef) -> PageResult<Option<Page>> {
        self.show_in(ScopeKind::Site, ctx, params).await
    }

    pub async fn pages_update(&self, ctx: &RequestContext, params: UpdateParams) -> PageResult<Page> {
        self.update_in(ScopeKind::Site, ctx, params).await
    }

    pub async fn pages_delete(&self, ctx: &RequestContext, params: PageRef) -> PageResult<()> {
        self.delete_in(ScopeKind::Site, ctx, params).await
    }

    pub async fn pages_list(
        &self,
        ctx: &RequestContext,
        params: ListParams,
    ) -> PageResult<Vec<PageListing>> {
        self.list_in(ScopeKind::Site, ctx, params).await
    }

    pub async fn org_pages_show(
        &self,
        ctx: &RequestContext,
        params: PageRef,
    ) -> PageResult<Option<Page>> {
        self.show_in(ScopeKind::Organization, ctx, params).await
    }

    pub async fn org_pages_update(
        &self,
        ctx: &RequestContext,
        params: UpdateParams,
    ) -> PageResult<Page> {
        self.update_in(ScopeKind::Organization, ctx, params).await
    }

    pub async fn org_pages_delete(&self, ctx: &RequestContext, params: PageRef) -> PageResult<()> {
        self.delete_in(ScopeKind::Organization, ctx, params).await
    }

    pub async fn org_pages_list(
        &self,
        ctx: &RequestContext,
        params: ListParams,
    ) -> PageResult<Vec<PageListing>> {
        self.list_in(ScopeKind::Organization, ctx, params).await
    }

    pub async fn group_pages_show(
        &self,
        ctx: &RequestContext,
        params: PageRef,
    ) -> PageResult<Option<Page>> {
        self.show_in(ScopeKind::Group, ctx, params).await
    }

    pub async fn group_pages_update(
        &self,
        ctx: &RequestContext,
        params: UpdateParams,
    ) -> PageResult<Page> {
        self.update_in(ScopeKind::Group, ctx, params).await
    }

    pub async fn group_pages_delete(
        &self,
        ctx: &RequestContext,
        params: PageRef,
    ) -> PageResult<()> {
        self.delete_in(ScopeKind::Group, ctx, params).await
    }

    pub async fn group_pages_list(
        &self,
        ctx: &RequestContext,
        params: ListParams,
    ) -> PageResult<Vec<PageListing>> {
        self.list_in(ScopeKind::Group, ctx, params).await
    }

    pub async fn pages_upload(
        &self,
        ctx: &RequestContext,
        params: UploadParams,
    ) -> PageResult<UploadResult> {
        // uploads are not tied to a page scope
        self.authorize(ctx, Capability::upload(), None).await?;
        self.upload(&params).await
    }

    pub async fn run_upload(&self, ctx: &RequestContext, payload: Value) -> PageResult<Value> {
        to_json(self.pages_upload(ctx, parse_params(payload)?).await?)
    }
}

fn to_json<T: serde::Serialize>(value: T) -> PageResult<Value> {
    serde_json::to_value(value).map_err(|e| PageError::Storage(e.into()))
}
