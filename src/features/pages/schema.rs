use crate::database::PageRepository;
use crate::domain::page::BLOG_PAGE_TYPE;
use crate::error::ValidationErrors;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};

/// Fields that have their own column on the pages table.
pub const FIXED_COLUMNS: [&str; 8] = [
    "title",
    "content",
    "lang",
    "name",
    "private",
    "order",
    "page_type",
    "publish_date",
];

// declared but neither a column nor an extra
const NON_EXTRAS: [&str; 2] = ["id", "created"];

pub const NAME_MIN_LENGTH: usize = 2;
pub const NAME_MAX_LENGTH: usize = 100;
const RESERVED_NAMES: [&str; 3] = ["new", "edit", "search"];

pub const DUPLICATE_NAME_MESSAGE: &str = "Page name already exists in database for this language";

static NAME_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static regex"));

/// What a rule sees besides the value itself.
pub struct ValidationContext<'a> {
    pub repo: &'a dyn PageRepository,
    /// name of the page being edited, if any
    pub current_page: Option<&'a str>,
    pub group_id: Option<&'a str>,
    /// the caller's active language
    pub lang: &'a str,
}

pub enum Step {
    Continue,
    Replace(Value),
    /// remove the key and end the field's chain
    Drop,
}

#[derive(Debug)]
pub enum RuleError {
    Invalid { message: String, halt: bool },
    Storage(anyhow::Error),
}

impl RuleError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RuleError::Invalid {
            message: message.into(),
            halt: false,
        }
    }

    pub fn halt(message: impl Into<String>) -> Self {
        RuleError::Invalid {
            message: message.into(),
            halt: true,
        }
    }
}

impl From<anyhow::Error> for RuleError {
    fn from(err: anyhow::Error) -> Self {
        RuleError::Storage(err)
    }
}

pub type RuleResult = Result<Step, RuleError>;

/// One link of a field's validation chain.
#[async_trait]
pub trait FieldRule: Send + Sync {
    async fn check(
        &self,
        value: Option<&Value>,
        input: &Map<String, Value>,
        ctx: &ValidationContext<'_>,
    ) -> RuleResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// missing or empty is an error
    Required,
    /// missing or null is dropped
    Optional,
    /// missing, null or "" is dropped
    OmitEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Boolean,
    Date,
}

/// A declared input field: presence rule, type coercion, and extra checks on either side.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    pub presence: Presence,
    pub kind: FieldKind,
    /// run before the presence rule, on the raw value
    pub pre_checks: Vec<Arc<dyn FieldRule>>,
    /// run after coercion
    pub checks: Vec<Arc<dyn FieldRule>>,
}

impl FieldSpec {
    pub fn new(name: &str, presence: Presence, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            presence,
            kind,
            pre_checks: Vec::new(),
            checks: Vec::new(),
        }
    }

    pub fn pre_check(mut self, rule: impl FieldRule + 'static) -> Self {
        self.pre_checks.push(Arc::new(rule));
        self
    }

    pub fn check(mut self, rule: impl FieldRule + 'static) -> Self {
        self.checks.push(Arc::new(rule));
        self
    }

    fn chain(&self) -> Vec<&dyn FieldRule> {
        let presence: &dyn FieldRule = match self.presence {
            Presence::Required => &NotEmpty,
            Presence::Optional => &IgnoreMissing,
            Presence::OmitEmpty => &IgnoreEmpty,
        };
        let kind: &dyn FieldRule = match self.kind {
            FieldKind::Text => &Text,
            FieldKind::Boolean => &Boolean,
            FieldKind::Date => &IsoDate,
        };

        self.pre_checks
            .iter()
            .map(|rule| rule.as_ref())
            .chain([presence, kind])
            .chain(self.checks.iter().map(|rule| rule.as_ref()))
            .collect()
    }
}

/// The declared page fields.
#[derive(Clone)]
pub struct PageSchema {
    fields: Vec<FieldSpec>,
}

impl Default for PageSchema {
    fn default() -> Self {
        use FieldKind::{Boolean as Flag, Date, Text as Str};
        use Presence::{OmitEmpty, Optional, Required};

        Self {
            fields: vec![
                FieldSpec::new("id", OmitEmpty, Str),
                FieldSpec::new("title", Required, Str),
                FieldSpec::new("name", Required, Str)
                    .check(NameToken)
                    .check(UniquePageName),
                FieldSpec::new("content", Optional, Str),
                FieldSpec::new("page_type", Optional, Str),
                FieldSpec::new("lang", Required, Str),
                FieldSpec::new("order", Optional, Str),
                FieldSpec::new("private", Optional, Flag),
                FieldSpec::new("group_id", Optional, Str),
                FieldSpec::new("user_id", Optional, Str),
                FieldSpec::new("created", Optional, Date),
                FieldSpec::new("publish_date", Optional, Date).pre_check(RequiredForBlog),
            ],
        }
    }
}

impl PageSchema {
    /// Declares an additional field, replacing any field of the same name.
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Declared fields that are persisted in the extras blob.
    pub fn extras_keys(&self) -> Vec<&str> {
        self.field_names()
            .filter(|name| !FIXED_COLUMNS.contains(name) && !NON_EXTRAS.contains(name))
            .collect()
    }

    /// Runs every field's chain over `input`. Undeclared keys are ignored.
    pub async fn validate(
        &self,
        input: &Map<String, Value>,
        ctx: &ValidationContext<'_>,
    ) -> Result<ValidatedInput, SchemaError> {
        let mut output = Map::new();
        let mut errors = ValidationErrors::new();

        for field in &self.fields {
            let mut value = input.get(&field.name).cloned();

            for rule in field.chain() {
                match rule.check(value.as_ref(), input, ctx).await {
                    Ok(Step::Continue) => {}
                    Ok(Step::Replace(new_value)) => value = Some(new_value),
                    Ok(Step::Drop) => {
                        value = None;
                        break;
                    }
                    Err(RuleError::Invalid { message, halt }) => {
                        errors.add(&field.name, message);
                        if halt {
                            break;
                        }
                    }
                    Err(RuleError::Storage(err)) => return Err(SchemaError::Storage(err)),
                }
            }

            if let Some(value) = value {
                output.insert(field.name.clone(), value);
            }
        }

        if errors.is_empty() {
            Ok(ValidatedInput(output))
        } else {
            Err(SchemaError::Invalid(errors))
        }
    }
}

#[derive(Debug)]
pub enum SchemaError {
    Invalid(ValidationErrors),
    Storage(anyhow::Error),
}

/// Coerced field values that passed every rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInput(Map<String, Value>);

impl ValidatedInput {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    pub fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn date(&self, key: &str) -> Option<NaiveDateTime> {
        self.0.get(key).and_then(Value::as_str).and_then(parse_iso_date)
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD`, and `YYYY-MM-DD[T ]HH:MM:SS[.f]`.
pub fn parse_iso_date(date_str: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(date_str) {
        return Some(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(date_str, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

pub struct NotEmpty;

#[async_trait]
impl FieldRule for NotEmpty {
    async fn check(&self, value: Option<&Value>, _: &Map<String, Value>, _: &ValidationContext<'_>) -> RuleResult {
        if is_blank(value) {
            return Err(RuleError::halt("Missing value"));
        }
        Ok(Step::Continue)
    }
}

pub struct IgnoreMissing;

#[async_trait]
impl FieldRule for IgnoreMissing {
    async fn check(&self, value: Option<&Value>, _: &Map<String, Value>, _: &ValidationContext<'_>) -> RuleResult {
        match value {
            None | Some(Value::Null) => Ok(Step::Drop),
            Some(_) => Ok(Step::Continue),
        }
    }
}

pub struct IgnoreEmpty;

#[async_trait]
impl FieldRule for IgnoreEmpty {
    async fn check(&self, value: Option<&Value>, _: &Map<String, Value>, _: &ValidationContext<'_>) -> RuleResult {
        if is_blank(value) {
            return Ok(Step::Drop);
        }
        Ok(Step::Continue)
    }
}

pub struct Text;

#[async_trait]
impl FieldRule for Text {
    async fn check(&self, value: Option<&Value>, _: &Map<String, Value>, _: &ValidationContext<'_>) -> RuleResult {
        match value {
            None | Some(Value::String(_)) => Ok(Step::Continue),
            Some(Value::Number(n)) => Ok(Step::Replace(Value::String(n.to_string()))),
            Some(Value::Bool(b)) => Ok(Step::Replace(Value::String(b.to_string()))),
            Some(_) => Err(RuleError::halt("Must be a string")),
        }
    }
}

pub struct Boolean;

#[async_trait]
impl FieldRule for Boolean {
    async fn check(&self, value: Option<&Value>, _: &Map<String, Value>, _: &ValidationContext<'_>) -> RuleResult {
        let flag = match value {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(
                s.to_lowercase().as_str(),
                "true" | "yes" | "t" | "y" | "1" | "on"
            ),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(_) => false,
        };
        Ok(Step::Replace(Value::Bool(flag)))
    }
}

pub struct IsoDate;

#[async_trait]
impl FieldRule for IsoDate {
    async fn check(&self, value: Option<&Value>, _: &Map<String, Value>, _: &ValidationContext<'_>) -> RuleResult {
        match value {
            None | Some(Value::Null) => Ok(Step::Continue),
            Some(Value::String(s)) if s.is_empty() => Ok(Step::Replace(Value::Null)),
            Some(Value::String(s)) => match parse_iso_date(s) {
                Some(dt) => Ok(Step::Replace(Value::String(
                    dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
                ))),
                None => Err(RuleError::halt("Date format incorrect")),
            },
            Some(_) => Err(RuleError::halt("Date format incorrect")),
        }
    }
}

/// Page names: ascii letters, digits, `-` and `_`, 2..=100 long, not a reserved word.
pub struct NameToken;

#[async_trait]
impl FieldRule for NameToken {
    async fn check(&self, value: Option<&Value>, _: &Map<String, Value>, _: &ValidationContext<'_>) -> RuleResult {
        let Some(Value::String(name)) = value else {
            return Ok(Step::Continue);
        };

        if name.chars().count() < NAME_MIN_LENGTH {
            return Err(RuleError::invalid(format!(
                "Must be at least {} characters long",
                NAME_MIN_LENGTH
            )));
        }
        if name.chars().count() > NAME_MAX_LENGTH {
            return Err(RuleError::invalid(format!(
                "Name must be a maximum of {} characters long",
                NAME_MAX_LENGTH
            )));
        }
        if !NAME_TOKEN.is_match(name) {
            return Err(RuleError::invalid(
                "Must be purely alphanumeric (ascii) characters and these symbols: -_",
            ));
        }
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(RuleError::invalid("That name cannot be used"));
        }

        Ok(Step::Continue)
    }
}

/// Rejects a name already used in the scope, in any language, unless the caller
/// is editing that very page in its own language.
///
/// The lookup is by (scope, name) only: creating "about" in `fr` while an `en`
/// "about" exists fails unless the request targets page "about" with `lang`
/// equal to the active language. The row found is not checked for language.
pub struct UniquePageName;

#[async_trait]
impl FieldRule for UniquePageName {
    async fn check(
        &self,
        value: Option<&Value>,
        input: &Map<String, Value>,
        ctx: &ValidationContext<'_>,
    ) -> RuleResult {
        let Some(Value::String(name)) = value else {
            return Ok(Step::Continue);
        };

        let submitted_lang = input.get("lang").and_then(Value::as_str);
        if ctx.current_page == Some(name.as_str()) && submitted_lang == Some(ctx.lang) {
            return Ok(Step::Continue);
        }

        if ctx.repo.page_name_exists(ctx.group_id, name).await? {
            return Err(RuleError::invalid(DUPLICATE_NAME_MESSAGE));
        }

        Ok(Step::Continue)
    }
}

/// `publish_date` becomes mandatory for blog posts.
pub struct RequiredForBlog;

#[async_trait]
impl FieldRule for RequiredForBlog {
    async fn check(
        &self,
        value: Option<&Value>,
        input: &Map<String, Value>,
        _: &ValidationContext<'_>,
    ) -> RuleResult {
        let page_type = input.get("page_type").and_then(Value::as_str);
        if page_type == Some(BLOG_PAGE_TYPE) && is_blank(value) {
            return Err(RuleError::invalid("Publish Date Must be supplied"));
        }
        Ok(Step::Continue)
    }
}
