//! Query options for the JSONv2 web service.
//!
//! Each options type maps statically onto `sysparm_*` query parameters
//! through its `Serialize` derive. [`add_options`] turns one into the final
//! relative URL, always appending the `JSONv2` marker.
//!
//! # Filters
//!
//! List operations accept a sequence of [`Filter`] clauses. They are joined
//! in order into a single `sysparm_query` expression:
//!
//! ```text
//! [active=true, priority!=5]  ->  active=true+priority!=5
//! ```

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::NowError;

/// Query parameter that selects the JSONv2 response dialect.
pub const JSONV2_MARKER: &str = "JSONv2";

/// Joiner placed between filter clauses.
const FILTER_JOINER: &str = "+";

/// How reference and choice fields are rendered in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayValue {
    /// Display values instead of raw values.
    True,
    /// Raw database values.
    False,
    /// Both, with display values in `dv_` prefixed fields.
    All,
}

impl FromStr for DisplayValue {
    type Err = NowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(DisplayValue::True),
            "false" => Ok(DisplayValue::False),
            "all" => Ok(DisplayValue::All),
            other => Err(NowError::validation(format!(
                "display value must be true, false or all, got {:?}",
                other
            ))),
        }
    }
}

/// The write operation a POST represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    /// Create a single record.
    #[serde(rename = "insert")]
    Insert,
    /// Create several records from one body.
    #[serde(rename = "insertMultiple")]
    InsertMultiple,
    /// Update the records matching `sysparm_query`.
    #[serde(rename = "update")]
    Update,
    /// Delete the record identified by `sysparm_sys_id`.
    #[serde(rename = "deleteRecord")]
    DeleteRecord,
    /// Delete the records matching `sysparm_query`.
    #[serde(rename = "deleteMultiple")]
    DeleteMultiple,
}

impl Action {
    /// Returns the wire value for `sysparm_action`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Insert => "insert",
            Action::InsertMultiple => "insertMultiple",
            Action::Update => "update",
            Action::DeleteRecord => "deleteRecord",
            Action::DeleteMultiple => "deleteMultiple",
        }
    }
}

/// Operator of a single filter clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `^`, logical AND.
    And,
    /// `^OR`, logical OR.
    Or,
    /// `LIKE`, substring match.
    Like,
    /// `STARTSWITH`
    StartsWith,
    /// `ENDSWITH`
    EndsWith,
}

impl Operator {
    /// Returns the operator as it appears in an encoded query.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::And => "^",
            Operator::Or => "^OR",
            Operator::Like => "LIKE",
            Operator::StartsWith => "STARTSWITH",
            Operator::EndsWith => "ENDSWITH",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `field operator value` clause of a filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Field name.
    pub key: String,
    /// Operator joining field and value.
    pub op: Operator,
    /// Value to compare against.
    pub value: String,
}

impl Filter {
    /// Creates a clause.
    pub fn new(key: impl Into<String>, op: Operator, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            op,
            value: value.into(),
        }
    }

    /// `key=value`
    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Operator::Eq, value)
    }

    /// `key!=value`
    pub fn ne(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Operator::Ne, value)
    }

    /// `key^value`
    pub fn and(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Operator::And, value)
    }

    /// `key^ORvalue`
    pub fn or(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Operator::Or, value)
    }

    /// `keyLIKEvalue`
    pub fn like(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Operator::Like, value)
    }

    /// `keySTARTSWITHvalue`
    pub fn starts_with(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Operator::StartsWith, value)
    }

    /// `keyENDSWITHvalue`
    pub fn ends_with(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, Operator::EndsWith, value)
    }
}

/// Operator tokens, longest first where one is a prefix of another.
const OPERATOR_TOKENS: [(&str, Operator); 7] = [
    ("^OR", Operator::Or),
    ("^", Operator::And),
    ("!=", Operator::Ne),
    ("=", Operator::Eq),
    ("STARTSWITH", Operator::StartsWith),
    ("ENDSWITH", Operator::EndsWith),
    ("LIKE", Operator::Like),
];

/// Parses `key<op>value`, splitting at the first operator token.
impl FromStr for Filter {
    type Err = NowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for (idx, _) in s.char_indices() {
            let rest = &s[idx..];
            let Some((token, op)) = OPERATOR_TOKENS
                .iter()
                .find(|(token, _)| rest.starts_with(token))
            else {
                continue;
            };
            if idx == 0 {
                return Err(NowError::validation(format!(
                    "filter {:?} has no field name",
                    s
                )));
            }
            return Ok(Filter::new(&s[..idx], *op, &rest[token.len()..]));
        }
        Err(NowError::validation(format!(
            "filter {:?} contains no operator",
            s
        )))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.key, self.op, self.value)
    }
}

/// Joins clauses in order with `+`. No reordering, no deduplication.
pub fn filter_expression(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::to_string)
        .collect::<Vec<_>>()
        .join(FILTER_JOINER)
}

/// Parameters the client sets itself; callers cannot reach them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InternalFields {
    #[serde(rename = "sysparm_sys_id", skip_serializing_if = "Option::is_none")]
    pub(crate) sys_id: Option<String>,

    #[serde(rename = "sysparm_action", skip_serializing_if = "Option::is_none")]
    pub(crate) action: Option<Action>,

    #[serde(rename = "sysparm_query", skip_serializing_if = "Option::is_none")]
    pub(crate) query: Option<String>,
}

impl InternalFields {
    pub(crate) fn set_query(&mut self, query: String) {
        self.query = (!query.is_empty()).then_some(query);
    }
}

/// An options value that can be encoded onto a request URL.
pub trait QueryOptions: Serialize {
    /// Mutable access to the client-controlled parameters.
    fn internal_mut(&mut self) -> &mut InternalFields;

    /// Folds derived state into the serializable fields before encoding.
    fn prepare(&mut self) {}
}

/// Options for listing records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListOptions {
    /// Maximum number of records to return.
    #[serde(rename = "sysparm_record_count", skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    /// Display mode of returned values.
    #[serde(rename = "displayvalue", skip_serializing_if = "Option::is_none")]
    pub display_value: Option<DisplayValue>,

    /// Filter clauses, joined in order into `sysparm_query`.
    #[serde(skip)]
    pub filters: Vec<Filter>,

    #[serde(flatten)]
    pub(crate) internal: InternalFields,
}

impl ListOptions {
    /// Creates empty list options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of records to return.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the display mode.
    pub fn with_display_value(mut self, display_value: DisplayValue) -> Self {
        self.display_value = Some(display_value);
        self
    }

    /// Appends a filter clause.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }
}

impl QueryOptions for ListOptions {
    fn internal_mut(&mut self) -> &mut InternalFields {
        &mut self.internal
    }

    fn prepare(&mut self) {
        if !self.filters.is_empty() {
            let expression = filter_expression(&self.filters);
            self.internal.set_query(expression);
        }
    }
}

macro_rules! display_only_options {
    ($( $(#[$doc:meta])* $name:ident ),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
            pub struct $name {
                /// Display mode of returned values.
                #[serde(rename = "displayvalue", skip_serializing_if = "Option::is_none")]
                pub display_value: Option<DisplayValue>,

                #[serde(flatten)]
                pub(crate) internal: InternalFields,
            }

            impl $name {
                /// Creates empty options.
                pub fn new() -> Self {
                    Self::default()
                }

                /// Sets the display mode.
                pub fn with_display_value(mut self, display_value: DisplayValue) -> Self {
                    self.display_value = Some(display_value);
                    self
                }
            }

            impl QueryOptions for $name {
                fn internal_mut(&mut self) -> &mut InternalFields {
                    &mut self.internal
                }
            }
        )*
    };
}

display_only_options! {
    /// Options for fetching a single record by number.
    GetOptions,
    /// Options for creating a record.
    CreateOptions,
    /// Options for updating a record by number.
    UpdateOptions,
    /// Options for deleting a record by sys_id.
    DeleteOptions,
}

/// Encodes `options` as the query string of `path`.
///
/// `None` passes the path through unchanged. Any query already present on
/// `path` is kept verbatim ahead of the encoded options, and the `JSONv2`
/// marker is always appended last.
///
/// # Errors
///
/// Returns `NowError::Encoding` if `path` is not a valid relative URL or the
/// options fail to serialize.
pub fn add_options<O: QueryOptions>(path: &str, options: Option<O>) -> Result<String, NowError> {
    let Some(mut options) = options else {
        return Ok(path.to_string());
    };

    validate_relative(path)?;

    options.prepare();
    let encoded = serde_urlencoded::to_string(&options).map_err(NowError::encoding)?;

    let (base, existing) = match path.split_once('?') {
        Some((base, query)) => (base, query),
        None => (path, ""),
    };

    let marker = format!("{}=", JSONV2_MARKER);
    let query = [existing, encoded.as_str(), marker.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!("{}?{}", base, query))
}

/// Checks that `path` parses as a URL reference.
fn validate_relative(path: &str) -> Result<(), NowError> {
    if path.chars().any(char::is_control) {
        return Err(NowError::encoding(format!(
            "invalid path {:?}: contains control characters",
            path
        )));
    }
    let placeholder = url::Url::parse("http://placeholder.invalid/").map_err(NowError::encoding)?;
    placeholder
        .join(path)
        .map(|_| ())
        .map_err(|e| NowError::encoding(format!("invalid path {:?}: {}", path, e)))
}
