//! Wire-level types shared by every backend implementation.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An untyped table row as returned by the data service.
pub type Row = serde_json::Map<String, Value>;

/// Row predicate understood by the data service.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },
    /// `column IS NULL`
    IsNull { column: String },
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self::IsNull {
            column: column.into(),
        }
    }

    /// Column the predicate applies to.
    pub fn column(&self) -> &str {
        match self {
            Self::Eq { column, .. } | Self::IsNull { column } => column,
        }
    }

    /// Evaluate the predicate against a row held in memory.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Self::Eq { column, value } => row.get(column).is_some_and(|v| v == value),
            Self::IsNull { column } => row.get(column).is_none_or(Value::is_null),
        }
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Parameters of a `select` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Compare two column values the way the store orders them.
///
/// Missing and `null` values sort after everything else (so they come last in
/// ascending order and first in descending order).
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            match (x.as_i64(), y.as_i64()) {
                (Some(x), Some(y)) => x.cmp(&y),
                _ => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
            }
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Canonical text form for timestamps sent to or stamped by the store.
///
/// Microsecond precision matches what `timestamptz` keeps, so a value read back
/// from the store formats to the same string.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Identity of a signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Opaque user id (UUID); used as the row-scoping key.
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: AuthUser,
}

impl Session {
    /// Whether the access token has passed its expiry.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn eq_filter_matches_exact_value() {
        let r = row(json!({"codigo_empresa": "u-1", "id": 3}));
        assert!(Filter::eq("codigo_empresa", "u-1").matches(&r));
        assert!(!Filter::eq("codigo_empresa", "u-2").matches(&r));
        assert!(Filter::eq("id", 3).matches(&r));
        assert!(!Filter::eq("missing", 3).matches(&r));
    }

    #[test]
    fn is_null_filter_treats_missing_as_null() {
        let r = row(json!({"updated_at": null}));
        assert!(Filter::is_null("updated_at").matches(&r));
        assert!(Filter::is_null("other").matches(&r));
        let r = row(json!({"updated_at": "2024-01-01T00:00:00Z"}));
        assert!(!Filter::is_null("updated_at").matches(&r));
    }

    #[test]
    fn nulls_sort_last() {
        let one = json!(1);
        assert_eq!(compare_values(Some(&one), None), Ordering::Less);
        assert_eq!(
            compare_values(Some(&Value::Null), Some(&one)),
            Ordering::Greater
        );
    }

    #[test]
    fn timestamps_format_with_micros() {
        let dt = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(format_timestamp(&dt), "2024-05-01T12:00:00.123456Z");
    }

    #[test]
    fn session_expiry() {
        let now = Utc::now();
        let session = Session {
            access_token: "t".into(),
            refresh_token: None,
            expires_at: Some(now - chrono::Duration::seconds(1)),
            user: AuthUser {
                id: "u".into(),
                email: None,
            },
        };
        assert!(session.is_expired(now));
    }
}
