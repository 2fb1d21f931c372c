//! PostgREST query-string encoding.

use serde_json::Value;

use crate::types::{Filter, SelectQuery};

/// Text form of a filter value (`eq.<literal>`).
fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// `(column, operator.value)` pair for one filter.
pub(crate) fn filter_param(filter: &Filter) -> (String, String) {
    match filter {
        Filter::Eq { column, value } => (column.clone(), format!("eq.{}", literal(value))),
        Filter::IsNull { column } => (column.clone(), "is.null".to_string()),
    }
}

/// Parameters for a select: every column, filters, order and limit.
pub(crate) fn select_params(query: &SelectQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(query.filters.iter().map(filter_param));
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{direction}", order.column)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

/// Parameters for a write that returns the touched rows.
pub(crate) fn write_params(filters: &[Filter]) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(filters.iter().map(filter_param));
    params
}

pub(crate) fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Human-readable target for error messages, e.g. `contas_bancarias id=7`.
pub(crate) fn describe_target(table: &str, filters: &[Filter]) -> String {
    if filters.is_empty() {
        return table.to_string();
    }
    let parts = filters
        .iter()
        .map(|f| match f {
            Filter::Eq { column, value } => format!("{column}={}", literal(value)),
            Filter::IsNull { column } => format!("{column}=null"),
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{table} {parts}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Order;

    #[test]
    fn owner_scoped_list_query() {
        let query = SelectQuery::new()
            .filter(Filter::eq("codigo_empresa", "6f1c-22"))
            .order(Order::desc("created_at"));
        assert_eq!(
            encode_query(&select_params(&query)),
            "select=%2A&codigo_empresa=eq.6f1c-22&order=created_at.desc"
        );
    }

    #[test]
    fn numeric_and_null_filters() {
        let params = write_params(&[Filter::eq("id", 7), Filter::is_null("updated_at")]);
        assert_eq!(
            encode_query(&params),
            "select=%2A&id=eq.7&updated_at=is.null"
        );
    }

    #[test]
    fn timestamp_values_are_escaped() {
        let params = write_params(&[Filter::eq("updated_at", "2024-05-01T12:00:00.000001+00:00")]);
        assert_eq!(
            encode_query(&params),
            "select=%2A&updated_at=eq.2024-05-01T12%3A00%3A00.000001%2B00%3A00"
        );
    }

    #[test]
    fn limit_is_appended() {
        let query = SelectQuery::new().filter(Filter::eq("id", 1)).limit(1);
        assert_eq!(
            encode_query(&select_params(&query)),
            "select=%2A&id=eq.1&limit=1"
        );
    }

    #[test]
    fn describe_target_lists_filters() {
        assert_eq!(
            describe_target("contas_bancarias", &[Filter::eq("id", 7)]),
            "contas_bancarias id=7"
        );
        assert_eq!(describe_target("contas_bancarias", &[]), "contas_bancarias");
    }
}
