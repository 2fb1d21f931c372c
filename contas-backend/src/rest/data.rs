//! Table operations over HTTP.

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;

use super::query::{describe_target, encode_query, select_params, write_params};
use super::RestClient;
use crate::error::{BackendError, Result};
use crate::http_client::HttpUtils;
use crate::traits::DataClient;
use crate::types::{Filter, Row, SelectQuery};

/// Ask the service to echo the written rows back.
const PREFER_REPRESENTATION: &str = "return=representation";

fn require_filters(table: &str, filters: &[Filter]) -> Result<()> {
    if filters.is_empty() {
        return Err(BackendError::InvalidRequest {
            raw_code: None,
            raw_message: format!("refusing unfiltered write on {table}"),
        });
    }
    Ok(())
}

#[async_trait]
impl DataClient for RestClient {
    async fn insert_row(&self, table: &str, row: Row) -> Result<Row> {
        let url = format!("{}?select=%2A", self.rest_url(table));
        let body = Value::Array(vec![Value::Object(row)]);

        let request = self
            .data_request(Method::POST, &url)
            .await
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&body);
        let text = HttpUtils::execute_expecting_success(request, "POST", &url, table).await?;

        let mut rows: Vec<Row> = HttpUtils::parse_json(&text)?;
        if rows.len() != 1 {
            return Err(BackendError::Parse {
                detail: format!("insert into {table} returned {} rows", rows.len()),
            });
        }
        Ok(rows.remove(0))
    }

    async fn select_rows(&self, table: &str, query: &SelectQuery) -> Result<Vec<Row>> {
        let url = format!(
            "{}?{}",
            self.rest_url(table),
            encode_query(&select_params(query))
        );

        let request = self.data_request(Method::GET, &url).await;
        let text = HttpUtils::execute_expecting_success(request, "GET", &url, table).await?;
        HttpUtils::parse_json(&text)
    }

    async fn update_rows(
        &self,
        table: &str,
        filters: &[Filter],
        changes: Row,
    ) -> Result<Vec<Row>> {
        require_filters(table, filters)?;
        let url = format!(
            "{}?{}",
            self.rest_url(table),
            encode_query(&write_params(filters))
        );
        let target = describe_target(table, filters);

        let request = self
            .data_request(Method::PATCH, &url)
            .await
            .header("Prefer", PREFER_REPRESENTATION)
            .json(&Value::Object(changes));
        let text = HttpUtils::execute_expecting_success(request, "PATCH", &url, &target).await?;
        HttpUtils::parse_json(&text)
    }

    async fn delete_rows(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>> {
        require_filters(table, filters)?;
        let url = format!(
            "{}?{}",
            self.rest_url(table),
            encode_query(&write_params(filters))
        );
        let target = describe_target(table, filters);

        let request = self
            .data_request(Method::DELETE, &url)
            .await
            .header("Prefer", PREFER_REPRESENTATION);
        let text = HttpUtils::execute_expecting_success(request, "DELETE", &url, &target).await?;
        HttpUtils::parse_json(&text)
    }
}
