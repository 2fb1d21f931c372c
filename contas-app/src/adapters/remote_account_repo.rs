//! `AccountRepository` implementation over the hosted data service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use contas_backend::{format_timestamp, BackendError, DataClient, Filter, Order, Row, SelectQuery};
use contas_core::error::{CoreError, CoreResult, DecodeError, WriteOperation};
use contas_core::traits::AccountRepository;
use contas_core::types::{BankAccount, BankAccountPatch, NewBankAccount, Precondition};
use contas_core::utils::datetime::parse_timestamp;

/// Backing table.
pub const TABLE: &str = "contas_bancarias";

/// Column names of [`TABLE`].
pub mod columns {
    pub const ID: &str = "id";
    pub const ACCOUNT_BANK_CODE: &str = "codigo_conta_banco";
    pub const OWNER_ID: &str = "codigo_empresa";
    pub const BANK_CODE: &str = "codigo_banco";
    pub const BRANCH_CODE: &str = "codigo_agencia";
    pub const DESCRIPTION: &str = "descricao";
    pub const ACCOUNT_NUMBER: &str = "numero_conta";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
}

use columns as col;

/// Bank accounts stored in the hosted backend.
pub struct RemoteAccountRepository {
    client: Arc<dyn DataClient>,
}

impl RemoteAccountRepository {
    pub fn new(client: Arc<dyn DataClient>) -> Self {
        Self { client }
    }
}

// ===== Row decoding =====

fn present<'a>(row: &'a Row, column: &str) -> Option<&'a Value> {
    row.get(column).filter(|v| !v.is_null())
}

fn required_i64(row: &Row, column: &str) -> Result<i64, DecodeError> {
    match present(row, column) {
        None => Err(DecodeError::new(column, "missing")),
        Some(value) => value
            .as_i64()
            .ok_or_else(|| DecodeError::new(column, format!("expected an integer, got {value}"))),
    }
}

fn optional_i64(row: &Row, column: &str) -> Result<Option<i64>, DecodeError> {
    present(row, column)
        .map(|value| {
            value
                .as_i64()
                .ok_or_else(|| DecodeError::new(column, format!("expected an integer, got {value}")))
        })
        .transpose()
}

fn required_string(row: &Row, column: &str) -> Result<String, DecodeError> {
    match present(row, column) {
        None => Err(DecodeError::new(column, "missing")),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(DecodeError::new(
            column,
            format!("expected a string, got {other}"),
        )),
    }
}

fn optional_timestamp(row: &Row, column: &str) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match present(row, column) {
        None => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| DecodeError::new(column, format!("invalid timestamp {s:?}"))),
        Some(other) => Err(DecodeError::new(
            column,
            format!("expected a timestamp, got {other}"),
        )),
    }
}

/// Typed view of a backend row.
pub fn decode_row(row: &Row) -> Result<BankAccount, DecodeError> {
    Ok(BankAccount {
        id: optional_i64(row, col::ID)?,
        account_bank_code: required_i64(row, col::ACCOUNT_BANK_CODE)?,
        owner_id: required_string(row, col::OWNER_ID)?,
        bank_code: required_i64(row, col::BANK_CODE)?,
        branch_code: required_i64(row, col::BRANCH_CODE)?,
        description: required_string(row, col::DESCRIPTION)?,
        account_number: required_string(row, col::ACCOUNT_NUMBER)?,
        created_at: optional_timestamp(row, col::CREATED_AT)?,
        updated_at: optional_timestamp(row, col::UPDATED_AT)?,
    })
}

fn decode_logged(row: &Row) -> CoreResult<BankAccount> {
    decode_row(row).map_err(|e| {
        log::error!("Rejected malformed {TABLE} row: {e}");
        CoreError::Decode(e)
    })
}

// ===== Row encoding =====

fn encode_new(account: &NewBankAccount) -> Row {
    let mut row = Row::new();
    row.insert(col::ACCOUNT_BANK_CODE.into(), account.account_bank_code.into());
    row.insert(col::OWNER_ID.into(), account.owner_id.clone().into());
    row.insert(col::BANK_CODE.into(), account.bank_code.into());
    row.insert(col::BRANCH_CODE.into(), account.branch_code.into());
    row.insert(col::DESCRIPTION.into(), account.description.clone().into());
    row.insert(col::ACCOUNT_NUMBER.into(), account.account_number.clone().into());
    row
}

fn encode_patch(patch: &BankAccountPatch, now: DateTime<Utc>) -> Row {
    let mut row = Row::new();
    if let Some(v) = patch.account_bank_code {
        row.insert(col::ACCOUNT_BANK_CODE.into(), v.into());
    }
    if let Some(v) = patch.bank_code {
        row.insert(col::BANK_CODE.into(), v.into());
    }
    if let Some(v) = patch.branch_code {
        row.insert(col::BRANCH_CODE.into(), v.into());
    }
    if let Some(v) = &patch.description {
        row.insert(col::DESCRIPTION.into(), v.clone().into());
    }
    if let Some(v) = &patch.account_number {
        row.insert(col::ACCOUNT_NUMBER.into(), v.clone().into());
    }
    row.insert(col::UPDATED_AT.into(), format_timestamp(&now).into());
    row
}

fn precondition_filter(precondition: Precondition) -> Option<Filter> {
    match precondition {
        Precondition::None => None,
        Precondition::UpdatedAt(Some(at)) => Some(Filter::eq(col::UPDATED_AT, format_timestamp(&at))),
        Precondition::UpdatedAt(None) => Some(Filter::is_null(col::UPDATED_AT)),
    }
}

fn row_resource(id: i64) -> String {
    format!("{TABLE} id={id}")
}

fn write_error(operation: WriteOperation, source: BackendError) -> CoreError {
    let err = CoreError::write(operation, source);
    if err.is_expected() {
        log::warn!("{err}");
    } else {
        log::error!("{err}");
    }
    err
}

#[async_trait]
impl AccountRepository for RemoteAccountRepository {
    async fn create(&self, account: NewBankAccount) -> CoreResult<BankAccount> {
        let stored = self
            .client
            .insert_row(TABLE, encode_new(&account))
            .await
            .map_err(|e| write_error(WriteOperation::Create, e))?;

        let created = decode_logged(&stored)?;
        log::info!(
            "Created account {:?} for owner {}",
            created.id,
            created.owner_id
        );
        Ok(created)
    }

    async fn list(&self, owner_id: &str) -> CoreResult<Vec<BankAccount>> {
        let query = SelectQuery::new()
            .filter(Filter::eq(col::OWNER_ID, owner_id))
            .order(Order::desc(col::CREATED_AT));

        let rows = self.client.select_rows(TABLE, &query).await.map_err(|e| {
            let err = CoreError::RemoteRead(e);
            log::warn!("Listing accounts for {owner_id} failed: {err}");
            err
        })?;

        rows.iter().map(decode_logged).collect()
    }

    async fn find_by_id(&self, id: i64) -> CoreResult<Option<BankAccount>> {
        let query = SelectQuery::new().filter(Filter::eq(col::ID, id)).limit(1);
        let rows = self
            .client
            .select_rows(TABLE, &query)
            .await
            .map_err(CoreError::RemoteRead)?;

        rows.first().map(decode_logged).transpose()
    }

    async fn update(&self, id: i64, patch: BankAccountPatch) -> CoreResult<BankAccount> {
        let mut filters = vec![Filter::eq(col::ID, id)];
        let guard = precondition_filter(patch.precondition);
        filters.extend(guard.clone());

        let rows = self
            .client
            .update_rows(TABLE, &filters, encode_patch(&patch, Utc::now()))
            .await
            .map_err(|e| write_error(WriteOperation::Update, e))?;

        if let Some(row) = rows.first() {
            let updated = decode_logged(row)?;
            log::info!("Updated account {id}");
            return Ok(updated);
        }

        // Nothing matched: either the row is gone or the guard failed.
        let source = if guard.is_some() {
            match self.find_by_id(id).await {
                Ok(Some(_)) => BackendError::Conflict {
                    resource: row_resource(id),
                    raw_message: Some("the account was changed since it was loaded".to_string()),
                },
                Ok(None) => BackendError::NotFound {
                    resource: row_resource(id),
                    raw_message: None,
                },
                Err(e) => match e.backend_error() {
                    Some(source) => source.clone(),
                    None => return Err(e),
                },
            }
        } else {
            BackendError::NotFound {
                resource: row_resource(id),
                raw_message: None,
            }
        };
        Err(write_error(WriteOperation::Update, source))
    }

    async fn delete(&self, id: i64) -> CoreResult<()> {
        let deleted = self
            .client
            .delete_rows(TABLE, &[Filter::eq(col::ID, id)])
            .await
            .map_err(|e| write_error(WriteOperation::Delete, e))?;

        if deleted.is_empty() {
            return Err(write_error(
                WriteOperation::Delete,
                BackendError::NotFound {
                    resource: row_resource(id),
                    raw_message: None,
                },
            ));
        }
        log::info!("Deleted account {id}");
        Ok(())
    }
}
