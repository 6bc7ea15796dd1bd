//! Row codec for token transfers
//!
//! Owns the fixed, ordered column catalog and the two-way mapping between a
//! TokenTransfer and a database row. INSERT, SELECT, and filter-field
//! validation all derive from this single catalog, so a schema change cannot
//! drift between them. Decoding is strict: a row whose shape or types do not
//! match the catalog fails with a Decode error naming the column.

#![allow(clippy::result_large_err)]

use crate::errors::{decode_error, Result};
use rusqlite::types::{FromSql, Value};
use rusqlite::Row;
use std::str::FromStr;
use tokenline_core::model::{TokenAmount, TokenTransfer, TransactionRef, TransferType};
use uuid::Uuid;

/// Table holding token transfer rows
pub(crate) const TABLE: &str = "token_transfers";

/// Fixed column order shared by the encoder, the decoder, and the filter
/// translator
pub(crate) const COLUMNS: [&str; 17] = [
    "local_id",
    "transfer_type",
    "pool_id",
    "token_index",
    "uri",
    "connector",
    "namespace",
    "from_addr",
    "to_addr",
    "protocol_id",
    "message_id",
    "message_hash",
    "tx_type",
    "tx_id",
    "blockchain_event",
    "amount",
    "created",
];

/// Comma-separated column list for SELECT/INSERT statements
pub(crate) fn column_list() -> String {
    COLUMNS.join(", ")
}

/// Positional placeholder list (`?1, ?2, ...`) matching the column order
pub(crate) fn insert_placeholders() -> String {
    (1..=COLUMNS.len())
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Storage type of a filterable logical field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldType {
    /// Plain text comparison
    Text,
    /// UUID stored as its canonical text form
    Uuid,
    /// Epoch milliseconds; accepts integers or RFC 3339 strings
    Timestamp,
    /// Canonical decimal amount string
    Amount,
}

/// Resolve a logical filter field name to its column and storage type
///
/// The namespace is deliberately absent: it is injected by the translator
/// from the caller argument and can never be addressed from a filter.
pub(crate) fn lookup_field(name: &str) -> Option<(&'static str, FieldType)> {
    let mapping = match name {
        "localid" => ("local_id", FieldType::Uuid),
        "type" => ("transfer_type", FieldType::Text),
        "pool" => ("pool_id", FieldType::Uuid),
        "tokenindex" => ("token_index", FieldType::Text),
        "uri" => ("uri", FieldType::Text),
        "connector" => ("connector", FieldType::Text),
        "from" => ("from_addr", FieldType::Text),
        "to" => ("to_addr", FieldType::Text),
        "protocolid" => ("protocol_id", FieldType::Text),
        "message" => ("message_id", FieldType::Uuid),
        "messagehash" => ("message_hash", FieldType::Text),
        "tx.type" => ("tx_type", FieldType::Text),
        "tx.id" => ("tx_id", FieldType::Uuid),
        "blockchainevent" => ("blockchain_event", FieldType::Uuid),
        "amount" => ("amount", FieldType::Amount),
        "created" => ("created", FieldType::Timestamp),
        _ => return None,
    };
    Some(mapping)
}

/// Encode a transfer into the ordered parameter list for INSERT
///
/// `created` is passed separately: the store assigns the server timestamp and
/// only writes it back to the in-memory transfer once the insert has
/// committed.
pub(crate) fn encode_row(transfer: &TokenTransfer, created_ms: i64) -> Vec<Value> {
    fn opt_text(value: &Option<String>) -> Value {
        value
            .as_ref()
            .map(|s| Value::Text(s.clone()))
            .unwrap_or(Value::Null)
    }
    fn opt_uuid(value: &Option<Uuid>) -> Value {
        value
            .map(|u| Value::Text(u.to_string()))
            .unwrap_or(Value::Null)
    }

    vec![
        Value::Text(transfer.local_id.to_string()),
        Value::Text(transfer.transfer_type.to_string()),
        Value::Text(transfer.pool_id.to_string()),
        opt_text(&transfer.token_index),
        opt_text(&transfer.uri),
        Value::Text(transfer.connector.clone()),
        Value::Text(transfer.namespace.clone()),
        opt_text(&transfer.from),
        opt_text(&transfer.to),
        Value::Text(transfer.protocol_id.clone()),
        opt_uuid(&transfer.message),
        opt_text(&transfer.message_hash),
        opt_text(&transfer.tx.tx_type),
        opt_uuid(&transfer.tx.id),
        opt_uuid(&transfer.blockchain_event),
        Value::Text(transfer.amount.as_str().to_string()),
        Value::Integer(created_ms),
    ]
}

/// Decode a row selected with the catalog column order into a TokenTransfer
pub(crate) fn decode_row(row: &Row<'_>) -> Result<TokenTransfer> {
    let local_id = parse_uuid(get(row, 0)?, COLUMNS[0])?;

    let type_raw: String = get(row, 1)?;
    let transfer_type = TransferType::from_str(&type_raw)
        .map_err(|e| decode_error(COLUMNS[1], e.to_string()))?;

    let pool_id = parse_uuid(get(row, 2)?, COLUMNS[2])?;
    let token_index: Option<String> = get(row, 3)?;
    let uri: Option<String> = get(row, 4)?;
    let connector: String = get(row, 5)?;
    let namespace: String = get(row, 6)?;
    let from: Option<String> = get(row, 7)?;
    let to: Option<String> = get(row, 8)?;
    let protocol_id: String = get(row, 9)?;
    let message = parse_opt_uuid(get(row, 10)?, COLUMNS[10])?;
    let message_hash: Option<String> = get(row, 11)?;
    let tx_type: Option<String> = get(row, 12)?;
    let tx_id = parse_opt_uuid(get(row, 13)?, COLUMNS[13])?;
    let blockchain_event = parse_opt_uuid(get(row, 14)?, COLUMNS[14])?;

    let amount_raw: String = get(row, 15)?;
    let amount = TokenAmount::from_str(&amount_raw)
        .map_err(|e| decode_error(COLUMNS[15], e.to_string()))?;

    let created_ms: i64 = get(row, 16)?;
    let created = chrono::DateTime::from_timestamp_millis(created_ms)
        .ok_or_else(|| decode_error(COLUMNS[16], "timestamp out of range"))?;

    Ok(TokenTransfer {
        local_id,
        transfer_type,
        pool_id,
        token_index,
        uri,
        connector,
        namespace,
        from,
        to,
        protocol_id,
        message,
        message_hash,
        tx: TransactionRef { tx_type, id: tx_id },
        blockchain_event,
        amount,
        created: Some(created),
    })
}

/// Read one column, classifying shape/type failures as Decode errors
fn get<T: FromSql>(row: &Row<'_>, idx: usize) -> Result<T> {
    row.get(idx).map_err(|e| decode_error(COLUMNS[idx], e.to_string()))
}

fn parse_uuid(raw: String, column: &str) -> Result<Uuid> {
    Uuid::parse_str(&raw).map_err(|e| decode_error(column, format!("not a valid UUID: {}", e)))
}

fn parse_opt_uuid(raw: Option<String>, column: &str) -> Result<Option<Uuid>> {
    raw.map(|s| parse_uuid(s, column)).transpose()
}
