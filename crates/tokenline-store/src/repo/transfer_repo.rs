//! Token transfer store
//!
//! The five public operations over the token_transfers table. Mutating
//! operations (insert_or_get, delete_all) each run inside exactly one
//! transaction that never outlives the call; reads run as single statements
//! on the plain connection. Change events are emitted strictly after a
//! successful commit, never on a rolled-back path.

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, is_unique_violation, read_error, Result};
use crate::notify::{ChangeEmitter, ChangeEvent, NullEmitter};
use crate::repo::columns::{column_list, decode_row, encode_row, insert_placeholders, TABLE};
use crate::repo::query::build_select;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection};
use std::sync::Arc;
use tokenline_core::filter::FilterQuery;
use tokenline_core::model::TokenTransfer;
use tokenline_core::{LedgerError, LedgerErrorKind};
use tracing::{debug, warn};
use uuid::Uuid;

/// One page of list results, plus the total match count when requested
#[derive(Debug)]
pub struct TransferPage {
    /// Matching rows in query order
    pub transfers: Vec<TokenTransfer>,
    /// Total rows matching the predicate, ignoring pagination; None unless
    /// the filter requested a count
    pub total: Option<i64>,
}

/// Store for token transfer records
///
/// Concurrent duplicate writes are serialized by the database's uniqueness
/// constraint on `(namespace, pool_id, protocol_id)`: exactly one caller
/// observes the insert-success path, every other caller reconciles against
/// the winner's row through the same-transaction read-back.
pub struct TransferStore {
    emitter: Arc<dyn ChangeEmitter>,
}

impl Default for TransferStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferStore {
    /// Create a store that drops change events
    pub fn new() -> Self {
        Self {
            emitter: Arc::new(NullEmitter),
        }
    }

    /// Create a store delivering change events to the given emitter
    pub fn with_emitter(emitter: Arc<dyn ChangeEmitter>) -> Self {
        Self { emitter }
    }

    /// Idempotent create: insert the transfer, or return the row already
    /// holding its `(namespace, pool_id, protocol_id)` key
    ///
    /// On a fresh insert the server-assigned `created` timestamp is written
    /// back onto `transfer` (the golden copy) and `Ok(None)` is returned. If
    /// the insert collides with an existing row, that row is read back inside
    /// the same transaction and returned as `Ok(Some(existing))`; the input
    /// is left untouched. If the read-back finds nothing the transaction is
    /// rolled back and the call fails with an `InsertConflict` error.
    pub fn insert_or_get(
        &self,
        conn: &mut Connection,
        transfer: &mut TokenTransfer,
    ) -> Result<Option<TokenTransfer>> {
        let tx = conn
            .transaction()
            .map_err(|e| from_rusqlite(LedgerErrorKind::Transaction, "insert_or_get", e))?;

        // `created` is stored as epoch millis; truncate the in-memory copy to
        // the same precision so a read-back compares equal.
        let now = Utc::now();
        let created = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);

        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            TABLE,
            column_list(),
            insert_placeholders()
        );
        let insert_result = tx.execute(
            &insert_sql,
            params_from_iter(encode_row(transfer, created.timestamp_millis())),
        );

        let insert_err = match insert_result {
            Ok(_) => {
                tx.commit()
                    .map_err(|e| from_rusqlite(LedgerErrorKind::Commit, "insert_or_get", e))?;
                transfer.created = Some(created);
                debug!(
                    namespace = %transfer.namespace,
                    local_id = %transfer.local_id,
                    protocol_id = %transfer.protocol_id,
                    "Inserted token transfer"
                );
                self.emitter.emit(ChangeEvent::created(
                    &transfer.namespace,
                    transfer.local_id,
                    transfer.pool_id,
                ));
                return Ok(None);
            }
            Err(e) => e,
        };

        if is_unique_violation(&insert_err) {
            debug!(
                namespace = %transfer.namespace,
                protocol_id = %transfer.protocol_id,
                "Insert hit the de-duplication constraint, reconciling"
            );
        } else {
            warn!(
                namespace = %transfer.namespace,
                error = %insert_err,
                "Insert failed, attempting reconciliation read"
            );
        }

        // Read back the existing row on the de-duplication key, inside the
        // same transaction.
        let existing = match fetch_by_protocol_id(
            &tx,
            &transfer.namespace,
            &transfer.pool_id,
            &transfer.protocol_id,
        ) {
            Ok(existing) => existing,
            Err(read_err) => {
                // Dropping the transaction rolls it back
                drop(tx);
                return Err(insert_conflict(
                    &transfer.namespace,
                    format!(
                        "insert failed ({}) and reconciliation read failed ({})",
                        insert_err, read_err
                    ),
                ));
            }
        };

        match existing {
            Some(row) => {
                tx.commit()
                    .map_err(|e| from_rusqlite(LedgerErrorKind::Commit, "insert_or_get", e))?;
                debug!(
                    namespace = %row.namespace,
                    local_id = %row.local_id,
                    protocol_id = %row.protocol_id,
                    "Duplicate delivery reconciled against existing transfer"
                );
                self.emitter
                    .emit(ChangeEvent::updated(&row.namespace, row.local_id, row.pool_id));
                Ok(Some(row))
            }
            None => {
                drop(tx);
                Err(insert_conflict(
                    &transfer.namespace,
                    format!(
                        "insert failed and no existing row found for reconciliation: {}",
                        insert_err
                    ),
                ))
            }
        }
    }

    /// Point lookup by internal local ID, scoped to a namespace
    ///
    /// Absence is `Ok(None)`, never an error.
    pub fn get_by_id(
        &self,
        conn: &Connection,
        namespace: &str,
        local_id: &Uuid,
    ) -> Result<Option<TokenTransfer>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE namespace = ?1 AND local_id = ?2",
            column_list(),
            TABLE
        );
        fetch_one(conn, "get_by_id", &sql, params![namespace, local_id.to_string()])
    }

    /// Point lookup by the external protocol ID, scoped to namespace+pool
    pub fn get_by_protocol_id(
        &self,
        conn: &Connection,
        namespace: &str,
        pool_id: &Uuid,
        protocol_id: &str,
    ) -> Result<Option<TokenTransfer>> {
        fetch_by_protocol_id(conn, namespace, pool_id, protocol_id)
    }

    /// List transfers matching a filter, with an optional total count
    ///
    /// Filter translation failures surface before any database round-trip.
    pub fn list(
        &self,
        conn: &Connection,
        namespace: &str,
        query: &FilterQuery,
    ) -> Result<TransferPage> {
        let bound = build_select(namespace, query)?;

        let mut stmt = conn
            .prepare(&bound.sql)
            .map_err(|e| read_error("list", e))?;
        let mut rows = stmt
            .query(params_from_iter(bound.params.iter()))
            .map_err(|e| read_error("list", e))?;

        let mut transfers = Vec::new();
        while let Some(row) = rows.next().map_err(|e| read_error("list", e))? {
            transfers.push(decode_row(row)?);
        }

        let total = match &bound.count_sql {
            Some(count_sql) => {
                let count: i64 = conn
                    .query_row(count_sql, params_from_iter(bound.params.iter()), |row| {
                        row.get(0)
                    })
                    .map_err(|e| read_error("list", e))?;
                Some(count)
            }
            None => None,
        };

        debug!(
            namespace,
            returned = transfers.len(),
            total = ?total,
            "Listed token transfers"
        );

        Ok(TransferPage { transfers, total })
    }

    /// Delete every transfer in a namespace+pool scope
    pub fn delete_all(
        &self,
        conn: &mut Connection,
        namespace: &str,
        pool_id: &Uuid,
    ) -> Result<()> {
        let tx = conn
            .transaction()
            .map_err(|e| from_rusqlite(LedgerErrorKind::Transaction, "delete_all", e))?;

        let deleted = tx
            .execute(
                &format!(
                    "DELETE FROM {} WHERE namespace = ?1 AND pool_id = ?2",
                    TABLE
                ),
                params![namespace, pool_id.to_string()],
            )
            .map_err(|e| from_rusqlite(LedgerErrorKind::Delete, "delete_all", e))?;

        tx.commit()
            .map_err(|e| from_rusqlite(LedgerErrorKind::Commit, "delete_all", e))?;

        debug!(
            namespace,
            pool_id = %pool_id,
            rows = deleted,
            "Deleted token transfers"
        );
        self.emitter
            .emit(ChangeEvent::deleted_scope(namespace, *pool_id));

        Ok(())
    }
}

/// Shared point lookup on the de-duplication key
///
/// Works on a plain connection and, through deref, inside a transaction.
fn fetch_by_protocol_id(
    conn: &Connection,
    namespace: &str,
    pool_id: &Uuid,
    protocol_id: &str,
) -> Result<Option<TokenTransfer>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE namespace = ?1 AND pool_id = ?2 AND protocol_id = ?3",
        column_list(),
        TABLE
    );
    fetch_one(
        conn,
        "get_by_protocol_id",
        &sql,
        params![namespace, pool_id.to_string(), protocol_id],
    )
}

/// Run a single-row SELECT and decode the row if present
fn fetch_one(
    conn: &Connection,
    op: &str,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Option<TokenTransfer>> {
    let mut stmt = conn.prepare(sql).map_err(|e| read_error(op, e))?;
    let mut rows = stmt.query(params).map_err(|e| read_error(op, e))?;
    match rows.next().map_err(|e| read_error(op, e))? {
        Some(row) => Ok(Some(decode_row(row)?)),
        None => Ok(None),
    }
}

fn insert_conflict(namespace: &str, message: String) -> LedgerError {
    LedgerError::new(LedgerErrorKind::InsertConflict)
        .with_op("insert_or_get")
        .with_namespace(namespace)
        .with_message(message)
}
