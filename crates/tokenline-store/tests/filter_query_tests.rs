// Integration tests for filter-driven listing
// Covers filter correctness, count-with-pagination, namespace scoping, and
// translation failures that must surface before any database round-trip

use rusqlite::Connection;
use serde_json::json;
use tokenline_core::filter::{FilterExpr, FilterQuery};
use tokenline_core::model::{TokenTransfer, TransferType};
use tokenline_core::LedgerErrorKind;
use tokenline_store::TransferStore;
use uuid::Uuid;

fn setup_test_db() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    tokenline_store::migrations::apply_migrations(&mut conn).unwrap();
    conn
}

fn seed_transfer(
    store: &TransferStore,
    conn: &mut Connection,
    namespace: &str,
    pool_id: Uuid,
    protocol_id: &str,
    from: &str,
    to: &str,
) -> TokenTransfer {
    let mut transfer = TokenTransfer::new(
        TransferType::Transfer,
        pool_id,
        "erc20".to_string(),
        namespace.to_string(),
        protocol_id.to_string(),
    );
    transfer.token_index = Some("1".to_string());
    transfer.from = Some(from.to_string());
    transfer.to = Some(to.to_string());
    transfer.amount = "10".parse().unwrap();
    store.insert_or_get(conn, &mut transfer).unwrap();
    transfer
}

#[test]
fn test_conjunction_matches_exactly_one_row() {
    let mut conn = setup_test_db();
    let store = TransferStore::new();
    let pool = Uuid::now_v7();

    let target = seed_transfer(&store, &mut conn, "ns1", pool, "1", "0x01", "0x02");
    seed_transfer(&store, &mut conn, "ns1", pool, "2", "0x01", "0x03");
    seed_transfer(&store, &mut conn, "ns1", pool, "3", "0x04", "0x02");

    let query = FilterQuery::new()
        .filter(FilterExpr::and([
            FilterExpr::eq("pool", pool.to_string()),
            FilterExpr::eq("tokenindex", "1"),
            FilterExpr::eq("from", "0x01"),
            FilterExpr::eq("to", "0x02"),
            FilterExpr::eq("protocolid", "1"),
            FilterExpr::eq("created", json!(target.created.unwrap().timestamp_millis())),
        ]))
        .count(true);

    let page = store.list(&conn, "ns1", &query).unwrap();
    assert_eq!(page.transfers.len(), 1);
    assert_eq!(page.transfers[0], target);
    assert_eq!(page.total, Some(1));
}

#[test]
fn test_count_ignores_pagination() {
    let mut conn = setup_test_db();
    let store = TransferStore::new();
    let pool = Uuid::now_v7();

    for i in 0..5 {
        seed_transfer(
            &store,
            &mut conn,
            "ns1",
            pool,
            &format!("p-{}", i),
            "0x01",
            "0x02",
        );
    }

    let query = FilterQuery::new()
        .filter(FilterExpr::eq("from", "0x01"))
        .limit(2)
        .count(true);

    let page = store.list(&conn, "ns1", &query).unwrap();
    assert_eq!(page.transfers.len(), 2, "limit should bound the page");
    assert_eq!(page.total, Some(5), "total should ignore the limit");

    // Without a count request the total stays empty
    let no_count = store
        .list(&conn, "ns1", &FilterQuery::new().limit(2))
        .unwrap();
    assert_eq!(no_count.total, None);
}

#[test]
fn test_range_filter_on_created() {
    let mut conn = setup_test_db();
    let store = TransferStore::new();
    let pool = Uuid::now_v7();

    let first = seed_transfer(&store, &mut conn, "ns1", pool, "1", "0x01", "0x02");
    seed_transfer(&store, &mut conn, "ns1", pool, "2", "0x01", "0x02");
    seed_transfer(&store, &mut conn, "ns1", pool, "3", "0x01", "0x02");

    let cutoff = first.created.unwrap().timestamp_millis();
    let query = FilterQuery::new().filter(FilterExpr::gte("created", json!(cutoff)));

    let page = store.list(&conn, "ns1", &query).unwrap();
    assert_eq!(page.transfers.len(), 3, "all rows land at or after the first");
}

#[test]
fn test_sort_order_and_default_ordering() {
    let mut conn = setup_test_db();
    let store = TransferStore::new();
    let pool = Uuid::now_v7();

    // Spread inserts across distinct milliseconds so the created-based
    // default ordering is unambiguous
    seed_transfer(&store, &mut conn, "ns1", pool, "b", "0x01", "0x02");
    std::thread::sleep(std::time::Duration::from_millis(2));
    seed_transfer(&store, &mut conn, "ns1", pool, "a", "0x01", "0x02");
    std::thread::sleep(std::time::Duration::from_millis(2));
    seed_transfer(&store, &mut conn, "ns1", pool, "c", "0x01", "0x02");

    let ascending = store
        .list(
            &conn,
            "ns1",
            &FilterQuery::new().order_by("protocolid", false),
        )
        .unwrap();
    let ids: Vec<_> = ascending
        .transfers
        .iter()
        .map(|t| t.protocol_id.as_str())
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);

    // Default ordering is newest-first
    let default_order = store.list(&conn, "ns1", &FilterQuery::new()).unwrap();
    assert_eq!(default_order.transfers[0].protocol_id, "c");
}

#[test]
fn test_namespace_scoping_cannot_leak() {
    let mut conn = setup_test_db();
    let store = TransferStore::new();
    let pool = Uuid::now_v7();

    seed_transfer(&store, &mut conn, "ns1", pool, "1", "0x01", "0x02");
    seed_transfer(&store, &mut conn, "ns2", pool, "2", "0x01", "0x02");

    // The same filter run against ns2 only ever sees ns2 rows
    let query = FilterQuery::new().filter(FilterExpr::eq("from", "0x01"));
    let page = store.list(&conn, "ns2", &query).unwrap();
    assert_eq!(page.transfers.len(), 1);
    assert_eq!(page.transfers[0].namespace, "ns2");
}

#[test]
fn test_unknown_field_fails_before_touching_the_database() {
    // Given: A connection whose table has been dropped; a query execution
    // would fail loudly, so a FilterBuild error proves we never got there
    let mut conn = setup_test_db();
    conn.execute_batch("DROP TABLE token_transfers").unwrap();
    let store = TransferStore::new();

    let query = FilterQuery::new().filter(FilterExpr::eq("wallet", "0x01"));
    let err = store.list(&conn, "ns1", &query).unwrap_err();

    assert_eq!(err.kind(), LedgerErrorKind::FilterBuild);
    assert_eq!(err.field(), Some("wallet"));
}

#[test]
fn test_non_scalar_value_is_rejected() {
    let conn = setup_test_db();
    let store = TransferStore::new();

    let query = FilterQuery::new().filter(FilterExpr::eq("protocolid", json!(["a", "b"])));
    let err = store.list(&conn, "ns1", &query).unwrap_err();
    assert_eq!(err.kind(), LedgerErrorKind::FilterBuild);
    assert_eq!(err.field(), Some("protocolid"));
}

#[test]
fn test_query_failure_surfaces_as_query_error() {
    let mut conn = setup_test_db();
    conn.execute_batch("DROP TABLE token_transfers").unwrap();
    let store = TransferStore::new();

    let err = store.list(&conn, "ns1", &FilterQuery::new()).unwrap_err();
    assert_eq!(err.kind(), LedgerErrorKind::Query);
}
