mod common;

use common::{SAMPLE_TABLE, TestDb, count_rows, insert_name};
use sqlmy::prelude::*;

#[test]
fn committed_rows_are_visible() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.create_tables()?;

    t.db.start_transaction()?;
    assert!(t.db.in_transaction());
    insert_name(&t.db, "Test")?;
    t.db.commit_transaction()?;
    assert!(!t.db.in_transaction());

    assert_eq!(count_rows(&t.db, SAMPLE_TABLE)?, 1);
    Ok(())
}

#[test]
fn start_transaction_does_not_stack_roots() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.create_tables()?;
    t.db.start_transaction()?;
    t.db.start_transaction()?;
    assert_eq!(t.db.transaction_depth(), 1);

    t.db.commit_transaction()?;
    assert_eq!(t.db.transaction_depth(), 0);
    Ok(())
}

#[test]
fn rolled_back_rows_are_invisible() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.create_tables()?;

    t.db.start_transaction()?;
    insert_name(&t.db, "gone")?;
    t.db.rollback_transaction()?;

    assert_eq!(count_rows(&t.db, SAMPLE_TABLE)?, 0);
    Ok(())
}

#[test]
fn nested_rollback_keeps_the_outer_scope() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.create_tables()?;

    t.db.start_transaction()?;
    insert_name(&t.db, "outer")?;
    t.db.start_nested_transaction()?;
    insert_name(&t.db, "inner")?;
    assert_eq!(t.db.transaction_depth(), 2);

    t.db.rollback_transaction()?;
    assert_eq!(t.db.transaction_depth(), 1);
    t.db.commit_transaction()?;

    let rs = common::select(&t.db, "SELECT name FROM sample_table")?;
    assert_eq!(rs.len(), 1);
    assert_eq!(rs[0].get("name"), Some(&RowValues::Text("outer".into())));
    Ok(())
}

#[test]
fn nested_commit_then_outer_rollback_discards_both() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.create_tables()?;

    t.db.start_transaction()?;
    insert_name(&t.db, "outer")?;
    t.db.start_nested_transaction()?;
    insert_name(&t.db, "inner")?;
    t.db.commit_transaction()?;
    t.db.rollback_transaction()?;

    assert_eq!(count_rows(&t.db, SAMPLE_TABLE)?, 0);
    Ok(())
}

#[test]
fn empty_stack_commit_and_rollback_are_state_errors() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.connect()?;

    let err = t.db.commit_transaction().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::State);
    assert!(err.to_string().contains("transaction is not started"));

    let err = t.db.rollback_transaction().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::State);
    assert_eq!(t.db.transaction_depth(), 0);
    Ok(())
}

#[test]
fn nested_transaction_needs_a_connection() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    let err = t.db.start_nested_transaction().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::State);
    assert!(!t.db.is_initialized());
    Ok(())
}

#[test]
fn savepoint_without_a_root_is_allowed() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.create_tables()?;
    t.db.start_nested_transaction()?;
    insert_name(&t.db, "kept")?;
    t.db.commit_transaction()?;
    assert_eq!(count_rows(&t.db, SAMPLE_TABLE)?, 1);
    Ok(())
}

#[test]
fn foreign_transaction_blocks_start() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.connect()?;
    t.db.execute_query("BEGIN", &params! {})?;

    let err = t.db.start_transaction().unwrap_err();
    assert_eq!(err.category(), ErrorCategory::State);
    assert_eq!(t.db.transaction_depth(), 0);

    t.db.execute_query("ROLLBACK", &params! {})?;
    t.db.start_transaction()?;
    assert_eq!(t.db.transaction_depth(), 1);
    Ok(())
}

#[test]
fn disconnect_discards_uncommitted_work() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::with_sample_table()?;
    t.db.create_tables()?;
    t.db.start_transaction()?;
    insert_name(&t.db, "lost")?;
    t.db.disconnect();

    t.db.connect()?;
    assert_eq!(count_rows(&t.db, SAMPLE_TABLE)?, 0);
    Ok(())
}

#[test]
fn refused_commit_does_not_wedge_the_manager() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDb::new(SchemaRegistry::new())?;
    t.db.connect()?;
    t.db.execute_query("PRAGMA foreign_keys = ON", &params! {})?;
    t.db.execute_query("CREATE TABLE p (id INTEGER PRIMARY KEY)", &params! {})?;
    t.db.execute_query(
        "CREATE TABLE c (pid INTEGER REFERENCES p (id) DEFERRABLE INITIALLY DEFERRED)",
        &params! {},
    )?;

    // the orphan row only fails when the deferred check runs at COMMIT
    let err = t
        .db
        .execute_query_with_transaction(
            "INSERT INTO c (pid) VALUES (:x)",
            &params! { "x" => 42_i64 },
        )
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Integrity);
    assert_eq!(t.db.transaction_depth(), 0);

    t.db.execute_query_with_transaction(
        "INSERT INTO p (id) VALUES (:id)",
        &params! { "id" => 42_i64 },
    )?;
    t.db.start_transaction()?;
    t.db.commit_transaction()?;

    assert_eq!(count_rows(&t.db, "p")?, 1);
    assert_eq!(count_rows(&t.db, "c")?, 0);
    Ok(())
}
