//! Relationship inference and relationship checks against SQLite.
//!
//! This test suite covers:
//! - Missing-FK inference (undeclared vs declared relationships)
//! - Orphan counting compared with an independent anti-join count
//! - Circular FK detection over declared constraints
//! - FK type mismatch detection
//!
//! Note: SQLite tests use single-connection in-memory databases.

#![cfg(feature = "sqlite")]

use schemadiag_core::{
    Check, CheckContext, CheckStatus, DiagnosticsConfig, Result,
    catalog::CatalogReader,
    checks::{CircularForeignKeys, ForeignKeyTypeMismatch, MissingForeignKeys, OrphanRecords},
    executor::sqlite::SqliteExecutor,
    relationships::{EdgeOrigin, RelationshipGraph},
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;

/// Creates a single-connection in-memory database and runs `statements` on it
async fn create_pool(statements: &[&str]) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    for statement in statements {
        sqlx::query(statement).execute(&pool).await?;
    }
    Ok(pool)
}

fn context(pool: SqlitePool) -> CheckContext {
    CheckContext::new(
        Arc::new(SqliteExecutor::from_pool(pool)),
        DiagnosticsConfig::default(),
    )
}

/// Customers is referenced by Orders (no FK) and Invoices (declared FK)
const SALES_SCHEMA: &[&str] = &[
    "CREATE TABLE Customers (CustomerId INTEGER PRIMARY KEY, Name TEXT NOT NULL)",
    "CREATE TABLE Orders (OrderId INTEGER PRIMARY KEY, CustomerId INTEGER)",
    "CREATE TABLE Invoices (InvoiceId INTEGER PRIMARY KEY, \
     CustomerId INTEGER REFERENCES Customers(CustomerId))",
    "INSERT INTO Customers VALUES (1, 'Ada'), (2, 'Grace')",
    "INSERT INTO Orders VALUES (10, 1), (11, 3), (12, 3), (13, NULL), (14, 4), (15, 2)",
    "INSERT INTO Invoices VALUES (100, 1), (101, 2)",
];

// =============================================================================
// Relationship Graph Tests
// =============================================================================

/// Inferred edges cover both children; declared edges only the constrained one
#[tokio::test]
async fn test_sqlite_relationship_graph() -> Result<()> {
    let pool = create_pool(SALES_SCHEMA).await?;
    let executor = SqliteExecutor::from_pool(pool);
    let reader = CatalogReader::new(&executor, Duration::from_secs(10));

    let graph = RelationshipGraph::load(&reader).await?;

    let inferred: Vec<String> = graph.inferred.iter().map(ToString::to_string).collect();
    assert_eq!(
        inferred,
        vec![
            "main.Invoices.CustomerId -> main.Customers.CustomerId",
            "main.Orders.CustomerId -> main.Customers.CustomerId",
        ]
    );
    assert!(graph.inferred.iter().all(|e| e.origin == EdgeOrigin::Inferred));

    assert_eq!(graph.declared.len(), 1);
    assert_eq!(
        graph.declared[0].to_string(),
        "main.Invoices.CustomerId -> main.Customers.CustomerId"
    );

    let missing: Vec<String> = graph
        .missing_foreign_keys()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(missing, vec!["main.Orders.CustomerId -> main.Customers.CustomerId"]);
    Ok(())
}

/// Missing FK check reports the undeclared relationship only
#[tokio::test]
async fn test_sqlite_missing_foreign_keys_check() -> Result<()> {
    let ctx = context(create_pool(SALES_SCHEMA).await?);

    let outcome = MissingForeignKeys::new().execute(&ctx).await?;

    assert_eq!(outcome.status, CheckStatus::Warning);
    assert_eq!(
        outcome.evidence,
        vec!["main.Orders.CustomerId -> main.Customers.CustomerId"]
    );
    assert!(outcome.message.starts_with("Found 1 relationship(s) without FK"));
    Ok(())
}

/// Declaring every relationship makes the check pass
#[tokio::test]
async fn test_sqlite_missing_foreign_keys_all_declared() -> Result<()> {
    let ctx = context(
        create_pool(&[
            "CREATE TABLE Customers (CustomerId INTEGER PRIMARY KEY)",
            "CREATE TABLE Orders (OrderId INTEGER PRIMARY KEY, \
             CustomerId INTEGER REFERENCES Customers(CustomerId))",
        ])
        .await?,
    );

    let outcome = MissingForeignKeys::new().execute(&ctx).await?;

    assert_eq!(outcome.status, CheckStatus::Pass);
    assert!(outcome.evidence.is_empty());
    Ok(())
}

// =============================================================================
// Orphan Tests
// =============================================================================

/// Orphan counts match an independent NOT EXISTS count
#[tokio::test]
async fn test_sqlite_orphan_count_matches_manual_count() -> Result<()> {
    let pool = create_pool(SALES_SCHEMA).await?;
    let manual: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM Orders o WHERE o.CustomerId IS NOT NULL \
         AND NOT EXISTS (SELECT 1 FROM Customers c WHERE c.CustomerId = o.CustomerId)",
    )
    .fetch_one(&pool)
    .await?;
    assert_eq!(manual, 3);

    let ctx = context(pool);
    let outcome = OrphanRecords::new().execute(&ctx).await?;

    assert_eq!(outcome.status, CheckStatus::Warning);
    assert_eq!(
        outcome.evidence,
        vec![format!(
            "main.Orders.CustomerId -> main.Customers.CustomerId ({manual} orphan(s))"
        )]
    );
    assert!(outcome.message.starts_with("Found orphan(s): "));
    Ok(())
}

/// No inferred relationships means nothing to probe
#[tokio::test]
async fn test_sqlite_orphans_without_relationships() -> Result<()> {
    let ctx = context(create_pool(&["CREATE TABLE Notes (NoteId INTEGER PRIMARY KEY, Body TEXT)"]).await?);

    let outcome = OrphanRecords::new().execute(&ctx).await?;

    assert_eq!(outcome.status, CheckStatus::Pass);
    assert_eq!(outcome.message, "No orphan records found");
    Ok(())
}

// =============================================================================
// Cycle Tests
// =============================================================================

/// A -> B -> C -> A is reported; D -> A is not part of the cycle
#[tokio::test]
async fn test_sqlite_circular_foreign_keys() -> Result<()> {
    let ctx = context(
        create_pool(&[
            "CREATE TABLE A (AKey INTEGER PRIMARY KEY, BRef INTEGER REFERENCES B(BKey))",
            "CREATE TABLE B (BKey INTEGER PRIMARY KEY, CRef INTEGER REFERENCES C(CKey))",
            "CREATE TABLE C (CKey INTEGER PRIMARY KEY, ARef INTEGER REFERENCES A(AKey))",
            "CREATE TABLE D (DKey INTEGER PRIMARY KEY, ARef INTEGER REFERENCES A(AKey))",
        ])
        .await?,
    );

    let outcome = CircularForeignKeys::new().execute(&ctx).await?;

    assert_eq!(outcome.status, CheckStatus::Warning);
    assert_eq!(outcome.evidence, vec!["main.A", "main.B", "main.C"]);
    assert_eq!(
        outcome.message,
        "Circular FK dependency detected: main.A, main.B, main.C"
    );
    Ok(())
}

/// Inferred (undeclared) relationships never create cycles
#[tokio::test]
async fn test_sqlite_cycles_ignore_inferred_edges() -> Result<()> {
    let ctx = context(
        create_pool(&[
            "CREATE TABLE Parents (ParentKey INTEGER PRIMARY KEY, ChildKey INTEGER)",
            "CREATE TABLE Children (ChildKey INTEGER PRIMARY KEY, ParentKey INTEGER)",
        ])
        .await?,
    );

    let outcome = CircularForeignKeys::new().execute(&ctx).await?;

    assert_eq!(outcome.status, CheckStatus::Pass);
    assert_eq!(outcome.message, "No circular FK dependencies");
    Ok(())
}

// =============================================================================
// Type Mismatch Tests
// =============================================================================

/// Same-named columns with different declared types are reported
#[tokio::test]
async fn test_sqlite_fk_type_mismatch() -> Result<()> {
    let ctx = context(
        create_pool(&[
            "CREATE TABLE Customers (CustomerId INTEGER PRIMARY KEY)",
            "CREATE TABLE Payments (PaymentId INTEGER PRIMARY KEY, CustomerId TEXT)",
            "CREATE TABLE Refunds (RefundId INTEGER PRIMARY KEY, CustomerId integer)",
        ])
        .await?,
    );

    let outcome = ForeignKeyTypeMismatch::new().execute(&ctx).await?;

    assert_eq!(outcome.status, CheckStatus::Warning);
    assert_eq!(
        outcome.evidence,
        vec!["main.Payments.CustomerId (TEXT) vs main.Customers.CustomerId (INTEGER)"]
    );
    Ok(())
}
