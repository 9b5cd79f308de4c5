//! Classification of raw driver failures.
//!
//! Each driver reports failures in its own vocabulary: SQLSTATE codes for
//! PostgreSQL, server error numbers for SQL Server, result codes for SQLite.
//! The functions here map them onto [`FaultKind`], which is what check
//! results and logs expose. Swapping or adding a driver only means adding
//! one mapping function.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of infrastructure fault behind a failed round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Server unreachable, refused, TLS handshake, dropped connection
    Connectivity,
    /// Login rejected or missing privileges on a catalog view
    Authorization,
    /// Statement or connection timed out
    Timeout,
    /// Anything else (syntax errors, missing objects, driver bugs)
    Other,
}

impl FaultKind {
    /// Short label used in result messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connectivity => "CANNOT CONNECT",
            Self::Authorization => "ACCESS DENIED",
            Self::Timeout => "TIMEOUT",
            Self::Other => "QUERY ERROR",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a PostgreSQL SQLSTATE code.
pub fn classify_sqlstate(code: &str) -> FaultKind {
    match code {
        // invalid_authorization_specification, invalid_password, insufficient_privilege
        "28000" | "28P01" | "42501" => FaultKind::Authorization,
        // query_canceled (statement_timeout), lock_not_available
        "57014" | "55P03" => FaultKind::Timeout,
        // admin_shutdown, crash_shutdown, cannot_connect_now, too_many_connections
        "57P01" | "57P02" | "57P03" | "53300" => FaultKind::Connectivity,
        // connection_exception class
        code if code.starts_with("08") => FaultKind::Connectivity,
        _ => FaultKind::Other,
    }
}

/// Maps a SQL Server error number.
pub fn classify_mssql_number(number: u32) -> FaultKind {
    match number {
        // login failed, untrusted login, cannot open database, permission denied
        18456 | 18452 | 4060 | 4064 | 229 | 230 | 300 => FaultKind::Authorization,
        // lock request timeout, deadlock victim
        1222 | 1205 => FaultKind::Timeout,
        // could not open connection, server not found, network errors
        2 | 40 | 53 | 10054 | 10060 | 10061 | 11001 => FaultKind::Connectivity,
        _ => FaultKind::Other,
    }
}

/// Maps a SQLite primary result code (extended codes are reduced to the low byte).
pub fn classify_sqlite_code(code: &str) -> FaultKind {
    let Ok(code) = code.parse::<i32>() else {
        return FaultKind::Other;
    };
    match code & 0xff {
        // SQLITE_PERM, SQLITE_AUTH
        3 | 23 => FaultKind::Authorization,
        // SQLITE_BUSY, SQLITE_LOCKED
        5 | 6 => FaultKind::Timeout,
        // SQLITE_CANTOPEN, SQLITE_NOTADB
        14 | 26 => FaultKind::Connectivity,
        _ => FaultKind::Other,
    }
}

#[cfg(any(feature = "postgresql", feature = "sqlite"))]
/// Maps a sqlx error; returns the kind and the driver code when one exists.
pub fn classify_sqlx(error: &sqlx::Error) -> (FaultKind, Option<String>) {
    match error {
        sqlx::Error::Database(db) => {
            let code = db.code().map(std::borrow::Cow::into_owned);
            #[cfg(feature = "postgresql")]
            if db
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .is_some()
            {
                let kind = code.as_deref().map_or(FaultKind::Other, classify_sqlstate);
                return (kind, code);
            }
            let kind = code.as_deref().map_or(FaultKind::Other, classify_sqlite_code);
            (kind, code)
        }
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Protocol(_) => (FaultKind::Connectivity, None),
        sqlx::Error::PoolTimedOut => (FaultKind::Timeout, None),
        _ => (FaultKind::Other, None),
    }
}

#[cfg(feature = "mssql")]
/// Maps a tiberius error; returns the kind and the server error number when one exists.
pub fn classify_tiberius(error: &tiberius::error::Error) -> (FaultKind, Option<String>) {
    use tiberius::error::Error;
    match error {
        Error::Server(token) => (
            classify_mssql_number(token.code()),
            Some(token.code().to_string()),
        ),
        Error::Io { .. } | Error::Tls(_) | Error::Routing { .. } => {
            (FaultKind::Connectivity, None)
        }
        _ => (FaultKind::Other, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlstate_classification() {
        assert_eq!(classify_sqlstate("28P01"), FaultKind::Authorization);
        assert_eq!(classify_sqlstate("42501"), FaultKind::Authorization);
        assert_eq!(classify_sqlstate("57014"), FaultKind::Timeout);
        assert_eq!(classify_sqlstate("08006"), FaultKind::Connectivity);
        assert_eq!(classify_sqlstate("42P01"), FaultKind::Other);
    }

    #[test]
    fn test_mssql_classification() {
        assert_eq!(classify_mssql_number(18456), FaultKind::Authorization);
        assert_eq!(classify_mssql_number(1205), FaultKind::Timeout);
        assert_eq!(classify_mssql_number(53), FaultKind::Connectivity);
        assert_eq!(classify_mssql_number(208), FaultKind::Other);
    }

    #[test]
    fn test_sqlite_classification() {
        assert_eq!(classify_sqlite_code("5"), FaultKind::Timeout);
        // SQLITE_BUSY_SNAPSHOT = 517, primary code 5
        assert_eq!(classify_sqlite_code("517"), FaultKind::Timeout);
        assert_eq!(classify_sqlite_code("14"), FaultKind::Connectivity);
        assert_eq!(classify_sqlite_code("1"), FaultKind::Other);
        assert_eq!(classify_sqlite_code("not-a-number"), FaultKind::Other);
    }

    #[test]
    fn test_labels() {
        assert_eq!(FaultKind::Timeout.to_string(), "TIMEOUT");
        assert_eq!(FaultKind::Connectivity.label(), "CANNOT CONNECT");
    }
}
