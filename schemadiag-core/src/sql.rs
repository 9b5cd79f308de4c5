//! Identifier quoting and literal escaping.
//!
//! Every identifier or value that reaches generated SQL goes through this
//! module. Nothing else in the crate concatenates catalog names into a
//! statement.

use serde::{Deserialize, Serialize};

/// SQL dialect spoken by a target database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    Sqlite,
    Postgres,
    SqlServer,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Sqlite => write!(f, "SQLite"),
            Dialect::Postgres => write!(f, "PostgreSQL"),
            Dialect::SqlServer => write!(f, "SQL Server"),
        }
    }
}

impl Dialect {
    /// Quotes a single identifier part.
    ///
    /// # Example
    /// ```rust
    /// use schemadiag_core::sql::Dialect;
    ///
    /// assert_eq!(Dialect::Postgres.quote_identifier("my\"col"), "\"my\"\"col\"");
    /// assert_eq!(Dialect::SqlServer.quote_identifier("a]b"), "[a]]b]");
    /// ```
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Sqlite | Dialect::Postgres => format!("\"{}\"", name.replace('"', "\"\"")),
            Dialect::SqlServer => format!("[{}]", name.replace(']', "]]")),
        }
    }

    /// Quotes a `schema.table` pair.
    pub fn qualified_table(self, schema: &str, table: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(schema),
            self.quote_identifier(table)
        )
    }

    /// Renders a string literal. SQL Server literals are Unicode (`N'...'`).
    pub fn string_literal(self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        match self {
            Dialect::SqlServer => format!("N'{escaped}'"),
            Dialect::Sqlite | Dialect::Postgres => format!("'{escaped}'"),
        }
    }

    /// Statement returning up to `limit` distinct non-null values of one column.
    ///
    /// Values are cast to an unbounded text type so that the output column
    /// has the same type whether the statement runs alone or as one branch
    /// of a `UNION ALL` with other text columns. PostgreSQL drops `char(n)`
    /// padding in that cast. SQL Server compares with a binary collation so
    /// that values differing only in case stay distinct.
    pub fn distinct_sample(self, schema: &str, table: &str, column: &str, limit: usize) -> String {
        let col = self.quote_identifier(column);
        let from = self.qualified_table(schema, table);
        match self {
            Dialect::SqlServer => format!(
                "SELECT DISTINCT TOP ({limit}) CAST({col} AS nvarchar(max)) COLLATE Latin1_General_BIN \
                 AS sample_value FROM {from} WHERE {col} IS NOT NULL"
            ),
            Dialect::Postgres => format!(
                "SELECT DISTINCT {col}::text AS sample_value FROM {from} WHERE {col} IS NOT NULL LIMIT {limit}"
            ),
            Dialect::Sqlite => format!(
                "SELECT DISTINCT {col} AS sample_value FROM {from} WHERE {col} IS NOT NULL LIMIT {limit}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADVERSARIAL: &[&str] = &[
        "plain",
        "with space",
        "quote\"inside",
        "bracket]inside",
        "[already]",
        "semi;colon",
        "x\"; DROP TABLE t; --",
        "it's",
        "",
    ];

    /// Reverses double-quote identifier quoting; `None` if the text is not a single token.
    fn unquote_double(quoted: &str) -> Option<String> {
        let inner = quoted.strip_prefix('"')?.strip_suffix('"')?;
        let mut out = String::new();
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.next() != Some('"') {
                    return None;
                }
            }
            out.push(c);
        }
        Some(out)
    }

    fn unquote_bracket(quoted: &str) -> Option<String> {
        let inner = quoted.strip_prefix('[')?.strip_suffix(']')?;
        let mut out = String::new();
        let mut chars = inner.chars().peekable();
        while let Some(c) = chars.next() {
            if c == ']' {
                if chars.next() != Some(']') {
                    return None;
                }
            }
            out.push(c);
        }
        Some(out)
    }

    #[test]
    fn test_double_quoted_identifiers_round_trip() {
        for name in ADVERSARIAL {
            for dialect in [Dialect::Sqlite, Dialect::Postgres] {
                let quoted = dialect.quote_identifier(name);
                assert_eq!(unquote_double(&quoted).as_deref(), Some(*name), "{quoted}");
            }
        }
    }

    #[test]
    fn test_bracket_identifiers_round_trip() {
        for name in ADVERSARIAL {
            let quoted = Dialect::SqlServer.quote_identifier(name);
            assert_eq!(unquote_bracket(&quoted).as_deref(), Some(*name), "{quoted}");
        }
    }

    #[test]
    fn test_string_literals() {
        assert_eq!(Dialect::Sqlite.string_literal("it's"), "'it''s'");
        assert_eq!(Dialect::Postgres.string_literal("''"), "''''''");
        assert_eq!(Dialect::SqlServer.string_literal("O'Brien"), "N'O''Brien'");
        assert_eq!(Dialect::Postgres.string_literal(""), "''");
    }

    #[test]
    fn test_qualified_table() {
        assert_eq!(
            Dialect::SqlServer.qualified_table("dbo", "Order Lines"),
            "[dbo].[Order Lines]"
        );
        assert_eq!(
            Dialect::Sqlite.qualified_table("main", "a\"b"),
            "\"main\".\"a\"\"b\""
        );
    }

    #[test]
    fn test_distinct_sample() {
        let sql = Dialect::Postgres.distinct_sample("public", "orders", "status", 100);
        assert!(sql.contains("SELECT DISTINCT \"status\"::text AS sample_value"));
        assert!(sql.ends_with("LIMIT 100"));

        let sql = Dialect::SqlServer.distinct_sample("dbo", "Orders", "Status", 50);
        assert!(sql.contains("TOP (50)"));
        assert!(sql.contains("CAST([Status] AS nvarchar(max)) COLLATE Latin1_General_BIN"));
        assert!(!sql.contains("LIMIT"));

        let sql = Dialect::Sqlite.distinct_sample("main", "Orders", "Status", 10);
        assert!(sql.starts_with("SELECT DISTINCT \"Status\" AS sample_value"));
    }

    #[test]
    fn test_distinct_sample_branches_share_output_type() {
        // char(n) and text columns merged into one UNION ALL must both
        // produce text, the same as when each runs alone.
        for (dialect, cast) in [
            (Dialect::Postgres, "::text AS sample_value"),
            (Dialect::SqlServer, "AS nvarchar(max))"),
        ] {
            let candidates = [
                crate::models::Candidate::new("p.state", dialect.distinct_sample("s", "p", "state", 100)),
                crate::models::Candidate::new("p.code", dialect.distinct_sample("s", "p", "code", 100)),
            ];
            let refs: Vec<&crate::models::Candidate> = candidates.iter().collect();
            let statement = crate::batch::build_union_statement(dialect, &refs);
            assert_eq!(statement.matches(cast).count(), 2, "{statement}");
            for candidate in &candidates {
                assert!(candidate.query.contains(cast));
            }
        }
    }
}
