//! Per-dialect catalog statements.
//!
//! Every statement returns the same column shape on every dialect so the
//! readers in the parent module can parse rows without branching:
//!
//! | statement | columns |
//! |-----------|---------|
//! | tables | schema, table |
//! | columns | schema, table, column, data type, nullable (0/1), ordinal |
//! | key_columns | schema, table, index, column, is primary (0/1), key width |
//! | foreign_keys | constraint, child schema, child table, child column, parent schema, parent table, parent column |
//! | unused_indexes | schema, table, index |
//! | fragmented_indexes | schema, table, index, fragmentation percent |

use crate::sql::Dialect;

/// Catalog statements for one dialect.
#[derive(Debug)]
pub struct CatalogQueries {
    pub tables: &'static str,
    pub columns: &'static str,
    pub key_columns: &'static str,
    pub foreign_keys: &'static str,
    /// `None` where the engine keeps no index usage statistics
    pub unused_indexes: Option<&'static str>,
    /// `None` where the engine exposes no physical fragmentation statistics
    pub fragmented_indexes: Option<&'static str>,
}

impl CatalogQueries {
    pub fn for_dialect(dialect: Dialect) -> &'static Self {
        match dialect {
            Dialect::Sqlite => &SQLITE,
            Dialect::Postgres => &POSTGRES,
            Dialect::SqlServer => &SQL_SERVER,
        }
    }
}

static SQLITE: CatalogQueries = CatalogQueries {
    tables: "
        SELECT 'main' AS schema_name, m.name AS table_name
        FROM sqlite_master AS m
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
        ORDER BY m.name",
    columns: "
        SELECT 'main' AS schema_name, m.name AS table_name, p.name AS column_name,
               p.type AS data_type,
               CASE WHEN p.\"notnull\" = 0 AND p.pk = 0 THEN 1 ELSE 0 END AS is_nullable,
               p.cid + 1 AS ordinal
        FROM sqlite_master AS m, pragma_table_info(m.name) AS p
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
        ORDER BY m.name, p.cid",
    key_columns: "
        SELECT 'main' AS schema_name, m.name AS table_name, 'PRIMARY' AS index_name,
               p.name AS column_name, 1 AS is_primary,
               (SELECT COUNT(*) FROM pragma_table_info(m.name) AS p2 WHERE p2.pk > 0) AS key_width
        FROM sqlite_master AS m, pragma_table_info(m.name) AS p
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%' AND p.pk > 0
        UNION ALL
        SELECT 'main', m.name, il.name, ii.name, 0,
               (SELECT COUNT(*) FROM pragma_index_info(il.name) AS ii2)
        FROM sqlite_master AS m, pragma_index_list(m.name) AS il, pragma_index_info(il.name) AS ii
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
          AND il.\"unique\" = 1 AND il.origin <> 'pk' AND il.partial = 0
        ORDER BY 2, 3",
    foreign_keys: "
        SELECT 'fk_' || m.name || '_' || f.id AS constraint_name,
               'main' AS child_schema, m.name AS child_table, f.\"from\" AS child_column,
               'main' AS parent_schema, f.\"table\" AS parent_table,
               COALESCE(f.\"to\",
                        (SELECT p.name FROM pragma_table_info(f.\"table\") AS p
                         WHERE p.pk = f.seq + 1)) AS parent_column
        FROM sqlite_master AS m, pragma_foreign_key_list(m.name) AS f
        WHERE m.type = 'table' AND m.name NOT LIKE 'sqlite_%'
        ORDER BY m.name, f.id, f.seq",
    unused_indexes: None,
    fragmented_indexes: None,
};

static POSTGRES: CatalogQueries = CatalogQueries {
    tables: "
        SELECT n.nspname::text AS schema_name, c.relname::text AS table_name
        FROM pg_catalog.pg_class c
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind IN ('r', 'p') AND NOT c.relispartition
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg_toast%' AND n.nspname NOT LIKE 'pg_temp%'
        ORDER BY 1, 2",
    columns: "
        SELECT n.nspname::text AS schema_name, c.relname::text AS table_name,
               a.attname::text AS column_name,
               pg_catalog.format_type(a.atttypid, NULL)::text AS data_type,
               CASE WHEN a.attnotnull THEN 0 ELSE 1 END AS is_nullable,
               a.attnum::int8 AS ordinal
        FROM pg_catalog.pg_attribute a
        JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        WHERE c.relkind IN ('r', 'p') AND NOT c.relispartition
          AND a.attnum > 0 AND NOT a.attisdropped
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg_toast%' AND n.nspname NOT LIKE 'pg_temp%'
        ORDER BY 1, 2, a.attnum",
    key_columns: "
        SELECT n.nspname::text AS schema_name, c.relname::text AS table_name,
               ic.relname::text AS index_name, a.attname::text AS column_name,
               CASE WHEN i.indisprimary THEN 1 ELSE 0 END AS is_primary,
               i.indnkeyatts::int8 AS key_width
        FROM pg_catalog.pg_index i
        JOIN pg_catalog.pg_class c ON c.oid = i.indrelid
        JOIN pg_catalog.pg_class ic ON ic.oid = i.indexrelid
        JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
        JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord)
             ON k.ord <= i.indnkeyatts
        JOIN pg_catalog.pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
        WHERE (i.indisunique OR i.indisprimary) AND i.indpred IS NULL
          AND n.nspname NOT IN ('pg_catalog', 'information_schema')
          AND n.nspname NOT LIKE 'pg_toast%'
        ORDER BY 1, 2, 3, k.ord",
    foreign_keys: "
        SELECT con.conname::text AS constraint_name,
               cn.nspname::text AS child_schema, cc.relname::text AS child_table,
               ca.attname::text AS child_column,
               pn.nspname::text AS parent_schema, pc.relname::text AS parent_table,
               pa.attname::text AS parent_column
        FROM pg_catalog.pg_constraint con
        JOIN pg_catalog.pg_class cc ON cc.oid = con.conrelid
        JOIN pg_catalog.pg_namespace cn ON cn.oid = cc.relnamespace
        JOIN pg_catalog.pg_class pc ON pc.oid = con.confrelid
        JOIN pg_catalog.pg_namespace pn ON pn.oid = pc.relnamespace
        JOIN LATERAL unnest(con.conkey, con.confkey) AS k(child_attnum, parent_attnum) ON true
        JOIN pg_catalog.pg_attribute ca ON ca.attrelid = con.conrelid AND ca.attnum = k.child_attnum
        JOIN pg_catalog.pg_attribute pa ON pa.attrelid = con.confrelid AND pa.attnum = k.parent_attnum
        WHERE con.contype = 'f'
          AND cn.nspname NOT IN ('pg_catalog', 'information_schema')
        ORDER BY 2, 3, 1",
    unused_indexes: Some(
        "
        SELECT s.schemaname::text AS schema_name, s.relname::text AS table_name,
               s.indexrelname::text AS index_name
        FROM pg_catalog.pg_stat_user_indexes s
        JOIN pg_catalog.pg_index i ON i.indexrelid = s.indexrelid
        WHERE s.idx_scan = 0 AND NOT i.indisprimary AND NOT i.indisunique
        ORDER BY 1, 2, 3",
    ),
    fragmented_indexes: None,
};

static SQL_SERVER: CatalogQueries = CatalogQueries {
    tables: "
        SELECT s.name AS schema_name, t.name AS table_name
        FROM sys.tables t
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        WHERE t.is_ms_shipped = 0 AND s.name NOT IN ('sys', 'INFORMATION_SCHEMA')
        ORDER BY s.name, t.name",
    columns: "
        SELECT s.name AS schema_name, t.name AS table_name, c.name AS column_name,
               ty.name AS data_type, CAST(c.is_nullable AS int) AS is_nullable,
               c.column_id AS ordinal
        FROM sys.columns c
        JOIN sys.tables t ON t.object_id = c.object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        JOIN sys.types ty ON ty.user_type_id = c.user_type_id
        WHERE t.is_ms_shipped = 0 AND s.name NOT IN ('sys', 'INFORMATION_SCHEMA')
        ORDER BY s.name, t.name, c.column_id",
    key_columns: "
        SELECT s.name AS schema_name, t.name AS table_name, i.name AS index_name,
               c.name AS column_name, CAST(i.is_primary_key AS int) AS is_primary,
               (SELECT COUNT(*) FROM sys.index_columns ic2
                WHERE ic2.object_id = i.object_id AND ic2.index_id = i.index_id
                  AND ic2.is_included_column = 0) AS key_width
        FROM sys.indexes i
        JOIN sys.tables t ON t.object_id = i.object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        JOIN sys.index_columns ic ON ic.object_id = i.object_id AND ic.index_id = i.index_id
             AND ic.is_included_column = 0
        JOIN sys.columns c ON c.object_id = ic.object_id AND c.column_id = ic.column_id
        WHERE (i.is_unique = 1 OR i.is_primary_key = 1) AND i.has_filter = 0
          AND i.is_disabled = 0 AND t.is_ms_shipped = 0
          AND s.name NOT IN ('sys', 'INFORMATION_SCHEMA')
        ORDER BY s.name, t.name, i.name, ic.key_ordinal",
    foreign_keys: "
        SELECT fk.name AS constraint_name,
               cs.name AS child_schema, ct.name AS child_table, cc.name AS child_column,
               ps.name AS parent_schema, pt.name AS parent_table, pc.name AS parent_column
        FROM sys.foreign_keys fk
        JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id
        JOIN sys.tables ct ON ct.object_id = fkc.parent_object_id AND ct.is_ms_shipped = 0
        JOIN sys.schemas cs ON cs.schema_id = ct.schema_id
        JOIN sys.columns cc ON cc.object_id = fkc.parent_object_id AND cc.column_id = fkc.parent_column_id
        JOIN sys.tables pt ON pt.object_id = fkc.referenced_object_id
        JOIN sys.schemas ps ON ps.schema_id = pt.schema_id
        JOIN sys.columns pc ON pc.object_id = fkc.referenced_object_id
             AND pc.column_id = fkc.referenced_column_id
        ORDER BY cs.name, ct.name, fk.name, fkc.constraint_column_id",
    unused_indexes: Some(
        "
        SELECT s.name AS schema_name, t.name AS table_name, i.name AS index_name
        FROM sys.indexes i
        JOIN sys.tables t ON t.object_id = i.object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        LEFT JOIN sys.dm_db_index_usage_stats u ON u.object_id = i.object_id
             AND u.index_id = i.index_id AND u.database_id = DB_ID()
        WHERE i.type > 0 AND i.name IS NOT NULL
          AND i.is_primary_key = 0 AND i.is_unique_constraint = 0
          AND t.is_ms_shipped = 0 AND s.name NOT IN ('sys', 'INFORMATION_SCHEMA')
          AND (u.user_seeks IS NULL OR u.user_seeks = 0)
          AND (u.user_scans IS NULL OR u.user_scans = 0)
        ORDER BY s.name, t.name, i.name",
    ),
    fragmented_indexes: Some(
        "
        SELECT s.name AS schema_name, t.name AS table_name, i.name AS index_name,
               CAST(ps.avg_fragmentation_in_percent AS DECIMAL(5,2)) AS fragmentation
        FROM sys.dm_db_index_physical_stats(DB_ID(), NULL, NULL, NULL, 'LIMITED') ps
        JOIN sys.indexes i ON i.object_id = ps.object_id AND i.index_id = ps.index_id
        JOIN sys.tables t ON t.object_id = ps.object_id
        JOIN sys.schemas s ON s.schema_id = t.schema_id
        WHERE ps.avg_fragmentation_in_percent > 10
          AND ps.page_count >= 8
          AND i.name IS NOT NULL
          AND t.is_ms_shipped = 0
          AND s.name NOT IN ('sys', 'INFORMATION_SCHEMA')
        ORDER BY ps.avg_fragmentation_in_percent DESC",
    ),
};
