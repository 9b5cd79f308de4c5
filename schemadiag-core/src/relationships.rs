//! Relationship inference.
//!
//! Two graphs are derived from catalog metadata:
//!
//! - **Declared** edges come from real foreign key constraints.
//! - **Inferred** edges come from naming: a column whose name exactly
//!   matches (case-sensitively) a single-column primary key or unique key
//!   column of a different table is assumed to reference it. Every match is
//!   kept; there is no disambiguation between several candidate parents.
//!
//! Missing-FK detection, orphan probing and type-mismatch detection consume
//! the inferred graph. Cycle detection only ever sees declared edges.

use crate::catalog::{CatalogReader, ColumnInfo, ColumnRef, ForeignKeyColumn, KeyColumn, TableRef};
use crate::models::Candidate;
use crate::sql::Dialect;
use crate::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How an edge became known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EdgeOrigin {
    Inferred,
    Declared,
}

/// Directed child column -> parent column edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipEdge {
    pub child: ColumnRef,
    pub parent: ColumnRef,
    pub origin: EdgeOrigin,
}

impl RelationshipEdge {
    fn links(&self, other: &Self) -> bool {
        self.child == other.child && self.parent == other.parent
    }
}

impl std::fmt::Display for RelationshipEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.child, self.parent)
    }
}

/// An inferred edge whose two columns are declared with different types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMismatch {
    pub edge: RelationshipEdge,
    pub child_type: String,
    pub parent_type: String,
}

impl std::fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) vs {} ({})",
            self.edge.child, self.child_type, self.edge.parent, self.parent_type
        )
    }
}

/// Columns that can act as a parent: members of single-column primary or unique keys.
pub fn parent_candidates(keys: &[KeyColumn]) -> BTreeSet<ColumnRef> {
    keys.iter()
        .filter(|key| key.key_width == 1)
        .map(|key| key.column.clone())
        .collect()
}

/// Infers child -> parent edges by exact column-name match across different tables.
pub fn infer_edges(columns: &[ColumnInfo], parents: &BTreeSet<ColumnRef>) -> Vec<RelationshipEdge> {
    let mut parents_by_name: HashMap<&str, Vec<&ColumnRef>> = HashMap::new();
    for parent in parents {
        parents_by_name
            .entry(parent.column.as_str())
            .or_default()
            .push(parent);
    }

    let mut edges = BTreeSet::new();
    for info in columns {
        let Some(matches) = parents_by_name.get(info.column.column.as_str()) else {
            continue;
        };
        for parent in matches {
            if parent.table != info.column.table {
                edges.insert(RelationshipEdge {
                    child: info.column.clone(),
                    parent: (*parent).clone(),
                    origin: EdgeOrigin::Inferred,
                });
            }
        }
    }
    edges.into_iter().collect()
}

/// Edges backed by declared foreign key constraints.
pub fn declared_edges(foreign_keys: &[ForeignKeyColumn]) -> Vec<RelationshipEdge> {
    foreign_keys
        .iter()
        .map(|fk| RelationshipEdge {
            child: fk.child.clone(),
            parent: fk.parent.clone(),
            origin: EdgeOrigin::Declared,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Inferred edges with no declared edge on the exact same column pair.
pub fn missing_foreign_keys(
    inferred: &[RelationshipEdge],
    declared: &[RelationshipEdge],
) -> Vec<RelationshipEdge> {
    inferred
        .iter()
        .filter(|edge| !declared.iter().any(|d| d.links(edge)))
        .cloned()
        .collect()
}

/// Inferred edges whose declared data types differ, compared case-insensitively.
pub fn type_mismatches(inferred: &[RelationshipEdge], columns: &[ColumnInfo]) -> Vec<TypeMismatch> {
    let types: HashMap<&ColumnRef, &str> = columns
        .iter()
        .map(|info| (&info.column, info.data_type.as_str()))
        .collect();

    inferred
        .iter()
        .filter_map(|edge| {
            let child_type = types.get(&edge.child)?;
            let parent_type = types.get(&edge.parent)?;
            (!child_type.eq_ignore_ascii_case(parent_type)).then(|| TypeMismatch {
                edge: edge.clone(),
                child_type: (*child_type).to_string(),
                parent_type: (*parent_type).to_string(),
            })
        })
        .collect()
}

/// Left-anti-join counting child rows whose non-null value has no parent row.
pub fn orphan_candidate(dialect: Dialect, edge: &RelationshipEdge) -> Candidate {
    let child_col = dialect.quote_identifier(&edge.child.column);
    let parent_col = dialect.quote_identifier(&edge.parent.column);
    let query = format!(
        "SELECT COUNT(*) AS orphan_count FROM {} c LEFT JOIN {} p ON c.{child_col} = p.{parent_col} \
         WHERE c.{child_col} IS NOT NULL AND p.{parent_col} IS NULL",
        dialect.qualified_table(&edge.child.table.schema, &edge.child.table.name),
        dialect.qualified_table(&edge.parent.table.schema, &edge.parent.table.name),
    );
    Candidate::new(edge.to_string(), query)
}

/// Table-level dependency graph (child -> parents) built from declared edges only.
pub fn dependency_graph(declared: &[RelationshipEdge]) -> BTreeMap<TableRef, BTreeSet<TableRef>> {
    let mut graph: BTreeMap<TableRef, BTreeSet<TableRef>> = BTreeMap::new();
    for edge in declared.iter().filter(|e| e.origin == EdgeOrigin::Declared) {
        graph
            .entry(edge.child.table.clone())
            .or_default()
            .insert(edge.parent.table.clone());
        graph.entry(edge.parent.table.clone()).or_default();
    }
    graph
}

/// Inferred and declared edges of one database, plus the column metadata they came from.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    pub columns: Vec<ColumnInfo>,
    pub inferred: Vec<RelationshipEdge>,
    pub declared: Vec<RelationshipEdge>,
}

impl RelationshipGraph {
    /// Reads columns, keys and foreign keys and derives both edge sets.
    pub async fn load(reader: &CatalogReader<'_>) -> Result<Self> {
        let columns = reader.columns().await?;
        let keys = reader.key_columns().await?;
        let foreign_keys = reader.foreign_keys().await?;

        let inferred = infer_edges(&columns, &parent_candidates(&keys));
        let declared = declared_edges(&foreign_keys);
        tracing::debug!(
            "Relationship graph: {} inferred edge(s), {} declared edge(s)",
            inferred.len(),
            declared.len()
        );

        Ok(Self {
            columns,
            inferred,
            declared,
        })
    }

    /// Inferred edges not backed by a declared foreign key.
    pub fn missing_foreign_keys(&self) -> Vec<RelationshipEdge> {
        missing_foreign_keys(&self.inferred, &self.declared)
    }
}
