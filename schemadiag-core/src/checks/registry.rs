//! The check catalog.
//!
//! A registry is an ordered, immutable list of checks built once by an
//! explicit factory. [`CheckRegistry::standard`] is the built-in catalog;
//! tests build their own with [`CheckRegistry::from_checks`].

use super::*;
use std::sync::Arc;

/// Ordered, immutable collection of checks.
#[derive(Clone)]
pub struct CheckRegistry {
    checks: Vec<Arc<dyn Check>>,
}

impl CheckRegistry {
    /// Builds a registry from an explicit list, keeping its order.
    pub fn from_checks(checks: Vec<Arc<dyn Check>>) -> Self {
        Self { checks }
    }

    /// The built-in catalog, ordered by check id.
    pub fn standard() -> Self {
        Self::from_checks(vec![
            Arc::new(MissingPrimaryKeys::new()),
            Arc::new(ExtremeNullableRatio::new()),
            Arc::new(SuspectedJunctionMissingKey::new()),
            Arc::new(MissingUniqueConstraints::new()),
            Arc::new(MissingForeignKeys::new()),
            Arc::new(OrphanRecords::new()),
            Arc::new(ForeignKeyTypeMismatch::new()),
            Arc::new(MoneyStoredAsFloat::new()),
            Arc::new(UnusedIndexes::new()),
            Arc::new(Fragmentation::new()),
            Arc::new(SchemaSummary::new()),
            Arc::new(DuplicateRecords::new()),
            Arc::new(CompositePrimaryKeyReview::new()),
            Arc::new(ForeignKeyTargetNotUnique::new()),
            Arc::new(NullableForeignKeyColumns::new()),
            Arc::new(CircularForeignKeys::new()),
            Arc::new(PolymorphicRelationship::new()),
            Arc::new(InconsistentFormats::new()),
        ])
    }

    /// Every check, in construction order.
    pub fn all(&self) -> &[Arc<dyn Check>] {
        &self.checks
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Distinct category names, compared and sorted case-insensitively.
    /// The first spelling seen wins.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = Vec::new();
        for check in &self.checks {
            let name = &check.info().category;
            if !categories.iter().any(|c| c.eq_ignore_ascii_case(name)) {
                categories.push(name.clone());
            }
        }
        categories.sort_by_key(|c| c.to_lowercase());
        categories
    }

    /// Checks to run for an optional category filter.
    ///
    /// No filter (or a blank one) selects everything. Otherwise the checks
    /// whose category matches case-insensitively are selected, together
    /// with every Schema Overview check.
    pub fn select(&self, filter: Option<&str>) -> Vec<Arc<dyn Check>> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        self.checks
            .iter()
            .filter(|check| {
                let category = &check.info().category;
                filter.is_none_or(|f| {
                    category.eq_ignore_ascii_case(f)
                        || category.eq_ignore_ascii_case(category::SCHEMA_OVERVIEW)
                })
            })
            .cloned()
            .collect()
    }
}

impl std::fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.checks.iter().map(|check| &check.info().code))
            .finish()
    }
}
