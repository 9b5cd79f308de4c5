//! Human-facing copy keyed by check code.
//!
//! Plain static data: a display title and an explanation triple (what's
//! wrong, why it matters, what to do next) per stable check code, plus
//! display names for categories and statuses. Codes are matched
//! case-insensitively; unknown codes resolve to [`FALLBACK`].

use crate::models::CheckStatus;
use serde::{Deserialize, Serialize};

/// Explanation attached to a non-passing report entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
    pub whats_wrong: String,
    pub why_it_matters: String,
    pub what_to_do_next: String,
}

/// Copy for one check code. `whats_wrong` may contain a `{count}` placeholder.
#[derive(Debug, Clone, Copy)]
pub struct GlossaryEntry {
    pub code: &'static str,
    pub title: &'static str,
    pub whats_wrong: &'static str,
    pub why_it_matters: &'static str,
    pub what_to_do_next: &'static str,
}

/// Used for codes with no entry.
pub static FALLBACK: GlossaryEntry = GlossaryEntry {
    code: "",
    title: "Check",
    whats_wrong: "See message below",
    why_it_matters: "The check reported a condition that needs a closer look.",
    what_to_do_next: "Review the details and fix as needed",
};

pub static ENTRIES: &[GlossaryEntry] = &[
    GlossaryEntry {
        code: "MISSING_PK",
        title: "Tables without primary keys",
        whats_wrong: "Found {count} table(s) with no primary key",
        why_it_matters: "Updates and deletes can't target rows reliably; tools and ORMs expect a key.",
        what_to_do_next: "Add a primary key to each table listed in Details.",
    },
    GlossaryEntry {
        code: "EXTREME_NULLABLE_RATIO",
        title: "Tables with many nullable columns",
        whats_wrong: "Found {count} table(s) with >50% nullable columns",
        why_it_matters: "Too many nulls can make queries and reporting harder and suggest missing design clarity.",
        what_to_do_next: "Review table design; make columns NOT NULL where a value is always required.",
    },
    GlossaryEntry {
        code: "JUNCTION_MISSING_KEY",
        title: "Junction tables without composite key",
        whats_wrong: "Found {count} suspected junction table(s) without composite key",
        why_it_matters: "Duplicate links can appear and complicate joins.",
        what_to_do_next: "Add a composite primary key (or unique constraint) on the two FK columns.",
    },
    GlossaryEntry {
        code: "MISSING_UNIQUE_CONSTRAINTS",
        title: "Business identifier columns without unique constraint",
        whats_wrong: "Found {count} column(s) that look like Email/Sku without unique constraint",
        why_it_matters: "Duplicates can creep in and break business rules.",
        what_to_do_next: "Add unique constraints (or unique indexes) for the columns in Details.",
    },
    GlossaryEntry {
        code: "MISSING_FOREIGN_KEYS",
        title: "Relationships without foreign key",
        whats_wrong: "Found {count} relationship(s) without a foreign key",
        why_it_matters: "Without FKs, the database won't enforce referential integrity and deletes can leave orphaned or inconsistent data.",
        what_to_do_next: "Add foreign keys for the pairs listed in Details, or document why they're intentional.",
    },
    GlossaryEntry {
        code: "ORPHAN_RECORDS",
        title: "Orphaned rows (child without parent)",
        whats_wrong: "Found {count} orphaned record set(s)",
        why_it_matters: "Child rows point to missing parents; this can break reports and joins.",
        what_to_do_next: "Fix or delete the orphan rows, then add or fix foreign keys so it doesn't happen again.",
    },
    GlossaryEntry {
        code: "FK_TYPE_MISMATCH",
        title: "Foreign key type mismatches",
        whats_wrong: "Found {count} FK/column type mismatch(es)",
        why_it_matters: "Type mismatches can cause subtle bugs and poor index use.",
        what_to_do_next: "Align types between referenced and referencing columns (see Details).",
    },
    GlossaryEntry {
        code: "MONEY_AS_FLOAT",
        title: "Monetary or amount columns using approximate numeric type (float/real)",
        whats_wrong: "Found {count} column(s) that look like money but use float/real",
        why_it_matters: "Float can cause rounding errors in money; use decimal for currency.",
        what_to_do_next: "Change those columns to decimal in Details, or document why float is acceptable.",
    },
    GlossaryEntry {
        code: "UNUSED_INDEXES",
        title: "Unused indexes",
        whats_wrong: "Found {count} unused index(es)",
        why_it_matters: "Unused indexes slow writes and use storage without helping reads.",
        what_to_do_next: "Review in Details; drop if truly unused, or keep if for rare critical queries.",
    },
    GlossaryEntry {
        code: "FRAGMENTATION",
        title: "Fragmented indexes",
        whats_wrong: "Found {count} fragmented index(es)",
        why_it_matters: "Fragmentation can slow down queries and waste I/O.",
        what_to_do_next: "Review the list in Details; rebuild or reorganize indexes during a maintenance window.",
    },
    GlossaryEntry {
        code: "SCHEMA_SUMMARY",
        title: "Database summary",
        whats_wrong: "The database summary could not be collected",
        why_it_matters: "Without catalog access the other checks are likely to fail as well.",
        what_to_do_next: "Verify the account can read the catalog views, then run the scan again.",
    },
    GlossaryEntry {
        code: "DUPLICATE_RECORDS",
        title: "Duplicate values in candidate key or business identifier columns",
        whats_wrong: "Found duplicate values in {count} column(s)",
        why_it_matters: "Duplicated identifiers make lookups ambiguous and block adding a unique constraint later.",
        what_to_do_next: "Merge or remove the duplicates listed in Details, then add a unique constraint.",
    },
    GlossaryEntry {
        code: "COMPOSITE_PK_REVIEW",
        title: "Tables with composite primary keys",
        whats_wrong: "Found {count} table(s) with a composite primary key",
        why_it_matters: "Wide keys are repeated in every referencing table and are awkward for ORMs and APIs.",
        what_to_do_next: "Confirm each composite key is intended; consider a surrogate key plus a unique constraint.",
    },
    GlossaryEntry {
        code: "FK_TARGET_NOT_UNIQUE",
        title: "Foreign keys referencing non-unique columns",
        whats_wrong: "Found {count} foreign key(s) referencing a non-unique column",
        why_it_matters: "A child row can match several parents, so the relationship is ambiguous.",
        what_to_do_next: "Point the foreign key at a primary key or add a unique constraint on the target column.",
    },
    GlossaryEntry {
        code: "NULLABLE_FK_COLUMNS",
        title: "Nullable foreign key columns",
        whats_wrong: "Found {count} nullable foreign key column(s)",
        why_it_matters: "Rows can exist without their parent, which may not match the business rule.",
        what_to_do_next: "Make the columns NOT NULL where the relationship is mandatory.",
    },
    GlossaryEntry {
        code: "CIRCULAR_FK",
        title: "Circular foreign key dependencies",
        whats_wrong: "Found {count} table(s) in circular foreign key chains",
        why_it_matters: "Cycles complicate inserts, deletes and data loads because no table can go first.",
        what_to_do_next: "Break the cycle with a nullable or deferred foreign key, or redesign the relationship.",
    },
    GlossaryEntry {
        code: "POLYMORPHIC_RELATIONSHIP",
        title: "Polymorphic reference columns (type + id) without foreign key",
        whats_wrong: "Found {count} polymorphic type + id pair(s) without a foreign key",
        why_it_matters: "The database cannot check that the referenced row exists.",
        what_to_do_next: "Use one foreign key column per target table, or validate the references in the application.",
    },
    GlossaryEntry {
        code: "INCONSISTENT_FORMATS",
        title: "Inconsistent formats (casing, whitespace) in status-like columns",
        whats_wrong: "Found {count} format issue(s) in status-like columns",
        why_it_matters: "Values that differ only by case or spaces split reports and break equality filters.",
        what_to_do_next: "Normalize the stored values, then add a check constraint or lookup table.",
    },
];

fn find(code: &str) -> Option<&'static GlossaryEntry> {
    let code = code.trim();
    ENTRIES
        .iter()
        .find(|entry| entry.code.eq_ignore_ascii_case(code))
}

/// Glossary entry for a code, or [`FALLBACK`].
pub fn entry(code: &str) -> &'static GlossaryEntry {
    find(code).unwrap_or(&FALLBACK)
}

/// Explanation triple with `{count}` replaced by `item_count`.
pub fn explain(code: &str, item_count: usize) -> Explanation {
    let entry = entry(code);
    Explanation {
        whats_wrong: entry.whats_wrong.replace("{count}", &item_count.to_string()),
        why_it_matters: entry.why_it_matters.to_string(),
        what_to_do_next: entry.what_to_do_next.to_string(),
    }
}

/// Display title for a code, falling back to the check name.
pub fn check_title(code: &str, fallback: &str) -> String {
    match find(code) {
        Some(entry) => entry.title.to_string(),
        None if fallback.trim().is_empty() => FALLBACK.title.to_string(),
        None => fallback.to_string(),
    }
}

/// Display name for a category; unknown names are returned unchanged.
pub fn category_display_name(category: &str) -> String {
    const NAMES: &[(&str, &str)] = &[
        ("Keys & Constraints", "Primary keys, unique & check constraints"),
        ("Schema & Structure", "Table structure & design"),
        ("Referential Integrity", "Relationships & foreign keys"),
        ("Data Type Consistency", "Data types & consistency"),
        ("Index Health", "Index usage & maintenance"),
        ("Schema Overview", "Database overview"),
        ("Data Quality", "Data quality & duplicates"),
    ];
    if category.trim().is_empty() {
        return super::UNCATEGORIZED.to_string();
    }
    NAMES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(category))
        .map_or_else(|| category.to_string(), |(_, display)| (*display).to_string())
}

/// Display label for a status.
pub fn status_display_name(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "All checks passed",
        CheckStatus::Warning => "Issues found",
        CheckStatus::Fail => "System unable to detect or unsuccessful",
    }
}
