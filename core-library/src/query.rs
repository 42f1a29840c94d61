//! Declarative capture predicates and browsing queries.
//!
//! The sync engine expresses every store access as a [`CapturePredicate`]
//! (identifier membership, boolean flags) rather than arbitrary code, so the
//! same predicate can be lowered to SQL by the SQLite repository or evaluated
//! in memory with [`CapturePredicate::matches`].
//!
//! [`CaptureQuery`] layers the browsing options hosts need on top: a filter
//! (all, photos, videos, favorites), a sort key, an order and an optional
//! limit.

use crate::models::{CaptureId, CaptureRecord};
use bridge_traits::media::MediaKind;
use serde::{Deserialize, Serialize};

// ============================================================================
// Predicates
// ============================================================================

/// Filter over capture record attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturePredicate {
    /// Every record.
    All,
    IdEquals(CaptureId),
    IdIn(Vec<CaptureId>),
    IdNotIn(Vec<CaptureId>),
    KindIs(MediaKind),
    IsFavorite(bool),
    LocallyDownloaded(bool),
    /// Conjunction; an empty list matches everything.
    And(Vec<CapturePredicate>),
}

impl CapturePredicate {
    /// Combine two predicates with AND, flattening nested conjunctions.
    pub fn and(self, other: CapturePredicate) -> CapturePredicate {
        match (self, other) {
            (CapturePredicate::All, p) | (p, CapturePredicate::All) => p,
            (CapturePredicate::And(mut left), CapturePredicate::And(right)) => {
                left.extend(right);
                CapturePredicate::And(left)
            }
            (CapturePredicate::And(mut left), p) => {
                left.push(p);
                CapturePredicate::And(left)
            }
            (p, CapturePredicate::And(mut right)) => {
                right.insert(0, p);
                CapturePredicate::And(right)
            }
            (left, right) => CapturePredicate::And(vec![left, right]),
        }
    }

    /// Evaluate the predicate against an in-memory record.
    pub fn matches(&self, record: &CaptureRecord) -> bool {
        match self {
            CapturePredicate::All => true,
            CapturePredicate::IdEquals(id) => record.id == *id,
            CapturePredicate::IdIn(ids) => ids.contains(&record.id),
            CapturePredicate::IdNotIn(ids) => !ids.contains(&record.id),
            CapturePredicate::KindIs(kind) => record.kind == *kind,
            CapturePredicate::IsFavorite(flag) => record.is_favorite == *flag,
            CapturePredicate::LocallyDownloaded(flag) => record.locally_downloaded == *flag,
            CapturePredicate::And(parts) => parts.iter().all(|p| p.matches(record)),
        }
    }

    /// Lower the predicate into a SQL condition plus bind values.
    ///
    /// Identifier sets are bound as a single JSON array and expanded with
    /// `json_each`, which keeps the statement within SQLite's variable limit
    /// regardless of set size.
    pub(crate) fn to_sql(&self) -> SqlCondition {
        let mut binds = Vec::new();
        let clause = self.write_sql(&mut binds);
        SqlCondition { clause, binds }
    }

    fn write_sql(&self, binds: &mut Vec<BindValue>) -> String {
        match self {
            CapturePredicate::All => "1 = 1".to_string(),
            CapturePredicate::IdEquals(id) => {
                binds.push(BindValue::Text(id.to_string()));
                "id = ?".to_string()
            }
            CapturePredicate::IdIn(ids) => {
                if ids.is_empty() {
                    return "0 = 1".to_string();
                }
                binds.push(BindValue::Text(ids_as_json(ids)));
                "id IN (SELECT value FROM json_each(?))".to_string()
            }
            CapturePredicate::IdNotIn(ids) => {
                if ids.is_empty() {
                    return "1 = 1".to_string();
                }
                binds.push(BindValue::Text(ids_as_json(ids)));
                "id NOT IN (SELECT value FROM json_each(?))".to_string()
            }
            CapturePredicate::KindIs(kind) => {
                binds.push(BindValue::Text(kind.as_str().to_string()));
                "kind = ?".to_string()
            }
            CapturePredicate::IsFavorite(flag) => {
                binds.push(BindValue::I64(i64::from(*flag)));
                "is_favorite = ?".to_string()
            }
            CapturePredicate::LocallyDownloaded(flag) => {
                binds.push(BindValue::I64(i64::from(*flag)));
                "locally_downloaded = ?".to_string()
            }
            CapturePredicate::And(parts) => {
                if parts.is_empty() {
                    return "1 = 1".to_string();
                }
                let conditions: Vec<String> = parts.iter().map(|p| p.write_sql(binds)).collect();
                format!("({})", conditions.join(" AND "))
            }
        }
    }
}

fn ids_as_json(ids: &[CaptureId]) -> String {
    let values: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    serde_json::Value::from(values).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BindValue {
    Text(String),
    I64(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SqlCondition {
    pub clause: String,
    pub binds: Vec<BindValue>,
}

// ============================================================================
// Browsing Queries
// ============================================================================

/// High-level capture filter offered to hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CaptureFilter {
    #[default]
    All,
    Photos,
    Videos,
    Favorites,
}

impl CaptureFilter {
    pub fn predicate(&self) -> CapturePredicate {
        match self {
            CaptureFilter::All => CapturePredicate::All,
            CaptureFilter::Photos => CapturePredicate::KindIs(MediaKind::Photo),
            CaptureFilter::Videos => CapturePredicate::KindIs(MediaKind::Video),
            CaptureFilter::Favorites => CapturePredicate::IsFavorite(true),
        }
    }
}

/// Sort key for capture queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CaptureSort {
    #[default]
    CreatedAt,
    ModifiedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Browsing query: filter, sort and optional limit. Defaults to every
/// capture, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CaptureQuery {
    pub filter: CaptureFilter,
    pub sort: CaptureSort,
    pub order: SortOrder,
    pub limit: Option<u32>,
}

impl CaptureQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest captures first, capped at `limit`.
    pub fn recent(limit: u32) -> Self {
        Self::default().with_limit(limit)
    }

    pub fn with_filter(mut self, filter: CaptureFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: CaptureSort, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(crate) fn order_by_sql(&self) -> &'static str {
        match (self.sort, self.order) {
            (CaptureSort::CreatedAt, SortOrder::Descending) => "created_at DESC, id ASC",
            (CaptureSort::CreatedAt, SortOrder::Ascending) => "created_at ASC, id ASC",
            (CaptureSort::ModifiedAt, SortOrder::Descending) => "modified_at DESC, id ASC",
            (CaptureSort::ModifiedAt, SortOrder::Ascending) => "modified_at ASC, id ASC",
        }
    }
}
