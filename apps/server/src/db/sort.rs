//! Sort specification shared by both stores and the listing request parser.

use crate::models::CatalogRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Fields a listing may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Name,
    Price,
    Quantity,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "quantity" => Some(Self::Quantity),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
            Self::Name => "name",
            Self::Price => "price",
            Self::Quantity => "quantity",
        }
    }

    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Price => "price",
            Self::Quantity => "quantity",
        }
    }

    fn compare(self, a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
        match self {
            Self::CreatedAt => a.created_at.cmp(&b.created_at),
            Self::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            Self::Name => a.name.cmp(&b.name),
            Self::Price => a.price.total_cmp(&b.price),
            Self::Quantity => a.quantity.cmp(&b.quantity),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A single-field ordering. Ties are always broken by record id (ascending)
/// so that skip/limit windows are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    #[serde(rename = "order")]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    pub fn compare(&self, a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
        let primary = self.field.compare(a, b);
        let primary = match self.direction {
            SortDirection::Ascending => primary,
            SortDirection::Descending => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    pub(crate) fn order_by_sql(&self, alias: &str) -> String {
        format!(
            "{alias}.{} {}, {alias}.id ASC",
            self.field.column(),
            self.direction.sql()
        )
    }
}

impl Default for SortSpec {
    /// Newest first.
    fn default() -> Self {
        Self::new(SortField::CreatedAt, SortDirection::Descending)
    }
}
