//! Filter descriptors over catalog records.
//!
//! A [`FilterExpr`] is a plain value: it can be read back, combined with AND/OR/NOT,
//! rendered to SQL, or evaluated in memory. Both count and fetch operations of a
//! store consume the same descriptor, so a total can always be recomputed from it.

use super::bind::{push_bind, BindValue};
use uuid::Uuid;

/// Fields that support exact-match predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    OwnerId,
    IsActive,
}

impl FilterField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::OwnerId => "pharmacy_id",
            Self::IsActive => "is_active",
        }
    }
}

/// Free-text fields searched by substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Description,
}

impl TextField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "name" => Some(Self::Name),
            "description" => Some(Self::Description),
            _ => None,
        }
    }

    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Bool(bool),
    Uuid(Uuid),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterAtom {
    Eq {
        field: FilterField,
        value: FilterValue,
    },
    /// Case-insensitive substring match. `term` is literal text, never a pattern.
    Contains { field: TextField, term: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// Matches every record.
    All,
    Atom(FilterAtom),
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    pub fn eq(field: FilterField, value: FilterValue) -> Self {
        Self::Atom(FilterAtom::Eq { field, value })
    }

    pub fn contains(field: TextField, term: impl Into<String>) -> Self {
        Self::Atom(FilterAtom::Contains {
            field,
            term: term.into(),
        })
    }

    /// Records visible in the public catalog.
    pub fn active() -> Self {
        Self::eq(FilterField::IsActive, FilterValue::Bool(true))
    }

    /// Active records offered by one pharmacy.
    pub fn owned_by(owner_id: Uuid) -> Self {
        Self::active().and(Self::eq(FilterField::OwnerId, FilterValue::Uuid(owner_id)))
    }

    pub fn and(self, other: FilterExpr) -> Self {
        match (self, other) {
            (Self::All, e) | (e, Self::All) => e,
            (a, b) => Self::And(Box::new(a), Box::new(b)),
        }
    }

    pub fn or(self, other: FilterExpr) -> Self {
        match (self, other) {
            (Self::All, _) | (_, Self::All) => Self::All,
            (a, b) => Self::Or(Box::new(a), Box::new(b)),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Render a SQL boolean expression against the table aliased as `alias`.
    pub(crate) fn build_sql(&self, bind_params: &mut Vec<BindValue>, alias: &str) -> String {
        match self {
            Self::All => "TRUE".to_string(),
            Self::Atom(atom) => atom.build_sql(bind_params, alias),
            Self::And(a, b) => format!(
                "({} AND {})",
                a.build_sql(bind_params, alias),
                b.build_sql(bind_params, alias)
            ),
            Self::Or(a, b) => format!(
                "({} OR {})",
                a.build_sql(bind_params, alias),
                b.build_sql(bind_params, alias)
            ),
            Self::Not(inner) => format!("NOT ({})", inner.build_sql(bind_params, alias)),
        }
    }
}

impl FilterAtom {
    fn build_sql(&self, bind_params: &mut Vec<BindValue>, alias: &str) -> String {
        match self {
            Self::Eq { field, value } => {
                let bind = match value {
                    FilterValue::Bool(b) => BindValue::Bool(*b),
                    FilterValue::Uuid(u) => BindValue::Uuid(*u),
                };
                let idx = push_bind(bind_params, bind);
                format!("{alias}.{} = ${idx}", field.column())
            }
            Self::Contains { field, term } => {
                let pattern = format!("%{}%", escape_like_pattern(term));
                let idx = push_bind(bind_params, BindValue::Text(pattern));
                format!(
                    "COALESCE({alias}.{}, '') ILIKE ${idx} ESCAPE E'\\\\'",
                    field.column()
                )
            }
        }
    }
}

/// Merge a base filter with an optional free-text search over `fields`.
///
/// Blank or whitespace-only terms leave `base` untouched. Otherwise the result is
/// `base AND (field_1 CONTAINS term OR field_2 CONTAINS term ...)`.
pub fn compose(base: FilterExpr, search: Option<&str>, fields: &[TextField]) -> FilterExpr {
    let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) else {
        return base;
    };

    let mut fields = fields.iter();
    let Some(first) = fields.next() else {
        return base;
    };

    let predicate = fields.fold(FilterExpr::contains(*first, term), |acc, field| {
        FilterExpr::Or(
            Box::new(acc),
            Box::new(FilterExpr::contains(*field, term)),
        )
    });

    base.and(predicate)
}

fn escape_like_pattern(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
