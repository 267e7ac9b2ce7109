//! In-process catalog store
//!
//! Evaluates filter descriptors directly against records held in memory. Used for
//! local runs without a database and as the backing collection in tests.

use super::filter::{FilterAtom, FilterExpr, FilterField, FilterValue, TextField};
use super::store::{CatalogStore, FetchOptions};
use crate::models::{CatalogRecord, GeoPoint, Pharmacy};
use crate::Result;
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryCatalogStore {
    records: RwLock<Vec<CatalogRecord>>,
    pharmacies: RwLock<HashMap<Uuid, Pharmacy>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_pharmacy(&self, pharmacy: Pharmacy) {
        self.pharmacies.write().await.insert(pharmacy.id, pharmacy);
    }

    pub async fn insert_record(&self, record: CatalogRecord) {
        self.records.write().await.push(record);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn count(&self, filter: &FilterExpr) -> Result<u64> {
        let compiled = CompiledFilter::compile(filter);
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| compiled.matches(r)).count() as u64)
    }

    async fn fetch(
        &self,
        filter: &FilterExpr,
        options: &FetchOptions,
    ) -> Result<Vec<CatalogRecord>> {
        let compiled = CompiledFilter::compile(filter);
        let mut matched: Vec<CatalogRecord> = {
            let records = self.records.read().await;
            records
                .iter()
                .filter(|r| compiled.matches(r))
                .cloned()
                .collect()
        };

        let sort = options.effective_sort();
        matched.sort_by(|a, b| sort.compare(a, b));

        let skip = options
            .skip
            .map(|s| usize::try_from(s).unwrap_or(usize::MAX))
            .unwrap_or(0);
        let limit = options
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(matched.into_iter().skip(skip).take(limit).collect())
    }

    async fn owner_locations(&self, owner_ids: &[Uuid]) -> Result<HashMap<Uuid, GeoPoint>> {
        let pharmacies = self.pharmacies.read().await;
        Ok(owner_ids
            .iter()
            .filter_map(|id| {
                pharmacies
                    .get(id)
                    .and_then(|p| p.location)
                    .map(|loc| (*id, loc))
            })
            .collect())
    }

    async fn owner_exists(&self, owner_id: Uuid) -> Result<bool> {
        Ok(self.pharmacies.read().await.contains_key(&owner_id))
    }
}

/// A filter descriptor with its text predicates compiled once per query.
struct CompiledFilter(Node);

enum Node {
    All,
    Eq(FilterField, FilterValue),
    Contains(TextField, TextMatcher),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Not(Box<Node>),
}

enum TextMatcher {
    Pattern(Regex),
    /// Lowercased literal, used when the term is too large to compile.
    Literal(String),
}

impl TextMatcher {
    fn new(term: &str) -> Self {
        match RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build()
        {
            Ok(re) => Self::Pattern(re),
            Err(_) => Self::Literal(term.to_lowercase()),
        }
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self {
            Self::Pattern(re) => re.is_match(haystack),
            Self::Literal(needle) => haystack.to_lowercase().contains(needle.as_str()),
        }
    }
}

impl CompiledFilter {
    fn compile(expr: &FilterExpr) -> Self {
        Self(Self::node(expr))
    }

    fn node(expr: &FilterExpr) -> Node {
        match expr {
            FilterExpr::All => Node::All,
            FilterExpr::Atom(FilterAtom::Eq { field, value }) => Node::Eq(*field, value.clone()),
            FilterExpr::Atom(FilterAtom::Contains { field, term }) => {
                Node::Contains(*field, TextMatcher::new(term))
            }
            FilterExpr::And(a, b) => Node::And(Box::new(Self::node(a)), Box::new(Self::node(b))),
            FilterExpr::Or(a, b) => Node::Or(Box::new(Self::node(a)), Box::new(Self::node(b))),
            FilterExpr::Not(inner) => Node::Not(Box::new(Self::node(inner))),
        }
    }

    fn matches(&self, record: &CatalogRecord) -> bool {
        eval(&self.0, record)
    }
}

fn eval(node: &Node, record: &CatalogRecord) -> bool {
    match node {
        Node::All => true,
        Node::Eq(field, value) => match (field, value) {
            (FilterField::OwnerId, FilterValue::Uuid(id)) => record.owner_id == *id,
            (FilterField::IsActive, FilterValue::Bool(b)) => record.is_active == *b,
            _ => false,
        },
        Node::Contains(field, matcher) => {
            let text = match field {
                TextField::Name => record.name.as_str(),
                TextField::Description => record.description.as_deref().unwrap_or(""),
            };
            matcher.is_match(text)
        }
        Node::And(a, b) => eval(a, record) && eval(b, record),
        Node::Or(a, b) => eval(a, record) || eval(b, record),
        Node::Not(inner) => !eval(inner, record),
    }
}
