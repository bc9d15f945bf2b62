//! Filter/sort parsing and evaluation over in-memory documents.
//!
//! Parsing happens entirely before evaluation: a [`Query`] only exists once
//! every filter triple and sort key has been validated.

pub mod field;
pub mod filter;
pub mod sort;

pub use field::{DocumentField, FieldValue};
pub use filter::{apply_filters, parse_filter, parse_filters, FilterOperator, FilterSpec, FilterValue};
pub use sort::{apply_sort, parse_sort, SortDirection, SortSpec};

use crate::error::ValidationError;
use crate::types::Document;

/// A validated filter + sort combination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filters: Vec<FilterSpec>,
    pub sort: Vec<SortSpec>,
}

impl Query {
    /// Parse the optional filter and sort expressions. Filters are validated
    /// first, then sort keys; the first problem found is returned.
    pub fn parse(filter: Option<&str>, sort: Option<&str>) -> Result<Self, ValidationError> {
        let filters = filter.map(parse_filters).transpose()?.unwrap_or_default();
        let sort = sort.map(parse_sort).transpose()?.unwrap_or_default();
        Ok(Query { filters, sort })
    }

    /// Filter, then stable-sort.
    pub fn apply(&self, docs: Vec<Document>) -> Vec<Document> {
        let mut out = apply_filters(docs, &self.filters);
        apply_sort(&mut out, &self.sort);
        out
    }
}
