//! Document Query Engine: composes the visibility scope with search filters, ordering and
//! pagination into one query that every storage backend evaluates the same way.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::access::{Requester, VisibilityScope};
use crate::database::models::{Document, DocumentType};
use crate::filter::FilterData;

/// Newest upload first, identifier descending on ties.
pub const DOCUMENT_ORDER: &str = "upload_date desc, id desc";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    #[error("page must be at least 1, got {0}")]
    InvalidPage(i64),

    #[error("limit must be between 1 and {max}, got {limit}")]
    InvalidLimit { limit: i64, max: i64 },

    #[error("date_from {from} is after date_to {to}")]
    InvalidDateRange { from: DateTime<Utc>, to: DateTime<Utc> },
}

/// Search request as accepted from callers. Every filter is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentSearch {
    /// Case-insensitive substring over title, description and tags.
    pub q: Option<String>,
    pub opd_id: Option<i64>,
    pub document_type: Option<DocumentType>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring over tags only.
    pub tags: Option<String>,
    #[serde(default)]
    pub include_private: bool,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// One-based.
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: i64, limit: i64, max_limit: i64) -> Result<Self, QueryError> {
        if page < 1 {
            return Err(QueryError::InvalidPage(page));
        }
        if limit < 1 || limit > max_limit {
            return Err(QueryError::InvalidLimit { limit, max: max_limit });
        }
        // The row offset must fit in an i64 OFFSET
        if (page - 1).checked_mul(limit).is_none() {
            return Err(QueryError::InvalidPage(page));
        }
        Ok(Self { page, limit })
    }

    /// Rows skipped before this page. Saturates for windows not built through [`Page::new`].
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).max(0).saturating_mul(self.limit.max(0))
    }
}

/// One page of results plus the total match count independent of the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Fully composed document query. All active conditions combine with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub scope: VisibilityScope,
    pub text: Option<String>,
    pub opd_id: Option<i64>,
    pub document_type: Option<DocumentType>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub tags: Option<String>,
    pub page: Option<Page>,
}

impl DocumentQuery {
    /// Unpaged listing of everything inside the requester's scope.
    pub fn listing(requester: &Requester, include_private: bool) -> Self {
        Self {
            scope: VisibilityScope::for_requester(requester, include_private),
            text: None,
            opd_id: None,
            document_type: None,
            date_from: None,
            date_to: None,
            tags: None,
            page: None,
        }
    }

    pub fn search(
        requester: &Requester,
        search: &DocumentSearch,
        default_limit: i64,
        max_limit: i64,
    ) -> Result<Self, QueryError> {
        let page = Page::new(search.page.unwrap_or(1), search.limit.unwrap_or(default_limit), max_limit)?;
        if let (Some(from), Some(to)) = (search.date_from, search.date_to) {
            if from > to {
                return Err(QueryError::InvalidDateRange { from, to });
            }
        }
        Ok(Self {
            text: non_blank(search.q.as_deref()),
            opd_id: search.opd_id,
            document_type: search.document_type,
            date_from: search.date_from,
            date_to: search.date_to,
            tags: non_blank(search.tags.as_deref()),
            page: Some(page),
            ..Self::listing(requester, search.include_private)
        })
    }

    /// Render for the SQL backend through the filter DSL.
    pub fn to_filter_data(&self) -> FilterData {
        let mut conditions: Vec<Value> = Vec::new();

        if let Some(scope) = self.scope.to_where() {
            conditions.push(scope);
        }
        if let Some(text) = &self.text {
            let pattern = like_pattern(text);
            conditions.push(json!({
                "$or": [
                    { "title": { "$ilike": pattern } },
                    { "description": { "$ilike": pattern } },
                    { "tags": { "$ilike": pattern } }
                ]
            }));
        }
        if let Some(opd_id) = self.opd_id {
            conditions.push(json!({ "opd_id": opd_id }));
        }
        if let Some(document_type) = self.document_type {
            conditions.push(json!({ "document_type": document_type.as_str() }));
        }
        if let Some(from) = self.date_from {
            conditions.push(json!({ "upload_date": { "$gte": timestamp(from) } }));
        }
        if let Some(to) = self.date_to {
            conditions.push(json!({ "upload_date": { "$lte": timestamp(to) } }));
        }
        if let Some(tags) = &self.tags {
            conditions.push(json!({ "tags": { "$ilike": like_pattern(tags) } }));
        }

        FilterData {
            select: None,
            where_clause: if conditions.is_empty() { None } else { Some(json!({ "$and": conditions })) },
            order: Some(Value::String(DOCUMENT_ORDER.to_string())),
            limit: self.page.map(|p| p.limit),
            offset: self.page.map(|p| p.offset()),
        }
    }

    /// In-process evaluation with the same semantics as [`to_filter_data`](Self::to_filter_data).
    pub fn matches(&self, document: &Document) -> bool {
        if !self.scope.admits(document) {
            return false;
        }
        if let Some(text) = &self.text {
            let found = contains_ci(Some(&document.title), text)
                || contains_ci(document.description.as_deref(), text)
                || contains_ci(document.tags.as_deref(), text);
            if !found {
                return false;
            }
        }
        if self.opd_id.is_some_and(|id| id != document.opd_id) {
            return false;
        }
        if self.document_type.is_some_and(|t| t != document.document_type) {
            return false;
        }
        if self.date_from.is_some_and(|from| document.upload_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| document.upload_date > to) {
            return false;
        }
        if let Some(tags) = &self.tags {
            if !contains_ci(document.tags.as_deref(), tags) {
                return false;
            }
        }
        true
    }

    /// Order matching documents and cut the page window. Returns the window and the full count.
    pub fn paginate(&self, mut matching: Vec<Document>) -> (Vec<Document>, i64) {
        matching.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then_with(|| b.id.cmp(&a.id)));
        let total = matching.len() as i64;
        let items = match self.page {
            Some(page) => matching
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.limit as usize)
                .collect(),
            None => matching,
        };
        (items, total)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `%needle%` with LIKE metacharacters escaped so they match literally.
fn like_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}
