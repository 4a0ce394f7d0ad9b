use crate::client::ApiRequest;
use serde::Deserialize;
use std::{collections::BTreeMap, fmt, str::FromStr};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("asc"),
            Self::Desc => f.write_str("desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("invalid sort order: {other}")),
        }
    }
}

/// Search, filter, sort and page selection shared by every list view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub filters: BTreeMap<String, String>,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            filters: BTreeMap::new(),
            sort_by: None,
            sort_order: SortOrder::default(),
        }
    }
}

impl ListQuery {
    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn sort(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort_by = Some(field.into());
        self.sort_order = order;
        self
    }

    /// Query string pairs. Blank search terms and filter values (the "All" option
    /// of a dropdown) are left out.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("page".to_string(), self.page.max(1).to_string()),
            ("limit".to_string(), self.limit.max(1).to_string()),
        ];

        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search".to_string(), search.to_string()));
            }
        }

        for (key, value) in &self.filters {
            let value = value.trim();
            if !value.is_empty() && !value.eq_ignore_ascii_case("all") {
                pairs.push((key.clone(), value.to_string()));
            }
        }

        if let Some(field) = self.sort_by.as_deref().map(str::trim) {
            if !field.is_empty() {
                pairs.push(("sortBy".to_string(), field.to_string()));
                pairs.push(("sortOrder".to_string(), self.sort_order.to_string()));
            }
        }

        pairs
    }

    /// GET request for `path` carrying this query.
    #[must_use]
    pub fn request(&self, path: &str) -> ApiRequest {
        ApiRequest::get(path).query(self.to_pairs())
    }
}

/// Pagination block found next to list data.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default, alias = "currentPage")]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default, alias = "totalCount", alias = "totalItems")]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

impl PageMeta {
    /// Page count, computed from `total`/`limit` when the backend omits it.
    #[must_use]
    pub fn page_count(&self) -> Option<u32> {
        self.total_pages.or_else(|| {
            let total = self.total?;
            let limit = self.limit?;
            Some(total_pages(total, limit))
        })
    }

    /// Looks for pagination data in a list payload (`data.pagination`,
    /// `pagination`, or the fields directly on `data`).
    #[must_use]
    pub fn find(body: &serde_json::Value) -> Option<Self> {
        let candidates = [
            body.pointer("/data/pagination"),
            body.get("pagination"),
            body.get("data"),
        ];

        candidates
            .into_iter()
            .flatten()
            .filter(|value| value.is_object())
            .filter_map(|value| serde_json::from_value::<Self>(value.clone()).ok())
            .find(|meta| meta.page_count().is_some())
    }
}

/// Number of pages needed for `total` rows at `limit` rows per page.
#[must_use]
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return 0;
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}
