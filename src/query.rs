//! List query contract shared by every resource screen.
//!
//! A screen keeps one [`ListQuery`] (filters, page, sort), turns it into a
//! [`SearchRequest`] for `POST /{collection}/search`, and decodes the answer
//! into a [`SearchPage`] through the endpoint's [`PageShape`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// The single active sort column.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    #[serde(rename = "sortBy")]
    pub field: String,
    #[serde(rename = "sortOrder")]
    pub order: SortOrder,
}

impl Sort {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Same field flips the order; a different field starts ascending.
    pub fn toggle(&mut self, field: &str) {
        if self.field == field {
            self.order = self.order.flipped();
        } else {
            self.field = field.to_owned();
            self.order = SortOrder::Asc;
        }
    }
}

/// Body of `POST /{collection}/search`.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<F> {
    #[serde(flatten)]
    pub filters: F,
    pub page_number: u32,
    pub page_size: u32,
    #[serde(flatten)]
    pub sort: Option<Sort>,
}

impl<F> SearchRequest<F> {
    pub fn validate(&self) -> ConsoleResult<()> {
        if self.page_number == 0 {
            return Err(ConsoleError::Validation(
                "page number starts at 1".to_owned(),
            ));
        }
        if self.page_size == 0 {
            return Err(ConsoleError::Validation(
                "page size must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Per-screen query state.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery<F> {
    filters: F,
    page_number: u32,
    page_size: u32,
    sort: Option<Sort>,
}

impl<F: Clone> ListQuery<F> {
    pub fn new(filters: F, page_size: u32, sort: Option<Sort>) -> Self {
        Self {
            filters,
            page_number: 1,
            page_size: page_size.max(1),
            sort,
        }
    }

    pub fn filters(&self) -> &F {
        &self.filters
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// A fresh filter is always viewed from the first page.
    pub fn set_filters(&mut self, filters: F) {
        self.filters = filters;
        self.page_number = 1;
    }

    /// Moves to `page`, keeping filters and sort.
    pub fn go_to_page(&mut self, page: u32) -> ConsoleResult<()> {
        if page == 0 {
            return Err(ConsoleError::Validation(
                "page number starts at 1".to_owned(),
            ));
        }
        self.page_number = page;
        Ok(())
    }

    pub fn toggle_sort(&mut self, field: &str) {
        match self.sort.as_mut() {
            Some(sort) => sort.toggle(field),
            None => self.sort = Some(Sort::new(field, SortOrder::Asc)),
        }
    }

    pub fn set_sort(&mut self, sort: Sort) {
        self.sort = Some(sort);
    }

    pub fn request(&self) -> SearchRequest<F> {
        SearchRequest {
            filters: self.filters.clone(),
            page_number: self.page_number,
            page_size: self.page_size,
            sort: self.sort.clone(),
        }
    }
}

/// One page of a search.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

impl<T> SearchPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }

    pub fn page_count(&self, page_size: u32) -> u32 {
        page_count(self.total_count, page_size)
    }
}

/// `ceil(total_count / page_size)`; zero when there is nothing to page.
pub fn page_count(total_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_count.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Where an endpoint puts its page and its total. Keys are tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageShape {
    pub items_keys: &'static [&'static str],
    pub count_keys: &'static [&'static str],
}

pub const DEFAULT_PAGE_SHAPE: PageShape = PageShape {
    items_keys: &["items", "Items"],
    count_keys: &["totalCount", "TotalCount"],
};

impl PageShape {
    /// Decodes a search response. A missing collection is an empty page and a
    /// missing count is zero; only records that fail to deserialize are errors.
    pub fn decode<T: DeserializeOwned>(&self, body: Value) -> ConsoleResult<SearchPage<T>> {
        let mut object = match body {
            Value::Object(object) => object,
            Value::Array(items) => {
                let total_count = items.len() as u64;
                return Ok(SearchPage {
                    items: decode_items(items)?,
                    total_count,
                });
            }
            _ => return Ok(SearchPage::empty()),
        };

        let items = self
            .items_keys
            .iter()
            .find_map(|key| match object.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default();
        let total_count = self
            .count_keys
            .iter()
            .find_map(|key| object.get(*key).and_then(count_from_value))
            .unwrap_or(0);

        Ok(SearchPage {
            items: decode_items(items)?,
            total_count,
        })
    }
}

fn decode_items<T: DeserializeOwned>(items: Vec<Value>) -> ConsoleResult<Vec<T>> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(ConsoleError::from))
        .collect()
}

/// Reads a non-negative count from a number, a numeric string, or an object
/// carrying `count`/`Count`.
pub fn count_from_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(text) => text.trim().parse().ok(),
        Value::Object(object) => ["count", "Count"]
            .iter()
            .find_map(|key| object.get(*key).and_then(count_from_value)),
        _ => None,
    }
}

/// Text input to filter value: blank means "no constraint".
pub fn text_filter(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Numeric text input to filter value: blank or non-numeric means "no constraint".
pub fn numeric_filter(input: &str) -> Option<i64> {
    input.trim().parse().ok()
}

/// `serialize_with` for optional text filters so a blank string can never
/// reach the backend as a literal match.
pub fn blank_as_null<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => serializer.serialize_some(text),
        _ => serializer.serialize_none(),
    }
}
