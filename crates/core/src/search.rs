//! Listing filters and pagination.

use std::collections::HashMap;

use crate::resource::Resource;

/// Default page when `page` is absent or not a positive integer.
pub const DEFAULT_PAGE: u64 = 1;

/// Default page size when `limit` is absent or not a positive integer.
pub const DEFAULT_LIMIT: u64 = 20;

/// Resource fields a filter can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceField {
    Id,
    Sku,
    Seller,
    CampaignCode,
    ProductName,
    Brand,
    Size,
    Category,
    Subcategory,
}

impl ResourceField {
    /// Fields clients may search on through the listing query string.
    pub const SEARCHABLE: [ResourceField; 8] = [
        ResourceField::Sku,
        ResourceField::Seller,
        ResourceField::CampaignCode,
        ResourceField::ProductName,
        ResourceField::Brand,
        ResourceField::Size,
        ResourceField::Category,
        ResourceField::Subcategory,
    ];

    /// Field name as it appears in payloads, query strings, and columns.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceField::Id => "id",
            ResourceField::Sku => "sku",
            ResourceField::Seller => "seller",
            ResourceField::CampaignCode => "campaign_code",
            ResourceField::ProductName => "product_name",
            ResourceField::Brand => "brand",
            ResourceField::Size => "size",
            ResourceField::Category => "category",
            ResourceField::Subcategory => "subcategory",
        }
    }

    /// Read this field from a resource.
    pub fn value_of(self, resource: &Resource) -> &str {
        match self {
            ResourceField::Id => &resource.id,
            ResourceField::Sku => &resource.sku,
            ResourceField::Seller => &resource.seller,
            ResourceField::CampaignCode => &resource.campaign_code,
            ResourceField::ProductName => &resource.product_name,
            ResourceField::Brand => &resource.brand,
            ResourceField::Size => &resource.size,
            ResourceField::Category => &resource.category,
            ResourceField::Subcategory => &resource.subcategory,
        }
    }
}

/// How a single condition compares against a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// Whole-value equality.
    Exact(String),
    /// Case-sensitive substring.
    Contains(String),
}

impl Match {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Match::Exact(expected) => value == expected,
            Match::Contains(needle) => value.contains(needle.as_str()),
        }
    }
}

/// A conjunction of per-field conditions. The empty filter matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    conditions: Vec<(ResourceField, Match)>,
}

impl ResourceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter matching the resource with the given business id.
    pub fn by_id(id: &str) -> Self {
        Self::new().exact(ResourceField::Id, id)
    }

    pub fn exact(mut self, field: ResourceField, value: impl Into<String>) -> Self {
        self.conditions.push((field, Match::Exact(value.into())));
        self
    }

    pub fn contains(mut self, field: ResourceField, value: impl Into<String>) -> Self {
        self.conditions.push((field, Match::Contains(value.into())));
        self
    }

    pub fn conditions(&self) -> &[(ResourceField, Match)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the filter in memory.
    pub fn matches(&self, resource: &Resource) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(field.value_of(resource)))
    }
}

/// A parsed listing request: filter plus page window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub filter: ResourceFilter,
    pub page: u64,
    pub limit: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: ResourceFilter::new(),
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListQuery {
    /// Build a listing request from raw query-string parameters.
    ///
    /// Every non-empty searchable field becomes a substring condition;
    /// unknown parameters are ignored. `page` and `limit` fall back to their
    /// defaults unless they are positive integers.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let mut filter = ResourceFilter::new();
        for field in ResourceField::SEARCHABLE {
            if let Some(term) = params.get(field.as_str()).filter(|t| !t.is_empty()) {
                filter = filter.contains(field, term.as_str());
            }
        }

        Self {
            filter,
            page: positive_or(params.get("page"), DEFAULT_PAGE),
            limit: positive_or(params.get("limit"), DEFAULT_LIMIT),
        }
    }

    /// Number of matching resources to skip before the page starts.
    pub fn skip(&self) -> u64 {
        self.limit.saturating_mul(self.page.saturating_sub(1))
    }
}

fn positive_or(raw: Option<&String>, default: u64) -> u64 {
    raw.filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}
