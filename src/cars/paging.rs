use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{dto::ListParams, repo_types::Car};
use crate::error::FieldError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Make,
    Model,
    Year,
    PriceEur,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering of a listing page. Ties always break on `id ASC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: Direction,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            direction: Direction::Asc,
        }
    }
}

impl Sort {
    /// Parses `property[,asc|desc]`, e.g. `createdAt,desc`.
    pub fn parse(raw: &str) -> Result<Self, FieldError> {
        let mut parts = raw.split(',').map(str::trim);
        let field = match parts.next().unwrap_or_default() {
            "id" => SortField::Id,
            "make" => SortField::Make,
            "model" => SortField::Model,
            "year" => SortField::Year,
            "priceEur" => SortField::PriceEur,
            "createdAt" => SortField::CreatedAt,
            other => {
                return Err(FieldError::new(
                    "sort",
                    format!("unknown sort property '{other}'"),
                ))
            }
        };
        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(other) => {
                return Err(FieldError::new(
                    "sort",
                    format!("unknown sort direction '{other}'"),
                ))
            }
        };
        if parts.next().is_some() {
            return Err(FieldError::new("sort", "expected property[,asc|desc]"));
        }
        Ok(Self { field, direction })
    }

    pub fn order_by_sql(&self) -> &'static str {
        use Direction::*;
        use SortField::*;
        match (self.field, self.direction) {
            (Id, Asc) => "id ASC",
            (Id, Desc) => "id DESC",
            (Make, Asc) => "make ASC, id ASC",
            (Make, Desc) => "make DESC, id ASC",
            (Model, Asc) => "model ASC, id ASC",
            (Model, Desc) => "model DESC, id ASC",
            (Year, Asc) => "year ASC, id ASC",
            (Year, Desc) => "year DESC, id ASC",
            (PriceEur, Asc) => "price_eur ASC, id ASC",
            (PriceEur, Desc) => "price_eur DESC, id ASC",
            (CreatedAt, Asc) => "created_at ASC, id ASC",
            (CreatedAt, Desc) => "created_at DESC, id ASC",
        }
    }

    /// In-memory counterpart of [`Sort::order_by_sql`].
    pub fn compare(&self, a: &Car, b: &Car) -> Ordering {
        let primary = match self.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Make => a.make.cmp(&b.make),
            SortField::Model => a.model.cmp(&b.model),
            SortField::Year => a.year.cmp(&b.year),
            SortField::PriceEur => a.price_eur.cmp(&b.price_eur),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let primary = match self.direction {
            Direction::Asc => primary,
            Direction::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::default(),
        }
    }
}

impl PageRequest {
    pub fn from_params(params: &ListParams) -> Result<Self, FieldError> {
        let page = params.page.unwrap_or(0).max(0);
        let size = match params.size {
            Some(s) if s >= 1 => s.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };
        let sort = match params.sort.as_deref().map(str::trim) {
            None | Some("") => Sort::default(),
            Some(raw) => Sort::parse(raw)?,
        };
        Ok(Self { page, size, sort })
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: i64,
    pub total_pages: i64,
    pub size: i64,
    pub number: i64,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: i64) -> Self {
        let size = request.size;
        let total_pages = (total_elements + size - 1) / size;
        let number = request.page;
        Self {
            number_of_elements: content.len(),
            empty: content.is_empty(),
            first: number == 0,
            last: number.saturating_add(1) >= total_pages,
            content,
            total_elements,
            total_pages,
            size,
            number,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            total_elements: self.total_elements,
            total_pages: self.total_pages,
            size: self.size,
            number: self.number,
            number_of_elements: self.number_of_elements,
            first: self.first,
            last: self.last,
            empty: self.empty,
        }
    }
}
