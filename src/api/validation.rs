use serde::Deserialize;

use super::ApiError;
use crate::models::PageRequest;
use crate::models::page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {} ID: {}. ID must be a positive integer",
            resource, id
        )));
    }
    Ok(id)
}

pub fn validate_page(query: &PageQuery) -> Result<PageRequest, ApiError> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page == 0 {
        return Err(ApiError::validation("page: must be at least 1"));
    }

    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ApiError::validation(format!(
            "page_size: must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    // The row offset has to fit SQLite's signed 64-bit OFFSET.
    let offset = (page - 1)
        .checked_mul(page_size)
        .and_then(|offset| i64::try_from(offset).ok());
    if offset.is_none() {
        return Err(ApiError::validation(format!(
            "page: must be at most {}",
            i64::MAX.unsigned_abs() / page_size + 1
        )));
    }

    Ok(PageRequest { page, page_size })
}

pub fn validate_search_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("name: search query cannot be empty"));
    }
    if trimmed.chars().count() > 100 {
        return Err(ApiError::validation(
            "name: search query must be at most 100 characters",
        ));
    }
    Ok(trimmed)
}
