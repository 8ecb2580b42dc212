//! Pagination request and result types.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A 1-based page number and a positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page_number: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn create(page_number: i64, page_size: i64) -> Result<Self, DomainError> {
        let page_number = u32::try_from(page_number)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(DomainError::OutOfRange("pageNumber"))?;
        let page_size = u32::try_from(page_size)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(DomainError::OutOfRange("pageSize"))?;

        Ok(Self {
            page_number,
            page_size,
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Zero-based offset of the first item on this page.
    pub fn skip(&self) -> usize {
        (self.page_number as usize - 1) * self.page_size as usize
    }
}

/// One page of items plus the size of the full, unpaginated sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_items: usize,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, page: PageRequest, total_items: usize) -> Self {
        Self {
            items,
            page_number: page.page_number(),
            page_size: page.page_size(),
            total_items,
        }
    }

    pub fn total_pages(&self) -> usize {
        if self.total_items == 0 || self.page_size == 0 {
            return 0;
        }
        self.total_items.div_ceil(self.page_size as usize)
    }
}
