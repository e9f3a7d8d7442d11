//! Zero-based page requests and page envelopes.

use storefront_core::{AppError, AppResult};

/// Largest page size accepted by list queries.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Validated zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validates raw page parameters.
    ///
    /// `page` must not be negative; `page_size` must be within
    /// `1..=MAX_PAGE_SIZE`.
    pub fn new(page: i64, page_size: i64) -> AppResult<Self> {
        if page < 0 {
            return Err(AppError::Validation(
                "page must not be negative".to_owned(),
            ));
        }

        if page_size < 1 {
            return Err(AppError::Validation(
                "page size must be at least 1".to_owned(),
            ));
        }

        if page_size > i64::from(MAX_PAGE_SIZE) {
            return Err(AppError::Validation(format!(
                "page size must not exceed {MAX_PAGE_SIZE}"
            )));
        }

        let page = u32::try_from(page)
            .map_err(|_| AppError::Validation("page is out of range".to_owned()))?;
        let page_size = u32::try_from(page_size)
            .map_err(|_| AppError::Validation("page size is out of range".to_owned()))?;

        Ok(Self { page, page_size })
    }

    /// Returns the zero-based page index.
    #[must_use]
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Returns the maximum number of items on the page.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Returns the number of items skipped before this page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.page_size)
    }
}

/// One page of results plus the metadata needed to paginate further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Number of items matching the query across all pages.
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Builds a page envelope from fetched items and a total count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            items,
            page: request.page(),
            page_size: request.page_size(),
            total_elements,
        }
    }

    /// Cuts the requested page out of a complete, already ordered result set.
    #[must_use]
    pub fn from_ordered(all: Vec<T>, request: PageRequest) -> Self {
        let total_elements = all.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = all
            .into_iter()
            .skip(offset)
            .take(request.page_size() as usize)
            .collect();

        Self::new(items, request, total_elements)
    }

    /// Number of pages needed to hold `total_elements`.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }

        self.total_elements.div_ceil(u64::from(self.page_size))
    }

    /// Maps every item while keeping the pagination metadata.
    #[must_use]
    pub fn map<U>(self, mapper: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(mapper).collect(),
            page: self.page,
            page_size: self.page_size,
            total_elements: self.total_elements,
        }
    }
}
