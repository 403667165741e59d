//! Catalog Query service: one paginated listing contract for every caller.

use std::sync::Arc;

use crate::catalog::{CatalogItem, CatalogQuery, CatalogRequest};
use crate::error::CoreError;
use crate::pagination::Page;
use crate::repository::CatalogRepository;

pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Validate the request and return the requested page.
    ///
    /// Pages past the end come back empty with `total_pages` populated.
    pub async fn query(&self, request: CatalogRequest) -> Result<Page<CatalogItem>, CoreError> {
        let query = CatalogQuery::new(request)?;
        let page = self.catalog.search(&query).await?;

        tracing::debug!(
            page = page.page,
            per_page = page.per_page,
            total_count = page.total_count,
            returned = page.items.len(),
            "Catalog query",
        );
        Ok(page)
    }
}
