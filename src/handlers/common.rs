use crate::config::AppConfig;
use serde::Deserialize;
use utoipa::IntoParams;

/// Pagination query parameters shared by every list endpoint.
///
/// `per_page` is optional so the configured default applies when the
/// client sends nothing; explicit values are clamped to the configured
/// maximum.
#[derive(Debug, Deserialize, IntoParams)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    pub per_page: Option<u64>,
}

fn default_page() -> u64 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: None,
        }
    }
}

impl PaginationParams {
    /// Final `(page, per_page)` pair after applying config defaults and
    /// bounds.
    pub fn resolve(&self, config: &AppConfig) -> (u64, u64) {
        let page = self.page.max(1);
        let per_page = self
            .per_page
            .unwrap_or(config.api_default_page_size)
            .clamp(1, config.api_max_page_size);
        (page, per_page)
    }
}
