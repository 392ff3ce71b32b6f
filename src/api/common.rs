//! Common API utilities

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_page_size() -> u32 {
    10
}
