use serde::{Deserialize, Serialize};

use crate::config::MAX_PAGE_SIZE;

/// `?page=&per_page=` query parameters. Pages are 1-based.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// One page of an in-memory list, with enough metadata to draw pager buttons.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: usize,
    pub total_pages: u32,
}

/// Slices `items` into the requested page.
///
/// Out-of-range page numbers are clamped to the first/last page, like the
/// previous/next buttons of the UI.
pub fn paginate<T>(items: Vec<T>, params: PageParams, default_per_page: u32) -> Page<T> {
    let per_page = params
        .per_page
        .unwrap_or(default_per_page)
        .clamp(1, MAX_PAGE_SIZE);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page as usize) as u32;
    let page = params.page.unwrap_or(1).clamp(1, total_pages.max(1));

    let start = (page as usize - 1) * per_page as usize;
    let items = items
        .into_iter()
        .skip(start)
        .take(per_page as usize)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}
