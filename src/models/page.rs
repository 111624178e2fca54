// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};

/// One page of catalog results plus pagination metadata.
///
/// Items are opaque to the browsing core and kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// 1-based page index
    pub page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_previous: bool,
    pub has_next: bool,
    pub items: Vec<serde_json::Value>,
}

impl PageResult {
    /// Build a page and derive the page count and neighbour flags from the totals
    pub fn from_slice(
        page: u32,
        page_size: u32,
        total_items: u64,
        items: Vec<serde_json::Value>,
    ) -> Self {
        let total_pages = total_pages(total_items, page_size);
        Self {
            page,
            page_size,
            total_items,
            total_pages,
            has_previous: page > 1,
            has_next: page < total_pages,
            items,
        }
    }
}

/// Ceiling division of items by page size; 0 when either is 0
pub fn total_pages(total_items: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total_items.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
