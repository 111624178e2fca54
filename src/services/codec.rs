// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Mapping between [`CanonicalQuery`] and its flat [`PersistedForm`].
//!
//! Decoding is lenient: missing, malformed, or unknown keys fall back to
//! defaults. Encoding is minimal: only values that differ from the default are
//! written. Together this makes `decode(encode(q)) == q` and
//! `encode(decode(f)) == f` for every form produced by `encode`.

use crate::models::form::PersistedForm;
use crate::models::query::{CanonicalQuery, PageSize, SortKey};
use crate::services::canonicalize::{
    canonicalize_id_set, canonicalize_price, canonicalize_tag_set, parse_page_size,
    parse_positive_int, parse_sort_key,
};
use std::collections::BTreeSet;

pub const KEY_SEARCH: &str = "q";
pub const KEY_TAGS: &str = "tags";
pub const KEY_AUTHORS: &str = "authors";
pub const KEY_MIN_PRICE: &str = "minPrice";
pub const KEY_MAX_PRICE: &str = "maxPrice";
pub const KEY_SORT: &str = "sort";
pub const KEY_PAGE: &str = "page";
pub const KEY_PAGE_SIZE: &str = "pageSize";

const LIST_SEPARATOR: char = ',';

pub fn decode(form: &PersistedForm) -> CanonicalQuery {
    let mut query = CanonicalQuery {
        search: form.get(KEY_SEARCH).unwrap_or_default().trim().to_string(),
        tags: canonicalize_tag_set(split_list(form.get(KEY_TAGS))),
        authors: canonicalize_id_set(split_list(form.get(KEY_AUTHORS))),
        min_price_cents: decode_price(form.get(KEY_MIN_PRICE)),
        max_price_cents: decode_price(form.get(KEY_MAX_PRICE)),
        sort: parse_sort_key(form.get(KEY_SORT)),
        page: parse_positive_int(form.get(KEY_PAGE), 1),
        page_size: parse_page_size(form.get(KEY_PAGE_SIZE)),
    };

    // An inverted pair cannot be a committed query; treat it as malformed
    if !query.has_valid_price_range() {
        query.min_price_cents = None;
        query.max_price_cents = None;
    }
    query
}

pub fn encode(query: &CanonicalQuery) -> PersistedForm {
    let mut form = PersistedForm::new();

    if !query.search.is_empty() {
        form.insert(KEY_SEARCH, query.search.as_str());
    }
    if !query.tags.is_empty() {
        form.insert(KEY_TAGS, join_list(&query.tags));
    }
    if !query.authors.is_empty() {
        form.insert(KEY_AUTHORS, join_list(&query.authors));
    }
    if let Some(min) = query.min_price_cents {
        form.insert(KEY_MIN_PRICE, min.to_string());
    }
    if let Some(max) = query.max_price_cents {
        form.insert(KEY_MAX_PRICE, max.to_string());
    }
    if query.sort != SortKey::default() {
        form.insert(KEY_SORT, query.sort.as_str());
    }
    if query.page != 1 {
        form.insert(KEY_PAGE, query.page.to_string());
    }
    if query.page_size != PageSize::DEFAULT {
        form.insert(KEY_PAGE_SIZE, query.page_size.get().to_string());
    }

    form
}

/// Encode with page and page size always present, for API requests that must
/// not rely on server-side defaults
pub fn encode_explicit(query: &CanonicalQuery) -> PersistedForm {
    let mut form = encode(query);
    form.insert(KEY_PAGE, query.page.to_string());
    form.insert(KEY_PAGE_SIZE, query.page_size.get().to_string());
    form
}

fn decode_price(raw: Option<&str>) -> Option<u64> {
    let parsed = raw.and_then(|value| value.trim().parse::<f64>().ok());
    canonicalize_price(parsed)
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) => raw.split(LIST_SEPARATOR).map(unescape_item).collect(),
        None => Vec::new(),
    }
}

fn join_list(items: &BTreeSet<String>) -> String {
    items
        .iter()
        .map(|item| escape_item(item))
        .collect::<Vec<_>>()
        .join(",")
}

/// `%` and the list separator are written as `%25` and `%2C` inside an element
fn escape_item(item: &str) -> String {
    item.replace('%', "%25").replace(LIST_SEPARATOR, "%2C")
}

fn unescape_item(item: &str) -> String {
    let mut out = String::with_capacity(item.len());
    let mut rest = item;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.get(1..3).is_some_and(|hex| hex.eq_ignore_ascii_case("2c")) {
            out.push(LIST_SEPARATOR);
            rest = &tail[3..];
        } else if tail.starts_with("%25") {
            out.push('%');
            rest = &tail[3..];
        } else {
            out.push('%');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
