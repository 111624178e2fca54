// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Normalization of filter fragments into their canonical form.
//!
//! Every function here is total: malformed input degrades to a safe default
//! instead of failing. Validation that must block a commit lives in
//! [`DraftQuery::canonicalize`].

use crate::models::query::{
    CanonicalQuery, DraftQuery, PageSize, PriceBound, SortKey, ValidationError,
};
use std::collections::BTreeSet;

/// Largest integer an IEEE double represents exactly (2^53 - 1)
const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

/// Lower-case, trim, drop empties, deduplicate. Iterates in lexical order.
pub fn canonicalize_tag_set<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|tag| tag.as_ref().trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Trim, drop empties, deduplicate. Case is significant.
pub fn canonicalize_id_set<I, S>(ids: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Round a price in cents to a whole, non-negative cent amount
pub fn canonicalize_price(cents: Option<f64>) -> Option<u64> {
    let cents = cents.filter(|c| c.is_finite())?;
    if cents <= 0.0 {
        return Some(0);
    }
    // `as` saturates for values above u64::MAX
    Some(cents.round() as u64)
}

/// Parse a positive integer, returning `fallback` for anything else.
///
/// Only plain ASCII digits are accepted (surrounding whitespace is ignored), the
/// value must be at least 1 and no larger than both `u32::MAX` and the largest
/// exactly representable double.
pub fn parse_positive_int(raw: Option<&str>, fallback: u32) -> u32 {
    let Some(raw) = raw.map(str::trim) else {
        return fallback;
    };
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return fallback;
    }
    match raw.parse::<u64>() {
        Ok(value) if (1..=MAX_SAFE_INTEGER).contains(&value) => {
            u32::try_from(value).unwrap_or(fallback)
        }
        _ => fallback,
    }
}

pub fn parse_sort_key(raw: Option<&str>) -> SortKey {
    raw.map(str::trim)
        .and_then(SortKey::from_wire)
        .unwrap_or_default()
}

pub fn parse_page_size(raw: Option<&str>) -> PageSize {
    let size = parse_positive_int(raw, PageSize::DEFAULT.get());
    PageSize::new(size).unwrap_or_default()
}

/// Parse a draft price field given in major currency units ("12.50").
///
/// Empty input means "no bound". Anything that is not a finite number is a
/// validation error.
pub fn parse_price_input(input: &str, bound: PriceBound) -> Result<Option<u64>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(units) if units.is_finite() => Ok(canonicalize_price(Some(units * 100.0))),
        _ => Err(ValidationError::MalformedPrice {
            bound,
            input: input.to_string(),
        }),
    }
}

impl DraftQuery {
    /// Canonicalize the draft, collecting every validation problem.
    ///
    /// The page field is carried over as-is (clamped to at least 1); callers that
    /// commit a filter change reset it.
    pub fn canonicalize(&self) -> Result<CanonicalQuery, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let min_price_cents = parse_price_input(&self.min_price, PriceBound::Min)
            .map_err(|e| errors.push(e))
            .unwrap_or(None);
        let max_price_cents = parse_price_input(&self.max_price, PriceBound::Max)
            .map_err(|e| errors.push(e))
            .unwrap_or(None);

        if let (Some(min_cents), Some(max_cents)) = (min_price_cents, max_price_cents) {
            if min_cents > max_cents {
                errors.push(ValidationError::InvertedPriceRange {
                    min_cents,
                    max_cents,
                });
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CanonicalQuery {
            search: self.search.trim().to_string(),
            tags: canonicalize_tag_set(&self.tags),
            authors: canonicalize_id_set(&self.authors),
            min_price_cents,
            max_price_cents,
            sort: self.sort,
            page: self.page.max(1),
            page_size: self.page_size,
        })
    }

    pub fn validation_errors(&self) -> Vec<ValidationError> {
        self.canonicalize().err().unwrap_or_default()
    }
}
