// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Values derived from controller state for display. Nothing here is stored.

use crate::models::facet::FacetOption;

/// Options whose value or label contains `needle`, case-insensitively. A blank
/// needle keeps everything.
pub fn filter_facet_options<'a>(options: &'a [FacetOption], needle: &str) -> Vec<&'a FacetOption> {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return options.iter().collect();
    }
    options
        .iter()
        .filter(|option| {
            option.value.to_lowercase().contains(&needle)
                || option
                    .label
                    .as_deref()
                    .is_some_and(|label| label.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Page numbers for the pager: at most `width` consecutive pages centred on
/// `current` and kept within `1..=total_pages`. Empty when the total is unknown.
pub fn page_window(current: u32, total_pages: u32, width: u32) -> Vec<u32> {
    if total_pages == 0 || width == 0 {
        return Vec::new();
    }
    let width = width.min(total_pages);
    let current = current.clamp(1, total_pages);

    let mut start = current.saturating_sub(width / 2).max(1);
    let mut end = start + width - 1;
    if end > total_pages {
        end = total_pages;
        start = end - width + 1;
    }
    (start..=end).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authors() -> Vec<FacetOption> {
        vec![
            FacetOption::new("u1", 4).with_label("Ada Lovelace"),
            FacetOption::new("u2", 2).with_label("Grace Hopper"),
            FacetOption::new("lovelace-fan", 1),
        ]
    }

    #[test]
    fn test_filter_matches_label_case_insensitively() {
        let options = authors();
        let matched: Vec<_> = filter_facet_options(&options, "LOVE")
            .into_iter()
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(matched, vec!["u1", "lovelace-fan"]);
    }

    #[test]
    fn test_filter_matches_value_of_labelled_option() {
        let options = authors();
        let matched = filter_facet_options(&options, "u2");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].value, "u2");
        assert!(filter_facet_options(&options, "nobody").is_empty());
    }

    #[test]
    fn test_blank_filter_keeps_all() {
        let options = authors();
        assert_eq!(filter_facet_options(&options, "  ").len(), 3);
    }

    #[test]
    fn test_page_window_centres_on_current() {
        assert_eq!(page_window(5, 10, 5), vec![3, 4, 5, 6, 7]);
        assert_eq!(page_window(5, 10, 4), vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_page_window_clamps_to_edges() {
        assert_eq!(page_window(1, 10, 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(page_window(10, 10, 5), vec![6, 7, 8, 9, 10]);
        assert_eq!(page_window(2, 3, 5), vec![1, 2, 3]);
        assert_eq!(page_window(40, 10, 3), vec![8, 9, 10]);
    }

    #[test]
    fn test_page_window_unknown_total() {
        assert!(page_window(1, 0, 5).is_empty());
    }
}
