//! Grouping parsed elements into pages.

use std::path::Path;

use tracing::info;

use manual_core::{Pages, ParsedElement, Result};

/// Load parsed elements from a JSON file produced by the document parser.
pub fn load_elements(path: &Path) -> Result<Vec<ParsedElement>> {
    let content = std::fs::read_to_string(path)?;
    let elements: Vec<ParsedElement> = serde_json::from_str(&content)?;
    info!("Loaded {} parsed elements from {:?}", elements.len(), path);
    Ok(elements)
}

/// Concatenate element texts per page, blank-line separated.
///
/// Pages come back keyed by 1-based page number in ascending order.
pub fn group_by_page(elements: &[ParsedElement]) -> Pages {
    let mut pages = Pages::new();

    for elem in elements {
        let entry = pages.entry(elem.page_number).or_default();
        if !entry.is_empty() {
            entry.push_str("\n\n");
        }
        entry.push_str(&elem.text);
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use manual_core::ElementType;

    fn elem(text: &str, page: u32) -> ParsedElement {
        ParsedElement {
            text: text.to_string(),
            page_number: page,
            element_type: ElementType::Text,
        }
    }

    #[test]
    fn test_groups_and_joins_in_element_order() {
        let elements = vec![
            elem("Normal Procedures", 2),
            elem("Preflight", 1),
            elem("Set parking brake", 2),
        ];

        let pages = group_by_page(&elements);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[&1], "Preflight");
        assert_eq!(pages[&2], "Normal Procedures\n\nSet parking brake");
        // BTreeMap iterates pages in ascending order
        assert_eq!(pages.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_empty_input_yields_no_pages() {
        assert!(group_by_page(&[]).is_empty());
    }
}
