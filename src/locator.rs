use crate::{
    dom::{Document, NodeId},
    domain::ScanResult,
};

pub const ITEM_TAG: &str = "article";
const TITLE_TAG: &str = "a";
const INERT_TAG: &str = "template";

/// Finds the feed items currently displayed on the page.
#[derive(Debug, Clone)]
pub struct ItemLocator {
    item_tag: String,
}

impl Default for ItemLocator {
    fn default() -> Self {
        Self::new(ITEM_TAG)
    }
}

impl ItemLocator {
    pub fn new(item_tag: &str) -> Self {
        Self {
            item_tag: item_tag.to_string(),
        }
    }

    pub fn find_items(&self, doc: &Document) -> ScanResult {
        let mut scan = ScanResult::new();
        for element in self.item_elements(doc) {
            if doc.is_hidden(element) {
                tracing::debug!(target: "locator", node = element.index(), "item already hidden, skipping");
                continue;
            }
            match title_of(doc, element) {
                Some(title) => scan.insert(title, element),
                None => tracing::warn!(
                    target: "locator",
                    node = element.index(),
                    "item does not have a valid title link"
                ),
            }
        }
        scan
    }

    /// Titles of every item element, hidden ones included.
    pub fn all_titles(&self, doc: &Document) -> Vec<String> {
        self.item_elements(doc)
            .into_iter()
            .filter_map(|element| title_of(doc, element))
            .collect()
    }

    /// Item elements outside `<template>` content, in document order.
    pub fn item_elements(&self, doc: &Document) -> Vec<NodeId> {
        doc.select_all(doc.root(), &self.item_tag)
            .into_iter()
            .filter(|element| !in_template(doc, *element))
            .collect()
    }
}

/// Trimmed text of the first link with non-empty text.
pub fn title_of(doc: &Document, element: NodeId) -> Option<String> {
    doc.select_all(element, TITLE_TAG)
        .into_iter()
        .map(|link| doc.text_content(link).trim().to_string())
        .find(|text| !text.is_empty())
}

fn in_template(doc: &Document, element: NodeId) -> bool {
    let mut current = doc.parent(element);
    while let Some(id) = current {
        if doc.is_tag(id, INERT_TAG) {
            return true;
        }
        current = doc.parent(id);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn finds_titles_in_document_order() {
        let doc = parse_html(
            r#"<body>
                <article><a href="/img"><img src="x"></a><a>  First story </a></article>
                <article style="display: none"><a>Hidden story</a></article>
                <article><span>no link here</span></article>
                <article><a>Second story</a></article>
            </body>"#,
        );
        let scan = ItemLocator::default().find_items(&doc);
        assert_eq!(
            scan.titles().collect::<Vec<_>>(),
            vec!["First story", "Second story"]
        );
    }

    #[test]
    fn duplicate_titles_are_last_wins() {
        let doc = parse_html("<article id='1'><a>Same</a></article><article id='2'><a>Same</a></article>");
        let scan = ItemLocator::default().find_items(&doc);
        assert_eq!(scan.len(), 1);
        let element = scan.get("Same").unwrap();
        assert_eq!(doc.attr(element, "id"), Some("2"));
    }

    #[test]
    fn all_titles_includes_hidden_items() {
        let doc = parse_html(
            "<article style='display:none'><a>Gone</a></article><article><a>Here</a></article>",
        );
        assert_eq!(ItemLocator::default().all_titles(&doc), vec!["Gone", "Here"]);
    }

    #[test]
    fn template_content_is_not_an_item() {
        let doc = parse_html(
            "<body><template><article><a>Placeholder</a></article></template>\
             <article><a>Real</a></article></body>",
        );
        let locator = ItemLocator::default();
        assert_eq!(
            locator.find_items(&doc).titles().collect::<Vec<_>>(),
            vec!["Real"]
        );
        assert_eq!(locator.all_titles(&doc), vec!["Real"]);
    }
}
