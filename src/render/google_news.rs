use crate::dom::{Document, NodeId};

use super::{hide_element, insert_badge, ItemRenderer};

/// Google News: besides hiding, tells the host's recommender to show fewer such stories.
pub struct GoogleNewsRenderer;

impl GoogleNewsRenderer {
    /// Opens the item menu, picks the last entry of the last list (the
    /// "see fewer" action) and clicks the menu button again to close it.
    /// Every lookup is optional.
    fn send_negative_feedback(doc: &mut Document, item: NodeId) {
        let Some(button) = doc.select_first(item, "button") else {
            tracing::warn!(target: "render", node = item.index(), "no button found in item");
            return;
        };
        doc.click(button);

        match doc.last_in_document("ul") {
            Some(list) => match doc.select_last(list, "li") {
                Some(entry) => doc.click(entry),
                None => tracing::warn!(target: "render", "no <li> found in the last <ul> element"),
            },
            None => tracing::warn!(target: "render", "no <ul> found in the document"),
        }

        doc.click(button);
    }
}

impl ItemRenderer for GoogleNewsRenderer {
    fn hide(&self, doc: &mut Document, item: NodeId) -> bool {
        if doc.is_hidden(item) {
            return false;
        }
        Self::send_negative_feedback(doc, item);
        hide_element(doc, item)
    }

    fn tag_positive(&self, doc: &mut Document, item: NodeId) -> bool {
        insert_badge(doc, item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, Interaction};

    #[test]
    fn hide_runs_feedback_sequence() {
        let mut doc = parse_html(
            "<article><a>A</a><button>More</button></article>\
             <ul><li>first</li></ul><ul><li>share</li><li>fewer</li></ul>",
        );
        let article = doc.select_first(doc.root(), "article").unwrap();
        let button = doc.select_first(article, "button").unwrap();
        let entry = doc.select_last(doc.root(), "li").unwrap();

        assert!(GoogleNewsRenderer.hide(&mut doc, article));
        assert!(doc.is_hidden(article));
        assert_eq!(
            doc.interactions(),
            &[
                Interaction::Click(button),
                Interaction::Click(entry),
                Interaction::Click(button)
            ]
        );
    }

    #[test]
    fn hide_degrades_without_list() {
        let mut doc = parse_html("<article><a>A</a><button>More</button></article>");
        let article = doc.select_first(doc.root(), "article").unwrap();
        let button = doc.select_first(article, "button").unwrap();

        assert!(GoogleNewsRenderer.hide(&mut doc, article));
        assert_eq!(
            doc.interactions(),
            &[Interaction::Click(button), Interaction::Click(button)]
        );
    }

    #[test]
    fn hide_without_button_still_hides() {
        let mut doc = parse_html("<article><a>A</a></article><ul><li>x</li></ul>");
        let article = doc.select_first(doc.root(), "article").unwrap();
        assert!(GoogleNewsRenderer.hide(&mut doc, article));
        assert!(doc.is_hidden(article));
        assert!(doc.interactions().is_empty());
    }

    #[test]
    fn second_hide_sends_no_feedback() {
        let mut doc = parse_html("<article><a>A</a><button>More</button></article>");
        let article = doc.select_first(doc.root(), "article").unwrap();
        assert!(GoogleNewsRenderer.hide(&mut doc, article));
        let clicks = doc.interactions().len();
        assert!(!GoogleNewsRenderer.hide(&mut doc, article));
        assert_eq!(doc.interactions().len(), clicks);
    }
}
