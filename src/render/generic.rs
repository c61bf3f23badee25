use crate::dom::{Document, NodeId};

use super::{hide_element, insert_badge, ItemRenderer};

/// Plain hide and badge; no interaction with the host page.
pub struct GenericRenderer;

impl ItemRenderer for GenericRenderer {
    fn hide(&self, doc: &mut Document, item: NodeId) -> bool {
        hide_element(doc, item)
    }

    fn tag_positive(&self, doc: &mut Document, item: NodeId) -> bool {
        insert_badge(doc, item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn hide_does_not_click() {
        let mut doc = parse_html("<article><button>More</button><a>A</a></article><ul><li>x</li></ul>");
        let article = doc.select_first(doc.root(), "article").unwrap();
        assert!(GenericRenderer.hide(&mut doc, article));
        assert!(doc.is_hidden(article));
        assert!(doc.interactions().is_empty());
    }
}
