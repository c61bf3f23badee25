mod generic;
mod google_news;

use std::sync::Arc;

use crate::{
    config::SiteVariant,
    dom::{Document, NodeId},
};

pub use generic::GenericRenderer;
pub use google_news::GoogleNewsRenderer;

pub const BADGE_ATTR: &str = "data-positive-badge";
pub const BADGE_TEXT: &str = "🌻";
pub const BADGE_TOOLTIP: &str = "This article was selected by PositiveNews 🌻";
const TIME_TAG: &str = "time";

/// Applies a verdict to one item element of a particular host site.
pub trait ItemRenderer: Send + Sync {
    /// Hides the item. Returns false when it was already hidden.
    fn hide(&self, doc: &mut Document, item: NodeId) -> bool;

    /// Marks the item as positive. Returns false when nothing was inserted.
    fn tag_positive(&self, doc: &mut Document, item: NodeId) -> bool;
}

pub fn renderer_for(site: SiteVariant) -> Arc<dyn ItemRenderer> {
    match site {
        SiteVariant::GoogleNews => Arc::new(GoogleNewsRenderer),
        SiteVariant::Generic => Arc::new(GenericRenderer),
    }
}

pub(crate) fn hide_element(doc: &mut Document, item: NodeId) -> bool {
    if doc.is_hidden(item) {
        tracing::debug!(target: "render", node = item.index(), "item already hidden");
        return false;
    }
    doc.set_hidden(item);
    tracing::debug!(target: "render", node = item.index(), "item hidden");
    true
}

/// Inserts the sunflower badge right after the item's `<time>` marker, once.
pub(crate) fn insert_badge(doc: &mut Document, item: NodeId) -> bool {
    let Some(time) = doc.select_first(item, TIME_TAG) else {
        tracing::warn!(target: "render", node = item.index(), "no <time> element found in item");
        return false;
    };
    if doc
        .next_sibling(time)
        .map(|next| doc.has_attr(next, BADGE_ATTR))
        .unwrap_or(false)
    {
        return false;
    }

    let badge = doc.create_element("span");
    doc.set_attr(badge, BADGE_ATTR, "");
    doc.set_attr(badge, "title", BADGE_TOOLTIP);
    let text = doc.create_text(BADGE_TEXT);
    doc.append_child(badge, text);
    doc.insert_after(time, badge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    #[test]
    fn badge_follows_time_marker_once() {
        let mut doc = parse_html("<article><a>A</a><time>1h</time><span>src</span></article>");
        let article = doc.select_first(doc.root(), "article").unwrap();

        assert!(insert_badge(&mut doc, article));
        assert!(!insert_badge(&mut doc, article));

        let badges: Vec<_> = doc
            .descendants(article)
            .into_iter()
            .filter(|id| doc.has_attr(*id, BADGE_ATTR))
            .collect();
        assert_eq!(badges.len(), 1);
        let time = doc.select_first(article, "time").unwrap();
        assert_eq!(doc.next_sibling(time), Some(badges[0]));
        assert_eq!(doc.attr(badges[0], "title"), Some(BADGE_TOOLTIP));
        assert_eq!(doc.text_content(badges[0]), BADGE_TEXT);
    }

    #[test]
    fn badge_without_marker_is_noop() {
        let mut doc = parse_html("<article><a>A</a></article>");
        let article = doc.select_first(doc.root(), "article").unwrap();
        let before = doc.descendants(article).len();
        assert!(!insert_badge(&mut doc, article));
        assert_eq!(doc.descendants(article).len(), before);
    }

    #[test]
    fn hide_element_reports_first_hide_only() {
        let mut doc = parse_html("<article><a>A</a></article>");
        let article = doc.select_first(doc.root(), "article").unwrap();
        assert!(hide_element(&mut doc, article));
        assert!(!hide_element(&mut doc, article));
    }
}
