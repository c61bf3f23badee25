use std::collections::HashMap;

use crate::dom::NodeId;

/// A feed entry found on the page during one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub element: NodeId,
}

/// Title-keyed items of one scan, in document order.
///
/// A repeated title keeps its first position but points at the later element.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    order: Vec<String>,
    elements: HashMap<String, NodeId>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title: String, element: NodeId) {
        if self.elements.insert(title.clone(), element).is_none() {
            self.order.push(title);
        }
    }

    pub fn get(&self, title: &str) -> Option<NodeId> {
        self.elements.get(title).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        self.order.iter().map(|title| Item {
            title: title.clone(),
            element: self.elements[title],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    #[test]
    fn duplicate_title_keeps_position_and_takes_last_element() {
        let mut doc = Document::new();
        let first = doc.create_element("article");
        let second = doc.create_element("article");
        let other = doc.create_element("article");

        let mut scan = ScanResult::new();
        scan.insert("A".into(), first);
        scan.insert("B".into(), other);
        scan.insert("A".into(), second);

        assert_eq!(scan.titles().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(scan.get("A"), Some(second));
        assert_eq!(scan.len(), 2);
    }
}
