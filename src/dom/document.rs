use html5ever::{namespace_url, ns, LocalName, QualName};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::mpsc::UnboundedSender;

static DISPLAY_NONE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^|;)\s*display\s*:\s*none\s*(!important)?\s*(;|$)")
        .expect("valid display regex")
});
static DISPLAY_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*display\s*:").expect("valid display declaration regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Doctype(String),
    /// Attribute values are plain strings so the arena stays `Send`.
    Element {
        name: QualName,
        attrs: Vec<(QualName, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Structural change observed on the document: `added` were inserted under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
}

pub type MutationBatch = Vec<MutationRecord>;

/// Side effects on the host page that have no structural footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Click(NodeId),
}

/// Arena-backed stand-in for the host page.
///
/// Node handles stay valid for the lifetime of the document; nodes are never
/// freed, only detached or re-parented.
#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    interactions: Vec<Interaction>,
    observer: Option<UnboundedSender<MutationBatch>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
            }],
            interactions: Vec::new(),
            observer: None,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The `<body>` element, or the document root when the page has none.
    pub fn body(&self) -> NodeId {
        self.select_first(self.root(), "body")
            .unwrap_or_else(|| self.root())
    }

    pub fn set_observer(&mut self, sender: UnboundedSender<MutationBatch>) {
        self.observer = Some(sender);
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|child| *child == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(key, _)| local_is(key, name))
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[id.0].kind {
            match attrs.iter_mut().find(|(key, _)| local_is(key, name)) {
                Some((_, existing)) => *existing = value.to_string(),
                None => attrs.push((
                    QualName::new(None, ns!(), LocalName::from(name)),
                    value.to_string(),
                )),
            }
        }
    }

    /// All nodes below `scope` in document (pre-)order, `scope` excluded.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn select_all(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.is_tag(*id, tag))
            .collect()
    }

    pub fn select_first(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.is_tag(*id, tag))
    }

    pub fn select_last(&self, scope: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.is_tag(*id, tag))
            .last()
    }

    /// Last element with `tag` in the whole attached document.
    pub fn last_in_document(&self, tag: &str) -> Option<NodeId> {
        self.select_last(self.root(), tag)
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id)
            .map(|name| name.eq_ignore_ascii_case(tag))
            .unwrap_or(false)
    }

    pub fn is_or_contains(&self, id: NodeId, tag: &str) -> bool {
        self.is_tag(id, tag) || self.select_first(id, tag).is_some()
    }

    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(text) = &self.nodes[id.0].kind {
            out.push_str(text);
        }
        for node in self.descendants(id) {
            if let NodeKind::Text(text) = &self.nodes[node.0].kind {
                out.push_str(text);
            }
        }
        out
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.attr(id, "style")
            .map(|style| DISPLAY_NONE.is_match(style))
            .unwrap_or(false)
    }

    /// Sets `display: none`, replacing any other display declaration.
    pub fn set_hidden(&mut self, id: NodeId) {
        let mut declarations: Vec<String> = self
            .attr(id, "style")
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|decl| !decl.is_empty() && !DISPLAY_DECL.is_match(decl))
            .map(str::to_string)
            .collect();
        declarations.push("display: none".to_string());
        let style = format!("{};", declarations.join("; "));
        self.set_attr(id, "style", &style);
    }

    pub fn click(&mut self, id: NodeId) {
        tracing::debug!(target: "dom", node = id.0, tag = self.tag(id), "click");
        self.interactions.push(Interaction::Click(id));
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_node(NodeKind::Element {
            name: QualName::new(None, ns!(html), LocalName::from(tag.to_ascii_lowercase())),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push_node(NodeKind::Text(text.to_string()))
    }

    pub(crate) fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Appends without notifying the observer. Used while building a tree.
    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.nodes[child.0].parent.take() {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.append_children(parent, vec![child]);
    }

    /// Appends every child and reports them as a single mutation batch.
    pub fn append_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        if children.is_empty() {
            return;
        }
        for child in &children {
            self.attach(parent, *child);
        }
        self.notify(vec![MutationRecord {
            target: parent,
            added: children,
        }]);
    }

    /// Inserts `node` right after `reference` under the same parent.
    /// Returns false when `reference` is detached.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) -> bool {
        let Some(parent) = self.parent(reference) else {
            return false;
        };
        self.detach(node);
        let Some(pos) = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
        else {
            return false;
        };
        self.nodes[parent.0].children.insert(pos + 1, node);
        self.nodes[node.0].parent = Some(parent);
        self.notify(vec![MutationRecord {
            target: parent,
            added: vec![node],
        }]);
        true
    }

    /// Deep-copies `node` from `other` into this document, detached.
    pub fn import_subtree(&mut self, other: &Document, node: NodeId) -> NodeId {
        let copy = self.push_node(other.kind(node).clone());
        for child in other.children(node) {
            let child_copy = self.import_subtree(other, *child);
            self.attach(copy, child_copy);
        }
        copy
    }

    fn notify(&self, batch: MutationBatch) {
        if let Some(observer) = &self.observer {
            if observer.send(batch).is_err() {
                tracing::trace!(target: "dom", "mutation observer dropped");
            }
        }
    }
}

fn local_is(name: &QualName, wanted: &str) -> bool {
    let local: &str = &name.local;
    local.eq_ignore_ascii_case(wanted)
}
