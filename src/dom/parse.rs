use std::io;

use html5ever::{
    parse_document,
    serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope},
    tendril::TendrilSink,
    ParseOpts,
};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::document::{Document, NodeId, NodeKind};

/// Parses a full HTML page into an arena document.
pub fn parse_html(html: &str) -> Document {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    let mut doc = Document::new();
    let root = doc.root();
    for child in dom.document.children.borrow().iter() {
        convert(&mut doc, root, child);
    }
    doc
}

fn convert(doc: &mut Document, parent: NodeId, handle: &Handle) {
    let kind = match &handle.data {
        NodeData::Doctype { name, .. } => NodeKind::Doctype(name.to_string()),
        NodeData::Element { name, attrs, .. } => NodeKind::Element {
            name: name.clone(),
            attrs: attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.clone(), attr.value.to_string()))
                .collect(),
        },
        NodeData::Text { contents } => NodeKind::Text(contents.borrow().to_string()),
        NodeData::Comment { contents } => NodeKind::Comment(contents.to_string()),
        NodeData::Document | NodeData::ProcessingInstruction { .. } => return,
    };
    let id = doc.push_node(kind);
    doc.attach(parent, id);
    for child in handle.children.borrow().iter() {
        convert(doc, id, child);
    }

    // RcDom keeps <template> content in a separate fragment.
    if let NodeData::Element {
        template_contents, ..
    } = &handle.data
    {
        if let Some(fragment) = template_contents.borrow().as_ref() {
            for child in fragment.children.borrow().iter() {
                convert(doc, id, child);
            }
        }
    }
}

/// Arena node handed to the html5ever serializer.
struct SerializableNode<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl Serialize for SerializableNode<'_> {
    fn serialize<S>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        match traversal_scope {
            TraversalScope::IncludeNode => write_node(self.doc, self.id, serializer),
            TraversalScope::ChildrenOnly(_) => self
                .doc
                .children(self.id)
                .iter()
                .try_for_each(|child| write_node(self.doc, *child, serializer)),
        }
    }
}

fn write_node<S: Serializer>(doc: &Document, id: NodeId, serializer: &mut S) -> io::Result<()> {
    match doc.kind(id) {
        NodeKind::Document => doc
            .children(id)
            .iter()
            .try_for_each(|child| write_node(doc, *child, serializer)),
        NodeKind::Doctype(name) => serializer.write_doctype(name),
        NodeKind::Text(text) => serializer.write_text(text),
        NodeKind::Comment(text) => serializer.write_comment(text),
        NodeKind::Element { name, attrs } => {
            serializer.start_elem(
                name.clone(),
                attrs.iter().map(|(key, value)| (key, value.as_str())),
            )?;
            for child in doc.children(id) {
                write_node(doc, *child, serializer)?;
            }
            serializer.end_elem(name.clone())
        }
    }
}

impl Document {
    /// Serializes the attached tree back to HTML.
    pub fn to_html(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        let root = SerializableNode {
            doc: self,
            id: self.root(),
        };
        serialize(&mut buf, &root, SerializeOpts::default())?;
        String::from_utf8(buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_builds_html_skeleton() {
        let doc = parse_html("<article><a href='/a'>Hello</a></article>");
        assert!(doc.select_first(doc.root(), "html").is_some());
        let body = doc.body();
        assert!(doc.is_tag(body, "body"));
        let article = doc.select_first(body, "article").unwrap();
        let link = doc.select_first(article, "a").unwrap();
        assert_eq!(doc.attr(link, "href"), Some("/a"));
        assert_eq!(doc.text_content(link), "Hello");
    }

    #[test]
    fn serialize_escapes_text_and_attributes() {
        let mut doc = parse_html("<body></body>");
        let body = doc.body();
        let span = doc.create_element("span");
        doc.set_attr(span, "title", "say \"hi\" & bye");
        let text = doc.create_text("a < b");
        doc.append_child(span, text);
        doc.append_child(body, span);

        let html = doc.to_html().unwrap();
        assert!(html.contains(r#"<span title="say &quot;hi&quot; &amp; bye">a &lt; b</span>"#));
    }

    #[test]
    fn serialize_round_trips_structure() {
        let source = r#"<article style="display: none;"><img src="x.png"><a href="/t">Title</a><time>1h</time></article>"#;
        let doc = parse_html(source);
        let reparsed = parse_html(&doc.to_html().unwrap());
        let article = reparsed.select_first(reparsed.root(), "article").unwrap();
        assert!(reparsed.is_hidden(article));
        assert_eq!(reparsed.select_all(article, "img").len(), 1);
        assert_eq!(reparsed.text_content(article), "Title1h");
    }

    #[test]
    fn noscript_and_template_content_survive_serialization() {
        let doc = parse_html(
            r#"<!DOCTYPE html><body><noscript><img src="x.png"></noscript><template><p>tpl</p></template><article><a>A</a></article></body>"#,
        );
        let html = doc.to_html().unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"), "{html}");
        assert!(html.contains(r#"<noscript><img src="x.png"></noscript>"#), "{html}");
        assert!(html.contains("<template><p>tpl</p></template>"), "{html}");
        assert!(html.contains("<article><a>A</a></article>"), "{html}");
    }

    #[test]
    fn void_elements_have_no_closing_tag() {
        let doc = parse_html(r#"<body><img src="a.png"><br><p>x</p></body>"#);
        let html = doc.to_html().unwrap();
        assert!(html.contains(r#"<img src="a.png"><br><p>x</p>"#), "{html}");
        assert!(!html.contains("</img>"));
    }
}
