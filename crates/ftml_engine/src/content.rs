use ego_tree::{NodeId, NodeRef};
use quick_xml::escape::{escape, partial_escape};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Container holding the topic body in an exported page.
pub const CONTENT_SELECTOR: &str = "div#topic-content > section";
/// Decorative heading block repeated from the TOC title.
pub const TITLE_PAGE_SELECTOR: &str = "div.titlepage";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];
const RAW_TEXT_ELEMENTS: &[&str] = &["pre", "script", "style", "textarea"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("no element matches `{0}`")]
    MissingContainer(String),
    #[error("invalid selector `{0}`")]
    Selector(String),
}

pub trait ContentExtractor: Send + Sync {
    fn extract(&self, doc: &Html) -> Result<String, ContentError>;
}

/// Keeps the topic `<section>`, drops its title block and re-serializes it
/// inside a bare `<html>` shell with one-space indentation.
#[derive(Debug, Clone)]
pub struct SectionContentExtractor {
    container: String,
    stripped: String,
}

impl SectionContentExtractor {
    pub fn new(container: impl Into<String>, stripped: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            stripped: stripped.into(),
        }
    }
}

impl Default for SectionContentExtractor {
    fn default() -> Self {
        Self::new(CONTENT_SELECTOR, TITLE_PAGE_SELECTOR)
    }
}

impl ContentExtractor for SectionContentExtractor {
    fn extract(&self, doc: &Html) -> Result<String, ContentError> {
        let container_sel = Selector::parse(&self.container)
            .map_err(|_| ContentError::Selector(self.container.clone()))?;
        let stripped_sel = Selector::parse(&self.stripped)
            .map_err(|_| ContentError::Selector(self.stripped.clone()))?;

        let section = doc
            .select(&container_sel)
            .next()
            .ok_or_else(|| ContentError::MissingContainer(self.container.clone()))?;
        let skip = section.select(&stripped_sel).next().map(|e| e.id());

        let mut out = String::from("<html>\n");
        write_node(*section, 1, skip, &mut out);
        out.push_str("</html>\n");
        Ok(out)
    }
}

fn write_node(node: NodeRef<'_, Node>, depth: usize, skip: Option<NodeId>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                indent(out, depth);
                out.push_str(&partial_escape(trimmed));
                out.push('\n');
            }
        }
        Node::Comment(comment) => {
            indent(out, depth);
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->\n");
        }
        Node::Element(element) => {
            if Some(node.id()) == skip {
                return;
            }
            let name = element.name();
            indent(out, depth);
            out.push('<');
            out.push_str(name);
            // Sorted so the output does not depend on the parser's attribute storage.
            let mut attrs: Vec<(&str, &str)> = element.attrs().collect();
            attrs.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                out.push_str(&escape(value));
                out.push('"');
            }
            out.push('>');

            if VOID_ELEMENTS.contains(&name) {
                out.push('\n');
                return;
            }
            if RAW_TEXT_ELEMENTS.contains(&name) {
                // Whitespace is significant here; keep the subtree as parsed.
                if let Some(element_ref) = ElementRef::wrap(node) {
                    out.push_str(&element_ref.inner_html());
                }
            } else {
                out.push('\n');
                for child in node.children() {
                    write_node(child, depth + 1, skip, out);
                }
                indent(out, depth);
            }
            out.push_str("</");
            out.push_str(name);
            out.push_str(">\n");
        }
        _ => {
            for child in node.children() {
                write_node(child, depth, skip, out);
            }
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push(' ');
    }
}
