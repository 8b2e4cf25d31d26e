//! FT map serialization with quick-xml.
//!
//! Layout written by [`MapDocument::to_xml`]:
//!
//! ```text
//! <ft:map ft:lang ft:title ft:originID ft:editorialType>
//!     <ft:toc>
//!         <ft:node ft:title ft:originID href [type="topics"]>
//!             <ft:metas><ft:meta key="k">v</ft:meta>...</ft:metas>
//!             <ft:node>...</ft:node>
//!         </ft:node>
//!     </ft:toc>
//!     <ft:metas>...</ft:metas>
//! </ft:map>
//! ```

use std::io::Write;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::map::{MapDocument, MapError, MapNode};
use crate::metadata::Metadata;

pub const FT_NAMESPACE: &str = "http://ref.fluidtopics.com/v3/ft#";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

const SCHEMA_LOCATION: &str = "ftmap.xsd";
const SPLITTABLE_TYPE: &str = "topics";
const INDENT: usize = 4;

impl MapDocument {
    /// Pretty-printed UTF-8 document with an XML declaration.
    pub fn to_xml(&self) -> Result<String, MapError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new("ft:map");
        root.push_attribute(("xmlns:ft", FT_NAMESPACE));
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:noNamespaceSchemaLocation", SCHEMA_LOCATION));
        root.push_attribute(("ft:lang", xml_text("ft:lang", &self.lang)?));
        root.push_attribute(("ft:title", xml_text("ft:title", &self.title)?));
        root.push_attribute(("ft:originID", xml_text("ft:originID", &self.origin_id)?));
        root.push_attribute((
            "ft:editorialType",
            xml_text("ft:editorialType", &self.editorial_type)?,
        ));
        writer.write_event(Event::Start(root))?;

        if self.nodes.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("ft:toc")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("ft:toc")))?;
            for node in &self.nodes {
                write_node(&mut writer, node)?;
            }
            writer.write_event(Event::End(BytesEnd::new("ft:toc")))?;
        }
        write_metas(&mut writer, &self.metas)?;

        writer.write_event(Event::End(BytesEnd::new("ft:map")))?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        Ok(String::from_utf8(bytes)?)
    }

    /// Parses a document produced by [`MapDocument::to_xml`].
    pub fn from_xml(xml: &str) -> Result<MapDocument, MapError> {
        // Text is only collected inside ft:meta, so indentation needs no trimming.
        let mut reader = Reader::from_str(xml);

        let mut document: Option<MapDocument> = None;
        let mut open_nodes: Vec<MapNode> = Vec::new();
        let mut open_meta: Option<(String, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.name().as_ref() {
                    b"ft:map" => document = Some(read_root(&e)?),
                    b"ft:node" => open_nodes.push(read_node(&e)?),
                    b"ft:meta" => open_meta = Some((required(&e, b"key")?, String::new())),
                    _ => {}
                },
                Event::Empty(e) => match e.name().as_ref() {
                    b"ft:node" => {
                        let node = read_node(&e)?;
                        attach_node(&mut document, &mut open_nodes, node)?;
                    }
                    b"ft:meta" => {
                        let key = required(&e, b"key")?;
                        metas_target(&mut document, &mut open_nodes)?.append(key, "")?;
                    }
                    _ => {}
                },
                Event::Text(e) => {
                    if let Some((_, text)) = open_meta.as_mut() {
                        let raw = String::from_utf8(e.as_ref().to_vec())?;
                        text.push_str(&unescape(&raw)?);
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some((_, text)) = open_meta.as_mut() {
                        let name = String::from_utf8(e.as_ref().to_vec())?;
                        text.push_str(&unescape(&format!("&{name};"))?);
                    }
                }
                Event::End(e) => match e.name().as_ref() {
                    b"ft:node" => {
                        let node = open_nodes
                            .pop()
                            .ok_or_else(|| MapError::Malformed("unbalanced ft:node".into()))?;
                        attach_node(&mut document, &mut open_nodes, node)?;
                    }
                    b"ft:meta" => {
                        if let Some((key, value)) = open_meta.take() {
                            metas_target(&mut document, &mut open_nodes)?.append(key, value)?;
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        document.ok_or_else(|| MapError::Malformed("missing ft:map root".into()))
    }
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &MapNode) -> Result<(), MapError> {
    let mut start = BytesStart::new("ft:node");
    start.push_attribute(("ft:title", xml_text("ft:title", &node.title)?));
    start.push_attribute(("ft:originID", xml_text("ft:originID", &node.origin_id)?));
    start.push_attribute(("href", xml_text("href", &node.href)?));
    if node.splittable {
        start.push_attribute(("type", SPLITTABLE_TYPE));
    }
    writer.write_event(Event::Start(start))?;
    write_metas(writer, &node.metas)?;
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("ft:node")))?;
    Ok(())
}

fn write_metas<W: Write>(writer: &mut Writer<W>, metas: &Metadata) -> Result<(), MapError> {
    if metas.is_empty() {
        writer.write_event(Event::Empty(BytesStart::new("ft:metas")))?;
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("ft:metas")))?;
    for (key, value) in metas.iter() {
        let key = xml_text("ft:meta key", key)?;
        for item in value.values() {
            writer
                .create_element("ft:meta")
                .with_attribute(("key", key))
                .write_text_content(BytesText::new(xml_text(key, item)?))?;
        }
    }
    writer.write_event(Event::End(BytesEnd::new("ft:metas")))?;
    Ok(())
}

/// `value` unchanged when every char matches the XML 1.0 `Char` production.
fn xml_text<'a>(field: &str, value: &'a str) -> Result<&'a str, MapError> {
    match value.chars().find(|c| !is_xml_char(*c)) {
        None => Ok(value),
        Some(ch) => Err(MapError::InvalidChar {
            field: field.to_string(),
            ch,
        }),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..
    )
}

fn read_root(e: &BytesStart<'_>) -> Result<MapDocument, MapError> {
    Ok(MapDocument {
        title: optional(e, b"ft:title")?.unwrap_or_default(),
        origin_id: required(e, b"ft:originID")?,
        editorial_type: optional(e, b"ft:editorialType")?.unwrap_or_default(),
        lang: optional(e, b"ft:lang")?.unwrap_or_default(),
        metas: Metadata::new(),
        nodes: Vec::new(),
    })
}

fn read_node(e: &BytesStart<'_>) -> Result<MapNode, MapError> {
    Ok(MapNode {
        title: optional(e, b"ft:title")?.unwrap_or_default(),
        origin_id: required(e, b"ft:originID")?,
        href: required(e, b"href")?,
        splittable: optional(e, b"type")?.as_deref() == Some(SPLITTABLE_TYPE),
        metas: Metadata::new(),
        children: Vec::new(),
    })
}

fn attach_node(
    document: &mut Option<MapDocument>,
    open_nodes: &mut [MapNode],
    node: MapNode,
) -> Result<(), MapError> {
    match open_nodes.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document
            .as_mut()
            .ok_or_else(|| MapError::Malformed("ft:node outside ft:map".into()))?
            .nodes
            .push(node),
    }
    Ok(())
}

/// Metas belong to the innermost open node, or to the root once the TOC is closed.
fn metas_target<'a>(
    document: &'a mut Option<MapDocument>,
    open_nodes: &'a mut [MapNode],
) -> Result<&'a mut Metadata, MapError> {
    match open_nodes.last_mut() {
        Some(node) => Ok(&mut node.metas),
        None => document
            .as_mut()
            .map(|doc| &mut doc.metas)
            .ok_or_else(|| MapError::Malformed("ft:meta outside ft:map".into())),
    }
}

fn optional(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, MapError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == name {
            let raw = String::from_utf8(attr.value.to_vec())?;
            return Ok(Some(unescape(&raw)?.into_owned()));
        }
    }
    Ok(None)
}

fn required(e: &BytesStart<'_>, name: &[u8]) -> Result<String, MapError> {
    optional(e, name)?.ok_or_else(|| {
        MapError::Malformed(format!(
            "<{}> lacks attribute {}",
            String::from_utf8_lossy(e.name().as_ref()),
            String::from_utf8_lossy(name)
        ))
    })
}

#[cfg(test)]
mod tests {
    use crate::{MapDocument, MapError, MapNode, MetaValue, Metadata};

    fn leaf(title: &str, href: &str) -> MapNode {
        MapNode {
            title: title.to_string(),
            origin_id: href.split('.').next().unwrap().to_string(),
            href: href.to_string(),
            splittable: true,
            metas: Metadata::new(),
            children: Vec::new(),
        }
    }

    #[test]
    fn type_attribute_only_on_leaves() {
        let mut parent = leaf("Parent", "parent.html");
        parent.splittable = false;
        parent.children.push(leaf("Child", "child.html"));
        let doc = MapDocument {
            title: "Guide".into(),
            origin_id: "B1".into(),
            editorial_type: "book".into(),
            lang: "en-US".into(),
            metas: Metadata::new(),
            nodes: vec![parent],
        };
        let xml = doc.to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(r#"href="parent.html">"#));
        assert!(xml.contains(r#"href="child.html" type="topics">"#));
        assert!(xml.contains(r#"xmlns:ft="http://ref.fluidtopics.com/v3/ft#""#));
    }

    #[test]
    fn special_characters_survive_a_read_back() {
        let mut metas = Metadata::new();
        metas.set(
            "keywords",
            MetaValue::Multiple(vec!["R&D".into(), "<draft>".into()]),
        );
        let mut node = leaf("Q & A \"FAQ\"", "faq.html");
        node.metas = metas.clone();
        let doc = MapDocument {
            title: "Tom's guide".into(),
            origin_id: "B2".into(),
            editorial_type: "article".into(),
            lang: "fr-FR".into(),
            metas,
            nodes: vec![node],
        };
        let parsed = MapDocument::from_xml(&doc.to_xml().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }

    #[test]
    fn control_characters_are_refused() {
        let mut node = leaf("Intro", "intro.html");
        node.metas.append("keywords", "a\u{1}b").unwrap();
        let doc = MapDocument {
            title: "Guide".into(),
            origin_id: "B1".into(),
            editorial_type: "book".into(),
            lang: "en-US".into(),
            metas: Metadata::new(),
            nodes: vec![node],
        };
        let err = doc.to_xml().unwrap_err();
        assert!(matches!(
            err,
            MapError::InvalidChar { ref field, ch: '\u{1}' } if field == "keywords"
        ));

        let titled = MapDocument {
            title: "form\u{c}feed".into(),
            nodes: Vec::new(),
            ..doc
        };
        assert!(matches!(
            titled.to_xml().unwrap_err(),
            MapError::InvalidChar { ch: '\u{c}', .. }
        ));
    }

    #[test]
    fn tabs_newlines_and_astral_chars_are_kept() {
        let mut metas = Metadata::new();
        metas.append("note", "line one\n\tline two \u{1F4D8}").unwrap();
        let doc = MapDocument {
            title: "Guide".into(),
            origin_id: "B1".into(),
            editorial_type: "book".into(),
            lang: "en-US".into(),
            metas,
            nodes: Vec::new(),
        };
        let parsed = MapDocument::from_xml(&doc.to_xml().unwrap()).unwrap();
        assert_eq!(parsed, doc);
    }
}
