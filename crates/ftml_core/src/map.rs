use std::path::PathBuf;

use crate::metadata::{Metadata, MetadataError, TITLE_KEY};
use crate::topic::Topic;

/// Meta carrying the bundle identifier; becomes the map's origin id and file stem.
pub const BUNDLE_ID_KEY: &str = "bundle-id";
pub const EDITORIAL_TYPE_KEY: &str = "ft:editorialType";
pub const LANG_KEY: &str = "ft:lang";

/// Raw `<meta name="title">` key, already expressed by the root title attribute.
const RAW_TITLE_KEY: &str = "title";

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("index metadata has no `{0}` entry")]
    MissingMeta(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("invalid xml attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),
    #[error("invalid xml escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),
    #[error("map is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),
    #[error("malformed map: {0}")]
    Malformed(String),
    /// `field` holds a character XML 1.0 cannot represent, e.g. a C0 control.
    #[error("`{field}` contains {ch:?}, which is not allowed in XML 1.0")]
    InvalidChar { field: String, ch: char },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOptions {
    /// Keys left out of every `ft:metas` block because they are already attributes.
    pub excluded_metas: Vec<String>,
    pub default_editorial_type: String,
    pub default_lang: String,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            excluded_metas: vec![TITLE_KEY.to_string()],
            default_editorial_type: "book".to_string(),
            default_lang: "en-US".to_string(),
        }
    }
}

/// In-memory FT map: document attributes, root metas and the TOC tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDocument {
    pub title: String,
    pub origin_id: String,
    pub editorial_type: String,
    pub lang: String,
    pub metas: Metadata,
    pub nodes: Vec<MapNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapNode {
    pub title: String,
    pub origin_id: String,
    pub href: String,
    /// Serialized as `type="topics"`. Only childless nodes may be split by the portal.
    pub splittable: bool,
    pub metas: Metadata,
    pub children: Vec<MapNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltMap {
    pub document: MapDocument,
    /// Every `href` of the TOC, pre-order.
    pub collected_files: Vec<PathBuf>,
}

impl MapDocument {
    /// Stem used for the map and archive file names.
    pub fn file_stem(&self) -> &str {
        &self.origin_id
    }

    /// All nodes, depth-first pre-order.
    pub fn flatten(&self) -> Vec<&MapNode> {
        fn visit<'a>(node: &'a MapNode, out: &mut Vec<&'a MapNode>) {
            out.push(node);
            for child in &node.children {
                visit(child, out);
            }
        }
        let mut out = Vec::new();
        for node in &self.nodes {
            visit(node, &mut out);
        }
        out
    }
}

/// Builds the FT map for `topics` using the document-level `metadata`
/// (usually read from the export's index page).
pub fn build_map(
    metadata: &Metadata,
    topics: &[Topic],
    options: &MapOptions,
) -> Result<BuiltMap, MapError> {
    let origin_id = metadata
        .first(BUNDLE_ID_KEY)
        .ok_or_else(|| MapError::MissingMeta(BUNDLE_ID_KEY.to_string()))?
        .to_string();
    let title = metadata.first(TITLE_KEY).unwrap_or_default().to_string();
    let editorial_type = metadata
        .first(EDITORIAL_TYPE_KEY)
        .unwrap_or(options.default_editorial_type.as_str())
        .to_string();
    let lang = metadata
        .first(LANG_KEY)
        .unwrap_or(options.default_lang.as_str())
        .to_string();

    let metas = metadata
        .without(&[RAW_TITLE_KEY])
        .without(options.excluded_metas.as_slice());

    let mut collected_files = Vec::new();
    let nodes = topics
        .iter()
        .map(|topic| build_node(topic, options, &mut collected_files))
        .collect();

    Ok(BuiltMap {
        document: MapDocument {
            title,
            origin_id,
            editorial_type,
            lang,
            metas,
            nodes,
        },
        collected_files,
    })
}

fn build_node(topic: &Topic, options: &MapOptions, collected: &mut Vec<PathBuf>) -> MapNode {
    collected.push(PathBuf::from(&topic.link));
    let children: Vec<MapNode> = topic
        .sub_topics
        .iter()
        .map(|child| build_node(child, options, collected))
        .collect();
    MapNode {
        title: topic.title.clone(),
        origin_id: topic.id.clone(),
        href: topic.link.clone(),
        splittable: children.is_empty(),
        metas: topic.metadata.without(options.excluded_metas.as_slice()),
        children,
    }
}
