//! ftml core: topic tree, metadata and FT map model.
mod map;
mod metadata;
mod topic;
mod xml;

pub use map::{
    build_map, BuiltMap, MapDocument, MapError, MapNode, MapOptions, BUNDLE_ID_KEY,
    EDITORIAL_TYPE_KEY, LANG_KEY,
};
pub use metadata::{MetaValue, Metadata, MetadataError, TITLE_KEY};
pub use topic::{flatten_preorder, Topic};
pub use xml::{FT_NAMESPACE, XSI_NAMESPACE};
