//! Conversion engine: export discovery, topic extraction, archiving and publishing.
mod archive;
mod content;
mod decode;
mod discover;
mod page;
mod persist;
mod pipeline;
mod publish;
mod toc;
mod types;

pub use archive::{build_archive, verify_archive, ArchiveError, ASSET_FOLDER};
pub use content::{
    ContentError, ContentExtractor, SectionContentExtractor, CONTENT_SELECTOR, TITLE_PAGE_SELECTOR,
};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use discover::{find_export_folders, ExportFolder};
pub use page::{extract_metadata, load_page};
pub use persist::{AtomicFileWriter, PersistError};
pub use pipeline::{
    build_export_archive, ArchiveSummary, ConvertOptions, PipelineError, CUSTOMER_KEY,
    MAP_EXTENSION,
};
pub use publish::{PublishSettings, PublishTarget, Publisher, ReqwestPublisher};
pub use toc::{TocSelectors, TopicExtractor};
pub use types::{ExtractError, PublishError, PublishFailure};
