use std::path::PathBuf;

use ftml_core::{build_map, MapError, MapOptions, MetaValue, Topic, BUNDLE_ID_KEY, TITLE_KEY};
use ftml_logging::{ftml_debug, ftml_info};

use crate::archive::{build_archive, verify_archive, ArchiveError, ASSET_FOLDER};
use crate::discover::ExportFolder;
use crate::page::{extract_metadata, load_page};
use crate::persist::{AtomicFileWriter, PersistError};
use crate::toc::{TocSelectors, TopicExtractor};
use crate::types::ExtractError;

/// Meta injected into the index page to tag the publishing customer.
pub const CUSTOMER_KEY: &str = "customer";
pub const MAP_EXTENSION: &str = "ftmap";

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub customer: Option<String>,
    pub asset_folder: String,
    pub selectors: TocSelectors,
    pub map: MapOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            customer: None,
            asset_folder: ASSET_FOLDER.to_string(),
            selectors: TocSelectors::default(),
            map: MapOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub lang: String,
    pub bundle_id: String,
    pub map_path: PathBuf,
    pub archive_path: PathBuf,
    /// Topics in the map, index page included.
    pub topic_count: usize,
    pub collected_files: Vec<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("malformed export: {0}")]
    Extract(#[from] ExtractError),
    #[error("map error: {0}")]
    Map(#[from] MapError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("archive error: {0}")]
    Archive(#[from] ArchiveError),
}

/// Converts one language folder into `<bundle-id>.ftmap` and `<bundle-id>.zip`.
pub fn build_export_archive(
    export: &ExportFolder,
    options: &ConvertOptions,
) -> Result<ArchiveSummary, PipelineError> {
    ftml_info!("working on {:?}", export.toc_file);
    let extractor = TopicExtractor::new(&export.folder, &options.selectors)?;
    let mut topics = extractor.extract_file(&export.toc_file)?;
    ftml_info!("{} top-level nodes to add to the map", topics.len());

    let index_page = load_page(&export.index_file)?;
    let mut metadata = extract_metadata(&index_page).map_err(|source| ExtractError::Metadata {
        path: export.index_file.clone(),
        source,
    })?;
    if let Some(customer) = &options.customer {
        metadata.set(CUSTOMER_KEY, MetaValue::Single(customer.clone()));
    }
    let bundle_id = metadata
        .first(BUNDLE_ID_KEY)
        .ok_or_else(|| ExtractError::MissingMeta {
            path: export.index_file.clone(),
            key: BUNDLE_ID_KEY.to_string(),
        })?
        .to_string();

    let index_content = extractor
        .content_extractor()
        .extract(&index_page)
        .map_err(|source| ExtractError::Content {
            path: export.index_file.clone(),
            source,
        })?;
    let index_name = file_name(&export.index_file);
    let index_stem = Topic::id_from_link(&index_name);
    let index_topic = Topic::new(metadata.first(TITLE_KEY).unwrap_or_default(), index_name)
        .with_id(format!("{bundle_id}_{index_stem}"))
        .with_content(index_content)
        .with_metadata(metadata.clone());
    topics.insert(0, index_topic);

    let built = build_map(&metadata, &topics, &options.map)?;
    ftml_debug!("map collected files: {:?}", built.collected_files);
    let xml = built.document.to_xml()?;
    let map_name = format!("{}.{MAP_EXTENSION}", built.document.file_stem());
    let map_path = AtomicFileWriter::new(export.folder.clone()).write(&map_name, xml)?;

    let archive_path = build_archive(&export.folder, &map_path, &topics, &options.asset_folder)?;
    verify_archive(&archive_path, &built.collected_files)?;

    Ok(ArchiveSummary {
        lang: export.lang.clone(),
        bundle_id,
        map_path,
        archive_path,
        topic_count: built.collected_files.len(),
        collected_files: built.collected_files,
    })
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
