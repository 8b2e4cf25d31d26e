use std::path::{Path, PathBuf};
use std::sync::Arc;

use ego_tree::NodeId;
use ftml_core::Topic;
use ftml_logging::{ftml_debug, ftml_trace};
use scraper::{ElementRef, Html, Selector};

use crate::content::{ContentExtractor, SectionContentExtractor};
use crate::page::{extract_metadata, load_page};
use crate::types::ExtractError;

/// CSS selectors locating topic anchors in the exported table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocSelectors {
    /// Anchors of the outermost list.
    pub top: String,
    /// Anchors of a nested list, matched inside that list only.
    pub nested: String,
}

impl Default for TocSelectors {
    fn default() -> Self {
        Self {
            top: "ul.toc > li > a.topic-link".to_string(),
            nested: "li > a.topic-link".to_string(),
        }
    }
}

/// Turns a TOC page into a topic tree, loading each linked page from `folder`.
pub struct TopicExtractor {
    folder: PathBuf,
    top: Selector,
    nested: Selector,
    list: Selector,
    content: Arc<dyn ContentExtractor>,
}

impl TopicExtractor {
    pub fn new(folder: impl Into<PathBuf>, selectors: &TocSelectors) -> Result<Self, ExtractError> {
        Ok(Self {
            folder: folder.into(),
            top: parse_selector(&selectors.top)?,
            nested: parse_selector(&selectors.nested)?,
            list: parse_selector("ul")?,
            content: Arc::new(SectionContentExtractor::default()),
        })
    }

    pub fn with_content_extractor(mut self, content: Arc<dyn ContentExtractor>) -> Self {
        self.content = content;
        self
    }

    pub fn content_extractor(&self) -> &dyn ContentExtractor {
        self.content.as_ref()
    }

    pub fn extract_file(&self, toc_file: &Path) -> Result<Vec<Topic>, ExtractError> {
        let toc = load_page(toc_file)?;
        self.extract(&toc)
    }

    /// Topics of `toc` in document order; nested lists become `sub_topics`.
    pub fn extract(&self, toc: &Html) -> Result<Vec<Topic>, ExtractError> {
        self.collect(toc.select(&self.top), None)
    }

    fn collect<'a>(
        &self,
        anchors: impl Iterator<Item = ElementRef<'a>>,
        list: Option<NodeId>,
    ) -> Result<Vec<Topic>, ExtractError> {
        let mut topics = Vec::new();
        for anchor in anchors {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if let Some(list_id) = list {
                let grandparent = anchor.parent().and_then(|li| li.parent()).map(|n| n.id());
                if grandparent != Some(list_id) {
                    ftml_trace!("skipping {href}: not a direct entry of the current list");
                    continue;
                }
            }
            if href.contains('#') {
                ftml_debug!("skipping {href}: in-page anchor");
                continue;
            }

            let sub_topics = match anchor
                .parent()
                .and_then(ElementRef::wrap)
                .and_then(|li| li.select(&self.list).next())
            {
                Some(sub_list) => self.collect(sub_list.select(&self.nested), Some(sub_list.id()))?,
                None => Vec::new(),
            };

            let title = anchor.text().collect::<String>().trim().to_string();
            topics.push(self.load_topic(title, href, sub_topics)?);
        }
        Ok(topics)
    }

    fn load_topic(
        &self,
        title: String,
        href: &str,
        sub_topics: Vec<Topic>,
    ) -> Result<Topic, ExtractError> {
        let path = self.folder.join(href);
        ftml_debug!("loading topic {href}");
        let page = load_page(&path)?;
        let metadata = extract_metadata(&page).map_err(|source| ExtractError::Metadata {
            path: path.clone(),
            source,
        })?;
        let content = self
            .content
            .extract(&page)
            .map_err(|source| ExtractError::Content { path, source })?;

        Ok(Topic::new(title, href)
            .with_metadata(metadata)
            .with_content(content)
            .with_sub_topics(sub_topics))
    }
}

fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css.to_string()))
}
