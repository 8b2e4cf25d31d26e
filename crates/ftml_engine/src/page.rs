use std::fs;
use std::path::Path;

use ftml_core::{Metadata, MetadataError};
use scraper::{Html, Selector};

use crate::decode::decode_html;
use crate::types::ExtractError;

/// Reads, decodes and parses one exported HTML page.
pub fn load_page(path: &Path) -> Result<Html, ExtractError> {
    let bytes = fs::read(path).map_err(|source| ExtractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = decode_html(&bytes).map_err(|source| ExtractError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Html::parse_document(&decoded.html))
}

/// Collects the page title plus every `<meta name=.. content=..>` pair.
///
/// A name seen more than once turns into a list of its values in document order.
pub fn extract_metadata(doc: &Html) -> Result<Metadata, MetadataError> {
    let title_sel = Selector::parse("title").ok();
    let meta_sel = Selector::parse("meta").ok();

    let title = title_sel
        .as_ref()
        .and_then(|sel| doc.select(sel).next())
        .map(|t| t.text().collect::<String>().trim().to_string())
        .unwrap_or_default();
    let mut metadata = Metadata::with_title(title);

    if let Some(sel) = meta_sel.as_ref() {
        for meta in doc.select(sel) {
            let element = meta.value();
            if let (Some(name), Some(content)) = (element.attr("name"), element.attr("content")) {
                metadata.append(name, content)?;
            }
        }
    }
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::extract_metadata;
    use ftml_core::{MetaValue, TITLE_KEY};
    use scraper::Html;

    const PAGE: &str = r#"<html><head>
        <title> Getting started </title>
        <meta charset="utf-8">
        <meta name="bundle-id" content="B1">
        <meta name="audience" content="admin">
        <meta name="audience" content="user">
        <meta name="no-content">
        <meta content="orphan">
    </head><body></body></html>"#;

    #[test]
    fn title_is_seeded_first_and_duplicates_collect() {
        let doc = Html::parse_document(PAGE);
        let metas = extract_metadata(&doc).unwrap();
        let keys: Vec<_> = metas.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![TITLE_KEY, "bundle-id", "audience"]);
        assert_eq!(metas.first(TITLE_KEY), Some("Getting started"));
        assert_eq!(metas.get("bundle-id"), Some(&MetaValue::Single("B1".into())));
        assert_eq!(
            metas.get("audience"),
            Some(&MetaValue::Multiple(vec!["admin".into(), "user".into()]))
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let doc = Html::parse_document(PAGE);
        assert_eq!(extract_metadata(&doc).unwrap(), extract_metadata(&doc).unwrap());
    }

    #[test]
    fn missing_title_yields_empty_entry() {
        let doc = Html::parse_document("<html><head></head><body></body></html>");
        let metas = extract_metadata(&doc).unwrap();
        assert_eq!(metas.first(TITLE_KEY), Some(""));
        assert_eq!(metas.len(), 1);
    }
}
