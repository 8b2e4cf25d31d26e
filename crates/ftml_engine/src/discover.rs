use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One language folder of an authoring export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFolder {
    pub lang: String,
    pub folder: PathBuf,
    pub toc_file: PathBuf,
    pub index_file: PathBuf,
}

impl ExportFolder {
    /// `Some` when `folder` holds both `toc-<lang>.html` and `index-<lang>.html`.
    pub fn probe(folder: &Path) -> Option<Self> {
        let lang = folder.file_name()?.to_str()?.to_string();
        let toc_file = folder.join(format!("toc-{lang}.html"));
        let index_file = folder.join(format!("index-{lang}.html"));
        if !toc_file.is_file() || !index_file.is_file() {
            return None;
        }
        Some(Self {
            lang,
            folder: folder.to_path_buf(),
            toc_file,
            index_file,
        })
    }
}

/// Language folders under `root`, in name order.
///
/// Only two-character, non-hidden directory names are considered.
pub fn find_export_folders(root: &Path) -> io::Result<Vec<ExportFolder>> {
    let mut entries: Vec<_> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    Ok(entries
        .into_iter()
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            !name.starts_with('.') && name.chars().count() == 2
        })
        .filter_map(|e| ExportFolder::probe(&e.path()))
        .collect())
}
