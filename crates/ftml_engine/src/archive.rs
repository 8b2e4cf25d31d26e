use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Seek, Write};
use std::path::{Component, Path, PathBuf};

use ftml_core::{flatten_preorder, Topic};
use ftml_logging::{ftml_debug, ftml_info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::persist::{AtomicFileWriter, PersistError};

/// Default export subfolder whose files ship with the archive.
pub const ASSET_FOLDER: &str = "image";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("two archive entries would be named {0}")]
    DuplicateEntry(String),
    #[error("archive lacks entry {0}")]
    MissingEntry(String),
    #[error("{0:?} cannot be stored as an archive entry")]
    InvalidPath(PathBuf),
}

/// Zips the map, every topic page and the asset files into `{folder}/{map stem}.zip`.
pub fn build_archive(
    folder: &Path,
    map_file: &Path,
    topics: &[Topic],
    asset_folder: &str,
) -> Result<PathBuf, ArchiveError> {
    let stem = map_file
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ArchiveError::InvalidPath(map_file.to_path_buf()))?;
    let archive_name = format!("{stem}.zip");
    let assets = list_assets(&folder.join(asset_folder))?;

    let writer = AtomicFileWriter::new(folder.to_path_buf());
    let path = writer.write_with(&archive_name, |file| -> Result<(), ArchiveError> {
        let mut zip = ZipWriter::new(file);
        let mut entries = EntrySet::default();

        let map_entry = entry_name(map_file.strip_prefix(folder).unwrap_or(map_file))?;
        entries.claim(&map_entry)?;
        add_file(&mut zip, &map_entry, map_file)?;

        for topic in flatten_preorder(topics) {
            let entry = entry_name(Path::new(&topic.link))?;
            entries.claim(&entry)?;
            zip.start_file(entry.as_str(), deflated())?;
            zip.write_all(topic.content.as_bytes())?;
        }

        for asset in &assets {
            let entry = entry_name(asset.strip_prefix(folder).unwrap_or(asset))?;
            entries.claim(&entry)?;
            add_file(&mut zip, &entry, asset)?;
        }

        zip.finish()?;
        ftml_debug!("wrote {} archive entries", entries.len());
        Ok(())
    })?;

    ftml_info!("archive ready at {:?}", path);
    Ok(path)
}

/// Checks that every file referenced by the map made it into the archive.
pub fn verify_archive(archive: &Path, expected: &[PathBuf]) -> Result<(), ArchiveError> {
    let zip = ZipArchive::new(File::open(archive)?)?;
    let present: HashSet<&str> = zip.file_names().collect();
    for path in expected {
        let entry = entry_name(path)?;
        if !present.contains(entry.as_str()) {
            return Err(ArchiveError::MissingEntry(entry));
        }
    }
    Ok(())
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    entry: &str,
    source: &Path,
) -> Result<(), ArchiveError> {
    let bytes = fs::read(source)?;
    zip.start_file(entry, deflated())?;
    zip.write_all(&bytes)?;
    Ok(())
}

/// Regular files directly under `dir`, sorted; a missing folder has no assets.
fn list_assets(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .collect();
    files.sort();
    Ok(files)
}

/// Relative, `/`-separated entry name; rejects absolute paths and `..`.
fn entry_name(path: &Path) -> Result<String, ArchiveError> {
    let mut parts = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(
                part.to_str()
                    .ok_or_else(|| ArchiveError::InvalidPath(path.to_path_buf()))?,
            ),
            Component::CurDir => {}
            _ => return Err(ArchiveError::InvalidPath(path.to_path_buf())),
        }
    }
    if parts.is_empty() {
        return Err(ArchiveError::InvalidPath(path.to_path_buf()));
    }
    Ok(parts.join("/"))
}

#[derive(Default)]
struct EntrySet(HashSet<String>);

impl EntrySet {
    fn claim(&mut self, entry: &str) -> Result<(), ArchiveError> {
        if self.0.insert(entry.to_string()) {
            Ok(())
        } else {
            Err(ArchiveError::DuplicateEntry(entry.to_string()))
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}
