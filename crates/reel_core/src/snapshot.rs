//! Directory tree snapshots.
//!
//! Produces the `{root, structure}` payload a directory monitor publishes
//! when a product folder changes: a depth-limited tree with file sizes and
//! flags for video files and already-processed outputs.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

/// Extensions recognised as video files (lowercase, without dot).
pub const VIDEO_EXTENSIONS: [&str; 10] = [
    "mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v", "3gp", "ogg",
];

/// Entry type in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    File,
    Directory,
}

/// One file or folder in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryItem {
    pub name: String,
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// File size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Folder contents (empty past the depth limit).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirectoryItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_video: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_processed: Option<bool>,
}

/// A scanned tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub root: PathBuf,
    pub structure: Vec<DirectoryItem>,
}

impl DirectorySnapshot {
    /// Number of entries in the whole tree.
    pub fn len(&self) -> usize {
        fn count(items: &[DirectoryItem]) -> usize {
            items
                .iter()
                .map(|item| 1 + item.children.as_deref().map_or(0, count))
                .sum()
        }
        count(&self.structure)
    }

    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
    }
}

/// Scan `root` down to `max_depth` levels of subfolders.
///
/// Hidden entries (leading `.`) are skipped. Entries that cannot be read
/// below the root are skipped with a warning; an unreadable root is an error.
pub fn scan(root: &Path, max_depth: usize) -> io::Result<DirectorySnapshot> {
    fs::read_dir(root)?;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth + 1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    // Walk order is pre-order and sorted, so each folder's list keeps name order
    let mut by_parent: HashMap<PathBuf, Vec<DirectoryItem>> = HashMap::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", entry.path().display(), e);
                continue;
            }
        };
        let parent = entry.path().parent().map(Path::to_path_buf).unwrap_or_default();
        by_parent
            .entry(parent)
            .or_default()
            .push(to_item(&entry, &metadata));
    }

    let structure = attach_children(by_parent.remove(root).unwrap_or_default(), &mut by_parent);
    Ok(DirectorySnapshot {
        root: root.to_path_buf(),
        structure,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn to_item(entry: &DirEntry, metadata: &fs::Metadata) -> DirectoryItem {
    let name = entry.file_name().to_string_lossy().into_owned();
    let path = entry.path().to_path_buf();

    if metadata.is_dir() {
        DirectoryItem {
            name,
            path,
            item_type: ItemType::Directory,
            size: None,
            children: Some(Vec::new()),
            is_video: None,
            is_processed: None,
        }
    } else {
        let is_video = is_video_file(&path);
        DirectoryItem {
            is_processed: Some(is_video && is_processed_name(&name)),
            name,
            path,
            item_type: ItemType::File,
            size: Some(metadata.len()),
            children: None,
            is_video: Some(is_video),
        }
    }
}

fn attach_children(
    mut items: Vec<DirectoryItem>,
    by_parent: &mut HashMap<PathBuf, Vec<DirectoryItem>>,
) -> Vec<DirectoryItem> {
    for item in &mut items {
        if item.item_type == ItemType::Directory {
            let children = by_parent.remove(&item.path).unwrap_or_default();
            item.children = Some(attach_children(children, by_parent));
        }
    }
    items
}

/// Whether the extension is a known video extension (case-insensitive).
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a file name looks like `<name>---<digits>.mp4`.
pub fn is_processed_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".mp4") else {
        return false;
    };
    let Some((head, digits)) = stem.rsplit_once("---") else {
        return false;
    };
    !head.is_empty() && !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}
