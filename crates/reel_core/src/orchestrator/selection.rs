//! Scene discovery and asset picking.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Strategy for choosing one asset among candidates.
pub trait AssetSelector: Send + Sync {
    /// Pick one of `candidates` (sorted by name), or `None` if empty.
    fn choose(&self, candidates: &[PathBuf]) -> Option<PathBuf>;
}

/// Uniformly random choice.
pub struct RandomSelector {
    rng: Mutex<StdRng>,
}

impl RandomSelector {
    /// Seeded from the OS.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible choices.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetSelector for RandomSelector {
    fn choose(&self, candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates.choose(&mut *self.rng.lock()).cloned()
    }
}

/// Always the first candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstSelector;

impl AssetSelector for FirstSelector {
    fn choose(&self, candidates: &[PathBuf]) -> Option<PathBuf> {
        candidates.first().cloned()
    }
}

/// Whether a folder name is a scene label (one uppercase ASCII letter).
pub fn is_scene_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

/// Scene folders of a product directory, in name order.
pub fn list_scene_dirs(product_dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut scenes = Vec::new();
    for entry in fs::read_dir(product_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_scene_name(&name) && entry.file_type()?.is_dir() {
            scenes.push((name, entry.path()));
        }
    }
    scenes.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(scenes)
}

/// Regular files in `dir` (not recursive) whose extension matches, sorted.
///
/// Extensions compare case-insensitively and may be given with or without
/// a leading dot.
pub fn list_candidates(dir: &Path, extensions: &[String]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        if has_extension(&path, extensions) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Pick one matching file from `dir`.
pub fn pick_asset(
    dir: &Path,
    extensions: &[String],
    selector: &dyn AssetSelector,
) -> io::Result<Option<PathBuf>> {
    let candidates = list_candidates(dir, extensions)?;
    Ok(selector.choose(&candidates))
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.').to_lowercase() == ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn scene_names_are_single_uppercase_letters() {
        assert!(is_scene_name("A"));
        assert!(is_scene_name("Z"));
        assert!(!is_scene_name("a"));
        assert!(!is_scene_name("AB"));
        assert!(!is_scene_name("成品"));
        assert!(!is_scene_name(""));
    }

    #[test]
    fn scene_dirs_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        for name in ["C", "A", "B", "成品", "temp_1_abc123", "lower"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("D"), b"not a dir").unwrap();

        let names: Vec<String> = list_scene_dirs(dir.path())
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn candidates_match_extension_case_insensitively() {
        let dir = tempdir().unwrap();
        for name in ["b.MP3", "a.mp3", "clip.mp4", "notes.txt"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("folder.mp3")).unwrap();

        let found = list_candidates(dir.path(), &exts(&[".mp3"])).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("a.mp3"), dir.path().join("b.MP3")]
        );
    }

    #[test]
    fn pick_asset_none_when_no_match() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("clip.mp4"), b"").unwrap();
        let picked = pick_asset(dir.path(), &exts(&["png"]), &FirstSelector).unwrap();
        assert!(picked.is_none());
    }

    #[test]
    fn seeded_selector_is_reproducible() {
        let candidates: Vec<PathBuf> = (0..10).map(|i| PathBuf::from(format!("{}.mp4", i))).collect();
        let a = RandomSelector::seeded(7);
        let b = RandomSelector::seeded(7);
        for _ in 0..5 {
            let pick = a.choose(&candidates);
            assert_eq!(pick, b.choose(&candidates));
            assert!(candidates.contains(&pick.unwrap()));
        }
        assert!(a.choose(&[]).is_none());
    }
}
