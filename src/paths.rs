use crate::coordinate::{parse_year, Quarter, SnapshotCoordinate};
use crate::dataset::Dataset;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::{DirEntry, WalkDir};

/// A candidate snapshot file and the coordinate parsed from its location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotFile {
    pub coordinate: SnapshotCoordinate,
    pub path: PathBuf,
}

fn quarter_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+)\.json$").expect("quarter file pattern"))
}

/// Lazily enumerate `<root>/<state>/<year>/<quarter>.json`.
///
/// Entries are visited in file-name order so repeated runs see the same sequence.
/// Non-directories at the state/year levels are ignored; non-numeric years and
/// file names that are not `1.json`..`4.json` are skipped with a traversal diagnostic.
/// A missing root yields nothing and is logged at `warn`.
pub fn walk_snapshots<'a>(
    root: &Path,
    dataset: Dataset,
    diag: &'a Diagnostics,
) -> impl Iterator<Item = SnapshotFile> + 'a {
    let root = root_if_usable(root, dataset, diag);
    root.into_iter()
        .flat_map(move |root| subdirs(&root, dataset, diag))
        .flat_map(move |(state, state_dir)| {
            subdirs(&state_dir, dataset, diag)
                .filter_map(move |(name, year_dir)| match parse_year(&name) {
                    Ok(year) => Some((year, year_dir)),
                    Err(e) => {
                        diag.report(Some(dataset), Some(year_dir.as_path()), DiagnosticKind::Traversal, format!("{e}; skipped"));
                        None
                    }
                })
                .flat_map(move |(year, year_dir)| {
                    let state = state.clone();
                    quarter_files(&year_dir, dataset, diag).map(move |(quarter, path)| SnapshotFile {
                        coordinate: SnapshotCoordinate::new(state.clone(), year, quarter),
                        path,
                    })
                })
        })
}

fn root_if_usable(root: &Path, dataset: Dataset, diag: &Diagnostics) -> Option<PathBuf> {
    if !root.exists() {
        diag.report_warn(Some(dataset), Some(root), DiagnosticKind::Traversal, "snapshot root not found");
        return None;
    }
    if !root.is_dir() {
        diag.report_warn(Some(dataset), Some(root), DiagnosticKind::Traversal, "snapshot root is not a directory");
        return None;
    }
    Some(root.to_path_buf())
}

fn children<'a>(dir: &Path, dataset: Dataset, diag: &'a Diagnostics) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(ent) => Some(ent),
            Err(e) => {
                diag.report(Some(dataset), e.path(), DiagnosticKind::Traversal, format!("unreadable directory entry: {e}"));
                None
            }
        })
}

fn utf8_name(ent: &DirEntry, dataset: Dataset, diag: &Diagnostics) -> Option<String> {
    match ent.file_name().to_str() {
        Some(name) => Some(name.to_string()),
        None => {
            diag.report(Some(dataset), Some(ent.path()), DiagnosticKind::Traversal, "entry name is not valid UTF-8; skipped");
            None
        }
    }
}

fn subdirs<'a>(dir: &Path, dataset: Dataset, diag: &'a Diagnostics) -> impl Iterator<Item = (String, PathBuf)> + 'a {
    children(dir, dataset, diag)
        .filter(|ent| ent.file_type().is_dir())
        .filter_map(move |ent| utf8_name(&ent, dataset, diag).map(|name| (name, ent.into_path())))
}

fn quarter_files<'a>(dir: &Path, dataset: Dataset, diag: &'a Diagnostics) -> impl Iterator<Item = (Quarter, PathBuf)> + 'a {
    children(dir, dataset, diag)
        .filter(|ent| ent.file_type().is_file())
        .filter_map(move |ent| {
            let name = utf8_name(&ent, dataset, diag)?;
            let quarter = quarter_file_re()
                .captures(&name)
                .and_then(|caps| caps[1].parse::<u8>().ok())
                .and_then(Quarter::new);
            match quarter {
                Some(q) => Some((q, ent.into_path())),
                None => {
                    diag.report(Some(dataset), Some(ent.path()), DiagnosticKind::Traversal, "not a quarter file (expected 1.json..4.json); skipped");
                    None
                }
            }
        })
}
