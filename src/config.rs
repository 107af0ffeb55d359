use crate::dataset::{Dataset, LoadMode};
use crate::extract::DEFAULT_TOP_DISTRICT_KEYS;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_DATA_ROOT: &str = "PULSE_ETL_DATA_ROOT";
pub const ENV_DATASETS: &str = "PULSE_ETL_DATASETS";
pub const ENV_TOP_DISTRICT_KEYS: &str = "PULSE_ETL_TOP_DISTRICT_KEYS";
pub const ENV_CONCURRENCY: &str = "PULSE_ETL_CONCURRENCY";

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub data_root: PathBuf,
    pub root_overrides: BTreeMap<Dataset, PathBuf>,
    pub datasets: Vec<Dataset>,          // load order
    pub top_district_keys: Vec<String>,  // tried in order
    pub load_modes: BTreeMap<Dataset, LoadMode>,
    pub read_buffer_bytes: usize,        // BufReader capacity
    pub progress: bool,
    pub progress_label: Option<String>,  // prefix for per-dataset spinners
    pub dataset_concurrency: usize,      // 1 = single-threaded
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("pulse/data"),
            root_overrides: BTreeMap::new(),
            datasets: Dataset::ALL.to_vec(),
            top_district_keys: DEFAULT_TOP_DISTRICT_KEYS.iter().map(|k| k.to_string()).collect(),
            load_modes: BTreeMap::new(),
            read_buffer_bytes: 64 * 1024,
            progress: false,
            progress_label: None,
            dataset_concurrency: 1,
        }
    }
}

impl ExtractOptions {
    pub fn with_data_root(mut self, root: impl AsRef<Path>) -> Self {
        self.data_root = root.as_ref().to_path_buf();
        self
    }
    /// Read `dataset` from `root` instead of its default location under the data root.
    pub fn with_dataset_root(mut self, dataset: Dataset, root: impl AsRef<Path>) -> Self {
        self.root_overrides.insert(dataset, root.as_ref().to_path_buf());
        self
    }
    pub fn with_datasets<I>(mut self, datasets: I) -> Self
    where
        I: IntoIterator<Item = Dataset>,
    {
        let mut picked: Vec<Dataset> = Vec::new();
        for d in datasets {
            if !picked.contains(&d) {
                picked.push(d);
            }
        }
        self.datasets = picked;
        self
    }
    pub fn with_top_district_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).filter(|k: &String| !k.trim().is_empty()).collect();
        if !keys.is_empty() {
            self.top_district_keys = keys;
        }
        self
    }
    pub fn with_load_mode(mut self, dataset: Dataset, mode: LoadMode) -> Self {
        self.load_modes.insert(dataset, mode);
        self
    }
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_dataset_concurrency(mut self, n: usize) -> Self {
        self.dataset_concurrency = n.max(1);
        self
    }

    pub fn root_for(&self, dataset: Dataset) -> PathBuf {
        match self.root_overrides.get(&dataset) {
            Some(root) => root.clone(),
            None => dataset.default_root(&self.data_root),
        }
    }

    pub fn load_mode_for(&self, dataset: Dataset) -> LoadMode {
        self.load_modes.get(&dataset).copied().unwrap_or_else(|| dataset.default_load_mode())
    }

    /// Apply `PULSE_ETL_*` environment overrides. Unparseable dataset names are
    /// logged and ignored; an empty variable leaves the option untouched.
    pub fn merge_env(self) -> Self {
        self.merge_vars(|name| std::env::var(name).ok())
    }

    /// `merge_env` against an arbitrary variable lookup.
    pub fn merge_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(root) = var(ENV_DATA_ROOT).filter(|s| !s.trim().is_empty()) {
            self.data_root = PathBuf::from(root.trim());
        }
        if let Some(list) = var(ENV_DATASETS) {
            let mut picked = Vec::new();
            for raw in split_list(&list) {
                match raw.parse::<Dataset>() {
                    Ok(d) => picked.push(d),
                    Err(e) => tracing::warn!("{ENV_DATASETS}: {e}; ignored"),
                }
            }
            if !picked.is_empty() {
                self = self.with_datasets(picked);
            }
        }
        if let Some(keys) = var(ENV_TOP_DISTRICT_KEYS) {
            self = self.with_top_district_keys(split_list(&keys));
        }
        if let Some(raw) = var(ENV_CONCURRENCY).filter(|s| !s.trim().is_empty()) {
            match raw.trim().parse::<usize>() {
                Ok(n) => self = self.with_dataset_concurrency(n),
                Err(e) => tracing::warn!("{ENV_CONCURRENCY}: `{raw}`: {e}; ignored"),
            }
        }
        self
    }
}

fn split_list(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| c == ',' || c == ';' || c.is_whitespace()).filter(|p| !p.is_empty())
}
