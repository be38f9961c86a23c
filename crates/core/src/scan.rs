use std::env;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use crate::detect::{normalize_bytes, normalize_file};
use crate::filter::{filter, filter_stream, FilterCriteria};
use crate::model::{NormalizedRecord, ScanMetrics, ScanReport, REPORT_VERSION};
use crate::walk::{walk, ExcludeSet, ScanTarget, WalkOptions};

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".json",
    ".yaml",
    ".yml",
    ".xml",
    ".conf",
    ".config",
    ".txt",
    ".ini",
    ".properties",
];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub paths: Vec<PathBuf>,
    pub extensions: Vec<String>,
    pub max_depth: Option<usize>,
    pub excludes: Vec<String>,
    pub criteria: FilterCriteria,
    pub scan_id: Option<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            max_depth: None,
            excludes: Vec::new(),
            criteria: FilterCriteria::default(),
            scan_id: None,
        }
    }
}

pub fn run_scan(options: &ScanOptions) -> Result<ScanReport> {
    validate_scan_options(options)?;
    let started = Instant::now();
    let scan_id = options
        .scan_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let targets = options
        .paths
        .iter()
        .map(|path| ScanTarget::new(path.clone(), &options.extensions))
        .collect::<Vec<_>>();
    let walk_options = WalkOptions {
        max_depth: options.max_depth,
        excludes: ExcludeSet::new(&options.excludes).context("invalid exclude pattern")?,
    };
    let walked = walk(&targets, &walk_options);

    let normalized = walked
        .files
        .iter()
        .map(normalize_file)
        .collect::<Vec<_>>();
    let records = filter(&normalized, &options.criteria);

    let metrics = ScanMetrics {
        discovered_files: walked.files.len() as u64,
        matched_records: records.len() as u64,
        scan_errors: walked.errors.len() as u64,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        scan_id = %scan_id,
        roots = targets.len(),
        discovered = metrics.discovered_files,
        matched = metrics.matched_records,
        errors = metrics.scan_errors,
        "scan complete"
    );

    Ok(ScanReport {
        report_version: REPORT_VERSION.to_string(),
        scan_id,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        roots: options
            .paths
            .iter()
            .map(|path| path.to_string_lossy().to_string())
            .collect(),
        extensions: targets
            .first()
            .map(|target| target.extensions.clone())
            .unwrap_or_default(),
        metrics,
        records,
        errors: walked.errors,
    })
}

pub fn scan_bytes(bytes: &[u8], criteria: &FilterCriteria) -> NormalizedRecord {
    let record = normalize_bytes(bytes);
    info!(format = %record.format, keys = record.settings.len(), "normalized streamed input");
    filter_stream(&record, criteria)
}

pub fn default_scan_roots() -> Vec<PathBuf> {
    if cfg!(windows) {
        return ["ProgramData", "APPDATA", "LOCALAPPDATA"]
            .iter()
            .filter_map(|var| env::var_os(var))
            .map(PathBuf::from)
            .collect();
    }

    let mut roots = vec![PathBuf::from("/etc")];
    if let Some(home) = dirs::home_dir() {
        if cfg!(target_os = "macos") {
            roots.push(home.join("Library/Application Support"));
        }
        roots.push(home.join(".config"));
    }
    roots
}

fn validate_scan_options(options: &ScanOptions) -> Result<()> {
    if options.paths.is_empty() {
        return Err(anyhow!("no scan paths were provided"));
    }
    if options.max_depth == Some(0) {
        return Err(anyhow!("max_depth must be greater than zero"));
    }
    Ok(())
}
