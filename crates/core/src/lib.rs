pub mod detect;
pub mod error;
pub mod explain;
pub mod filter;
pub mod flatten;
pub mod model;
pub mod render;
pub mod scan;
pub mod settings;
pub mod walk;
pub mod xml;

pub use detect::{
    detect_and_parse, format_for_path, normalize_bytes, normalize_file, parse_file,
    parse_key_values, Candidate, Detector, DETECTORS,
};
pub use error::{DecodeError, SettingsError};
pub use explain::{explain_record, Explanation};
pub use filter::{filter, filter_stream, FilterCriteria};
pub use flatten::{flatten, yaml_to_json};
pub use model::{
    DiscoveredFile, Format, NormalizedRecord, ScanError, ScanMetrics, ScanReport, SettingValue,
    Settings, XmlNode, ERROR_KEY, RAW_KEY, REPORT_VERSION, STDIN_ORIGIN, XML_KEY,
};
pub use render::{render_json, render_records, render_table, render_text, OutputFormat};
pub use scan::{default_scan_roots, run_scan, scan_bytes, ScanOptions, DEFAULT_EXTENSIONS};
pub use settings::{
    write_sample_settings, ResolvedScan, ScanDefaults, ScanOverrides, ScanProfile, SettingsFile,
    SAMPLE_SETTINGS, SETTINGS_FILE_NAME,
};
pub use walk::{walk, ExcludeSet, ScanTarget, WalkOptions, WalkOutput};
