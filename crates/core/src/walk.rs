use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

use crate::model::{DiscoveredFile, ScanError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub root: PathBuf,
    pub extensions: Vec<String>,
}

impl ScanTarget {
    pub fn new<S: AsRef<str>>(root: impl Into<PathBuf>, extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|ext| ext.as_ref().trim().to_lowercase())
            .filter(|ext| !ext.is_empty() && ext != ".")
            .map(|ext| {
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
        Self {
            root: root.into(),
            extensions,
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let lowered = file_name.to_lowercase();
        self.extensions.iter().any(|ext| lowered.ends_with(ext))
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    // root is depth 0
    pub max_depth: Option<usize>,
    pub excludes: ExcludeSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutput {
    pub files: Vec<DiscoveredFile>,
    pub errors: Vec<ScanError>,
}

pub fn walk(targets: &[ScanTarget], options: &WalkOptions) -> WalkOutput {
    let mut output = WalkOutput::default();

    for target in targets {
        let before = output.files.len();
        walk_target(target, options, &mut output);
        debug!(
            root = %target.root.display(),
            discovered = output.files.len() - before,
            "walked scan root"
        );
    }
    output
}

fn walk_target(target: &ScanTarget, options: &WalkOptions, output: &mut WalkOutput) {
    let mut walker = WalkDir::new(&target.root)
        .follow_links(true)
        .sort_by_file_name();
    if let Some(depth) = options.max_depth {
        walker = walker.max_depth(depth);
    }
    let excludes = &options.excludes;
    let iter = walker.into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || excludes.is_empty() {
            return true;
        }
        let relative = entry
            .path()
            .strip_prefix(&target.root)
            .unwrap_or(entry.path());
        !excludes.is_excluded(relative)
    });

    for item in iter {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) => {
                output.errors.push(walk_error(&target.root, &err));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if target.matches(&entry.file_name().to_string_lossy()) {
            output.files.push(DiscoveredFile {
                path: entry.path().to_path_buf(),
                root: target.root.clone(),
            });
        }
    }
}

fn walk_error(root: &Path, err: &walkdir::Error) -> ScanError {
    let path = err.path().unwrap_or(root).to_string_lossy().to_string();
    let message = if let Some(ancestor) = err.loop_ancestor() {
        format!("symlink loop back to {}", ancestor.display())
    } else if let Some(io) = err.io_error() {
        io.to_string()
    } else {
        err.to_string()
    };
    ScanError::new(path, message)
}

// matched against the root-relative path and the bare entry name
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    globs: Option<GlobSet>,
}

impl ExcludeSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        let mut compiled = 0;
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            builder.add(GlobBuilder::new(pattern).case_insensitive(true).build()?);
            compiled += 1;
        }
        if compiled == 0 {
            return Ok(Self::default());
        }
        Ok(Self {
            globs: Some(builder.build()?),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_none()
    }

    pub fn is_excluded(&self, relative: &Path) -> bool {
        let Some(globs) = &self.globs else {
            return false;
        };
        globs.is_match(relative)
            || relative
                .file_name()
                .is_some_and(|name| globs.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use tempfile::tempdir;

    use super::{walk, ExcludeSet, ScanTarget, WalkOptions};

    fn touch(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, contents).expect("write file");
    }

    #[test]
    fn target_normalizes_extensions() {
        let target = ScanTarget::new(".", &["JSON", ".Yaml", " ", "."]);
        assert_eq!(target.extensions, vec![".json", ".yaml"]);
        assert!(target.matches("APP.JSON"));
        assert!(target.matches("compose.yaml"));
        assert!(!target.matches("compose.yml"));
        assert!(!target.matches("json"));
    }

    #[test]
    fn empty_target_list_discovers_nothing() {
        let output = walk(&[], &WalkOptions::default());
        assert!(output.files.is_empty());
        assert!(output.errors.is_empty());
    }

    #[test]
    fn collects_allowlisted_files_recursively() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("test1.json"), r#"{"foo": "bar"}"#);
        touch(&dir.path().join("nested/deeper/test2.YAML"), "foo: bar");
        touch(&dir.path().join("not_config.txt"), "not config");

        let output = walk(
            &[ScanTarget::new(dir.path(), &[".json", ".yaml"])],
            &WalkOptions::default(),
        );

        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.files.len(), 2);
        for expected in [
            dir.path().join("test1.json"),
            dir.path().join("nested/deeper/test2.YAML"),
        ] {
            assert_eq!(
                output.files.iter().filter(|file| file.path == expected).count(),
                1,
                "expected exactly one hit for {}",
                expected.display()
            );
        }
    }

    #[test]
    fn missing_root_reports_error_without_files() {
        let output = walk(
            &[ScanTarget::new(
                "/unlikely/path/that/does/not/exist",
                &[".json"],
            )],
            &WalkOptions::default(),
        );
        assert!(output.files.is_empty());
        assert!(!output.errors.is_empty());
        assert!(output.errors[0].path.contains("does/not/exist"));
    }

    #[test]
    fn targets_are_concatenated_in_order() {
        let first = tempdir().expect("tempdir");
        let second = tempdir().expect("tempdir");
        touch(&first.path().join("a.json"), "{}");
        touch(&second.path().join("b.json"), "{}");

        let output = walk(
            &[
                ScanTarget::new(second.path(), &[".json"]),
                ScanTarget::new("/unlikely/missing/root", &[".json"]),
                ScanTarget::new(first.path(), &[".json"]),
            ],
            &WalkOptions::default(),
        );

        let paths = output
            .files
            .iter()
            .map(|file| file.path.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![second.path().join("b.json"), first.path().join("a.json")]
        );
        assert_eq!(output.errors.len(), 1);
    }

    #[test]
    fn max_depth_bounds_recursion() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("top.json"), "{}");
        touch(&dir.path().join("a/b/deep.json"), "{}");

        let output = walk(
            &[ScanTarget::new(dir.path(), &[".json"])],
            &WalkOptions {
                max_depth: Some(1),
                ..WalkOptions::default()
            },
        );
        assert_eq!(output.files.len(), 1);
        assert_eq!(output.files[0].path, dir.path().join("top.json"));
    }

    #[test]
    fn excluded_directories_are_not_descended() {
        let dir = tempdir().expect("tempdir");
        touch(&dir.path().join("keep/app.json"), "{}");
        touch(&dir.path().join("node_modules/pkg/package.json"), "{}");
        touch(&dir.path().join("keep/cache.tmp.json"), "{}");

        let output = walk(
            &[ScanTarget::new(dir.path(), &[".json"])],
            &WalkOptions {
                excludes: ExcludeSet::new(&["node_modules", "*.tmp.json"])
                    .expect("valid globs"),
                ..WalkOptions::default()
            },
        );
        assert_eq!(output.files.len(), 1);
        assert_eq!(output.files[0].path, dir.path().join("keep/app.json"));
    }

    #[test]
    fn exclude_set_matches_relative_paths_and_names() {
        let excludes =
            ExcludeSet::new(&["*.bak", "Vendor", "app/legacy", " "]).expect("valid globs");

        assert!(excludes.is_excluded(Path::new("app/settings.BAK")));
        assert!(excludes.is_excluded(Path::new("lib/vendor")));
        assert!(excludes.is_excluded(Path::new("app/legacy")));
        assert!(!excludes.is_excluded(Path::new("other/legacy")));
        assert!(!excludes.is_excluded(Path::new("app/config.json")));
    }

    #[test]
    fn invalid_exclude_glob_is_rejected_up_front() {
        assert!(ExcludeSet::new(&["["]).is_err());
        let empty = ExcludeSet::new::<&str>(&[]).expect("empty set");
        assert!(empty.is_empty());
        assert!(!empty.is_excluded(Path::new("anything")));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycle_terminates_and_keeps_other_files() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().expect("tempdir");
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).expect("mkdir");
        symlink(dir.path(), sub.join("loop")).expect("symlink");
        let file = sub.join("test.json");
        touch(&file, r#"{"foo": "bar"}"#);

        let output = walk(
            &[ScanTarget::new(dir.path(), &[".json"])],
            &WalkOptions::default(),
        );

        assert_eq!(output.files.iter().filter(|f| f.path == file).count(), 1);
        assert!(output
            .errors
            .iter()
            .any(|err| err.message.contains("symlink loop")));
    }

    #[cfg(unix)]
    #[test]
    fn broken_symlink_is_recorded_and_skipped() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().expect("tempdir");
        symlink(dir.path().join("missing.json"), dir.path().join("dangling.json"))
            .expect("symlink");
        touch(&dir.path().join("real.json"), "{}");

        let output = walk(
            &[ScanTarget::new(dir.path(), &[".json"])],
            &WalkOptions::default(),
        );

        assert_eq!(output.files.len(), 1);
        assert_eq!(output.files[0].path, dir.path().join("real.json"));
        assert_eq!(output.errors.len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_does_not_abort_walk() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().expect("tempdir");
        let locked = dir.path().join("noaccess");
        fs::create_dir(&locked).expect("mkdir");
        touch(&locked.join("hidden.json"), "{}");
        touch(&dir.path().join("visible.json"), "{}");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
        // privileged users can still read the directory
        let enforced = fs::read_dir(&locked).is_err();

        let output = walk(
            &[ScanTarget::new(dir.path(), &[".json"])],
            &WalkOptions::default(),
        );
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).expect("restore");

        assert!(output
            .files
            .iter()
            .any(|file| file.path == dir.path().join("visible.json")));
        if enforced {
            assert!(!output.errors.is_empty());
            assert!(output
                .files
                .iter()
                .all(|file| !file.path.starts_with(&locked)));
        }
    }
}
