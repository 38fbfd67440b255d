//! Marker sources
//!
//! A marker is a file named `<job>.<extension>` holding the job's idle
//! timeout in minutes. Its modification time is the job's last activity.
//! Job runners create, touch and delete markers; this module only reads.

use chrono::{DateTime, Local};
use idlestop_api::{Marker, MalformedMarker};
use idlestop_config::{MarkerPolicy, parse_extension};
use idlestop_util::{IdlestopError, IdlestopResult};
use std::ffi::OsStr;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Longest slice of a malformed marker's contents kept for error messages
const MAX_MALFORMED_PREVIEW: usize = 64;

/// Markers hold a short number. Anything longer is malformed and is not
/// read further.
const MAX_MARKER_BYTES: u64 = 4096;

/// Everything a source found, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerScan {
    pub markers: Vec<Marker>,
    pub malformed: Vec<MalformedMarker>,
    /// Last change to the set of markers (a marker created or deleted), when
    /// the source can tell
    pub dir_modified: Option<DateTime<Local>>,
}

impl MarkerScan {
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.malformed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.markers.len() + self.malformed.len()
    }

    fn sort(&mut self) {
        self.markers.sort_by(|a, b| a.name.cmp(&b.name));
        self.malformed.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Anything that can list the current markers
pub trait MarkerSource {
    fn scan(&self) -> IdlestopResult<MarkerScan>;
}

/// Markers in a directory on disk
#[derive(Debug, Clone)]
pub struct DirMarkerSource {
    dir: PathBuf,
    extension: String,
}

impl DirMarkerSource {
    /// `extension` may be given with or without its leading dot. It must be a
    /// single filename extension: `tar.gz` or `a/b` would never match a
    /// marker, and every job would go unseen.
    pub fn new(dir: impl Into<PathBuf>, extension: impl AsRef<str>) -> IdlestopResult<Self> {
        let extension = parse_extension(extension.as_ref()).map_err(|message| {
            IdlestopError::config(format!(
                "invalid marker extension {:?}: {}",
                extension.as_ref(),
                message
            ))
        })?;

        Ok(Self {
            dir: dir.into(),
            extension,
        })
    }

    pub fn from_policy(policy: &MarkerPolicy) -> IdlestopResult<Self> {
        Self::new(&policy.dir, &policy.extension)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Marker name for a path, if it carries the marker extension
    fn marker_name(&self, path: &Path) -> Option<String> {
        if path.extension() != Some(OsStr::new(&self.extension)) {
            return None;
        }
        path.file_stem().map(|s| s.to_string_lossy().into_owned())
    }
}

impl MarkerSource for DirMarkerSource {
    fn scan(&self) -> IdlestopResult<MarkerScan> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| IdlestopError::directory_missing(&self.dir, e))?;

        let dir_modified = std::fs::metadata(&self.dir)
            .and_then(|m| m.modified())
            .map_err(|e| IdlestopError::io(&self.dir, e))?;

        let mut scan = MarkerScan {
            dir_modified: Some(dir_modified.into()),
            ..MarkerScan::default()
        };

        for entry in entries {
            let entry = entry.map_err(|e| IdlestopError::io(&self.dir, e))?;
            let path = entry.path();

            let Some(name) = self.marker_name(&path) else {
                debug!(
                    path = %path.display(),
                    extension = %self.extension,
                    "Not a marker file, skipping"
                );
                continue;
            };

            trace!(name = %name, path = %path.display(), "Reading marker");

            match read_marker(&path, name)? {
                Some(ScannedMarker::Valid(marker)) => scan.markers.push(marker),
                Some(ScannedMarker::Malformed(malformed)) => scan.malformed.push(malformed),
                None => {}
            }
        }

        scan.sort();

        debug!(
            dir = %self.dir.display(),
            markers = scan.markers.len(),
            malformed = scan.malformed.len(),
            "Marker directory scanned"
        );

        Ok(scan)
    }
}

enum ScannedMarker {
    Valid(Marker),
    Malformed(MalformedMarker),
}

/// Read one marker. `None` when the file disappeared since the directory
/// listing, or is not a regular file.
///
/// The file type is checked before opening: opening a FIFO blocks until a
/// writer shows up.
fn read_marker(path: &Path, name: String) -> IdlestopResult<Option<ScannedMarker>> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Marker vanished before it could be read");
            return Ok(None);
        }
        Err(e) => return Err(IdlestopError::io(path, e)),
    };

    if !metadata.is_file() {
        debug!(path = %path.display(), "Marker path is not a regular file, skipping");
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Marker vanished before it could be read");
            return Ok(None);
        }
        Err(e) => return Err(IdlestopError::io(path, e)),
    };

    // mtime from the open handle, so contents and timestamp belong to the same file
    let last_modified: DateTime<Local> = file
        .metadata()
        .and_then(|m| m.modified())
        .map_err(|e| IdlestopError::io(path, e))?
        .into();

    let mut bytes = Vec::new();
    file.take(MAX_MARKER_BYTES + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| IdlestopError::io(path, e))?;

    let timeout = if bytes.len() as u64 > MAX_MARKER_BYTES {
        debug!(path = %path.display(), "Marker is too large to hold a timeout");
        None
    } else {
        std::str::from_utf8(&bytes).ok().and_then(parse_timeout)
    };

    let scanned = match timeout {
        Some(timeout_minutes) => ScannedMarker::Valid(
            Marker::new(name, timeout_minutes, last_modified).with_path(path),
        ),
        None => ScannedMarker::Malformed(MalformedMarker {
            name,
            path: path.to_path_buf(),
            contents: String::from_utf8_lossy(&bytes)
                .chars()
                .take(MAX_MALFORMED_PREVIEW)
                .collect(),
            last_modified: Some(last_modified),
        }),
    };

    Ok(Some(scanned))
}

/// Parse a marker's contents: ASCII decimal digits with optional
/// surrounding whitespace.
pub fn parse_timeout(contents: &str) -> Option<u64> {
    let trimmed = contents.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Fixed set of markers, for tests and callers that track jobs themselves
#[derive(Debug, Clone, Default)]
pub struct MemoryMarkerSource {
    scan: MarkerScan,
}

impl MemoryMarkerSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(
        mut self,
        name: impl Into<String>,
        timeout_minutes: u64,
        last_modified: DateTime<Local>,
    ) -> Self {
        self.scan
            .markers
            .push(Marker::new(name, timeout_minutes, last_modified));
        self
    }

    pub fn with_dir_modified(mut self, at: DateTime<Local>) -> Self {
        self.scan.dir_modified = Some(at);
        self
    }

    pub fn with_malformed(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        let name = name.into();
        self.scan.malformed.push(MalformedMarker {
            path: PathBuf::from(format!("{}.log", name)),
            name,
            contents: contents.into(),
            last_modified: None,
        });
        self
    }
}

impl MarkerSource for MemoryMarkerSource {
    fn scan(&self) -> IdlestopResult<MarkerScan> {
        let mut scan = self.scan.clone();
        scan.sort();
        Ok(scan)
    }
}
