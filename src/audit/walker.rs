//! Work-queue directory walker feeding the code census.
//!
//! Traversal is iterative (a channel of pending directories, never
//! recursion) with symlink, visited-inode, and cross-device guards, so an
//! adversarial or symlinked tree cannot blow the stack or loop forever.
//! Directories are traversed unconditionally — hidden ones included — and
//! only files are suffix-filtered.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crossbeam_channel as channel;

use crate::core::errors::{Result, ShcError};

/// Walker configuration derived from `ScannerConfig` plus the census
/// suffix filter.
#[derive(Debug, Clone)]
pub struct WalkSettings {
    pub max_depth: usize,
    pub follow_symlinks: bool,
    pub cross_devices: bool,
    pub parallelism: usize,
    pub excluded_paths: HashSet<PathBuf>,
    /// Accepted file suffixes, lowercase.
    pub suffixes: HashSet<String>,
}

impl WalkSettings {
    /// Build settings from config sections.
    #[must_use]
    pub fn from_config(
        scanner: &crate::core::config::ScannerConfig,
        suffixes: HashSet<String>,
    ) -> Self {
        Self {
            max_depth: scanner.max_depth,
            follow_symlinks: scanner.follow_symlinks,
            cross_devices: scanner.cross_devices,
            parallelism: scanner.parallelism,
            excluded_paths: scanner.excluded_paths.iter().cloned().collect(),
            suffixes,
        }
    }
}

/// Suffix of a file name: the text after the LAST dot, lowercased.
///
/// The dot must sit at index > 0, so "Makefile" (no dot) and ".gitignore"
/// (leading-dot-only) have no suffix and are never census candidates.
#[must_use]
pub fn file_suffix(name: &str) -> Option<String> {
    match name.rfind('.') {
        Some(idx) if idx > 0 => Some(name[idx + 1..].to_ascii_lowercase()),
        _ => None,
    }
}

/// Item in the internal work queue: (directory_path, depth, root_device_id).
type WorkItem = (PathBuf, usize, u64);

/// Parallel census walker with safety guards.
///
/// Safety invariants:
/// - Symlinks are skipped unless `follow_symlinks` is set
/// - A (device, inode) visited set breaks symlink and bind-mount cycles
/// - Never crosses filesystem boundaries unless configured
/// - Bounded by `max_depth` to prevent runaway traversal
pub struct CensusWalker {
    settings: WalkSettings,
}

impl CensusWalker {
    #[must_use]
    pub fn new(settings: WalkSettings) -> Self {
        Self { settings }
    }

    /// Walk `root` and collect every matching file, sorted.
    ///
    /// A missing root yields an empty list; the census treats that as
    /// nothing to count.
    pub fn collect(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self.stream(root)?.into_iter().collect();
        files.sort();
        Ok(files)
    }

    /// Stream matching files as worker threads discover them.
    fn stream(&self, root: &Path) -> Result<channel::Receiver<PathBuf>> {
        let parallelism = self.settings.parallelism.max(1);

        // Work queue is unbounded: traversal is already bounded by depth
        // and the visited set, and a full queue must not drop subtrees.
        let (work_tx, work_rx) = channel::unbounded::<WorkItem>();
        let (result_tx, result_rx) = channel::unbounded::<PathBuf>();

        // Track in-flight work items so workers know when to stop.
        let in_flight = Arc::new(AtomicUsize::new(0));
        let visited = Arc::new(parking_lot::Mutex::new(HashSet::<(u64, u64)>::new()));

        let meta = match metadata_for_path(root, self.settings.follow_symlinks) {
            Ok(m) => m,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(result_rx),
            Err(err) if err.kind() == ErrorKind::PermissionDenied => return Ok(result_rx),
            Err(err) => return Err(ShcError::io(root, err)),
        };
        if !meta.is_dir() {
            return Ok(result_rx);
        }
        let root_dev = device_id(&meta);
        in_flight.fetch_add(1, Ordering::Release);
        let _ = work_tx.send((root.to_path_buf(), 0, root_dev));

        for _ in 0..parallelism {
            let work_rx = work_rx.clone();
            let work_tx = work_tx.clone();
            let result_tx = result_tx.clone();
            let in_flight = Arc::clone(&in_flight);
            let visited = Arc::clone(&visited);
            let settings = self.settings.clone();

            thread::spawn(move || {
                walker_thread(&work_rx, &work_tx, &result_tx, &in_flight, &visited, &settings);
            });
        }

        Ok(result_rx)
    }
}

/// Worker thread: pulls directories from the work channel, emits matching
/// files, queues subdirectories.
fn walker_thread(
    work_rx: &channel::Receiver<WorkItem>,
    work_tx: &channel::Sender<WorkItem>,
    result_tx: &channel::Sender<PathBuf>,
    in_flight: &AtomicUsize,
    visited: &parking_lot::Mutex<HashSet<(u64, u64)>>,
    settings: &WalkSettings,
) {
    loop {
        match work_rx.recv_timeout(Duration::from_millis(50)) {
            Ok((dir_path, depth, root_dev)) => {
                process_directory(
                    &dir_path, depth, root_dev, work_tx, result_tx, in_flight, visited, settings,
                );
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                if in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
            }
            Err(channel::RecvTimeoutError::Disconnected) => return,
        }
    }
}

/// Process one directory: emit matching files, enqueue subdirectories.
#[allow(clippy::too_many_arguments)]
fn process_directory(
    dir_path: &Path,
    depth: usize,
    root_dev: u64,
    work_tx: &channel::Sender<WorkItem>,
    result_tx: &channel::Sender<PathBuf>,
    in_flight: &AtomicUsize,
    visited: &parking_lot::Mutex<HashSet<(u64, u64)>>,
    settings: &WalkSettings,
) {
    if settings.excluded_paths.contains(dir_path) {
        return;
    }

    let dir_meta = match metadata_for_path(dir_path, settings.follow_symlinks) {
        Ok(m) => m,
        Err(_) => return,
    };

    // Cross-device guard: a directory on a different filesystem than its
    // root means a mount point slipped into the queue.
    if !settings.cross_devices && device_id(&dir_meta) != root_dev {
        return;
    }

    // Cycle guard: a (device, inode) seen twice is a symlink loop or a
    // bind-mount revisit.
    if !visited.lock().insert((device_id(&dir_meta), inode(&dir_meta))) {
        return;
    }

    // Read directory entries, gracefully handling permission errors.
    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    for entry_result in entries {
        let Ok(entry) = entry_result else {
            continue;
        };
        let child_path = entry.path();

        let Ok(ft) = entry.file_type() else {
            continue;
        };

        if !settings.follow_symlinks && ft.is_symlink() {
            continue;
        }

        // If following symlinks, stat to see what the target is.
        let (is_dir, is_file) = if settings.follow_symlinks && ft.is_symlink() {
            metadata_for_path(&child_path, true)
                .map(|m| (m.is_dir(), m.is_file()))
                .unwrap_or((false, false))
        } else {
            (ft.is_dir(), ft.is_file())
        };

        if is_file {
            let matches = entry
                .file_name()
                .to_str()
                .and_then(file_suffix)
                .is_some_and(|suffix| settings.suffixes.contains(&suffix));
            if matches {
                let _ = result_tx.send(child_path);
            }
            continue;
        }

        if is_dir && depth < settings.max_depth && !settings.excluded_paths.contains(&child_path)
        {
            in_flight.fetch_add(1, Ordering::Release);
            if work_tx.send((child_path, depth + 1, root_dev)).is_err() {
                in_flight.fetch_sub(1, Ordering::Release);
            }
        }
    }
}

fn metadata_for_path(path: &Path, follow_symlinks: bool) -> std::io::Result<fs::Metadata> {
    if follow_symlinks {
        fs::metadata(path)
    } else {
        fs::symlink_metadata(path)
    }
}

/// Device ID from metadata (for cross-device detection).
fn device_id(meta: &fs::Metadata) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta.dev()
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        0
    }
}

fn inode(meta: &fs::Metadata) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta.ino()
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        0
    }
}
