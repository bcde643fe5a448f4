//! A symlink loop in a census root must terminate, not hang or overflow.

#[cfg(unix)]
use std::fs;
#[cfg(unix)]
use std::time::Duration;

#[cfg(unix)]
use shipcheck::audit::walker::{CensusWalker, WalkSettings};

#[test]
#[cfg(unix)]
fn census_walk_survives_symlink_loop() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    fs::create_dir(&root).unwrap();

    // Create a symlink loop: root/loop -> root
    std::os::unix::fs::symlink(&root, root.join("loop")).unwrap();

    // And a nested structure to prove traversal still happens.
    let deep = root.join("a").join("b").join("c");
    fs::create_dir_all(&deep).unwrap();
    fs::write(deep.join("Deep.java"), "int x;\n").unwrap();

    let settings = WalkSettings {
        max_depth: 64,
        follow_symlinks: true,
        cross_devices: false,
        parallelism: 2,
        excluded_paths: std::collections::HashSet::new(),
        suffixes: std::iter::once("java".to_string()).collect(),
    };

    // Run on a separate thread with a timeout: without the visited-inode
    // guard this walk never terminates.
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let files = CensusWalker::new(settings).collect(&root).unwrap();
        tx.send(files).unwrap();
    });

    match rx.recv_timeout(Duration::from_secs(5)) {
        Ok(files) => {
            assert_eq!(files.len(), 1, "expected exactly one match: {files:?}");
            assert!(files[0].ends_with("a/b/c/Deep.java"));
        }
        Err(_) => panic!("census walk timed out - likely stuck in symlink loop"),
    }
}
