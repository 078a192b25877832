use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(read_dir) = fs::read_dir(&dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                    files.push(path);
                }
            }
        }
    }
    files
}

fn file_contains_any(path: &Path, needles: &[&str]) -> bool {
    fs::read_to_string(path)
        .map(|c| needles.iter().any(|n| c.contains(n)))
        .unwrap_or(false)
}

#[test]
fn membership_and_counter_writes_stay_in_repository_layer() {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");
    let needles = [
        "INSERT INTO follows",
        "DELETE FROM follows",
        "INSERT INTO saved_posts",
        "DELETE FROM saved_posts",
        "SET claps",
    ];

    let mut offenders = Vec::new();
    for file in collect_rs_files(&src) {
        let path_str = file.to_string_lossy().replace('\\', "/");
        if path_str.contains("/src/repository/") {
            continue;
        }
        if file_contains_any(&file, &needles) {
            offenders.push(path_str);
        }
    }

    if !offenders.is_empty() {
        panic!(
            "Follow, save and clap writes must go through the repository traits. Offenders: {:?}",
            offenders
        );
    }
}

#[test]
fn module_headers_use_inner_doc_comments() {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");

    let mut offenders = Vec::new();
    for file in collect_rs_files(&src) {
        let first_line = fs::read_to_string(&file)
            .ok()
            .and_then(|c| c.lines().next().map(str::to_string))
            .unwrap_or_default();
        if first_line.starts_with("///") {
            offenders.push(file.to_string_lossy().to_string());
        }
    }

    if !offenders.is_empty() {
        panic!(
            "File headers must be `//!` so they document the module, not its first item. Offenders: {:?}",
            offenders
        );
    }
}
