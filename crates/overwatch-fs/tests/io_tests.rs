use overwatch_fs::{NormalizedPath, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("GitHub/acme/Repos/Repo.yml"));

    io::write_atomic(&path, b"- Name: api\n").unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "- Name: api\n");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("Repo.yml");
    fs::write(&file_path, "original").unwrap();

    io::write_atomic(&NormalizedPath::new(&file_path), b"updated").unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_write_atomic_leaves_no_temp_files() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("Repo.yml"));

    io::write_text(&path, "content").unwrap();

    let leftovers: Vec<_> = fs::read_dir(temp.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "found temp files: {leftovers:?}");
}

#[test]
fn test_read_bytes_and_text() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("Repo.yml");
    fs::write(&file_path, "hello").unwrap();

    let path = NormalizedPath::new(&file_path);
    assert_eq!(io::read_bytes(&path).unwrap(), b"hello");
    assert_eq!(io::read_text(&path).unwrap(), "hello");
}

#[test]
fn test_read_nonexistent_file_reports_path() {
    let path = NormalizedPath::new("/nonexistent/file.yml");
    let err = io::read_bytes(&path).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/file.yml"));
}
