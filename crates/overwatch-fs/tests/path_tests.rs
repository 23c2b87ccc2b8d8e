use overwatch_fs::NormalizedPath;

#[test]
fn test_normalize_backslashes_to_forward() {
    let path = NormalizedPath::new("state\\GitHub\\acme");
    assert_eq!(path.as_str(), "state/GitHub/acme");
}

#[test]
fn test_join_builds_state_layout() {
    let root = NormalizedPath::new("/var/lib/overwatch");
    let dir = root.join("GitHub").join("acme").join("Repos");
    assert_eq!(dir.as_str(), "/var/lib/overwatch/GitHub/acme/Repos");
}

#[test]
fn test_join_with_trailing_slash_and_leading_segment_slash() {
    let root = NormalizedPath::new("state/");
    assert_eq!(root.join("/Repos").as_str(), "state/Repos");
}

#[test]
fn test_join_onto_empty_path() {
    let root = NormalizedPath::new("");
    assert_eq!(root.join("Repos").as_str(), "Repos");
}

#[test]
fn test_parent() {
    let path = NormalizedPath::new("state/GitHub/Repos/Repo.yml");
    assert_eq!(path.parent().unwrap().as_str(), "state/GitHub/Repos");
    assert_eq!(NormalizedPath::new("/state").parent().unwrap().as_str(), "/");
    assert!(NormalizedPath::new("state").parent().is_none());
}

#[test]
fn test_file_name_and_extension() {
    let path = NormalizedPath::new("state/Repos/Repo.yml");
    assert_eq!(path.file_name(), Some("Repo.yml"));
    assert_eq!(path.extension(), Some("yml"));
}

#[test]
fn test_dotfile_has_no_extension() {
    let path = NormalizedPath::new("state/.gitignore");
    assert_eq!(path.extension(), None);
}

#[test]
fn test_exists_false_for_nonexistent() {
    let path = NormalizedPath::new("/nonexistent/path/that/does/not/exist");
    assert!(!path.exists());
    assert!(!path.is_dir());
}
