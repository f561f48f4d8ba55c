use caliper_rut::errno::Errno;
use caliper_rut::path::{resolve, validate_preopen_name};
use caliper_rut::runtime::FileType;

fn preopens() -> Vec<String> {
    vec!["work.dir".to_string(), "data".to_string()]
}

/// Lookup where only `work.dir/sub` exists (as a directory) and
/// `work.dir/file.txt` exists (as a file).
fn lookup(idx: usize, comps: &[String]) -> Option<FileType> {
    match (idx, comps.join("/").as_str()) {
        (0, "sub") => Some(FileType::Directory),
        (0, "file.txt") => Some(FileType::RegularFile),
        _ => None,
    }
}

#[test]
fn test_plain_path_resolves_under_preopen() {
    let r = resolve(&preopens(), "work.dir/sub/a.txt", Errno::Noent, lookup).unwrap();
    assert_eq!(r.preopen, 0);
    assert_eq!(r.components, vec!["sub", "a.txt"]);
    assert_eq!(r.key(&preopens()), "work.dir/sub/a.txt");
}

#[test]
fn test_dot_and_repeated_slashes_are_ignored() {
    let r = resolve(&preopens(), "./data//./x", Errno::Noent, lookup).unwrap();
    assert_eq!(r.preopen, 1);
    assert_eq!(r.components, vec!["x"]);
}

#[test]
fn test_parent_of_existing_directory_stays_inside() {
    let r = resolve(&preopens(), "work.dir/sub/../b", Errno::Noent, lookup).unwrap();
    assert_eq!(r.components, vec!["b"]);
}

#[test]
fn test_path_outside_every_preopen_uses_denial_errno() {
    for denial in [Errno::Noent, Errno::Notcapable] {
        assert_eq!(resolve(&preopens(), "..", denial, lookup), Err(denial));
        assert_eq!(
            resolve(&preopens(), "work-parent-directory/..", denial, lookup),
            Err(denial)
        );
        assert_eq!(
            resolve(&preopens(), "work.dir/../work.dir/file.txt", denial, lookup),
            Err(denial)
        );
        assert_eq!(resolve(&preopens(), "/", denial, lookup), Err(denial));
    }
}

#[test]
fn test_parent_of_missing_component_is_enoent() {
    let r = resolve(&preopens(), "work.dir/missing/..", Errno::Notcapable, lookup);
    assert_eq!(r, Err(Errno::Noent));
}

#[test]
fn test_parent_of_regular_file_is_enotdir() {
    let r = resolve(&preopens(), "work.dir/file.txt/..", Errno::Noent, lookup);
    assert_eq!(r, Err(Errno::Notdir));
}

#[test]
fn test_empty_and_nul_paths_rejected() {
    assert_eq!(resolve(&preopens(), "", Errno::Notcapable, lookup), Err(Errno::Noent));
    assert_eq!(
        resolve(&preopens(), "work.dir/a\0b", Errno::Noent, lookup),
        Err(Errno::Inval)
    );
}

#[test]
fn test_overlong_component_rejected() {
    let long = format!("work.dir/{}", "x".repeat(300));
    assert_eq!(
        resolve(&preopens(), &long, Errno::Noent, lookup),
        Err(Errno::Nametoolong)
    );
}

#[test]
fn test_preopen_names_must_be_single_components() {
    assert!(validate_preopen_name("caliper.dir").is_ok());
    assert_eq!(validate_preopen_name(".."), Err(Errno::Inval));
    assert_eq!(validate_preopen_name("a/b"), Err(Errno::Inval));
    assert_eq!(validate_preopen_name(""), Err(Errno::Inval));
}
