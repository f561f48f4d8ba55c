use caliper_rut::config::HostConfig;
use caliper_rut::errno::Errno;
use caliper_rut::host::HostRuntime;
use caliper_rut::runtime::{ClockKind, DenialPosture, OpenFlags, Runtime, Whence};

fn host(root: &std::path::Path, denial: DenialPosture) -> HostRuntime {
    let config = HostConfig {
        preopen_root: root.to_path_buf(),
        path_denial: denial,
        ..Default::default()
    };
    HostRuntime::new(&config).unwrap()
}

#[test]
fn test_missing_root_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = HostConfig {
        preopen_root: dir.path().join("absent"),
        ..Default::default()
    };
    assert_eq!(HostRuntime::new(&config).err(), Some(Errno::Noent));
}

#[test]
fn test_truncate_sequence_on_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let rt = host(dir.path(), DenialPosture::NotFound);

    let fd = rt
        .path_open("caliper.dir/ftruncate.txt", OpenFlags::CREATE_READ_WRITE)
        .unwrap();
    assert_eq!(rt.fd_filestat_get(fd).unwrap().size, 0);
    rt.fd_filestat_set_size(fd, 500).unwrap();
    assert_eq!(rt.fd_filestat_get(fd).unwrap().size, 500);
    assert_eq!(rt.fd_seek(fd, 0, Whence::Cur).unwrap(), 0);
    rt.fd_filestat_set_size(fd, 300).unwrap();
    assert_eq!(rt.fd_filestat_get(fd).unwrap().size, 300);
    assert_eq!(rt.fd_seek(fd, 0, Whence::Cur).unwrap(), 0);
    rt.fd_close(fd).unwrap();

    assert_eq!(
        std::fs::metadata(dir.path().join("ftruncate.txt")).unwrap().len(),
        300
    );
    rt.path_unlink_file("caliper.dir/ftruncate.txt").unwrap();
}

#[test]
fn test_escape_attempts_never_reach_host() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("inside.txt"), b"x").unwrap();

    for (denial, errno) in [
        (DenialPosture::NotFound, Errno::Noent),
        (DenialPosture::NotCapable, Errno::Notcapable),
    ] {
        let rt = host(dir.path(), denial);
        assert_eq!(rt.path_open("..", OpenFlags::READ_ONLY), Err(errno));
        assert_eq!(
            rt.path_open("caliper-parent-directory/..", OpenFlags::READ_ONLY),
            Err(errno)
        );
        assert_eq!(
            rt.path_open("caliper.dir/../caliper.dir/inside.txt", OpenFlags::READ_ONLY),
            Err(errno)
        );
        // The same file through a path that stays inside opens fine.
        let fd = rt
            .path_open("caliper.dir/inside.txt", OpenFlags::READ_ONLY)
            .unwrap();
        rt.fd_close(fd).unwrap();
    }
}

#[test]
fn test_parent_of_missing_directory_is_enoent() {
    let dir = tempfile::tempdir().unwrap();
    let rt = host(dir.path(), DenialPosture::NotCapable);
    assert_eq!(
        rt.path_open("caliper.dir/missing/..", OpenFlags::READ_ONLY),
        Err(Errno::Noent)
    );
}

#[test]
fn test_host_clocks_and_entropy() {
    let dir = tempfile::tempdir().unwrap();
    let rt = host(dir.path(), DenialPosture::NotFound);
    assert!(rt.clock_res_get(ClockKind::Monotonic).unwrap().as_nanos() > 0);
    assert!(rt.clock_res_get(ClockKind::Realtime).unwrap().as_nanos() > 0);

    let a = rt.clock_time_get(ClockKind::Realtime).unwrap();
    let b = rt.clock_time_get(ClockKind::Realtime).unwrap();
    assert!(b.as_millis() >= a.as_millis());

    let mut buf = [0u8; 256];
    rt.random_get(&mut buf).unwrap();
    assert!(buf.iter().any(|&b| b != 0));
}

#[test]
fn test_host_entropy_cap() {
    let dir = tempfile::tempdir().unwrap();
    let rt = HostRuntime::new(&HostConfig {
        preopen_root: dir.path().to_path_buf(),
        entropy_call_cap: Some(256),
        ..Default::default()
    })
    .unwrap();
    let mut buf = [0u8; 512];
    assert_eq!(rt.random_get(&mut buf), Err(Errno::Io));
}

#[test]
fn test_curated_process_view() {
    let dir = tempfile::tempdir().unwrap();
    let rt = host(dir.path(), DenialPosture::NotFound)
        .with_process_view(vec!["prog".into(), "a".into()], vec!["X=1".into()]);
    assert_eq!(rt.args_get(), vec!["prog", "a"]);
    assert_eq!(rt.environ_sizes_get(), (1, 4));
    assert!(rt.metadata().is_none());
}
