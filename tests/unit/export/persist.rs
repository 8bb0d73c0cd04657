use super::*;

fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "lottie_flipbook_persist_{}_{name}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn dir_mode_writes_under_suggested_name() {
    let dir = scratch("dir");
    let mut target = FilePersist::into_dir(dir.join("nested"));
    let path = target.persist(b"{\"v\":1}", "animation_1.json").unwrap();
    assert_eq!(path, dir.join("nested").join("animation_1.json"));
    assert_eq!(std::fs::read(&path).unwrap(), b"{\"v\":1}");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn dir_mode_rejects_paths_as_names() {
    let dir = scratch("names");
    let mut target = FilePersist::into_dir(&dir);
    for bad in ["", "../escape.json", "a/b.json"] {
        let err = target.persist(b"x", bad).unwrap_err();
        assert!(matches!(err, FlipbookError::Validation(_)), "{bad}");
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn path_mode_ignores_suggested_name() {
    let dir = scratch("path");
    let out = dir.join("chosen.json");
    let mut target = FilePersist::to_path(&out);
    let path = target.persist(b"abc", "animation_2.json").unwrap();
    assert_eq!(path, out);
    assert_eq!(std::fs::read(&out).unwrap(), b"abc");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn overwrite_can_be_refused() {
    let dir = scratch("overwrite");
    let out = dir.join("doc.json");
    FilePersist::to_path(&out).persist(b"first", "x.json").unwrap();

    let err = FilePersist::to_path(&out)
        .with_overwrite(false)
        .persist(b"second", "x.json")
        .unwrap_err();
    assert!(matches!(err, FlipbookError::Validation(_)));
    assert_eq!(std::fs::read(&out).unwrap(), b"first");

    FilePersist::to_path(&out).persist(b"third", "x.json").unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"third");
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn in_memory_keeps_saves_in_order() {
    let mut target = InMemoryPersist::new();
    target.persist(b"one", "a.json").unwrap();
    target.persist(b"two", "b.json").unwrap();
    assert_eq!(
        target.saved(),
        &[
            ("a.json".to_string(), b"one".to_vec()),
            ("b.json".to_string(), b"two".to_vec()),
        ]
    );
}

#[test]
fn ensure_parent_dir_accepts_bare_file_names() {
    ensure_parent_dir(Path::new("bare.json")).unwrap();
}
