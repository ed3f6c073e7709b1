#[test]
fn test_library_runtime_paths_do_not_unwrap() {
    for (path, source) in crate::anchor_utils::library_sources() {
        if path.ends_with("main.rs") {
            continue;
        }
        let production = crate::anchor_utils::production_part(&source);
        for needle in [".unwrap()", ".expect(", "panic!("] {
            assert!(
                !production.contains(needle),
                "{path}: runtime path must propagate errors instead of `{needle}`"
            );
        }
    }
}
