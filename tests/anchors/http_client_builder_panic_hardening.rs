use std::fs;

#[test]
fn test_http_client_builder_failures_do_not_panic_in_runtime_paths() {
    let transport =
        fs::read_to_string("src/rpc/transport.rs").expect("read src/rpc/transport.rs");
    let llm = fs::read_to_string("src/tools/llm.rs").expect("read src/tools/llm.rs");

    for (path, source) in [("src/rpc/transport.rs", &transport), ("src/tools/llm.rs", &llm)] {
        let production = crate::anchor_utils::production_part(source);
        assert!(
            production.contains("Falling back to default client."),
            "{path}: HTTP client constructor must fail open to reqwest::Client::new() with warning"
        );
        assert!(
            !production.contains(".build().expect(") && !production.contains(".build().unwrap()"),
            "{path}: HTTP client construction must not panic on builder failure"
        );
    }
}
