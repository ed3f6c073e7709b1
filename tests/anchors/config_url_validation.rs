//! Anchor Test: config validates URL shape/schemes before the pipeline starts.

use std::fs;

#[test]
fn test_config_load_validates_rpc_and_llm_urls() {
    let src = fs::read_to_string("src/utils/config.rs")
        .expect("src/utils/config.rs must be readable from workspace root");
    let networks = fs::read_to_string("src/config/networks.rs")
        .expect("src/config/networks.rs must be readable from workspace root");

    assert!(src.contains("fn validate_http_url("));
    assert!(src.contains("validate_http_url(&key, url)?"));
    assert!(src.contains("validate_http_url(\"LLM_API_URL\""));

    // Registry construction re-checks every endpoint, including built-in tables.
    assert!(networks.contains("validate_endpoint_url(config.network, url)?"));
    assert!(networks.contains("PRIMARY_NETWORK"));
}
