use std::fs;

#[test]
fn test_pipeline_error_hierarchy_is_structured_and_wired() {
    let error_source = fs::read_to_string("src/error.rs").expect("src/error.rs must be readable");
    let config_source =
        fs::read_to_string("src/utils/config.rs").expect("src/utils/config.rs must be readable");
    let deploy_source =
        fs::read_to_string("src/deploy/mod.rs").expect("src/deploy/mod.rs must be readable");

    for needle in [
        "pub enum PipelineError",
        "Deploy(#[from] DeployError)",
        "Net(#[from] RpcError)",
        "Config(#[from] ConfigError)",
        "Tool(#[from] ToolError)",
        "pub enum RpcError",
        "pub enum DeployError",
        "pub enum ToolError",
        "NetworkExhausted(RpcError)",
    ] {
        assert!(
            error_source.contains(needle),
            "pipeline error hierarchy must contain `{needle}`"
        );
    }

    assert!(
        config_source.contains("ConfigError::Invalid"),
        "config loader must lift invalid values into ConfigError"
    );
    assert!(
        !config_source.contains("anyhow::"),
        "config loader should avoid ad-hoc anyhow usage"
    );
    assert!(
        deploy_source.contains("DeployError::from_rpc"),
        "orchestrator must lift proxy failures through DeployError::from_rpc"
    );
    assert!(
        !deploy_source.contains("anyhow::"),
        "orchestrator should avoid ad-hoc anyhow usage"
    );
}
