use std::fs;

#[test]
fn test_proxy_failover_is_sequential_and_never_races() {
    let proxy = fs::read_to_string("src/rpc/proxy.rs").expect("read src/rpc/proxy.rs");
    let production = crate::anchor_utils::production_part(&proxy);

    for forbidden in [
        "join_all",
        "select_ok",
        "FuturesUnordered",
        "tokio::spawn",
        "tokio::select!",
    ] {
        assert!(
            !production.contains(forbidden),
            "endpoint failover must not fan out (`{forbidden}` found in proxy)"
        );
    }
    assert!(
        production.contains("for (idx, url) in config.endpoints.iter().enumerate()"),
        "failover must walk the endpoint list in configured order"
    );
    assert!(
        production.contains("Err(err) if !err.is_endpoint_fault() =>"),
        "deterministic node errors must short-circuit failover"
    );
    assert!(
        production.contains("RpcError::Exhausted {"),
        "exhaustion must surface as an aggregated RpcError"
    );
}

#[test]
fn test_signed_transaction_is_submitted_once_through_pinned_endpoint() {
    let deploy = fs::read_to_string("src/deploy/mod.rs").expect("read src/deploy/mod.rs");
    let production = crate::anchor_utils::production_part(&deploy);

    assert_eq!(
        production.matches("\"eth_sendRawTransaction\"").count(),
        1,
        "raw transaction must be submitted from exactly one call site"
    );
    assert!(
        production.contains(".handle\n            .call(\n                \"eth_sendRawTransaction\""),
        "submission must use the endpoint handle pinned during estimation, not proxy failover"
    );
}
