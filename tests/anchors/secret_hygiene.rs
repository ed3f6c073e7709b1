use std::fs;

#[test]
fn test_secrets_are_never_formatted_into_logs() {
    for (path, source) in crate::anchor_utils::library_sources() {
        let production = crate::anchor_utils::production_part(&source);
        for line in production.lines() {
            let trimmed = line.trim();
            if trimmed.contains("expose()") {
                assert!(
                    !trimmed.contains("tracing::") && !trimmed.contains("println!"),
                    "{path}: exposed secret must not be logged: {trimmed}"
                );
            }
        }
        assert!(
            !production.contains("DEPLOYER_PRIVATE_KEY\", \"0x"),
            "{path}: deployer key must not be hard-coded"
        );
    }
}

#[test]
fn test_signing_key_is_redacted_and_wiped_after_each_attempt() {
    let signer = fs::read_to_string("src/deploy/signer.rs").expect("read src/deploy/signer.rs");
    let secrets =
        fs::read_to_string("src/utils/secrets.rs").expect("read src/utils/secrets.rs");
    let deploy = fs::read_to_string("src/deploy/mod.rs").expect("read src/deploy/mod.rs");

    assert!(
        !signer.contains("#[derive(Debug") && signer.contains("impl fmt::Debug for SigningKey"),
        "SigningKey must implement a redacted Debug by hand"
    );
    assert!(
        secrets.contains("Zeroizing<String>") && !secrets.contains("unsafe"),
        "SecretString must hold its value in a zeroizing buffer"
    );
    assert!(
        deploy.contains("request.signing_key.clear();"),
        "orchestrator must clear the signing key once the attempt ends"
    );
}
