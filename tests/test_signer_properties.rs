//! Property tests for the connection URL signer
//!
//! The signer is a pure function of (credentials, clock), so these check the
//! structural invariants that must hold for every input: determinism, URL
//! shape, signature format, and sensitivity to each credential field.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use sensorlink::config::Credentials;
use sensorlink::signer::presign_connection_url;

fn credential_field() -> impl Strategy<Value = String> {
    "[A-Za-z0-9+/]{8,40}"
}

fn endpoint() -> impl Strategy<Value = String> {
    "[a-z0-9]{4,12}-ats\\.iot\\.[a-z]{2}-[a-z]{4,9}-[1-3]\\.amazonaws\\.com"
}

fn region() -> impl Strategy<Value = String> {
    "[a-z]{2}-[a-z]{4,9}-[1-3]"
}

prop_compose! {
    fn credentials()(
        endpoint in endpoint(),
        region in region(),
        access_key_id in credential_field(),
        secret_access_key in credential_field(),
    ) -> Credentials {
        Credentials {
            endpoint,
            region,
            access_key_id,
            secret_access_key,
        }
    }
}

proptest! {
    #[test]
    fn signing_is_deterministic(creds in credentials(), secs in 0i64..4_000_000_000) {
        let time = Utc.timestamp_opt(secs, 0).unwrap();
        let a = presign_connection_url(&creds, time).unwrap();
        let b = presign_connection_url(&creds, time).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn url_shape_holds_for_all_credentials(creds in credentials(), secs in 0i64..4_000_000_000) {
        let time = Utc.timestamp_opt(secs, 0).unwrap();
        let url = presign_connection_url(&creds, time).unwrap();

        let expected_prefix = format!("wss://{}/mqtt?", creds.endpoint);
        prop_assert!(url.starts_with(&expected_prefix));
        prop_assert!(url.contains("X-Amz-Algorithm=AWS4-HMAC-SHA256"));
        prop_assert!(url.contains("X-Amz-SignedHeaders=host"));

        // The secret never appears in the URL
        prop_assert!(!url.contains(&creds.secret_access_key));
    }

    #[test]
    fn signature_is_lowercase_hex(creds in credentials(), secs in 0i64..4_000_000_000) {
        let time = Utc.timestamp_opt(secs, 0).unwrap();
        let url = presign_connection_url(&creds, time).unwrap();

        let signature = url
            .split("X-Amz-Signature=")
            .nth(1)
            .and_then(|rest| rest.split('&').next())
            .unwrap();
        prop_assert_eq!(signature.len(), 64);
        prop_assert!(signature.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn distinct_secrets_give_distinct_signatures(
        creds in credentials(),
        other_secret in credential_field(),
        secs in 0i64..4_000_000_000,
    ) {
        prop_assume!(creds.secret_access_key != other_secret);
        let time = Utc.timestamp_opt(secs, 0).unwrap();

        let mut other = creds.clone();
        other.secret_access_key = other_secret;

        let a = presign_connection_url(&creds, time).unwrap();
        let b = presign_connection_url(&other, time).unwrap();
        prop_assert_ne!(a, b);
    }

    #[test]
    fn distinct_times_give_distinct_urls(
        creds in credentials(),
        secs_a in 0i64..2_000_000_000,
        offset in 1i64..2_000_000_000,
    ) {
        let time_a = Utc.timestamp_opt(secs_a, 0).unwrap();
        let time_b = Utc.timestamp_opt(secs_a + offset, 0).unwrap();

        let a = presign_connection_url(&creds, time_a).unwrap();
        let b = presign_connection_url(&creds, time_b).unwrap();
        prop_assert_ne!(a, b);
    }
}
