//! Property-based tests for token issuance and renewal
//!
//! These tests verify:
//! - Issued tokens verify back to the same subject and permissions
//! - Renewal triggers exactly when at most half the lifetime remains
//! - Flipping any bit of any signature byte invalidates the token
//! - Arbitrary strings never verify and never panic

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use warden_auth_core::testing::{fixture_keys, PRIMARY_PRIVATE_KEY};
use warden_auth_core::{JwtConfig, TokenService};
use warden_types::User;

const ISSUED_AT: i64 = 1_700_000_000;
const DURATION_MINUTES: u64 = 60;

fn service() -> TokenService {
    let config = JwtConfig::new(PRIMARY_PRIVATE_KEY).with_duration_minutes(DURATION_MINUTES);
    TokenService::new(fixture_keys(), &config).expect("fixture config is valid")
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_user() -> impl Strategy<Value = User> {
    (
        "[a-zA-Z0-9|@._-]{1,40}",
        prop::collection::vec("[a-z]{1,8}:[a-z]{1,8}:(\\*|[a-z0-9]{1,8})", 0..6),
    )
        .prop_map(|(sub, perms)| User::new(sub).with_permissions(perms))
}

// RSA signing is slow, keep the case count modest.
fn config() -> ProptestConfig {
    ProptestConfig::with_cases(32)
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(config())]

    #[test]
    fn issued_tokens_verify(user in arb_user()) {
        let tokens = service();
        let now = Utc.timestamp_opt(ISSUED_AT, 0).unwrap();
        let signed = tokens.create_and_sign_at(&user, now).unwrap();

        let claims = tokens.verify_at(&signed.token, now).expect("fresh token verifies");
        prop_assert_eq!(&claims.sub, user.subject());
        prop_assert_eq!(&claims.perms, &user.permissions);
        prop_assert_eq!(claims.exp, ISSUED_AT + (DURATION_MINUTES as i64) * 60);
        prop_assert_eq!(signed.expiry.timestamp(), claims.exp);
    }

    #[test]
    fn renewal_threshold_is_half_lifetime(offset in 0i64..3600) {
        let tokens = service();
        let issued = Utc.timestamp_opt(ISSUED_AT, 0).unwrap();
        let signed = tokens.create_and_sign_at(&User::new("alice"), issued).unwrap();
        let claims = tokens.verify_at(&signed.token, issued).unwrap();

        let now = Utc.timestamp_opt(ISSUED_AT + offset, 0).unwrap();
        let remaining = claims.exp - (ISSUED_AT + offset);
        prop_assert_eq!(tokens.needs_renewal(&claims, now), remaining <= 1800);
    }

    #[test]
    fn any_signature_byte_flip_is_invalid(index in 0usize..256, mask in 1u8..=255) {
        let tokens = service();
        let signed = tokens.create_and_sign(&User::new("alice")).unwrap();
        let (signing_input, signature) = signed.token.rsplit_once('.').unwrap();

        let mut raw = URL_SAFE_NO_PAD.decode(signature).unwrap();
        let index = index % raw.len();
        raw[index] ^= mask;
        let tampered = format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(&raw));

        prop_assert!(tokens.verify(&signed.token).is_some());
        prop_assert!(tokens.verify(&tampered).is_none());
    }

    #[test]
    fn arbitrary_strings_never_verify(garbage in "\\PC{0,200}") {
        prop_assert!(service().verify(&garbage).is_none());
    }

    #[test]
    fn jwt_shaped_garbage_never_verifies(
        header in "[A-Za-z0-9_-]{10,40}",
        payload in "[A-Za-z0-9_-]{10,80}",
        signature in "[A-Za-z0-9_-]{10,80}",
    ) {
        let token = format!("{header}.{payload}.{signature}");
        prop_assert!(service().verify(&token).is_none());
    }
}
