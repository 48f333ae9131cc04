#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use backoffice::token::{DEFAULT_TOKEN_BYTES, generate_secure_token};
use backoffice::{ProposalToken, TokenError, generate_proposal_token, is_valid_proposal_token};
use claims::{assert_err, assert_ok};
use std::collections::HashSet;

#[test]
fn secure_tokens_are_lowercase_hex() {
    let token = generate_secure_token(DEFAULT_TOKEN_BYTES);
    assert_eq!(token.len(), 64);
    assert!(token.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));

    assert_eq!(generate_secure_token(0), "");
    assert_eq!(generate_secure_token(5).len(), 10);
}

#[test]
fn proposal_tokens_have_48_hex_characters() {
    let token = generate_proposal_token();
    let hex = token.strip_prefix("prop_").unwrap();
    assert_eq!(hex.len(), 48);
    assert!(is_valid_proposal_token(&token));
}

#[test]
fn generated_tokens_do_not_repeat() {
    let tokens: HashSet<_> = (0..256).map(|_| generate_proposal_token()).collect();
    assert_eq!(tokens.len(), 256);
}

#[test]
fn validation_accepts_the_documented_shape() {
    assert!(is_valid_proposal_token(&format!("prop_{}", "a".repeat(32))));
    assert!(is_valid_proposal_token(&format!("prop_{}", "0123456789abcdef".repeat(4))));

    assert!(!is_valid_proposal_token("prop_abc"));
    assert!(!is_valid_proposal_token(&format!("xyz_{}", "a".repeat(40))));
    assert!(!is_valid_proposal_token(&format!("prop_{}", "a".repeat(31))));
    assert!(!is_valid_proposal_token(&format!("prop_{}", "A".repeat(32))));
    assert!(!is_valid_proposal_token(&format!("prop_{}g", "a".repeat(32))));
    assert!(!is_valid_proposal_token(&format!("PROP_{}", "a".repeat(32))));
    assert!(!is_valid_proposal_token(""));
}

#[test]
fn proposal_token_parses_valid_text_only() {
    let raw = format!("prop_{}", "b".repeat(40));
    let token = assert_ok!(raw.parse::<ProposalToken>());
    assert_eq!(token.as_str(), raw);
    assert_eq!(token.to_string(), raw);

    assert_eq!(assert_err!(ProposalToken::parse("prop_abc")), TokenError);
}

#[test]
fn proposal_token_debug_hides_the_secret() {
    let token = ProposalToken::generate();
    let debug = format!("{token:?}");
    assert!(!debug.contains(&token.as_str()[5..]), "{debug}");
}

#[test]
fn proposal_token_serde_validates() {
    let token = ProposalToken::generate();
    let json = serde_json::to_string(&token).unwrap();
    assert_eq!(json, format!("\"{token}\""));

    let back: ProposalToken = assert_ok!(serde_json::from_str(&json));
    assert_eq!(back, token);

    assert_err!(serde_json::from_str::<ProposalToken>("\"prop_abc\""));
}
