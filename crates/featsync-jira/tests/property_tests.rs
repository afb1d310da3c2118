//! Property tests for featsync-jira
//!
//! The basic-auth token decodes back to `username:password`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use featsync_jira::basic_token;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_token_decodes_to_credentials(
        username in "[a-zA-Z0-9._@-]{1,20}",
        password in "\\PC{0,30}",
    ) {
        let token = basic_token(&username, &password);
        let decoded = String::from_utf8(STANDARD.decode(&token).unwrap()).unwrap();
        prop_assert_eq!(decoded.split_once(':'), Some((username.as_str(), password.as_str())));
    }

    /// Standard alphabet with padding, never a line break.
    #[test]
    fn prop_token_is_one_padded_line(username in "\\PC{1,20}", password in "\\PC{0,20}") {
        let token = basic_token(&username, &password);
        prop_assert_eq!(token.len() % 4, 0);
        prop_assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));
    }
}
