//! Integration tests for decoding search replies.
//!
//! These tests run a recorded search reply through the public decoder and through a client backed
//! by a scripted channel.

use doorkey_core::{AdminCredentials, Password, UserId};
use doorkey_directory::{decode_users, Attribute, DirectoryClient, ScriptedChannel, User};
use std::fs;
use std::path::PathBuf;

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load the search reply fixture from disk, without its line terminator.
fn load_search_reply() -> String {
    let fixture_path = fixtures_dir().join("search_reply.txt");
    let reply = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read search reply fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });
    reply.trim_end_matches(['\r', '\n']).to_string()
}

fn find<'a>(users: &'a [User], uid: &str) -> &'a User {
    users
        .iter()
        .find(|user| user.id().as_str() == uid)
        .unwrap_or_else(|| panic!("user {uid} missing from decoded reply"))
}

fn token_ids(user: &User) -> Vec<String> {
    let mut ids: Vec<String> = user.tokens().map(|t| t.id().to_string()).collect();
    ids.sort();
    ids
}

#[test]
fn test_decode_fixture_drops_malformed_records() {
    let users = decode_users(load_search_reply().as_str());

    // "Broken;3;nopassword" and the record with an empty leading token are dropped
    assert_eq!(users.len(), 3, "Expected 3 well-formed records");
    let ids: Vec<&str> = users.iter().map(|user| user.id().as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "jd"]);
}

#[test]
fn test_decode_fixture_user_fields() {
    let users = decode_users(load_search_reply().as_str());

    let max = find(&users, "1");
    assert_eq!(max.name().as_str(), "Max Mustermann");
    assert_eq!(token_ids(max), vec!["04a224b2", "9f86d081"]);

    let erika = find(&users, "2");
    assert_eq!(erika.name().as_str(), "Erika Musterfrau");
    assert_eq!(erika.token_count(), 0);

    let john = find(&users, "jd");
    assert_eq!(john.to_string(), "John Doe");
    assert_eq!(token_ids(john), vec!["tok,2", "tok:1"]);
}

#[test]
fn test_decoded_users_serialize() {
    let users = decode_users(load_search_reply().as_str());
    let json = serde_json::to_string(&users).unwrap();
    let restored: Vec<User> = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, users);
}

#[tokio::test]
async fn test_client_search_over_scripted_channel() {
    let channel = ScriptedChannel::new().with_reply(load_search_reply());
    let transcript = channel.transcript();
    let credentials = AdminCredentials::new(
        UserId::new("admin").unwrap(),
        Password::new("secret").unwrap(),
    );

    let mut client = DirectoryClient::with_channel(credentials, Box::new(channel));
    client.connect().await.unwrap();
    let users = client
        .search("", &[Attribute::new("uid", "1")])
        .await
        .unwrap();

    assert_eq!(users.len(), 3);
    assert_eq!(transcript.sent(), vec!["search$admin$secret$1"]);

    // The script is exhausted, so the next request sees the stream end.
    let error = client
        .search("", &[Attribute::new("uid", "1")])
        .await
        .unwrap_err();
    assert!(error.is_transport());
}
