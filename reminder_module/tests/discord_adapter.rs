use chrono::Utc;

use reminder_module::adapters::discord::DiscordRestClient;
use reminder_module::channel::{
    AdapterError, DeliveryError, DeliveryPayload, DirectMessenger, RecipientDirectory,
};

fn payload() -> DeliveryPayload {
    DeliveryPayload {
        reminded_by: None,
        message: Some("drink water".to_string()),
        permalink: None,
        remind_date: Utc::now(),
    }
}

#[test]
fn resolve_prefers_guild_member_nick() {
    let mut server = mockito::Server::new();
    let member = server
        .mock("GET", "/guilds/9/members/7")
        .with_status(200)
        .with_body(r#"{"nick":"ally","user":{"username":"alice","global_name":"Alice"}}"#)
        .create();

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    let recipient = client.resolve(7, 9).expect("resolve").expect("found");
    assert_eq!(recipient.id, 7);
    assert_eq!(recipient.display_name, "ally");
    member.assert();
}

#[test]
fn resolve_falls_back_to_global_user_lookup() {
    let mut server = mockito::Server::new();
    let member = server
        .mock("GET", "/guilds/9/members/7")
        .with_status(404)
        .with_body(r#"{"message":"Unknown Member"}"#)
        .create();
    let user = server
        .mock("GET", "/users/7")
        .with_status(200)
        .with_body(r#"{"username":"alice","global_name":null}"#)
        .create();

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    let recipient = client.resolve(7, 9).expect("resolve").expect("found");
    assert_eq!(recipient.display_name, "alice");
    member.assert();
    user.assert();
}

#[test]
fn resolve_reports_unknown_users_as_none() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/users/7")
        .with_status(404)
        .with_body(r#"{"message":"Unknown User"}"#)
        .create();

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    assert!(client.resolve(7, 0).expect("resolve").is_none());
}

#[test]
fn resolve_surfaces_server_errors() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/users/7")
        .with_status(500)
        .with_body("oops")
        .create();

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    match client.resolve(7, 0) {
        Err(AdapterError::Api { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected api error, got {:?}", other),
    }
}

#[test]
fn send_direct_opens_dm_channel_and_posts_embed() {
    let mut server = mockito::Server::new();
    let open_dm = server
        .mock("POST", "/users/@me/channels")
        .with_status(200)
        .with_body(r#"{"id":"555"}"#)
        .create();
    let post = server
        .mock("POST", "/channels/555/messages")
        .match_body(mockito::Matcher::PartialJsonString(
            r#"{"embeds":[{"title":"Reminder"}]}"#.to_string(),
        ))
        .with_status(200)
        .with_body("{}")
        .create();

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    let recipient = reminder_module::channel::Recipient {
        id: 7,
        display_name: "alice".to_string(),
    };
    client
        .send_direct(&recipient, &payload())
        .expect("send direct");
    open_dm.assert();
    post.assert();
}

#[test]
fn send_direct_classifies_blocked_dms_as_refused() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/users/@me/channels")
        .with_status(200)
        .with_body(r#"{"id":"555"}"#)
        .create();
    server
        .mock("POST", "/channels/555/messages")
        .with_status(403)
        .with_body(r#"{"message":"Cannot send messages to this user"}"#)
        .create();

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    let recipient = reminder_module::channel::Recipient {
        id: 7,
        display_name: "alice".to_string(),
    };
    match client.send_direct(&recipient, &payload()) {
        Err(DeliveryError::Refused(_)) => {}
        other => panic!("expected refused, got {:?}", other),
    }
}

#[test]
fn send_direct_classifies_other_failures_as_transport() {
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/users/@me/channels")
        .with_status(502)
        .with_body("bad gateway")
        .create();

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    let recipient = reminder_module::channel::Recipient {
        id: 7,
        display_name: "alice".to_string(),
    };
    match client.send_direct(&recipient, &payload()) {
        Err(DeliveryError::Transport(AdapterError::Api { status, .. })) => {
            assert_eq!(status, 502)
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}
