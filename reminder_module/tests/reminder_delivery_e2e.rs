//! End-to-end sweep: a stored reminder comes due, the Discord adapter is
//! driven against a mock API, and the row ends up `REMINDED`.

use chrono::{Duration, Utc};
use tempfile::TempDir;

use reminder_module::adapters::discord::DiscordRestClient;
use reminder_module::{
    ReminderDeliverer, ReminderPoller, ReminderService, ReminderStatus, SqliteReminderStore,
};

#[test]
fn due_reminder_is_delivered_through_the_rest_adapter() {
    let mut server = mockito::Server::new();
    let user = server
        .mock("GET", "/users/7")
        .with_status(200)
        .with_body(r#"{"username":"alice","global_name":"Alice"}"#)
        .create();
    let open_dm = server
        .mock("POST", "/users/@me/channels")
        .with_status(200)
        .with_body(r#"{"id":"900"}"#)
        .create();
    let post = server
        .mock("POST", "/channels/900/messages")
        .with_status(200)
        .with_body("{}")
        .create();

    let temp = TempDir::new().expect("tempdir");
    let store = SqliteReminderStore::new(temp.path().join("reminders.db")).expect("open store");
    let service = ReminderService::new(store.clone());
    let item = service
        .create(
            0,
            7,
            7,
            Some("stretch your legs"),
            Utc::now() + Duration::seconds(20),
            None,
        )
        .expect("create reminder");

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    let deliverer = ReminderDeliverer::new(store.clone(), client.clone(), client);
    let poller = ReminderPoller::new(store.clone(), deliverer, std::time::Duration::from_secs(30));

    poller.tick(Utc::now()).expect("tick");

    let fresh = store.get(item.idx).expect("get").expect("still stored");
    assert_eq!(fresh.status, ReminderStatus::Reminded);
    user.assert();
    open_dm.assert();
    post.assert();
}

#[test]
fn unreachable_recipient_fails_but_stays_retrievable() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/users/7")
        .with_status(404)
        .with_body(r#"{"message":"Unknown User"}"#)
        .create();

    let temp = TempDir::new().expect("tempdir");
    let store = SqliteReminderStore::new(temp.path().join("reminders.db")).expect("open store");
    let service = ReminderService::new(store.clone());
    let item = service
        .create(0, 7, 7, None, Utc::now() + Duration::seconds(5), None)
        .expect("create reminder");

    let client = DiscordRestClient::with_api_base("test-token", server.url());
    let deliverer = ReminderDeliverer::new(store.clone(), client.clone(), client);
    let poller = ReminderPoller::new(store.clone(), deliverer, std::time::Duration::from_secs(30));

    poller.tick(Utc::now()).expect("tick");
    let fresh = service.get(7, item.idx).expect("still retrievable");
    assert_eq!(fresh.status, ReminderStatus::Failed);

    // A later sweep leaves the failed row alone.
    poller.tick(Utc::now() + Duration::seconds(60)).expect("tick");
    assert_eq!(
        service.get(7, item.idx).expect("get").status,
        ReminderStatus::Failed
    );
}
