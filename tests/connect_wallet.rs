#![allow(non_snake_case)]
use chronoclash::{
    controller::ViewController,
    protocol::Action,
    test_helpers::{
        FakeMessenger,
        FakeWallet,
        TEST_ADDRESS,
        latest_notification,
        notification_texts,
    },
    view::{
        LeaderboardPanel,
        NotificationKind,
        View,
    },
    wallets::REQUIRED_PERMISSIONS,
};
use serde_json::json;

fn arena() -> FakeMessenger {
    FakeMessenger::new().with_reply(
        "GetLeaderboard",
        json!({
            "status": "success",
            "leaderboard": [
                { "address": "player-one-address", "wins": 3, "tokens": 130 },
                { "address": TEST_ADDRESS, "wins": 0, "tokens": 100 }
            ]
        }),
    )
}

#[tokio::test]
async fn connect_wallet__stores_address_and_switches_to_match_options() {
    // given
    let mut controller = ViewController::new(FakeWallet::default(), arena());

    // when
    controller.connect_wallet().await;

    // then
    assert_eq!(Some(TEST_ADDRESS), controller.session().wallet_address());
    assert_eq!("Connected: abcdefgh...", controller.view().status_text);
    assert_eq!(View::MatchOptions, controller.view().active);
    assert_eq!(REQUIRED_PERMISSIONS.as_slice(), controller.wallet().granted());
    assert_eq!(
        vec![
            "Wallet connected successfully!".to_string(),
            "Joined game successfully!".to_string(),
        ],
        notification_texts(&controller)
    );
}

#[tokio::test]
async fn connect_wallet__registers_player_with_a_commit_only() {
    // given
    let mut controller = ViewController::new(FakeWallet::default(), arena());

    // when
    controller.connect_wallet().await;

    // then
    let expected = vec![Action::JoinGame {
        address: TEST_ADDRESS.to_string(),
    }];
    assert_eq!(expected, controller.messenger().messages());
    assert_eq!(vec!["GetLeaderboard"], controller.messenger().dry_run_names());
}

#[tokio::test]
async fn connect_wallet__loads_the_leaderboard() {
    let mut controller = ViewController::new(FakeWallet::default(), arena());

    controller.connect_wallet().await;

    let LeaderboardPanel::Rows(rows) = &controller.view().leaderboard else {
        panic!("expected leaderboard rows");
    };
    assert_eq!(2, rows.len());
    assert_eq!("player...ress", rows[0].address);
    assert_eq!("130", rows[0].tokens);
}

#[tokio::test]
async fn connect_wallet__unavailable_wallet__reports_and_stops() {
    // given
    let mut controller = ViewController::new(FakeWallet::default().unavailable(), arena());

    // when
    controller.connect_wallet().await;

    // then
    assert_eq!("Wallet not available", controller.view().status_text);
    assert_eq!(
        Some((
            NotificationKind::Error,
            "Please install or start the wallet extension.".to_string()
        )),
        latest_notification(&controller)
    );
    assert!(!controller.session().is_connected());
    assert!(controller.messenger().dry_runs().is_empty());
    assert!(controller.messenger().messages().is_empty());
}

#[tokio::test]
async fn connect_wallet__denied_permissions__stays_disconnected() {
    // given
    let mut controller =
        ViewController::new(FakeWallet::default().denying_permissions(), arena());

    // when
    controller.connect_wallet().await;

    // then
    assert_eq!(
        Some((
            NotificationKind::Error,
            "Error connecting wallet: wallet permission request was rejected: permission request rejected by user"
                .to_string()
        )),
        latest_notification(&controller)
    );
    assert!(!controller.session().is_connected());
    assert_eq!(View::Wallet, controller.view().active);
    assert_eq!("Not connected", controller.view().status_text);
}

#[tokio::test]
async fn connect_wallet__missing_signer__stays_disconnected() {
    let mut controller = ViewController::new(FakeWallet::default().without_signer(), arena());

    controller.connect_wallet().await;

    assert_eq!(
        Some((
            NotificationKind::Error,
            "Error connecting wallet: data item signer is not available".to_string()
        )),
        latest_notification(&controller)
    );
    assert!(!controller.session().is_connected());
    assert!(controller.messenger().messages().is_empty());
}

#[tokio::test]
async fn connect_wallet__failed_registration__keeps_connection_but_reports() {
    // given
    let mut controller =
        ViewController::new(FakeWallet::default(), arena().failing_commits());

    // when
    controller.connect_wallet().await;

    // then
    let (kind, text) = latest_notification(&controller).unwrap();
    assert_eq!(NotificationKind::Error, kind);
    assert!(text.starts_with("Error connecting wallet: "));
    assert!(text.contains("messenger unit down"));
    assert!(controller.session().is_connected());
    assert_eq!(View::MatchOptions, controller.view().active);
    assert!(
        !notification_texts(&controller).contains(&"Joined game successfully!".to_string())
    );
}
