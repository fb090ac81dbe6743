#![allow(non_snake_case)]
use chronoclash::{
    controller::ViewController,
    protocol::COORDINATE_ROOM_RESPONSE,
    test_helpers::{
        FakeMessenger,
        FakeWallet,
        connected_controller,
        latest_notification,
    },
    view::{
        Inputs,
        NotificationKind,
        View,
        ViewState,
    },
};
use proptest::prelude::*;
use serde_json::json;

fn arena() -> FakeMessenger {
    FakeMessenger::new()
        .with_tagged_reply(
            "CoordinateRoom",
            COORDINATE_ROOM_RESPONSE,
            json!({
                "status": "success",
                "match_id": "m1",
                "room_code": "AB12",
                "wager": "10",
                "tokens_remaining": "90"
            }),
        )
        .with_reply(
            "GetMatchState",
            json!({ "status": "success", "match_id": "m1", "room_code": "AB12", "wager": "10" }),
        )
        .with_reply("JoinGame", json!({ "tokens": 90 }))
        .with_reply("GetLeaderboard", json!({ "status": "success", "leaderboard": [] }))
}

#[tokio::test]
async fn disconnect_wallet__mid_match__resets_everything() {
    // given
    let mut controller = connected_controller(arena()).await;
    controller.inputs_mut().wager = "10".to_string();
    controller.create_match().await;
    assert_eq!(View::Match, controller.view().active);

    // when
    controller.disconnect_wallet().await;

    // then
    assert_eq!(&ViewState::default(), controller.view());
    assert_eq!(&Inputs::default(), controller.inputs());
    assert!(!controller.session().is_connected());
    assert_eq!(None, controller.session().current_match_id());
    assert_eq!(1, controller.wallet().disconnect_calls());
    assert_eq!(
        Some((
            NotificationKind::Success,
            "Wallet disconnected successfully!".to_string()
        )),
        latest_notification(&controller)
    );
}

#[tokio::test]
async fn disconnect_wallet__wallet_refuses__still_resets_and_reports() {
    // given
    let mut controller =
        ViewController::new(FakeWallet::default().failing_disconnect(), arena());
    controller.connect_wallet().await;

    // when
    controller.disconnect_wallet().await;

    // then
    assert_eq!(&ViewState::default(), controller.view());
    assert!(!controller.session().is_connected());
    let (kind, text) = latest_notification(&controller).unwrap();
    assert_eq!(NotificationKind::Error, kind);
    assert!(text.starts_with("Error disconnecting wallet: "));
    assert!(text.contains("disconnect refused"));
}

#[tokio::test]
async fn disconnect_wallet__unavailable_wallet__skips_the_wallet_call() {
    let mut controller = ViewController::new(FakeWallet::default().unavailable(), arena());

    controller.disconnect_wallet().await;

    assert_eq!(0, controller.wallet().disconnect_calls());
    assert_eq!(&ViewState::default(), controller.view());
}

proptest! {
    #[test]
    fn disconnect_wallet__any_typed_inputs__are_cleared(
        wager in ".{0,12}",
        room_code in ".{0,12}",
        card in ".{0,3}",
        move_type in ".{0,8}",
        target in ".{0,3}",
    ) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            // given
            let mut controller = connected_controller(arena()).await;
            *controller.inputs_mut() = Inputs { wager, room_code, card, move_type, target };

            // when
            controller.disconnect_wallet().await;

            // then
            prop_assert_eq!(&Inputs::default(), controller.inputs());
            prop_assert_eq!(&ViewState::default(), controller.view());
            Ok(())
        })?;
    }
}
