#![allow(non_snake_case)]
use chronoclash::{
    protocol::{
        Action,
        COORDINATE_ROOM_RESPONSE,
    },
    test_helpers::{
        FakeMessenger,
        OPPONENT_ADDRESS,
        TEST_ADDRESS,
        connected_controller,
        latest_notification,
        notification_texts,
    },
    view::{
        NotificationKind,
        View,
    },
};
use serde_json::json;

fn arena() -> FakeMessenger {
    FakeMessenger::new()
        .with_tagged_reply(
            "CoordinateRoom",
            COORDINATE_ROOM_RESPONSE,
            json!({
                "status": "success",
                "match_id": "m2",
                "opponent": OPPONENT_ADDRESS,
                "current_turn": format!("{OPPONENT_ADDRESS} (Player A)"),
                "wager": 25
            }),
        )
        .with_reply(
            "GetMatchState",
            json!({
                "status": "success",
                "match_id": "m2",
                "room_code": "XY34",
                "wager": "25",
                "turn": OPPONENT_ADDRESS,
                "player_a": OPPONENT_ADDRESS,
                "player_b": TEST_ADDRESS,
                "cards": {
                    "A": { "cards": [{ "name": "Quake", "hp": 50, "play_count": 2 }] },
                    "B": { "cards": [{ "name": "Gust", "hp": 30, "play_count": 0 }] }
                }
            }),
        )
        .with_reply("JoinGame", json!({ "tokens": "75" }))
}

#[tokio::test]
async fn join_match__sends_trimmed_room_code() {
    // given
    let mut controller = connected_controller(arena()).await;
    controller.inputs_mut().room_code = "  XY34 ".to_string();

    // when
    controller.join_match().await;

    // then
    let expected = Action::JoinRoom {
        address: TEST_ADDRESS.to_string(),
        room_code: "XY34".to_string(),
    };
    assert_eq!(expected, controller.messenger().dry_runs()[0]);
    assert_eq!(vec![expected], controller.messenger().messages());
}

#[tokio::test]
async fn join_match__announces_opponent_and_turn_holder() {
    // given
    let mut controller = connected_controller(arena()).await;
    controller.inputs_mut().room_code = "XY34".to_string();

    // when
    controller.join_match().await;

    // then
    let texts = notification_texts(&controller);
    assert!(texts.contains(
        &"Joined match! Opponent: zyxwvu...4321, Wager: 25, Match ID: m2".to_string()
    ));
    assert!(
        texts.contains(&"Match started! Your turn: zyxwvu...4321, Match ID: m2".to_string())
    );
}

#[tokio::test]
async fn join_match__as_player_b__shows_own_cards_from_slot_b() {
    // given
    let mut controller = connected_controller(arena()).await;
    controller.inputs_mut().room_code = "XY34".to_string();

    // when
    controller.join_match().await;

    // then
    let view = controller.view();
    assert_eq!(View::Match, view.active);
    assert_eq!("Gust: 30 HP, 0/3", view.your_cards);
    assert_eq!("Quake: 50 HP, 2/3", view.opponent_cards);
    assert_eq!("zyxwvu...4321", view.turn);
    assert_eq!("75", view.tokens);
    assert_eq!(Some("m2"), controller.session().current_match_id());
}

#[tokio::test]
async fn join_match__blank_room_code__is_rejected_locally() {
    let mut controller = connected_controller(arena()).await;
    controller.inputs_mut().room_code = "   ".to_string();

    controller.join_match().await;

    assert_eq!(
        Some((
            NotificationKind::Error,
            "Please enter a room code".to_string()
        )),
        latest_notification(&controller)
    );
    assert!(controller.messenger().dry_runs().is_empty());
}

#[tokio::test]
async fn join_match__rejection_without_message__reports_invalid_format() {
    // given
    let messenger = arena().with_tagged_reply(
        "CoordinateRoom",
        COORDINATE_ROOM_RESPONSE,
        json!({ "status": "error" }),
    );
    let mut controller = connected_controller(messenger).await;
    controller.inputs_mut().room_code = "XY34".to_string();

    // when
    controller.join_match().await;

    // then
    assert_eq!(
        Some((
            NotificationKind::Error,
            "Error joining match: Invalid response format".to_string()
        )),
        latest_notification(&controller)
    );
    assert!(controller.messenger().messages().is_empty());
    assert_eq!(View::MatchOptions, controller.view().active);
}

#[tokio::test]
async fn join_match__room_full__reports_process_message() {
    let messenger = arena().with_tagged_reply(
        "CoordinateRoom",
        COORDINATE_ROOM_RESPONSE,
        json!({ "status": "error", "message": "Room is full" }),
    );
    let mut controller = connected_controller(messenger).await;
    controller.inputs_mut().room_code = "XY34".to_string();

    controller.join_match().await;

    assert_eq!(
        Some((
            NotificationKind::Error,
            "Error joining match: Room is full".to_string()
        )),
        latest_notification(&controller)
    );
}
