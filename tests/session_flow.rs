mod support;

use futures::SinkExt;
use tokio_tungstenite::tungstenite::Message;

#[tokio::test]
async fn test_assignment_precedes_game_state() {
    let mut ws = support::connect().await;

    let id = support::assigned_body_id(&mut ws).await;
    let state = support::wait_for_state(&mut ws, 30, |state| {
        state["Bodies"].get(id.as_str()).is_some()
    })
    .await;

    assert_eq!(state["Bounds"]["W"], 20000.0);
    // Player mass sits at the decay threshold, so the spawn tick already decays it.
    let mass = state["Bodies"][id.as_str()]["Mass"]
        .as_f64()
        .expect("mass is a number");
    assert!(mass > 9_900.0 && mass < 10_000.0, "unexpected player mass {mass}");
}

#[tokio::test]
async fn test_thrust_keeps_session_alive() {
    let mut ws = support::connect().await;
    let id = support::assigned_body_id(&mut ws).await;

    ws.send(Message::Text(r#"{"Thrust":{"X":1,"Y":0}}"#.into()))
        .await
        .expect("send thrust");
    ws.send(Message::Text(r#"{"thrust":{"x":0,"y":0}}"#.into()))
        .await
        .expect("send lowercase thrust");

    // The body is still present several ticks later.
    for _ in 0..5 {
        support::wait_for_state(&mut ws, 30, |state| {
            state["Bodies"].get(id.as_str()).is_some()
        })
        .await;
    }
}

#[tokio::test]
async fn test_binary_frames_close_the_session() {
    let mut ws = support::connect().await;
    support::assigned_body_id(&mut ws).await;

    ws.send(Message::Binary(vec![1u8, 2, 3].into()))
        .await
        .expect("send binary");

    for _ in 0..60 {
        if let Message::Close(frame) = support::next_message(&mut ws).await {
            let frame = frame.expect("close frame carries a code");
            assert_eq!(u16::from(frame.code), 1003);
            return;
        }
    }
    panic!("session was not closed");
}

#[tokio::test]
async fn test_disconnect_removes_body() {
    let mut leaving = support::connect().await;
    let leaving_id = support::assigned_body_id(&mut leaving).await;
    let mut watcher = support::connect().await;
    support::assigned_body_id(&mut watcher).await;

    support::wait_for_state(&mut watcher, 30, |state| {
        state["Bodies"].get(leaving_id.as_str()).is_some()
    })
    .await;

    leaving.close(None).await.expect("close leaving client");

    support::wait_for_state(&mut watcher, 90, |state| {
        state["Bodies"].get(leaving_id.as_str()).is_none()
    })
    .await;
}
