mod support;

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_json(socket: &mut Socket) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("message in time")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("json message");
        }
    }
}

async fn join(socket: &mut Socket, name: &str) {
    let join = serde_json::json!({
        "type": "Join",
        "data": { "display_name": name, "character": "Monkey" }
    });
    socket
        .send(Message::Text(join.to_string().into()))
        .await
        .expect("send join");
}

#[tokio::test]
async fn when_a_client_joins_then_it_gets_an_identity_and_appears_in_the_world() {
    let session_id = format!("ws-{}", uuid::Uuid::new_v4());
    let created = support::create_session(serde_json::json!({ "session_id": session_id })).await;
    assert_eq!(created.status(), reqwest::StatusCode::CREATED);

    let (mut socket, _) = connect_async(support::ws_url(Some(&session_id)))
        .await
        .expect("ws connect");
    join(&mut socket, "Ada").await;

    let identity = next_json(&mut socket).await;
    assert_eq!(identity["type"], "Identity");
    let player_id = identity["data"]["player_id"].as_u64().expect("numeric id");

    let status = next_json(&mut socket).await;
    assert_eq!(status["type"], "SessionStatus");

    let update = loop {
        let msg = next_json(&mut socket).await;
        if msg["type"] == "WorldUpdate" && msg["data"]["state"]["players"][0].is_object() {
            break msg;
        }
    };
    let player = &update["data"]["state"]["players"][0];
    assert_eq!(player["id"].as_u64(), Some(player_id));
    assert_eq!(player["name"], "Ada");
}

#[tokio::test]
async fn when_the_session_does_not_exist_then_the_upgrade_is_refused() {
    let result = connect_async(support::ws_url(Some("no-such-session"))).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn when_input_arrives_before_join_then_the_socket_is_closed() {
    let (mut socket, _) = connect_async(support::ws_url(None))
        .await
        .expect("ws connect");
    let input = serde_json::json!({ "type": "Input", "data": { "up": true } });
    socket
        .send(Message::Text(input.to_string().into()))
        .await
        .expect("send input");

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(frame) = socket.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => {}
            }
        }
        true
    })
    .await
    .expect("close in time");

    assert!(closed);
}
