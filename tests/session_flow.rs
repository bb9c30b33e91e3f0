use std::collections::HashSet;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::{
    net::TcpStream,
    task,
    time::{timeout, Duration, Instant},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (u16, task::JoinHandle<()>) {
    let port = portpicker::pick_unused_port().unwrap();
    let bind = format!("127.0.0.1:{port}");
    let server = randomatched_server::run_on(&bind).await.unwrap();
    let handle = task::spawn(async move {
        server.await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(200)).await;
    (port, handle)
}

async fn connect(port: u16) -> Socket {
    let url = Url::parse(&format!("ws://127.0.0.1:{port}/ws")).unwrap();
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn send(sock: &mut Socket, target: &str, payload: Value) {
    let frame = json!({ "type": 1, "target": target, "arguments": [payload] }).to_string();
    sock.send(Message::Text(frame)).await.unwrap();
}

/// Reads frames until one with `target` arrives, skipping everything else.
async fn expect(sock: &mut Socket, target: &str) -> Value {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Ok(Some(Ok(Message::Text(txt)))) =
            timeout(Duration::from_millis(100), sock.next()).await
        {
            let v: Value = serde_json::from_str(&txt).unwrap();
            if v["target"] == target {
                return v["arguments"][0].clone();
            }
        }
    }
    panic!("no {target} frame within 5s");
}

/// Skips success toasts still queued from earlier calls.
async fn expect_error_toast(sock: &mut Socket) -> Value {
    loop {
        let toast = expect(sock, "toast").await;
        if toast["severity"] == "error" {
            return toast;
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn generate_and_reshuffle_over_socket() {
    let (port, srv) = spawn_server().await;
    let mut sock = connect(port).await;

    send(
        &mut sock,
        "createList",
        json!({ "name": "Main", "heroes": ["Anna", "Bob", "Cid", "Dee", "Eve"] }),
    )
    .await;
    let lists = expect(&mut sock, "lists").await;
    assert_eq!(lists["lists"].as_array().unwrap().len(), 1);
    assert!(lists["activeList"].as_str().unwrap().starts_with("local_"));

    send(&mut sock, "generate", json!({})).await;
    let assignment = expect(&mut sock, "assignment").await;
    let slots = assignment["slots"].as_array().unwrap();
    assert_eq!(slots.len(), 4);

    let numbers: HashSet<u64> = slots
        .iter()
        .map(|s| s["playerNumber"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, HashSet::from([1, 2, 3, 4]));
    for slot in slots {
        let even = slot["playerNumber"].as_u64().unwrap() % 2 == 0;
        assert_eq!(slot["team"], if even { "A" } else { "B" });
    }
    assert_eq!(assignment["balanced"], true);

    let heroes_before: Vec<Value> = slots.iter().map(|s| s["hero"].clone()).collect();
    send(&mut sock, "reshuffleTeams", json!({})).await;
    let reshuffled = expect(&mut sock, "assignment").await;
    let heroes_after: Vec<Value> = reshuffled["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["hero"].clone())
        .collect();
    assert_eq!(heroes_before, heroes_after);

    srv.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn exclude_all_asks_before_acting() {
    let (port, srv) = spawn_server().await;
    let mut sock = connect(port).await;

    send(
        &mut sock,
        "createList",
        json!({ "name": "Main", "heroes": ["Anna", "Bob", "Cid", "Dee", "Eve", "Fay"] }),
    )
    .await;
    expect(&mut sock, "lists").await;
    send(&mut sock, "generate", json!({})).await;
    expect(&mut sock, "assignment").await;

    send(&mut sock, "excludeAll", json!({})).await;
    let confirm = expect(&mut sock, "confirm").await;
    assert_eq!(confirm["action"], "excludeAll");
    assert_eq!(confirm["destructive"], true);

    send(&mut sock, "excludeAll", json!({ "confirmed": true })).await;
    let lists = expect(&mut sock, "lists").await;
    let active = lists["activeList"].as_str().unwrap().to_string();
    assert!(active.starts_with("temp_"));
    let temp = lists["lists"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["id"] == active.as_str())
        .unwrap();
    assert_eq!(temp["heroes"].as_array().unwrap().len(), 2);

    srv.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failures_come_back_as_toasts() {
    let (port, srv) = spawn_server().await;
    let mut sock = connect(port).await;

    send(&mut sock, "generate", json!({})).await;
    let toast = expect_error_toast(&mut sock).await;
    assert!(toast["message"].as_str().unwrap().contains("hero list"));

    sock.send(Message::Text("{ nope".into())).await.unwrap();
    let toast = expect_error_toast(&mut sock).await;
    assert!(toast["message"].as_str().unwrap().contains("malformed"));

    send(
        &mut sock,
        "createList",
        json!({ "name": "Tiny", "heroes": ["Anna", "Bob", "Cid"] }),
    )
    .await;
    expect(&mut sock, "lists").await;
    send(&mut sock, "generate", json!({})).await;
    let toast = expect_error_toast(&mut sock).await;
    assert!(toast["message"].as_str().unwrap().contains("at least 4"));

    srv.abort();
}

fn slot_numbers(assignment: &Value) -> Vec<u64> {
    assignment["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["playerNumber"].as_u64().unwrap())
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reshuffle_all_and_heroes_over_socket() {
    let (port, srv) = spawn_server().await;
    let mut sock = connect(port).await;

    send(
        &mut sock,
        "createList",
        json!({ "name": "Main", "heroes": ["Anna", "Bob", "Cid", "Dee", "Eve", "Fay"] }),
    )
    .await;
    expect(&mut sock, "lists").await;

    send(&mut sock, "reshuffleAll", json!({})).await;
    let all = expect(&mut sock, "assignment").await;
    let mut numbers = slot_numbers(&all);
    let before = numbers.clone();
    numbers.sort();
    assert_eq!(numbers, vec![1, 2, 3, 4]);

    send(&mut sock, "reshuffleHeroes", json!({})).await;
    let heroes = expect(&mut sock, "assignment").await;
    assert_eq!(slot_numbers(&heroes), before);
    let names: HashSet<&str> = heroes["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["hero"].as_str().unwrap())
        .collect();
    assert_eq!(names.len(), 4);

    send(&mut sock, "excludeOne", json!({ "slot": 9 })).await;
    let toast = expect_error_toast(&mut sock).await;
    assert!(toast["message"].as_str().unwrap().contains("slot 9"));

    srv.abort();
}
