use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use ws_keepalive::{ConnectionState, KeepaliveClient, KeepaliveOptions, MessageHandler};

#[derive(Debug, Clone, Copy)]
enum Mode {
    /// Answers probes and echoes application data
    Echo,
    /// Drops the first connection right after the handshake, then behaves like `Echo`
    DropFirst,
    /// Accepts connections and never answers
    Silent,
}

#[derive(Debug, PartialEq, Eq)]
enum ServerEvent {
    Accepted(usize),
    Probe(usize),
}

async fn spawn_server(mode: Mode) -> (SocketAddr, mpsc::UnboundedReceiver<ServerEvent>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut index = 0;
        while let Ok((stream, _)) = listener.accept().await {
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            let _ = tx.send(ServerEvent::Accepted(index));

            let events = tx.clone();
            let connection = index;
            index += 1;

            tokio::spawn(async move {
                match mode {
                    Mode::DropFirst if connection == 0 => {
                        drop(ws);
                        return;
                    }
                    Mode::DropFirst => {
                        let _ = ws.send(Message::text("welcome".to_string())).await;
                    }
                    _ => {}
                }

                while let Some(Ok(message)) = ws.next().await {
                    let Message::Text(text) = message else {
                        continue;
                    };
                    if text.as_str() == "!" {
                        let _ = events.send(ServerEvent::Probe(connection));
                    }
                    if matches!(mode, Mode::Silent) {
                        continue;
                    }

                    let reply = if text.as_str() == "!" {
                        "!".to_string()
                    } else {
                        format!("echo:{}", text.as_str())
                    };
                    if ws.send(Message::text(reply)).await.is_err() {
                        break;
                    }
                }
            });
        }
    });

    (addr, rx)
}

fn client_for(addr: SocketAddr, tick: u64, probe: u64, ack: u64) -> KeepaliveClient {
    KeepaliveClient::new(KeepaliveOptions {
        base_url: Some(format!("http://{}/index.html", addr)),
        default_address: Some("/ws/test".to_string()),
        tick_interval: Some(tick),
        probe_interval: Some(probe),
        ack_timeout: Some(ack),
    })
    .unwrap()
}

fn channel_handler() -> (MessageHandler, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handler: MessageHandler = Arc::new(move |payload| {
        let _ = tx.send(payload);
    });
    (handler, rx)
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> ServerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout waiting for server event")
        .expect("server stopped")
}

async fn wait_for_accept(rx: &mut mpsc::UnboundedReceiver<ServerEvent>, expected: usize) {
    loop {
        if next_event(rx).await == ServerEvent::Accepted(expected) {
            return;
        }
    }
}

async fn wait_for_open(client: &KeepaliveClient) {
    let mut changes = client.state_changes();
    tokio::time::timeout(
        Duration::from_secs(5),
        changes.wait_for(|state| *state == ConnectionState::Open),
    )
    .await
    .expect("timeout waiting for open")
    .expect("state channel closed");
}

#[tokio::test]
async fn test_data_and_probes_over_websocket() {
    let (addr, mut server) = spawn_server(Mode::Echo).await;
    let client = client_for(addr, 50, 100, 500);
    let (handler, mut received) = channel_handler();

    client.connect(None, Some(handler)).unwrap();
    wait_for_accept(&mut server, 0).await;
    wait_for_open(&client).await;

    client.send("hello").await.unwrap();
    let reply = tokio::time::timeout(Duration::from_secs(5), received.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reply, "echo:hello");

    // The server sees probes; their acknowledgments never reach the handler
    assert_eq!(next_event(&mut server).await, ServerEvent::Probe(0));
    tokio::time::sleep(Duration::from_millis(200)).await;
    while let Ok(payload) = received.try_recv() {
        assert_ne!(payload, "!");
    }

    client.shutdown().await.unwrap();
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_reconnects_after_server_drops_connection() {
    let (addr, mut server) = spawn_server(Mode::DropFirst).await;
    let client = client_for(addr, 100, 200, 100);
    let (handler, mut received) = channel_handler();

    client.connect(Some("/ws/feed"), Some(handler)).unwrap();
    wait_for_accept(&mut server, 0).await;
    wait_for_accept(&mut server, 1).await;

    // Same handler is used on the new connection
    let welcome = tokio::time::timeout(Duration::from_secs(5), received.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(welcome, "welcome");

    wait_for_open(&client).await;
    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reconnects_when_probes_go_unanswered() {
    let (addr, mut server) = spawn_server(Mode::Silent).await;
    let client = client_for(addr, 20, 40, 30);

    client.connect(None, None).unwrap();
    wait_for_accept(&mut server, 0).await;
    assert_eq!(next_event(&mut server).await, ServerEvent::Probe(0));
    wait_for_accept(&mut server, 1).await;

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_disconnect_stops_reconnecting() {
    let (addr, mut server) = spawn_server(Mode::Silent).await;
    let client = client_for(addr, 20, 40, 30);

    client.connect(None, None).unwrap();
    wait_for_accept(&mut server, 0).await;
    wait_for_open(&client).await;
    client.disconnect().unwrap();

    let mut changes = client.state_changes();
    tokio::time::timeout(
        Duration::from_secs(5),
        changes.wait_for(|state| *state == ConnectionState::Disconnected),
    )
    .await
    .unwrap()
    .unwrap();

    // Without a running heartbeat nothing triggers another connection
    tokio::time::sleep(Duration::from_millis(300)).await;
    while let Ok(event) = server.try_recv() {
        assert!(
            !matches!(event, ServerEvent::Accepted(n) if n > 0),
            "unexpected reconnect: {:?}",
            event
        );
    }

    client.shutdown().await.unwrap();
}
