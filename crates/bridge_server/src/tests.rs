// Include tests
#[cfg(test)]
mod tests {
    use crate::health::TimeoutMonitorConfig;
    use crate::status::StatusMessage;
    use crate::testing::MockUpstream;
    use crate::*;
    use bridge_event_system::ShutdownState;
    use futures::{SinkExt, StreamExt};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct Running {
        server: Arc<BridgeServer>,
        addr: SocketAddr,
        shutdown: ShutdownState,
        task: JoinHandle<Result<(), ServerError>>,
    }

    impl Running {
        async fn stop(self) {
            self.shutdown.initiate_shutdown();
            tokio::time::timeout(Duration::from_secs(5), self.task)
                .await
                .expect("server should stop")
                .expect("server task should not panic")
                .expect("server should exit cleanly");
        }
    }

    async fn start(config: ServerConfig, upstream: Arc<MockUpstream>) -> Running {
        let server = Arc::new(create_server_with_config(config, upstream));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownState::new();

        let task = {
            let server = server.clone();
            let shutdown = shutdown.clone();
            tokio::spawn(async move { server.serve(listener, Some(shutdown)).await })
        };

        Running {
            server,
            addr,
            shutdown,
            task,
        }
    }

    async fn connect(addr: SocketAddr) -> Client {
        let (client, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        client
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    async fn wait_for_connections(server: &BridgeServer, expected: usize) {
        let manager = server.get_connection_manager();
        tokio::time::timeout(Duration::from_secs(5), async {
            while manager.connection_count().await != expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("connection count not reached in time");
    }

    #[tokio::test]
    async fn test_server_config_defaults() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.timeout_monitor, TimeoutMonitorConfig::default());

        let server = create_server(MockUpstream::new());
        assert_eq!(server.shutdown_phase(), shutdown::ShutdownPhase::Idle);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_websocket_command_reaches_upstream() {
        let mock = MockUpstream::new();
        let running = start(ServerConfig::default(), mock.clone()).await;
        let mut client = connect(running.addr).await;

        client
            .send(Message::Text("arkCommand::ListPlayers".to_string().into()))
            .await
            .unwrap();
        client
            .send(Message::Binary(b"arkCommand::SaveWorld".to_vec().into()))
            .await
            .unwrap();
        client
            .send(Message::Text("hello".to_string().into()))
            .await
            .unwrap();

        wait_until(|| mock.sent_commands().len() == 2).await;
        assert_eq!(mock.sent_commands(), vec!["ListPlayers", "SaveWorld"]);

        running.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reconnect_over_websocket() {
        let mock = MockUpstream::new();
        let running = start(ServerConfig::default(), mock.clone()).await;
        let mut client = connect(running.addr).await;

        client
            .send(Message::Text("sysCommand::reconnect".to_string().into()))
            .await
            .unwrap();

        wait_until(|| mock.reconnect_count() == 1).await;
        assert!(mock.sent_commands().is_empty());

        running.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connection_state_is_broadcast_to_clients() {
        let mock = MockUpstream::new();
        let running = start(ServerConfig::default(), mock.clone()).await;
        let mut first = connect(running.addr).await;
        let mut second = connect(running.addr).await;
        wait_for_connections(&running.server, 2).await;

        mock.publish_state(false);

        for client in [&mut first, &mut second] {
            let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
                .await
                .expect("status should arrive")
                .expect("stream open")
                .expect("valid frame");
            let Message::Text(text) = frame else {
                panic!("expected a text frame, got {frame:?}");
            };
            let status: StatusMessage = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(status, StatusMessage::connection_change(false));
        }

        running.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connections_over_limit_are_refused() {
        let config = ServerConfig {
            max_connections: 1,
            ..Default::default()
        };
        let running = start(config, MockUpstream::new()).await;
        let _accepted = connect(running.addr).await;
        wait_for_connections(&running.server, 1).await;

        let mut refused = connect(running.addr).await;
        let frame = tokio::time::timeout(Duration::from_secs(5), refused.next())
            .await
            .expect("close should arrive")
            .expect("stream open")
            .expect("valid frame");

        match frame {
            Message::Close(Some(close)) => assert_eq!(close.code, CloseCode::Again),
            other => panic!("expected close frame, got {other:?}"),
        }
        assert_eq!(running.server.get_connection_manager().connection_count().await, 1);

        running.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_releases_command_lane() {
        let mock = MockUpstream::new();
        let running = start(ServerConfig::default(), mock.clone()).await;
        let mut client = connect(running.addr).await;

        client
            .send(Message::Text("arkCommand::ListPlayers".to_string().into()))
            .await
            .unwrap();
        wait_until(|| mock.sent_commands().len() == 1).await;
        assert_eq!(running.server.get_command_proxy().active_lanes(), 1);

        client.close(None).await.unwrap();
        wait_for_connections(&running.server, 0).await;
        let proxy = running.server.get_command_proxy();
        wait_until(|| proxy.active_lanes() == 0).await;

        running.stop().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_repeated_failures_force_reconnect() {
        let mock = MockUpstream::failing();
        let config = ServerConfig {
            timeout_monitor: TimeoutMonitorConfig {
                threshold: 2,
                window: Duration::from_secs(60),
            },
            ..Default::default()
        };
        let running = start(config, mock.clone()).await;
        let mut client = connect(running.addr).await;

        for command in ["arkCommand::KickPlayer 1234", "arkCommand::KickPlayer 5678"] {
            client
                .send(Message::Text(command.to_string().into()))
                .await
                .unwrap();
        }

        wait_until(|| mock.reconnect_count() == 1).await;
        assert_eq!(mock.timeout_labels(), vec!["KickPlayer", "KickPlayer"]);

        running.stop().await;
    }
}
