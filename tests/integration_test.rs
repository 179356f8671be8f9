//! Integration tests for the chess server using process-based testing.

use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::Duration;

const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Helper struct to manage server process lifecycle
struct TestServer {
    process: Child,
    port: u16,
}

impl TestServer {
    /// Start a test server on the specified port
    fn start(port: u16) -> Self {
        let process = Command::new("cargo")
            .args(["run", "--bin", "server", "--", "--port", &port.to_string()])
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to start server");

        // Give server time to start
        thread::sleep(Duration::from_millis(500));

        TestServer { process, port }
    }

    /// Get the WebSocket URL for this server
    fn url(&self) -> String {
        format!("ws://127.0.0.1:{}/ws", self.port)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Kill the server process when the test ends
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Helper struct to manage client process lifecycle
struct TestClient {
    process: Child,
    stdin: Option<ChildStdin>,
}

impl TestClient {
    /// Start a test client authenticating as the given user
    fn start(url: &str, user_id: &str) -> Self {
        Self::start_with_args(url, &["--user-id", user_id], Duration::from_millis(300))
    }

    /// Start a test client with a pre-issued (possibly invalid) token
    fn start_with_token(url: &str, token: &str) -> Self {
        Self::start_with_args(url, &["--token", token], Duration::from_millis(100))
    }

    fn start_with_args(url: &str, auth_args: &[&str], delay: Duration) -> Self {
        let mut args = vec!["run", "--bin", "client", "--", "--url", url];
        args.extend_from_slice(auth_args);

        let mut process = Command::new("cargo")
            .args(&args)
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(Stdio::piped())
            .spawn()
            .expect("Failed to start client");

        // Take stdin for sending messages
        let stdin = process.stdin.take();

        // Give client time to connect if requested
        if !delay.is_zero() {
            thread::sleep(delay);
        }

        TestClient { process, stdin }
    }

    /// Send a line to the client's stdin
    fn send_line(&mut self, line: &str) -> Result<(), std::io::Error> {
        if let Some(stdin) = &mut self.stdin {
            writeln!(stdin, "{}", line)?;
            stdin.flush()?;
        }
        Ok(())
    }

    /// Check if the client process is still running (not crashed)
    fn is_running(&mut self) -> bool {
        matches!(self.process.try_wait(), Ok(None))
    }

    /// Wait for the client process to exit with timeout
    /// Returns Ok(ExitStatus) if process exits within timeout, Err otherwise
    fn wait_for_exit(&mut self, timeout: Duration) -> Result<std::process::ExitStatus, String> {
        use std::io::Read;

        let start = std::time::Instant::now();
        loop {
            // Check if process has exited
            if let Ok(Some(status)) = self.process.try_wait() {
                return Ok(status);
            }
            // Check timeout
            if start.elapsed() > timeout {
                // Try to read stderr for debugging
                let mut stderr_output = String::new();
                if let Some(ref mut stderr) = self.process.stderr {
                    let _ = stderr.read_to_string(&mut stderr_output);
                }
                return Err(format!(
                    "Timeout waiting for process to exit after {:?}. Stderr: {}",
                    timeout,
                    if stderr_output.is_empty() {
                        "(empty)"
                    } else {
                        &stderr_output
                    }
                ));
            }
            // Sleep briefly before checking again
            thread::sleep(Duration::from_millis(50));
        }
    }
}

impl Drop for TestClient {
    fn drop(&mut self) {
        // Kill the client process when done
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[test]
fn test_server_starts_successfully() {
    // テスト項目: サーバーが正常に起動する
    // given (前提条件):
    let port = 18090;

    // when (操作):
    let _server = TestServer::start(port);

    // then (期待する結果):
    // Server started successfully (no panic)
    thread::sleep(Duration::from_millis(100));
    // If we reach here, the server started successfully
}

#[test]
fn test_client_connects_with_minted_token() {
    // テスト項目: 開発用トークンを持つクライアントが接続できる
    // given (前提条件):
    let port = 18091;
    let server = TestServer::start(port);

    // when (操作):
    let mut client = TestClient::start(&server.url(), "alice");

    // then (期待する結果):
    thread::sleep(Duration::from_millis(200));
    assert!(
        client.is_running(),
        "Client with a valid token should stay connected"
    );
}

#[test]
fn test_invalid_token_is_rejected() {
    // テスト項目: 不正なトークンでの接続が 401 で拒否され、クライアントが終了する
    // given (前提条件):
    let port = 18092;
    let server = TestServer::start(port);

    // when (操作):
    let mut client = TestClient::start_with_token(&server.url(), "definitely-not-a-jwt");

    // then (期待する結果):
    let exit_result = client.wait_for_exit(Duration::from_secs(5));
    assert!(
        exit_result.is_ok(),
        "Client with an invalid token should have exited within timeout"
    );
    let exit_status = exit_result.unwrap();
    assert!(
        !exit_status.success(),
        "Client with an invalid token should have exited with error code (got: {:?})",
        exit_status
    );
}

#[test]
fn test_multiple_clients_can_connect() {
    // テスト項目: 異なるユーザー ID の複数クライアントが接続できる
    // given (前提条件):
    let port = 18093;
    let server = TestServer::start(port);

    // when (操作):
    let mut client1 = TestClient::start(&server.url(), "alice");
    thread::sleep(Duration::from_millis(100));

    let mut client2 = TestClient::start(&server.url(), "bob");
    thread::sleep(Duration::from_millis(100));

    let mut client3 = TestClient::start(&server.url(), "charlie");

    // then (期待する結果):
    thread::sleep(Duration::from_millis(200));
    assert!(
        client1.is_running() && client2.is_running() && client3.is_running(),
        "All clients should remain connected"
    );
}

#[test]
fn test_matchmaking_pairs_two_clients() {
    // テスト項目: 2クライアントの init でマッチングが成立し、双方が安定している
    // given (前提条件):
    let port = 18094;
    let server = TestServer::start(port);

    let mut client_alice = TestClient::start(&server.url(), "alice");
    thread::sleep(Duration::from_millis(200));

    let mut client_bob = TestClient::start(&server.url(), "bob");
    thread::sleep(Duration::from_millis(200));

    // when (操作):
    client_alice
        .send_line("init")
        .expect("Failed to send init from alice");
    thread::sleep(Duration::from_millis(300));
    client_bob
        .send_line("init")
        .expect("Failed to send init from bob");

    // Give time for the pairing broadcast
    thread::sleep(Duration::from_millis(500));

    // then (期待する結果):
    assert!(
        client_alice.is_running(),
        "Alice's client should still be running after pairing"
    );
    assert!(
        client_bob.is_running(),
        "Bob's client should still be running after pairing"
    );

    // Note: Actual message content verification is done in unit tests;
    // this exercises the real transport end to end
}

#[test]
fn test_moves_are_exchanged() {
    // テスト項目: 対局開始後の着手交換でクライアントがクラッシュしない
    // given (前提条件):
    let port = 18095;
    let server = TestServer::start(port);

    let mut client_alice = TestClient::start(&server.url(), "alice");
    thread::sleep(Duration::from_millis(200));
    let mut client_bob = TestClient::start(&server.url(), "bob");
    thread::sleep(Duration::from_millis(200));

    client_alice.send_line("init").expect("alice init");
    thread::sleep(Duration::from_millis(300));
    client_bob.send_line("init").expect("bob init");
    thread::sleep(Duration::from_millis(500));

    // when (操作): alice (white) opens, bob (black) answers
    client_alice.send_line("e2e4").expect("alice move");
    thread::sleep(Duration::from_millis(300));
    client_bob.send_line("e7e5").expect("bob move");
    thread::sleep(Duration::from_millis(300));

    // then (期待する結果):
    assert!(
        client_alice.is_running() && client_bob.is_running(),
        "Both clients should remain stable during move exchange"
    );
}

#[test]
fn test_integration_test_infrastructure() {
    // テスト項目: 統合テストのインフラストラクチャが正しく機能する
    // given (前提条件):
    let has_cargo = Command::new("cargo").arg("--version").output().is_ok();

    // when (操作):

    // then (期待する結果):
    assert!(has_cargo, "Cargo must be available for integration tests");
}
