use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{WalletError, WalletState};

pub const UNLOCK_METHOD: &str = "personal_unlockAccount";

/// JSON-RPC "server error" code nodes use for keystore failures.
const SERVER_ERROR_CODE: i64 = -32000;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Wallet backend that unlocks accounts held in the node's keystore.
pub struct RpcWallet {
    http: reqwest::Client,
    rpc_url: String,
    unlock_duration_secs: u64,
    next_id: AtomicU64,
}

impl RpcWallet {
    pub fn new(rpc_url: &str, unlock_duration_secs: u64, timeout: Duration) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            rpc_url: rpc_url.to_string(),
            unlock_duration_secs,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    fn unlock_request(&self, address: &str, password: &str) -> Value {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": UNLOCK_METHOD,
            "params": [address, password, self.unlock_duration_secs],
        })
    }

    /// POST one request and decode the JSON-RPC reply.
    ///
    /// Some nodes and proxies send the error object with a non-2xx status;
    /// the body wins whenever it carries one. The HTTP status is only
    /// reported when the body is not a usable JSON-RPC reply.
    async fn call(&self, body: &Value) -> Result<RpcResponse, WalletError> {
        let response = self.http.post(&self.rpc_url).json(body).send().await?;
        let status_error = response.error_for_status_ref().err();
        let bytes = response.bytes().await?;

        match (serde_json::from_slice::<RpcResponse>(&bytes), status_error) {
            (Ok(decoded), None) => Ok(decoded),
            (Ok(decoded), Some(_)) if decoded.error.is_some() => Ok(decoded),
            (_, Some(status)) => Err(WalletError::Transport(status)),
            (Err(e), None) => Err(WalletError::InvalidResponse(e.to_string())),
        }
    }
}

/// Map a decoded response onto the unlock outcome.
///
/// A keystore decrypt failure comes back as an RPC error rather than a
/// `false` result, so it is folded into `Ok(false)` here.
fn interpret_unlock_response(response: RpcResponse) -> Result<bool, WalletError> {
    if let Some(err) = response.error {
        if is_wrong_password(&err) {
            return Ok(false);
        }
        return Err(WalletError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    match response.result {
        Some(Value::Bool(unlocked)) => Ok(unlocked),
        Some(other) => Err(WalletError::InvalidResponse(format!(
            "expected boolean result, got {}",
            other
        ))),
        None => Err(WalletError::InvalidResponse(
            "response has neither result nor error".to_string(),
        )),
    }
}

fn is_wrong_password(err: &RpcErrorObject) -> bool {
    err.code == SERVER_ERROR_CODE && err.message.contains("could not decrypt key")
}

#[async_trait]
impl WalletState for RpcWallet {
    async fn unlock_account(&self, address: &str, password: &str) -> Result<bool, WalletError> {
        info!(%address, url = %self.rpc_url, "requesting account unlock");

        let body = self.unlock_request(address, password);
        let outcome = self.call(&body).await.and_then(|decoded| {
            debug!(has_error = decoded.error.is_some(), "unlock response decoded");
            interpret_unlock_response(decoded)
        });
        match &outcome {
            Ok(unlocked) => info!(%address, unlocked, "unlock answered"),
            Err(e) => warn!(%address, error = %e, "unlock failed"),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const ADDR: &str = "Z20d20b8026b8f02540246f58120ddaaf35aecd9b";

    fn decode(raw: &str) -> RpcResponse {
        serde_json::from_str(raw).unwrap()
    }

    /// Serves one canned JSON body and hands back the request body it saw.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];

            let request = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(split) = text.find("\r\n\r\n") {
                    let content_length = text[..split]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= split + 4 + content_length {
                        break text[split + 4..].to_string();
                    }
                }
                if n == 0 {
                    break String::new();
                }
            };

            let reply = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request
        });

        (url, handle)
    }

    #[test]
    fn request_envelope_carries_address_password_and_duration() {
        let wallet = RpcWallet::new("http://localhost:1", 120, Duration::from_secs(1)).unwrap();

        let first = wallet.unlock_request(ADDR, "hunter2");
        let second = wallet.unlock_request(ADDR, "hunter2");

        assert_eq!(first["jsonrpc"], "2.0");
        assert_eq!(first["method"], UNLOCK_METHOD);
        assert_eq!(first["params"], json!([ADDR, "hunter2", 120]));
        assert_ne!(first["id"], second["id"]);
    }

    #[test]
    fn boolean_results_pass_through() {
        let yes = decode(r#"{"jsonrpc":"2.0","id":1,"result":true}"#);
        let no = decode(r#"{"jsonrpc":"2.0","id":1,"result":false}"#);

        assert!(interpret_unlock_response(yes).unwrap());
        assert!(!interpret_unlock_response(no).unwrap());
    }

    #[test]
    fn decrypt_failure_means_wrong_password() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"could not decrypt key with given password"}}"#;
        assert!(!interpret_unlock_response(decode(raw)).unwrap());
    }

    #[test]
    fn other_rpc_errors_are_reported() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"the method personal_unlockAccount does not exist"}}"#;
        match interpret_unlock_response(decode(raw)) {
            Err(WalletError::Rpc { code, message }) => {
                assert_eq!(code, -32601);
                assert!(message.contains("does not exist"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn non_boolean_result_is_invalid() {
        let raw = r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#;
        assert!(matches!(
            interpret_unlock_response(decode(raw)),
            Err(WalletError::InvalidResponse(_))
        ));
        assert!(matches!(
            interpret_unlock_response(decode(r#"{"jsonrpc":"2.0","id":1}"#)),
            Err(WalletError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn unlock_round_trip_against_node() {
        let (url, server) = serve_once("200 OK", r#"{"jsonrpc":"2.0","id":1,"result":true}"#).await;
        let wallet = RpcWallet::new(&url, 60, Duration::from_secs(5)).unwrap();

        let unlocked = wallet.unlock_account(ADDR, "correct horse").await.unwrap();
        assert!(unlocked);

        let seen: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(seen["method"], UNLOCK_METHOD);
        assert_eq!(seen["params"], json!([ADDR, "correct horse", 60]));
    }

    #[tokio::test]
    async fn error_object_on_server_error_status_is_still_read() {
        let (url, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"could not decrypt key with given password"}}"#,
        )
        .await;
        let wallet = RpcWallet::new(&url, 60, Duration::from_secs(5)).unwrap();

        assert!(!wallet.unlock_account(ADDR, "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn rpc_error_on_bad_gateway_maps_to_rpc() {
        let (url, _server) = serve_once(
            "502 Bad Gateway",
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .await;
        let wallet = RpcWallet::new(&url, 60, Duration::from_secs(5)).unwrap();

        let err = wallet.unlock_account(ADDR, "pw").await.unwrap_err();
        assert!(matches!(err, WalletError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn non_rpc_body_keeps_the_http_status() {
        let (url, _server) = serve_once("503 Service Unavailable", "upstream down").await;
        let wallet = RpcWallet::new(&url, 60, Duration::from_secs(5)).unwrap();

        match wallet.unlock_account(ADDR, "pw").await.unwrap_err() {
            WalletError::Transport(e) => {
                assert_eq!(e.status(), Some(reqwest::StatusCode::SERVICE_UNAVAILABLE));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unreachable_node_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let wallet = RpcWallet::new(&url, 60, Duration::from_secs(5)).unwrap();
        let err = wallet.unlock_account(ADDR, "pw").await.unwrap_err();
        assert!(matches!(err, WalletError::Transport(_)));
    }
}
