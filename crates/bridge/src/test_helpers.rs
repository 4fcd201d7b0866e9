//! # テスト用共通ヘルパー
//!
//! client, router, resolverテストで共有するモック台帳サーバー。
//! 署名を `economy_bridge_crypto::verify` で検証し、不一致なら403を返す。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};

/// モックが返す応答。
#[derive(Clone, Debug)]
pub struct MockReply {
    pub status: u16,
    pub body: String,
}

impl MockReply {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// モックが受信したリクエスト。
#[derive(Clone, Debug)]
pub struct SeenRequest {
    pub path: String,
    /// デコード済みのパスパラメータ（残高照会のみ）
    pub player_id: Option<String>,
    pub signature: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// モック台帳サービスの状態。クローンは同じ受信履歴を共有する。
#[derive(Clone)]
pub struct MockLedger {
    key: Vec<u8>,
    balance: MockReply,
    transfer: MockReply,
    delay: Option<Duration>,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl MockLedger {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.as_bytes().to_vec(),
            balance: MockReply::ok("0"),
            transfer: MockReply::ok("Success"),
            delay: None,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_balance(mut self, reply: MockReply) -> Self {
        self.balance = reply;
        self
    }

    pub fn with_transfer(mut self, reply: MockReply) -> Self {
        self.transfer = reply;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// これまでに受信したリクエスト
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    async fn respond(
        &self,
        path: String,
        player_id: Option<String>,
        payload: &[u8],
        headers: &HeaderMap,
        body: Vec<u8>,
        reply: &MockReply,
    ) -> (StatusCode, String) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let signature = header("x-signature");
        self.seen.lock().unwrap().push(SeenRequest {
            path,
            player_id,
            signature: signature.clone(),
            content_type: header("content-type"),
            body,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let valid = signature
            .map(|s| economy_bridge_crypto::verify(payload, &self.key, &s).is_ok())
            .unwrap_or(false);
        if !valid {
            return (StatusCode::FORBIDDEN, "Invalid signature".to_string());
        }
        (
            StatusCode::from_u16(reply.status).unwrap(),
            reply.body.clone(),
        )
    }
}

async fn handle_balance(
    State(ledger): State<MockLedger>,
    Path(player_id): Path<String>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let reply = ledger.balance.clone();
    ledger
        .respond(
            format!("/balance/{player_id}"),
            Some(player_id.clone()),
            player_id.as_bytes(),
            &headers,
            Vec::new(),
            &reply,
        )
        .await
}

async fn handle_transfer(
    State(ledger): State<MockLedger>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let reply = ledger.transfer.clone();
    ledger
        .respond("/transfer".to_string(), None, &body, &headers, body.to_vec(), &reply)
        .await
}

/// モック台帳サーバーを起動し、ベースURLを返す。
pub async fn start_mock_ledger(ledger: MockLedger) -> String {
    use axum::routing::{get, post};

    let app = axum::Router::new()
        .route("/balance/{player_id}", get(handle_balance))
        .route("/transfer", post(handle_transfer))
        .with_state(ledger);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}
