//! # 台帳クライアント
//!
//! 台帳サービスへの残高照会・送金リクエストを送信し、レスポンスを型付きの結果に変換する。
//!
//! ## 認証
//! 全リクエストに `X-Signature: hex(HMAC-SHA256(key, payload))` を付与する。
//! - 残高照会: payload = プレイヤーIDの生文字列
//! - 送金: payload = 送信するJSONボディのバイト列そのもの
//!
//! 1回の呼び出しにつき往復は1回のみ。リトライは呼び出し側の責務。
//!
//! プレイヤーIDは単一のパスセグメントとしてパーセントエンコードして送る。
//! 署名はエンコード前の生文字列に対して行う。

use std::time::Duration;

use economy_bridge_crypto::RequestSigner;
use economy_bridge_types::{parse_balance_body, BalanceQuery, TransferRequest};

use crate::config::Credentials;
use crate::error::LedgerError;

/// 署名ヘッダー名
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// 疎通確認エンドポイントで署名するペイロード
pub const PING_PAYLOAD: &str = "test";

/// 署名付きHTTPクライアント。
pub struct LedgerClient {
    credentials: Credentials,
    base: reqwest::Url,
    signer: RequestSigner,
    http: reqwest::Client,
}

impl LedgerClient {
    /// 新しいLedgerClientを作成する。
    ///
    /// # 引数
    /// - `credentials`: ベースURLと共有秘密鍵
    /// - `timeout`: 1リクエストあたりのタイムアウト
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, LedgerError> {
        let signer = RequestSigner::new(credentials.secret_key().to_vec())?;
        let base = reqwest::Url::parse(credentials.base_url())
            .map_err(|e| LedgerError::Config(format!("ベースURLを解釈できません: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(LedgerError::Config(format!(
                "ベースURLにパスを追加できません: {base}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Config(format!("HTTPクライアントの構築に失敗: {e}")))?;
        Ok(Self {
            credentials,
            base,
            signer,
            http,
        })
    }

    /// 接続先のベースURL
    pub fn base_url(&self) -> &str {
        self.credentials.base_url()
    }

    /// ベースURLのパスにセグメントを追加したURLを組み立てる。
    ///
    /// 各セグメントは `/`, `?`, `#`, `%` を含めてエンコードされる。
    fn endpoint(&self, segments: &[&str]) -> reqwest::Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// プレイヤーの残高を取得する。
    ///
    /// `{"balance": n}` と整数のみのテキストの両方を受け付ける。
    pub async fn get_balance(&self, player_id: &str) -> Result<i64, LedgerError> {
        // 空・ドットセグメントはURL正規化で別のパスに化けるため送らない
        if matches!(player_id, "" | "." | "..") {
            return Err(LedgerError::InvalidPlayerId(player_id.to_string()));
        }
        let query = BalanceQuery::new(player_id);
        let signature = self.signer.sign(query.sign_bytes())?;
        let url = self.endpoint(&["balance", query.player_id.as_str()]);

        let response = self
            .http
            .get(url)
            .header(SIGNATURE_HEADER, signature)
            .send()
            .await
            .map_err(network_error)?;
        let (status, body) = read_response(response).await?;

        if status != 200 {
            return Err(LedgerError::ServerError {
                status,
                detail: body,
            });
        }

        match parse_balance_body(&body) {
            Some((balance, shape)) => {
                tracing::debug!(
                    player_id = %query.player_id,
                    shape = shape.as_str(),
                    "残高レスポンスを解釈"
                );
                Ok(balance)
            }
            None => Err(LedgerError::Malformed {
                reason: "`{\"balance\": n}` でも整数でもありません".to_string(),
                body,
            }),
        }
    }

    /// プレイヤー間で送金する。
    ///
    /// `amount <= 0` の場合はネットワークに接続せず `InvalidAmount` を返す。
    pub async fn transfer(&self, from_id: &str, to_id: &str, amount: i64) -> Result<(), LedgerError> {
        let request = TransferRequest::new(from_id, to_id, amount)?;
        let body = request
            .to_body_bytes()
            .map_err(|e| LedgerError::Encoding(format!("送金ボディのシリアライズに失敗: {e}")))?;
        let signature = self.signer.sign(&body)?;
        let url = self.endpoint(&["transfer"]);

        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(body)
            .send()
            .await
            .map_err(network_error)?;
        let (status, detail) = read_response(response).await?;

        if status != 200 {
            return Err(LedgerError::ServerError { status, detail });
        }
        Ok(())
    }

    /// 署名付きで疎通確認エンドポイントを呼び出す。
    pub async fn ping(&self) -> Result<(), LedgerError> {
        let signature = self.signer.sign(PING_PAYLOAD.as_bytes())?;
        let url = self.endpoint(&["balance", PING_PAYLOAD]);

        let response = self
            .http
            .get(url)
            .header(SIGNATURE_HEADER, signature)
            .send()
            .await
            .map_err(network_error)?;
        let (status, detail) = read_response(response).await?;

        if status != 200 {
            return Err(LedgerError::ServerError { status, detail });
        }
        Ok(())
    }
}

async fn read_response(response: reqwest::Response) -> Result<(u16, String), LedgerError> {
    let status = response.status().as_u16();
    let body = response.text().await.map_err(network_error)?;
    Ok((status, body))
}

fn network_error(e: reqwest::Error) -> LedgerError {
    if e.is_timeout() {
        LedgerError::Network(format!("タイムアウト: {e}"))
    } else {
        LedgerError::Network(e.to_string())
    }
}
