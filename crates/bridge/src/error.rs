//! # Economy Bridge エラー型
//!
//! ブリッジ全体で共通のエラー型。
//!
//! | 種別 | 扱い |
//! |------|------|
//! | `Config`, `CryptoUnavailable` | 致命的。ブリッジを起動しない |
//! | `Network`, `ServerError`, `Malformed`, `Encoding` | 回復可能。コマンド境界で利用者向けメッセージに変換 |
//! | `InvalidAmount`, `InvalidPlayerId`, `PlayerNotFound` | ローカル検証失敗。ネットワークには接続しない |

use economy_bridge_crypto::CryptoError;
use economy_bridge_types::TypesError;

/// 台帳ブリッジのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// 設定不備（秘密鍵・ベースURLの欠落等）
    #[error("設定エラー: {0}")]
    Config(String),
    /// HMAC-SHA256が利用できない
    #[error("署名プリミティブが利用できません: {0}")]
    CryptoUnavailable(String),
    /// 接続失敗・タイムアウト
    #[error("台帳サービスとの通信に失敗: {0}")]
    Network(String),
    /// 台帳サービスが200以外を返した
    #[error("台帳サービスがエラーを返しました: HTTP {status} - {detail}")]
    ServerError {
        /// HTTPステータスコード
        status: u16,
        /// レスポンスボディ
        detail: String,
    },
    /// 200レスポンスのボディを解釈できない
    #[error("台帳サービスのレスポンスを解釈できません: {reason}")]
    Malformed {
        /// 生のレスポンスボディ
        body: String,
        /// 解釈に失敗した理由
        reason: String,
    },
    /// リクエストボディを構築できない（呼び出し単位の失敗）
    #[error("リクエストの構築に失敗: {0}")]
    Encoding(String),
    /// 送金額が0以下
    #[error("送金額は正の整数である必要があります: {0}")]
    InvalidAmount(i64),
    /// URLのパスセグメントとして表現できないプレイヤーID（空文字列, `.`, `..`）
    #[error("プレイヤーIDが不正です: {0:?}")]
    InvalidPlayerId(String),
    /// 送金先をアクティブなセッションに解決できない
    #[error("プレイヤーが見つかりません: {0}")]
    PlayerNotFound(String),
}

impl LedgerError {
    /// 起動を中止すべき致命的エラーか。
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::Config(_) | LedgerError::CryptoUnavailable(_))
    }

    /// 署名が拒否された（401/403）か。
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, LedgerError::ServerError { status: 401 | 403, .. })
    }

    /// 口座が存在しない（404）か。
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::ServerError { status: 404, .. })
    }

    /// ログ用の種別名。
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::Config(_) => "config",
            LedgerError::CryptoUnavailable(_) => "crypto_unavailable",
            LedgerError::Network(_) => "network",
            LedgerError::ServerError { .. } => "server_error",
            LedgerError::Malformed { .. } => "malformed",
            LedgerError::Encoding(_) => "encoding",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::InvalidPlayerId(_) => "invalid_player_id",
            LedgerError::PlayerNotFound(_) => "player_not_found",
        }
    }

    /// 利用者に見せる詳細。
    ///
    /// `ServerError` はボディをそのまま返す。`Malformed` は生ボディを隠す。
    pub fn user_detail(&self) -> String {
        match self {
            LedgerError::ServerError { detail, .. } => detail.clone(),
            LedgerError::Network(_) => "台帳サービスに一時的に接続できません".to_string(),
            LedgerError::Malformed { .. } => "台帳サービスから不正な応答がありました".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<CryptoError> for LedgerError {
    fn from(e: CryptoError) -> Self {
        LedgerError::CryptoUnavailable(e.to_string())
    }
}

impl From<TypesError> for LedgerError {
    fn from(e: TypesError) -> Self {
        match e {
            TypesError::InvalidAmount(amount) => LedgerError::InvalidAmount(amount),
            TypesError::EmptyId(field) => LedgerError::PlayerNotFound(field.to_string()),
        }
    }
}
