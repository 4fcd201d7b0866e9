//! # ブリッジ設定
//!
//! 設定ファイル（TOML）と環境変数からの設定読み込み。
//! 起動時に一度だけ構築し、以後は不変の値として参照で渡す。
//!
//! ```toml
//! [api]
//! url = "http://localhost:5000"
//! timeout_secs = 5
//!
//! [bedrock]
//! enabled = true
//!
//! [messages]
//! balance = "残高: %balance% コイン"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::LedgerError;

/// 署名用秘密鍵を供給する環境変数
pub const API_KEY_ENV: &str = "API_KEY";

/// 残高テンプレートの置換トークン
pub const BALANCE_TOKEN: &str = "%balance%";
/// 金額の置換トークン
pub const AMOUNT_TOKEN: &str = "%amount%";
/// 相手プレイヤー名の置換トークン
pub const PLAYER_TOKEN: &str = "%player%";
/// エラー詳細の置換トークン
pub const ERROR_TOKEN: &str = "%error%";

/// ブリッジ設定全体。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// 台帳サービスの接続設定
    pub api: ApiConfig,
    /// クロスプラットフォーム（Bedrock）アカウントの扱い
    pub bedrock: BedrockConfig,
    /// 表示テンプレート
    pub messages: Messages,
}

/// `[api]` セクション。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// 台帳サービスのベースURL
    pub url: String,
    /// リクエストタイムアウト（秒）
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:5000".to_string(),
            timeout_secs: 5,
        }
    }
}

/// `[bedrock]` セクション。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BedrockConfig {
    /// クロスプラットフォームアカウントに経済機能を許可するか
    pub enabled: bool,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// `[messages]` セクション。値の置換以外の整形は行わない。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Messages {
    /// 残高表示（`%balance%`）
    pub balance: String,
    /// 送金完了の送信者向け通知（`%amount%`, `%player%` = 送金先）
    pub transfer_sent: String,
    /// 受取人向け通知（`%amount%`, `%player%` = 送金元）
    pub transfer_received: String,
    /// コンソール等プレイヤー以外からの実行
    pub players_only: String,
    /// `/pay` の引数の数が不正
    pub usage_pay: String,
    /// 金額が整数として解釈できない
    pub invalid_amount: String,
    /// 金額が0以下
    pub non_positive_amount: String,
    /// 送金先がオンラインでない
    pub player_not_found: String,
    /// 自分自身への送金
    pub self_transfer: String,
    /// クロスプラットフォームアカウントの利用が無効
    pub bedrock_disabled: String,
    /// 地域ポリシーによる拒否
    pub region_denied: String,
    /// 権限不足
    pub permission_denied: String,
    /// 残高取得の失敗（`%error%`）
    pub balance_error: String,
    /// 送金の失敗（`%error%`）
    pub transfer_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            balance: "残高: %balance% コイン".to_string(),
            transfer_sent: "%player% に %amount% コインを送金しました".to_string(),
            transfer_received: "%player% から %amount% コインを受け取りました".to_string(),
            players_only: "このコマンドはプレイヤーのみ実行できます".to_string(),
            usage_pay: "使い方: /pay <プレイヤー> <金額>".to_string(),
            invalid_amount: "金額が不正です".to_string(),
            non_positive_amount: "金額は正の数である必要があります".to_string(),
            player_not_found: "プレイヤーが見つかりません".to_string(),
            self_transfer: "自分自身には送金できません".to_string(),
            bedrock_disabled: "Bedrockプレイヤーは経済機能を利用できません".to_string(),
            region_denied: "この場所では経済機能を利用できません".to_string(),
            permission_denied: "このコマンドを実行する権限がありません".to_string(),
            balance_error: "残高の取得に失敗しました: %error%".to_string(),
            transfer_error: "送金に失敗しました: %error%".to_string(),
        }
    }
}

/// テンプレート中のトークンを値で置換する。
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |acc, (token, value)| {
            acc.replace(token, value)
        })
}

impl BridgeConfig {
    /// TOML文字列から設定を読み込む。
    pub fn from_toml_str(source: &str) -> Result<Self, LedgerError> {
        let config: BridgeConfig = toml::from_str(source)
            .map_err(|e| LedgerError::Config(format!("設定ファイルのパースに失敗: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定ファイルを読み込む。ファイルが存在しない場合はデフォルト値を使う。
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        match std::fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "設定ファイルがないためデフォルト設定を使用します");
                Ok(Self::default())
            }
            Err(e) => Err(LedgerError::Config(format!(
                "設定ファイルの読み込みに失敗 ({}): {e}",
                path.display()
            ))),
        }
    }

    fn validate(&self) -> Result<(), LedgerError> {
        if self.api.timeout_secs == 0 {
            return Err(LedgerError::Config(
                "api.timeout_secs は1以上である必要があります".to_string(),
            ));
        }
        Ok(())
    }

    /// リクエストタイムアウト。
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }
}

/// 台帳サービスの接続先と共有秘密鍵。
///
/// プロセス起動時に一度だけ構築され、以後変更されない。
#[derive(Clone)]
pub struct Credentials {
    base_url: String,
    secret_key: Vec<u8>,
}

impl Credentials {
    /// 接続情報を検証して作成する。
    ///
    /// 秘密鍵がない場合、ブリッジは認証なしで動作してはならないため `Config` エラーとなる。
    pub fn new(base_url: &str, secret_key: Option<Vec<u8>>) -> Result<Self, LedgerError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(LedgerError::Config("api.url が設定されていません".to_string()));
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(LedgerError::Config(format!(
                "api.url はhttp(s)のURLである必要があります: {base_url}"
            )));
        }
        let secret_key = match secret_key {
            Some(key) if !key.is_empty() => key,
            _ => {
                return Err(LedgerError::Config(format!(
                    "{API_KEY_ENV} が設定されていません"
                )))
            }
        };
        Ok(Self {
            base_url: base_url.to_string(),
            secret_key,
        })
    }

    /// 設定と環境変数 `API_KEY` から作成する。
    pub fn from_env(config: &BridgeConfig) -> Result<Self, LedgerError> {
        let secret = std::env::var(API_KEY_ENV).ok().map(String::into_bytes);
        Self::new(&config.api.url, secret)
    }

    /// 末尾スラッシュを除いたベースURL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 共有秘密鍵
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
