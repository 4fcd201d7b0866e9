//! # ブリッジの有効化
//!
//! ## 起動シーケンス
//! 1. 設定と共有秘密鍵から `Credentials` を構築（欠落は致命的）
//! 2. 署名器と台帳クライアントを構築（HMAC-SHA256が使えなければ致命的）
//! 3. オプション連携を選択し、ルーターとプレースホルダーを組み立てる
//!
//! 致命的エラーが起きた場合は縮退運転せず、有効化そのものを中止する。

use std::sync::Arc;

use crate::capabilities::{Capabilities, DiscoveredAdapters};
use crate::client::LedgerClient;
use crate::config::{BridgeConfig, Credentials, API_KEY_ENV};
use crate::error::LedgerError;
use crate::gating::Gate;
use crate::host::SessionDirectory;
use crate::resolver::BalanceResolver;
use crate::router::CommandRouter;

/// 有効化済みのブリッジ。
pub struct EconomyBridge {
    config: Arc<BridgeConfig>,
    client: Arc<LedgerClient>,
    router: CommandRouter,
    resolver: BalanceResolver,
}

impl EconomyBridge {
    /// 設定・共有秘密鍵・連携からブリッジを組み立てる。
    pub fn activate(
        config: BridgeConfig,
        secret_key: Option<Vec<u8>>,
        adapters: DiscoveredAdapters,
        directory: Arc<dyn SessionDirectory>,
    ) -> Result<Self, LedgerError> {
        let result = Self::build(config, secret_key, adapters, directory);
        match &result {
            Ok(bridge) => tracing::info!(
                api_url = %bridge.client.base_url(),
                cross_platform_enabled = bridge.config.bedrock.enabled,
                "EconomyBridgeを有効化しました"
            ),
            Err(e) => tracing::error!(kind = e.kind(), error = %e, "EconomyBridgeの有効化を中止します"),
        }
        result
    }

    /// 共有秘密鍵を環境変数 `API_KEY` から読み込んで有効化する。
    pub fn activate_from_env(
        config: BridgeConfig,
        adapters: DiscoveredAdapters,
        directory: Arc<dyn SessionDirectory>,
    ) -> Result<Self, LedgerError> {
        let secret = std::env::var(API_KEY_ENV).ok().map(String::into_bytes);
        Self::activate(config, secret, adapters, directory)
    }

    fn build(
        config: BridgeConfig,
        secret_key: Option<Vec<u8>>,
        adapters: DiscoveredAdapters,
        directory: Arc<dyn SessionDirectory>,
    ) -> Result<Self, LedgerError> {
        let credentials = Credentials::new(&config.api.url, secret_key)?;
        let client = Arc::new(LedgerClient::new(credentials, config.timeout())?);
        let config = Arc::new(config);

        let gate = Gate::new(config.bedrock.enabled, Capabilities::discover(adapters));
        let router = CommandRouter::new(client.clone(), gate.clone(), config.clone(), directory);
        let resolver = BalanceResolver::new(client.clone(), gate);

        Ok(Self {
            config,
            client,
            router,
            resolver,
        })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn client(&self) -> &LedgerClient {
        &self.client
    }

    /// チャットコマンドの受け口
    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// プレースホルダーの供給元
    pub fn resolver(&self) -> &BalanceResolver {
        &self.resolver
    }
}
