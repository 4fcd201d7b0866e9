//! # 残高プレースホルダー
//!
//! 表示テンプレートに埋め込む残高文字列を返す読み取り専用の経路。
//! コマンド経路と異なり決してエラーを返さない。
//! - ゲーティングで拒否: `"N/A"`（ネットワーク接続なし）
//! - 台帳呼び出しの失敗: `"0"`（ログに記録）

use std::sync::Arc;

use crate::capabilities::LedgerAction;
use crate::client::LedgerClient;
use crate::gating::Gate;

/// プレースホルダーの名前空間（`%economy_balance%`）
pub const PLACEHOLDER_NAMESPACE: &str = "economy";
/// 残高を表す識別子
pub const BALANCE_IDENTIFIER: &str = "balance";
/// ゲーティングで拒否された場合の表示
pub const NOT_AVAILABLE: &str = "N/A";
/// 台帳呼び出しに失敗した場合の表示
pub const FALLBACK_BALANCE: &str = "0";

/// 表示用の残高供給元。
#[async_trait::async_trait]
pub trait BalanceSource: Send + Sync {
    /// プレイヤーの残高を表示用文字列で返す。
    async fn resolve(&self, player_id: &str) -> String;

    /// プレースホルダー識別子を解決する。未対応の識別子には `None` を返す。
    async fn resolve_placeholder(&self, player_id: &str, identifier: &str) -> Option<String> {
        if identifier == BALANCE_IDENTIFIER {
            Some(self.resolve(player_id).await)
        } else {
            None
        }
    }
}

/// 台帳クライアントによる残高供給元。
pub struct BalanceResolver {
    client: Arc<LedgerClient>,
    gate: Gate,
}

impl BalanceResolver {
    pub fn new(client: Arc<LedgerClient>, gate: Gate) -> Self {
        Self { client, gate }
    }
}

#[async_trait::async_trait]
impl BalanceSource for BalanceResolver {
    async fn resolve(&self, player_id: &str) -> String {
        if let Err(denial) = self.gate.check(player_id, LedgerAction::Balance) {
            tracing::debug!(player_id = %player_id, denial = denial.as_str(), "プレースホルダーをN/Aで解決");
            return NOT_AVAILABLE.to_string();
        }

        match self.client.get_balance(player_id).await {
            Ok(balance) => balance.to_string(),
            Err(e) => {
                tracing::warn!(
                    player_id = %player_id,
                    kind = e.kind(),
                    detail = %e,
                    "残高の取得に失敗したため0を表示します"
                );
                FALLBACK_BALANCE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::capabilities::{Capabilities, IdentityAdapter, RegionPolicy};
    use crate::config::Credentials;
    use crate::test_helpers::{start_mock_ledger, MockLedger, MockReply};

    struct AllBedrock;
    impl IdentityAdapter for AllBedrock {
        fn is_cross_platform(&self, _player_id: &str) -> bool {
            true
        }
    }

    struct NoEconomyZone;
    impl RegionPolicy for NoEconomyZone {
        fn permits(&self, _player_id: &str, _action: LedgerAction) -> bool {
            false
        }
    }

    fn resolver(base_url: &str, cross_platform_enabled: bool) -> BalanceResolver {
        let credentials = Credentials::new(base_url, Some(b"k".to_vec())).unwrap();
        let client = Arc::new(LedgerClient::new(credentials, Duration::from_secs(5)).unwrap());
        let caps = Capabilities {
            identity: Arc::new(AllBedrock),
            ..Capabilities::default()
        };
        BalanceResolver::new(client, Gate::new(cross_platform_enabled, caps))
    }

    #[tokio::test]
    async fn test_resolve_balance() {
        let ledger = MockLedger::new("k").with_balance(MockReply::ok(r#"{"balance": 250}"#));
        let base = start_mock_ledger(ledger).await;

        assert_eq!(resolver(&base, true).resolve("u1").await, "250");
    }

    /// ゲーティングで拒否された場合はN/Aを返し、ネットワークに接続しないことを確認
    #[tokio::test]
    async fn test_gating_denied_is_not_available() {
        let ledger = MockLedger::new("k").with_balance(MockReply::ok("250"));
        let base = start_mock_ledger(ledger.clone()).await;

        assert_eq!(resolver(&base, false).resolve("u1").await, NOT_AVAILABLE);
        assert!(ledger.requests().is_empty());
    }

    /// 地域ポリシーで拒否された場合もN/Aを返し、ネットワークに接続しないことを確認
    #[tokio::test]
    async fn test_region_denied_is_not_available() {
        let ledger = MockLedger::new("k").with_balance(MockReply::ok("250"));
        let base = start_mock_ledger(ledger.clone()).await;

        let credentials = Credentials::new(&base, Some(b"k".to_vec())).unwrap();
        let client = Arc::new(LedgerClient::new(credentials, Duration::from_secs(5)).unwrap());
        let caps = Capabilities {
            region: Arc::new(NoEconomyZone),
            ..Capabilities::default()
        };
        let resolver = BalanceResolver::new(client, Gate::new(true, caps));

        assert_eq!(resolver.resolve("u1").await, NOT_AVAILABLE);
        assert_eq!(
            resolver.resolve_placeholder("u1", BALANCE_IDENTIFIER).await,
            Some(NOT_AVAILABLE.to_string())
        );
        assert!(ledger.requests().is_empty());
    }

    /// 台帳のエラーは0として表示されることを確認
    #[tokio::test]
    async fn test_ledger_failure_falls_back_to_zero() {
        let ledger = MockLedger::new("k").with_balance(MockReply::status(503, "maintenance"));
        let base = start_mock_ledger(ledger).await;
        assert_eq!(resolver(&base, true).resolve("u1").await, FALLBACK_BALANCE);

        let ledger = MockLedger::new("k").with_balance(MockReply::ok("garbage"));
        let base = start_mock_ledger(ledger).await;
        assert_eq!(resolver(&base, true).resolve("u1").await, FALLBACK_BALANCE);
    }

    #[tokio::test]
    async fn test_resolve_placeholder_identifiers() {
        let ledger = MockLedger::new("k").with_balance(MockReply::ok("7"));
        let base = start_mock_ledger(ledger).await;
        let resolver = resolver(&base, true);

        assert_eq!(
            resolver.resolve_placeholder("u1", BALANCE_IDENTIFIER).await,
            Some("7".to_string())
        );
        assert_eq!(resolver.resolve_placeholder("u1", "rank").await, None);
    }
}
