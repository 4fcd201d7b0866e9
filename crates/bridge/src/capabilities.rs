//! # オプション連携アダプター
//!
//! ホストに存在するかどうかが実行時に決まる外部サービスとの連携を抽象化する。
//! 見つからなかった連携はno-op実装で置き換え、呼び出し側でのnullチェックを不要にする。
//!
//! | アダプター | no-op時の挙動 |
//! |------------|---------------|
//! | `IdentityAdapter` | 全員をネイティブアカウントとみなす |
//! | `RegionPolicy` | 常に許可 |
//! | `PermissionAdapter` | 常に許可 |
//! | `ModerationLog` | 何も記録しない |

use std::sync::Arc;

/// 台帳に対する操作の種類。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerAction {
    /// 残高照会
    Balance,
    /// 送金
    Pay,
}

impl LedgerAction {
    /// 権限ノード名
    pub fn permission_node(&self) -> &'static str {
        match self {
            LedgerAction::Balance => "economy.balance",
            LedgerAction::Pay => "economy.pay",
        }
    }
}

/// クロスプラットフォームID連携。
pub trait IdentityAdapter: Send + Sync {
    /// プレイヤーが別プロトコル経由（Bedrock等）のアカウントか。
    fn is_cross_platform(&self, player_id: &str) -> bool;
}

/// 地域ポリシー連携。
pub trait RegionPolicy: Send + Sync {
    /// プレイヤーの現在地で操作が許可されているか。
    fn permits(&self, player_id: &str, action: LedgerAction) -> bool;
}

/// 権限連携。
pub trait PermissionAdapter: Send + Sync {
    /// プレイヤーが権限ノードを持つか。
    fn has_permission(&self, player_id: &str, node: &str) -> bool;
}

/// モデレーションログに記録する操作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationEntry {
    /// 操作の種類
    pub action: LedgerAction,
    /// 実行者のプレイヤーID
    pub actor_id: String,
    /// 対象（送金先）のプレイヤーID
    pub target_id: String,
    /// 金額
    pub amount: i64,
}

/// モデレーションログ連携。
pub trait ModerationLog: Send + Sync {
    /// 副作用のある操作を記録する。
    fn record(&self, entry: &ModerationEntry);
}

/// 全連携のno-op実装。
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAdapter;

impl IdentityAdapter for NoopAdapter {
    fn is_cross_platform(&self, _player_id: &str) -> bool {
        false
    }
}

impl RegionPolicy for NoopAdapter {
    fn permits(&self, _player_id: &str, _action: LedgerAction) -> bool {
        true
    }
}

impl PermissionAdapter for NoopAdapter {
    fn has_permission(&self, _player_id: &str, _node: &str) -> bool {
        true
    }
}

impl ModerationLog for NoopAdapter {
    fn record(&self, _entry: &ModerationEntry) {}
}

/// 起動時に選択された連携一式。
#[derive(Clone)]
pub struct Capabilities {
    /// クロスプラットフォームID連携
    pub identity: Arc<dyn IdentityAdapter>,
    /// 地域ポリシー
    pub region: Arc<dyn RegionPolicy>,
    /// 権限連携
    pub permissions: Arc<dyn PermissionAdapter>,
    /// モデレーションログ
    pub moderation: Arc<dyn ModerationLog>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            identity: Arc::new(NoopAdapter),
            region: Arc::new(NoopAdapter),
            permissions: Arc::new(NoopAdapter),
            moderation: Arc::new(NoopAdapter),
        }
    }
}

/// ホストで見つかった連携。`None` はホストに存在しなかったことを表す。
#[derive(Default)]
pub struct DiscoveredAdapters {
    /// 検出されたID連携
    pub identity: Option<Arc<dyn IdentityAdapter>>,
    /// 検出された地域ポリシー
    pub region: Option<Arc<dyn RegionPolicy>>,
    /// 検出された権限連携
    pub permissions: Option<Arc<dyn PermissionAdapter>>,
    /// 検出されたモデレーションログ
    pub moderation: Option<Arc<dyn ModerationLog>>,
}

impl Capabilities {
    /// 見つかった連携を採用し、見つからなかったものはno-opで置き換える。
    pub fn discover(found: DiscoveredAdapters) -> Self {
        let mut caps = Self::default();

        match found.identity {
            Some(identity) => {
                tracing::info!("クロスプラットフォームID連携を初期化しました");
                caps.identity = identity;
            }
            None => tracing::warn!(
                "クロスプラットフォームID連携が見つかりません。Bedrockプレイヤーの判定は行いません"
            ),
        }
        match found.region {
            Some(region) => {
                tracing::info!("地域ポリシー連携を初期化しました");
                caps.region = region;
            }
            None => tracing::info!("地域ポリシー連携なし。全地域で許可します"),
        }
        match found.permissions {
            Some(permissions) => {
                tracing::info!("権限連携を初期化しました");
                caps.permissions = permissions;
            }
            None => tracing::info!("権限連携なし。全プレイヤーに許可します"),
        }
        match found.moderation {
            Some(moderation) => {
                tracing::info!("モデレーションログ連携を初期化しました");
                caps.moderation = moderation;
            }
            None => tracing::info!("モデレーションログ連携なし"),
        }

        caps
    }
}
