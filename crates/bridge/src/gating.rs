//! # ゲーティング
//!
//! 台帳呼び出しの前に満たすべき前提条件。以下の順に評価し、最初の失敗で打ち切る。
//! 1. クロスプラットフォームアカウントであり、かつ設定で許可されていない
//! 2. 地域ポリシーが操作を許可しない
//! 3. 権限ノードを持たない
//!
//! いずれかで拒否された場合、ネットワークには接続しない。

use crate::capabilities::{Capabilities, LedgerAction};
use crate::config::Messages;

/// ゲーティングによる拒否理由。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDenial {
    /// クロスプラットフォームアカウントは設定で無効
    CrossPlatformDisabled,
    /// 地域ポリシーで拒否
    RegionRestricted,
    /// 権限なし
    PermissionDenied,
}

impl GateDenial {
    /// 利用者向けメッセージ
    pub fn message<'a>(&self, messages: &'a Messages) -> &'a str {
        match self {
            GateDenial::CrossPlatformDisabled => &messages.bedrock_disabled,
            GateDenial::RegionRestricted => &messages.region_denied,
            GateDenial::PermissionDenied => &messages.permission_denied,
        }
    }

    /// ログ用の名前
    pub fn as_str(&self) -> &'static str {
        match self {
            GateDenial::CrossPlatformDisabled => "cross_platform_disabled",
            GateDenial::RegionRestricted => "region_restricted",
            GateDenial::PermissionDenied => "permission_denied",
        }
    }
}

/// ゲーティング判定器。コマンドとプレースホルダーで共有する。
#[derive(Clone)]
pub struct Gate {
    cross_platform_enabled: bool,
    capabilities: Capabilities,
}

impl Gate {
    pub fn new(cross_platform_enabled: bool, capabilities: Capabilities) -> Self {
        Self {
            cross_platform_enabled,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// 全ての前提条件を順に評価する。
    pub fn check(&self, player_id: &str, action: LedgerAction) -> Result<(), GateDenial> {
        if !self.cross_platform_enabled && self.capabilities.identity.is_cross_platform(player_id)
        {
            return Err(GateDenial::CrossPlatformDisabled);
        }
        if !self.capabilities.region.permits(player_id, action) {
            return Err(GateDenial::RegionRestricted);
        }
        if !self
            .capabilities
            .permissions
            .has_permission(player_id, action.permission_node())
        {
            return Err(GateDenial::PermissionDenied);
        }
        Ok(())
    }
}
