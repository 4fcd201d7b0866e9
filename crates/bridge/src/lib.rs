//! # Economy Bridge
//!
//! ゲーム内のプレイヤー操作を外部の台帳（経済）サービスにHTTPで中継する。
//! 全リクエストは共有秘密鍵によるHMAC-SHA256署名で認証される。
//!
//! ## 構成
//! - `client`: 署名付きの残高照会・送金・疎通確認
//! - `router`: `balance` / `pay` コマンドのゲーティングと結果メッセージへの変換
//! - `resolver`: 表示テンプレート用の残高プレースホルダー
//! - `capabilities`: オプション連携（クロスプラットフォームID、地域、権限、モデレーションログ）
//! - `bridge`: 設定と連携からの有効化
//!
//! データは一方向に流れる:
//! 呼び出し → `CommandRouter` → ゲーティング → `LedgerClient` → 署名 → ネットワーク → 結果

pub mod bridge;
pub mod capabilities;
pub mod client;
pub mod config;
pub mod error;
pub mod gating;
pub mod host;
pub mod resolver;
pub mod router;

#[cfg(test)]
mod test_helpers;

pub use bridge::EconomyBridge;
pub use capabilities::{
    Capabilities, DiscoveredAdapters, IdentityAdapter, LedgerAction, ModerationEntry,
    ModerationLog, NoopAdapter, PermissionAdapter, RegionPolicy,
};
pub use client::LedgerClient;
pub use config::{BridgeConfig, Credentials, Messages};
pub use error::LedgerError;
pub use gating::{Gate, GateDenial};
pub use host::{CommandSender, PlayerRef, SessionDirectory, StaticDirectory};
pub use resolver::{BalanceResolver, BalanceSource};
pub use router::{ChatCommandHandler, CommandOutcome, CommandRouter, FailureReason, Notice};
