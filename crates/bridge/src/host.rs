//! # ホスト側の実体
//!
//! コマンド送信者とオンラインセッションの参照。ホストプロセスが実装を提供する。

/// オンラインのプレイヤー。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    /// 台帳上の識別子（UUID文字列等）
    pub id: String,
    /// 表示名
    pub name: String,
}

impl PlayerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// コマンドの送信者。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSender {
    /// ゲーム内のプレイヤー
    Player(PlayerRef),
    /// サーバーコンソール等、プレイヤー以外
    Console,
}

/// 名前からアクティブなセッションを引くディレクトリ。
///
/// 送金先の解決に使う。見つからない場合は送金をローカルで拒否する。
pub trait SessionDirectory: Send + Sync {
    /// 名前に一致するオンラインのプレイヤーを返す。
    fn find_online(&self, name: &str) -> Option<PlayerRef>;
}

/// 固定のプレイヤー一覧によるディレクトリ。CLIやテストで使う。
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    players: Vec<PlayerRef>,
}

impl StaticDirectory {
    pub fn new(players: Vec<PlayerRef>) -> Self {
        Self { players }
    }
}

impl SessionDirectory for StaticDirectory {
    fn find_online(&self, name: &str) -> Option<PlayerRef> {
        self.players
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
    }
}
