//! # コマンドルーター
//!
//! チャットコマンド（`balance`, `pay`）を受け取り、ゲーティング判定ののち台帳クライアントを呼び出し、
//! 結果を利用者向けメッセージに変換する。
//!
//! ## 状態遷移（呼び出しごと、呼び出し間で状態は持たない）
//! ```text
//! Idle → GatingCheck → Dispatched → Succeeded
//!            │             └──────→ Failed
//!            └────────────────────→ Failed（ネットワーク接続なし）
//! ```
//!
//! 回復可能なエラーは全てここで利用者向けメッセージに変換され、これより外には伝播しない。

use std::sync::Arc;

use crate::capabilities::{LedgerAction, ModerationEntry};
use crate::client::LedgerClient;
use crate::config::{
    render, BridgeConfig, Messages, AMOUNT_TOKEN, BALANCE_TOKEN, ERROR_TOKEN, PLAYER_TOKEN,
};
use crate::error::LedgerError;
use crate::gating::{Gate, GateDenial};
use crate::host::{CommandSender, PlayerRef, SessionDirectory};


/// 残高表示コマンド名
pub const BALANCE_COMMAND: &str = "balance";
/// 送金コマンド名
pub const PAY_COMMAND: &str = "pay";

/// 1回の呼び出しの状態。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// 受信直後
    Idle,
    /// ゲーティング判定中
    GatingCheck,
    /// 台帳サービスへ送信済み
    Dispatched,
    /// 成功（終端）
    Succeeded,
    /// 失敗（終端）
    Failed,
}

/// 失敗理由。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// 未登録のコマンド
    UnknownCommand(String),
    /// プレイヤー以外からの実行
    PlayersOnly,
    /// 引数の数が不正
    Usage,
    /// 金額が整数でない
    MalformedAmount(String),
    /// 金額が0以下
    InvalidAmount(i64),
    /// 送金先がオンラインでない
    PlayerNotFound(String),
    /// 自分自身への送金
    SelfTransfer,
    /// ゲーティングで拒否
    Denied(GateDenial),
    /// 台帳呼び出しの失敗（エラー種別名）
    Ledger(&'static str),
}

/// 送信者以外のプレイヤーへの通知。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// 通知先のプレイヤー
    pub recipient: PlayerRef,
    /// 通知本文
    pub text: String,
}

/// コマンドの結果。ホストは `reply` を送信者に、`notice` を対象プレイヤーに届ける。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// 成功
    Succeeded {
        /// 送信者への返信
        reply: String,
        /// 他のプレイヤーへの通知（送金の受取人等）
        notice: Option<Notice>,
    },
    /// 失敗
    Failed {
        /// 失敗理由
        reason: FailureReason,
        /// 送信者への返信
        reply: String,
    },
}

impl CommandOutcome {
    /// 送信者への返信
    pub fn reply(&self) -> &str {
        match self {
            CommandOutcome::Succeeded { reply, .. } | CommandOutcome::Failed { reply, .. } => reply,
        }
    }

    /// 終端状態
    pub fn state(&self) -> InvocationState {
        match self {
            CommandOutcome::Succeeded { .. } => InvocationState::Succeeded,
            CommandOutcome::Failed { .. } => InvocationState::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CommandOutcome::Succeeded { .. })
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            CommandOutcome::Failed { reason, .. } => Some(reason),
            CommandOutcome::Succeeded { .. } => None,
        }
    }
}

/// チャットコマンドの受け口。
#[async_trait::async_trait]
pub trait ChatCommandHandler: Send + Sync {
    /// コマンドを実行する。エラーは返さず、常に結果メッセージに変換する。
    async fn handle(&self, sender: &CommandSender, command: &str, args: &[String])
        -> CommandOutcome;
}

/// 状態遷移をトレースする呼び出しコンテキスト。
struct Invocation<'a> {
    command: &'a str,
    state: InvocationState,
}

impl<'a> Invocation<'a> {
    fn start(command: &'a str) -> Self {
        Self {
            command,
            state: InvocationState::Idle,
        }
    }

    fn advance(&mut self, next: InvocationState) {
        tracing::trace!(command = self.command, from = ?self.state, to = ?next, "状態遷移");
        self.state = next;
    }

    fn succeed(mut self, reply: String, notice: Option<Notice>) -> CommandOutcome {
        self.advance(InvocationState::Succeeded);
        CommandOutcome::Succeeded { reply, notice }
    }

    fn fail(mut self, reason: FailureReason, reply: String) -> CommandOutcome {
        self.advance(InvocationState::Failed);
        CommandOutcome::Failed { reason, reply }
    }
}

/// コマンドルーター。
pub struct CommandRouter {
    client: Arc<LedgerClient>,
    gate: Gate,
    config: Arc<BridgeConfig>,
    directory: Arc<dyn SessionDirectory>,
}

impl CommandRouter {
    pub fn new(
        client: Arc<LedgerClient>,
        gate: Gate,
        config: Arc<BridgeConfig>,
        directory: Arc<dyn SessionDirectory>,
    ) -> Self {
        Self {
            client,
            gate,
            config,
            directory,
        }
    }

    fn messages(&self) -> &Messages {
        &self.config.messages
    }

    /// ゲーティング判定。拒否時はネットワークに接続せずFailedへ遷移する。
    fn check_gate<'a>(
        &self,
        mut inv: Invocation<'a>,
        player: &PlayerRef,
        action: LedgerAction,
    ) -> Result<Invocation<'a>, CommandOutcome> {
        inv.advance(InvocationState::GatingCheck);
        match self.gate.check(&player.id, action) {
            Ok(()) => Ok(inv),
            Err(denial) => {
                tracing::info!(
                    command = inv.command,
                    player_id = %player.id,
                    denial = denial.as_str(),
                    "ゲーティングにより拒否"
                );
                let reply = denial.message(self.messages()).to_string();
                Err(inv.fail(FailureReason::Denied(denial), reply))
            }
        }
    }

    /// `/balance`
    pub async fn balance(&self, sender: &CommandSender) -> CommandOutcome {
        let inv = Invocation::start(BALANCE_COMMAND);
        let CommandSender::Player(player) = sender else {
            return inv.fail(FailureReason::PlayersOnly, self.messages().players_only.clone());
        };

        let mut inv = match self.check_gate(inv, player, LedgerAction::Balance) {
            Ok(inv) => inv,
            Err(outcome) => return outcome,
        };

        inv.advance(InvocationState::Dispatched);
        match self.client.get_balance(&player.id).await {
            Ok(balance) => {
                let reply = render(
                    &self.messages().balance,
                    &[(BALANCE_TOKEN, balance.to_string().as_str())],
                );
                inv.succeed(reply, None)
            }
            Err(e) => {
                log_ledger_failure(BALANCE_COMMAND, &player.id, &e);
                let reply = render(
                    &self.messages().balance_error,
                    &[(ERROR_TOKEN, e.user_detail().as_str())],
                );
                inv.fail(FailureReason::Ledger(e.kind()), reply)
            }
        }
    }

    /// `/pay <プレイヤー> <金額>`
    pub async fn pay(&self, sender: &CommandSender, args: &[String]) -> CommandOutcome {
        let inv = Invocation::start(PAY_COMMAND);
        let messages = self.messages();
        let CommandSender::Player(from) = sender else {
            return inv.fail(FailureReason::PlayersOnly, messages.players_only.clone());
        };
        let [target_name, raw_amount] = args else {
            return inv.fail(FailureReason::Usage, messages.usage_pay.clone());
        };

        // 金額の形式はゲーティングより先に検証する
        let amount = match raw_amount.trim().parse::<i64>() {
            Ok(amount) => amount,
            Err(e) => {
                tracing::info!(player_id = %from.id, amount = %raw_amount, error = %e, "金額が整数ではありません");
                return inv.fail(
                    FailureReason::MalformedAmount(raw_amount.clone()),
                    messages.invalid_amount.clone(),
                );
            }
        };

        let mut inv = match self.check_gate(inv, from, LedgerAction::Pay) {
            Ok(inv) => inv,
            Err(outcome) => return outcome,
        };

        let Some(to) = self.directory.find_online(target_name) else {
            let e = LedgerError::PlayerNotFound(target_name.clone());
            tracing::info!(player_id = %from.id, kind = e.kind(), detail = %e, "送金先を解決できません");
            return inv.fail(
                FailureReason::PlayerNotFound(target_name.clone()),
                messages.player_not_found.clone(),
            );
        };
        if to.id == from.id {
            tracing::info!(player_id = %from.id, "自分自身への送金を拒否");
            return inv.fail(FailureReason::SelfTransfer, messages.self_transfer.clone());
        }

        inv.advance(InvocationState::Dispatched);
        match self.client.transfer(&from.id, &to.id, amount).await {
            Ok(()) => {
                tracing::info!(from_id = %from.id, to_id = %to.id, amount, "送金完了");
                self.gate.capabilities().moderation.record(&ModerationEntry {
                    action: LedgerAction::Pay,
                    actor_id: from.id.clone(),
                    target_id: to.id.clone(),
                    amount,
                });
                let amount_text = amount.to_string();
                let reply = render(
                    &messages.transfer_sent,
                    &[(AMOUNT_TOKEN, amount_text.as_str()), (PLAYER_TOKEN, to.name.as_str())],
                );
                let notice = Notice {
                    text: render(
                        &messages.transfer_received,
                        &[(AMOUNT_TOKEN, amount_text.as_str()), (PLAYER_TOKEN, from.name.as_str())],
                    ),
                    recipient: to,
                };
                inv.succeed(reply, Some(notice))
            }
            Err(LedgerError::InvalidAmount(amount)) => {
                tracing::info!(player_id = %from.id, amount, "送金額が0以下です");
                inv.fail(
                    FailureReason::InvalidAmount(amount),
                    messages.non_positive_amount.clone(),
                )
            }
            Err(e) => {
                log_ledger_failure(PAY_COMMAND, &from.id, &e);
                let reply = render(
                    &messages.transfer_error,
                    &[(ERROR_TOKEN, e.user_detail().as_str())],
                );
                inv.fail(FailureReason::Ledger(e.kind()), reply)
            }
        }
    }
}

#[async_trait::async_trait]
impl ChatCommandHandler for CommandRouter {
    async fn handle(
        &self,
        sender: &CommandSender,
        command: &str,
        args: &[String],
    ) -> CommandOutcome {
        match command {
            BALANCE_COMMAND => self.balance(sender).await,
            PAY_COMMAND => self.pay(sender, args).await,
            other => {
                tracing::debug!(command = other, "未登録のコマンド");
                Invocation::start(other).fail(
                    FailureReason::UnknownCommand(other.to_string()),
                    format!("不明なコマンドです: {other}"),
                )
            }
        }
    }
}

/// 台帳呼び出しの失敗を種別と詳細つきで記録する。
fn log_ledger_failure(command: &str, player_id: &str, e: &LedgerError) {
    match e {
        LedgerError::Malformed { body, reason } => tracing::warn!(
            command,
            player_id = %player_id,
            kind = e.kind(),
            reason = %reason,
            raw_body = %body,
            "台帳サービスのレスポンスを解釈できません"
        ),
        LedgerError::ServerError { status, detail } => tracing::warn!(
            command,
            player_id = %player_id,
            kind = e.kind(),
            status,
            detail = %detail,
            "台帳サービスがエラーを返しました"
        ),
        _ => tracing::warn!(
            command,
            player_id = %player_id,
            kind = e.kind(),
            detail = %e,
            "台帳呼び出しに失敗"
        ),
    }
}
