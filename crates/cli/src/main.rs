//! # Economy Bridge CLI
//!
//! 設定ファイルと環境変数 `API_KEY` からブリッジを有効化し、ホストと同じ経路で
//! コマンドを1つ実行する運用者向けツール。
//!
//! ## コマンド
//! - `balance` — `/balance` を実行
//! - `pay <TARGET> <AMOUNT>` — `/pay` を実行（送金先は `--online` で与えたセッションから解決）
//! - `placeholder` — 残高プレースホルダーを解決
//! - `ping` — 署名付きで台帳サービスの疎通を確認

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use economy_bridge::{
    BalanceSource, BridgeConfig, ChatCommandHandler, CommandOutcome, CommandSender,
    DiscoveredAdapters, EconomyBridge, IdentityAdapter, PlayerRef, StaticDirectory,
};

#[derive(Parser)]
#[command(name = "economy-bridge-cli", about = "Economy Bridge CLI")]
struct Cli {
    /// 設定ファイル（TOML）
    #[arg(long, env = "ECONOMY_BRIDGE_CONFIG", default_value = "economy-bridge.toml")]
    config: PathBuf,

    /// クロスプラットフォーム（Bedrock）アカウントとして扱うプレイヤーID
    #[arg(long = "bedrock-id", global = true)]
    bedrock_ids: Vec<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Actor {
    /// 実行者のプレイヤーID
    #[arg(long)]
    player_id: String,
    /// 実行者の表示名
    #[arg(long, default_value = "player")]
    name: String,
}

impl Actor {
    fn sender(&self) -> CommandSender {
        CommandSender::Player(PlayerRef::new(&self.player_id, &self.name))
    }
}

#[derive(Subcommand)]
enum Command {
    /// 残高を表示する
    Balance {
        #[command(flatten)]
        actor: Actor,
    },
    /// 送金する
    Pay {
        #[command(flatten)]
        actor: Actor,
        /// オンラインのプレイヤー（NAME=ID、複数指定可）
        #[arg(long = "online", value_parser = parse_online)]
        online: Vec<PlayerRef>,
        /// 送金先の名前
        target: String,
        /// 金額
        amount: String,
    },
    /// プレースホルダーを解決する
    Placeholder {
        /// 対象のプレイヤーID
        #[arg(long)]
        player_id: String,
        /// プレースホルダー識別子
        #[arg(long, default_value = "balance")]
        identifier: String,
    },
    /// 台帳サービスへの疎通を確認する
    Ping,
}

fn parse_online(value: &str) -> Result<PlayerRef, String> {
    match value.split_once('=') {
        Some((name, id)) if !name.is_empty() && !id.is_empty() => Ok(PlayerRef::new(id, name)),
        _ => Err(format!("NAME=ID の形式で指定してください: {value}")),
    }
}

/// 指定されたIDをクロスプラットフォームアカウントとみなすID連携。
struct StaticIdentity {
    ids: HashSet<String>,
}

impl IdentityAdapter for StaticIdentity {
    fn is_cross_platform(&self, player_id: &str) -> bool {
        self.ids.contains(player_id)
    }
}

fn print_outcome(outcome: &CommandOutcome) -> ExitCode {
    match outcome {
        CommandOutcome::Succeeded { reply, notice } => {
            println!("{reply}");
            if let Some(notice) = notice {
                println!("[{} へ] {}", notice.recipient.name, notice.text);
            }
            ExitCode::SUCCESS
        }
        CommandOutcome::Failed { reply, .. } => {
            println!("{reply}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = BridgeConfig::load(&cli.config)?;

    let identity: Option<Arc<dyn IdentityAdapter>> = if cli.bedrock_ids.is_empty() {
        None
    } else {
        Some(Arc::new(StaticIdentity {
            ids: cli.bedrock_ids.iter().cloned().collect(),
        }))
    };
    let online = match &cli.command {
        Command::Pay { online, .. } => online.clone(),
        _ => Vec::new(),
    };

    let bridge = Arc::new(EconomyBridge::activate_from_env(
        config,
        DiscoveredAdapters {
            identity,
            ..Default::default()
        },
        Arc::new(StaticDirectory::new(online)),
    )?);

    // ホストのメインループを止めないよう、台帳呼び出しはワーカータスクで実行する
    let code = match cli.command {
        Command::Balance { actor } => {
            let worker = bridge.clone();
            let outcome = tokio::spawn(async move {
                worker.router().handle(&actor.sender(), "balance", &[]).await
            })
            .await?;
            print_outcome(&outcome)
        }
        Command::Pay {
            actor,
            target,
            amount,
            ..
        } => {
            let worker = bridge.clone();
            let outcome = tokio::spawn(async move {
                worker
                    .router()
                    .handle(&actor.sender(), "pay", &[target, amount])
                    .await
            })
            .await?;
            print_outcome(&outcome)
        }
        Command::Placeholder {
            player_id,
            identifier,
        } => match bridge
            .resolver()
            .resolve_placeholder(&player_id, &identifier)
            .await
        {
            Some(value) => {
                println!("{value}");
                ExitCode::SUCCESS
            }
            None => {
                eprintln!("未対応のプレースホルダーです: {identifier}");
                ExitCode::FAILURE
            }
        },
        Command::Ping => match bridge.client().ping().await {
            Ok(()) => {
                println!("台帳サービスに接続できました: {}", bridge.client().base_url());
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "疎通確認に失敗");
                println!("{e}");
                ExitCode::FAILURE
            }
        },
    };

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_online() {
        assert_eq!(
            parse_online("Bob=uuid-bob").unwrap(),
            PlayerRef::new("uuid-bob", "Bob")
        );
        assert!(parse_online("Bob").is_err());
        assert!(parse_online("=uuid").is_err());
    }

    #[test]
    fn test_cli_parses_pay() {
        let cli = Cli::try_parse_from([
            "economy-bridge-cli",
            "pay",
            "--player-id",
            "uuid-alice",
            "--online",
            "Bob=uuid-bob",
            "Bob",
            "50",
        ])
        .unwrap();
        match cli.command {
            Command::Pay {
                actor,
                online,
                target,
                amount,
            } => {
                assert_eq!(actor.player_id, "uuid-alice");
                assert_eq!(online, vec![PlayerRef::new("uuid-bob", "Bob")]);
                assert_eq!(target, "Bob");
                assert_eq!(amount, "50");
            }
            _ => panic!("expected pay"),
        }
    }
}
