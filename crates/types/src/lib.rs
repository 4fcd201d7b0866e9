//! # Economy Bridge 共有型定義
//!
//! 台帳サービスとの間でやり取りするデータ構造をRust構造体として提供する。
//!
//! ## ワイヤ形式
//! - `GET /balance/{player_id}`: レスポンスは `{"balance": n}` または整数のみのテキスト
//! - `POST /transfer`: リクエストボディは `{"from_id", "to_id", "amount"}`

use serde::{Deserialize, Serialize};

/// 型レベルの検証エラー。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypesError {
    /// 送金額が0以下
    #[error("送金額は正の整数である必要があります: {0}")]
    InvalidAmount(i64),
    /// プレイヤーIDが空
    #[error("プレイヤーIDが空です: {0}")]
    EmptyId(&'static str),
}

// ---------------------------------------------------------------------------
// 残高照会
// ---------------------------------------------------------------------------

/// 残高照会。署名対象はプレイヤーIDの生文字列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceQuery {
    /// 不透明なプレイヤー識別子（UUID文字列等）
    pub player_id: String,
}

impl BalanceQuery {
    /// 新しい残高照会を作成する。
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
        }
    }

    /// 署名対象のバイト列。
    pub fn sign_bytes(&self) -> &[u8] {
        self.player_id.as_bytes()
    }
}

/// 構造化された残高レスポンス `{"balance": n}`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceBody {
    /// 口座残高
    pub balance: i64,
}

/// 観測された残高レスポンスの形式。
///
/// サービス側の契約にバージョン表記がないため、どちらも正とみなす。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceShape {
    /// `{"balance": n}`
    Structured,
    /// `n`
    Plain,
}

impl BalanceShape {
    /// ログ出力用の名前。
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceShape::Structured => "structured",
            BalanceShape::Plain => "plain",
        }
    }
}

/// 残高レスポンスのボディを解釈する。
///
/// 構造化形式を先に試し、失敗した場合は整数のみのテキストとして解釈する。
/// どちらにも当てはまらない場合は `None`。
pub fn parse_balance_body(body: &str) -> Option<(i64, BalanceShape)> {
    if let Ok(parsed) = serde_json::from_str::<BalanceBody>(body) {
        return Some((parsed.balance, BalanceShape::Structured));
    }
    body.trim()
        .parse::<i64>()
        .ok()
        .map(|balance| (balance, BalanceShape::Plain))
}

// ---------------------------------------------------------------------------
// 送金
// ---------------------------------------------------------------------------

/// 検証済みの送金リクエスト。
///
/// 構築に成功した値は常に `amount > 0` かつ両IDが空でない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    from_id: String,
    to_id: String,
    amount: i64,
}

impl TransferRequest {
    /// 送金リクエストを検証して作成する。
    pub fn new(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        amount: i64,
    ) -> Result<Self, TypesError> {
        if amount <= 0 {
            return Err(TypesError::InvalidAmount(amount));
        }
        let from_id = from_id.into();
        let to_id = to_id.into();
        if from_id.is_empty() {
            return Err(TypesError::EmptyId("from_id"));
        }
        if to_id.is_empty() {
            return Err(TypesError::EmptyId("to_id"));
        }
        Ok(Self {
            from_id,
            to_id,
            amount,
        })
    }

    /// 送金元プレイヤーID
    pub fn from_id(&self) -> &str {
        &self.from_id
    }

    /// 送金先プレイヤーID
    pub fn to_id(&self) -> &str {
        &self.to_id
    }

    /// 送金額
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// 送信ボディを借用形式で返す。
    pub fn body(&self) -> TransferBody<'_> {
        TransferBody {
            from_id: &self.from_id,
            to_id: &self.to_id,
            amount: self.amount,
        }
    }

    /// 送信するボディのバイト列。署名もこのバイト列に対して行う。
    pub fn to_body_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.body())
    }
}

/// `POST /transfer` のJSONボディ。フィールド順は固定。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferBody<'a> {
    /// 送金元プレイヤーID
    pub from_id: &'a str,
    /// 送金先プレイヤーID
    pub to_id: &'a str,
    /// 送金額
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_balance() {
        assert_eq!(
            parse_balance_body(r#"{"balance": 42}"#),
            Some((42, BalanceShape::Structured))
        );
    }

    #[test]
    fn test_parse_plain_balance() {
        assert_eq!(parse_balance_body("42"), Some((42, BalanceShape::Plain)));
        assert_eq!(parse_balance_body(" 42\n"), Some((42, BalanceShape::Plain)));
        assert_eq!(parse_balance_body("-7"), Some((-7, BalanceShape::Plain)));
    }

    #[test]
    fn test_parse_malformed_balance() {
        assert_eq!(parse_balance_body(""), None);
        assert_eq!(parse_balance_body("forty-two"), None);
        assert_eq!(parse_balance_body(r#"{"coins": 42}"#), None);
        assert_eq!(parse_balance_body(r#"{"balance": "42"}"#), None);
    }

    #[test]
    fn test_transfer_rejects_non_positive_amount() {
        for amount in [0, -1, -50, i64::MIN] {
            assert_eq!(
                TransferRequest::new("a", "b", amount),
                Err(TypesError::InvalidAmount(amount))
            );
        }
    }

    #[test]
    fn test_transfer_rejects_empty_ids() {
        assert_eq!(
            TransferRequest::new("", "b", 1),
            Err(TypesError::EmptyId("from_id"))
        );
        assert_eq!(
            TransferRequest::new("a", "", 1),
            Err(TypesError::EmptyId("to_id"))
        );
    }

    /// 送信ボディのフィールド順とキー名が固定であることを確認
    #[test]
    fn test_transfer_body_bytes() {
        let req = TransferRequest::new("a", "b", 50).unwrap();
        let bytes = req.to_body_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"from_id":"a","to_id":"b","amount":50}"#
        );
    }
}
