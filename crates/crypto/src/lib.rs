//! # Economy Bridge 署名処理
//!
//! 台帳サービスへの全リクエストに付与する `X-Signature` ヘッダーを計算する。
//!
//! ## アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 署名 | HMAC-SHA256 |
//! | エンコード | 小文字16進数（区切りなし、1バイト2桁） |
//!
//! 署名は (payload, key) の純関数であり、同じ入力からは常に同じ文字列が得られる。

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// 署名の16進文字列長（SHA-256 = 32バイト）
pub const SIGNATURE_HEX_LEN: usize = 64;

/// 署名処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// HMAC-SHA256プリミティブを初期化できない
    #[error("HMAC-SHA256が利用できません: {0}")]
    CryptoUnavailable(String),
    /// 署名が16進文字列として不正
    #[error("署名の形式が不正です: {0}")]
    MalformedSignature(String),
    /// 署名が一致しない
    #[error("署名検証に失敗しました")]
    SignatureMismatch,
}

fn keyed_mac(key: &[u8]) -> Result<HmacSha256, CryptoError> {
    HmacSha256::new_from_slice(key).map_err(|e| CryptoError::CryptoUnavailable(e.to_string()))
}

/// ペイロードのHMAC-SHA256を計算し、小文字16進文字列で返す。
pub fn sign(payload: &[u8], key: &[u8]) -> Result<String, CryptoError> {
    let mut mac = keyed_mac(key)?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// 署名を定数時間で検証する。
pub fn verify(payload: &[u8], key: &[u8], signature: &str) -> Result<(), CryptoError> {
    let expected =
        hex::decode(signature).map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
    let mut mac = keyed_mac(key)?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| CryptoError::SignatureMismatch)
}

/// 共有秘密鍵を保持する署名器。
///
/// プロセス起動時に一度だけ構築され、以後変更されない。
#[derive(Clone)]
pub struct RequestSigner {
    key: Vec<u8>,
}

impl RequestSigner {
    /// 署名器を構築する。HMACプリミティブが使えない場合は失敗する。
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, CryptoError> {
        let key = key.into();
        keyed_mac(&key)?;
        Ok(Self { key })
    }

    /// ペイロードに署名する。
    pub fn sign(&self, payload: &[u8]) -> Result<String, CryptoError> {
        sign(payload, &self.key)
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("key", &"<redacted>")
            .finish()
    }
}
