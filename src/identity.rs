//! Signed identity tokens
//!
//! A token carries an owner id and the unix time it was issued, signed with
//! HMAC-SHA256:
//!
//! ```text
//! signature = base64url(HMAC(secret, owner_id + "|" + issued_at))
//! token     = base64url(owner_id + "|" + issued_at + "|" + signature)
//! ```
//!
//! Tokens are advisory. A token that fails to decode or verify is never an
//! error for the caller: [`IdentityCodec::resolve`] simply issues a fresh
//! owner id and token.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::config::IdentityConfig;
use crate::errors::{LinkvaultError, Result};

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: char = '|';

/// 随机密钥长度（字节）
const GENERATED_SECRET_LEN: usize = 32;

/// 未从配置创建时的令牌有效期（天）
const DEFAULT_MAX_AGE_DAYS: i64 = 30;

/// 一个已签名（或已校验）的身份令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityToken {
    pub owner_id: String,
    /// Unix 秒
    pub issued_at: i64,
    /// 编码后的令牌字符串，交给传输层（cookie 等）
    pub value: String,
}

impl IdentityToken {
    pub fn issued_at_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.issued_at, 0)
    }

    /// 有效期由传输层执行，这里只提供计算
    pub fn is_expired(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        match self.issued_at_datetime() {
            Some(issued) => issued + max_age < now,
            None => true,
        }
    }
}

/// 令牌校验失败的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// base64 或 UTF-8 解码失败
    Encoding,
    /// 字段数不是 3
    FieldCount(usize),
    EmptyOwner,
    InvalidTimestamp,
    SignatureMismatch,
    /// owner id 为空或包含分隔符，无法签发
    InvalidOwner,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Encoding => write!(f, "token is not valid base64/utf-8"),
            TokenError::FieldCount(n) => write!(f, "token has {} fields, expected 3", n),
            TokenError::EmptyOwner => write!(f, "token owner is empty"),
            TokenError::InvalidTimestamp => write!(f, "token timestamp is not an integer"),
            TokenError::SignatureMismatch => write!(f, "token signature mismatch"),
            TokenError::InvalidOwner => write!(f, "owner id is empty or contains '|'"),
        }
    }
}

impl std::error::Error for TokenError {}

/// `resolve` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub owner_id: String,
    /// 新签发的令牌；原令牌有效时为 None
    pub reissued: Option<IdentityToken>,
}

impl ResolvedIdentity {
    pub fn is_new(&self) -> bool {
        self.reissued.is_some()
    }
}

/// 身份令牌编解码器
///
/// 持有已经初始化好密钥的 HMAC 状态，每次签名克隆一份。
/// `max_age` 只用于 [`IdentityCodec::is_expired`]，`verify` 和 `resolve` 不看它。
#[derive(Clone)]
pub struct IdentityCodec {
    mac: HmacSha256,
    max_age: Duration,
}

impl fmt::Debug for IdentityCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityCodec")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl IdentityCodec {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(LinkvaultError::config("identity secret key must not be empty"));
        }

        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| LinkvaultError::config(format!("invalid identity secret: {}", e)))?;
        Ok(Self {
            mac,
            max_age: Duration::days(DEFAULT_MAX_AGE_DAYS),
        })
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// 按本编解码器的有效期判断令牌是否过期
    pub fn is_expired(&self, token: &IdentityToken, now: DateTime<Utc>) -> bool {
        token.is_expired(self.max_age, now)
    }

    /// 从配置创建；密钥为空时生成随机密钥（重启后旧令牌全部失效）
    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let max_age = Duration::days(i64::from(config.token_max_age_days));

        if config.secret_key.is_empty() {
            warn!("Identity secret not configured, generating a random one");
            use rand::RngExt;
            let mut secret = [0u8; GENERATED_SECRET_LEN];
            rand::rng().fill(&mut secret);
            return Ok(Self::new(secret)?.with_max_age(max_age));
        }

        Ok(Self::new(config.secret_key.as_bytes())?.with_max_age(max_age))
    }

    /// 为指定 owner 签发令牌，签发时间为当前时间
    pub fn mint(&self, owner_id: &str) -> std::result::Result<IdentityToken, TokenError> {
        self.mint_at(owner_id, Utc::now().timestamp())
    }

    pub fn mint_at(
        &self,
        owner_id: &str,
        issued_at: i64,
    ) -> std::result::Result<IdentityToken, TokenError> {
        if owner_id.is_empty() || owner_id.contains(SEPARATOR) {
            return Err(TokenError::InvalidOwner);
        }
        Ok(self.encode(owner_id, issued_at))
    }

    /// 生成新的匿名 owner（UUID v4）并签发令牌
    pub fn mint_anonymous(&self) -> IdentityToken {
        let owner_id = uuid::Uuid::new_v4().to_string();
        self.encode(&owner_id, Utc::now().timestamp())
    }

    /// 校验令牌，成功时返回其中的 owner 与签发时间
    pub fn verify(&self, token: &str) -> std::result::Result<IdentityToken, TokenError> {
        let decoded = URL_SAFE
            .decode(token.as_bytes())
            .map_err(|_| TokenError::Encoding)?;
        let decoded = String::from_utf8(decoded).map_err(|_| TokenError::Encoding)?;

        let parts: Vec<&str> = decoded.split(SEPARATOR).collect();
        let [owner_id, timestamp, signature] = parts.as_slice() else {
            return Err(TokenError::FieldCount(parts.len()));
        };

        if owner_id.is_empty() {
            return Err(TokenError::EmptyOwner);
        }

        let issued_at: i64 = timestamp
            .parse()
            .map_err(|_| TokenError::InvalidTimestamp)?;

        // 按原始字段字符串重新计算签名，非规范写法（如 "+123"）同样会失配
        let expected = self.sign(owner_id, timestamp);
        if !bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
            return Err(TokenError::SignatureMismatch);
        }

        Ok(IdentityToken {
            owner_id: owner_id.to_string(),
            issued_at,
            value: token.to_string(),
        })
    }

    /// 令牌有效则沿用，缺失或无效则签发新的匿名身份
    pub fn resolve(&self, token: Option<&str>) -> ResolvedIdentity {
        match token {
            Some(token) => match self.verify(token) {
                Ok(verified) => ResolvedIdentity {
                    owner_id: verified.owner_id,
                    reissued: None,
                },
                Err(e) => {
                    warn!("Identity token rejected ({}), issuing a new one", e);
                    self.fresh_identity()
                }
            },
            None => {
                debug!("No identity token presented, issuing a new one");
                self.fresh_identity()
            }
        }
    }

    fn fresh_identity(&self) -> ResolvedIdentity {
        let token = self.mint_anonymous();
        ResolvedIdentity {
            owner_id: token.owner_id.clone(),
            reissued: Some(token),
        }
    }

    fn encode(&self, owner_id: &str, issued_at: i64) -> IdentityToken {
        let timestamp = issued_at.to_string();
        let signature = self.sign(owner_id, &timestamp);
        let raw = format!("{owner_id}{SEPARATOR}{timestamp}{SEPARATOR}{signature}");

        IdentityToken {
            owner_id: owner_id.to_string(),
            issued_at,
            value: URL_SAFE.encode(raw.as_bytes()),
        }
    }

    fn sign(&self, owner_id: &str, timestamp: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(owner_id.as_bytes());
        mac.update(&[SEPARATOR as u8]);
        mac.update(timestamp.as_bytes());
        URL_SAFE.encode(mac.finalize().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> IdentityCodec {
        IdentityCodec::new("test-secret").unwrap()
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            IdentityCodec::new(""),
            Err(LinkvaultError::Config(_))
        ));
    }

    #[test]
    fn test_from_config_generates_secret() {
        let codec = IdentityCodec::from_config(&IdentityConfig::default()).unwrap();
        let token = codec.mint("u1").unwrap();
        assert_eq!(codec.verify(&token.value).unwrap().owner_id, "u1");
    }

    #[test]
    fn test_token_layout() {
        let token = codec().mint_at("u1", 1_700_000_000).unwrap();
        let raw = String::from_utf8(URL_SAFE.decode(&token.value).unwrap()).unwrap();
        let parts: Vec<&str> = raw.split('|').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "u1");
        assert_eq!(parts[1], "1700000000");
        // SHA-256 输出 32 字节，base64 带填充后 44 个字符
        assert_eq!(parts[2].len(), 44);
    }

    #[test]
    fn test_mint_rejects_separator_in_owner() {
        assert_eq!(codec().mint("a|b"), Err(TokenError::InvalidOwner));
        assert_eq!(codec().mint(""), Err(TokenError::InvalidOwner));
    }

    #[test]
    fn test_verify_rejects_field_count() {
        let raw = URL_SAFE.encode("u1|1700000000");
        assert_eq!(codec().verify(&raw), Err(TokenError::FieldCount(2)));

        let raw = URL_SAFE.encode("u1|1|sig|extra");
        assert_eq!(codec().verify(&raw), Err(TokenError::FieldCount(4)));
    }

    #[test]
    fn test_verify_rejects_bad_timestamp() {
        let raw = URL_SAFE.encode("u1|yesterday|sig");
        assert_eq!(codec().verify(&raw), Err(TokenError::InvalidTimestamp));
    }

    #[test]
    fn test_verify_rejects_empty_owner() {
        let raw = URL_SAFE.encode("|1700000000|sig");
        assert_eq!(codec().verify(&raw), Err(TokenError::EmptyOwner));
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let token = codec().mint("u1").unwrap();
        let other = IdentityCodec::new("another-secret").unwrap();
        assert_eq!(
            other.verify(&token.value),
            Err(TokenError::SignatureMismatch)
        );
    }

    #[test]
    fn test_is_expired() {
        let token = codec().mint_at("u1", 1_700_000_000).unwrap();
        let issued = token.issued_at_datetime().unwrap();
        assert!(!token.is_expired(Duration::days(30), issued + Duration::days(29)));
        assert!(token.is_expired(Duration::days(30), issued + Duration::days(31)));
    }

    #[test]
    fn test_codec_expiry_follows_config() {
        let config = IdentityConfig {
            secret_key: "test-secret".into(),
            token_max_age_days: 1,
        };
        let codec = IdentityCodec::from_config(&config).unwrap();
        assert_eq!(codec.max_age(), Duration::days(1));

        let token = codec.mint_at("u1", 1_700_000_000).unwrap();
        let issued = token.issued_at_datetime().unwrap();
        assert!(!codec.is_expired(&token, issued + Duration::hours(23)));
        assert!(codec.is_expired(&token, issued + Duration::days(2)));
    }
}
