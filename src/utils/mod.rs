/// 短码字符表（大小写字母 + 数字）
pub const SHORT_KEY_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| SHORT_KEY_ALPHABET[rand::random_range(0..SHORT_KEY_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// 短码只允许字母数字，长度 1..=32（与 urls.short_url 列宽一致）
pub fn is_valid_short_key(key: &str) -> bool {
    !key.is_empty() && key.len() <= 32 && key.bytes().all(|b| b.is_ascii_alphanumeric())
}
