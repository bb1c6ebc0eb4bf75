/// GBK 解码实现

use encoding_rs::GBK;
use super::traits::LegacyDecoder;

/// 默认的旧编码解码器（GBK）
#[derive(Debug, Clone, Copy, Default)]
pub struct GbkDecoder;

impl LegacyDecoder for GbkDecoder {
    fn decode(&self, bytes: &[u8]) -> Option<String> {
        let (decoded, had_errors) = GBK.decode_without_bom_handling(bytes);
        if had_errors {
            None
        } else {
            Some(decoded.into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gbk_decode() {
        let decoder = GbkDecoder;
        // "路径1" 的 GBK 字节
        assert_eq!(decoder.decode(&[0xC2, 0xB7, 0xBE, 0xB6, 0x31]).as_deref(), Some("路径1"));
    }

    #[test]
    fn test_gbk_decode_rejects_truncated_pair() {
        let decoder = GbkDecoder;
        assert_eq!(decoder.decode(&[0xC2]), None);
    }
}
