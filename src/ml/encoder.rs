use crate::error::Result;
use async_trait::async_trait;

/// Turns text into a raw (not necessarily normalized) vector of fixed dimension.
#[async_trait]
pub trait TextEncoder: Send + Sync {
    fn dimension(&self) -> usize;

    async fn encode(&self, text: &str) -> Result<Vec<f32>>;
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Offline encoder using signed feature hashing of lower-cased word tokens.
///
/// Deterministic across runs and platforms. Texts sharing most of their words
/// land close together; unrelated texts are near-orthogonal.
#[derive(Debug, Clone)]
pub struct HashingEncoder {
    dim: usize,
}

impl HashingEncoder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn encode_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; self.dim];
        if self.dim == 0 {
            return vector;
        }

        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let hash = fnv1a(token.as_bytes());
            let bucket = (hash % self.dim as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        vector
    }
}

impl Default for HashingEncoder {
    fn default() -> Self {
        Self::new(384)
    }
}

#[async_trait]
impl TextEncoder for HashingEncoder {
    fn dimension(&self) -> usize {
        self.dim
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.encode_sync(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_reference_values() {
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_is_deterministic_and_case_insensitive() {
        let encoder = HashingEncoder::new(64);
        assert_eq!(
            encoder.encode_sync("Dragons and Wizards"),
            encoder.encode_sync("dragons AND wizards!")
        );
    }

    #[test]
    fn test_dimension_is_fixed() {
        let encoder = HashingEncoder::default();
        assert_eq!(encoder.dimension(), 384);
        assert_eq!(encoder.encode_sync("a tale of two cities").len(), 384);
    }

    #[test]
    fn test_text_without_tokens_is_zero() {
        let encoder = HashingEncoder::new(16);
        assert!(encoder.encode_sync(" -- !! ").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_async_encode_matches_sync() {
        let encoder = HashingEncoder::new(32);
        let text = "The hobbit goes there and back again";
        assert_eq!(encoder.encode(text).await.unwrap(), encoder.encode_sync(text));
    }
}
