use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::OnceCell;
use xxhash_rust::xxh64::{Xxh64, xxh64};

/// xxh64 digest of the empty input with seed 0, rendered in decimal
pub const EMPTY_FINGERPRINT: &str = "17241709254077376921";

const SEED: u64 = 0;
const READ_BUFFER_SIZE: usize = 64 * 1024;

static ENGINE: OnceCell<HashEngine> = OnceCell::const_new();

/// Process-wide xxh64 fingerprinter.
///
/// The engine is bootstrapped once, on first use, and shared read-only afterwards.
/// Concurrent first callers wait on the same initialisation.
#[derive(Debug)]
pub struct HashEngine {
    seed: u64,
}

impl HashEngine {
    /// Returns the shared engine, bootstrapping it if needed
    pub async fn global() -> anyhow::Result<&'static HashEngine> {
        ENGINE.get_or_try_init(|| async { Self::bootstrap(SEED) }).await
    }

    fn bootstrap(seed: u64) -> anyhow::Result<Self> {
        let engine = Self { seed };
        let probe = engine.fingerprint(b"");
        if probe != EMPTY_FINGERPRINT {
            anyhow::bail!(
                "xxh64 self-test failed: expected {}, got {}",
                EMPTY_FINGERPRINT,
                probe
            );
        }
        tracing::debug!("xxh64 engine initialised");
        Ok(engine)
    }

    pub fn fingerprint(&self, data: &[u8]) -> String {
        xxh64(data, self.seed).to_string()
    }

    pub async fn fingerprint_reader<R: AsyncRead + Unpin>(
        &self,
        mut reader: R,
    ) -> std::io::Result<String> {
        let mut hasher = Xxh64::new(self.seed);
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
        Ok(hasher.digest().to_string())
    }

    pub async fn fingerprint_file(&self, path: &Path) -> std::io::Result<String> {
        let file = tokio::fs::File::open(path).await?;
        self.fingerprint_reader(file).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_input_constant() {
        let engine = HashEngine::global().await.unwrap();
        assert_eq!(engine.fingerprint(b""), EMPTY_FINGERPRINT);
    }

    #[tokio::test]
    async fn test_fingerprint_is_deterministic() {
        let engine = HashEngine::global().await.unwrap();
        let data = b"helloworld";
        assert_eq!(engine.fingerprint(data), engine.fingerprint(data));
        assert_eq!(engine.fingerprint(data), "9228181307863624271");
    }

    #[tokio::test]
    async fn test_distinct_inputs_differ() {
        let engine = HashEngine::global().await.unwrap();
        let corpus: [&[u8]; 4] = [b"a", b"b", b"helloworld", b"hello world"];
        let mut seen = std::collections::HashSet::new();
        for item in corpus {
            assert!(seen.insert(engine.fingerprint(item)));
        }
    }

    #[tokio::test]
    async fn test_reader_matches_one_shot() {
        let engine = HashEngine::global().await.unwrap();
        // Larger than the read buffer to cross chunk boundaries
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let streamed = engine.fingerprint_reader(&data[..]).await.unwrap();
        assert_eq!(streamed, engine.fingerprint(&data));
    }

    #[tokio::test]
    async fn test_raw_bytes_not_text() {
        let engine = HashEngine::global().await.unwrap();
        // Non-UTF-8 bytes must be hashed as-is
        let raw = [0xffu8, 0xfe, 0x00, 0x80];
        assert_ne!(engine.fingerprint(&raw), engine.fingerprint("\u{ff}\u{fe}\0\u{80}".as_bytes()));
    }

    #[tokio::test]
    async fn test_concurrent_first_use_yields_one_engine() {
        let handles: Vec<_> = (0..8)
            .map(|_| tokio::spawn(async { HashEngine::global().await.unwrap() as *const _ as usize }))
            .collect();
        let mut addrs = Vec::new();
        for h in handles {
            addrs.push(h.await.unwrap());
        }
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }
}
