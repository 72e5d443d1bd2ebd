//! Content fingerprints for ROM files.
//!
//! CRC32, MD5 and SHA-1 are computed together in a single streaming pass so
//! a ROM is read from disk at most once, however large it is.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha1::Digest;

use crate::error::LibError;

const CHUNK_SIZE: usize = 64 * 1024; // 64 KB

/// Hash triple used for hash-keyed remote lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RomHashes {
    /// CRC32 as 8 uppercase hex digits (the form the remote service expects)
    pub crc32: String,
    /// MD5 as lowercase hex
    pub md5: String,
    /// SHA-1 as lowercase hex
    pub sha1: String,
    /// Number of bytes hashed
    pub data_size: u64,
}

/// Compute CRC32, MD5 and SHA-1 of everything readable from `reader`.
pub fn compute_hashes(reader: &mut dyn Read) -> std::io::Result<RomHashes> {
    compute_hashes_with_progress(reader, &|_| {})
}

/// Same as [`compute_hashes`], calling `progress` with the running byte count
/// after every chunk.
pub fn compute_hashes_with_progress(
    reader: &mut dyn Read,
    progress: &dyn Fn(u64),
) -> std::io::Result<RomHashes> {
    let mut crc = crc32fast::Hasher::new();
    let mut md5_ctx = md5::Context::new();
    let mut sha = sha1::Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut processed: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        crc.update(&buf[..n]);
        md5_ctx.consume(&buf[..n]);
        sha.update(&buf[..n]);
        processed += n as u64;
        progress(processed);
    }

    Ok(RomHashes {
        crc32: format!("{:08X}", crc.finalize()),
        md5: format!("{:x}", md5_ctx.compute()),
        sha1: format!("{:x}", sha.finalize()),
        data_size: processed,
    })
}

/// Hash a file on the blocking thread pool.
pub async fn hash_file(path: &Path) -> Result<RomHashes, LibError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut file = File::open(&path)?;
        let hashes = compute_hashes(&mut file)?;
        log::debug!(
            "Hashed {} ({} bytes): crc32={}",
            path.display(),
            hashes.data_size,
            hashes.crc32
        );
        Ok::<_, LibError>(hashes)
    })
    .await
    .map_err(|e| LibError::task(e.to_string()))?
}

#[cfg(test)]
#[path = "tests/hasher_tests.rs"]
mod tests;
