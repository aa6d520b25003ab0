//! SHA-256 hashing for uploaded artifacts.

use std::io::{self, Read};

use groundtruth_types::ContentHash;
use sha2::{Digest, Sha256};

/// Compute a 256-bit SHA-256 hash of arbitrary data.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    finish(hasher)
}

/// Digest an artifact held in memory.
pub fn digest(bytes: &[u8]) -> ContentHash {
    ContentHash::new(sha256(bytes))
}

/// Digest an artifact from a reader. Read failures are returned, not swallowed.
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentHash> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(ContentHash::new(finish(hasher)))
}

fn finish(hasher: Sha256) -> [u8; 32] {
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_deterministic() {
        let h1 = digest(b"hello groundtruth");
        let h2 = digest(b"hello groundtruth");
        assert_eq!(h1, h2);
    }

    #[test]
    fn digest_different_inputs() {
        assert_ne!(digest(b"hello"), digest(b"world"));
    }

    #[test]
    fn digest_matches_known_vector() {
        assert_eq!(
            digest(b"abc").to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_empty() {
        assert_eq!(
            digest(b"").to_string(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn reader_equivalent_to_slice() {
        let data = vec![0x5Au8; 20_000];
        assert_eq!(digest_reader(&data[..]).unwrap(), digest(&data));
    }

    #[test]
    fn reader_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            }
        }
        let err = digest_reader(Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
