//! Running digest state for the handshake transcript.
//!
//! One [`HashState`] wraps one algorithm's incremental hasher. Cloning a
//! state is cheap and yields a fully independent copy, which is the
//! primitive the transcript snapshot mechanism is built on.
//!
//! 握手记录的运行摘要状态。
//!
//! 一个 [`HashState`] 包装一种算法的增量哈希器。克隆状态开销很小，
//! 并产生完全独立的副本，这是握手记录快照机制所依赖的原语。

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

/// The digest algorithms a signature scheme can bind the transcript with.
///
/// `Md5Sha1` is the concatenated MD5 || SHA-1 digest that pre-TLS1.2 RSA
/// signatures are computed over; it is never referenced by a wire
/// identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HashAlgorithm {
    Md5Sha1,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 6] = [
        HashAlgorithm::Md5Sha1,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha224,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha512,
    ];

    /// Size of the final digest in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Md5Sha1 => 36,
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

/// An incremental digest over handshake bytes.
#[derive(Clone)]
pub enum HashState {
    Md5Sha1 { md5: Md5, sha1: Sha1 },
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl HashState {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5Sha1 => HashState::Md5Sha1 {
                md5: Md5::new(),
                sha1: Sha1::new(),
            },
            HashAlgorithm::Sha1 => HashState::Sha1(Sha1::new()),
            HashAlgorithm::Sha224 => HashState::Sha224(Sha224::new()),
            HashAlgorithm::Sha256 => HashState::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => HashState::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => HashState::Sha512(Sha512::new()),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        match self {
            HashState::Md5Sha1 { .. } => HashAlgorithm::Md5Sha1,
            HashState::Sha1(_) => HashAlgorithm::Sha1,
            HashState::Sha224(_) => HashAlgorithm::Sha224,
            HashState::Sha256(_) => HashAlgorithm::Sha256,
            HashState::Sha384(_) => HashAlgorithm::Sha384,
            HashState::Sha512(_) => HashAlgorithm::Sha512,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            HashState::Md5Sha1 { md5, sha1 } => {
                md5.update(data);
                sha1.update(data);
            }
            HashState::Sha1(h) => h.update(data),
            HashState::Sha224(h) => h.update(data),
            HashState::Sha256(h) => h.update(data),
            HashState::Sha384(h) => h.update(data),
            HashState::Sha512(h) => h.update(data),
        }
    }

    /// Consumes the state and produces the final digest.
    pub fn finalize(self) -> Vec<u8> {
        match self {
            HashState::Md5Sha1 { md5, sha1 } => {
                let mut digest = md5.finalize().to_vec();
                digest.extend_from_slice(&sha1.finalize());
                digest
            }
            HashState::Sha1(h) => h.finalize().to_vec(),
            HashState::Sha224(h) => h.finalize().to_vec(),
            HashState::Sha256(h) => h.finalize().to_vec(),
            HashState::Sha384(h) => h.finalize().to_vec(),
            HashState::Sha512(h) => h.finalize().to_vec(),
        }
    }
}

impl std::fmt::Debug for HashState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("HashState").field(&self.algorithm()).finish()
    }
}
