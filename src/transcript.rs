//! The connection's running handshake transcript hashes.
//!
//! Several digest algorithms run in parallel until negotiation settles
//! which ones later messages actually need. Signing and verification never
//! touch the running states directly: they work on a [`TranscriptSnapshot`],
//! an owned copy that can be finalized without destroying the state the
//! Finished message will need.
//!
//! 连接的运行中握手记录哈希。
//!
//! 多个摘要算法并行运行，直到协商确定后续消息真正需要哪些算法。
//! 签名和验证从不直接接触运行中的状态：它们在 [`TranscriptSnapshot`]
//! 上工作，这是一个可以被最终确定的独立副本，而不会破坏 Finished
//! 消息所需的状态。

use crate::crypto::hash::{HashAlgorithm, HashState};
use crate::error::{HandshakeError, Result};
use log::debug;

/// The set of running transcript digests on a connection.
#[derive(Debug, Clone, Default)]
pub struct TranscriptHashes {
    states: Vec<HashState>,
}

impl TranscriptHashes {
    /// Creates an empty set; algorithms must be started before use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set with every supported algorithm running, the state a
    /// connection is in before any minimization.
    pub fn with_all_algorithms() -> Self {
        let mut hashes = Self::new();
        for algorithm in HashAlgorithm::ALL {
            hashes.start(algorithm);
        }
        hashes
    }

    /// Starts a running digest for `algorithm`. Starting an algorithm that
    /// is already running is a no-op.
    pub fn start(&mut self, algorithm: HashAlgorithm) {
        if !self.is_running(algorithm) {
            self.states.push(HashState::new(algorithm));
        }
    }

    pub fn is_running(&self, algorithm: HashAlgorithm) -> bool {
        self.states.iter().any(|s| s.algorithm() == algorithm)
    }

    /// The algorithms currently retained, in no particular order.
    pub fn algorithms(&self) -> Vec<HashAlgorithm> {
        self.states.iter().map(HashState::algorithm).collect()
    }

    /// Feeds handshake bytes into every running digest.
    pub fn update(&mut self, data: &[u8]) {
        for state in &mut self.states {
            state.update(data);
        }
    }

    /// Copies the running state for `algorithm` into an isolated snapshot.
    ///
    /// Fails with [`HandshakeError::TranscriptState`] if the algorithm was
    /// never started or has already been minimized away.
    ///
    /// 将 `algorithm` 的运行状态复制到一个独立的快照中。
    pub fn snapshot(&self, algorithm: HashAlgorithm) -> Result<TranscriptSnapshot> {
        let state = self
            .states
            .iter()
            .find(|s| s.algorithm() == algorithm)
            .ok_or(HandshakeError::TranscriptState(algorithm))?;
        Ok(TranscriptSnapshot {
            state: state.clone(),
        })
    }

    /// The current digest for `algorithm`, computed on a throwaway copy.
    pub fn current_digest(&self, algorithm: HashAlgorithm) -> Result<Vec<u8>> {
        Ok(self.snapshot(algorithm)?.into_digest())
    }

    /// Drops every running digest not listed in `required`.
    ///
    /// Called once the proof of possession is committed and later messages
    /// are known to depend only on `required`.
    ///
    /// 丢弃所有未列在 `required` 中的运行摘要。
    pub fn retain_only(&mut self, required: &[HashAlgorithm]) {
        let before = self.states.len();
        self.states.retain(|s| required.contains(&s.algorithm()));
        if self.states.len() != before {
            debug!(
                "minimized transcript hashes, retaining {:?}",
                self.algorithms()
            );
        }
    }
}

/// An owned, disposable copy of one running transcript digest.
///
/// Created fresh per CertificateVerify operation and consumed exactly once
/// by [`Self::into_digest`]. Mutating the snapshot never affects the
/// connection's running transcript.
#[derive(Debug, Clone)]
pub struct TranscriptSnapshot {
    state: HashState,
}

impl TranscriptSnapshot {
    pub fn algorithm(&self) -> HashAlgorithm {
        self.state.algorithm()
    }

    /// Feeds additional bytes into the copy only.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Finalizes the copy into the digest that gets signed or verified.
    pub fn into_digest(self) -> Vec<u8> {
        self.state.finalize()
    }
}
