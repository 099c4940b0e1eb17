//! The signing operation state machine and its pluggable backends.
//!
//! Producing the CertificateVerify signature may be delegated to a slow or
//! out-of-process signer. [`SigningOperation`] makes that explicit: it moves
//! through `NotStarted → Pending → Completed → Drained` (or `Failed`), can
//! be started exactly once, and hands out its completed signature exactly
//! once. The caller resumes a `Pending` operation by polling; polling never
//! resubmits the request.
//!
//! 签名操作状态机及其可插拔后端。
//!
//! 生成 CertificateVerify 签名的工作可以委托给缓慢的或进程外的签名
//! 器。[`SigningOperation`] 将这一点显式化：它经历
//! `NotStarted → Pending → Completed → Drained`（或 `Failed`），只能
//! 启动一次，且只交出一次完成的签名。调用者通过轮询来恢复 `Pending`
//! 状态的操作；轮询永远不会重新提交请求。

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::keys::PrivateKey;
use crate::error::{HandshakeError, Result};
use crate::scheme::SignatureAlgorithm;
use log::debug;

/// Everything a backend needs to compute one signature.
#[derive(Debug, Clone)]
pub struct SigningRequest {
    pub signature_alg: SignatureAlgorithm,
    pub hash_alg: HashAlgorithm,
    /// The finalized transcript snapshot digest.
    pub digest: Vec<u8>,
}

/// What a backend reports when asked about an operation.
#[derive(Debug)]
pub enum SignProgress {
    Ready(Vec<u8>),
    Pending,
}

/// What a [`SigningOperation`] reports to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncStatus {
    Ready,
    Pending,
}

/// A signature producer. `start` is invoked exactly once per operation;
/// `poll` is only invoked after `start` returned [`SignProgress::Pending`].
///
/// The backend may run work on another thread, a hardware device, or
/// nowhere at all ([`LocalSigner`] computes inline); that is opaque here.
pub trait SigningBackend {
    fn start(&mut self, key: &PrivateKey, request: SigningRequest) -> Result<SignProgress>;
    fn poll(&mut self) -> Result<SignProgress>;
}

/// The default backend: signs synchronously with the local private key.
#[derive(Debug, Default)]
pub struct LocalSigner;

impl SigningBackend for LocalSigner {
    fn start(&mut self, key: &PrivateKey, request: SigningRequest) -> Result<SignProgress> {
        key.sign(request.signature_alg, request.hash_alg, &request.digest)
            .map(SignProgress::Ready)
    }

    fn poll(&mut self) -> Result<SignProgress> {
        Err(HandshakeError::InvalidState(
            "local signer has no pending operation to poll",
        ))
    }
}

/// A backend that suspends for a fixed number of polls before signing with
/// the provided key. Exercises the suspension path the way an offloaded
/// signer would, without requiring real hardware.
///
/// 在签名之前挂起固定轮询次数的后端。以与硬件卸载签名器相同的方式
/// 触发挂起路径，而无需真实硬件。
#[derive(Debug)]
pub struct DeferredSigner {
    delay_polls: u32,
    pending: Option<(PrivateKey, SigningRequest)>,
}

impl DeferredSigner {
    pub fn new(delay_polls: u32) -> Self {
        Self {
            delay_polls,
            pending: None,
        }
    }
}

impl SigningBackend for DeferredSigner {
    fn start(&mut self, key: &PrivateKey, request: SigningRequest) -> Result<SignProgress> {
        self.pending = Some((key.clone(), request));
        Ok(SignProgress::Pending)
    }

    fn poll(&mut self) -> Result<SignProgress> {
        if self.pending.is_none() {
            return Err(HandshakeError::InvalidState(
                "deferred signer has no pending operation to poll",
            ));
        }
        if self.delay_polls > 0 {
            self.delay_polls -= 1;
            return Ok(SignProgress::Pending);
        }
        let (key, request) = self.pending.take().unwrap();
        key.sign(request.signature_alg, request.hash_alg, &request.digest)
            .map(SignProgress::Ready)
    }
}

#[derive(Debug)]
enum OpState {
    NotStarted,
    Pending,
    Completed(Vec<u8>),
    Drained,
    Failed(String),
}

/// Handle for one in-flight or completed signing operation.
///
/// Exclusively owned by the CertificateVerify step that created it; it may
/// outlive a single send call when the backend suspends, in which case the
/// driver re-invokes the send step and the handle is polled, not restarted.
#[derive(Debug, Default)]
pub struct SigningOperation {
    state: OpState,
}

impl Default for OpState {
    fn default() -> Self {
        OpState::NotStarted
    }
}

impl SigningOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_started(&self) -> bool {
        !matches!(self.state, OpState::NotStarted)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, OpState::Pending)
    }

    /// Submits the request to `backend`. A second call on the same handle
    /// is rejected, whatever state the first call left it in: one handle
    /// signs one handshake message, at most once.
    ///
    /// 将请求提交给 `backend`。同一个句柄上的第二次调用会被拒绝，
    /// 无论第一次调用将其置于何种状态：一个句柄最多为一条握手消息
    /// 签名一次。
    pub fn start(
        &mut self,
        backend: &mut dyn SigningBackend,
        key: &PrivateKey,
        request: SigningRequest,
    ) -> Result<AsyncStatus> {
        if self.is_started() {
            return Err(HandshakeError::InvalidState(
                "signing operation was already started",
            ));
        }
        match backend.start(key, request) {
            Ok(SignProgress::Ready(signature)) => {
                self.state = OpState::Completed(signature);
                Ok(AsyncStatus::Ready)
            }
            Ok(SignProgress::Pending) => {
                debug!("signing operation suspended by backend");
                self.state = OpState::Pending;
                Ok(AsyncStatus::Pending)
            }
            Err(err) => {
                self.state = OpState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Checks a suspended operation for completion. Safe to call any number
    /// of times while `Pending`; never resubmits the signing request.
    pub fn poll(&mut self, backend: &mut dyn SigningBackend) -> Result<AsyncStatus> {
        match &self.state {
            OpState::NotStarted => Err(HandshakeError::InvalidState(
                "signing operation polled before start",
            )),
            OpState::Completed(_) => Ok(AsyncStatus::Ready),
            OpState::Drained => Err(HandshakeError::InvalidState(
                "signing operation result was already consumed",
            )),
            OpState::Failed(msg) => Err(HandshakeError::AsyncOperation(msg.clone())),
            OpState::Pending => match backend.poll() {
                Ok(SignProgress::Ready(signature)) => {
                    debug!("signing operation completed");
                    self.state = OpState::Completed(signature);
                    Ok(AsyncStatus::Ready)
                }
                Ok(SignProgress::Pending) => Ok(AsyncStatus::Pending),
                Err(err) => {
                    self.state = OpState::Failed(err.to_string());
                    Err(err)
                }
            },
        }
    }

    /// Hands out the completed signature, exactly once.
    pub fn take_signature(&mut self) -> Result<Vec<u8>> {
        match std::mem::replace(&mut self.state, OpState::Drained) {
            OpState::Completed(signature) => Ok(signature),
            other => {
                self.state = other;
                Err(HandshakeError::InvalidState(
                    "no completed signature to take",
                ))
            }
        }
    }
}
