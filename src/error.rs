use crate::crypto::hash::HashAlgorithm;
use thiserror::Error;

/// Errors produced while processing a CertificateVerify message.
///
/// Every variant here is fatal to the handshake: the caller is expected to
/// translate it into an alert and tear the connection down. A suspended
/// signing operation is *not* an error and is reported through
/// [`crate::cert_verify::SendOutcome::Pending`] instead.
///
/// 处理 CertificateVerify 消息时产生的错误。
///
/// 这里的每个变体对握手来说都是致命的：调用者应将其转换为警报并
/// 断开连接。挂起的签名操作*不是*错误，而是通过
/// [`crate::cert_verify::SendOutcome::Pending`] 报告。
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The peer sent a scheme outside the offered set, or no default scheme
    /// exists for this version and key type.
    #[error("signature scheme negotiation failed: {0}")]
    Negotiation(&'static str),

    /// The message on the wire does not match the expected framing.
    #[error("malformed CertificateVerify message: {0}")]
    MalformedMessage(&'static str),

    /// The requested transcript hash was never started on this connection,
    /// which indicates a handshake-sequencing bug upstream.
    #[error("transcript hash {0:?} is not running on this connection")]
    TranscriptState(HashAlgorithm),

    /// The peer's signature did not validate against its public key.
    #[error("peer signature did not verify against the transcript")]
    VerificationFailure,

    /// The signing backend reported a failure.
    #[error("signing backend failed: {0}")]
    AsyncOperation(String),

    /// An operation was invoked in a state that does not permit it, such as
    /// starting a signing operation twice for one message.
    #[error("invalid state transition attempted: {0}")]
    InvalidState(&'static str),

    /// A component required for this code path was not configured on the
    /// connection.
    #[error("a required component was not configured: {0}")]
    ComponentMissing(&'static str),

    /// A builder was finalized without one of its required fields.
    #[error("missing required builder field: {0}")]
    BuilderMissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, HandshakeError>;
