use crate::buffer::HandshakeBuffer;
use crate::connection::Connection;
use crate::error::{HandshakeError, Result};
use crate::scheme::{self, SignatureScheme};
use crate::signing::{AsyncStatus, SigningOperation, SigningRequest};
use log::debug;

/// Result of driving the send path one step forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The message is fully serialized into the outbound buffer.
    Complete,
    /// The signing backend has not produced the signature yet. The caller
    /// must invoke [`CertificateVerifySend::send`] again later; nothing is
    /// resubmitted on re-entry.
    Pending,
}

/// Results of the steps that must not be redone when the signing backend
/// suspends: the scheme chosen (and its identifier already serialized) and
/// the rollback point for this message.
#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    scheme: SignatureScheme,
    message_start: usize,
}

/// The send side of CertificateVerify, owned by the handshake driver for
/// the lifetime of this one message.
///
/// The first [`Self::send`] call negotiates the scheme, writes its
/// identifier where the version requires one, snapshots the transcript and
/// starts the signing operation. If the backend suspends, the call reports
/// [`SendOutcome::Pending`] and later calls only poll for completion: the
/// scheme and snapshot are checkpointed, never recomputed, so a retry can
/// neither pick a different scheme nor consume the outbound buffer twice.
/// A fatal error rewinds the buffer to the start of the message.
///
/// CertificateVerify 的发送端，由握手驱动器在这一条消息的生命周期内
/// 持有。
///
/// 第一次 [`Self::send`] 调用协商方案、在版本需要时写入其标识符、对
/// 握手记录做快照并启动签名操作。如果后端挂起，调用报告
/// [`SendOutcome::Pending`]，后续调用只轮询完成情况：方案和快照已
/// 被检查点化，绝不会重新计算，因此重试既不会选出不同的方案，也不会
/// 重复消费出站缓冲区。致命错误会将缓冲区回退到消息的起点。
#[derive(Debug, Default)]
pub struct CertificateVerifySend {
    checkpoint: Option<Checkpoint>,
    operation: SigningOperation,
}

impl CertificateVerifySend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drives the send path: starts the signing operation on first entry,
    /// polls it on re-entry, and serializes the signature on completion.
    pub fn send(&mut self, conn: &mut Connection, out: &mut HandshakeBuffer) -> Result<SendOutcome> {
        match self.checkpoint {
            None => self.start(conn, out),
            Some(checkpoint) => self.resume(conn, out, checkpoint),
        }
    }

    fn start(&mut self, conn: &mut Connection, out: &mut HandshakeBuffer) -> Result<SendOutcome> {
        let message_start = out.write_mark();

        let scheme = scheme::negotiate_send(
            conn.version(),
            conn.local_key_type()?,
            conn.client_cert_sig_scheme(),
            conn.offered_schemes(),
            out,
        )?;
        conn.set_client_cert_sig_scheme(scheme);
        let checkpoint = Checkpoint {
            scheme,
            message_start,
        };

        let snapshot = match conn.transcript().snapshot(scheme.hash_algorithm()) {
            Ok(snapshot) => snapshot,
            Err(err) => return Err(abort(out, message_start, err)),
        };
        let request = SigningRequest {
            signature_alg: scheme.signature_algorithm(),
            hash_alg: scheme.hash_algorithm(),
            digest: snapshot.into_digest(),
        };

        let started = {
            let (backend, key) = match conn.signing_parts() {
                Ok(parts) => parts,
                Err(err) => return Err(abort(out, message_start, err)),
            };
            self.operation.start(backend, key, request)
        };
        match started {
            Ok(AsyncStatus::Ready) => {
                self.checkpoint = Some(checkpoint);
                self.complete(conn, out, checkpoint)
            }
            Ok(AsyncStatus::Pending) => {
                self.checkpoint = Some(checkpoint);
                Ok(SendOutcome::Pending)
            }
            Err(err) => Err(abort(out, message_start, err)),
        }
    }

    fn resume(
        &mut self,
        conn: &mut Connection,
        out: &mut HandshakeBuffer,
        checkpoint: Checkpoint,
    ) -> Result<SendOutcome> {
        match self.operation.poll(conn.signing_backend_mut()) {
            Ok(AsyncStatus::Ready) => self.complete(conn, out, checkpoint),
            Ok(AsyncStatus::Pending) => Ok(SendOutcome::Pending),
            Err(err) => Err(abort(out, checkpoint.message_start, err)),
        }
    }

    fn complete(
        &mut self,
        conn: &mut Connection,
        out: &mut HandshakeBuffer,
        checkpoint: Checkpoint,
    ) -> Result<SendOutcome> {
        let signature = match self.operation.take_signature() {
            Ok(signature) => signature,
            Err(err) => return Err(abort(out, checkpoint.message_start, err)),
        };
        if signature.len() > u16::MAX as usize {
            return Err(abort(
                out,
                checkpoint.message_start,
                HandshakeError::MalformedMessage(
                    "signature does not fit the 16-bit length prefix",
                ),
            ));
        }

        out.write_u16(signature.len() as u16);
        out.write_bytes(&signature);
        debug!(
            "CertificateVerify serialized with {:?} ({} signature bytes)",
            checkpoint.scheme,
            signature.len()
        );

        conn.update_required_handshake_hashes();
        Ok(SendOutcome::Complete)
    }
}

/// Rolls the outbound buffer back to the message start so a failed send
/// leaves no truncated message behind, and passes the error through.
fn abort(out: &mut HandshakeBuffer, message_start: usize, err: HandshakeError) -> HandshakeError {
    out.rewind_writes_to(message_start);
    err
}
