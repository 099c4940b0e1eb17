use crate::buffer::HandshakeBuffer;
use crate::connection::Connection;
use crate::error::{HandshakeError, Result};
use crate::scheme;
use log::{debug, warn};

/// Processes a received CertificateVerify message.
///
/// This performs the server-side half of the proof of possession:
/// 1. Negotiates or validates the signature scheme, depending on version.
/// 2. Reads the length-prefixed signature from `input`.
/// 3. Takes an isolated snapshot of the transcript hash the scheme binds,
///    so finalizing the digest cannot disturb the running state that the
///    Finished message still needs.
/// 4. Verifies the signature over the snapshot digest with the peer key.
/// 5. On success, prunes transcript hash algorithms no longer required.
///
/// 处理收到的 CertificateVerify 消息。
///
/// 这执行密钥持有证明的服务器端部分：
/// 1. 根据版本协商或验证签名方案。
/// 2. 从 `input` 读取带长度前缀的签名。
/// 3. 对方案所绑定的握手记录哈希做独立快照，使最终确定摘要不会扰动
///    Finished 消息仍然需要的运行状态。
/// 4. 用对端公钥验证快照摘要上的签名。
/// 5. 成功后，裁剪不再需要的握手记录哈希算法。
pub fn recv(conn: &mut Connection, input: &mut HandshakeBuffer) -> Result<()> {
    let scheme = scheme::negotiate_recv(
        conn.version(),
        conn.offered_schemes(),
        conn.peer_public_key().key_type(),
        input,
    )?;
    conn.set_client_cert_sig_scheme(scheme);

    let signature_len = input
        .read_u16()
        .map_err(|_| HandshakeError::MalformedMessage("missing signature length"))?;
    let signature = input.read_bytes(signature_len as usize)?;

    let snapshot = conn.transcript().snapshot(scheme.hash_algorithm())?;
    let digest = snapshot.into_digest();

    if let Err(err) = conn.peer_public_key().verify(
        scheme.signature_algorithm(),
        scheme.hash_algorithm(),
        &digest,
        signature,
    ) {
        // Security-critical rejection: surfaced as-is, never retried.
        warn!("CertificateVerify signature rejected: {err}");
        return Err(err);
    }
    debug!("client certificate verified with {scheme:?}");

    // The possession proof is committed; later messages only need the
    // remaining required hashes.
    conn.update_required_handshake_hashes();
    Ok(())
}
