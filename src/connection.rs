//! Connection state referenced by the CertificateVerify step.
//!
//! The step borrows a [`Connection`] for the duration of one message-
//! processing call: the negotiated protocol version, the scheme set offered
//! earlier in the handshake, the peer's public key, the optional local
//! signing key and backend, and the live transcript hashes. Nothing in this
//! crate retains a reference beyond the call.
//!
//! CertificateVerify 步骤所引用的连接状态。
//!
//! 该步骤在一次消息处理调用期间借用 [`Connection`]：协商的协议版本、
//! 握手早期提供的方案集合、对端公钥、可选的本地签名密钥和后端，以及
//! 运行中的握手记录哈希。本 crate 中没有任何内容在调用之后保留引用。

use crate::crypto::hash::HashAlgorithm;
use crate::crypto::keys::{PrivateKey, PublicKey};
use crate::error::{HandshakeError, Result};
use crate::scheme::{ProtocolVersion, SignatureScheme};
use crate::signing::{LocalSigner, SigningBackend};
use crate::transcript::TranscriptHashes;

pub struct Connection {
    version: ProtocolVersion,
    offered_schemes: Vec<SignatureScheme>,
    peer_public_key: PublicKey,
    local_private_key: Option<PrivateKey>,
    signing_backend: Box<dyn SigningBackend>,
    transcript: TranscriptHashes,
    /// The hash later handshake messages (Finished, key derivation) still
    /// need once the proof of possession is committed.
    prf_hash: HashAlgorithm,
    /// The scheme chosen for this connection's CertificateVerify, cached so
    /// negotiation happens once per message.
    client_cert_sig_scheme: Option<SignatureScheme>,
}

impl Connection {
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn offered_schemes(&self) -> &[SignatureScheme] {
        &self.offered_schemes
    }

    pub fn peer_public_key(&self) -> &PublicKey {
        &self.peer_public_key
    }

    pub fn transcript(&self) -> &TranscriptHashes {
        &self.transcript
    }

    /// The transcript-update path for the surrounding handshake machine;
    /// the CertificateVerify step itself only ever reads snapshots.
    pub fn transcript_mut(&mut self) -> &mut TranscriptHashes {
        &mut self.transcript
    }

    pub fn client_cert_sig_scheme(&self) -> Option<SignatureScheme> {
        self.client_cert_sig_scheme
    }

    /// Fixes the scheme ahead of the send path, as a driver that already
    /// negotiated one during CertificateRequest processing would.
    pub fn set_client_cert_sig_scheme(&mut self, scheme: SignatureScheme) {
        self.client_cert_sig_scheme = Some(scheme);
    }

    pub(crate) fn local_key_type(&self) -> Result<crate::crypto::keys::KeyType> {
        self.local_private_key
            .as_ref()
            .map(PrivateKey::key_type)
            .ok_or(HandshakeError::ComponentMissing("local private key"))
    }

    /// The signing backend alone, for polling a suspended operation.
    pub(crate) fn signing_backend_mut(&mut self) -> &mut dyn SigningBackend {
        self.signing_backend.as_mut()
    }

    /// Splits out the backend and key the signing operation needs.
    pub(crate) fn signing_parts(&mut self) -> Result<(&mut dyn SigningBackend, &PrivateKey)> {
        let key = self
            .local_private_key
            .as_ref()
            .ok_or(HandshakeError::ComponentMissing("local private key"))?;
        Ok((self.signing_backend.as_mut(), key))
    }

    /// Discards transcript hash states no longer required by later
    /// handshake messages. Both the send and receive paths call this once
    /// the peer-key-possession proof is committed.
    ///
    /// 丢弃后续握手消息不再需要的握手记录哈希状态。发送和接收路径在
    /// 对端密钥持有证明确定之后都会调用此方法。
    pub fn update_required_handshake_hashes(&mut self) {
        self.transcript.retain_only(&[self.prf_hash]);
    }
}

/// A builder for creating a [`Connection`].
///
/// This builder ensures that all required fields are provided before
/// constructing the connection.
///
/// 用于创建 [`Connection`] 的构建器。
///
/// 此构建器确保在构造连接之前提供了所有必需的字段。
#[derive(Default)]
pub struct ConnectionBuilder {
    version: Option<ProtocolVersion>,
    offered_schemes: Vec<SignatureScheme>,
    peer_public_key: Option<PublicKey>,
    local_private_key: Option<PrivateKey>,
    signing_backend: Option<Box<dyn SigningBackend>>,
    prf_hash: Option<HashAlgorithm>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the negotiated protocol version. Required.
    pub fn version(mut self, version: ProtocolVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the signature schemes offered/accepted earlier in the
    /// handshake. May stay empty for legacy-version connections.
    pub fn offered_schemes(mut self, schemes: Vec<SignatureScheme>) -> Self {
        self.offered_schemes = schemes;
        self
    }

    /// Sets the peer's public key, extracted from its certificate. Required.
    ///
    /// 设置从对端证书中提取的公钥。必需。
    pub fn peer_public_key(mut self, key: PublicKey) -> Self {
        self.peer_public_key = Some(key);
        self
    }

    /// Sets the local private key used by the send path.
    pub fn local_private_key(mut self, key: PrivateKey) -> Self {
        self.local_private_key = Some(key);
        self
    }

    /// Replaces the default synchronous signer with another backend, e.g.
    /// one that offloads to hardware.
    pub fn signing_backend(mut self, backend: impl SigningBackend + 'static) -> Self {
        self.signing_backend = Some(Box::new(backend));
        self
    }

    /// Sets the hash algorithm later handshake messages still require.
    /// Defaults to SHA-256.
    pub fn prf_hash(mut self, algorithm: HashAlgorithm) -> Self {
        self.prf_hash = Some(algorithm);
        self
    }

    /// Builds the [`Connection`], with every supported transcript hash
    /// running until minimization prunes them.
    ///
    /// Returns an error if any required fields are missing.
    ///
    /// 构建 [`Connection`]，所有受支持的握手记录哈希都会运行，直到
    /// 最小化将它们裁剪掉。
    ///
    /// 如果任何必需字段缺失，则返回错误。
    pub fn build(self) -> Result<Connection> {
        let version = self
            .version
            .ok_or(HandshakeError::BuilderMissingField("version"))?;
        let peer_public_key = self
            .peer_public_key
            .ok_or(HandshakeError::BuilderMissingField("peer_public_key"))?;

        Ok(Connection {
            version,
            offered_schemes: self.offered_schemes,
            peer_public_key,
            local_private_key: self.local_private_key,
            signing_backend: self
                .signing_backend
                .unwrap_or_else(|| Box::new(LocalSigner)),
            transcript: TranscriptHashes::with_all_algorithms(),
            prf_hash: self.prf_hash.unwrap_or(HashAlgorithm::Sha256),
            client_cert_sig_scheme: None,
        })
    }
}
