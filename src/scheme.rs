//! Signature scheme definitions and negotiation.
//!
//! A [`SignatureScheme`] pairs a transcript hash algorithm with a signature
//! algorithm under the IANA identifier used on the wire. Version branching
//! lives here and only here: protocol versions before TLS 1.2 never carry a
//! scheme identifier and fall back to a default derived from the key type,
//! while later versions read or write the 2-byte identifier explicitly.
//! Both the send and receive paths consume the same two entry points.
//!
//! 签名方案的定义与协商。
//!
//! [`SignatureScheme`] 将握手记录哈希算法与签名算法配对，并以线路上
//! 使用的 IANA 标识符标识。版本分支仅存在于此处：TLS 1.2 之前的协议
//! 版本从不携带方案标识符，而是回退到由密钥类型派生的默认方案；之后
//! 的版本则显式读写 2 字节标识符。发送和接收路径使用相同的两个入口。

use crate::buffer::HandshakeBuffer;
use crate::crypto::hash::HashAlgorithm;
use crate::crypto::keys::KeyType;
use crate::error::{HandshakeError, Result};
use log::debug;

/// Negotiated protocol version of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolVersion {
    Tls10,
    Tls11,
    Tls12,
    Tls13,
}

impl ProtocolVersion {
    /// Whether this version carries an explicit scheme identifier in
    /// CertificateVerify. Versions before TLS 1.2 do not.
    pub fn uses_sig_scheme_negotiation(self) -> bool {
        self >= ProtocolVersion::Tls12
    }
}

/// The signature algorithm family of a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    RsaPkcs1,
    RsaPss,
    Ecdsa,
}

impl SignatureAlgorithm {
    /// The key type able to produce or verify signatures of this family.
    pub fn key_type(self) -> KeyType {
        match self {
            SignatureAlgorithm::RsaPkcs1 | SignatureAlgorithm::RsaPss => KeyType::Rsa,
            SignatureAlgorithm::Ecdsa => KeyType::Ecdsa,
        }
    }
}

/// A (hash algorithm, signature algorithm, wire identifier) triple.
///
/// Immutable once chosen for a connection's CertificateVerify step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureScheme {
    iana_id: u16,
    hash_alg: HashAlgorithm,
    signature_alg: SignatureAlgorithm,
}

impl SignatureScheme {
    const fn new(iana_id: u16, hash_alg: HashAlgorithm, signature_alg: SignatureAlgorithm) -> Self {
        Self {
            iana_id,
            hash_alg,
            signature_alg,
        }
    }

    /// Legacy RSA default. The identifier is a sentinel: this scheme exists
    /// only before TLS 1.2, where no identifier is ever written.
    pub const RSA_PKCS1_MD5_SHA1: Self = Self::new(
        0xFFFF,
        HashAlgorithm::Md5Sha1,
        SignatureAlgorithm::RsaPkcs1,
    );
    pub const RSA_PKCS1_SHA1: Self =
        Self::new(0x0201, HashAlgorithm::Sha1, SignatureAlgorithm::RsaPkcs1);
    pub const RSA_PKCS1_SHA224: Self =
        Self::new(0x0301, HashAlgorithm::Sha224, SignatureAlgorithm::RsaPkcs1);
    pub const RSA_PKCS1_SHA256: Self =
        Self::new(0x0401, HashAlgorithm::Sha256, SignatureAlgorithm::RsaPkcs1);
    pub const RSA_PKCS1_SHA384: Self =
        Self::new(0x0501, HashAlgorithm::Sha384, SignatureAlgorithm::RsaPkcs1);
    pub const RSA_PKCS1_SHA512: Self =
        Self::new(0x0601, HashAlgorithm::Sha512, SignatureAlgorithm::RsaPkcs1);
    pub const ECDSA_SHA1: Self =
        Self::new(0x0203, HashAlgorithm::Sha1, SignatureAlgorithm::Ecdsa);
    pub const ECDSA_SHA224: Self =
        Self::new(0x0303, HashAlgorithm::Sha224, SignatureAlgorithm::Ecdsa);
    pub const ECDSA_SHA256: Self =
        Self::new(0x0403, HashAlgorithm::Sha256, SignatureAlgorithm::Ecdsa);
    pub const ECDSA_SHA384: Self =
        Self::new(0x0503, HashAlgorithm::Sha384, SignatureAlgorithm::Ecdsa);
    pub const ECDSA_SHA512: Self =
        Self::new(0x0603, HashAlgorithm::Sha512, SignatureAlgorithm::Ecdsa);
    pub const RSA_PSS_RSAE_SHA256: Self =
        Self::new(0x0804, HashAlgorithm::Sha256, SignatureAlgorithm::RsaPss);
    pub const RSA_PSS_RSAE_SHA384: Self =
        Self::new(0x0805, HashAlgorithm::Sha384, SignatureAlgorithm::RsaPss);
    pub const RSA_PSS_RSAE_SHA512: Self =
        Self::new(0x0806, HashAlgorithm::Sha512, SignatureAlgorithm::RsaPss);

    pub fn iana_id(&self) -> u16 {
        self.iana_id
    }

    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.hash_alg
    }

    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        self.signature_alg
    }
}

/// Deterministic default scheme for versions (or peers) that did not
/// negotiate one, chosen from the protocol version and the key type.
///
/// 对于未协商方案的版本（或对端），根据协议版本和密钥类型确定性地
/// 选择默认方案。
pub fn default_scheme(version: ProtocolVersion, key_type: KeyType) -> Result<SignatureScheme> {
    match (version, key_type) {
        (ProtocolVersion::Tls10 | ProtocolVersion::Tls11, KeyType::Rsa) => {
            Ok(SignatureScheme::RSA_PKCS1_MD5_SHA1)
        }
        (ProtocolVersion::Tls12, KeyType::Rsa) => Ok(SignatureScheme::RSA_PKCS1_SHA1),
        (
            ProtocolVersion::Tls10 | ProtocolVersion::Tls11 | ProtocolVersion::Tls12,
            KeyType::Ecdsa,
        ) => Ok(SignatureScheme::ECDSA_SHA1),
        // TLS 1.3 requires an explicit scheme; there is nothing to default to.
        (ProtocolVersion::Tls13, _) => Err(HandshakeError::Negotiation(
            "no default signature scheme exists for this protocol version",
        )),
    }
}

/// Checks a scheme identifier received from the peer against the set
/// offered earlier in the handshake, and against the peer's key type.
///
/// The key-type check is a deliberate precondition here rather than in the
/// verify primitive, so the receive path never handles an incompatible
/// scheme at all.
///
/// 根据握手早期提供的集合以及对端密钥类型，检查从对端收到的方案
/// 标识符。
pub fn validate_offered(
    iana_id: u16,
    offered: &[SignatureScheme],
    peer_key_type: KeyType,
) -> Result<SignatureScheme> {
    let scheme = offered
        .iter()
        .copied()
        .find(|scheme| scheme.iana_id() == iana_id)
        .ok_or(HandshakeError::Negotiation(
            "received signature scheme is not in the offered set",
        ))?;

    if scheme.signature_algorithm().key_type() != peer_key_type {
        return Err(HandshakeError::Negotiation(
            "received signature scheme does not match the peer key type",
        ));
    }
    Ok(scheme)
}

/// Receive-path negotiation: defaults for legacy versions, otherwise reads
/// and validates the 2-byte identifier from `input`.
pub(crate) fn negotiate_recv(
    version: ProtocolVersion,
    offered: &[SignatureScheme],
    peer_key_type: KeyType,
    input: &mut HandshakeBuffer,
) -> Result<SignatureScheme> {
    if !version.uses_sig_scheme_negotiation() {
        let scheme = default_scheme(version, peer_key_type)?;
        debug!("legacy version, defaulting to {scheme:?}");
        return Ok(scheme);
    }

    let iana_id = input
        .read_u16()
        .map_err(|_| HandshakeError::MalformedMessage("missing signature scheme identifier"))?;
    let scheme = validate_offered(iana_id, offered, peer_key_type)?;
    debug!("peer selected {scheme:?}");
    Ok(scheme)
}

/// Send-path negotiation: defaults for legacy versions (nothing written),
/// otherwise writes the chosen scheme's identifier to `out`. When the
/// driver has not fixed a scheme beforehand, the first offered scheme
/// compatible with the local key is used.
pub(crate) fn negotiate_send(
    version: ProtocolVersion,
    local_key_type: KeyType,
    chosen: Option<SignatureScheme>,
    offered: &[SignatureScheme],
    out: &mut HandshakeBuffer,
) -> Result<SignatureScheme> {
    if !version.uses_sig_scheme_negotiation() {
        let scheme = default_scheme(version, local_key_type)?;
        debug!("legacy version, defaulting to {scheme:?}");
        return Ok(scheme);
    }

    let scheme = match chosen {
        Some(scheme) => scheme,
        None => offered
            .iter()
            .copied()
            .find(|scheme| scheme.signature_algorithm().key_type() == local_key_type)
            .ok_or(HandshakeError::Negotiation(
                "no offered scheme matches the local key type",
            ))?,
    };
    out.write_u16(scheme.iana_id());
    debug!("sending {scheme:?}");
    Ok(scheme)
}
