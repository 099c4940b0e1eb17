//! Public and private key material and the digest-based sign/verify
//! primitives.
//!
//! This module centralizes the signature logic so that the send and receive
//! paths of the handshake use exactly the same algorithm dispatch. All
//! operations are computed over an already-finalized transcript digest, not
//! over the raw message bytes.
//!
//! 公钥和私钥材料以及基于摘要的签名/验证原语。
//!
//! 该模块集中了签名逻辑，使握手的发送和接收路径使用完全相同的算法
//! 分发。所有操作都在已最终确定的握手记录摘要上计算，而不是在原始
//! 消息字节上。

use crate::crypto::hash::HashAlgorithm;
use crate::error::{HandshakeError, Result};
use crate::scheme::SignatureAlgorithm;
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{
    Signature as P256Signature, SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey,
};
use p384::ecdsa::{
    Signature as P384Signature, SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey,
};
use rand::rngs::OsRng;
use rsa::{Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};

/// The broad key category a certificate carries, used when choosing default
/// schemes and when checking scheme/key compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Rsa,
    Ecdsa,
}

/// A peer's public key, extracted from its certificate by the caller.
#[derive(Debug, Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
    EcdsaP384(P384VerifyingKey),
}

/// A local private key matching the certificate this endpoint presented.
#[derive(Debug, Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKey),
    EcdsaP256(P256SigningKey),
    EcdsaP384(P384SigningKey),
}

impl PublicKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Rsa(_) => KeyType::Rsa,
            PublicKey::EcdsaP256(_) | PublicKey::EcdsaP384(_) => KeyType::Ecdsa,
        }
    }

    /// Verifies `signature` over a transcript `digest`.
    ///
    /// Any mismatch, including an undecodable signature encoding, is
    /// reported as [`HandshakeError::VerificationFailure`].
    ///
    /// 验证握手记录摘要 `digest` 上的 `signature`。
    ///
    /// 任何不匹配（包括无法解码的签名编码）都报告为
    /// [`HandshakeError::VerificationFailure`]。
    pub fn verify(
        &self,
        signature_alg: SignatureAlgorithm,
        hash_alg: HashAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<()> {
        match (self, signature_alg) {
            (PublicKey::Rsa(key), SignatureAlgorithm::RsaPkcs1) => key
                .verify(pkcs1_padding(hash_alg), digest, signature)
                .map_err(|_| HandshakeError::VerificationFailure),
            (PublicKey::Rsa(key), SignatureAlgorithm::RsaPss) => key
                .verify(pss_padding(hash_alg)?, digest, signature)
                .map_err(|_| HandshakeError::VerificationFailure),
            (PublicKey::EcdsaP256(key), SignatureAlgorithm::Ecdsa) => {
                let signature = P256Signature::from_der(signature)
                    .map_err(|_| HandshakeError::VerificationFailure)?;
                key.verify_prehash(digest, &signature)
                    .map_err(|_| HandshakeError::VerificationFailure)
            }
            (PublicKey::EcdsaP384(key), SignatureAlgorithm::Ecdsa) => {
                let signature = P384Signature::from_der(signature)
                    .map_err(|_| HandshakeError::VerificationFailure)?;
                key.verify_prehash(digest, &signature)
                    .map_err(|_| HandshakeError::VerificationFailure)
            }
            _ => Err(HandshakeError::Negotiation(
                "signature algorithm is incompatible with the peer key type",
            )),
        }
    }
}

impl PrivateKey {
    pub fn key_type(&self) -> KeyType {
        match self {
            PrivateKey::Rsa(_) => KeyType::Rsa,
            PrivateKey::EcdsaP256(_) | PrivateKey::EcdsaP384(_) => KeyType::Ecdsa,
        }
    }

    /// The public half of this key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            PrivateKey::EcdsaP256(key) => PublicKey::EcdsaP256(*key.verifying_key()),
            PrivateKey::EcdsaP384(key) => PublicKey::EcdsaP384(*key.verifying_key()),
        }
    }

    /// Signs a transcript `digest`, returning the wire encoding of the
    /// signature (PKCS#1/PSS block for RSA, ASN.1 DER for ECDSA).
    ///
    /// 对握手记录摘要 `digest` 进行签名，返回签名的线路编码
    /// （RSA 为 PKCS#1/PSS 块，ECDSA 为 ASN.1 DER）。
    pub fn sign(
        &self,
        signature_alg: SignatureAlgorithm,
        hash_alg: HashAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>> {
        match (self, signature_alg) {
            (PrivateKey::Rsa(key), SignatureAlgorithm::RsaPkcs1) => key
                .sign(pkcs1_padding(hash_alg), digest)
                .map_err(|e| HandshakeError::AsyncOperation(e.to_string())),
            (PrivateKey::Rsa(key), SignatureAlgorithm::RsaPss) => key
                .sign_with_rng(&mut OsRng, pss_padding(hash_alg)?, digest)
                .map_err(|e| HandshakeError::AsyncOperation(e.to_string())),
            (PrivateKey::EcdsaP256(key), SignatureAlgorithm::Ecdsa) => {
                let signature: P256Signature = key
                    .sign_prehash(digest)
                    .map_err(|e| HandshakeError::AsyncOperation(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            (PrivateKey::EcdsaP384(key), SignatureAlgorithm::Ecdsa) => {
                let signature: P384Signature = key
                    .sign_prehash(digest)
                    .map_err(|e| HandshakeError::AsyncOperation(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
            _ => Err(HandshakeError::Negotiation(
                "signature algorithm is incompatible with the local key type",
            )),
        }
    }
}

/// PKCS#1 v1.5 padding for a given digest. The MD5||SHA-1 form carries no
/// DigestInfo prefix, per the pre-TLS1.2 signature format.
fn pkcs1_padding(hash_alg: HashAlgorithm) -> Pkcs1v15Sign {
    match hash_alg {
        HashAlgorithm::Md5Sha1 => Pkcs1v15Sign::new_unprefixed(),
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
        HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

/// PSS padding for a given digest. RSA-PSS schemes only exist for the SHA-2
/// family, so anything else is a negotiation bug.
fn pss_padding(hash_alg: HashAlgorithm) -> Result<Pss> {
    match hash_alg {
        HashAlgorithm::Sha256 => Ok(Pss::new::<Sha256>()),
        HashAlgorithm::Sha384 => Ok(Pss::new::<Sha384>()),
        HashAlgorithm::Sha512 => Ok(Pss::new::<Sha512>()),
        _ => Err(HandshakeError::Negotiation(
            "RSA-PSS requires a SHA-2 digest",
        )),
    }
}
