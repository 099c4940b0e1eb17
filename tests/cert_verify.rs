//! Integration test for the CertificateVerify send/receive step.
//! 对 CertificateVerify 发送/接收步骤的集成测试。

use crest_handshake::buffer::HandshakeBuffer;
use crest_handshake::cert_verify::{self, CertificateVerifySend, SendOutcome};
use crest_handshake::connection::Connection;
use crest_handshake::crypto::hash::HashAlgorithm;
use crest_handshake::crypto::keys::PrivateKey;
use crest_handshake::error::{HandshakeError, Result};
use crest_handshake::scheme::{ProtocolVersion, SignatureScheme};
use crest_handshake::signing::DeferredSigner;
use p256::ecdsa::SigningKey as P256SigningKey;
use rand::rngs::OsRng;
use rsa::RsaPrivateKey;

fn ecdsa_key() -> PrivateKey {
    PrivateKey::EcdsaP256(P256SigningKey::random(&mut OsRng))
}

fn rsa_key() -> PrivateKey {
    PrivateKey::Rsa(RsaPrivateKey::new(&mut OsRng, 2048).unwrap())
}

/// Builds the client (sender) and server (receiver) ends of a connection
/// where the client authenticates with `client_key`.
fn client_and_server(
    version: ProtocolVersion,
    offered: &[SignatureScheme],
    client_key: PrivateKey,
    prf_hash: HashAlgorithm,
) -> Result<(Connection, Connection)> {
    let client_public = client_key.public_key();

    let client = Connection::builder()
        .version(version)
        .offered_schemes(offered.to_vec())
        .peer_public_key(client_public.clone())
        .local_private_key(client_key)
        .prf_hash(prf_hash)
        .build()?;
    let server = Connection::builder()
        .version(version)
        .offered_schemes(offered.to_vec())
        .peer_public_key(client_public)
        .prf_hash(prf_hash)
        .build()?;
    Ok((client, server))
}

/// Feeds the same handshake messages into both transcripts, as the
/// surrounding handshake machine would have by the time CertificateVerify
/// is processed.
fn feed_transcripts(client: &mut Connection, server: &mut Connection) {
    for message in [b"ClientHello".as_ref(), b"ServerHello", b"Certificate"] {
        client.transcript_mut().update(message);
        server.transcript_mut().update(message);
    }
}

#[test]
fn test_ecdsa_round_trip_with_minimization() -> Result<()> {
    // --- 1. Setup: a TLS 1.3 connection with an EC client key ---
    let offered = [SignatureScheme::ECDSA_SHA256];
    let (mut client, mut server) = client_and_server(
        ProtocolVersion::Tls13,
        &offered,
        ecdsa_key(),
        HashAlgorithm::Sha256,
    )?;
    feed_transcripts(&mut client, &mut server);

    // --- 2. Client produces the message ---
    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    assert_eq!(sender.send(&mut client, &mut out)?, SendOutcome::Complete);
    assert_eq!(
        client.client_cert_sig_scheme(),
        Some(SignatureScheme::ECDSA_SHA256)
    );

    // --- 3. Server verifies it ---
    let running_before = server.transcript().current_digest(HashAlgorithm::Sha256)?;
    let mut input = HandshakeBuffer::from_bytes(out.written().to_vec());
    cert_verify::recv(&mut server, &mut input)?;
    assert_eq!(input.remaining(), 0);
    assert_eq!(
        server.client_cert_sig_scheme(),
        Some(SignatureScheme::ECDSA_SHA256)
    );

    // Verification read only a snapshot: the live running hash is
    // byte-identical to its value before the operation.
    let running_after = server.transcript().current_digest(HashAlgorithm::Sha256)?;
    assert_eq!(running_before, running_after);

    // Both ends minimized down to the PRF hash.
    assert_eq!(client.transcript().algorithms(), vec![HashAlgorithm::Sha256]);
    assert_eq!(server.transcript().algorithms(), vec![HashAlgorithm::Sha256]);
    Ok(())
}

#[test]
fn test_rsa_pkcs1_round_trip_tls12() -> Result<()> {
    let offered = [SignatureScheme::RSA_PKCS1_SHA256];
    let (mut client, mut server) = client_and_server(
        ProtocolVersion::Tls12,
        &offered,
        rsa_key(),
        HashAlgorithm::Sha256,
    )?;
    feed_transcripts(&mut client, &mut server);

    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    assert_eq!(sender.send(&mut client, &mut out)?, SendOutcome::Complete);

    let mut input = HandshakeBuffer::from_bytes(out.written().to_vec());
    cert_verify::recv(&mut server, &mut input)?;
    assert_eq!(
        server.client_cert_sig_scheme(),
        Some(SignatureScheme::RSA_PKCS1_SHA256)
    );
    Ok(())
}

#[test]
fn test_rsa_pss_round_trip() -> Result<()> {
    let offered = [SignatureScheme::RSA_PSS_RSAE_SHA384];
    let (mut client, mut server) = client_and_server(
        ProtocolVersion::Tls13,
        &offered,
        rsa_key(),
        HashAlgorithm::Sha384,
    )?;
    feed_transcripts(&mut client, &mut server);

    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    assert_eq!(sender.send(&mut client, &mut out)?, SendOutcome::Complete);

    let mut input = HandshakeBuffer::from_bytes(out.written().to_vec());
    cert_verify::recv(&mut server, &mut input)?;
    assert_eq!(server.transcript().algorithms(), vec![HashAlgorithm::Sha384]);
    Ok(())
}

#[test]
fn test_legacy_version_writes_no_scheme_bytes() -> Result<()> {
    // --- Legacy negotiation: the scheme comes from the key type, and the
    // message starts directly with the signature length ---
    let (mut client, mut server) = client_and_server(
        ProtocolVersion::Tls11,
        &[],
        ecdsa_key(),
        HashAlgorithm::Sha256,
    )?;
    feed_transcripts(&mut client, &mut server);

    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    assert_eq!(sender.send(&mut client, &mut out)?, SendOutcome::Complete);
    assert_eq!(
        client.client_cert_sig_scheme(),
        Some(SignatureScheme::ECDSA_SHA1)
    );

    // First two bytes are the signature length, not a scheme identifier.
    let wire = out.written().to_vec();
    let declared = u16::from_be_bytes([wire[0], wire[1]]) as usize;
    assert_eq!(declared, wire.len() - 2);

    let mut input = HandshakeBuffer::from_bytes(wire);
    cert_verify::recv(&mut server, &mut input)?;
    assert_eq!(
        server.client_cert_sig_scheme(),
        Some(SignatureScheme::ECDSA_SHA1)
    );
    Ok(())
}

#[test]
fn test_legacy_rsa_uses_md5_sha1() -> Result<()> {
    let (mut client, mut server) = client_and_server(
        ProtocolVersion::Tls10,
        &[],
        rsa_key(),
        HashAlgorithm::Sha256,
    )?;
    feed_transcripts(&mut client, &mut server);

    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    assert_eq!(sender.send(&mut client, &mut out)?, SendOutcome::Complete);
    assert_eq!(
        client.client_cert_sig_scheme(),
        Some(SignatureScheme::RSA_PKCS1_MD5_SHA1)
    );

    let mut input = HandshakeBuffer::from_bytes(out.written().to_vec());
    cert_verify::recv(&mut server, &mut input)?;
    Ok(())
}

#[test]
fn test_unoffered_scheme_is_rejected_before_any_processing() -> Result<()> {
    let offered = [SignatureScheme::ECDSA_SHA256];
    let (_, mut server) = client_and_server(
        ProtocolVersion::Tls13,
        &offered,
        ecdsa_key(),
        HashAlgorithm::Sha256,
    )?;
    let hashes_before = server.transcript().algorithms().len();

    // ECDSA-SHA384 was never offered on this connection.
    let mut wire = HandshakeBuffer::new();
    wire.write_u16(SignatureScheme::ECDSA_SHA384.iana_id());
    wire.write_u16(4);
    wire.write_bytes(&[0xde, 0xad, 0xbe, 0xef]);

    let mut input = HandshakeBuffer::from_bytes(wire.written().to_vec());
    let result = cert_verify::recv(&mut server, &mut input);
    assert!(matches!(result, Err(HandshakeError::Negotiation(_))));

    // No signature processing happened: nothing was minimized.
    assert_eq!(server.transcript().algorithms().len(), hashes_before);
    Ok(())
}

#[test]
fn test_truncated_signature_is_rejected_without_consuming() -> Result<()> {
    let offered = [SignatureScheme::ECDSA_SHA256];
    let (_, mut server) = client_and_server(
        ProtocolVersion::Tls13,
        &offered,
        ecdsa_key(),
        HashAlgorithm::Sha256,
    )?;

    // Declares 0x47 signature bytes but delivers only 10.
    let mut wire = HandshakeBuffer::new();
    wire.write_u16(SignatureScheme::ECDSA_SHA256.iana_id());
    wire.write_u16(0x47);
    wire.write_bytes(&[0xaa; 10]);

    let mut input = HandshakeBuffer::from_bytes(wire.written().to_vec());
    let result = cert_verify::recv(&mut server, &mut input);
    assert!(matches!(result, Err(HandshakeError::MalformedMessage(_))));

    // Nothing consumed beyond the length field.
    assert_eq!(input.remaining(), 10);
    Ok(())
}

#[test]
fn test_tampered_signature_fails_verification() -> Result<()> {
    let offered = [SignatureScheme::ECDSA_SHA256];
    let (mut client, mut server) = client_and_server(
        ProtocolVersion::Tls13,
        &offered,
        ecdsa_key(),
        HashAlgorithm::Sha256,
    )?;
    feed_transcripts(&mut client, &mut server);

    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    assert_eq!(sender.send(&mut client, &mut out)?, SendOutcome::Complete);

    // Flip the last signature byte.
    let mut wire = out.written().to_vec();
    *wire.last_mut().unwrap() ^= 0x01;

    let hashes_before = server.transcript().algorithms().len();
    let mut input = HandshakeBuffer::from_bytes(wire);
    let result = cert_verify::recv(&mut server, &mut input);
    assert!(matches!(result, Err(HandshakeError::VerificationFailure)));

    // A rejected proof must not trigger minimization.
    assert_eq!(server.transcript().algorithms().len(), hashes_before);
    Ok(())
}

#[test]
fn test_async_send_suspends_then_resumes() -> Result<()> {
    // --- 1. Setup: client signing through a backend that suspends ---
    let offered = [SignatureScheme::ECDSA_SHA256];
    let client_key = ecdsa_key();
    let client_public = client_key.public_key();

    let mut client = Connection::builder()
        .version(ProtocolVersion::Tls13)
        .offered_schemes(offered.to_vec())
        .peer_public_key(client_public.clone())
        .local_private_key(client_key)
        .signing_backend(DeferredSigner::new(2))
        .build()?;
    let mut server = Connection::builder()
        .version(ProtocolVersion::Tls13)
        .offered_schemes(offered.to_vec())
        .peer_public_key(client_public)
        .build()?;
    feed_transcripts(&mut client, &mut server);

    // --- 2. Drive the send step until the backend completes ---
    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();

    let mut suspensions = 0;
    loop {
        match sender.send(&mut client, &mut out)? {
            SendOutcome::Complete => break,
            SendOutcome::Pending => {
                suspensions += 1;
                // While suspended, only the scheme identifier has been
                // serialized; the signature is not yet on the wire.
                assert_eq!(out.written().len(), 2);
                assert!(suspensions < 10, "signing operation never completed");
            }
        }
    }
    assert!(suspensions > 0, "deferred backend should have suspended");

    // --- 3. The resumed message verifies like a synchronous one ---
    let mut input = HandshakeBuffer::from_bytes(out.written().to_vec());
    cert_verify::recv(&mut server, &mut input)?;
    assert_eq!(input.remaining(), 0);
    Ok(())
}

#[test]
fn test_send_without_private_key_is_rejected() -> Result<()> {
    let key = ecdsa_key();
    let mut client = Connection::builder()
        .version(ProtocolVersion::Tls13)
        .offered_schemes(vec![SignatureScheme::ECDSA_SHA256])
        .peer_public_key(key.public_key())
        .build()?;
    client.transcript_mut().update(b"messages");

    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    let result = sender.send(&mut client, &mut out);
    assert!(matches!(result, Err(HandshakeError::ComponentMissing(_))));
    // Nothing may be left in the outbound buffer after a failed send.
    assert!(out.written().is_empty());
    Ok(())
}

#[test]
fn test_send_with_no_compatible_offered_scheme_fails() -> Result<()> {
    // Offered set only contains RSA schemes, but the client key is EC.
    let key = ecdsa_key();
    let mut client = Connection::builder()
        .version(ProtocolVersion::Tls13)
        .offered_schemes(vec![SignatureScheme::RSA_PSS_RSAE_SHA256])
        .peer_public_key(key.public_key())
        .local_private_key(key)
        .build()?;
    client.transcript_mut().update(b"messages");

    let mut out = HandshakeBuffer::new();
    let mut sender = CertificateVerifySend::new();
    let result = sender.send(&mut client, &mut out);
    assert!(matches!(result, Err(HandshakeError::Negotiation(_))));
    assert!(out.written().is_empty());
    Ok(())
}
