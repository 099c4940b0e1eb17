//! Processing and generation of the CertificateVerify handshake message.
//!
//! This is the step by which a client proves possession of the private key
//! matching the certificate it presented: a signature over the handshake
//! transcript digest, checked by the server against the client's public
//! key.
//!
//! Wire format, inside the handshake message body:
//!
//! ```text
//! TLS < 1.2:  signature_length: u16 || signature[signature_length]
//! TLS >= 1.2: scheme_id: u16 || signature_length: u16 || signature[signature_length]
//! ```
//!
//! 对 CertificateVerify 握手消息的处理和生成。
//!
//! 客户端通过这一步证明其持有与所出示证书匹配的私钥：对握手记录
//! 摘要的签名，由服务器根据客户端公钥进行校验。

mod recv;
mod send;

pub use recv::recv;
pub use send::{CertificateVerifySend, SendOutcome};
