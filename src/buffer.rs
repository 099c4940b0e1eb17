//! The sequential read/write buffer used for handshake message I/O.
//!
//! Integers are big-endian, as everywhere in the TLS wire format. Reads
//! consume from a cursor and fail without consuming anything when fewer
//! bytes remain than requested; writes append. A write mark taken before a
//! message is serialized can be rewound to, so a failed send never leaves a
//! truncated message behind.
//!
//! 用于握手消息 I/O 的顺序读写缓冲区。
//!
//! 整数采用大端序，与 TLS 线路格式一致。读取从游标消费数据，当剩余
//! 字节不足时会失败且不消费任何数据；写入则追加数据。在序列化消息之
//! 前获取的写入标记可以被回退，因此失败的发送永远不会留下截断的消息。

use crate::error::{HandshakeError, Result};

#[derive(Debug, Default, Clone)]
pub struct HandshakeBuffer {
    data: Vec<u8>,
    read_pos: usize,
}

impl HandshakeBuffer {
    /// Creates an empty buffer, ready for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer over received bytes, ready for reading.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, read_pos: 0 }
    }

    /// Number of unread bytes remaining.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.read_pos
    }

    /// All bytes written so far, including any already read.
    pub fn written(&self) -> &[u8] {
        &self.data
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Reads exactly `len` bytes, or fails consuming nothing.
    ///
    /// 精确读取 `len` 个字节，失败时不消费任何数据。
    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        if self.remaining() < len {
            return Err(HandshakeError::MalformedMessage(
                "fewer bytes available than declared",
            ));
        }
        let start = self.read_pos;
        self.read_pos += len;
        Ok(&self.data[start..self.read_pos])
    }

    pub fn write_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Current write position, usable with [`Self::rewind_writes_to`].
    pub fn write_mark(&self) -> usize {
        self.data.len()
    }

    /// Discards everything written after `mark`.
    ///
    /// Invariant: `mark` must come from [`Self::write_mark`] on this buffer.
    pub fn rewind_writes_to(&mut self, mark: usize) {
        debug_assert!(mark <= self.data.len());
        self.data.truncate(mark);
        self.read_pos = self.read_pos.min(self.data.len());
    }
}
