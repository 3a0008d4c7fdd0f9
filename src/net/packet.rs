//! 报文编解码
//!
//! 报文格式（所有多字节整数均为大端）：
//!
//! ```text
//! offset  size  field
//! 0       2     总长度（8 或 8+256）
//! 2       4     操作码字
//! 6       2     状态码（请求中为 0）
//! 8       256   块负载，仅当总长度为 264 时存在
//! ```

use super::transport::{read_full, write_full, Transport};
use crate::consts::{HEADER_LEN, JBOD_BLOCK_SIZE, PACKET_LEN_WITH_BLOCK};
use crate::error::{Error, ErrorKind, Result};
use crate::types::{BlockBuf, Opcode};
use byteorder::{BigEndian, ByteOrder};

/// 解码后的报文头
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    /// 回显的操作码
    pub opcode: Opcode,
    /// 状态码，0 表示成功
    pub status: u16,
    /// 是否附带块负载
    pub has_block: bool,
}

impl Response {
    /// 远端是否报告成功
    pub fn is_ok(&self) -> bool {
        self.status == 0
    }
}

/// 编码报文头
pub fn encode_header(len: u16, opcode: Opcode, status: u16) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    BigEndian::write_u16(&mut header[0..2], len);
    BigEndian::write_u32(&mut header[2..6], opcode.raw());
    BigEndian::write_u16(&mut header[6..8], status);
    header
}

/// 解码报文头，返回 (长度, 操作码, 状态码)
pub fn decode_header(header: &[u8; HEADER_LEN]) -> (u16, Opcode, u16) {
    (
        BigEndian::read_u16(&header[0..2]),
        Opcode::from_raw(BigEndian::read_u32(&header[2..6])),
        BigEndian::read_u16(&header[6..8]),
    )
}

/// 发送一个请求报文
///
/// 只有写块命令附带块负载；写块命令缺少负载时返回 `InvalidInput`，
/// 其他命令即使给了 `block` 也不会发送。
pub fn send_packet<T: Transport + ?Sized>(
    transport: &mut T,
    opcode: Opcode,
    block: Option<&BlockBuf>,
) -> Result<()> {
    let mut packet = [0u8; PACKET_LEN_WITH_BLOCK];

    let len = if opcode.carries_block() {
        let block = block.ok_or(Error::new(
            ErrorKind::InvalidInput,
            "Write block request without a block payload",
        ))?;
        packet[HEADER_LEN..].copy_from_slice(block);
        PACKET_LEN_WITH_BLOCK
    } else {
        HEADER_LEN
    };

    packet[..HEADER_LEN].copy_from_slice(&encode_header(len as u16, opcode, 0));

    log::trace!("[NET] send op={:#010x} len={}", opcode.raw(), len);
    write_full(transport, &packet[..len])
}

/// 接收一个响应报文
///
/// 若响应带块负载，写入 `block`；调用者未提供缓冲区时负载被读出并丢弃，
/// 以保持字节流同步。长度字段既不是 8 也不是 264 时返回 `Protocol` 错误。
pub fn recv_packet<T: Transport + ?Sized>(
    transport: &mut T,
    block: Option<&mut BlockBuf>,
) -> Result<Response> {
    let mut header = [0u8; HEADER_LEN];
    read_full(transport, &mut header)?;

    let (len, opcode, status) = decode_header(&header);
    log::trace!("[NET] recv op={:#010x} len={} status={}", opcode.raw(), len, status);

    let has_block = match len as usize {
        HEADER_LEN => false,
        PACKET_LEN_WITH_BLOCK => true,
        _ => {
            log::warn!("[NET] malformed response length {}", len);
            return Err(Error::new(
                ErrorKind::Protocol,
                "Response length field is neither header nor header plus block",
            ));
        }
    };

    if has_block {
        match block {
            Some(buf) => read_full(transport, buf)?,
            None => {
                let mut discard = [0u8; JBOD_BLOCK_SIZE];
                read_full(transport, &mut discard)?;
            }
        }
    }

    Ok(Response {
        opcode,
        status,
        has_block,
    })
}
