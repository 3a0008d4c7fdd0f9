//! 设备阵列客户端核心类型

use crate::error::{Error, ErrorKind, Result};
use crate::net::{Connection, Response, Transport};
use crate::types::{BlockBuf, Command, Opcode};

/// 设备阵列客户端
///
/// 把 mount、unmount、seek、读块、写块编码成操作码字，每个操作通过
/// [`Connection`] 交换一个报文。远端是有状态的：读块和写块作用于当前磁头位置，
/// 所以每次读写前都必须先 [`seek`](Self::seek)。
///
/// # 并发使用
///
/// JbodClient 本身不包含内部锁，在单线程环境中可以直接使用。
/// 对于多线程环境，用户应该在外层加锁：
///
/// ```rust,ignore
/// use std::sync::{Arc, Mutex};
///
/// let client = Arc::new(Mutex::new(JbodClient::new(conn)));
/// ```
pub struct JbodClient<T: Transport> {
    /// 到远端的连接
    conn: Connection<T>,
    /// 会话是否已挂载
    mounted: bool,
    /// 操作次数（所有命令）
    op_count: u64,
    /// seek 次数（每次 seek 两个报文）
    seek_count: u64,
    /// 物理读块次数
    physical_read_count: u64,
    /// 物理写块次数
    physical_write_count: u64,
}

impl<T: Transport> JbodClient<T> {
    /// 在已建立的连接上创建客户端（未挂载）
    pub fn new(conn: Connection<T>) -> Self {
        Self {
            conn,
            mounted: false,
            op_count: 0,
            seek_count: 0,
            physical_read_count: 0,
            physical_write_count: 0,
        }
    }

    /// 交换一个操作，状态码非零时返回 `Rejected`
    fn operation(&mut self, opcode: Opcode, block: Option<&mut BlockBuf>) -> Result<Response> {
        self.op_count += 1;
        let response = self.conn.exchange(opcode, block)?;
        if !response.is_ok() {
            log::warn!(
                "[JBOD] op {:?} ({:#010x}) rejected with status {:#06x}",
                opcode.command(),
                opcode.raw(),
                response.status
            );
            return Err(Error::new(
                ErrorKind::Rejected,
                "Device array rejected the operation",
            ));
        }
        Ok(response)
    }

    /// 挂载阵列
    ///
    /// 已挂载时返回 `InvalidState`；远端拒绝时保持未挂载
    pub fn mount(&mut self) -> Result<()> {
        if self.mounted {
            return Err(Error::new(ErrorKind::InvalidState, "Already mounted"));
        }
        self.operation(Opcode::encode(Command::Mount, 0, 0), None)?;
        self.mounted = true;
        log::debug!("[JBOD] mounted");
        Ok(())
    }

    /// 卸载阵列
    pub fn unmount(&mut self) -> Result<()> {
        if !self.mounted {
            return Err(Error::new(ErrorKind::InvalidState, "Not mounted"));
        }
        self.operation(Opcode::encode(Command::Unmount, 0, 0), None)?;
        self.mounted = false;
        log::debug!("[JBOD] unmounted");
        Ok(())
    }

    /// 会话是否已挂载
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// 把远端磁头移动到 (设备, 块)
    ///
    /// 两次独立的往返：先 seek 到设备，再 seek 到块
    pub fn seek(&mut self, device: u32, block: u32) -> Result<()> {
        self.seek_count += 1;
        self.operation(Opcode::encode(Command::SeekToDisk, device, 0), None)?;
        self.operation(Opcode::encode(Command::SeekToBlock, 0, block), None)?;
        Ok(())
    }

    /// 读取当前磁头位置的块
    pub fn read_block(&mut self, buf: &mut BlockBuf) -> Result<()> {
        self.physical_read_count += 1;
        let response = self.operation(Opcode::encode(Command::ReadBlock, 0, 0), Some(buf))?;
        if !response.has_block {
            return Err(Error::new(
                ErrorKind::Protocol,
                "Read block response carries no block",
            ));
        }
        Ok(())
    }

    /// 写入当前磁头位置的块
    pub fn write_block(&mut self, buf: &BlockBuf) -> Result<()> {
        self.physical_write_count += 1;
        // 写块响应可能回显负载，使用副本接收以免覆盖调用者数据
        let mut scratch = *buf;
        self.operation(Opcode::encode(Command::WriteBlock, 0, 0), Some(&mut scratch))?;
        Ok(())
    }

    /// 获取操作次数（所有命令）
    pub fn op_count(&self) -> u64 {
        self.op_count
    }

    /// 获取 seek 次数
    pub fn seek_count(&self) -> u64 {
        self.seek_count
    }

    /// 获取物理读块次数
    pub fn physical_read_count(&self) -> u64 {
        self.physical_read_count
    }

    /// 获取物理写块次数
    pub fn physical_write_count(&self) -> u64 {
        self.physical_write_count
    }

    /// 获取连接的引用
    pub fn connection(&self) -> &Connection<T> {
        &self.conn
    }

    /// 获取连接的可变引用
    pub fn connection_mut(&mut self) -> &mut Connection<T> {
        &mut self.conn
    }

    /// 取回连接
    pub fn into_connection(self) -> Connection<T> {
        self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::JBOD_BLOCK_SIZE;
    use crate::mock::{MockHandle, MockJbod};
    use alloc::vec;

    fn client() -> (JbodClient<MockJbod>, MockHandle) {
        let mock = MockJbod::new();
        let handle = mock.handle();
        (JbodClient::new(Connection::new(mock)), handle)
    }

    #[test]
    fn test_mount_unmount_session() {
        let (mut c, h) = client();
        assert!(!c.is_mounted());
        assert_eq!(c.unmount().unwrap_err().kind(), ErrorKind::InvalidState);

        c.mount().unwrap();
        assert!(c.is_mounted());
        assert!(h.is_mounted());
        assert_eq!(c.mount().unwrap_err().kind(), ErrorKind::InvalidState);

        c.unmount().unwrap();
        assert!(!c.is_mounted());
        assert!(!h.is_mounted());
        // 失败的调用没有发送报文
        assert_eq!(h.ops().len(), 2);
    }

    #[test]
    fn test_rejected_mount_stays_unmounted() {
        let (mut c, h) = client();
        h.reject_next(Command::Mount);
        assert_eq!(c.mount().unwrap_err().kind(), ErrorKind::Rejected);
        assert!(!c.is_mounted());
        c.mount().unwrap();
        assert!(c.is_mounted());
    }

    #[test]
    fn test_seek_is_two_round_trips() {
        let (mut c, h) = client();
        c.mount().unwrap();
        h.clear_log();

        c.seek(3, 77).unwrap();
        assert_eq!(
            h.ops(),
            vec![
                Opcode::encode(Command::SeekToDisk, 3, 0),
                Opcode::encode(Command::SeekToBlock, 0, 77),
            ]
        );
        assert_eq!(c.seek_count(), 1);
    }

    #[test]
    fn test_write_then_read_block() {
        let (mut c, h) = client();
        c.mount().unwrap();

        let mut data = [0u8; JBOD_BLOCK_SIZE];
        data.iter_mut().enumerate().for_each(|(i, b)| *b = i as u8);
        c.seek(2, 9).unwrap();
        c.write_block(&data).unwrap();
        assert_eq!(h.block(2, 9), data);

        let mut back = [0u8; JBOD_BLOCK_SIZE];
        c.seek(2, 9).unwrap();
        c.read_block(&mut back).unwrap();
        assert_eq!(back, data);
        assert_eq!(c.physical_read_count(), 1);
        assert_eq!(c.physical_write_count(), 1);
    }

    #[test]
    fn test_operations_require_remote_mount() {
        let (mut c, _h) = client();
        let err = c.seek(0, 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
    }

    #[test]
    fn test_read_block_without_payload_is_protocol_error() {
        let (mut c, h) = client();
        c.mount().unwrap();
        h.reject_next(Command::ReadBlock);
        let mut buf = [0u8; JBOD_BLOCK_SIZE];
        // 被拒绝的读块先报告状态
        assert_eq!(c.read_block(&mut buf).unwrap_err().kind(), ErrorKind::Rejected);

        h.malform_next_length();
        assert_eq!(c.read_block(&mut buf).unwrap_err().kind(), ErrorKind::Protocol);
    }
}
