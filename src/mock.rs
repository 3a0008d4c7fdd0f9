//! 内存设备阵列模拟器（仅测试使用）
//!
//! 在 [`Transport`] 接口后面模拟远端服务器：解析请求报文、维护磁头位置、
//! 存储块内容并回送响应。可以把每次读写限制为少量字节来覆盖重试循环。

use crate::consts::{HEADER_LEN, JBOD_BLOCK_SIZE, PACKET_LEN_WITH_BLOCK};
use crate::error::Result;
use crate::net::{decode_header, encode_header, Transport};
use crate::types::{BlockBuf, Command, Geometry, Opcode};
use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

/// 失败响应使用的状态码（对应 -1）
const STATUS_FAILED: u16 = 0xFFFF;

struct State {
    geometry: Geometry,
    storage: Vec<u8>,
    mounted: bool,
    device: u32,
    block: u32,
    inbox: Vec<u8>,
    outbox: VecDeque<u8>,
    log: Vec<Opcode>,
    closed: bool,
    corrupt_echo: bool,
    malform_length: bool,
    reject: Option<Command>,
}

impl State {
    fn offset(&self) -> usize {
        (self.device as u64 * self.geometry.device_capacity()
            + self.block as u64 * JBOD_BLOCK_SIZE as u64) as usize
    }

    fn advance(&mut self) {
        self.block += 1;
        if self.block == self.geometry.blocks_per_device {
            self.block = 0;
            self.device += 1;
        }
    }

    /// 处理 inbox 中所有完整的请求
    fn pump(&mut self) {
        while self.inbox.len() >= HEADER_LEN {
            let mut header = [0u8; HEADER_LEN];
            header.copy_from_slice(&self.inbox[..HEADER_LEN]);
            let (len, opcode, _) = decode_header(&header);
            let len = len as usize;
            if self.inbox.len() < len {
                return;
            }
            let mut payload = [0u8; JBOD_BLOCK_SIZE];
            if len == PACKET_LEN_WITH_BLOCK {
                payload.copy_from_slice(&self.inbox[HEADER_LEN..len]);
            }
            self.inbox.drain(..len);
            self.serve(opcode, &payload);
        }
    }

    fn serve(&mut self, opcode: Opcode, payload: &BlockBuf) {
        self.log.push(opcode);

        let command = opcode.command();
        let rejected = command.is_some() && command == self.reject;
        if rejected {
            self.reject = None;
        }

        let mut reply: Option<BlockBuf> = None;
        let ok = !rejected
            && match command {
                Some(Command::Mount) if !self.mounted => {
                    self.mounted = true;
                    true
                }
                Some(Command::Unmount) if self.mounted => {
                    self.mounted = false;
                    true
                }
                Some(Command::SeekToDisk) if self.mounted => {
                    let ok = opcode.device() < self.geometry.num_devices;
                    if ok {
                        self.device = opcode.device();
                    }
                    ok
                }
                Some(Command::SeekToBlock) if self.mounted => {
                    let ok = opcode.block() < self.geometry.blocks_per_device;
                    if ok {
                        self.block = opcode.block();
                    }
                    ok
                }
                Some(Command::ReadBlock) if self.mounted => {
                    let start = self.offset();
                    let mut block = [0u8; JBOD_BLOCK_SIZE];
                    block.copy_from_slice(&self.storage[start..start + JBOD_BLOCK_SIZE]);
                    reply = Some(block);
                    self.advance();
                    true
                }
                Some(Command::WriteBlock) if self.mounted => {
                    let start = self.offset();
                    self.storage[start..start + JBOD_BLOCK_SIZE].copy_from_slice(payload);
                    self.advance();
                    true
                }
                _ => false,
            };

        let echo = if self.corrupt_echo {
            self.corrupt_echo = false;
            Opcode::from_raw(opcode.raw() ^ 1)
        } else {
            opcode
        };
        let status = if ok { 0 } else { STATUS_FAILED };
        let len = if self.malform_length {
            self.malform_length = false;
            HEADER_LEN + 1
        } else if reply.is_some() {
            PACKET_LEN_WITH_BLOCK
        } else {
            HEADER_LEN
        };

        self.outbox.extend(encode_header(len as u16, echo, status));
        if let (Some(block), PACKET_LEN_WITH_BLOCK) = (reply, len) {
            self.outbox.extend(block);
        }
    }
}

/// 模拟的设备阵列，作为传输对象交给 [`Connection`](crate::net::Connection)
pub struct MockJbod {
    state: Rc<RefCell<State>>,
    chunk: usize,
}

/// 检查模拟器内部状态的句柄
#[derive(Clone)]
pub struct MockHandle {
    state: Rc<RefCell<State>>,
}

impl MockJbod {
    /// 默认几何（16 × 256 块）
    pub fn new() -> Self {
        Self::with_geometry(Geometry::default())
    }

    /// 指定几何
    pub fn with_geometry(geometry: Geometry) -> Self {
        let state = State {
            geometry,
            storage: vec![0u8; geometry.total_size() as usize],
            mounted: false,
            device: 0,
            block: 0,
            inbox: Vec::new(),
            outbox: VecDeque::new(),
            log: Vec::new(),
            closed: false,
            corrupt_echo: false,
            malform_length: false,
            reject: None,
        };
        Self {
            state: Rc::new(RefCell::new(state)),
            chunk: usize::MAX,
        }
    }

    /// 每次 read/write 最多传输 `chunk` 字节
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }

    /// 获取检查句柄
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Rc::clone(&self.state),
        }
    }
}

impl Transport for MockJbod {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        let n = buf.len().min(self.chunk).min(state.outbox.len());
        for (dst, src) in buf.iter_mut().zip(state.outbox.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Ok(0);
        }
        let n = buf.len().min(self.chunk);
        state.inbox.extend_from_slice(&buf[..n]);
        state.pump();
        Ok(n)
    }

    fn close(&mut self) -> Result<()> {
        self.state.borrow_mut().closed = true;
        Ok(())
    }
}

impl MockHandle {
    /// 读取存储的块
    pub fn block(&self, device: u32, block: u32) -> BlockBuf {
        let state = self.state.borrow();
        let start = (device as u64 * state.geometry.device_capacity()
            + block as u64 * JBOD_BLOCK_SIZE as u64) as usize;
        let mut out = [0u8; JBOD_BLOCK_SIZE];
        out.copy_from_slice(&state.storage[start..start + JBOD_BLOCK_SIZE]);
        out
    }

    /// 直接在线性地址写入字节（绕过协议）
    pub fn fill(&self, addr: usize, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.storage[addr..addr + bytes.len()].copy_from_slice(bytes);
    }

    /// 直接读取线性地址的字节（绕过协议）
    pub fn bytes(&self, addr: usize, len: usize) -> Vec<u8> {
        self.state.borrow().storage[addr..addr + len].to_vec()
    }

    /// 已处理的请求操作码
    pub fn ops(&self) -> Vec<Opcode> {
        self.state.borrow().log.clone()
    }

    /// 某个命令被请求的次数
    pub fn count(&self, command: Command) -> usize {
        self.state
            .borrow()
            .log
            .iter()
            .filter(|op| op.command() == Some(command))
            .count()
    }

    /// 清空请求记录
    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// 模拟器端是否处于挂载状态
    pub fn is_mounted(&self) -> bool {
        self.state.borrow().mounted
    }

    /// 传输是否已关闭
    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    /// 下一个响应回显错误的操作码
    pub fn corrupt_next_echo(&self) {
        self.state.borrow_mut().corrupt_echo = true;
    }

    /// 下一个响应使用非法长度字段
    pub fn malform_next_length(&self) {
        self.state.borrow_mut().malform_length = true;
    }

    /// 下一个指定命令返回失败状态
    pub fn reject_next(&self, command: Command) {
        self.state.borrow_mut().reject = Some(command);
    }
}
