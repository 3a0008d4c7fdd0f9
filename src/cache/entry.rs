//! 缓存条目结构

use crate::consts::JBOD_BLOCK_SIZE;
use crate::types::{BlockBuf, BlockKey};
use bitflags::bitflags;

bitflags! {
    /// 缓存条目标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CacheFlags: u8 {
        /// 条目有效（槽位已被占用）
        const VALID     = 0x01;
        /// 插入后内容被写路径刷新过
        const REFRESHED = 0x02;
    }
}

/// 缓存条目
///
/// 固定长度表中的一个槽位。只由 [`BlockCache`](super::BlockCache) 修改，
/// 调用者只能拿到内容的副本。
///
/// # 字段说明
///
/// - `key`: (设备, 块)
/// - `data`: 块内容
/// - `last_access`: 最近一次访问时的逻辑时钟值
/// - `flags`: 条目状态标志
#[derive(Clone)]
pub struct CacheEntry {
    pub(super) key: BlockKey,
    pub(super) data: BlockBuf,
    pub(super) last_access: u64,
    pub(super) flags: CacheFlags,
}

impl core::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("last_access", &self.last_access)
            .field("flags", &self.flags)
            .finish()
    }
}

impl CacheEntry {
    /// 创建空槽位
    pub const fn empty() -> Self {
        Self {
            key: BlockKey::new(0, 0),
            data: [0u8; JBOD_BLOCK_SIZE],
            last_access: 0,
            flags: CacheFlags::empty(),
        }
    }

    /// 缓存键
    pub fn key(&self) -> BlockKey {
        self.key
    }

    /// 最近访问的逻辑时间戳
    pub fn last_access(&self) -> u64 {
        self.last_access
    }

    /// 状态标志
    pub fn flags(&self) -> CacheFlags {
        self.flags
    }

    /// 是否有效
    pub fn is_valid(&self) -> bool {
        self.flags.contains(CacheFlags::VALID)
    }

    /// 是否被写路径刷新过
    pub fn is_refreshed(&self) -> bool {
        self.flags.contains(CacheFlags::REFRESHED)
    }

    /// 占用槽位
    pub(super) fn fill(&mut self, key: BlockKey, data: &[u8], stamp: u64) {
        self.key = key;
        self.data.copy_from_slice(data);
        self.last_access = stamp;
        self.flags = CacheFlags::VALID;
    }

    /// 覆盖内容
    pub(super) fn refresh(&mut self, data: &BlockBuf, stamp: u64) {
        self.data = *data;
        self.last_access = stamp;
        self.flags.insert(CacheFlags::REFRESHED);
    }

    /// 记录访问
    pub(super) fn touch(&mut self, stamp: u64) {
        self.last_access = stamp;
    }

    /// 释放槽位
    pub(super) fn clear(&mut self) {
        self.flags = CacheFlags::empty();
    }
}
