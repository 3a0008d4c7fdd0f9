//! 块缓存实现
//!
//! 固定长度的条目表 + `lru::LruCache` 最近使用索引。
//!
//! # 架构
//!
//! ```text
//! struct BlockCache {
//!     table: Option<Table>,   // None 表示缓存未启用
//!     clock: u64,             // 逻辑时钟，每次访问加 1
//!     stats: CacheStats,      // 累计查询/命中
//! }
//!
//! struct Table {
//!     entries: Vec<CacheEntry>,            // 固定长度槽位，按插入位置排列
//!     index: LruCache<BlockKey, usize>,    // 键 -> 槽位，同时维护访问顺序
//! }
//! ```
//!
//! 每次访问都盖上唯一的时钟值，所以 LRU 链表尾部的条目就是
//! `last_access` 最小的条目，驱逐结果与按时间戳线性扫描完全一致。

use crate::{
    consts::{CACHE_MAX_ENTRIES, CACHE_MIN_ENTRIES, JBOD_BLOCK_SIZE},
    error::{Error, ErrorKind, Result},
    types::{BlockBuf, BlockKey, Geometry},
};

use super::entry::CacheEntry;
use alloc::vec;
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use lru::LruCache;

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// 查询次数（lookup）
    pub queries: u64,
    /// 命中次数
    pub hits: u64,
    /// 成功插入次数
    pub inserts: u64,
    /// 驱逐次数
    pub evictions: u64,
    /// 写路径刷新次数
    pub updates: u64,
}

impl CacheStats {
    /// 命中率（百分比），没有查询时返回 None
    pub fn hit_rate(&self) -> Option<f64> {
        if self.queries == 0 {
            None
        } else {
            Some(100.0 * self.hits as f64 / self.queries as f64)
        }
    }
}

struct Table {
    entries: Vec<CacheEntry>,
    index: LruCache<BlockKey, usize>,
}

/// 块缓存
///
/// 位于地址转换层和设备阵列客户端之间，以 (设备, 块) 为键缓存 256 字节的块。
///
/// # 生命周期
///
/// - 创建后处于禁用状态，[`enable`](Self::enable) 分配条目表
/// - 禁用时 `lookup` 总是未命中、`insert` 失败、`update` 什么都不做
/// - 统计信息在整个 `BlockCache` 生命周期内累计，跨越禁用/启用
///
/// # 示例
///
/// ```rust,ignore
/// let mut cache = BlockCache::new(Geometry::default());
/// cache.enable(2)?;
/// cache.insert(0, 0, &block_a)?;
/// assert_eq!(cache.lookup(0, 0), Some(block_a));
/// cache.report_hit_rate();
/// ```
pub struct BlockCache {
    geometry: Geometry,
    table: Option<Table>,
    clock: u64,
    stats: CacheStats,
}

impl BlockCache {
    /// 创建（禁用状态的）块缓存
    ///
    /// `geometry` 决定哪些 (设备, 块) 可以被插入
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            table: None,
            clock: 0,
            stats: CacheStats::default(),
        }
    }

    /// 启用缓存
    ///
    /// # 错误
    ///
    /// - 已启用：`InvalidState`
    /// - 容量不在 [2, 4096]：`InvalidInput`
    pub fn enable(&mut self, capacity: usize) -> Result<()> {
        if self.table.is_some() {
            return Err(Error::new(ErrorKind::InvalidState, "Cache is already enabled"));
        }
        if !(CACHE_MIN_ENTRIES..=CACHE_MAX_ENTRIES).contains(&capacity) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Cache capacity must be between 2 and 4096 entries",
            ));
        }
        let cap = NonZeroUsize::new(capacity)
            .ok_or(Error::new(ErrorKind::InvalidInput, "Cache capacity is zero"))?;

        self.table = Some(Table {
            entries: vec![CacheEntry::empty(); capacity],
            index: LruCache::new(cap),
        });
        log::debug!("[CACHE] enabled with {} entries", capacity);
        Ok(())
    }

    /// 禁用缓存并释放所有条目
    pub fn disable(&mut self) -> Result<()> {
        match self.table.take() {
            Some(table) => {
                log::debug!(
                    "[CACHE] disabled, dropping {}/{} entries",
                    table.index.len(),
                    table.entries.len()
                );
                Ok(())
            }
            None => Err(Error::new(ErrorKind::InvalidState, "Cache is not enabled")),
        }
    }

    /// 是否已启用
    pub fn is_enabled(&self) -> bool {
        self.table.is_some()
    }

    fn tick(&mut self) -> u64 {
        let stamp = self.clock;
        self.clock += 1;
        stamp
    }

    /// 查找块
    ///
    /// 命中时复制内容、记录访问时间并计入命中和查询；未命中只计入查询。
    /// 两种情况都推进逻辑时钟。缓存禁用时直接返回 None，不做任何统计。
    pub fn lookup(&mut self, device: u32, block: u32) -> Option<BlockBuf> {
        let key = BlockKey::new(device, block);
        let slot = match self.table.as_mut() {
            Some(table) => table.index.get(&key).copied(),
            None => return None,
        };

        let stamp = self.tick();
        self.stats.queries += 1;

        let slot = match slot {
            Some(slot) => slot,
            None => {
                log::trace!("[CACHE] lookup ({}, {}) MISS", device, block);
                return None;
            }
        };

        self.stats.hits += 1;
        log::trace!("[CACHE] lookup ({}, {}) HIT slot={}", device, block, slot);
        let table = self.table.as_mut()?;
        let entry = &mut table.entries[slot];
        entry.touch(stamp);
        Some(entry.data)
    }

    /// 刷新已缓存块的内容
    ///
    /// 块不在缓存中或缓存禁用时什么都不做。不计入查询/命中。
    pub fn update(&mut self, device: u32, block: u32, data: &BlockBuf) {
        let key = BlockKey::new(device, block);
        let slot = match self.table.as_mut().and_then(|t| t.index.get(&key).copied()) {
            Some(slot) => slot,
            None => return,
        };

        let stamp = self.tick();
        self.stats.updates += 1;
        if let Some(table) = self.table.as_mut() {
            table.entries[slot].refresh(data, stamp);
        }
        log::trace!("[CACHE] update ({}, {}) slot={}", device, block, slot);
    }

    /// 插入块
    ///
    /// 有空槽位时使用下标最小的空槽位，否则驱逐最久未访问的条目。
    /// 重复检查不影响时钟和统计。
    ///
    /// # 错误
    ///
    /// - 缓存禁用：`InvalidState`
    /// - `data` 不是一个完整块：`InvalidInput`
    /// - (设备, 块) 超出阵列几何：`InvalidInput`
    /// - 块已在缓存中：`AlreadyExists`
    pub fn insert(&mut self, device: u32, block: u32, data: &[u8]) -> Result<()> {
        let key = BlockKey::new(device, block);

        if self.table.is_none() {
            return Err(Error::new(ErrorKind::InvalidState, "Cache is not enabled"));
        }
        if data.len() != JBOD_BLOCK_SIZE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Cache content must be exactly one block",
            ));
        }
        if !self.geometry.contains(key) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Block is outside the device array",
            ));
        }
        if self.contains(device, block) {
            return Err(Error::new(ErrorKind::AlreadyExists, "Block is already cached"));
        }

        let stamp = self.tick();
        let table = self
            .table
            .as_mut()
            .ok_or(Error::new(ErrorKind::InvalidState, "Cache is not enabled"))?;

        let slot = if table.index.len() < table.entries.len() {
            table
                .entries
                .iter()
                .position(|e| !e.is_valid())
                .ok_or(Error::new(ErrorKind::InvalidState, "Cache table has no free slot"))?
        } else {
            let (victim, slot) = table
                .index
                .pop_lru()
                .ok_or(Error::new(ErrorKind::InvalidState, "Cache table is empty"))?;
            log::debug!(
                "[CACHE] evict ({}, {}) slot={} last_access={} refreshed={}",
                victim.device,
                victim.block,
                slot,
                table.entries[slot].last_access(),
                table.entries[slot].is_refreshed()
            );
            self.stats.evictions += 1;
            slot
        };

        table.entries[slot].fill(key, data, stamp);
        table.index.put(key, slot);
        self.stats.inserts += 1;
        log::trace!("[CACHE] insert ({}, {}) slot={}", device, block, slot);
        Ok(())
    }

    /// 块是否在缓存中（不影响时钟、LRU 顺序和统计）
    pub fn contains(&self, device: u32, block: u32) -> bool {
        self.table
            .as_ref()
            .map_or(false, |t| t.index.contains(&BlockKey::new(device, block)))
    }

    /// 使块失效
    ///
    /// # 返回
    ///
    /// 块原本在缓存中时返回 true
    pub fn invalidate(&mut self, device: u32, block: u32) -> bool {
        let table = match self.table.as_mut() {
            Some(table) => table,
            None => return false,
        };
        match table.index.pop(&BlockKey::new(device, block)) {
            Some(slot) => {
                table.entries[slot].clear();
                true
            }
            None => false,
        }
    }

    /// 块最近一次访问的逻辑时间戳
    pub fn last_access(&self, device: u32, block: u32) -> Option<u64> {
        let table = self.table.as_ref()?;
        let slot = *table.index.peek(&BlockKey::new(device, block))?;
        Some(table.entries[slot].last_access())
    }

    /// 输出命中率
    ///
    /// # 返回
    ///
    /// 命中率百分比；还没有任何查询时返回 None
    pub fn report_hit_rate(&self) -> Option<f64> {
        match self.stats.hit_rate() {
            Some(rate) => {
                log::info!("Hit rate: {:5.1}%", rate);
                Some(rate)
            }
            None => {
                log::info!("Hit rate: n/a (no cache queries)");
                None
            }
        }
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// 清零统计信息
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    /// 当前逻辑时钟
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// 缓存容量（禁用时为 0）
    pub fn capacity(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.entries.len())
    }

    /// 当前有效条目数量
    pub fn len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| t.index.len())
    }

    /// 插入后被写路径刷新过的有效条目数
    pub fn refreshed_len(&self) -> usize {
        self.table.as_ref().map_or(0, |t| {
            t.entries
                .iter()
                .filter(|e| e.is_valid() && e.is_refreshed())
                .count()
        })
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 阵列几何
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// 按槽位顺序遍历有效条目
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.table
            .iter()
            .flat_map(|t| t.entries.iter())
            .filter(|e| e.is_valid())
    }
}

impl core::fmt::Debug for BlockCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BlockCache")
            .field("enabled", &self.is_enabled())
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .field("refreshed", &self.refreshed_len())
            .field("clock", &self.clock)
            .field("stats", &self.stats)
            .finish()
    }
}
