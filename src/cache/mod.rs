//! 块缓存模块
//!
//! 位于地址转换层和设备阵列客户端之间的单级块缓存。
//!
//! # 主要组件
//!
//! - [`CacheEntry`] - 固定长度表中的一个槽位
//! - [`BlockCache`] - 块缓存管理器，使用 lru crate 维护访问顺序
//! - [`CacheFlags`] - 条目状态标志
//! - [`CacheStats`] - 缓存统计信息
//!
//! # 设计原理
//!
//! 条目存放在固定长度的表中（容量 2..=4096，启用时确定），
//! `lru::LruCache<BlockKey, usize>` 作为键到槽位的索引，同时维护访问顺序：
//!
//! 1. **查找**：O(1)，命中时把条目移到最近使用端
//! 2. **插入**：优先使用下标最小的空槽位；表满时 `pop_lru` 取出最久未访问的槽位
//! 3. **时间戳**：每个条目仍记录逻辑时钟，供统计和调试
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use mdadm_core::{cache::BlockCache, Geometry};
//!
//! let mut cache = BlockCache::new(Geometry::default());
//! cache.enable(1024)?;
//!
//! if cache.lookup(0, 3).is_none() {
//!     let block = fetch_from_device(0, 3)?;
//!     cache.insert(0, 3, &block)?;
//! }
//!
//! cache.report_hit_rate();
//! cache.disable()?;
//! ```

mod block_cache;
mod entry;

pub use block_cache::{BlockCache, CacheStats};
pub use entry::{CacheEntry, CacheFlags};
