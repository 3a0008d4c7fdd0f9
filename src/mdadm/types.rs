//! 驱动配置

use crate::consts::MAX_IO_LEN;
use crate::types::Geometry;

/// 驱动配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// 设备阵列几何
    pub geometry: Geometry,
    /// 创建时启用的缓存条目数（None 表示不启用缓存）
    pub cache_entries: Option<usize>,
    /// 单次读写的最大字节数，取值 1..=[`MAX_IO_LEN`]，由 `Mdadm::new` 校验
    pub max_io_len: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            cache_entries: None,
            max_io_len: MAX_IO_LEN,
        }
    }
}

impl DriverConfig {
    /// 设置缓存条目数
    pub fn with_cache(mut self, entries: usize) -> Self {
        self.cache_entries = Some(entries);
        self
    }

    /// 设置阵列几何
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = geometry;
        self
    }
}
