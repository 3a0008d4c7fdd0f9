//! 线性地址驱动实现

use crate::{
    block::JbodClient,
    cache::BlockCache,
    consts::{JBOD_BLOCK_SIZE, MAX_IO_LEN},
    error::{Error, ErrorKind, Result},
    net::{Connection, Transport},
    types::{BlockBuf, BlockKey, Geometry},
};
use alloc::vec;

use super::types::DriverConfig;

/// 线性地址存储驱动
///
/// 把设备阵列呈现为一段连续的字节空间：地址被分解为 (设备, 块, 偏移)，
/// 读请求按块经过缓存获取，写请求对每个块做读-改-写。
///
/// # 示例
///
/// ```rust,ignore
/// use mdadm_core::{Connection, DriverConfig, Mdadm};
///
/// let conn = Connection::connect(("127.0.0.1", 3333))?;
/// let mut array = Mdadm::new(conn, DriverConfig::default().with_cache(1024))?;
///
/// array.mount()?;
/// array.write(250, b"hello, jbod")?;
///
/// let mut buf = [0u8; 11];
/// array.read(250, &mut buf)?;
/// array.report_hit_rate();
/// array.unmount()?;
/// ```
pub struct Mdadm<T: Transport> {
    client: JbodClient<T>,
    cache: BlockCache,
    config: DriverConfig,
}

impl<T: Transport> Mdadm<T> {
    /// 在已建立的连接上创建驱动
    ///
    /// 校验几何；`config.cache_entries` 有值时同时启用缓存
    pub fn new(conn: Connection<T>, config: DriverConfig) -> Result<Self> {
        config.geometry.validate()?;
        if config.max_io_len == 0 || config.max_io_len > MAX_IO_LEN {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Per-call I/O limit must be within 1..=MAX_IO_LEN",
            ));
        }

        let mut cache = BlockCache::new(config.geometry);
        if let Some(entries) = config.cache_entries {
            cache.enable(entries)?;
        }

        Ok(Self {
            client: JbodClient::new(conn),
            cache,
            config,
        })
    }

    /// 挂载阵列
    pub fn mount(&mut self) -> Result<()> {
        self.client.mount()
    }

    /// 卸载阵列
    pub fn unmount(&mut self) -> Result<()> {
        self.client.unmount()
    }

    /// 是否已挂载
    pub fn is_mounted(&self) -> bool {
        self.client.is_mounted()
    }

    /// 检查读写前置条件
    fn check_request(&self, addr: u64, len: usize) -> Result<()> {
        if !self.client.is_mounted() {
            return Err(Error::new(ErrorKind::InvalidState, "Array is not mounted"));
        }
        if len > self.config.max_io_len {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Request length exceeds the per-call limit",
            ));
        }
        if !self.config.geometry.contains_range(addr, len) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Request exceeds the array address space",
            ));
        }
        Ok(())
    }

    /// 获取一个块：seek，查缓存，未命中时读设备并填充缓存
    fn fetch_block(&mut self, key: BlockKey) -> Result<BlockBuf> {
        self.client.seek(key.device, key.block)?;

        if let Some(block) = self.cache.lookup(key.device, key.block) {
            return Ok(block);
        }

        let mut block = [0u8; JBOD_BLOCK_SIZE];
        self.client.read_block(&mut block)?;
        if self.cache.is_enabled() {
            self.cache.insert(key.device, key.block, &block)?;
        }
        Ok(block)
    }

    /// 从线性地址 `addr` 读取 `buf.len()` 字节
    ///
    /// # 返回
    ///
    /// 成功返回读取的字节数
    ///
    /// # 错误
    ///
    /// - 未挂载：`InvalidState`
    /// - 超出地址空间或长度超过上限：`InvalidInput`
    /// - 任何块获取失败都会中止整个请求
    pub fn read(&mut self, addr: u64, buf: &mut [u8]) -> Result<usize> {
        let len = buf.len();
        self.check_request(addr, len)?;
        if len == 0 {
            return Ok(0);
        }

        let geometry = self.config.geometry;
        let start = geometry.locate(addr);
        let block_count = (start.offset + len + JBOD_BLOCK_SIZE - 1) / JBOD_BLOCK_SIZE;
        log::debug!(
            "[MDADM] read addr={:#x} len={} -> ({}, {}) +{} over {} blocks",
            addr,
            len,
            start.device,
            start.block,
            start.offset,
            block_count
        );

        let mut scratch = vec![0u8; block_count * JBOD_BLOCK_SIZE];
        let mut key = start.key();
        for chunk in scratch.chunks_exact_mut(JBOD_BLOCK_SIZE) {
            let block = self.fetch_block(key)?;
            chunk.copy_from_slice(&block);
            key = geometry.next(key);
        }

        buf.copy_from_slice(&scratch[start.offset..start.offset + len]);
        Ok(len)
    }

    /// 向线性地址 `addr` 写入 `buf`
    ///
    /// 每个块做读-改-写。块的当前内容优先取自缓存；未命中时直接读设备，
    /// 且不把这个即将被覆盖的块放入缓存。写入后只刷新已缓存的块。
    /// 设备写入失败时丢弃该块的缓存条目，请求在此中止。
    ///
    /// # 返回
    ///
    /// 成功返回写入的字节数
    pub fn write(&mut self, addr: u64, buf: &[u8]) -> Result<usize> {
        let len = buf.len();
        self.check_request(addr, len)?;
        if len == 0 {
            return Ok(0);
        }

        let geometry = self.config.geometry;
        log::debug!("[MDADM] write addr={:#x} len={}", addr, len);

        let mut done = 0;
        while done < len {
            let at = geometry.locate(addr + done as u64);
            let n = (JBOD_BLOCK_SIZE - at.offset).min(len - done);

            self.client.seek(at.device, at.block)?;
            let mut block = match self.cache.lookup(at.device, at.block) {
                Some(block) => block,
                None => {
                    let mut block = [0u8; JBOD_BLOCK_SIZE];
                    self.client.read_block(&mut block)?;
                    block
                }
            };

            block[at.offset..at.offset + n].copy_from_slice(&buf[done..done + n]);
            self.cache.update(at.device, at.block, &block);

            // 读块之后远端磁头位置不保证不变，写之前重新定位
            let stored = self
                .client
                .seek(at.device, at.block)
                .and_then(|_| self.client.write_block(&block));
            if let Err(err) = stored {
                // 设备未确认写入，缓存里的新内容不能再被读到
                if self.cache.invalidate(at.device, at.block) {
                    log::debug!(
                        "[MDADM] dropped cached ({}, {}) after failed write",
                        at.device,
                        at.block
                    );
                }
                return Err(err);
            }

            done += n;
        }

        Ok(len)
    }

    // ===== 缓存管理接口 =====

    /// 启用缓存
    pub fn cache_enable(&mut self, capacity: usize) -> Result<()> {
        self.cache.enable(capacity)
    }

    /// 禁用缓存
    pub fn cache_disable(&mut self) -> Result<()> {
        self.cache.disable()
    }

    /// 缓存是否已启用
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// 输出缓存命中率，没有查询时返回 None
    pub fn report_hit_rate(&self) -> Option<f64> {
        self.cache.report_hit_rate()
    }

    /// 获取缓存的引用
    pub fn cache(&self) -> &BlockCache {
        &self.cache
    }

    // ===== 其他访问接口 =====

    /// 获取设备阵列客户端的引用
    pub fn client(&self) -> &JbodClient<T> {
        &self.client
    }

    /// 阵列几何
    pub fn geometry(&self) -> Geometry {
        self.config.geometry
    }

    /// 驱动配置
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 取回连接（不卸载、不关闭）
    pub fn into_connection(self) -> Connection<T> {
        self.client.into_connection()
    }

    /// 关闭驱动
    ///
    /// 已挂载时先卸载，然后断开连接
    pub fn shutdown(mut self) -> Result<()> {
        if self.client.is_mounted() {
            self.client.unmount()?;
        }
        self.client.into_connection().disconnect()
    }
}
