//! 解码表面与后备存储.
//!
//! 解码表面以竞技场 (arena) 方式集中存放在 [`SurfacePool`] 中,
//! 帧存储槽位只保存 [`StorageHandle`] 索引, 不持有指针.
//!
//! 存储分配、显示状态查询与存储回收属于外部协作方, 通过
//! [`SurfaceResolver`] / [`SurfaceAllocator`] 两个 trait 抽象.
//! `SurfacePool` 是它们的内存实现, 供测试、基准与回放工具使用.

use std::collections::HashMap;
use std::fmt;

use bitflags::bitflags;
use log::debug;
use tao_core::{PixelFormat, TaoError, TaoResult};

/// 图像标识符 (对标 `VASurfaceID`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u32);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 表面对象句柄, 即表面在竞技场中的索引
///
/// 句柄存在不代表后备存储已分配, 需通过 [`SurfaceResolver::has_storage`] 判断.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StorageHandle(usize);

impl StorageHandle {
    /// 竞技场索引
    pub fn index(&self) -> usize {
        self.0
    }
}

bitflags! {
    /// 表面状态标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        /// 正被 DPB 用作参考帧
        const REFERENCED = 1 << 0;
        /// 已完成显示输出
        const DISPLAYED  = 1 << 1;
    }
}

/// 表面解析器
pub trait SurfaceResolver {
    /// 查找图像对象, 不检查后备存储
    fn lookup(&self, id: SurfaceId) -> Option<StorageHandle>;

    /// 图像对象是否已有后备存储
    fn has_storage(&self, handle: StorageHandle) -> bool;

    /// 将图像标识解析为存储句柄
    ///
    /// 未知标识或尚未分配存储的标识返回 `None`.
    fn resolve(&self, id: SurfaceId) -> Option<StorageHandle> {
        self.lookup(id).filter(|handle| self.has_storage(*handle))
    }
}

/// 存储分配器
///
/// 在解析能力之上提供存储分配、显示状态查询与回收.
pub trait SurfaceAllocator: SurfaceResolver {
    /// 确保图像对象拥有可用于解码的后备存储
    ///
    /// `format` 为期望的输出格式, 实际存储格式由实现决定.
    fn ensure_storage(&mut self, handle: StorageHandle, format: PixelFormat) -> TaoResult<()>;

    /// 图像是否仍在等待显示输出
    fn is_pending_display(&self, handle: StorageHandle) -> bool;

    /// 回收后备存储
    fn reclaim_storage(&mut self, handle: StorageHandle);

    /// 设置/清除参考帧标记
    fn set_referenced(&mut self, handle: StorageHandle, referenced: bool);

    /// 图像对象即将作为渲染目标解码新内容
    ///
    /// 清除上一次内容留下的参考与显示标记, 新内容在显示前不可被回收.
    fn begin_render(&mut self, handle: StorageHandle);
}

/// 解码表面
#[derive(Debug, Clone)]
pub struct Surface {
    /// 图像标识
    pub id: SurfaceId,
    /// 宽度 (像素)
    pub width: u32,
    /// 高度 (像素)
    pub height: u32,
    /// 后备存储格式 (无存储时为 `PixelFormat::None`)
    pub format: PixelFormat,
    /// 状态标志
    pub flags: SurfaceFlags,
    /// 后备存储
    storage: Option<Vec<u8>>,
}

impl Surface {
    /// 后备存储内容
    pub fn storage(&self) -> Option<&[u8]> {
        self.storage.as_deref()
    }
}

/// 内存表面池
#[derive(Debug, Default)]
pub struct SurfacePool {
    /// 表面竞技场, 下标即 `StorageHandle`
    surfaces: Vec<Surface>,
    /// 标识到句柄的映射
    index: HashMap<SurfaceId, StorageHandle>,
    /// 下一个可分配的标识
    next_id: u32,
    /// 存储总量上限 (字节), `None` 表示不限
    memory_limit: Option<usize>,
    /// 当前已分配的存储字节数
    allocated_bytes: usize,
}

impl SurfacePool {
    /// 创建空的表面池
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带存储上限的表面池
    pub fn with_memory_limit(limit: usize) -> Self {
        Self {
            memory_limit: Some(limit),
            ..Self::default()
        }
    }

    /// 创建一个尚未分配后备存储的表面
    pub fn create_surface(&mut self, width: u32, height: u32) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.insert_surface(id, width, height);
        id
    }

    /// 以指定标识注册表面 (用于回放外部场景)
    ///
    /// 标识已存在时返回已有句柄, 不修改原表面.
    pub fn insert_surface(&mut self, id: SurfaceId, width: u32, height: u32) -> StorageHandle {
        if let Some(handle) = self.index.get(&id) {
            return *handle;
        }
        let handle = StorageHandle(self.surfaces.len());
        self.surfaces.push(Surface {
            id,
            width,
            height,
            format: PixelFormat::None,
            flags: SurfaceFlags::empty(),
            storage: None,
        });
        self.index.insert(id, handle);
        self.next_id = self.next_id.max(id.0.saturating_add(1));
        handle
    }

    /// 创建表面并立即分配 NV12 存储
    pub fn create_surface_with_storage(&mut self, width: u32, height: u32) -> TaoResult<SurfaceId> {
        let id = self.create_surface(width, height);
        let handle = self
            .lookup(id)
            .ok_or_else(|| TaoError::Internal(format!("新建表面 {id} 未注册")))?;
        self.ensure_storage(handle, PixelFormat::Nv12)?;
        Ok(id)
    }

    /// 按句柄获取表面
    pub fn surface(&self, handle: StorageHandle) -> Option<&Surface> {
        self.surfaces.get(handle.0)
    }

    /// 按标识获取表面
    pub fn surface_by_id(&self, id: SurfaceId) -> Option<&Surface> {
        self.lookup(id).and_then(|handle| self.surface(handle))
    }

    /// 设置显示状态 (由显示路径调用)
    pub fn set_displayed(&mut self, id: SurfaceId, displayed: bool) {
        if let Some(surface) = self
            .index
            .get(&id)
            .and_then(|handle| self.surfaces.get_mut(handle.0))
        {
            surface.flags.set(SurfaceFlags::DISPLAYED, displayed);
        }
    }

    /// 当前已分配的存储字节数
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// 拥有后备存储的表面数量
    pub fn live_storage_count(&self) -> usize {
        self.surfaces.iter().filter(|s| s.storage.is_some()).count()
    }

    fn release(&mut self, handle: StorageHandle) {
        if let Some(surface) = self.surfaces.get_mut(handle.0) {
            if let Some(buf) = surface.storage.take() {
                self.allocated_bytes = self.allocated_bytes.saturating_sub(buf.len());
            }
            surface.format = PixelFormat::None;
        }
    }
}

impl SurfaceResolver for SurfacePool {
    fn lookup(&self, id: SurfaceId) -> Option<StorageHandle> {
        self.index.get(&id).copied()
    }

    fn has_storage(&self, handle: StorageHandle) -> bool {
        self.surfaces
            .get(handle.0)
            .is_some_and(|surface| surface.storage.is_some())
    }
}

impl SurfaceAllocator for SurfacePool {
    fn ensure_storage(&mut self, handle: StorageHandle, format: PixelFormat) -> TaoResult<()> {
        let (id, width, height, current) = match self.surfaces.get(handle.0) {
            Some(s) => (s.id, s.width, s.height, s.format),
            None => {
                return Err(TaoError::InvalidParameter(format!(
                    "无效的表面句柄: {}",
                    handle.0
                )));
            }
        };

        // 硬件表面统一使用 NV12, 灰度通过伪造色度平面实现
        let hw_format = PixelFormat::Nv12;
        if !self.has_storage(handle) || current != hw_format {
            self.release(handle);
            let size = hw_format.frame_size(width, height).ok_or_else(|| {
                TaoError::AllocationFailed(format!("表面 {id} 尺寸无效: {width}x{height}"))
            })?;
            let total = self.allocated_bytes.checked_add(size).ok_or_else(|| {
                TaoError::AllocationFailed(format!("表面 {id} 需要 {size} 字节, 总量溢出"))
            })?;
            if let Some(limit) = self.memory_limit {
                if total > limit {
                    return Err(TaoError::AllocationFailed(format!(
                        "表面 {id} 需要 {size} 字节, 已用 {}/{limit}",
                        self.allocated_bytes
                    )));
                }
            }
            let mut buf = Vec::new();
            buf.try_reserve_exact(size).map_err(|e| {
                TaoError::AllocationFailed(format!("表面 {id} 需要 {size} 字节: {e}"))
            })?;
            buf.resize(size, 0u8);
            let surface = &mut self.surfaces[handle.0];
            surface.storage = Some(buf);
            surface.format = hw_format;
            self.allocated_bytes = total;
            debug!("表面 {id}: 分配 {hw_format} 存储, {size} 字节");
        }

        if format == PixelFormat::Gray8 {
            let surface = &mut self.surfaces[handle.0];
            let luma = hw_format.luma_size(width, height).unwrap_or(0);
            if let Some(buf) = surface.storage.as_mut() {
                buf[luma..].fill(0x80);
            }
        }
        Ok(())
    }

    fn is_pending_display(&self, handle: StorageHandle) -> bool {
        self.surfaces
            .get(handle.0)
            .is_some_and(|surface| !surface.flags.contains(SurfaceFlags::DISPLAYED))
    }

    fn reclaim_storage(&mut self, handle: StorageHandle) {
        self.release(handle);
        if let Some(surface) = self.surfaces.get_mut(handle.0) {
            surface.flags.remove(SurfaceFlags::REFERENCED | SurfaceFlags::DISPLAYED);
            debug!("表面 {}: 回收后备存储", surface.id);
        }
    }

    fn set_referenced(&mut self, handle: StorageHandle, referenced: bool) {
        if let Some(surface) = self.surfaces.get_mut(handle.0) {
            surface.flags.set(SurfaceFlags::REFERENCED, referenced);
        }
    }

    fn begin_render(&mut self, handle: StorageHandle) {
        if let Some(surface) = self.surfaces.get_mut(handle.0) {
            surface.flags.remove(SurfaceFlags::REFERENCED | SurfaceFlags::DISPLAYED);
        }
    }
}
