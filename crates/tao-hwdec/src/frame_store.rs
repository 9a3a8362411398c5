//! 硬件帧存储槽位表.
//!
//! 固定 16 个槽位, 每个解码上下文独占一张. 槽位号 (`slot_index`) 是编码进
//! 硬件参考表的值, 在槽位被占用期间保持不变.

use std::fmt;

use crate::surface::{StorageHandle, SurfaceId};

/// 槽位数量
pub const MAX_SLOTS: usize = 16;

/// 一个帧存储槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStoreSlot {
    /// 绑定的图像, `None` 表示空闲
    pub picture_id: Option<SurfaceId>,
    /// 硬件可见的槽位号
    pub slot_index: Option<u8>,
    /// 图像的表面对象
    pub storage: Option<StorageHandle>,
}

impl FrameStoreSlot {
    /// 空闲槽位
    pub const FREE: Self = Self {
        picture_id: None,
        slot_index: None,
        storage: None,
    };

    pub fn is_free(&self) -> bool {
        self.picture_id.is_none()
    }

    pub fn is_occupied(&self) -> bool {
        !self.is_free()
    }
}

/// 帧存储槽位表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameStoreTable {
    slots: [FrameStoreSlot; MAX_SLOTS],
}

impl Default for FrameStoreTable {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStoreTable {
    /// 创建全部空闲的槽位表
    pub fn new() -> Self {
        Self {
            slots: [FrameStoreSlot::FREE; MAX_SLOTS],
        }
    }

    pub fn slots(&self) -> &[FrameStoreSlot; MAX_SLOTS] {
        &self.slots
    }

    pub fn get(&self, position: usize) -> Option<&FrameStoreSlot> {
        self.slots.get(position)
    }

    /// 查找绑定了指定图像的已占用槽位
    pub fn find(&self, picture_id: SurfaceId) -> Option<(usize, &FrameStoreSlot)> {
        self.slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.picture_id == Some(picture_id))
    }

    pub fn contains(&self, picture_id: SurfaceId) -> bool {
        self.find(picture_id).is_some()
    }

    /// 编号最小的空闲槽位
    pub fn first_free(&self) -> Option<usize> {
        self.slots.iter().position(FrameStoreSlot::is_free)
    }

    /// 已占用槽位数
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_occupied()).count()
    }

    /// 在指定位置绑定图像, 槽位号等于位置
    pub fn bind(&mut self, position: usize, picture_id: SurfaceId, storage: StorageHandle) {
        self.slots[position] = FrameStoreSlot {
            picture_id: Some(picture_id),
            slot_index: Some(position as u8),
            storage: Some(storage),
        };
    }

    /// 整体覆盖一个槽位 (用于重建时的复制填充)
    pub fn set(&mut self, position: usize, slot: FrameStoreSlot) {
        self.slots[position] = slot;
    }

    /// 释放槽位
    pub fn clear(&mut self, position: usize) {
        self.slots[position] = FrameStoreSlot::FREE;
    }

    /// 释放所有槽位
    pub fn reset(&mut self) {
        self.slots = [FrameStoreSlot::FREE; MAX_SLOTS];
    }

    /// 已占用槽位是否两两绑定不同图像
    pub fn has_unique_pictures(&self) -> bool {
        let occupied: Vec<SurfaceId> = self.slots.iter().filter_map(|s| s.picture_id).collect();
        occupied
            .iter()
            .enumerate()
            .all(|(i, id)| !occupied[i + 1..].contains(id))
    }
}

impl fmt::Display for FrameStoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, slot) in self.slots.iter().enumerate() {
            match (slot.picture_id, slot.slot_index) {
                (Some(id), Some(index)) => writeln!(f, "[{position:2}] {id} -> fs{index}")?,
                (Some(id), None) => writeln!(f, "[{position:2}] {id} -> fs?")?,
                _ => writeln!(f, "[{position:2}] -")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{SurfacePool, SurfaceResolver};

    fn handles(n: usize) -> (SurfacePool, Vec<(SurfaceId, StorageHandle)>) {
        let mut pool = SurfacePool::new();
        let items = (0..n)
            .map(|_| {
                let id = pool.create_surface(16, 16);
                let handle = pool.lookup(id).unwrap();
                (id, handle)
            })
            .collect();
        (pool, items)
    }

    #[test]
    fn test_bind_find_clear() {
        let (_pool, items) = handles(2);
        let mut table = FrameStoreTable::new();
        assert_eq!(table.first_free(), Some(0));

        table.bind(0, items[0].0, items[0].1);
        table.bind(1, items[1].0, items[1].1);
        assert_eq!(table.occupied_count(), 2);
        assert_eq!(table.first_free(), Some(2));
        assert_eq!(table.find(items[1].0).unwrap().1.slot_index, Some(1));

        table.clear(0);
        assert_eq!(table.first_free(), Some(0));
        assert!(!table.contains(items[0].0));
    }

    #[test]
    fn test_unique_pictures() {
        let (_pool, items) = handles(1);
        let mut table = FrameStoreTable::new();
        table.bind(0, items[0].0, items[0].1);
        assert!(table.has_unique_pictures());

        let dup = *table.get(0).unwrap();
        table.set(3, dup);
        assert!(!table.has_unique_pictures());
    }

    #[test]
    fn test_display_table() {
        let (_pool, items) = handles(1);
        let mut table = FrameStoreTable::new();
        table.bind(2, items[0].0, items[0].1);
        let text = table.to_string();
        assert!(text.contains("[ 2] #0 -> fs2"));
        assert!(text.contains("[ 0] -"));
    }
}
