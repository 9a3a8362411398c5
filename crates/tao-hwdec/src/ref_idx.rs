//! H.264 参考索引表编码.
//!
//! 每个切片的参考列表被编码为 32 字节的硬件表, 每个生效条目一个状态字节:
//!
//! ```text
//! bit 6    长期参考
//! bit 5    完整帧 (非单场)
//! bit 4:1  帧存储槽位号
//! bit 0    底场
//! ```
//!
//! 找不到对应槽位的条目被跳过, 其余字节填 `0xFF`.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::frame_store::FrameStoreTable;
use crate::params::{AvcSliceParams, MAX_REF_LIST_ENTRIES};
use crate::picture::{PictureFlags, ReferencePictureDescriptor};

/// 一张参考索引表
pub type RefIdxTable = [u8; MAX_REF_LIST_ENTRIES];

/// 表中未使用字节的取值
pub const UNUSED_ENTRY: u8 = 0xFF;

/// 计算单个参考条目的状态字节
pub fn status_byte(desc: &ReferencePictureDescriptor, slot_index: u8) -> u8 {
    let long_term = u8::from(desc.is_long_term());
    let top = u8::from(desc.flags.contains(PictureFlags::TOP_FIELD));
    let bottom = u8::from(desc.flags.contains(PictureFlags::BOTTOM_FIELD));

    (long_term << 6) | ((top ^ bottom ^ 1) << 5) | ((slot_index & 0x0F) << 1) | ((top ^ 1) & bottom)
}

/// 把参考列表编码为参考索引表
///
/// `list` 为参考列表编号 (0 或 1), 只用于诊断.
pub fn encode(
    list: &[ReferencePictureDescriptor],
    table: &FrameStoreTable,
    list_no: u8,
    diagnostics: &mut Diagnostics,
) -> RefIdxTable {
    let mut state = [UNUSED_ENTRY; MAX_REF_LIST_ENTRIES];
    let mut n = 0;

    for desc in list.iter().take(MAX_REF_LIST_ENTRIES) {
        let Some(id) = desc.valid_id() else {
            continue;
        };
        match table.find(id) {
            Some((position, slot)) => {
                let slot_index = slot.slot_index.unwrap_or(position as u8);
                state[n] = status_byte(desc, slot_index);
                n += 1;
            }
            None => diagnostics.record(Diagnostic::ReferenceNotFound {
                list: list_no,
                picture: id,
            }),
        }
    }
    state
}

/// 一个切片的参考索引表
///
/// I/SI 切片两张表都没有, P/SP 切片只有列表 0, B 切片两张都有.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefIdxState {
    pub list0: Option<RefIdxTable>,
    pub list1: Option<RefIdxTable>,
}

impl RefIdxState {
    /// 按切片参数生成参考索引表
    pub fn build(
        slice: &AvcSliceParams,
        table: &FrameStoreTable,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        let list0 = slice
            .slice_type
            .uses_list0()
            .then(|| encode(slice.active_list0(), table, 0, diagnostics));
        let list1 = slice
            .slice_type
            .uses_list1()
            .then(|| encode(slice.active_list1(), table, 1, diagnostics));
        Self { list0, list1 }
    }

    /// 需要下发的表数量
    pub fn table_count(&self) -> usize {
        usize::from(self.list0.is_some()) + usize::from(self.list1.is_some())
    }
}
