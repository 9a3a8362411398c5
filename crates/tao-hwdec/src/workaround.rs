//! MPEG-2 切片垂直位置规避检测.
//!
//! 部分上层把场图像的 `slice_vertical_position` 按帧行号填写 (是正确值的两倍),
//! 检测到这种情况后解码端需要修正切片位置.

use log::debug;

use crate::params::{Mpeg2PictureParams, Mpeg2SliceParams, PictureStructure};

/// 检测是否需要规避
///
/// - `Some(false)`: 逐行帧, 按逐行序列处理, 不需要规避
/// - `None`: 帧结构图像无法判断, 等待场图像
/// - `Some(true)`: 场图像中出现越界或间隔为 2 的位置
pub fn detect(pic: &Mpeg2PictureParams, slices: &[Mpeg2SliceParams]) -> Option<bool> {
    if pic.coding_extension.progressive_frame {
        return Some(false);
    }
    if pic.coding_extension.picture_structure == PictureStructure::Frame {
        return None;
    }

    let mb_height = pic.field_mb_height();
    let mut last = 0u32;
    for slice in slices {
        let vpos = slice.slice_vertical_position;
        if vpos >= mb_height || vpos == last.saturating_add(2) {
            debug!("MPEG-2: 切片位置 {vpos} 异常 (上一个 {last}, 场宏块行数 {mb_height})");
            return Some(true);
        }
        last = vpos;
    }
    Some(false)
}

/// 是否需要规避, 无法判断时视为不需要
pub fn requires_workaround(pic: &Mpeg2PictureParams, slices: &[Mpeg2SliceParams]) -> bool {
    detect(pic, slices).unwrap_or(false)
}

/// 码流级别的规避判定
///
/// 第一次得出确定结论后不再改变, 结论未定时每幅图像重新检测.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mpeg2WorkaroundState {
    decided: Option<bool>,
}

impl Mpeg2WorkaroundState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用当前图像更新判定, 返回是否需要规避
    ///
    /// 返回值的第二项表示本次是否刚刚判定为需要规避.
    pub fn update(&mut self, pic: &Mpeg2PictureParams, slices: &[Mpeg2SliceParams]) -> (bool, bool) {
        if let Some(decided) = self.decided {
            return (decided, false);
        }
        self.decided = detect(pic, slices);
        let active = self.decided.unwrap_or(false);
        (active, active)
    }

    /// 已确定的结论
    pub fn decided(&self) -> Option<bool> {
        self.decided
    }

    /// 是否需要规避
    pub fn is_active(&self) -> bool {
        self.decided.unwrap_or(false)
    }
}
