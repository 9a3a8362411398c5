//! MPEG-2 图像与切片参数.

use crate::surface::SurfaceId;

/// 图像编码类型 (picture_coding_type)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mpeg2PictureCodingType {
    /// 帧内编码
    I = 1,
    /// 前向预测
    P = 2,
    /// 双向预测
    B = 3,
}

impl Mpeg2PictureCodingType {
    /// 从码流值解析, D 图像 (4) 及其他值返回 `None`
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::I),
            2 => Some(Self::P),
            3 => Some(Self::B),
            _ => None,
        }
    }
}

/// 图像结构 (picture_structure)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PictureStructure {
    /// 顶场图像
    TopField = 1,
    /// 底场图像
    BottomField = 2,
    /// 帧图像
    #[default]
    Frame = 3,
}

/// 图像编码扩展中与参考帧相关的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mpeg2CodingExtension {
    pub picture_structure: PictureStructure,
    pub is_first_field: bool,
    pub frame_pred_frame_dct: bool,
    pub progressive_frame: bool,
}

impl Default for Mpeg2CodingExtension {
    fn default() -> Self {
        Self {
            picture_structure: PictureStructure::Frame,
            is_first_field: true,
            frame_pred_frame_dct: true,
            progressive_frame: true,
        }
    }
}

/// MPEG-2 图像参数
#[derive(Debug, Clone, Default)]
pub struct Mpeg2PictureParams {
    pub horizontal_size: u16,
    pub vertical_size: u16,
    pub forward_reference_picture: Option<SurfaceId>,
    pub backward_reference_picture: Option<SurfaceId>,
    /// 码流原始值, 见 [`Mpeg2PictureCodingType`]
    pub picture_coding_type: u8,
    pub coding_extension: Mpeg2CodingExtension,
}

impl Mpeg2PictureParams {
    /// 解析后的图像编码类型
    pub fn coding_type(&self) -> Option<Mpeg2PictureCodingType> {
        Mpeg2PictureCodingType::from_raw(self.picture_coding_type)
    }

    /// 是否为场图像
    pub fn is_field_picture(&self) -> bool {
        self.coding_extension.picture_structure != PictureStructure::Frame
    }

    /// 是否为场对中的第二场
    pub fn is_second_field(&self) -> bool {
        self.is_field_picture() && !self.coding_extension.is_first_field
    }

    /// 场图像的宏块行数
    pub fn field_mb_height(&self) -> u32 {
        (u32::from(self.vertical_size) + 31) / 32
    }
}

/// MPEG-2 切片参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mpeg2SliceParams {
    pub slice_horizontal_position: u32,
    pub slice_vertical_position: u32,
}

impl Mpeg2SliceParams {
    /// 指定垂直位置的切片
    pub fn at_row(vertical_position: u32) -> Self {
        Self {
            slice_horizontal_position: 0,
            slice_vertical_position: vertical_position,
        }
    }
}
