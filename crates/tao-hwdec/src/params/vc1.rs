//! VC-1 图像参数.

use crate::surface::SurfaceId;

/// 图像类型 (picture_type)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vc1PictureType {
    I = 0,
    P = 1,
    B = 2,
    Bi = 3,
    /// 跳过图像, 按 P 处理
    Skipped = 4,
}

impl Vc1PictureType {
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::I),
            1 => Some(Self::P),
            2 => Some(Self::B),
            3 => Some(Self::Bi),
            4 => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// VC-1 图像参数
#[derive(Debug, Clone, Default)]
pub struct Vc1PictureParams {
    pub forward_reference_picture: Option<SurfaceId>,
    pub backward_reference_picture: Option<SurfaceId>,
    /// 码流原始值, 见 [`Vc1PictureType`]
    pub picture_type: u8,
}

impl Vc1PictureParams {
    pub fn picture_type(&self) -> Option<Vc1PictureType> {
        Vc1PictureType::from_raw(self.picture_type)
    }
}
