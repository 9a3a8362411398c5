//! 各编解码器的图像参数结构.
//!
//! 这些结构由上层码流解析层填写, 本模块只读取其中与参考帧相关的字段.

pub mod avc;
pub mod mpeg2;
pub mod vc1;
pub mod vp8;

pub use avc::{
    AvcIqMatrix, AvcPictureParams, AvcSliceParams, EntropyCodingMode, MAX_REF_LIST_ENTRIES,
    MAX_REFERENCE_FRAMES, SliceType,
};
pub use mpeg2::{
    Mpeg2CodingExtension, Mpeg2PictureCodingType, Mpeg2PictureParams, Mpeg2SliceParams,
    PictureStructure,
};
pub use vc1::{Vc1PictureParams, Vc1PictureType};
pub use vp8::{SegmentationBuffer, Vp8PictureParams};

use crate::profile::Codec;

/// 一幅图像的参数
#[derive(Debug, Clone)]
pub enum PictureParameters {
    /// MPEG-2 图像参数
    Mpeg2(Mpeg2PictureParams),
    /// H.264 图像参数
    Avc(Box<AvcPictureParams>),
    /// VC-1 图像参数
    Vc1(Vc1PictureParams),
    /// VP8 图像参数
    Vp8(Vp8PictureParams),
    /// JPEG (无参考帧字段)
    Jpeg,
}

impl PictureParameters {
    /// 参数所属的编解码器
    pub fn codec(&self) -> Codec {
        match self {
            Self::Mpeg2(_) => Codec::Mpeg2,
            Self::Avc(_) => Codec::Avc,
            Self::Vc1(_) => Codec::Vc1,
            Self::Vp8(_) => Codec::Vp8,
            Self::Jpeg => Codec::Jpeg,
        }
    }
}

impl From<Mpeg2PictureParams> for PictureParameters {
    fn from(params: Mpeg2PictureParams) -> Self {
        Self::Mpeg2(params)
    }
}

impl From<AvcPictureParams> for PictureParameters {
    fn from(params: AvcPictureParams) -> Self {
        Self::Avc(Box::new(params))
    }
}

impl From<Vc1PictureParams> for PictureParameters {
    fn from(params: Vc1PictureParams) -> Self {
        Self::Vc1(params)
    }
}

impl From<Vp8PictureParams> for PictureParameters {
    fn from(params: Vp8PictureParams) -> Self {
        Self::Vp8(params)
    }
}
