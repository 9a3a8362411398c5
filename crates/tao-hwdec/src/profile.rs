//! 解码 profile 与编解码器分类.
//!
//! 对标 VA-API 的 `VAProfile`. 参考帧管理只关心 profile 所属的编解码器,
//! 各编解码器的参考帧更新规则由 [`Codec`] 统一分派.

use std::fmt;

use tao_core::{TaoError, TaoResult};

/// 解码 profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Profile {
    /// 未指定
    None,

    // ========================
    // MPEG-2
    // ========================
    /// MPEG-2 Simple
    Mpeg2Simple,
    /// MPEG-2 Main
    Mpeg2Main,

    // ========================
    // H.264 / AVC
    // ========================
    /// H.264 Baseline (允许 FMO/ASO 与冗余图像)
    H264Baseline,
    /// H.264 Constrained Baseline
    H264ConstrainedBaseline,
    /// H.264 Main
    H264Main,
    /// H.264 High
    H264High,

    // ========================
    // VC-1
    // ========================
    /// VC-1 Simple
    Vc1Simple,
    /// VC-1 Main
    Vc1Main,
    /// VC-1 Advanced
    Vc1Advanced,

    // ========================
    // 其他
    // ========================
    /// JPEG Baseline (静态图像, 无参考帧)
    JpegBaseline,
    /// VP8 (version 0-3)
    Vp8Version0_3,
    /// H.265 Main (本模块不支持)
    HevcMain,
    /// VP9 Profile 0 (本模块不支持)
    Vp9Profile0,
}

/// 参考帧管理所区分的编解码器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// MPEG-2 (前向/后向参考, 每帧重建)
    Mpeg2,
    /// H.264/AVC (长期 DPB, 增量更新)
    Avc,
    /// VC-1 (前向/后向参考, 每帧重建)
    Vc1,
    /// VP8 (last/golden/altref, 每帧重建)
    Vp8,
    /// JPEG (无参考帧)
    Jpeg,
}

impl Profile {
    /// 获取 profile 所属的编解码器
    ///
    /// 本模块无法处理的 profile 返回 `UnsupportedProfile`.
    pub fn codec(&self) -> TaoResult<Codec> {
        match self {
            Self::Mpeg2Simple | Self::Mpeg2Main => Ok(Codec::Mpeg2),
            Self::H264Baseline
            | Self::H264ConstrainedBaseline
            | Self::H264Main
            | Self::H264High => Ok(Codec::Avc),
            Self::Vc1Simple | Self::Vc1Main | Self::Vc1Advanced => Ok(Codec::Vc1),
            Self::JpegBaseline => Ok(Codec::Jpeg),
            Self::Vp8Version0_3 => Ok(Codec::Vp8),
            Self::None | Self::HevcMain | Self::Vp9Profile0 => {
                Err(TaoError::UnsupportedProfile(format!("{self}")))
            }
        }
    }

    /// 是否为 H.264 Baseline (唯一允许 FMO/ASO 与冗余图像的 profile)
    pub fn is_h264_baseline(&self) -> bool {
        *self == Self::H264Baseline
    }

    /// 按名称解析 profile (如 "h264-main", "mpeg2-simple")
    pub fn from_name(name: &str) -> Option<Self> {
        let profile = match name.to_ascii_lowercase().as_str() {
            "mpeg2-simple" => Self::Mpeg2Simple,
            "mpeg2-main" => Self::Mpeg2Main,
            "h264-baseline" => Self::H264Baseline,
            "h264-constrained-baseline" => Self::H264ConstrainedBaseline,
            "h264-main" => Self::H264Main,
            "h264-high" => Self::H264High,
            "vc1-simple" => Self::Vc1Simple,
            "vc1-main" => Self::Vc1Main,
            "vc1-advanced" => Self::Vc1Advanced,
            "jpeg-baseline" => Self::JpegBaseline,
            "vp8" => Self::Vp8Version0_3,
            "hevc-main" => Self::HevcMain,
            "vp9-profile0" => Self::Vp9Profile0,
            _ => return None,
        };
        Some(profile)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Mpeg2Simple => "mpeg2-simple",
            Self::Mpeg2Main => "mpeg2-main",
            Self::H264Baseline => "h264-baseline",
            Self::H264ConstrainedBaseline => "h264-constrained-baseline",
            Self::H264Main => "h264-main",
            Self::H264High => "h264-high",
            Self::Vc1Simple => "vc1-simple",
            Self::Vc1Main => "vc1-main",
            Self::Vc1Advanced => "vc1-advanced",
            Self::JpegBaseline => "jpeg-baseline",
            Self::Vp8Version0_3 => "vp8",
            Self::HevcMain => "hevc-main",
            Self::Vp9Profile0 => "vp9-profile0",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mpeg2 => "mpeg2",
            Self::Avc => "h264",
            Self::Vc1 => "vc1",
            Self::Vp8 => "vp8",
            Self::Jpeg => "jpeg",
        };
        write!(f, "{name}")
    }
}
