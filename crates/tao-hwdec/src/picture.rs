//! 参考图像描述.
//!
//! 对标 VA-API 的 `VAPictureH264`: 图像标识加一组标志位.
//! 标志位布局与驱动层一致, 参考索引编码器直接读取其中的场标志.

use bitflags::bitflags;

use crate::surface::SurfaceId;

bitflags! {
    /// 参考图像标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PictureFlags: u32 {
        /// 无效条目, 必须跳过
        const INVALID              = 1 << 0;
        /// 顶场
        const TOP_FIELD            = 1 << 1;
        /// 底场
        const BOTTOM_FIELD         = 1 << 2;
        /// 短期参考
        const SHORT_TERM_REFERENCE = 1 << 3;
        /// 长期参考
        const LONG_TERM_REFERENCE  = 1 << 4;
    }
}

/// 场极性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldParity {
    /// 完整帧 (或互补场对)
    Frame,
    /// 顶场
    Top,
    /// 底场
    Bottom,
}

/// 码流声明的一个参考图像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferencePictureDescriptor {
    /// 图像标识, `None` 对应驱动层的无效表面
    pub picture_id: Option<SurfaceId>,
    /// 标志位
    pub flags: PictureFlags,
}

impl ReferencePictureDescriptor {
    /// 无效条目
    pub const INVALID: Self = Self {
        picture_id: None,
        flags: PictureFlags::INVALID,
    };

    /// 短期参考帧
    pub fn frame(id: SurfaceId) -> Self {
        Self {
            picture_id: Some(id),
            flags: PictureFlags::SHORT_TERM_REFERENCE,
        }
    }

    /// 长期参考帧
    pub fn long_term(id: SurfaceId) -> Self {
        Self {
            picture_id: Some(id),
            flags: PictureFlags::LONG_TERM_REFERENCE,
        }
    }

    /// 短期参考场
    pub fn field(id: SurfaceId, parity: FieldParity) -> Self {
        let field = match parity {
            FieldParity::Frame => PictureFlags::empty(),
            FieldParity::Top => PictureFlags::TOP_FIELD,
            FieldParity::Bottom => PictureFlags::BOTTOM_FIELD,
        };
        Self {
            picture_id: Some(id),
            flags: PictureFlags::SHORT_TERM_REFERENCE | field,
        }
    }

    /// 条目是否有效 (无 INVALID 标志且带有图像标识)
    pub fn is_valid(&self) -> bool {
        !self.flags.contains(PictureFlags::INVALID) && self.picture_id.is_some()
    }

    /// 有效条目的图像标识
    pub fn valid_id(&self) -> Option<SurfaceId> {
        if self.is_valid() { self.picture_id } else { None }
    }

    /// 是否为长期参考
    pub fn is_long_term(&self) -> bool {
        self.flags.contains(PictureFlags::LONG_TERM_REFERENCE)
    }

    /// 场极性, 同时带有两个场标志时视为完整帧
    pub fn field_parity(&self) -> FieldParity {
        let top = self.flags.contains(PictureFlags::TOP_FIELD);
        let bottom = self.flags.contains(PictureFlags::BOTTOM_FIELD);
        match (top, bottom) {
            (true, false) => FieldParity::Top,
            (false, true) => FieldParity::Bottom,
            _ => FieldParity::Frame,
        }
    }
}
