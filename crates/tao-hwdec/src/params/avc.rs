//! H.264/AVC 图像与切片参数.

use tao_core::{PixelFormat, TaoError, TaoResult};

use crate::picture::ReferencePictureDescriptor;

/// 图像级参考帧列表容量
pub const MAX_REFERENCE_FRAMES: usize = 16;

/// 切片级参考图像列表容量
pub const MAX_REF_LIST_ENTRIES: usize = 32;

/// 熵编码模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntropyCodingMode {
    #[default]
    Cavlc,
    Cabac,
}

/// 切片类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SliceType {
    P = 0,
    B = 1,
    #[default]
    I = 2,
    Sp = 3,
    Si = 4,
}

impl SliceType {
    /// 从码流值解析 (5..9 与 0..4 含义相同)
    pub fn from_raw(value: u32) -> Self {
        match value % 5 {
            0 => Self::P,
            1 => Self::B,
            2 => Self::I,
            3 => Self::Sp,
            _ => Self::Si,
        }
    }

    /// 是否使用参考列表 0
    pub fn uses_list0(&self) -> bool {
        !matches!(self, Self::I | Self::Si)
    }

    /// 是否使用参考列表 1
    pub fn uses_list1(&self) -> bool {
        *self == Self::B
    }
}

/// H.264 图像参数
#[derive(Debug, Clone)]
pub struct AvcPictureParams {
    /// 当前解码图像
    pub curr_pic: ReferencePictureDescriptor,
    /// DPB 中声明的参考帧
    pub reference_frames: [ReferencePictureDescriptor; MAX_REFERENCE_FRAMES],
    /// 0 = 4:0:0, 1 = 4:2:0
    pub chroma_format_idc: u8,
    pub num_slice_groups_minus1: u8,
    pub redundant_pic_cnt_present: bool,
    pub entropy_coding_mode: EntropyCodingMode,
}

impl Default for AvcPictureParams {
    fn default() -> Self {
        Self {
            curr_pic: ReferencePictureDescriptor::INVALID,
            reference_frames: [ReferencePictureDescriptor::INVALID; MAX_REFERENCE_FRAMES],
            chroma_format_idc: 1,
            num_slice_groups_minus1: 0,
            redundant_pic_cnt_present: false,
            entropy_coding_mode: EntropyCodingMode::Cavlc,
        }
    }
}

impl AvcPictureParams {
    /// 以给定参考帧构造参数, 多余位置填无效条目
    pub fn with_references(
        curr_pic: ReferencePictureDescriptor,
        refs: &[ReferencePictureDescriptor],
    ) -> Self {
        let mut params = Self {
            curr_pic,
            ..Self::default()
        };
        for (dst, src) in params.reference_frames.iter_mut().zip(refs) {
            *dst = *src;
        }
        params
    }

    /// 参考帧需要的存储格式
    pub fn storage_format(&self) -> TaoResult<PixelFormat> {
        avc_storage_format(self.chroma_format_idc)
    }
}

/// 根据 chroma_format_idc 选择参考帧存储格式
///
/// 硬件只支持 4:2:0, 灰度流以 NV12 存储并伪造色度.
pub fn avc_storage_format(chroma_format_idc: u8) -> TaoResult<PixelFormat> {
    match chroma_format_idc {
        0 => Ok(PixelFormat::Gray8),
        1 => Ok(PixelFormat::Nv12),
        other => Err(TaoError::Unsupported(format!(
            "H264: 不支持的色度格式, chroma_format_idc={other}"
        ))),
    }
}

/// H.264 切片参数
#[derive(Debug, Clone, Default)]
pub struct AvcSliceParams {
    pub slice_type: SliceType,
    pub ref_pic_list0: Vec<ReferencePictureDescriptor>,
    pub ref_pic_list1: Vec<ReferencePictureDescriptor>,
    pub num_ref_idx_l0_active_minus1: u8,
    pub num_ref_idx_l1_active_minus1: u8,
    /// 切片数据在数据缓冲中的起始偏移 (字节)
    pub slice_data_offset: u32,
    /// 切片数据大小 (字节)
    pub slice_data_size: u32,
    /// 切片头之后第一个宏块的位偏移 (未计入防竞争字节)
    pub slice_data_bit_offset: u16,
}

impl AvcSliceParams {
    /// 列表 0 中生效的条目
    pub fn active_list0(&self) -> &[ReferencePictureDescriptor] {
        active_entries(&self.ref_pic_list0, self.num_ref_idx_l0_active_minus1)
    }

    /// 列表 1 中生效的条目
    pub fn active_list1(&self) -> &[ReferencePictureDescriptor] {
        active_entries(&self.ref_pic_list1, self.num_ref_idx_l1_active_minus1)
    }
}

fn active_entries(
    list: &[ReferencePictureDescriptor],
    active_minus1: u8,
) -> &[ReferencePictureDescriptor] {
    let count = (usize::from(active_minus1) + 1)
        .min(MAX_REF_LIST_ENTRIES)
        .min(list.len());
    &list[..count]
}

/// H.264 反量化矩阵
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcIqMatrix {
    pub scaling_list_4x4: [[u8; 16]; 6],
    pub scaling_list_8x8: [[u8; 64]; 2],
}

impl AvcIqMatrix {
    /// 平坦矩阵 (Flat_4x4_16 / Flat_8x8_16), 码流未携带矩阵时使用
    pub fn flat() -> Self {
        Self {
            scaling_list_4x4: [[16; 16]; 6],
            scaling_list_8x8: [[16; 64]; 2],
        }
    }
}

impl Default for AvcIqMatrix {
    fn default() -> Self {
        Self::flat()
    }
}
