//! 单幅图像的解码提交.

use crate::params::PictureParameters;
use crate::surface::{StorageHandle, SurfaceId};

/// 提交中可记录的参考对象数量
pub const MAX_REFERENCE_OBJECTS: usize = 16;

/// 一幅图像的解码提交
///
/// 提交开始时创建, 图像解码结束后丢弃. `reference_objects` 由校验阶段按位置填写:
/// MPEG-2/VC-1 为前向/后向, VP8 为 last/golden/altref, H.264 与参考帧列表一一对应.
#[derive(Debug, Clone)]
pub struct DecodeSubmission {
    /// 当前渲染目标
    pub current_target: Option<SurfaceId>,
    /// 当前渲染目标的表面对象 (校验后填写)
    pub current_storage: Option<StorageHandle>,
    /// 解析后的参考对象
    pub reference_objects: [Option<StorageHandle>; MAX_REFERENCE_OBJECTS],
    /// 图像参数
    pub picture: PictureParameters,
}

impl DecodeSubmission {
    pub fn new(current_target: SurfaceId, picture: impl Into<PictureParameters>) -> Self {
        Self {
            current_target: Some(current_target),
            current_storage: None,
            reference_objects: [None; MAX_REFERENCE_OBJECTS],
            picture: picture.into(),
        }
    }

    /// 已解析的参考对象数量
    pub fn resolved_reference_count(&self) -> usize {
        self.reference_objects.iter().flatten().count()
    }
}
