//! VP8 图像参数与分段图缓冲.

use log::debug;

use crate::surface::SurfaceId;

/// VP8 图像参数
#[derive(Debug, Clone, Default)]
pub struct Vp8PictureParams {
    pub frame_width: u32,
    pub frame_height: u32,
    pub last_ref_frame: Option<SurfaceId>,
    pub golden_ref_frame: Option<SurfaceId>,
    pub alt_ref_frame: Option<SurfaceId>,
}

impl Vp8PictureParams {
    /// 按 last/golden/altref 顺序列出参考帧
    pub fn references(&self) -> [Option<SurfaceId>; 3] {
        [self.last_ref_frame, self.golden_ref_frame, self.alt_ref_frame]
    }

    pub fn mb_width(&self) -> u32 {
        self.frame_width.div_ceil(16)
    }

    pub fn mb_height(&self) -> u32 {
        self.frame_height.div_ceil(16)
    }
}

/// 分段图缓冲
///
/// 线性缓冲, 每 64 字节缓存行只保存连续 4 个宏块各 8 位的分段号.
#[derive(Debug, Default)]
pub struct SegmentationBuffer {
    data: Option<Vec<u8>>,
}

impl SegmentationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定宏块尺寸所需的缓冲字节数
    pub fn required_size(mb_width: u32, mb_height: u32) -> usize {
        (mb_width as usize).div_ceil(4) * 64 * mb_height as usize
    }

    /// 确保缓冲足够大, 不足时重新分配
    ///
    /// 返回是否发生了重新分配.
    pub fn ensure(&mut self, mb_width: u32, mb_height: u32) -> bool {
        let size = Self::required_size(mb_width, mb_height);
        if self.data.as_ref().is_some_and(|buf| buf.len() >= size) {
            return false;
        }
        debug!("VP8: 重新分配分段图缓冲, {size} 字节");
        self.data = Some(vec![0u8; size]);
        true
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segmentation_size() {
        // 1280x720 => 80x45 宏块
        assert_eq!(SegmentationBuffer::required_size(80, 45), 20 * 64 * 45);
        assert_eq!(SegmentationBuffer::required_size(5, 1), 128);
    }

    #[test]
    fn test_segmentation_buffer_reuse() {
        let mut buf = SegmentationBuffer::new();
        assert!(buf.is_empty());
        assert!(buf.ensure(80, 45));
        // 更小的尺寸复用已有缓冲
        assert!(!buf.ensure(40, 20));
        assert_eq!(buf.len(), 20 * 64 * 45);
        assert!(buf.ensure(120, 68));
    }

    #[test]
    fn test_mb_dimensions() {
        let params = Vp8PictureParams {
            frame_width: 1280,
            frame_height: 721,
            ..Default::default()
        };
        assert_eq!(params.mb_width(), 80);
        assert_eq!(params.mb_height(), 46);
    }
}
