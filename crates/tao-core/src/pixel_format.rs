//! 解码表面像素格式定义.
//!
//! 硬件解码表面只使用少数几种格式.

use std::fmt;

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// 未指定
    None,
    /// NV12: Y 平面 + UV 交错, 4:2:0, 8 位 (硬件解码表面的默认格式)
    Nv12,
    /// 灰度 8 位 (Y800, 4:0:0)
    Gray8,
}

impl PixelFormat {
    /// 亮度平面字节数, 溢出时返回 `None`
    pub fn luma_size(&self, width: u32, height: u32) -> Option<usize> {
        match self {
            Self::None => None,
            _ => (width as usize).checked_mul(height as usize),
        }
    }

    /// 计算整帧的字节数, 溢出时返回 `None`
    ///
    /// 4:2:0 格式色度数据共占亮度的一半, 宽高为奇数时向上取整.
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        let luma = self.luma_size(width, height)?;
        match self {
            Self::Nv12 => {
                let cw = (width as usize).div_ceil(2);
                let ch = (height as usize).div_ceil(2);
                cw.checked_mul(ch)?.checked_mul(2)?.checked_add(luma)
            }
            _ => Some(luma),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Nv12 => "nv12",
            Self::Gray8 => "gray8",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nv12_frame_size() {
        let pf = PixelFormat::Nv12;
        assert_eq!(pf.luma_size(1920, 1080), Some(1920 * 1080));
        assert_eq!(pf.frame_size(1920, 1080), Some(1920 * 1080 * 3 / 2));
    }

    #[test]
    fn test_odd_size_round_up() {
        // 色度 3x3, 两个分量
        assert_eq!(PixelFormat::Nv12.frame_size(5, 5), Some(25 + 18));
    }

    #[test]
    fn test_gray8_frame_size() {
        assert_eq!(PixelFormat::Gray8.frame_size(320, 240), Some(320 * 240));
    }

    #[test]
    fn test_none_return_none() {
        assert_eq!(PixelFormat::None.frame_size(1920, 1080), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(PixelFormat::Nv12.to_string(), "nv12");
        assert_eq!(PixelFormat::Gray8.to_string(), "gray8");
    }
}
