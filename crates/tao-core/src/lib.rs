//! # tao-core
//!
//! Tao 多媒体框架核心库, 提供基础类型定义和错误处理.
//!
//! 本 crate 对标 FFmpeg 的 libavutil, 为硬件解码参考帧管理提供底层基础设施.

pub mod error;
pub mod pixel_format;

// 重导出常用类型
pub use error::{TaoError, TaoResult};
pub use pixel_format::PixelFormat;
