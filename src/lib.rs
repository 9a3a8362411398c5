//! # Tao DPB
//!
//! 硬件解码参考帧 (DPB) 管理, 对标 VA-API 驱动中的解码帧存储维护逻辑.
//!
//! - **校验**: 检查解码提交并解析参考图像
//! - **同步**: 维护 16 槽位帧存储表 (H.264 增量, MPEG-2/VC-1/VP8 重建)
//! - **编码**: 生成 H.264 切片参考索引表
//! - **规避**: 检测 MPEG-2 切片垂直位置填写错误
//!
//! # 快速开始
//!
//! ```rust
//! use tao_dpb::hwdec::{DecodeContext, DecodeSubmission, Profile, SurfacePool, SyncConfig};
//! use tao_dpb::hwdec::Vp8PictureParams;
//!
//! let mut pool = SurfacePool::new();
//! let key = pool.create_surface(320, 240);
//! let inter = pool.create_surface(320, 240);
//! let mut ctx = DecodeContext::new(Profile::Vp8Version0_3, SyncConfig::default()).unwrap();
//!
//! let pic = Vp8PictureParams { frame_width: 320, frame_height: 240, ..Default::default() };
//! ctx.submit_picture(&mut pool, &mut DecodeSubmission::new(key, pic)).unwrap();
//!
//! let pic = Vp8PictureParams {
//!     frame_width: 320,
//!     frame_height: 240,
//!     last_ref_frame: Some(key),
//!     ..Default::default()
//! };
//! ctx.submit_picture(&mut pool, &mut DecodeSubmission::new(inter, pic)).unwrap();
//! assert!(ctx.frame_store().slots().iter().all(|s| s.picture_id == Some(key)));
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `tao-core` | 错误类型与像素格式 |
//! | `tao-hwdec` | 参考帧管理 |

/// 核心类型 (对标 libavutil)
pub use tao_core as core;

/// 硬件解码参考帧管理
pub use tao_hwdec as hwdec;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
