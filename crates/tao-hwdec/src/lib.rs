//! # tao-hwdec
//!
//! Tao 多媒体框架硬件解码参考帧管理库.
//!
//! 维护硬件解码器可见的 16 槽位帧存储表 (DPB), 把码流声明的参考图像映射到
//! 已分配存储的解码表面, 并为 H.264 切片生成参考索引表.
//!
//! ## 支持的编解码器
//!
//! - **H.264**: 增量维护槽位表, 槽位号在参考帧存活期间保持不变
//! - **MPEG-2 / VC-1 / VP8**: 每幅图像重建槽位表
//! - **JPEG**: 无参考帧
//!
//! ## 使用示例
//!
//! ```rust
//! use tao_hwdec::{
//!     AvcPictureParams, DecodeContext, DecodeSubmission, Profile, ReferencePictureDescriptor,
//!     SurfacePool, SyncConfig,
//! };
//!
//! let mut pool = SurfacePool::new();
//! let idr = pool.create_surface(1920, 1088);
//! let next = pool.create_surface(1920, 1088);
//! let mut ctx = DecodeContext::new(Profile::H264High, SyncConfig::default()).unwrap();
//!
//! let pic = AvcPictureParams::with_references(ReferencePictureDescriptor::frame(idr), &[]);
//! ctx.submit_picture(&mut pool, &mut DecodeSubmission::new(idr, pic)).unwrap();
//!
//! let pic = AvcPictureParams::with_references(
//!     ReferencePictureDescriptor::frame(next),
//!     &[ReferencePictureDescriptor::frame(idr)],
//! );
//! ctx.submit_picture(&mut pool, &mut DecodeSubmission::new(next, pic)).unwrap();
//! assert_eq!(ctx.frame_store().slots()[0].picture_id, Some(idr));
//! ```

pub mod context;
pub mod diagnostics;
pub mod frame_store;
pub mod params;
pub mod picture;
pub mod profile;
pub mod ref_idx;
pub mod slice_offset;
pub mod submission;
pub mod surface;
pub mod sync;
pub mod validate;
pub mod workaround;

// 重导出常用类型
pub use context::DecodeContext;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use frame_store::{FrameStoreSlot, FrameStoreTable, MAX_SLOTS};
pub use params::{
    AvcIqMatrix, AvcPictureParams, AvcSliceParams, EntropyCodingMode, Mpeg2CodingExtension,
    Mpeg2PictureParams, Mpeg2SliceParams, PictureParameters, PictureStructure, SegmentationBuffer,
    SliceType, Vc1PictureParams, Vp8PictureParams,
};
pub use picture::{FieldParity, PictureFlags, ReferencePictureDescriptor};
pub use profile::{Codec, Profile};
pub use ref_idx::{RefIdxState, RefIdxTable};
pub use submission::DecodeSubmission;
pub use surface::{
    StorageHandle, SurfaceAllocator, SurfaceFlags, SurfaceId, SurfacePool, SurfaceResolver,
};
pub use sync::{MissingStoragePolicy, SyncConfig, SyncStrategy};
pub use validate::validate;
