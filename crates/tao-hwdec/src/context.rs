//! 解码上下文.
//!
//! 一个码流对应一个 [`DecodeContext`], 它独占帧存储槽位表与码流级状态.
//! 每幅图像依次执行: 校验 -> 同步槽位表 -> 准备渲染目标存储,
//! 之后可按切片生成参考索引表.

use log::debug;
use tao_core::{PixelFormat, TaoError, TaoResult};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::frame_store::FrameStoreTable;
use crate::params::{
    AvcSliceParams, Mpeg2PictureParams, Mpeg2SliceParams, PictureParameters, SegmentationBuffer,
};
use crate::profile::{Codec, Profile};
use crate::ref_idx::RefIdxState;
use crate::submission::DecodeSubmission;
use crate::surface::SurfaceAllocator;
use crate::sync::{SyncConfig, SyncEnv, synchronize};
use crate::validate::validate;
use crate::workaround::Mpeg2WorkaroundState;

/// 单个码流的解码上下文
#[derive(Debug)]
pub struct DecodeContext {
    profile: Profile,
    codec: Codec,
    config: SyncConfig,
    frame_store: FrameStoreTable,
    diagnostics: Diagnostics,
    mpeg2_workaround: Mpeg2WorkaroundState,
    segmentation: SegmentationBuffer,
    pictures_submitted: u64,
}

impl DecodeContext {
    /// 创建解码上下文, 不支持的 profile 返回 `UnsupportedProfile`
    pub fn new(profile: Profile, config: SyncConfig) -> TaoResult<Self> {
        let codec = profile.codec()?;
        debug!("创建解码上下文: profile={profile}, codec={codec}");
        Ok(Self {
            profile,
            codec,
            config,
            frame_store: FrameStoreTable::new(),
            diagnostics: Diagnostics::new(config.diagnostic_log_limit),
            mpeg2_workaround: Mpeg2WorkaroundState::new(),
            segmentation: SegmentationBuffer::new(),
            pictures_submitted: 0,
        })
    }

    /// 提交一幅图像
    ///
    /// 上一幅图像的诊断列表在此清空, 累计次数保留.
    /// 失败时槽位表可能已部分更新, 调用方应放弃该图像.
    pub fn submit_picture(
        &mut self,
        allocator: &mut dyn SurfaceAllocator,
        submission: &mut DecodeSubmission,
    ) -> TaoResult<()> {
        self.diagnostics.clear_events();
        validate(self.profile, submission, &*allocator, &mut self.diagnostics)?;

        let mut env = SyncEnv {
            allocator: &mut *allocator,
            config: &self.config,
            diagnostics: &mut self.diagnostics,
        };
        synchronize(self.codec, submission, &mut self.frame_store, &mut env)?;

        // 淘汰可能回收了渲染目标的旧内容, 存储须在同步之后准备
        Self::prepare_target(allocator, submission)?;

        if let PictureParameters::Vp8(pic) = &submission.picture {
            self.segmentation.ensure(pic.mb_width(), pic.mb_height());
        }

        self.pictures_submitted += 1;
        debug!(
            "{}: 第 {} 幅图像提交完成, 槽位占用 {}",
            self.codec,
            self.pictures_submitted,
            self.frame_store.occupied_count()
        );
        Ok(())
    }

    /// 重置渲染目标状态并分配解码存储
    fn prepare_target(
        allocator: &mut dyn SurfaceAllocator,
        submission: &DecodeSubmission,
    ) -> TaoResult<()> {
        let Some(handle) = submission.current_storage else {
            return Err(TaoError::Internal("渲染目标未解析".into()));
        };
        let format = match &submission.picture {
            PictureParameters::Avc(pic) => pic.storage_format()?,
            _ => PixelFormat::Nv12,
        };
        allocator.begin_render(handle);
        allocator.ensure_storage(handle, format)
    }

    /// 生成切片的参考索引表
    pub fn slice_ref_idx_state(&mut self, slice: &AvcSliceParams) -> RefIdxState {
        RefIdxState::build(slice, &self.frame_store, &mut self.diagnostics)
    }

    /// 当前图像的切片位置是否需要规避
    ///
    /// 判定在码流内只做一次, 首次判定为需要时记录一条诊断.
    pub fn mpeg2_slice_workaround(
        &mut self,
        pic: &Mpeg2PictureParams,
        slices: &[Mpeg2SliceParams],
    ) -> bool {
        if self.codec != Codec::Mpeg2 {
            return false;
        }
        let (active, newly_detected) = self.mpeg2_workaround.update(pic, slices);
        if newly_detected {
            self.diagnostics.record(Diagnostic::WorkaroundDetected);
        }
        active
    }

    /// 丢弃码流状态 (seek 或码流切换后使用), 不回收已分配的存储
    pub fn reset(&mut self) {
        self.frame_store.reset();
        self.mpeg2_workaround = Mpeg2WorkaroundState::new();
        self.pictures_submitted = 0;
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// 槽位表快照
    pub fn frame_store(&self) -> &FrameStoreTable {
        &self.frame_store
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// VP8 分段图缓冲
    pub fn segmentation_buffer(&self) -> &SegmentationBuffer {
        &self.segmentation
    }

    pub fn pictures_submitted(&self) -> u64 {
        self.pictures_submitted
    }
}
