//! 帧存储同步.
//!
//! 每幅图像解码前运行一次, 让槽位表反映当前图像的参考帧集合:
//! - H.264: 增量维护, 淘汰不再引用的帧, 按最小空闲槽位加入新参考帧.
//! - MPEG-2 / VC-1 / VP8: 每幅图像完全重建, 缺失位置复制前一个已填槽位.
//! - JPEG: 无参考帧, 不处理.

mod avc;
mod mpeg2;
mod vc1;
mod vp8;

pub use avc::AvcSync;
pub use mpeg2::Mpeg2Sync;
pub use vc1::Vc1Sync;
pub use vp8::Vp8Sync;

use tao_core::TaoResult;

use crate::diagnostics::{DEFAULT_LOG_LIMIT, Diagnostics};
use crate::frame_store::{FrameStoreTable, MAX_SLOTS};
use crate::profile::Codec;
use crate::submission::DecodeSubmission;
use crate::surface::{StorageHandle, SurfaceAllocator, SurfaceId};

/// 参考帧存储分配失败时的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingStoragePolicy {
    /// 仍加入槽位表, 作为占位帧参与解码
    #[default]
    Tolerate,
    /// 不加入槽位表
    Drop,
}

/// 同步配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    pub missing_storage: MissingStoragePolicy,
    /// 同类诊断日志输出上限
    pub diagnostic_log_limit: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            missing_storage: MissingStoragePolicy::Tolerate,
            diagnostic_log_limit: DEFAULT_LOG_LIMIT,
        }
    }
}

/// 同步过程可访问的外部状态
pub struct SyncEnv<'a> {
    pub allocator: &'a mut dyn SurfaceAllocator,
    pub config: &'a SyncConfig,
    pub diagnostics: &'a mut Diagnostics,
}

/// 单个编解码器的槽位表同步策略
pub trait SyncStrategy {
    /// 按已校验的提交更新槽位表
    fn synchronize(
        &self,
        submission: &DecodeSubmission,
        table: &mut FrameStoreTable,
        env: &mut SyncEnv<'_>,
    ) -> TaoResult<()>;
}

/// JPEG 没有参考帧
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

impl SyncStrategy for NoopSync {
    fn synchronize(
        &self,
        _submission: &DecodeSubmission,
        _table: &mut FrameStoreTable,
        _env: &mut SyncEnv<'_>,
    ) -> TaoResult<()> {
        Ok(())
    }
}

/// 编解码器对应的同步策略
pub fn strategy_for(codec: Codec) -> &'static dyn SyncStrategy {
    match codec {
        Codec::Mpeg2 => &Mpeg2Sync,
        Codec::Avc => &AvcSync,
        Codec::Vc1 => &Vc1Sync,
        Codec::Vp8 => &Vp8Sync,
        Codec::Jpeg => &NoopSync,
    }
}

/// 按编解码器同步槽位表
pub fn synchronize(
    codec: Codec,
    submission: &DecodeSubmission,
    table: &mut FrameStoreTable,
    env: &mut SyncEnv<'_>,
) -> TaoResult<()> {
    strategy_for(codec).synchronize(submission, table, env)
}

/// 可写入槽位的参考帧
type RefEntry = Option<(SurfaceId, StorageHandle)>;

/// 组合图像标识与参考对象, 要求对象已有后备存储
fn usable_entry(
    env: &SyncEnv<'_>,
    picture: Option<SurfaceId>,
    storage: Option<StorageHandle>,
) -> RefEntry {
    let (id, handle) = picture.zip(storage)?;
    env.allocator.has_storage(handle).then_some((id, handle))
}

/// 从 `start` 起写入一组槽位
///
/// 组内第 k 个槽位写入 `entries[k]`; 条目缺失时复制组内前一个槽位,
/// 首个槽位缺失则保持空闲.
fn fill_group(table: &mut FrameStoreTable, start: usize, len: usize, entries: &[RefEntry]) {
    for k in 0..len {
        let position = start + k;
        match entries.get(k).copied().flatten() {
            Some((id, handle)) => table.bind(position, id, handle),
            None if k > 0 => {
                let prev = table.slots()[position - 1];
                table.set(position, prev);
            }
            None => table.clear(position),
        }
    }
}

/// `from` 之后的槽位依次复制槽位 `i % 2`
fn replicate_pairs(table: &mut FrameStoreTable, from: usize) {
    for position in from..MAX_SLOTS {
        let src = table.slots()[position % 2];
        table.set(position, src);
    }
}
