//! H.264 槽位表增量维护.
//!
//! 与重建式策略不同, H.264 的槽位号在参考帧存活期间必须保持不变,
//! 因此每幅图像只做两步: 淘汰不再出现在参考帧列表中的帧, 再把新出现的
//! 参考帧放入编号最小的空闲槽位. 对同一参考集合重复执行结果不变.

use log::debug;
use tao_core::{PixelFormat, TaoError, TaoResult};

use super::{MissingStoragePolicy, SyncEnv, SyncStrategy};
use crate::diagnostics::Diagnostic;
use crate::frame_store::{FrameStoreTable, MAX_SLOTS};
use crate::params::{AvcPictureParams, PictureParameters};
use crate::submission::DecodeSubmission;
use crate::surface::{StorageHandle, SurfaceId};

/// H.264 同步策略
#[derive(Debug, Clone, Copy, Default)]
pub struct AvcSync;

impl SyncStrategy for AvcSync {
    fn synchronize(
        &self,
        submission: &DecodeSubmission,
        table: &mut FrameStoreTable,
        env: &mut SyncEnv<'_>,
    ) -> TaoResult<()> {
        let PictureParameters::Avc(pic) = &submission.picture else {
            return Err(TaoError::InvalidParameter(
                "H264: 提交中不是 H.264 图像参数".into(),
            ));
        };

        evict(pic, table, env);

        for (position, desc) in pic.reference_frames.iter().enumerate() {
            let Some(id) = desc.valid_id() else {
                continue;
            };
            let Some(handle) = submission.reference_objects[position] else {
                continue;
            };
            if table.contains(id) {
                continue;
            }
            admit(table, id, handle, pic.storage_format()?, env);
        }
        Ok(())
    }
}

/// 淘汰不再被引用的槽位
fn evict(pic: &AvcPictureParams, table: &mut FrameStoreTable, env: &mut SyncEnv<'_>) {
    for position in 0..MAX_SLOTS {
        let slot = table.slots()[position];
        let Some(id) = slot.picture_id else {
            continue;
        };
        let still_referenced = pic
            .reference_frames
            .iter()
            .any(|desc| desc.valid_id() == Some(id));
        if still_referenced {
            continue;
        }

        if let Some(handle) = slot.storage {
            env.allocator.set_referenced(handle, false);
            if !env.allocator.is_pending_display(handle) {
                env.allocator.reclaim_storage(handle);
            }
        }
        table.clear(position);
        debug!("H264: 淘汰参考帧 {id}, 释放槽位 {position}");
    }
}

/// 为参考帧准备存储并放入最小空闲槽位
///
/// 返回放入的槽位位置; 存储分配失败且策略为丢弃, 或没有空闲槽位时返回 `None`.
pub(crate) fn admit(
    table: &mut FrameStoreTable,
    id: SurfaceId,
    handle: StorageHandle,
    format: PixelFormat,
    env: &mut SyncEnv<'_>,
) -> Option<usize> {
    if let Err(err) = env.allocator.ensure_storage(handle, format) {
        env.diagnostics.record(Diagnostic::AllocationFailed {
            picture: id,
            reason: err.to_string(),
        });
        match env.config.missing_storage {
            MissingStoragePolicy::Drop => return None,
            MissingStoragePolicy::Tolerate => {
                env.diagnostics
                    .record(Diagnostic::DummyReference { picture: id });
            }
        }
    }

    let Some(position) = table.first_free() else {
        env.diagnostics
            .record(Diagnostic::SlotExhausted { picture: id });
        return None;
    };
    table.bind(position, id, handle);
    env.allocator.set_referenced(handle, true);
    debug!("H264: 参考帧 {id} 放入槽位 {position}");
    Some(position)
}
