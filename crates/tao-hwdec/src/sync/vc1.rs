//! VC-1 槽位表重建.

use log::debug;
use tao_core::{TaoError, TaoResult};

use super::{SyncEnv, SyncStrategy, fill_group, replicate_pairs, usable_entry};
use crate::frame_store::FrameStoreTable;
use crate::params::PictureParameters;
use crate::submission::DecodeSubmission;

/// VC-1 同步策略
///
/// 槽位 0 为前向参考, 槽位 1 为后向参考, 其余槽位按奇偶复制.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vc1Sync;

impl SyncStrategy for Vc1Sync {
    fn synchronize(
        &self,
        submission: &DecodeSubmission,
        table: &mut FrameStoreTable,
        env: &mut SyncEnv<'_>,
    ) -> TaoResult<()> {
        let PictureParameters::Vc1(pic) = &submission.picture else {
            return Err(TaoError::InvalidParameter(
                "VC1: 提交中不是 VC-1 图像参数".into(),
            ));
        };

        let entries = [
            usable_entry(
                env,
                pic.forward_reference_picture,
                submission.reference_objects[0],
            ),
            usable_entry(
                env,
                pic.backward_reference_picture,
                submission.reference_objects[1],
            ),
        ];
        fill_group(table, 0, entries.len(), &entries);
        replicate_pairs(table, entries.len());

        debug!(
            "VC1: 重建槽位表, picture_type={}, fwd={:?}, bwd={:?}",
            pic.picture_type,
            table.slots()[0].picture_id,
            table.slots()[1].picture_id
        );
        Ok(())
    }
}
