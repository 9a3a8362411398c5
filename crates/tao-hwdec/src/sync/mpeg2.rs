//! MPEG-2 槽位表重建.
//!
//! 槽位 0-1 存放顶场参考, 槽位 2-3 存放底场参考 (仅场预测时使用).
//! 组内参考紧凑排列, 不足部分复制组内前一个槽位.

use log::debug;
use tao_core::{TaoError, TaoResult};

use super::{RefEntry, SyncEnv, SyncStrategy, fill_group, usable_entry};
use crate::frame_store::FrameStoreTable;
use crate::params::{Mpeg2PictureCodingType, Mpeg2PictureParams, PictureParameters, PictureStructure};
use crate::submission::DecodeSubmission;

/// 每组槽位数
const GROUP_LEN: usize = 2;

/// MPEG-2 同步策略
#[derive(Debug, Clone, Copy, Default)]
pub struct Mpeg2Sync;

impl SyncStrategy for Mpeg2Sync {
    fn synchronize(
        &self,
        submission: &DecodeSubmission,
        table: &mut FrameStoreTable,
        env: &mut SyncEnv<'_>,
    ) -> TaoResult<()> {
        let PictureParameters::Mpeg2(pic) = &submission.picture else {
            return Err(TaoError::InvalidParameter(
                "MPEG-2: 提交中不是 MPEG-2 图像参数".into(),
            ));
        };

        let current = usable_entry(env, submission.current_target, submission.current_storage);
        let forward = usable_entry(
            env,
            pic.forward_reference_picture,
            submission.reference_objects[0],
        );
        let backward = usable_entry(
            env,
            pic.backward_reference_picture,
            submission.reference_objects[1],
        );

        table.reset();

        // 底场第二场以同帧顶场为参考, 放在顶场组首位
        let top = group_entries(pic, PictureStructure::BottomField, current, forward, backward);
        fill_group(table, 0, GROUP_LEN, &top);

        if !pic.coding_extension.frame_pred_frame_dct {
            let bottom = group_entries(pic, PictureStructure::TopField, current, forward, backward);
            fill_group(table, GROUP_LEN, GROUP_LEN, &bottom);
        }

        debug!(
            "MPEG-2: 重建槽位表, coding_type={}, 占用 {} 个槽位",
            pic.picture_coding_type,
            table.occupied_count()
        );
        Ok(())
    }
}

/// 一组槽位的参考帧, 已去除缺失项
///
/// `self_ref_structure` 为需要把当前图像作为参考的第二场结构.
fn group_entries(
    pic: &Mpeg2PictureParams,
    self_ref_structure: PictureStructure,
    current: RefEntry,
    forward: RefEntry,
    backward: RefEntry,
) -> Vec<RefEntry> {
    let candidates = match pic.coding_type() {
        Some(Mpeg2PictureCodingType::P) => {
            let self_ref = pic.is_second_field()
                && pic.coding_extension.picture_structure == self_ref_structure;
            if self_ref {
                vec![current, forward]
            } else {
                vec![forward]
            }
        }
        Some(Mpeg2PictureCodingType::B) => vec![forward, backward],
        _ => Vec::new(),
    };
    candidates.into_iter().filter(Option::is_some).collect()
}
