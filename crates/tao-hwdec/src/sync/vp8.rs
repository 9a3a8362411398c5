//! VP8 槽位表重建.

use log::debug;
use tao_core::{TaoError, TaoResult};

use super::{RefEntry, SyncEnv, SyncStrategy, fill_group, replicate_pairs, usable_entry};
use crate::frame_store::FrameStoreTable;
use crate::params::PictureParameters;
use crate::submission::DecodeSubmission;

/// VP8 同步策略
///
/// 槽位 0/1/2 依次为 last/golden/altref, 其余槽位按奇偶复制.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vp8Sync;

impl SyncStrategy for Vp8Sync {
    fn synchronize(
        &self,
        submission: &DecodeSubmission,
        table: &mut FrameStoreTable,
        env: &mut SyncEnv<'_>,
    ) -> TaoResult<()> {
        let PictureParameters::Vp8(pic) = &submission.picture else {
            return Err(TaoError::InvalidParameter(
                "VP8: 提交中不是 VP8 图像参数".into(),
            ));
        };

        let mut entries: [RefEntry; 3] = [None; 3];
        for (position, picture) in pic.references().into_iter().enumerate() {
            entries[position] = usable_entry(env, picture, submission.reference_objects[position]);
        }
        fill_group(table, 0, entries.len(), &entries);
        replicate_pairs(table, entries.len());

        debug!(
            "VP8: 重建槽位表, last={:?}, golden={:?}, altref={:?}",
            table.slots()[0].picture_id,
            table.slots()[1].picture_id,
            table.slots()[2].picture_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::params::Vp8PictureParams;
    use crate::surface::{SurfaceId, SurfacePool, SurfaceResolver};
    use crate::sync::SyncConfig;

    fn run(pool: &mut SurfacePool, target: SurfaceId, pic: Vp8PictureParams) -> FrameStoreTable {
        let mut sub = DecodeSubmission::new(target, pic.clone());
        for (position, picture) in pic.references().into_iter().enumerate() {
            sub.reference_objects[position] = picture.and_then(|id| pool.resolve(id));
        }
        let config = SyncConfig::default();
        let mut diag = Diagnostics::default();
        let mut env = SyncEnv {
            allocator: pool,
            config: &config,
            diagnostics: &mut diag,
        };
        let mut table = FrameStoreTable::new();
        Vp8Sync.synchronize(&sub, &mut table, &mut env).unwrap();
        table
    }

    #[test]
    fn test_all_references_present() {
        let mut pool = SurfacePool::new();
        let target = pool.create_surface(64, 64);
        let last = pool.create_surface_with_storage(64, 64).unwrap();
        let golden = pool.create_surface_with_storage(64, 64).unwrap();
        let alt = pool.create_surface_with_storage(64, 64).unwrap();
        let pic = Vp8PictureParams {
            frame_width: 64,
            frame_height: 64,
            last_ref_frame: Some(last),
            golden_ref_frame: Some(golden),
            alt_ref_frame: Some(alt),
        };
        let table = run(&mut pool, target, pic);

        assert_eq!(table.slots()[0].picture_id, Some(last));
        assert_eq!(table.slots()[1].picture_id, Some(golden));
        assert_eq!(table.slots()[2].picture_id, Some(alt));
        // 槽位 3 起按奇偶复制槽位 0/1
        assert_eq!(table.slots()[3].picture_id, Some(golden));
        assert_eq!(table.slots()[4].picture_id, Some(last));
        assert_eq!(table.slots()[15].picture_id, Some(golden));
    }

    #[test]
    fn test_missing_golden_copies_last() {
        let mut pool = SurfacePool::new();
        let target = pool.create_surface(64, 64);
        let last = pool.create_surface_with_storage(64, 64).unwrap();
        let alt = pool.create_surface_with_storage(64, 64).unwrap();
        let pic = Vp8PictureParams {
            frame_width: 64,
            frame_height: 64,
            last_ref_frame: Some(last),
            golden_ref_frame: None,
            alt_ref_frame: Some(alt),
        };
        let table = run(&mut pool, target, pic);

        assert_eq!(table.slots()[1], table.slots()[0]);
        assert_eq!(table.slots()[2].picture_id, Some(alt));
    }

    #[test]
    fn test_key_frame_has_no_references() {
        let mut pool = SurfacePool::new();
        let target = pool.create_surface(64, 64);
        let pic = Vp8PictureParams {
            frame_width: 64,
            frame_height: 64,
            ..Default::default()
        };
        let table = run(&mut pool, target, pic);
        assert_eq!(table.occupied_count(), 0);
    }
}
