//! MPEG-2 / VC-1 / VP8 / JPEG 帧存储重建集成测试

use tao_dpb::core::TaoError;
use tao_dpb::hwdec::{
    DecodeContext, DecodeSubmission, DiagnosticKind, FrameStoreTable, MAX_SLOTS,
    Mpeg2CodingExtension, Mpeg2PictureParams, Mpeg2SliceParams, PictureParameters,
    PictureStructure, Profile, SurfaceId, SurfacePool, SyncConfig, Vc1PictureParams,
    Vp8PictureParams,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn submit(
    ctx: &mut DecodeContext,
    pool: &mut SurfacePool,
    target: SurfaceId,
    picture: impl Into<PictureParameters>,
) -> Result<(), TaoError> {
    ctx.submit_picture(pool, &mut DecodeSubmission::new(target, picture))
}

fn ids(table: &FrameStoreTable) -> Vec<Option<u32>> {
    table.slots().iter().map(|s| s.picture_id.map(|id| id.0)).collect()
}

/// 未写入的槽位复制前一个槽位, 或保持空闲
fn assert_duplicates_preceding(table: &FrameStoreTable, written: &[usize]) {
    for position in 1..MAX_SLOTS {
        if written.contains(&position) {
            continue;
        }
        let slot = table.slots()[position];
        if slot.is_occupied() {
            assert!(
                table.slots()[..position]
                    .iter()
                    .any(|prev| prev.picture_id == slot.picture_id),
                "槽位 {position} 不是复制得到的"
            );
        }
    }
}

fn mpeg2_field(
    coding_type: u8,
    structure: PictureStructure,
    first_field: bool,
    fwd: Option<SurfaceId>,
    bwd: Option<SurfaceId>,
) -> Mpeg2PictureParams {
    Mpeg2PictureParams {
        horizontal_size: 64,
        vertical_size: 64,
        forward_reference_picture: fwd,
        backward_reference_picture: bwd,
        picture_coding_type: coding_type,
        coding_extension: Mpeg2CodingExtension {
            picture_structure: structure,
            is_first_field: first_field,
            frame_pred_frame_dct: false,
            progressive_frame: false,
        },
    }
}

#[test]
fn test_mpeg2_ipb_sequence() {
    init_logger();
    let mut pool = SurfacePool::new();
    let i = pool.create_surface(64, 64);
    let p = pool.create_surface(64, 64);
    let b = pool.create_surface(64, 64);
    let mut ctx = DecodeContext::new(Profile::Mpeg2Main, SyncConfig::default()).unwrap();

    let frame = |coding_type, fwd, bwd| Mpeg2PictureParams {
        horizontal_size: 64,
        vertical_size: 64,
        forward_reference_picture: fwd,
        backward_reference_picture: bwd,
        picture_coding_type: coding_type,
        ..Default::default()
    };

    submit(&mut ctx, &mut pool, i, frame(1, None, None)).unwrap();
    assert_eq!(ctx.frame_store().occupied_count(), 0);

    submit(&mut ctx, &mut pool, p, frame(2, Some(i), None)).unwrap();
    assert_eq!(ids(ctx.frame_store())[..2], [Some(i.0), Some(i.0)]);

    submit(&mut ctx, &mut pool, b, frame(3, Some(i), Some(p))).unwrap();
    let table = ids(ctx.frame_store());
    assert_eq!(table[..2], [Some(i.0), Some(p.0)]);
    assert!(table[2..].iter().all(Option::is_none));
    assert_duplicates_preceding(ctx.frame_store(), &[0, 1]);
}

#[test]
fn test_mpeg2_field_pair() {
    init_logger();
    let mut pool = SurfacePool::new();
    let anchor = pool.create_surface(64, 64);
    let cur = pool.create_surface(64, 64);
    let mut ctx = DecodeContext::new(Profile::Mpeg2Main, SyncConfig::default()).unwrap();
    let intra = mpeg2_field(1, PictureStructure::TopField, true, None, None);
    submit(&mut ctx, &mut pool, anchor, intra).unwrap();

    // 顶场先解码, 底场为第二场并参考同帧顶场
    let top = mpeg2_field(2, PictureStructure::TopField, true, Some(anchor), None);
    submit(&mut ctx, &mut pool, cur, top).unwrap();
    assert_eq!(
        ids(ctx.frame_store())[..4],
        [Some(anchor.0), Some(anchor.0), Some(anchor.0), Some(anchor.0)]
    );

    let bottom = mpeg2_field(2, PictureStructure::BottomField, false, Some(anchor), None);
    submit(&mut ctx, &mut pool, cur, bottom).unwrap();
    assert_eq!(
        ids(ctx.frame_store())[..4],
        [Some(cur.0), Some(anchor.0), Some(anchor.0), Some(anchor.0)]
    );
}

#[test]
fn test_mpeg2_missing_reference_is_soft() {
    init_logger();
    let mut pool = SurfacePool::new();
    let target = pool.create_surface(64, 64);
    let mut ctx = DecodeContext::new(Profile::Mpeg2Simple, SyncConfig::default()).unwrap();

    let pic = Mpeg2PictureParams {
        forward_reference_picture: Some(SurfaceId(404)),
        picture_coding_type: 2,
        ..Default::default()
    };
    submit(&mut ctx, &mut pool, target, pic).unwrap();
    assert_eq!(ctx.frame_store().occupied_count(), 0);
    assert_eq!(ctx.diagnostics().count(DiagnosticKind::MissingReference), 1);
}

#[test]
fn test_mpeg2_workaround_is_sticky_per_stream() {
    init_logger();
    let mut ctx = DecodeContext::new(Profile::Mpeg2Main, SyncConfig::default()).unwrap();
    let mut pic = mpeg2_field(1, PictureStructure::BottomField, true, None, None);
    pic.vertical_size = 128;
    let rows = |v: &[u32]| v.iter().copied().map(Mpeg2SliceParams::at_row).collect::<Vec<_>>();

    let mut frame = pic.clone();
    frame.coding_extension.picture_structure = PictureStructure::Frame;
    assert!(!ctx.mpeg2_slice_workaround(&frame, &rows(&[0, 2, 4])));
    assert!(!ctx.mpeg2_slice_workaround(&pic, &rows(&[0, 1, 2, 3])));
    // 已判定为不需要, 之后不再改变
    assert!(!ctx.mpeg2_slice_workaround(&pic, &rows(&[0, 1, 2, 5])));
    assert_eq!(ctx.diagnostics().count(DiagnosticKind::WorkaroundDetected), 0);
}

#[test]
fn test_vc1_rebuild_each_picture() {
    init_logger();
    let mut pool = SurfacePool::new();
    let a = pool.create_surface(64, 64);
    let b = pool.create_surface(64, 64);
    let c = pool.create_surface(64, 64);
    let mut ctx = DecodeContext::new(Profile::Vc1Advanced, SyncConfig::default()).unwrap();

    submit(&mut ctx, &mut pool, a, Vc1PictureParams::default()).unwrap();
    let p = Vc1PictureParams {
        forward_reference_picture: Some(a),
        backward_reference_picture: None,
        picture_type: 1,
    };
    submit(&mut ctx, &mut pool, b, p).unwrap();
    assert!(ids(ctx.frame_store()).iter().all(|id| *id == Some(a.0)));

    let bpic = Vc1PictureParams {
        forward_reference_picture: Some(a),
        backward_reference_picture: Some(b),
        picture_type: 2,
    };
    submit(&mut ctx, &mut pool, c, bpic).unwrap();
    let table = ids(ctx.frame_store());
    for (position, id) in table.iter().enumerate() {
        let expected = if position % 2 == 0 { a } else { b };
        assert_eq!(*id, Some(expected.0));
    }

    // I 图像清空槽位表
    submit(&mut ctx, &mut pool, c, Vc1PictureParams::default()).unwrap();
    assert_eq!(ctx.frame_store().occupied_count(), 0);

    let bad = Vc1PictureParams {
        picture_type: 9,
        ..Default::default()
    };
    assert!(submit(&mut ctx, &mut pool, c, bad).is_err());
}

#[test]
fn test_vp8_reference_layout() {
    init_logger();
    let mut pool = SurfacePool::new();
    let last = pool.create_surface_with_storage(64, 64).unwrap();
    let golden = pool.create_surface_with_storage(64, 64).unwrap();
    let target = pool.create_surface(64, 64);
    let mut ctx = DecodeContext::new(Profile::Vp8Version0_3, SyncConfig::default()).unwrap();

    let pic = Vp8PictureParams {
        frame_width: 64,
        frame_height: 64,
        last_ref_frame: Some(last),
        golden_ref_frame: Some(golden),
        alt_ref_frame: None,
    };
    submit(&mut ctx, &mut pool, target, pic).unwrap();
    let table = ids(ctx.frame_store());
    assert_eq!(table[..3], [Some(last.0), Some(golden.0), Some(golden.0)]);
    assert_eq!(table[3], Some(golden.0));
    assert_eq!(table[4], Some(last.0));
    assert_duplicates_preceding(ctx.frame_store(), &[0, 1]);
    assert_eq!(ctx.segmentation_buffer().len(), 64 * 4);
}

#[test]
fn test_jpeg_and_unsupported_profiles() {
    init_logger();
    let mut pool = SurfacePool::new();
    let target = pool.create_surface(64, 64);

    let mut ctx = DecodeContext::new(Profile::JpegBaseline, SyncConfig::default()).unwrap();
    submit(&mut ctx, &mut pool, target, PictureParameters::Jpeg).unwrap();
    assert_eq!(ctx.frame_store().occupied_count(), 0);

    for profile in [Profile::None, Profile::HevcMain, Profile::Vp9Profile0] {
        let result = DecodeContext::new(profile, SyncConfig::default());
        assert!(matches!(result, Err(TaoError::UnsupportedProfile(_))));
    }
}
