//! 解码状态校验.
//!
//! 每幅图像提交时最先运行: 检查结构性前提条件, 并把码流中声明的参考图像
//! 解析为表面对象, 按位置写入 `DecodeSubmission::reference_objects`.
//!
//! 参考帧缺失不会导致提交失败, 只记录诊断, 图像以现有参考解码.

use log::debug;
use tao_core::{TaoError, TaoResult};

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::params::{
    AvcPictureParams, Mpeg2PictureCodingType, Mpeg2PictureParams, PictureParameters,
    Vc1PictureParams, Vc1PictureType, Vp8PictureParams,
};
use crate::profile::Profile;
use crate::submission::{DecodeSubmission, MAX_REFERENCE_OBJECTS};
use crate::surface::{StorageHandle, SurfaceId, SurfaceResolver};

/// 校验一次解码提交并解析参考对象
pub fn validate<R: SurfaceResolver + ?Sized>(
    profile: Profile,
    submission: &mut DecodeSubmission,
    resolver: &R,
    diagnostics: &mut Diagnostics,
) -> TaoResult<()> {
    let target = submission
        .current_target
        .ok_or_else(|| TaoError::InvalidParameter("当前渲染目标无效".into()))?;
    let target_handle = resolver
        .lookup(target)
        .ok_or_else(|| TaoError::InvalidParameter(format!("当前渲染目标 {target} 不存在")))?;
    submission.current_storage = Some(target_handle);

    let codec = profile.codec()?;
    let picture_codec = submission.picture.codec();
    if picture_codec != codec {
        return Err(TaoError::InvalidParameter(format!(
            "图像参数类型 {picture_codec} 与 profile {profile} 不匹配"
        )));
    }

    submission.reference_objects = [None; MAX_REFERENCE_OBJECTS];
    let mut refs = ReferenceWriter {
        objects: &mut submission.reference_objects,
        resolver,
        diagnostics,
    };

    match &submission.picture {
        PictureParameters::Mpeg2(pic) => check_mpeg2(pic, &mut refs)?,
        PictureParameters::Avc(pic) => check_avc(profile, target, pic, &mut refs)?,
        PictureParameters::Vc1(pic) => check_vc1(pic, &mut refs)?,
        PictureParameters::Vp8(pic) => check_vp8(pic, &mut refs),
        PictureParameters::Jpeg => {}
    }

    debug!(
        "{codec}: 提交校验通过, target={target}, 参考对象 {} 个",
        submission.resolved_reference_count()
    );
    Ok(())
}

/// 按位置写入参考对象
struct ReferenceWriter<'a, R: ?Sized> {
    objects: &'a mut [Option<StorageHandle>; MAX_REFERENCE_OBJECTS],
    resolver: &'a R,
    diagnostics: &'a mut Diagnostics,
}

impl<R: SurfaceResolver + ?Sized> ReferenceWriter<'_, R> {
    /// 解析并写入, 无法解析或无存储时置空并记录诊断
    fn resolve_into(&mut self, position: usize, picture: Option<SurfaceId>) {
        let handle = picture.and_then(|id| self.resolver.resolve(id));
        if handle.is_none() {
            self.diagnostics
                .record(Diagnostic::MissingReference { position, picture });
        }
        self.objects[position] = handle;
    }
}

fn check_mpeg2<R: SurfaceResolver + ?Sized>(
    pic: &Mpeg2PictureParams,
    refs: &mut ReferenceWriter<'_, R>,
) -> TaoResult<()> {
    match pic.coding_type() {
        Some(Mpeg2PictureCodingType::I) => {}
        Some(Mpeg2PictureCodingType::P) => {
            refs.resolve_into(0, pic.forward_reference_picture);
        }
        Some(Mpeg2PictureCodingType::B) => {
            refs.resolve_into(0, pic.forward_reference_picture);
            refs.resolve_into(1, pic.backward_reference_picture);
        }
        None => {
            return Err(TaoError::InvalidParameter(format!(
                "MPEG-2: 不支持的 picture_coding_type={}",
                pic.picture_coding_type
            )));
        }
    }
    Ok(())
}

fn check_avc<R: SurfaceResolver + ?Sized>(
    profile: Profile,
    target: SurfaceId,
    pic: &AvcPictureParams,
    refs: &mut ReferenceWriter<'_, R>,
) -> TaoResult<()> {
    match pic.curr_pic.valid_id() {
        Some(id) if id == target => {}
        Some(id) => {
            return Err(TaoError::InvalidParameter(format!(
                "H264: CurrPic {id} 与渲染目标 {target} 不一致"
            )));
        }
        None => return Err(TaoError::InvalidParameter("H264: CurrPic 无效".into())),
    }

    if !profile.is_h264_baseline()
        && (pic.num_slice_groups_minus1 > 0 || pic.redundant_pic_cnt_present)
    {
        return Err(TaoError::InvalidParameter(format!(
            "H264: {profile} 不支持 FMO/ASO 约束, num_slice_groups_minus1={}, redundant_pic_cnt_present={}",
            pic.num_slice_groups_minus1, pic.redundant_pic_cnt_present
        )));
    }

    for (position, desc) in pic.reference_frames.iter().enumerate() {
        let Some(id) = desc.valid_id() else {
            continue;
        };
        let handle = refs.resolver.lookup(id).ok_or_else(|| {
            TaoError::InvalidParameter(format!("H264: 参考帧 {id} (位置 {position}) 不存在"))
        })?;
        if !refs.resolver.has_storage(handle) {
            refs.diagnostics
                .record(Diagnostic::DummyReference { picture: id });
        }
        refs.objects[position] = Some(handle);
    }
    Ok(())
}

fn check_vc1<R: SurfaceResolver + ?Sized>(
    pic: &Vc1PictureParams,
    refs: &mut ReferenceWriter<'_, R>,
) -> TaoResult<()> {
    match pic.picture_type() {
        Some(Vc1PictureType::I | Vc1PictureType::Bi) => {}
        Some(Vc1PictureType::P | Vc1PictureType::Skipped) => {
            refs.resolve_into(0, pic.forward_reference_picture);
        }
        Some(Vc1PictureType::B) => {
            refs.resolve_into(0, pic.forward_reference_picture);
            refs.resolve_into(1, pic.backward_reference_picture);
        }
        None => {
            return Err(TaoError::InvalidParameter(format!(
                "VC1: 不支持的 picture_type={}",
                pic.picture_type
            )));
        }
    }
    Ok(())
}

fn check_vp8<R: SurfaceResolver + ?Sized>(
    pic: &Vp8PictureParams,
    refs: &mut ReferenceWriter<'_, R>,
) {
    for (position, picture) in pic.references().into_iter().enumerate() {
        // 关键帧不声明任何参考, 不算缺失
        if picture.is_some() {
            refs.resolve_into(position, picture);
        }
    }
}
