//! JSON 回放场景.
//!
//! 场景描述一个码流的解码表面与按解码顺序排列的图像提交, 例如:
//!
//! ```json
//! {
//!   "profile": "h264-high",
//!   "config": { "missing_storage": "tolerate" },
//!   "surfaces": [{ "id": 0 }, { "id": 1 }],
//!   "pictures": [
//!     { "target": 0, "codec": "avc", "references": [] },
//!     { "target": 1, "codec": "avc", "references": [{ "id": 0 }],
//!       "slices": [{ "slice_type": "p", "list0": [{ "id": 0 }] }] }
//!   ]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use tao_hwdec::params::avc::MAX_REFERENCE_FRAMES;
use tao_hwdec::{
    AvcPictureParams, AvcSliceParams, EntropyCodingMode, MissingStoragePolicy,
    Mpeg2CodingExtension, Mpeg2PictureParams, Mpeg2SliceParams, PictureFlags, PictureParameters,
    PictureStructure, ReferencePictureDescriptor, SliceType, SurfaceId, SyncConfig,
    Vc1PictureParams, Vp8PictureParams,
};

/// 回放场景
#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// profile 名称, 如 "h264-main"、"mpeg2-main"、"vp8"
    pub profile: String,
    #[serde(default)]
    pub config: ConfigSpec,
    #[serde(default)]
    pub surfaces: Vec<SurfaceSpec>,
    pub pictures: Vec<PictureSpec>,
}

impl Scenario {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("读取场景文件失败: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("解析场景文件失败: {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(text)?;
        if scenario.pictures.is_empty() {
            bail!("场景中没有图像");
        }
        Ok(scenario)
    }
}

/// 同步与表面池配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigSpec {
    pub missing_storage: PolicySpec,
    pub diagnostic_log_limit: Option<u32>,
    /// 表面存储总量上限 (字节)
    pub memory_limit: Option<usize>,
}

impl ConfigSpec {
    pub fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig {
            missing_storage: match self.missing_storage {
                PolicySpec::Tolerate => MissingStoragePolicy::Tolerate,
                PolicySpec::Drop => MissingStoragePolicy::Drop,
            },
            ..SyncConfig::default()
        };
        if let Some(limit) = self.diagnostic_log_limit {
            config.diagnostic_log_limit = limit;
        }
        config
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicySpec {
    #[default]
    Tolerate,
    Drop,
}

/// 解码表面
#[derive(Debug, Clone, Deserialize)]
pub struct SurfaceSpec {
    pub id: u32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    /// 是否预先分配存储
    #[serde(default)]
    pub allocated: bool,
}

fn default_width() -> u32 {
    64
}

fn default_height() -> u32 {
    64
}

/// 一次图像提交
#[derive(Debug, Clone, Deserialize)]
pub struct PictureSpec {
    /// 渲染目标
    pub target: u32,
    /// 提交前完成显示的表面
    #[serde(default)]
    pub displayed: Vec<u32>,
    #[serde(flatten)]
    pub params: ParamsSpec,
}

/// 各编解码器的图像参数
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "codec", rename_all = "lowercase")]
pub enum ParamsSpec {
    Mpeg2(Mpeg2Spec),
    Avc(AvcSpec),
    Vc1(Vc1Spec),
    Vp8(Vp8Spec),
    Jpeg,
}

/// 参考图像
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RefSpec {
    pub id: u32,
    #[serde(default)]
    pub long_term: bool,
    #[serde(default)]
    pub parity: ParitySpec,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParitySpec {
    #[default]
    Frame,
    Top,
    Bottom,
}

impl RefSpec {
    fn descriptor(&self) -> ReferencePictureDescriptor {
        let mut flags = if self.long_term {
            PictureFlags::LONG_TERM_REFERENCE
        } else {
            PictureFlags::SHORT_TERM_REFERENCE
        };
        match self.parity {
            ParitySpec::Frame => {}
            ParitySpec::Top => flags |= PictureFlags::TOP_FIELD,
            ParitySpec::Bottom => flags |= PictureFlags::BOTTOM_FIELD,
        }
        ReferencePictureDescriptor {
            picture_id: Some(SurfaceId(self.id)),
            flags,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvcSpec {
    /// 当前图像, 缺省为渲染目标本身
    #[serde(default)]
    pub curr_pic: Option<RefSpec>,
    #[serde(default)]
    pub references: Vec<RefSpec>,
    #[serde(default = "default_chroma_format")]
    pub chroma_format_idc: u8,
    #[serde(default)]
    pub num_slice_groups_minus1: u8,
    #[serde(default)]
    pub redundant_pic_cnt_present: bool,
    #[serde(default)]
    pub cabac: bool,
    #[serde(default)]
    pub slices: Vec<AvcSliceSpec>,
}

fn default_chroma_format() -> u8 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvcSliceSpec {
    /// "p" / "b" / "i" / "sp" / "si"
    pub slice_type: String,
    #[serde(default)]
    pub list0: Vec<RefSpec>,
    #[serde(default)]
    pub list1: Vec<RefSpec>,
    /// 生效条目数, 缺省为列表长度
    #[serde(default)]
    pub num_ref_idx_l0_active: Option<u8>,
    #[serde(default)]
    pub num_ref_idx_l1_active: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Mpeg2Spec {
    /// 1=I, 2=P, 3=B
    pub picture_coding_type: u8,
    #[serde(default = "default_mpeg2_width")]
    pub horizontal_size: u16,
    #[serde(default = "default_mpeg2_height")]
    pub vertical_size: u16,
    #[serde(default)]
    pub forward: Option<u32>,
    #[serde(default)]
    pub backward: Option<u32>,
    #[serde(default)]
    pub structure: StructureSpec,
    #[serde(default = "default_true")]
    pub is_first_field: bool,
    #[serde(default = "default_true")]
    pub frame_pred_frame_dct: bool,
    #[serde(default = "default_true")]
    pub progressive_frame: bool,
    /// 各切片的 slice_vertical_position
    #[serde(default)]
    pub slices: Vec<u32>,
}

fn default_mpeg2_width() -> u16 {
    720
}

fn default_mpeg2_height() -> u16 {
    576
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureSpec {
    #[default]
    Frame,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vc1Spec {
    /// 0=I, 1=P, 2=B, 3=BI, 4=skipped
    pub picture_type: u8,
    #[serde(default)]
    pub forward: Option<u32>,
    #[serde(default)]
    pub backward: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vp8Spec {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub last: Option<u32>,
    #[serde(default)]
    pub golden: Option<u32>,
    #[serde(default)]
    pub alt: Option<u32>,
}

/// 图像提交后需要逐切片处理的内容
#[derive(Debug, Clone)]
pub enum SliceWork {
    None,
    Avc {
        slices: Vec<AvcSliceParams>,
    },
    Mpeg2 {
        picture: Mpeg2PictureParams,
        slices: Vec<Mpeg2SliceParams>,
    },
}

impl PictureSpec {
    /// 转换为库的图像参数
    pub fn build(&self) -> Result<(PictureParameters, SliceWork)> {
        let target = SurfaceId(self.target);
        let built = match &self.params {
            ParamsSpec::Avc(spec) => {
                let curr_pic = spec
                    .curr_pic
                    .map_or(ReferencePictureDescriptor::frame(target), |r| r.descriptor());
                if spec.references.len() > MAX_REFERENCE_FRAMES {
                    bail!("参考帧数量 {} 超过 16", spec.references.len());
                }
                let refs: Vec<_> = spec.references.iter().map(RefSpec::descriptor).collect();
                let mut pic = AvcPictureParams::with_references(curr_pic, &refs);
                pic.chroma_format_idc = spec.chroma_format_idc;
                pic.num_slice_groups_minus1 = spec.num_slice_groups_minus1;
                pic.redundant_pic_cnt_present = spec.redundant_pic_cnt_present;
                pic.entropy_coding_mode = if spec.cabac {
                    EntropyCodingMode::Cabac
                } else {
                    EntropyCodingMode::Cavlc
                };
                let slices = spec
                    .slices
                    .iter()
                    .map(AvcSliceSpec::build)
                    .collect::<Result<Vec<_>>>()?;
                (pic.into(), SliceWork::Avc { slices })
            }
            ParamsSpec::Mpeg2(spec) => {
                let picture = Mpeg2PictureParams {
                    horizontal_size: spec.horizontal_size,
                    vertical_size: spec.vertical_size,
                    forward_reference_picture: spec.forward.map(SurfaceId),
                    backward_reference_picture: spec.backward.map(SurfaceId),
                    picture_coding_type: spec.picture_coding_type,
                    coding_extension: Mpeg2CodingExtension {
                        picture_structure: match spec.structure {
                            StructureSpec::Frame => PictureStructure::Frame,
                            StructureSpec::Top => PictureStructure::TopField,
                            StructureSpec::Bottom => PictureStructure::BottomField,
                        },
                        is_first_field: spec.is_first_field,
                        frame_pred_frame_dct: spec.frame_pred_frame_dct,
                        progressive_frame: spec.progressive_frame,
                    },
                };
                let slices = spec.slices.iter().copied().map(Mpeg2SliceParams::at_row).collect();
                (
                    picture.clone().into(),
                    SliceWork::Mpeg2 { picture, slices },
                )
            }
            ParamsSpec::Vc1(spec) => {
                let pic = Vc1PictureParams {
                    forward_reference_picture: spec.forward.map(SurfaceId),
                    backward_reference_picture: spec.backward.map(SurfaceId),
                    picture_type: spec.picture_type,
                };
                (pic.into(), SliceWork::None)
            }
            ParamsSpec::Vp8(spec) => {
                let pic = Vp8PictureParams {
                    frame_width: spec.width,
                    frame_height: spec.height,
                    last_ref_frame: spec.last.map(SurfaceId),
                    golden_ref_frame: spec.golden.map(SurfaceId),
                    alt_ref_frame: spec.alt.map(SurfaceId),
                };
                (pic.into(), SliceWork::None)
            }
            ParamsSpec::Jpeg => (PictureParameters::Jpeg, SliceWork::None),
        };
        Ok(built)
    }
}

impl AvcSliceSpec {
    fn build(&self) -> Result<AvcSliceParams> {
        let slice_type = match self.slice_type.to_ascii_lowercase().as_str() {
            "p" => SliceType::P,
            "b" => SliceType::B,
            "i" => SliceType::I,
            "sp" => SliceType::Sp,
            "si" => SliceType::Si,
            other => bail!("未知的切片类型: {other}"),
        };
        let list0: Vec<_> = self.list0.iter().map(RefSpec::descriptor).collect();
        let list1: Vec<_> = self.list1.iter().map(RefSpec::descriptor).collect();
        Ok(AvcSliceParams {
            slice_type,
            num_ref_idx_l0_active_minus1: active_minus1(self.num_ref_idx_l0_active, list0.len()),
            num_ref_idx_l1_active_minus1: active_minus1(self.num_ref_idx_l1_active, list1.len()),
            ref_pic_list0: list0,
            ref_pic_list1: list1,
            ..Default::default()
        })
    }
}

fn active_minus1(active: Option<u8>, len: usize) -> u8 {
    let count = active.map_or(len, usize::from).clamp(1, 32);
    (count - 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const AVC_SCENARIO: &str = r#"{
        "profile": "h264-high",
        "config": { "missing_storage": "drop", "diagnostic_log_limit": 2 },
        "surfaces": [{ "id": 0 }, { "id": 1, "width": 32, "height": 32, "allocated": true }],
        "pictures": [
            { "target": 0, "codec": "avc" },
            { "target": 1, "codec": "avc", "displayed": [0],
              "references": [{ "id": 0, "long_term": true }],
              "slices": [{ "slice_type": "P", "list0": [{ "id": 0, "long_term": true }] }] }
        ]
    }"#;

    #[test]
    fn test_parse_avc_scenario() {
        let scenario = Scenario::parse(AVC_SCENARIO).unwrap();
        assert_eq!(scenario.profile, "h264-high");
        assert_eq!(scenario.surfaces.len(), 2);
        assert_eq!(scenario.surfaces[0].width, 64);
        assert!(scenario.surfaces[1].allocated);

        let config = scenario.config.sync_config();
        assert_eq!(config.missing_storage, MissingStoragePolicy::Drop);
        assert_eq!(config.diagnostic_log_limit, 2);

        let (params, work) = scenario.pictures[1].build().unwrap();
        let PictureParameters::Avc(pic) = params else {
            panic!("应为 H.264 参数");
        };
        assert!(pic.reference_frames[0].is_long_term());
        assert!(!pic.reference_frames[1].is_valid());
        let SliceWork::Avc { slices } = work else {
            panic!("应包含 H.264 切片");
        };
        assert_eq!(slices[0].slice_type, SliceType::P);
        assert_eq!(slices[0].num_ref_idx_l0_active_minus1, 0);
    }

    #[test]
    fn test_long_term_field_flags() {
        let spec = RefSpec {
            id: 3,
            long_term: true,
            parity: ParitySpec::Bottom,
        };
        let desc = spec.descriptor();
        assert!(desc.flags.contains(PictureFlags::LONG_TERM_REFERENCE));
        assert!(desc.flags.contains(PictureFlags::BOTTOM_FIELD));
        assert!(!desc.flags.contains(PictureFlags::SHORT_TERM_REFERENCE));
    }

    #[test]
    fn test_mpeg2_defaults() {
        let scenario = Scenario::parse(
            r#"{ "profile": "mpeg2-main",
                 "pictures": [{ "target": 0, "codec": "mpeg2", "picture_coding_type": 1,
                                "structure": "top", "progressive_frame": false,
                                "slices": [0, 1, 2] }] }"#,
        )
        .unwrap();
        let (_, work) = scenario.pictures[0].build().unwrap();
        let SliceWork::Mpeg2 { picture, slices } = work else {
            panic!("应包含 MPEG-2 切片");
        };
        assert_eq!(picture.vertical_size, 576);
        assert!(picture.is_field_picture());
        assert!(picture.coding_extension.frame_pred_frame_dct);
        assert_eq!(slices.len(), 3);
    }

    #[test]
    fn test_reject_bad_input() {
        assert!(Scenario::parse(r#"{ "profile": "vp8", "pictures": [] }"#).is_err());
        assert!(Scenario::parse(r#"{ "profile": "vp8", "pictures": [{ "target": 0, "codec": "h265" }] }"#).is_err());

        let scenario = Scenario::parse(
            r#"{ "profile": "h264-main",
                 "pictures": [{ "target": 0, "codec": "avc", "slices": [{ "slice_type": "x" }] }] }"#,
        )
        .unwrap();
        assert!(scenario.pictures[0].build().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(AVC_SCENARIO.as_bytes()).unwrap();
        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.pictures.len(), 2);

        let missing = file.path().with_extension("missing");
        let err = Scenario::load(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("读取场景文件失败"));
    }
}
