//! 场景回放与结果汇总.

use anyhow::{Context, Result, anyhow};
use log::{debug, info};
use serde::Serialize;

use tao_core::PixelFormat;
use tao_hwdec::{
    DecodeContext, DecodeSubmission, FrameStoreTable, Profile, RefIdxTable, SurfaceAllocator,
    SurfaceId, SurfacePool,
};

use crate::scenario::{Scenario, SliceWork};

/// 回放结果
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub profile: String,
    pub pictures: Vec<PictureReport>,
    /// 结束时仍持有存储的表面数
    pub live_surfaces: usize,
    /// 结束时已分配的存储字节数
    pub allocated_bytes: usize,
}

impl ReplayReport {
    /// 提交失败的图像数
    pub fn failed_count(&self) -> usize {
        self.pictures.iter().filter(|p| p.error.is_some()).count()
    }
}

/// 单幅图像的结果
#[derive(Debug, Serialize)]
pub struct PictureReport {
    pub index: usize,
    pub target: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub frame_store: Vec<SlotReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ref_idx: Vec<SliceRefIdx>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpeg2_workaround: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

/// 已占用的槽位
#[derive(Debug, Serialize)]
pub struct SlotReport {
    pub position: usize,
    pub picture: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_index: Option<u8>,
}

/// 单个切片的参考索引表 (十六进制)
#[derive(Debug, Serialize)]
pub struct SliceRefIdx {
    pub slice: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list0: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list1: Option<String>,
}

/// 回放整个场景
pub fn run(scenario: &Scenario) -> Result<ReplayReport> {
    let profile = Profile::from_name(&scenario.profile)
        .ok_or_else(|| anyhow!("未知的 profile: {}", scenario.profile))?;
    let config = scenario.config.sync_config();
    let mut ctx = DecodeContext::new(profile, config).context("创建解码上下文失败")?;

    let mut pool = match scenario.config.memory_limit {
        Some(limit) => SurfacePool::with_memory_limit(limit),
        None => SurfacePool::new(),
    };
    for surface in &scenario.surfaces {
        let handle = pool.insert_surface(SurfaceId(surface.id), surface.width, surface.height);
        if surface.allocated {
            pool.ensure_storage(handle, PixelFormat::Nv12)
                .with_context(|| format!("预分配表面 #{} 失败", surface.id))?;
        }
    }
    info!(
        "开始回放: profile={profile}, 表面 {} 个, 图像 {} 幅",
        scenario.surfaces.len(),
        scenario.pictures.len()
    );

    let mut pictures = Vec::with_capacity(scenario.pictures.len());
    for (index, spec) in scenario.pictures.iter().enumerate() {
        for id in &spec.displayed {
            pool.set_displayed(SurfaceId(*id), true);
        }

        let (params, work) = spec
            .build()
            .with_context(|| format!("图像 {index} 参数无效"))?;
        let mut submission = DecodeSubmission::new(SurfaceId(spec.target), params);

        let mut report = PictureReport {
            index,
            target: spec.target,
            error: None,
            frame_store: Vec::new(),
            ref_idx: Vec::new(),
            mpeg2_workaround: None,
            diagnostics: Vec::new(),
        };

        match ctx.submit_picture(&mut pool, &mut submission) {
            Ok(()) => match work {
                SliceWork::Avc { slices } => {
                    for (slice, params) in slices.iter().enumerate() {
                        let state = ctx.slice_ref_idx_state(params);
                        report.ref_idx.push(SliceRefIdx {
                            slice,
                            list0: state.list0.as_ref().map(hex),
                            list1: state.list1.as_ref().map(hex),
                        });
                    }
                }
                SliceWork::Mpeg2 { picture, slices } => {
                    report.mpeg2_workaround = Some(ctx.mpeg2_slice_workaround(&picture, &slices));
                }
                SliceWork::None => {}
            },
            Err(err) => {
                debug!("图像 {index} 提交失败: {err}");
                report.error = Some(err.to_string());
            }
        }

        report.frame_store = snapshot(ctx.frame_store());
        report.diagnostics = ctx
            .diagnostics_mut()
            .take_events()
            .iter()
            .map(ToString::to_string)
            .collect();
        pictures.push(report);
    }

    Ok(ReplayReport {
        profile: profile.to_string(),
        pictures,
        live_surfaces: pool.live_storage_count(),
        allocated_bytes: pool.allocated_bytes(),
    })
}

fn snapshot(table: &FrameStoreTable) -> Vec<SlotReport> {
    table
        .slots()
        .iter()
        .enumerate()
        .filter_map(|(position, slot)| {
            slot.picture_id.map(|id| SlotReport {
                position,
                picture: id.0,
                slot_index: slot.slot_index,
            })
        })
        .collect()
}

fn hex(table: &RefIdxTable) -> String {
    table
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// 以文本形式输出
pub fn print_text(report: &ReplayReport) {
    println!("profile: {}", report.profile);
    for pic in &report.pictures {
        println!();
        println!("图像 {}: target=#{}", pic.index, pic.target);
        if let Some(err) = &pic.error {
            println!("  错误: {err}");
        }
        if pic.frame_store.is_empty() {
            println!("  槽位表: (空)");
        } else {
            println!("  槽位表:");
            for slot in &pic.frame_store {
                match slot.slot_index {
                    Some(index) => {
                        println!("    [{:2}] #{} -> fs{index}", slot.position, slot.picture)
                    }
                    None => println!("    [{:2}] #{}", slot.position, slot.picture),
                }
            }
        }
        for slice in &pic.ref_idx {
            if let Some(list0) = &slice.list0 {
                println!("  切片 {} list0: {list0}", slice.slice);
            }
            if let Some(list1) = &slice.list1 {
                println!("  切片 {} list1: {list1}", slice.slice);
            }
        }
        if let Some(workaround) = pic.mpeg2_workaround {
            println!("  切片位置规避: {}", if workaround { "是" } else { "否" });
        }
        for diag in &pic.diagnostics {
            println!("  诊断: {diag}");
        }
    }
    println!();
    println!(
        "结束: {} 幅失败, {} 个表面持有存储, 共 {} 字节",
        report.failed_count(),
        report.live_surfaces,
        report.allocated_bytes
    );
}
