//! 可容忍数据问题的诊断记录.
//!
//! 参考帧缺失、槽位耗尽等问题不会中断解码, 只以诊断的形式记录,
//! 同类日志超过上限后不再输出.

use log::{info, warn};
use thiserror::Error;

use crate::surface::SurfaceId;

/// 默认的同类日志输出上限
pub const DEFAULT_LOG_LIMIT: u32 = 8;

/// 一条诊断
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    /// 参考帧未解析或没有后备存储, 对应位置置空
    #[error("参考帧缺失, position={position}, picture={picture:?}")]
    MissingReference {
        position: usize,
        picture: Option<SurfaceId>,
    },

    /// 参考帧没有后备存储, 以占位帧身份保留
    #[error("参考帧 {picture} 没有后备存储")]
    DummyReference { picture: SurfaceId },

    /// 参考帧存储分配失败
    #[error("参考帧 {picture} 存储分配失败: {reason}")]
    AllocationFailed { picture: SurfaceId, reason: String },

    /// DPB 没有空闲槽位, 参考帧未加入
    #[error("DPB 无空闲槽位, 参考帧 {picture} 未加入")]
    SlotExhausted { picture: SurfaceId },

    /// 切片参考列表引用了 DPB 之外的图像
    #[error("参考列表 {list} 中的图像 {picture} 不在 DPB 中")]
    ReferenceNotFound { list: u8, picture: SurfaceId },

    /// 检测到 MPEG-2 切片垂直位置填写错误
    #[error("上层错误填写了 MPEG-2 slice_vertical_position, 启用规避")]
    WorkaroundDetected,
}

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    MissingReference,
    DummyReference,
    AllocationFailed,
    SlotExhausted,
    ReferenceNotFound,
    WorkaroundDetected,
}

impl DiagnosticKind {
    const COUNT: usize = 6;

    fn slot(self) -> usize {
        self as usize
    }
}

impl Diagnostic {
    /// 诊断类别
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::MissingReference { .. } => DiagnosticKind::MissingReference,
            Self::DummyReference { .. } => DiagnosticKind::DummyReference,
            Self::AllocationFailed { .. } => DiagnosticKind::AllocationFailed,
            Self::SlotExhausted { .. } => DiagnosticKind::SlotExhausted,
            Self::ReferenceNotFound { .. } => DiagnosticKind::ReferenceNotFound,
            Self::WorkaroundDetected => DiagnosticKind::WorkaroundDetected,
        }
    }
}

/// 诊断收集器
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// 当前图像的诊断, 由 [`DecodeContext`](crate::DecodeContext) 在每次提交前清空
    events: Vec<Diagnostic>,
    /// 各类别累计次数
    counts: [u32; DiagnosticKind::COUNT],
    /// 同类日志输出上限
    log_limit: u32,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LIMIT)
    }
}

impl Diagnostics {
    pub fn new(log_limit: u32) -> Self {
        Self {
            events: Vec::new(),
            counts: [0; DiagnosticKind::COUNT],
            log_limit,
        }
    }

    /// 记录一条诊断
    pub fn record(&mut self, diagnostic: Diagnostic) {
        let slot = diagnostic.kind().slot();
        self.counts[slot] = self.counts[slot].saturating_add(1);
        let count = self.counts[slot];
        if count <= self.log_limit {
            match diagnostic {
                Diagnostic::WorkaroundDetected => info!("{diagnostic}"),
                _ => warn!("{diagnostic}"),
            }
        } else if count == self.log_limit.saturating_add(1) {
            warn!("{:?}: 同类诊断过多, 后续日志省略", diagnostic.kind());
        }
        self.events.push(diagnostic);
    }

    /// 某类诊断的累计次数
    pub fn count(&self, kind: DiagnosticKind) -> u32 {
        self.counts[kind.slot()]
    }

    /// 自上次清空以来的诊断
    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    /// 取出并清空诊断列表 (累计次数保留)
    pub fn take_events(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.events)
    }

    /// 丢弃诊断列表 (累计次数保留)
    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
