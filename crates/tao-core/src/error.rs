//! 统一错误类型定义.
//!
//! 所有 Tao crate 共用的错误类型, 支持跨模块传播.
//!
//! 只有致命错误会以 `TaoError` 返回给调用者; 参考帧缺失、槽位耗尽等
//! 可容忍的数据问题由各模块内部记录为诊断信息, 不会作为错误抛出.

use thiserror::Error;

/// Tao 框架统一错误类型
#[derive(Debug, Error)]
pub enum TaoError {
    /// 无效参数 (图像参数结构不合法, 当前图像提交被放弃)
    #[error("无效参数: {0}")]
    InvalidParameter(String),

    /// 不支持的编码 profile
    #[error("不支持的 profile: {0}")]
    UnsupportedProfile(String),

    /// 后备存储分配失败
    #[error("存储分配失败: {0}")]
    AllocationFailed(String),

    /// 不支持的操作 (如不支持的色度格式)
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Tao 框架统一 Result 类型
pub type TaoResult<T> = Result<T, TaoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TaoError::InvalidParameter("当前渲染目标无效".into());
        assert_eq!(err.to_string(), "无效参数: 当前渲染目标无效");

        let err = TaoError::UnsupportedProfile("HevcMain".into());
        assert_eq!(err.to_string(), "不支持的 profile: HevcMain");
    }
}
