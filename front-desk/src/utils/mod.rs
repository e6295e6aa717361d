//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - 日志、时间、格式化、输入校验

pub mod format;
pub mod logger;
pub mod time;
pub mod validation;

pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
