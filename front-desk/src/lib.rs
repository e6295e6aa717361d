//! Front Desk - 餐厅前台排队与桌位分配
//!
//! # 架构概述
//!
//! - **排队引擎** (`queue`): 单写者 worker 持有当日看板，分配/拒绝/完成入座
//! - **桌位管理** (`tables`): 分页列表、增改删，删除前检查引用
//! - **会话** (`session`): 顾客预约流程与员工登录，redb 本地持久化
//! - **统计** (`analytics`): 日期范围内的排队统计
//!
//! # 模块结构
//!
//! ```text
//! front-desk/src/
//! ├── core/          # 配置
//! ├── queue/         # 看板、动作、worker、订阅、心跳
//! ├── tables/        # 桌位服务
//! ├── session/       # 顾客/员工会话、本地存储
//! ├── analytics/     # 排队统计
//! └── utils/         # 日志、时间、格式化、校验
//! ```

pub mod analytics;
pub mod core;
pub mod queue;
pub mod session;
pub mod tables;
pub mod utils;

// Re-export 公共类型
pub use analytics::{DateRange, QueueAnalytics};
pub use core::Config;
pub use queue::{BoardNotice, ChangeSubscription, EngineConfig, QueueBoard, QueueManager};
pub use session::{AdminSession, GuestSession, LocalStore};
pub use tables::TableService;
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境: dotenv、工作目录、日志
pub fn setup_environment() -> anyhow::Result<Config> {
    // .env 不存在不是错误
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;
    if let Some(dir) = &config.log_dir {
        std::fs::create_dir_all(dir)?;
    }
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.is_production()),
        config.log_dir.as_deref(),
    );
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ______                 __     ____            __
   / ____/________  ____  / /_   / __ \___  _____/ /__
  / /_  / ___/ __ \/ __ \/ __/  / / / / _ \/ ___/ //_/
 / __/ / /  / /_/ / / / / /_   / /_/ /  __(__  ) ,<
/_/   /_/   \____/_/ /_/\__/  /_____/\___/____/_/|_|
    "#
    );
}
