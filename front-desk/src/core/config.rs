use chrono_tz::Tz;
use std::path::PathBuf;
use std::time::Duration;

/// 前台配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/front-desk | 工作目录 (本地会话库、日志) |
/// | BACKEND_URL | http://localhost:54321 | 托管后端地址 |
/// | BACKEND_ANON_KEY | (空) | 后端公开 API key |
/// | BUSINESS_TIMEZONE | UTC | 业务时区 (IANA 名称) |
/// | TICK_INTERVAL_MS | 1000 | 计时心跳间隔(毫秒) |
/// | WAIT_MINUTES_PER_PARTY | 10 | 每桌预计等待分钟数 |
/// | ENFORCE_CAPACITY | false | 分配时是否校验桌台容量 |
/// | REQUEST_TIMEOUT_MS | 15000 | 请求超时(毫秒) |
/// | REALTIME_POLL_MS | 2000 | 变更轮询间隔(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (空) | 日志目录，为空时只输出到终端 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// BACKEND_URL=https://xyz.supabase.co BUSINESS_TIMEZONE=Asia/Kolkata cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储本地会话库、日志等文件
    pub work_dir: String,
    /// 托管后端地址
    pub backend_url: String,
    /// 后端公开 API key
    pub backend_anon_key: String,
    /// 业务时区，决定"今天"的边界
    pub timezone: Tz,
    /// 心跳间隔 (毫秒)
    pub tick_interval_ms: u64,
    /// 每桌预计等待分钟数
    pub wait_minutes_per_party: u32,
    /// 分配时是否校验容量
    pub enforce_capacity: bool,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 变更轮询间隔 (毫秒)
    pub realtime_poll_ms: u64,
    /// 日志级别
    pub log_level: String,
    /// 日志目录
    pub log_dir: Option<String>,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/front-desk".into()),
            backend_url: std::env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:54321".into()),
            backend_anon_key: std::env::var("BACKEND_ANON_KEY").unwrap_or_default(),
            timezone: std::env::var("BUSINESS_TIMEZONE")
                .ok()
                .and_then(|tz| parse_timezone(&tz))
                .unwrap_or(chrono_tz::UTC),
            tick_interval_ms: std::env::var("TICK_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(1000),
            wait_minutes_per_party: std::env::var("WAIT_MINUTES_PER_PARTY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            enforce_capacity: std::env::var("ENFORCE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15000),
            realtime_poll_ms: std::env::var("REALTIME_POLL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(2000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, timezone: Tz) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.timezone = timezone;
        config
    }

    /// 本地会话库路径
    pub fn session_db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("session.redb")
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn wait_per_party(&self) -> Duration {
        Duration::from_secs(u64::from(self.wait_minutes_per_party) * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn realtime_poll_interval(&self) -> Duration {
        Duration::from_millis(self.realtime_poll_ms)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 解析 IANA 时区名称，失败时记录警告
pub fn parse_timezone(name: &str) -> Option<Tz> {
    match name.trim().parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(e) => {
            tracing::warn!("Invalid BUSINESS_TIMEZONE '{}': {}, falling back to UTC", name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Kolkata"), Some(chrono_tz::Asia::Kolkata));
        assert_eq!(parse_timezone(" UTC "), Some(chrono_tz::UTC));
        assert_eq!(parse_timezone("Mars/Olympus"), None);
    }

    #[test]
    fn test_overrides_and_derived_values() {
        let mut config = Config::with_overrides("/tmp/desk", chrono_tz::Europe::Madrid);
        config.wait_minutes_per_party = 10;
        assert_eq!(config.timezone, chrono_tz::Europe::Madrid);
        assert_eq!(config.session_db_path(), PathBuf::from("/tmp/desk/session.redb"));
        assert_eq!(config.wait_per_party(), Duration::from_secs(600));
    }
}
