//! 时间工具函数: 业务时区转换
//!
//! "今天"、日期范围等边界都在业务时区计算，
//! 查询层只接收 UTC 时间戳。

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 业务时区的本地日期
pub fn local_date(at: DateTime<Utc>, tz: Tz) -> NaiveDate {
    at.with_timezone(&tz).date_naive()
}

/// 业务时区的今天
pub fn today(tz: Tz) -> NaiveDate {
    local_date(Utc::now(), tz)
}

/// 日期开始 (00:00:00) → UTC (业务时区)
///
/// DST gap fallback: 如果本地零点不存在 (夏令时跳跃)，fallback 到 UTC 零点。
pub fn day_start(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_time(chrono::NaiveTime::MIN);
    naive
        .and_local_timezone(tz)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

/// 日期结束 → 次日 00:00:00 (业务时区)
///
/// 返回次日零点，调用方使用 `< end` (不含) 语义。
pub fn day_end(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start(next_day, tz)
}

/// `[今天零点, 明天零点)` (业务时区)
pub fn day_bounds(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    (day_start(date, tz), day_end(date, tz))
}
