use anyhow::Context;
use desk_client::{AuthGateway, ClientConfig, RemoteGateway, RestGateway};
use front_desk::analytics::{self, DateRange};
use front_desk::queue::{BoardNotice, EngineConfig, QueueBoard};
use front_desk::{AdminSession, LocalStore, QueueManager, print_banner, setup_environment};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. 设置环境 (dotenv, 工作目录, 日志)
    let config = setup_environment()?;

    print_banner();
    tracing::info!(
        backend = %config.backend_url,
        timezone = %config.timezone,
        "Front desk monitor starting..."
    );

    // 2. 后端网关与本地会话库
    let rest = Arc::new(
        RestGateway::new(
            ClientConfig::new(&config.backend_url, &config.backend_anon_key)
                .with_timeout(config.request_timeout())
                .with_poll_interval(config.realtime_poll_interval()),
        )
        .context("failed to build backend client")?,
    );
    let store = LocalStore::open(config.session_db_path()).context("failed to open session store")?;

    // 3. 员工登录: 先恢复会话，失败再用环境变量凭据
    let auth: Arc<dyn AuthGateway> = rest.clone();
    let gateway: Arc<dyn RemoteGateway> = rest.clone();
    let mut admin = AdminSession::new(auth, gateway.clone(), store);
    let restored = admin.restore().await.cloned();
    let signed_in = match restored {
        Ok(signed_in) => signed_in,
        Err(e) => {
            tracing::info!(code = %e.code, "No valid stored session: {}", e);
            let email = std::env::var("ADMIN_EMAIL").context("ADMIN_EMAIL is not set")?;
            let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD is not set")?;
            admin.login(&email, &password).await?.clone()
        }
    };
    rest.set_access_token(signed_in.session.access_token.clone());
    let slug = signed_in.restaurant_slug().to_string();
    tracing::info!(
        restaurant = %slug,
        staff = %signed_in.profile.display_name(),
        "Signed in"
    );

    // 4. 最近 7 天统计
    match analytics::fetch(
        gateway.as_ref(),
        &slug,
        DateRange::last_7_days(config.timezone),
        config.timezone,
    )
    .await
    {
        Ok(report) => tracing::info!(
            total_queues = report.summary.total_queues,
            total_guests = report.summary.total_guests,
            cancelled = report.summary.cancelled,
            peak_hour = %report.summary.peak_hour_label(),
            most_used_table = %report.summary.most_used_table_label(),
            "Last 7 days"
        ),
        Err(e) => tracing::warn!(code = %e.code, "Analytics unavailable: {}", e),
    }

    // 5. 排队引擎
    let manager = QueueManager::spawn(gateway, &slug, EngineConfig::from(&config));
    let subscription = manager.subscribe_to_changes().await?;
    let outcome = manager.load_today().await?;
    tracing::info!(generation = outcome.generation(), "Today's board loaded");

    let mut board_rx = manager.watch_board();
    let mut notices = manager.notices();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
            changed = board_rx.changed() => {
                if changed.is_err() {
                    tracing::warn!("Queue engine stopped");
                    break;
                }
                let board = board_rx.borrow_and_update().clone();
                log_board(&manager, &board);
            }
            notice = notices.recv() => match notice {
                Ok(notice) => log_notice(&notice),
                Err(RecvError::Lagged(n)) => tracing::warn!(skipped = n, "Notice stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    subscription.shutdown().await;
    manager.shutdown();
    Ok(())
}

fn log_board(manager: &QueueManager, board: &QueueBoard) {
    let available = board.available_tables().count();
    tracing::info!(
        generation = board.generation(),
        pending = board.pending().count(),
        assigned = board.assigned().count(),
        tables = board.tables().len(),
        available,
        "Board updated"
    );
    for entry in board.pending() {
        let position = manager
            .estimate(entry.id)
            .map(|e| format!("#{} ~{} min", e.position, e.wait_minutes()))
            .unwrap_or_default();
        tracing::debug!(
            entry_id = entry.id,
            guests = entry.guests_count,
            waited = %manager.elapsed_label(entry),
            %position,
            "Waiting: {}",
            entry.name
        );
    }
}

fn log_notice(notice: &BoardNotice) {
    match notice {
        BoardNotice::Reloaded { generation } => {
            tracing::debug!(generation, "Board reloaded");
        }
        BoardNotice::StaleLoadDiscarded { generation } => {
            tracing::debug!(generation, "Stale load discarded");
        }
        BoardNotice::LoadFailed { generation, error } => {
            tracing::warn!(generation, code = %error.code, "Load failed: {}", error);
        }
        BoardNotice::PersistFailed {
            entry_id,
            op,
            error,
        } => {
            tracing::error!(entry_id, op, code = %error.code, "Change rolled back: {}", error);
        }
    }
}
