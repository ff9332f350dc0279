use std::time::Duration;

use chrono::FixedOffset;

use tbot_core::{
    domain::ChatId,
    filter::FilterCriteria,
    messaging::types::Command,
    pagination::WalkEnd,
    pipeline::RunSummary,
    scheduler::SchedulerStatus,
    service::DeliveryOutcome,
};

use crate::router::AppState;

pub(super) const SEARCHING: &str = "🔄 Шукаю актуальні тендери...";
pub(super) const NOTHING_FOUND: &str = "❌ Нових тендерів за заданими фільтрами не знайдено.";

fn format_interval(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        return format!("{} хв", secs / 60);
    }
    format!("{secs} с")
}

fn start_text(check_interval: Duration) -> String {
    format!(
        "🚀 Ласкаво просимо до бота моніторингу тендерів ProZorro!\n\n\
📋 Доступні команди:\n\
/tenders - Знайти актуальні тендери\n\
/status - Стан бота\n\
/help - Показати довідку\n\n\
🤖 Бот автоматично перевіряє нові тендери кожні {}",
        format_interval(check_interval)
    )
}

fn help_text(criteria: &FilterCriteria, check_interval: Duration) -> String {
    let mut lines = vec![
        "📖 Довідка по боту:\n".to_string(),
        "🔍 Фільтри пошуку:".to_string(),
        format!("• Статус: {}", criteria.required_status),
    ];

    if !criteria.regions.is_empty() {
        lines.push(format!("• Регіони: {}", criteria.regions.join(", ")));
    }
    if !criteria.region_keywords.is_empty() {
        lines.push(format!(
            "• Ключові слова регіону: {}",
            criteria.region_keywords.join(", ")
        ));
    }
    if criteria.category_prefixes.is_empty() {
        lines.push("• CPV коди: будь-які".to_string());
    } else {
        lines.push(format!(
            "• CPV коди: {}",
            criteria.category_prefixes.join(", ")
        ));
    }

    lines.push("\n⚙️ Команди:".to_string());
    lines.push("/tenders - Ручний пошук тендерів".to_string());
    lines.push("/status - Стан бота".to_string());
    lines.push("/start - Головне меню\n".to_string());
    lines.push(format!(
        "🔄 Автоматичні сповіщення надходять кожні {}",
        format_interval(check_interval)
    ));

    lines.join("\n")
}

fn describe_end(end: &WalkEnd) -> String {
    match end {
        WalkEnd::Exhausted => "список вичерпано".to_string(),
        WalkEnd::PageLimit => "ліміт сторінок".to_string(),
        WalkEnd::Failed(e) => format!("помилка: {e}"),
    }
}

fn status_text(
    seen: usize,
    last_run: Option<&RunSummary>,
    scheduler: &SchedulerStatus,
    offset: FixedOffset,
) -> String {
    let mut lines = vec![
        "📊 Стан бота\n".to_string(),
        format!("📦 Надіслано тендерів: {seen}"),
    ];

    match last_run {
        Some(run) => {
            let at = run.started_at.with_timezone(&offset).format("%d.%m.%Y %H:%M");
            lines.push(format!("🕒 Остання перевірка: {at}"));
            lines.push(format!(
                "   └─ сторінок: {} | отримано: {} | нових: {}",
                run.pages, run.listed, run.accepted
            ));
            if run.detail_failures > 0 {
                lines.push(format!("   └─ помилок деталей: {}", run.detail_failures));
            }
            lines.push(format!("   └─ завершення: {}", describe_end(&run.end)));
        }
        None => lines.push("⚪ Перевірок ще не було".to_string()),
    }

    if scheduler.running {
        lines.push(format!(
            "⏱ Автоперевірка: увімкнена ({} запусків)",
            scheduler.ticks
        ));
    } else {
        lines.push("⏸ Автоперевірка: вимкнена".to_string());
    }

    lines.join("\n")
}

/// Final reply after a manual search.
fn tenders_result_text(out: &DeliveryOutcome) -> String {
    if out.found == 0 {
        if let WalkEnd::Failed(e) = &out.summary.end {
            return format!("❌ Помилка: {e}");
        }
        return NOTHING_FOUND.to_string();
    }

    let mut text = format!("✅ Знайдено {} тендерів!", out.found);
    if out.report.failed > 0 {
        text.push_str(&format!(
            "\n⚠️ Не вдалося надіслати: {}",
            out.report.failed
        ));
    }
    text
}

async fn reply(state: &AppState, chat_id: ChatId, text: &str) {
    if let Err(e) = state.messenger.send_text(chat_id, text).await {
        tracing::warn!(chat_id = chat_id.0, error = %e, "reply failed");
    }
}

pub(super) async fn handle_command(cmd: Command, state: &AppState) {
    let chat_id = cmd.chat_id;
    tracing::info!(chat_id = chat_id.0, command = %cmd.name, "command received");

    match cmd.name.as_str() {
        "start" => {
            reply(state, chat_id, &start_text(state.cfg.check_interval)).await;
        }

        "help" => {
            let body = help_text(state.service.pipeline().criteria(), state.cfg.check_interval);
            reply(state, chat_id, &body).await;
        }

        "tenders" => {
            reply(state, chat_id, SEARCHING).await;
            let out = state.service.deliver(chat_id).await;
            reply(state, chat_id, &tenders_result_text(&out)).await;
        }

        "status" => {
            let pipeline = state.service.pipeline();
            let seen = pipeline.seen_count().await;
            let last = pipeline.last_run().await;
            let sched = state.scheduler.status().await;
            let body = status_text(
                seen,
                last.as_ref(),
                &sched,
                pipeline.formatter().display_offset(),
            );
            reply(state, chat_id, &body).await;
        }

        other => {
            let msg = format!("Невідома команда: /{other}\nСпробуйте /help");
            reply(state, chat_id, &msg).await;
        }
    }
}
