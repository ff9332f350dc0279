//! Tender → notification text.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::{filter::leading_segment, tender::TenderRecord};

pub const TENDER_URL_BASE: &str = "https://prozorro.gov.ua/tender/";

const NO_TITLE: &str = "Немає назви";
const NO_CPV: &str = "Немає CPV";
const NO_STATUS: &str = "Немає статусу";
const NO_DEADLINE: &str = "Немає дедлайну";
const NO_ENTITY: &str = "Немає замовника";
const NO_TAX_ID: &str = "Немає ЄДРПОУ";
const NO_AMOUNT: &str = "немає бюджету";

const DEADLINE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Renders tenders with a fixed field order.
#[derive(Clone, Copy, Debug)]
pub struct TenderFormatter {
    display_offset: FixedOffset,
}

impl TenderFormatter {
    pub fn new(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    pub fn format(&self, t: &TenderRecord) -> String {
        let codes = display_cpv_codes(t);
        let codes = if codes.is_empty() {
            NO_CPV.to_string()
        } else {
            codes.join(", ")
        };

        let deadline = t
            .deadline()
            .map(|raw| self.format_deadline(raw))
            .unwrap_or_else(|| NO_DEADLINE.to_string());

        let entity = t.procuring_entity.as_ref();
        let entity_name = entity
            .and_then(|e| e.name.as_deref())
            .unwrap_or(NO_ENTITY);
        let tax_id = entity
            .and_then(|e| e.identifier.as_ref())
            .and_then(|i| i.id.as_deref())
            .unwrap_or(NO_TAX_ID);

        let amount = t
            .value
            .as_ref()
            .and_then(|v| v.amount)
            .map(format_amount)
            .unwrap_or_else(|| NO_AMOUNT.to_string());
        let currency = t
            .value
            .as_ref()
            .and_then(|v| v.currency.as_deref())
            .unwrap_or("");

        let lines = [
            "📌 Новий тендер!".to_string(),
            format!("Tender ID: {}", t.id),
            format!("Предмет закупівлі: {}", t.title.as_deref().unwrap_or(NO_TITLE)),
            format!("CPV Код: {codes}"),
            format!("Статус: {}", t.status.as_deref().unwrap_or(NO_STATUS)),
            format!("Дедлайн: {deadline}"),
            format!("Замовник: {entity_name}"),
            format!("ЄДРПОУ: {tax_id}"),
            format!("Сума: {amount} {currency}").trim_end().to_string(),
            format!("Посилання: {}", permalink(&t.id)),
        ];
        lines.join("\n")
    }

    /// Convert an ISO-8601 timestamp to the display offset.
    ///
    /// Unparseable input is returned unchanged.
    pub fn format_deadline(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return dt
                .with_timezone(&self.display_offset)
                .format(DEADLINE_FORMAT)
                .to_string();
        }
        // No offset at all: already wall-clock time, just reformat.
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return naive.format(DEADLINE_FORMAT).to_string();
        }
        tracing::warn!(deadline = raw, "unparseable deadline, passing through");
        raw.to_string()
    }
}

pub fn permalink(id: &str) -> String {
    format!("{TENDER_URL_BASE}{id}")
}

/// Leading CPV segments, de-duplicated, in first-appearance order.
pub fn display_cpv_codes(t: &TenderRecord) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for code in t.cpv_codes() {
        let seg = leading_segment(code);
        if seg.is_empty() {
            continue;
        }
        if seen.insert(seg) {
            out.push(seg.to_string());
        }
    }
    out
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < 1e15 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}
