//! Presentation formatting for catalog views: localized prices, ranges,
//! relative timestamps, and base-unit labels. Every function substitutes a
//! documented fallback for missing data instead of failing.

use chrono::{DateTime, Datelike, Utc};

use crate::aggregate::AggregateView;
use crate::units::base_unit_label;

/// Shown when a product has no price history yet.
pub const NO_PRICE_LABEL: &str = "Нет цен";
/// Shown when a report's store could not be resolved.
pub const UNKNOWN_STORE_LABEL: &str = "Неизвестно";

const MONTHS_SHORT: [&str; 12] = [
    "янв.", "февр.", "мар.", "апр.", "мая", "июн.", "июл.", "авг.", "сент.", "окт.", "нояб.",
    "дек.",
];

/// Presentation settings that vary per deployment, not per request.
#[derive(Debug, Clone)]
pub struct DisplayOptions {
    /// Glyph appended after formatted amounts.
    pub currency_symbol: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            currency_symbol: "сум".to_string(),
        }
    }
}

/// UI-ready projection of a product and its aggregate view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DisplayModel {
    pub display_name: String,
    pub formatted_price: String,
    pub price_range: String,
    pub last_update_relative: String,
    pub store_name: String,
    pub unit_label: String,
}

/// Groups an integer amount into thousands with spaces: `4500` -> `4 500`.
#[must_use]
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    grouped
}

/// Formats an amount with the currency glyph, or the no-price label.
#[must_use]
pub fn format_price(amount: Option<i64>, opts: &DisplayOptions) -> String {
    amount.map_or_else(
        || NO_PRICE_LABEL.to_string(),
        |a| format!("{} {}", format_amount(a), opts.currency_symbol),
    )
}

/// Formats a min/max range, collapsing to a single value when they match.
#[must_use]
pub fn format_range(min: Option<i64>, max: Option<i64>, opts: &DisplayOptions) -> String {
    match (min, max) {
        (Some(min), Some(max)) if min != max => format!(
            "{} – {} {}",
            format_amount(min),
            format_amount(max),
            opts.currency_symbol
        ),
        (Some(single), _) | (None, Some(single)) => format_price(Some(single), opts),
        (None, None) => NO_PRICE_LABEL.to_string(),
    }
}

/// Day plus abbreviated Russian month, e.g. `5 янв.`.
#[must_use]
pub fn format_short_date(at: DateTime<Utc>) -> String {
    let month = MONTHS_SHORT[at.month0() as usize];
    format!("{} {}", at.day(), month)
}

/// Relative age of `at`, bucketed in strictly ascending order: under a
/// minute, under an hour, under a day, then an absolute short date.
#[must_use]
pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(at);
    if elapsed.num_seconds() < 60 {
        "только что".to_string()
    } else if elapsed.num_minutes() < 60 {
        format!("{} мин. назад", elapsed.num_minutes())
    } else if elapsed.num_hours() < 24 {
        format!("{} ч. назад", elapsed.num_hours())
    } else {
        format_short_date(at)
    }
}

/// Builds the UI model for one product card from its aggregate view.
///
/// The current price wins over the range when present; a product with no
/// reports renders the no-price label, an unresolved store renders the
/// unknown-store label, and a missing update timestamp reads as fresh.
#[must_use]
pub fn present(
    name: &str,
    unit: &str,
    view: &AggregateView,
    store_name: Option<&str>,
    now: DateTime<Utc>,
    opts: &DisplayOptions,
) -> DisplayModel {
    let unit_label = base_unit_label(unit);
    let formatted_price = match view.current {
        Some(current) => format_price(Some(current.price), opts),
        None => format_range(view.min_price, view.max_price, opts),
    };

    DisplayModel {
        display_name: format!("{name} ({unit_label})"),
        formatted_price,
        price_range: format_range(view.min_price, view.max_price, opts),
        last_update_relative: view
            .current
            .map_or_else(|| "только что".to_string(), |c| {
                format_relative_time(c.observed_at, now)
            }),
        store_name: store_name.unwrap_or(UNKNOWN_STORE_LABEL).to_string(),
        unit_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, ReportObservation};
    use chrono::TimeZone;

    fn opts() -> DisplayOptions {
        DisplayOptions::default()
    }

    #[test]
    fn amounts_group_thousands_with_spaces() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(4500), "4 500");
        assert_eq!(format_amount(1_234_567), "1 234 567");
        assert_eq!(format_amount(-12_000), "-12 000");
    }

    #[test]
    fn missing_price_renders_label() {
        assert_eq!(format_price(None, &opts()), "Нет цен");
        assert_eq!(format_price(Some(4500), &opts()), "4 500 сум");
    }

    #[test]
    fn equal_range_collapses_to_single_value() {
        assert_eq!(format_range(Some(4500), Some(4500), &opts()), "4 500 сум");
        assert_eq!(
            format_range(Some(4500), Some(5000), &opts()),
            "4 500 – 5 000 сум"
        );
        assert_eq!(format_range(None, None, &opts()), "Нет цен");
    }

    #[test]
    fn relative_time_buckets_ascend() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let secs_ago = |s: i64| now - chrono::Duration::seconds(s);

        assert_eq!(format_relative_time(secs_ago(5), now), "только что");
        assert_eq!(format_relative_time(secs_ago(59), now), "только что");
        assert_eq!(format_relative_time(secs_ago(60), now), "1 мин. назад");
        assert_eq!(format_relative_time(secs_ago(45 * 60), now), "45 мин. назад");
        assert_eq!(format_relative_time(secs_ago(3 * 3600), now), "3 ч. назад");
        assert_eq!(format_relative_time(secs_ago(23 * 3600), now), "23 ч. назад");
    }

    #[test]
    fn day_old_updates_render_short_date() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 30, 0).unwrap();
        assert_eq!(format_relative_time(at, now), "5 янв.");
    }

    #[test]
    fn future_timestamps_read_as_fresh() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let at = now + chrono::Duration::seconds(30);
        assert_eq!(format_relative_time(at, now), "только что");
    }

    #[test]
    fn present_survives_empty_history() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let view = aggregate(&[], now);
        let model = present("Картофель", "кг", &view, None, now, &opts());

        assert_eq!(model.display_name, "Картофель (кг)");
        assert_eq!(model.formatted_price, "Нет цен");
        assert_eq!(model.price_range, "Нет цен");
        assert_eq!(model.store_name, "Неизвестно");
        assert_eq!(model.unit_label, "кг");
    }

    #[test]
    fn present_prefers_current_price_over_range() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let reports = [
            ReportObservation {
                price: 4500,
                normalized_price: Some(4500),
                observed_at: Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
            },
            ReportObservation {
                price: 5000,
                normalized_price: Some(5000),
                observed_at: Utc.with_ymd_and_hms(2026, 1, 10, 0, 0, 0).unwrap(),
            },
        ];
        let view = aggregate(&reports, now);
        let model = present("Картофель", "кг", &view, Some("Корзинка"), now, &opts());

        assert_eq!(model.formatted_price, "5 000 сум");
        assert_eq!(model.price_range, "4 500 – 5 000 сум");
        assert_eq!(model.store_name, "Корзинка");
        assert_eq!(model.last_update_relative, "10 янв.");
    }

    #[test]
    fn volume_product_gets_liter_label() {
        let now = Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap();
        let view = aggregate(&[], now);
        let model = present("Молоко", "мл", &view, None, now, &opts());
        assert_eq!(model.display_name, "Молоко (л)");
        assert_eq!(model.unit_label, "л");
    }
}
