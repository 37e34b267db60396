//! Price aggregation over a product's full report history, recomputed on
//! every read: raw-price range, current price, trailing calendar-month
//! average, and the good/neutral/bad status of the current price.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One price report as seen by the aggregator. Normalized price is present
/// only when a positive quantity and a recognized unit were submitted.
#[derive(Debug, Clone, Copy)]
pub struct ReportObservation {
    pub price: i64,
    pub normalized_price: Option<i64>,
    pub observed_at: DateTime<Utc>,
}

impl ReportObservation {
    /// The value this report contributes to comparisons: normalized when
    /// available, raw otherwise.
    #[must_use]
    pub fn comparable_price(&self) -> i64 {
        self.normalized_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceStatus {
    Good,
    Neutral,
    Bad,
}

/// The report with the latest submission timestamp. `index` points back
/// into the slice passed to [`aggregate`] so callers can recover joined
/// fields (store, author) for the same report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CurrentPrice {
    pub index: usize,
    pub price: i64,
    pub normalized_price: Option<i64>,
    pub observed_at: DateTime<Utc>,
}

/// Derived per-product summary. Never persisted; an empty report set
/// yields `None` everywhere and a `Neutral` status.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateView {
    /// Min/max over raw submitted prices, in original currency terms.
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub current: Option<CurrentPrice>,
    /// Arithmetic mean of normalized-else-raw prices over reports from the
    /// current calendar month. Absent (not zero) when the month is empty.
    pub monthly_average: Option<Decimal>,
    pub status: PriceStatus,
}

/// Classifies `current` against the aggregate average with a fixed 5%
/// tolerance band. Both numbers must already be comparable; without an
/// average the status is always neutral.
#[must_use]
pub fn classify(current: i64, average: Option<Decimal>) -> PriceStatus {
    let Some(average) = average else {
        return PriceStatus::Neutral;
    };

    let current = Decimal::from(current);
    if current <= average * Decimal::new(95, 2) {
        PriceStatus::Good
    } else if current >= average * Decimal::new(105, 2) {
        PriceStatus::Bad
    } else {
        PriceStatus::Neutral
    }
}

/// Computes the aggregate view for one product from its report history.
///
/// `now` supplies the wall-clock month/year for the trailing average; the
/// window is the current calendar month, not a rolling 30 days, so the
/// average resets at month boundaries. Pure: the same inputs always yield
/// the same view.
///
/// Reports must be passed in insertion order: timestamp ties for the
/// current price resolve to the most recently inserted report.
#[must_use]
pub fn aggregate(reports: &[ReportObservation], now: DateTime<Utc>) -> AggregateView {
    let min_price = reports.iter().map(|r| r.price).min();
    let max_price = reports.iter().map(|r| r.price).max();

    let mut current: Option<CurrentPrice> = None;
    for (index, report) in reports.iter().enumerate() {
        // `>=` keeps the later insertion on equal timestamps.
        if current.is_none_or(|c| report.observed_at >= c.observed_at) {
            current = Some(CurrentPrice {
                index,
                price: report.price,
                normalized_price: report.normalized_price,
                observed_at: report.observed_at,
            });
        }
    }

    let mut sum = Decimal::ZERO;
    let mut count: u32 = 0;
    for report in reports {
        if report.observed_at.year() == now.year() && report.observed_at.month() == now.month() {
            sum += Decimal::from(report.comparable_price());
            count += 1;
        }
    }
    let monthly_average = (count > 0).then(|| sum / Decimal::from(count));

    let status = current.map_or(PriceStatus::Neutral, |c| {
        classify(c.normalized_price.unwrap_or(c.price), monthly_average)
    });

    AggregateView {
        min_price,
        max_price,
        current,
        monthly_average,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn report(price: i64, normalized: Option<i64>, observed_at: DateTime<Utc>) -> ReportObservation {
        ReportObservation {
            price,
            normalized_price: normalized,
            observed_at,
        }
    }

    #[test]
    fn empty_history_yields_undefined_everything() {
        let view = aggregate(&[], at(2026, 1, 15));
        assert_eq!(view.min_price, None);
        assert_eq!(view.max_price, None);
        assert!(view.current.is_none());
        assert_eq!(view.monthly_average, None);
        assert_eq!(view.status, PriceStatus::Neutral);
    }

    #[test]
    fn single_report_collapses_range() {
        let view = aggregate(&[report(4500, Some(4500), at(2026, 1, 5))], at(2026, 1, 15));
        assert_eq!(view.min_price, Some(4500));
        assert_eq!(view.max_price, Some(4500));
        assert_eq!(view.current.expect("current").price, 4500);
    }

    #[test]
    fn two_reports_in_same_month_average_and_range() {
        // [{4500, Jan5}, {5000, Jan10}] -> avg 4750, range 4500-5000,
        // current 5000, and 5000 < 4750 * 1.05 so status is neutral.
        let reports = [
            report(4500, Some(4500), at(2026, 1, 5)),
            report(5000, Some(5000), at(2026, 1, 10)),
        ];
        let view = aggregate(&reports, at(2026, 1, 15));

        assert_eq!(view.min_price, Some(4500));
        assert_eq!(view.max_price, Some(5000));
        let current = view.current.expect("current");
        assert_eq!(current.price, 5000);
        assert_eq!(current.index, 1);
        assert_eq!(view.monthly_average, Some(Decimal::from(4750)));
        assert_eq!(view.status, PriceStatus::Neutral);
    }

    #[test]
    fn current_is_latest_timestamp_not_insertion_order() {
        let reports = [
            report(5000, None, at(2026, 1, 10)),
            report(4500, None, at(2026, 1, 5)),
        ];
        let view = aggregate(&reports, at(2026, 1, 15));
        assert_eq!(view.current.expect("current").price, 5000);
    }

    #[test]
    fn timestamp_tie_resolves_to_later_insertion() {
        let same = at(2026, 1, 10);
        let reports = [report(5000, None, same), report(4800, None, same)];
        let view = aggregate(&reports, at(2026, 1, 15));
        let current = view.current.expect("current");
        assert_eq!(current.index, 1);
        assert_eq!(current.price, 4800);
    }

    #[test]
    fn average_ignores_reports_outside_current_calendar_month() {
        let reports = [
            report(9000, Some(9000), at(2025, 12, 31)),
            report(5000, Some(5000), at(2026, 1, 10)),
        ];
        let view = aggregate(&reports, at(2026, 1, 15));
        assert_eq!(view.monthly_average, Some(Decimal::from(5000)));
        // Range still spans all history.
        assert_eq!(view.min_price, Some(5000));
        assert_eq!(view.max_price, Some(9000));
    }

    #[test]
    fn average_undefined_when_month_has_no_reports() {
        let reports = [report(5000, Some(5000), at(2025, 12, 20))];
        let view = aggregate(&reports, at(2026, 1, 15));
        assert_eq!(view.monthly_average, None);
        assert_eq!(view.status, PriceStatus::Neutral);
    }

    #[test]
    fn average_mixes_normalized_and_raw_contributions() {
        let reports = [
            report(9000, Some(10_000), at(2026, 1, 5)),
            report(8000, None, at(2026, 1, 6)),
        ];
        let view = aggregate(&reports, at(2026, 1, 15));
        assert_eq!(view.monthly_average, Some(Decimal::from(9000)));
    }

    #[test]
    fn classify_without_average_is_neutral() {
        assert_eq!(classify(5000, None), PriceStatus::Neutral);
    }

    #[test]
    fn classify_band_edges() {
        let avg = Some(Decimal::from(1000));
        assert_eq!(classify(950, avg), PriceStatus::Good);
        assert_eq!(classify(951, avg), PriceStatus::Neutral);
        assert_eq!(classify(1049, avg), PriceStatus::Neutral);
        assert_eq!(classify(1050, avg), PriceStatus::Bad);
    }

    #[test]
    fn classify_is_monotonic_in_current_price() {
        let avg = Some(Decimal::from(1000));
        let rank = |status: PriceStatus| match status {
            PriceStatus::Good => 0,
            PriceStatus::Neutral => 1,
            PriceStatus::Bad => 2,
        };
        let mut last = rank(classify(0, avg));
        for current in (0..2000).step_by(7) {
            let next = rank(classify(current, avg));
            assert!(next >= last, "status regressed at price {current}");
            last = next;
        }
    }

    #[test]
    fn status_uses_normalized_current_when_present() {
        // Raw current 9000 but normalized 10000; average of normalized
        // values is 9000, so 10000 >= 9450 -> bad.
        let reports = [
            report(9000, Some(8000), at(2026, 1, 4)),
            report(9000, Some(10_000), at(2026, 1, 10)),
        ];
        let view = aggregate(&reports, at(2026, 1, 15));
        assert_eq!(view.monthly_average, Some(Decimal::from(9000)));
        assert_eq!(view.status, PriceStatus::Bad);
    }

    #[test]
    fn price_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PriceStatus::Good).expect("serialize"),
            "\"good\""
        );
    }
}
