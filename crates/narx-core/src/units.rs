//! Unit normalization: converting a submitted (price, quantity, unit) triple
//! into a price per canonical base unit (kilogram, liter, or piece).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Currency tag every price is stored in. Reports tagged with another
/// supported currency are converted at the static configured rate before
/// persistence.
pub const BASE_CURRENCY: &str = "UZS";

/// Scale of a submitted quantity unit, recognized case-insensitively from
/// both Latin and Cyrillic tokens. Anything unrecognized counts pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitScale {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    Count,
}

impl UnitScale {
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "g" | "gr" | "gram" | "grams" | "г" | "гр" | "грамм" => Self::Gram,
            "kg" | "кг" => Self::Kilogram,
            "ml" | "мл" => Self::Milliliter,
            "l" | "liter" | "litre" | "л" | "литр" => Self::Liter,
            _ => Self::Count,
        }
    }

    /// Whether quantities in this unit are a thousandth of their base unit.
    #[must_use]
    pub fn is_subscale(self) -> bool {
        matches!(self, Self::Gram | Self::Milliliter)
    }
}

/// Returns the base-unit label shown next to normalized prices: mass units
/// read per-`кг`, volume units per-`л`, and counting units echo the
/// original token unchanged.
#[must_use]
pub fn base_unit_label(unit: &str) -> String {
    match UnitScale::parse(unit) {
        UnitScale::Gram | UnitScale::Kilogram => "кг".to_string(),
        UnitScale::Milliliter | UnitScale::Liter => "л".to_string(),
        UnitScale::Count => unit.trim().to_string(),
    }
}

/// Converts a submitted price for `quantity` of `unit` into the price per
/// base unit, rounded to integer granularity of the base currency.
///
/// Returns `None` when `quantity <= 0` or the result overflows: the report
/// is then stored unnormalized and aggregate math falls back to the raw
/// price.
#[must_use]
pub fn normalize(price: Decimal, quantity: Decimal, unit: &str) -> Option<i64> {
    if quantity <= Decimal::ZERO {
        return None;
    }

    let scale = UnitScale::parse(unit);
    let base_quantity = if scale.is_subscale() {
        quantity / Decimal::from(1000)
    } else {
        quantity
    };

    (price / base_quantity)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

#[derive(Debug, Error)]
pub enum CurrencyError {
    #[error("unsupported currency: {0}")]
    Unsupported(String),
    #[error("amount out of range after conversion")]
    OutOfRange,
}

/// Converts a currency-tagged amount into an integer amount of
/// [`BASE_CURRENCY`]. `USD` amounts use the static configured rate; there
/// is no live conversion service.
///
/// # Errors
///
/// Returns [`CurrencyError::Unsupported`] for unknown currency tags and
/// [`CurrencyError::OutOfRange`] when the converted amount does not fit an
/// `i64`.
pub fn to_base_currency(
    amount: Decimal,
    currency: &str,
    usd_rate: Decimal,
) -> Result<i64, CurrencyError> {
    let in_base = match currency.trim().to_uppercase().as_str() {
        BASE_CURRENCY => amount,
        "USD" => amount * usd_rate,
        other => return Err(CurrencyError::Unsupported(other.to_string())),
    };

    in_base
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(CurrencyError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(value: i64) -> Decimal {
        Decimal::from(value)
    }

    #[test]
    fn parse_recognizes_latin_and_cyrillic_mass_tokens() {
        for token in ["g", "GR", "gram", "г", "ГР", "грамм"] {
            assert_eq!(UnitScale::parse(token), UnitScale::Gram, "token {token}");
        }
        for token in ["kg", "KG", "кг", "Кг"] {
            assert_eq!(UnitScale::parse(token), UnitScale::Kilogram, "token {token}");
        }
    }

    #[test]
    fn parse_recognizes_volume_tokens() {
        assert_eq!(UnitScale::parse("ml"), UnitScale::Milliliter);
        assert_eq!(UnitScale::parse("мл"), UnitScale::Milliliter);
        assert_eq!(UnitScale::parse("l"), UnitScale::Liter);
        assert_eq!(UnitScale::parse("литр"), UnitScale::Liter);
    }

    #[test]
    fn parse_treats_unknown_tokens_as_count() {
        assert_eq!(UnitScale::parse("шт"), UnitScale::Count);
        assert_eq!(UnitScale::parse("piece"), UnitScale::Count);
        assert_eq!(UnitScale::parse("упаковка"), UnitScale::Count);
    }

    #[test]
    fn normalize_900ml_gives_per_liter_price() {
        // 9000 for 900 ml -> 9000 / 0.9 = 10000 per liter.
        assert_eq!(normalize(dec(9000), dec(900), "ml"), Some(10_000));
    }

    #[test]
    fn normalize_gram_and_kilogram_agree_under_rescaling() {
        let per_kg_from_grams = normalize(dec(4500), dec(500), "г");
        let per_kg_from_kg = normalize(dec(4500), Decimal::new(5, 1), "кг");
        assert_eq!(per_kg_from_grams, Some(9000));
        assert_eq!(per_kg_from_grams, per_kg_from_kg);
    }

    #[test]
    fn normalize_kilogram_scale_divides_directly() {
        assert_eq!(normalize(dec(4500), dec(1), "kg"), Some(4500));
        assert_eq!(normalize(dec(9000), dec(2), "кг"), Some(4500));
    }

    #[test]
    fn normalize_count_unit_divides_by_quantity() {
        assert_eq!(normalize(dec(12_000), dec(10), "шт"), Some(1200));
    }

    #[test]
    fn normalize_rounds_to_integer_granularity() {
        // 1000 / 3 = 333.33... -> 333
        assert_eq!(normalize(dec(1000), dec(3), "шт"), Some(333));
        // 1000 / 0.3 kg = 3333.33... -> 3333; and a half rounds away from zero
        assert_eq!(normalize(dec(1), dec(2), "шт"), Some(1));
    }

    #[test]
    fn normalize_skipped_for_non_positive_quantity() {
        assert_eq!(normalize(dec(4500), Decimal::ZERO, "kg"), None);
        assert_eq!(normalize(dec(4500), dec(-1), "kg"), None);
    }

    #[test]
    fn base_label_maps_mass_to_kg_and_volume_to_l() {
        assert_eq!(base_unit_label("г"), "кг");
        assert_eq!(base_unit_label("KG"), "кг");
        assert_eq!(base_unit_label("мл"), "л");
        assert_eq!(base_unit_label("литр"), "л");
        assert_eq!(base_unit_label("шт"), "шт");
    }

    #[test]
    fn base_currency_passes_through() {
        let amount = to_base_currency(dec(4500), "UZS", dec(12_800)).expect("uzs");
        assert_eq!(amount, 4500);
    }

    #[test]
    fn usd_converts_at_static_rate() {
        let amount = to_base_currency(Decimal::new(15, 1), "usd", dec(12_800)).expect("usd");
        assert_eq!(amount, 19_200);
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let err = to_base_currency(dec(100), "EUR", dec(12_800)).unwrap_err();
        assert!(matches!(err, CurrencyError::Unsupported(ref c) if c == "EUR"));
    }
}
