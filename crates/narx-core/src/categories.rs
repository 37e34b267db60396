use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed product category set. Stored and serialized under the
/// user-facing Russian labels the catalog has always used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductCategory {
    #[serde(rename = "Овощи")]
    Vegetables,
    #[serde(rename = "Фрукты")]
    Fruits,
    #[serde(rename = "Мясо")]
    Meat,
    #[serde(rename = "Молочные продукты")]
    Dairy,
    #[serde(rename = "Бакалея")]
    Grocery,
    #[serde(rename = "Напитки")]
    Drinks,
    #[serde(rename = "Хлеб")]
    Bread,
    #[serde(rename = "Бытовая химия")]
    Household,
}

impl ProductCategory {
    pub const ALL: [Self; 8] = [
        Self::Vegetables,
        Self::Fruits,
        Self::Meat,
        Self::Dairy,
        Self::Grocery,
        Self::Drinks,
        Self::Bread,
        Self::Household,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vegetables => "Овощи",
            Self::Fruits => "Фрукты",
            Self::Meat => "Мясо",
            Self::Dairy => "Молочные продукты",
            Self::Grocery => "Бакалея",
            Self::Drinks => "Напитки",
            Self::Bread => "Хлеб",
            Self::Household => "Бытовая химия",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown product category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for ProductCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == needle)
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("овощи".parse::<ProductCategory>(), Ok(ProductCategory::Vegetables));
        assert_eq!("ОВОЩИ".parse::<ProductCategory>(), Ok(ProductCategory::Vegetables));
    }

    #[test]
    fn parse_rejects_unknown_labels() {
        let err = "Электроника".parse::<ProductCategory>().unwrap_err();
        assert_eq!(err, ParseCategoryError("Электроника".to_string()));
    }

    #[test]
    fn serde_uses_display_labels() {
        let json = serde_json::to_string(&ProductCategory::Dairy).expect("serialize");
        assert_eq!(json, "\"Молочные продукты\"");
        let decoded: ProductCategory = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded, ProductCategory::Dairy);
    }

    #[test]
    fn all_contains_every_label_once() {
        let mut labels: Vec<&str> = ProductCategory::ALL.iter().map(|c| c.as_str()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), 8);
    }
}
