use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One spend fact from the ledger feed.
///
/// `salary` and `balance_left` are snapshots the feed attaches to every row of a user; the first
/// record's values are authoritative wherever a single figure is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub user_id: i64,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub amount: i64,
    pub salary: i64,
    pub balance_left: i64,
}

impl TransactionRecord {
    pub fn category_kind(&self) -> Option<Category> {
        Category::from_label(&self.category)
    }
}

/// Fixed spending taxonomy. Declaration order is the canonical display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "АЗС")]
    FuelStation,
    #[serde(rename = "Доставка еды")]
    FoodDelivery,
    #[serde(rename = "Играем дома")]
    HomeGaming,
    #[serde(rename = "Кофе и рестораны")]
    CafesAndRestaurants,
    #[serde(rename = "Кино")]
    Cinema,
    #[serde(rename = "Отели")]
    Hotels,
    #[serde(rename = "Продукты питания")]
    Groceries,
    #[serde(rename = "Путешествия")]
    Travel,
    #[serde(rename = "Развлечения")]
    Entertainment,
    #[serde(rename = "Отдых дома")]
    HomeLeisure,
    #[serde(rename = "Такси")]
    Taxi,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::FuelStation,
        Category::FoodDelivery,
        Category::HomeGaming,
        Category::CafesAndRestaurants,
        Category::Cinema,
        Category::Hotels,
        Category::Groceries,
        Category::Travel,
        Category::Entertainment,
        Category::HomeLeisure,
        Category::Taxi,
    ];

    /// Category whose average ticket is reported as an insight.
    pub const DINING: Category = Category::CafesAndRestaurants;

    pub fn label(self) -> &'static str {
        match self {
            Category::FuelStation => "АЗС",
            Category::FoodDelivery => "Доставка еды",
            Category::HomeGaming => "Играем дома",
            Category::CafesAndRestaurants => "Кофе и рестораны",
            Category::Cinema => "Кино",
            Category::Hotels => "Отели",
            Category::Groceries => "Продукты питания",
            Category::Travel => "Путешествия",
            Category::Entertainment => "Развлечения",
            Category::HomeLeisure => "Отдых дома",
            Category::Taxi => "Такси",
        }
    }

    pub fn from_label(label: &str) -> Option<Category> {
        let label = label.trim();
        Self::ALL.into_iter().find(|c| c.label() == label)
    }

    /// Position in the canonical order.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Customer class; each has its own catalog and rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Retail,
    Business,
}

impl Segment {
    pub fn as_str(self) -> &'static str {
        match self {
            Segment::Retail => "retail",
            Segment::Business => "business",
        }
    }

    pub fn parse(s: &str) -> Option<Segment> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retail" | "individual" => Some(Segment::Retail),
            "business" | "sme" => Some(Segment::Business),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
