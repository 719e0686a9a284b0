//! Hands a user's ledger context to the external chat service.
//!
//! Only the seeding call lives here; the conversation itself runs outside this crate.

pub mod http;

use crate::domain::report::SpendingSummary;
use crate::domain::transaction::{Segment, TransactionRecord};
use serde::{Deserialize, Serialize};

pub use http::HttpDialogueFeed;

const FIELDS_NOTICE: &str = "Ниже история банковских транзакций пользователя в JSON. \
Поля: `user_id` — идентификатор пользователя, `date` — дата транзакции, `category` — категория, \
`amount` — сумма в тенге, `salary` — ежемесячный доход, `balance_left` — текущий баланс. \
Используй её для анализа доходов и расходов.";

/// Opening context of a chat thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueSeed {
    pub user_id: i64,
    pub segment: Segment,
    pub messages: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<SpendingSummary>,
    pub transactions: Vec<TransactionRecord>,
}

impl DialogueSeed {
    /// `summary` is the current trailing window, when the user has one.
    pub fn new(
        segment: Segment,
        user_id: i64,
        transactions: Vec<TransactionRecord>,
        summary: Option<SpendingSummary>,
    ) -> Self {
        Self {
            user_id,
            segment,
            messages: vec![segment_notice(segment).to_string(), FIELDS_NOTICE.to_string()],
            summary,
            transactions,
        }
    }
}

fn segment_notice(segment: Segment) -> &'static str {
    match segment {
        Segment::Retail => {
            "Этот пользователь — физическое лицо. Предлагай только продукты для физических лиц."
        }
        Segment::Business => {
            "Этот пользователь — юридическое лицо. Предлагай только продукты для юридических лиц."
        }
    }
}

#[async_trait::async_trait]
pub trait DialogueFeed: Send + Sync {
    /// Opens a thread seeded with `seed` and returns its id.
    async fn seed(&self, seed: &DialogueSeed) -> anyhow::Result<String>;
}
