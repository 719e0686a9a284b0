use crate::analytics::advice::{AdviceBand, AdviceContext};
use crate::analytics::fmt::{kzt, whole_tenge};
use crate::analytics::window::WINDOW_MONTHS;
use crate::catalog::{
    ensure_ratio, CardTerms, Catalog, Entry, FinancingTerms, OverdraftTerms, PlacementTerms,
    SegmentConfig, TariffTerms,
};
use crate::domain::recommendation::{Limits, Recommendation};
use crate::domain::transaction::Segment;
use crate::recommend::{financing_limits, MatchContext, SegmentPolicy};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

pub const OVERDRAFT: &str = "BIZ_OVERDRAFT";
pub const UNSECURED_FINANCING: &str = "BIZ_ISLAM_UNSEC";
pub const SECURED_FINANCING: &str = "BIZ_ISLAM_SEC";
pub const OVERNIGHT_DEPOSIT: &str = "BIZ_OVERNIGHT";
pub const PROFIT_DEPOSIT: &str = "BIZ_PROFIT";
pub const BUSINESS_CARD: &str = "BIZ_CARD";
pub const TARIFFS: &str = "BIZ_TARIFFS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRules {
    pub overdraft_min_spent_ratio: f64,
    pub overdraft_min_single_tx: i64,
    pub unsecured_min_spent_ratio: f64,
    pub unsecured_monthly_gap_above: i64,
    pub unsecured_single_tx_above: i64,
    pub secured_min_single_tx: i64,
    pub secured_free_cash_below: i64,
    pub overnight_monthly_cap: i64,
    pub profit_monthly_cap: i64,
    /// Ascending by `max_payments_per_month`; the last tier has no upper bound.
    pub tariff_tiers: Vec<TariffTier>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffTier {
    pub max_payments_per_month: Option<u32>,
    pub label: String,
}

impl BusinessRules {
    pub fn validate(&self, catalog: &Catalog) -> anyhow::Result<()> {
        BusinessProducts::resolve(catalog)?;
        ensure_ratio("overdraft_min_spent_ratio", self.overdraft_min_spent_ratio)?;
        ensure_ratio("unsecured_min_spent_ratio", self.unsecured_min_spent_ratio)?;
        ensure!(
            self.overnight_monthly_cap > 0 && self.profit_monthly_cap > 0,
            "deposit caps must be > 0"
        );

        let (last, rest) = self
            .tariff_tiers
            .split_last()
            .context("tariff_tiers must be non-empty")?;
        ensure!(
            last.max_payments_per_month.is_none(),
            "last tariff tier must be open-ended"
        );
        let mut prev = 0u32;
        for tier in rest {
            let max = tier
                .max_payments_per_month
                .context("only the last tariff tier may be open-ended")?;
            ensure!(max > prev, "tariff tiers must be strictly ascending");
            prev = max;
        }
        ensure!(
            self.tariff_tiers.iter().all(|t| !t.label.trim().is_empty()),
            "tariff tier labels must be non-empty"
        );
        Ok(())
    }

    pub fn tariff_for(&self, payments_per_month: u32) -> Option<&TariffTier> {
        self.tariff_tiers.iter().find(|t| {
            t.max_payments_per_month
                .map_or(true, |max| payments_per_month <= max)
        })
    }
}

/// Payments per month over the window, at least one.
pub fn payments_per_month(transactions_count: usize) -> u32 {
    let per_month = (transactions_count as f64 / WINDOW_MONTHS as f64).round_ties_even();
    (per_month as u32).max(1)
}

struct BusinessProducts<'a> {
    overdraft: Entry<'a, OverdraftTerms>,
    unsecured: Entry<'a, FinancingTerms>,
    secured: Entry<'a, FinancingTerms>,
    overnight: Entry<'a, PlacementTerms>,
    profit: Entry<'a, PlacementTerms>,
    card: Entry<'a, CardTerms>,
    tariffs: Entry<'a, TariffTerms>,
}

impl<'a> BusinessProducts<'a> {
    fn resolve(catalog: &'a Catalog) -> anyhow::Result<Self> {
        Ok(Self {
            overdraft: catalog.overdraft(OVERDRAFT)?,
            unsecured: catalog.financing(UNSECURED_FINANCING)?,
            secured: catalog.financing(SECURED_FINANCING)?,
            overnight: catalog.placement(OVERNIGHT_DEPOSIT)?,
            profit: catalog.placement(PROFIT_DEPOSIT)?,
            card: catalog.card(BUSINESS_CARD)?,
            tariffs: catalog.tariff(TARIFFS)?,
        })
    }
}

impl SegmentPolicy for SegmentConfig<BusinessRules> {
    fn segment(&self) -> Segment {
        Segment::Business
    }

    fn match_products(&self, ctx: &MatchContext<'_>) -> anyhow::Result<Vec<Recommendation>> {
        let p = BusinessProducts::resolve(&self.catalog)?;
        let rules = &self.rules;
        let profile = ctx.profile;
        let ratio = profile.spent_ratio;
        let free_cash = profile.free_cash_monthly;
        let max_tx = ctx.max_single_transaction;
        let mut recs = Vec::new();

        let od = p.overdraft.terms;
        if ratio >= rules.overdraft_min_spent_ratio || max_tx >= rules.overdraft_min_single_tx {
            recs.push(
                Recommendation::new(
                    p.overdraft.name,
                    format!(
                        "Высокая нагрузка на бюджет или крупные платежи — овердрафт до {} помогает сгладить кассовые разрывы.",
                        kzt(od.max_sum)
                    ),
                )
                .with_limits(Limits {
                    min: od.min_sum,
                    max: Some(od.max_sum),
                    term_m: None,
                    max_term_days: Some(od.max_term_days),
                })
                .with_note(format!(
                    "Исламский кредитный лимит на счёт (овердрафт) до {} дней.",
                    od.max_term_days
                )),
            );
        }

        let monthly_gap = if ratio > 1.0 {
            whole_tenge((ratio - 1.0) * profile.salary_monthly as f64).max(0)
        } else {
            0
        };
        if ratio >= rules.unsecured_min_spent_ratio
            || monthly_gap > rules.unsecured_monthly_gap_above
            || max_tx > rules.unsecured_single_tx_above
        {
            recs.push(
                Recommendation::new(
                    p.unsecured.name,
                    format!(
                        "Оборотные потребности/закуп — беззалоговое исламское финансирование до {}.",
                        kzt(p.unsecured.terms.max_sum)
                    ),
                )
                .with_limits(financing_limits(p.unsecured.terms)),
            );

            if max_tx >= rules.secured_min_single_tx
                || free_cash < rules.secured_free_cash_below as f64
            {
                recs.push(
                    Recommendation::new(
                        p.secured.name,
                        format!(
                            "Крупные потребности/инвестиции — залоговое исламское финансирование до {}.",
                            kzt(p.secured.terms.max_sum)
                        ),
                    )
                    .with_limits(financing_limits(p.secured.terms)),
                );
            }
        }

        // At most one deposit: overnight when the cash allows it, otherwise the term deposit.
        let (overnight, profit) = (&p.overnight, &p.profit);
        if free_cash >= overnight.terms.min_sum as f64 {
            recs.push(
                Recommendation::new(
                    overnight.name,
                    format!(
                        "Свободный кэш ≥ {} — разместить на депозите «{}», доходность {}.",
                        kzt(overnight.terms.min_sum),
                        overnight.name,
                        overnight.terms.expected_yield
                    ),
                )
                .with_suggested_monthly(whole_tenge(free_cash.min(rules.overnight_monthly_cap as f64))),
            );
        } else if free_cash >= profit.terms.min_sum as f64 {
            recs.push(
                Recommendation::new(
                    profit.name,
                    format!(
                        "Свободный кэш ≥ {} — депозит «{}», доходность {}.",
                        kzt(profit.terms.min_sum),
                        profit.name,
                        profit.terms.expected_yield
                    ),
                )
                .with_suggested_monthly(whole_tenge(free_cash.min(rules.profit_monthly_cap as f64))),
            );
        }

        let card = p.card.terms;
        recs.push(Recommendation::new(
            p.card.name,
            format!(
                "Кэшбэк {}, лимит по операциям до {} в сутки, обслуживание {}. Снятие: {}.",
                card.cashback,
                kzt(card.daily_limit),
                kzt(card.service_fee),
                card.cashout_rule
            ),
        ));

        let per_month = payments_per_month(ctx.transactions_count);
        let tier = rules
            .tariff_for(per_month)
            .context("no tariff tier covers the payment volume")?;
        let mut tariff = Recommendation::new(
            p.tariffs.name,
            format!(
                "Активность ~{per_month} платежей/мес — рекомендуем: {}.",
                tier.label
            ),
        );
        if !p.tariffs.terms.extras.is_empty() {
            tariff = tariff.with_note(format!(
                "Дополнительно: {}",
                p.tariffs.terms.extras.join(", ")
            ));
        }
        recs.push(tariff);

        Ok(recs)
    }

    fn advice(&self, ctx: &AdviceContext<'_>) -> anyhow::Result<String> {
        let p = BusinessProducts::resolve(&self.catalog)?;
        let pct = ctx.spent_percent;
        let overnight = p.overnight.name;
        let profit = p.profit.name;

        let text = match ctx.band {
            AdviceBand::Strained => format!(
                "Высокая загрузка бюджета (расходы ≈ {pct}%). Сократи «{}» на {}% (~{}) и используй овердрафт для сглаживания \
                 кассовых разрывов. Для закупов — подумай о беззалоговом исламском финансировании.",
                ctx.top_category,
                ctx.cut_percent,
                kzt(ctx.cut_amount)
            ),
            AdviceBand::OnEdge => format!(
                "Бюджет на грани (≈ {pct}%). Проведи ревизию постоянных трат, перенеси часть платежей на бизнес-карту \
                 (кэшбэк {}), а свободный кэш размещай на «{profit}» депозит.",
                p.card.terms.cashback
            ),
            AdviceBand::Balanced => format!(
                "Сбалансировано (≈ {pct}%). Свободный остаток направляй в «{overnight}» или «{profit}», чтобы деньги не \
                 лежали без дела; платежи веди через «{}».",
                p.tariffs.name
            ),
            AdviceBand::Comfortable => format!(
                "Отличный запас (≈ {pct}%). Ускорь рост подушки — часть кэша ежедневно размещай в «{overnight}», \
                 для операций — {} (кэшбэк), для платежей — подходящий тариф РКО.",
                p.card.name
            ),
        };
        Ok(text)
    }
}
