use crate::analytics::advice::{AdviceBand, AdviceContext};
use crate::analytics::fmt::{kzt, whole_tenge};
use crate::catalog::{ensure_ratio, Catalog, Entry, FinancingTerms, PlacementTerms, SegmentConfig};
use crate::domain::recommendation::Recommendation;
use crate::domain::transaction::{Category, Segment};
use crate::recommend::{financing_limits, MatchContext, SegmentPolicy};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

pub const BNPL: &str = "BNPL";
pub const ISLAMIC_FINANCING: &str = "ISLAM_FIN";
pub const ISLAMIC_MORTGAGE: &str = "ISLAM_MORT";
pub const SAVINGS: &str = "SAVINGS";
pub const WAKALA: &str = "WAKALA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailRules {
    pub savings_monthly_cap: i64,
    pub wakala_monthly_cap: i64,
    pub bnpl_min_spent_ratio: f64,
    pub islamic_financing_min_spent_ratio: f64,
    pub islamic_financing_min_salary: i64,
    pub mortgage_min_salary: i64,
    pub mortgage_max_spent_ratio: f64,
    pub budget_nudge: BudgetNudge,
}

/// Behavioural hint emitted alongside products when leisure spend dominates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetNudge {
    pub product_name: String,
    pub categories: Vec<Category>,
    pub min_share: f64,
    pub salary_fraction: f64,
}

impl BudgetNudge {
    /// `share_bp` is the combined reported share, in basis points.
    fn fires(&self, share_bp: i64) -> bool {
        !self.categories.is_empty() && share_bp >= (self.min_share * 10_000.0).round() as i64
    }

    fn categories_phrase(&self) -> String {
        self.categories
            .iter()
            .map(|c| format!("«{c}»"))
            .collect::<Vec<_>>()
            .join(" и ")
    }
}

impl RetailRules {
    pub fn validate(&self, catalog: &Catalog) -> anyhow::Result<()> {
        RetailProducts::resolve(catalog)?;
        ensure!(self.savings_monthly_cap > 0, "savings_monthly_cap must be > 0");
        ensure!(self.wakala_monthly_cap > 0, "wakala_monthly_cap must be > 0");
        ensure_ratio("bnpl_min_spent_ratio", self.bnpl_min_spent_ratio)?;
        ensure_ratio(
            "islamic_financing_min_spent_ratio",
            self.islamic_financing_min_spent_ratio,
        )?;
        ensure_ratio("mortgage_max_spent_ratio", self.mortgage_max_spent_ratio)?;
        ensure!(
            self.islamic_financing_min_salary >= 0 && self.mortgage_min_salary >= 0,
            "salary thresholds must be >= 0"
        );
        let nudge = &self.budget_nudge;
        ensure!(
            !nudge.product_name.trim().is_empty(),
            "budget_nudge.product_name must be non-empty"
        );
        ensure_ratio("budget_nudge.min_share", nudge.min_share)?;
        ensure_ratio("budget_nudge.salary_fraction", nudge.salary_fraction)?;
        Ok(())
    }
}

struct RetailProducts<'a> {
    bnpl: Entry<'a, FinancingTerms>,
    islamic_financing: Entry<'a, FinancingTerms>,
    mortgage: Entry<'a, FinancingTerms>,
    savings: Entry<'a, PlacementTerms>,
    wakala: Entry<'a, PlacementTerms>,
}

impl<'a> RetailProducts<'a> {
    fn resolve(catalog: &'a Catalog) -> anyhow::Result<Self> {
        Ok(Self {
            bnpl: catalog.financing(BNPL)?,
            islamic_financing: catalog.financing(ISLAMIC_FINANCING)?,
            mortgage: catalog.financing(ISLAMIC_MORTGAGE)?,
            savings: catalog.placement(SAVINGS)?,
            wakala: catalog.placement(WAKALA)?,
        })
    }
}

impl SegmentPolicy for SegmentConfig<RetailRules> {
    fn segment(&self) -> Segment {
        Segment::Retail
    }

    fn match_products(&self, ctx: &MatchContext<'_>) -> anyhow::Result<Vec<Recommendation>> {
        let p = RetailProducts::resolve(&self.catalog)?;
        let rules = &self.rules;
        let profile = ctx.profile;
        let free_cash = profile.free_cash_monthly;
        let ratio = profile.spent_ratio;
        let max_tx = ctx.max_single_transaction;
        let mut recs = Vec::new();

        if free_cash >= p.savings.terms.min_sum as f64 {
            recs.push(
                Recommendation::new(
                    p.savings.name,
                    format!(
                        "Ежемесячно свободно ~{} — можно копить (доходность {}).",
                        kzt(whole_tenge(free_cash)),
                        p.savings.terms.expected_yield
                    ),
                )
                .with_suggested_monthly(whole_tenge(free_cash.min(rules.savings_monthly_cap as f64))),
            );
        }

        if free_cash >= p.wakala.terms.min_sum as f64 {
            recs.push(
                Recommendation::new(
                    p.wakala.name,
                    format!(
                        "Достаточный остаток для инвестиций (доходность {}).",
                        p.wakala.terms.expected_yield
                    ),
                )
                .with_suggested_monthly(whole_tenge(free_cash.min(rules.wakala_monthly_cap as f64))),
            );
        }

        let bnpl = p.bnpl.terms;
        if ratio >= rules.bnpl_min_spent_ratio && (bnpl.min_sum..=bnpl.max_sum).contains(&max_tx) {
            recs.push(
                Recommendation::new(
                    p.bnpl.name,
                    format!(
                        "Крупные покупки до {} при высоких расходах — удобно распределить платежи.",
                        kzt(bnpl.max_sum)
                    ),
                )
                .with_limits(financing_limits(bnpl)),
            );
        }

        let fin = p.islamic_financing.terms;
        if ratio >= rules.islamic_financing_min_spent_ratio
            && profile.salary_monthly >= rules.islamic_financing_min_salary
        {
            recs.push(
                Recommendation::new(
                    p.islamic_financing.name,
                    format!(
                        "Высокая доля расходов — можно покрывать покупки/потребности халяль-финансированием до {}.",
                        kzt(fin.max_sum)
                    ),
                )
                .with_limits(financing_limits(fin))
                .with_note(format!(
                    "Проверка возраста {}–{} лет потребуется при оформлении.",
                    fin.min_age, fin.max_age
                )),
            );
        }

        // Age is not part of the ledger; the mortgage gate is income and spend only.
        let mortgage = p.mortgage.terms;
        if profile.salary_monthly >= rules.mortgage_min_salary
            && ratio <= rules.mortgage_max_spent_ratio
        {
            recs.push(
                Recommendation::new(
                    p.mortgage.name,
                    "Стабильный доход и контролируемые расходы — профиль подходит для ипотеки.",
                )
                .with_limits(financing_limits(mortgage))
                .with_note(format!(
                    "Возрастная проверка {}–{} лет при подаче заявки.",
                    mortgage.min_age, mortgage.max_age
                )),
            );
        }

        let nudge = &rules.budget_nudge;
        let leisure_bp = ctx.breakdown.combined_share_bp(&nudge.categories);
        if nudge.fires(leisure_bp) {
            recs.push(
                Recommendation::new(
                    nudge.product_name.as_str(),
                    format!(
                        "Большая доля трат на {} ({}%). Сократи на 10–15% и направляй разницу в «{}».",
                        nudge.categories_phrase(),
                        leisure_bp / 100,
                        p.savings.name
                    ),
                )
                .with_suggested_monthly(whole_tenge(
                    nudge.salary_fraction * profile.salary_monthly as f64,
                )),
            );
        }

        Ok(recs)
    }

    fn advice(&self, ctx: &AdviceContext<'_>) -> anyhow::Result<String> {
        let p = RetailProducts::resolve(&self.catalog)?;
        let pct = ctx.spent_percent;
        let save = kzt(ctx.suggest_save);
        let invest = kzt(ctx.suggest_invest);
        let savings = p.savings.name;
        let wakala = p.wakala.name;

        let text = match ctx.band {
            AdviceBand::Strained => format!(
                "Бюджет перенапряжён: расходы ≈ {pct}%. Сократи «{}» на {}% (~{}) и используй {} для крупных покупок до {}. \
                 Если нужен буфер — рассмотрите {} до {}.",
                ctx.top_category,
                ctx.cut_percent,
                kzt(ctx.cut_amount),
                p.bnpl.name,
                kzt(p.bnpl.terms.max_sum),
                p.islamic_financing.name,
                kzt(p.islamic_financing.terms.max_sum),
            ),
            AdviceBand::OnEdge => {
                let nudge = &self.rules.budget_nudge;
                let extra = if nudge.fires(ctx.breakdown.combined_share_bp(&nudge.categories)) {
                    format!(
                        " Сократи траты на {} на 10–15% и направляй разницу в «{savings}».",
                        nudge.categories_phrase()
                    )
                } else {
                    String::new()
                };
                format!("На грани: расходы ≈ {pct}%. Начни откладывать {save} в «{savings}».{extra}")
            }
            AdviceBand::Balanced => format!(
                "Сбалансированный профиль: расходы ≈ {pct}%. Рекомендуем инвестировать {invest} в «{wakala}» ({}) \
                 и параллельно копить {save} в «{savings}».",
                p.wakala.terms.expected_yield
            ),
            AdviceBand::Comfortable => format!(
                "Отличный запас: расходы ≈ {pct}%. Ускорь достижение целей — направляй {invest} в «{wakala}» и \
                 {save} в «{savings}». Создай цель и привяжи автосписание."
            ),
        };
        Ok(text)
    }
}
