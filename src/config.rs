//! Game configuration: catalogs, thresholds, and the starting template.
//!
//! Everything numeric that is policy rather than engine (loan products,
//! tier cutoffs, quest targets) lives here so hosts can replace it. The
//! built-in defaults are the standard campaign; `GameConfig::from_json`
//! loads an override, with missing sections falling back to defaults.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::credit::{CreditTier, TierBand};
use crate::quests::{QuestDef, QuestGoal, QuestMetric, QuestReward};
use crate::state::{
    AssetKind, Decision, DecisionOption, Education, StatChanges, Stats, CREDIT_MAX, CREDIT_MIN,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog is empty")]
    EmptyCatalog,
    #[error("catalog item {id} is listed twice")]
    DuplicateItem { id: String },
    #[error("catalog item {id} has a non-positive base price")]
    BadPrice { id: String },
    #[error("catalog item {id} cannot be mortgaged (only real estate can)")]
    MortgageNotAllowed { id: String },
    #[error("credit tier bands must rise in both score and tier")]
    TierBandsNotMonotonic,
    #[error("quest {id} has a non-positive target")]
    BadQuestTarget { id: String },
    #[error("quest {id} unlocks unknown quest {target}")]
    UnknownQuest { id: String, target: String },
    #[error("career ladder is empty")]
    EmptyCareerLadder,
    #[error("{name} is out of range")]
    OutOfRange { name: &'static str },
}

/// A purchasable investment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    pub kind: AssetKind,
    pub base_price: f64,
    /// Annual income as a fraction of price (dividends, coupons, rent).
    pub expected_yield: f64,
    #[serde(default)]
    pub can_mortgage: bool,
    #[serde(default)]
    pub required_education: Option<Education>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoanProduct {
    pub id: String,
    pub name: String,
    /// Added on top of the market interest rate.
    pub spread: f64,
    pub term_months: u32,
    pub max_amount: f64,
    pub min_credit: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MortgageTerms {
    pub spread: f64,
    pub term_months: u32,
    /// Fraction of the price paid up front.
    pub down_payment: f64,
    pub min_credit: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CareerRung {
    pub title: String,
    pub monthly_salary: f64,
    pub min_financial_iq: i32,
    pub min_networking: i32,
    #[serde(default)]
    pub min_education: Option<Education>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tuition {
    pub level: Education,
    pub cost: f64,
    pub financial_iq: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideHustleDef {
    pub id: String,
    pub name: String,
    pub startup_cost: f64,
    pub monthly_income: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartingDebt {
    pub name: String,
    pub balance: f64,
    pub interest_rate: f64,
    pub monthly_payment: f64,
    pub term_months: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartConfig {
    pub cash: f64,
    pub stats: Stats,
    pub credit_rating: i32,
    pub education: Education,
    pub debts: Vec<StartingDebt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EconomyConfig {
    pub base_interest_rate: f64,
    pub base_inflation_rate: f64,
    pub min_interest_rate: f64,
    pub max_interest_rate: f64,
    pub min_inflation_rate: f64,
    pub max_inflation_rate: f64,
    /// Largest monthly move of either rate.
    pub rate_step: f64,
    pub recession_length: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub start: StartConfig,
    pub economy: EconomyConfig,
    pub catalog: Vec<CatalogItem>,
    pub credit_tiers: Vec<TierBand>,
    pub quests: Vec<QuestDef>,
    pub loan_products: Vec<LoanProduct>,
    pub mortgage: MortgageTerms,
    pub refinance_min_score: i32,
    pub career_ladder: Vec<CareerRung>,
    pub tuition: Vec<Tuition>,
    pub side_hustles: Vec<SideHustleDef>,
    pub life_events: Vec<Decision>,
    /// Chance per month that a life event interrupts play.
    pub life_event_chance: f64,
    /// Base monthly cost of living, inflated over time.
    pub living_expenses: f64,
    pub late_fee: f64,
    pub goal_net_worth: f64,
    pub max_months: u32,
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn item(&self, id: &str) -> Option<&CatalogItem> {
        self.catalog.iter().find(|i| i.id == id)
    }

    pub fn quest(&self, id: &str) -> Option<&QuestDef> {
        self.quests.iter().find(|q| q.id == id)
    }

    pub fn loan_product(&self, id: &str) -> Option<&LoanProduct> {
        self.loan_products.iter().find(|p| p.id == id)
    }

    pub fn side_hustle(&self, id: &str) -> Option<&SideHustleDef> {
        self.side_hustles.iter().find(|h| h.id == id)
    }

    pub fn tuition_for(&self, level: Education) -> Option<&Tuition> {
        self.tuition.iter().find(|t| t.level == level)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for (i, item) in self.catalog.iter().enumerate() {
            if self.catalog[..i].iter().any(|other| other.id == item.id) {
                return Err(ConfigError::DuplicateItem { id: item.id.clone() });
            }
            if !(item.base_price.is_finite() && item.base_price > 0.0) {
                return Err(ConfigError::BadPrice { id: item.id.clone() });
            }
            if item.can_mortgage && item.kind != AssetKind::RealEstate {
                return Err(ConfigError::MortgageNotAllowed { id: item.id.clone() });
            }
        }

        let bands_rise = self
            .credit_tiers
            .windows(2)
            .all(|w| w[0].min_score < w[1].min_score && w[0].tier < w[1].tier);
        if self.credit_tiers.is_empty() || !bands_rise {
            return Err(ConfigError::TierBandsNotMonotonic);
        }

        for quest in &self.quests {
            if !(quest.goal.target.is_finite() && quest.goal.target > 0.0) {
                return Err(ConfigError::BadQuestTarget { id: quest.id.clone() });
            }
            for target in &quest.unlocks {
                if self.quest(target).is_none() {
                    return Err(ConfigError::UnknownQuest {
                        id: quest.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        if self.career_ladder.is_empty() {
            return Err(ConfigError::EmptyCareerLadder);
        }

        if !self.start.stats.in_range() {
            return Err(ConfigError::OutOfRange { name: "starting stats" });
        }
        if !(CREDIT_MIN..=CREDIT_MAX).contains(&self.start.credit_rating) {
            return Err(ConfigError::OutOfRange { name: "starting credit rating" });
        }

        let eco = &self.economy;
        if eco.min_interest_rate < 0.0 || eco.min_interest_rate > eco.max_interest_rate {
            return Err(ConfigError::OutOfRange { name: "interest rate bounds" });
        }
        if eco.min_inflation_rate <= -1.0 || eco.min_inflation_rate > eco.max_inflation_rate {
            return Err(ConfigError::OutOfRange { name: "inflation rate bounds" });
        }
        if !(0.0..=1.0).contains(&self.life_event_chance) {
            return Err(ConfigError::OutOfRange { name: "life_event_chance" });
        }
        if !(0.0..1.0).contains(&self.mortgage.down_payment) || self.mortgage.term_months == 0 {
            return Err(ConfigError::OutOfRange { name: "mortgage terms" });
        }
        if self.loan_products.iter().any(|p| p.term_months == 0 || p.spread < 0.0) {
            return Err(ConfigError::OutOfRange { name: "loan product terms" });
        }
        if self.life_events.iter().any(|d| d.options.is_empty()) {
            return Err(ConfigError::OutOfRange { name: "life event options" });
        }
        Ok(())
    }
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            cash: 2_500.0,
            stats: Stats {
                energy: 70,
                stress: 40,
                health: 80,
                happiness: 60,
                financial_iq: 10,
                networking: 10,
            },
            credit_rating: 650,
            education: Education::Bachelor,
            debts: vec![StartingDebt {
                name: "Student Loan".into(),
                balance: 18_000.0,
                interest_rate: 0.05,
                monthly_payment: 190.92,
                term_months: 120,
            }],
        }
    }
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_interest_rate: 0.05,
            base_inflation_rate: 0.03,
            min_interest_rate: 0.01,
            max_interest_rate: 0.12,
            min_inflation_rate: -0.01,
            max_inflation_rate: 0.10,
            rate_step: 0.0025,
            recession_length: 6,
        }
    }
}

impl Default for MortgageTerms {
    fn default() -> Self {
        Self {
            spread: 0.015,
            term_months: 360,
            down_payment: 0.20,
            min_credit: 620,
        }
    }
}

fn item(
    id: &str,
    name: &str,
    kind: AssetKind,
    base_price: f64,
    expected_yield: f64,
) -> CatalogItem {
    CatalogItem {
        id: id.into(),
        name: name.into(),
        kind,
        base_price,
        expected_yield,
        can_mortgage: kind == AssetKind::RealEstate,
        required_education: None,
    }
}

fn quest(id: &str, title: &str, metric: QuestMetric, target: f64) -> QuestDef {
    QuestDef {
        id: id.into(),
        title: title.into(),
        goal: QuestGoal { metric, target },
        reward: QuestReward::default(),
        starts_active: false,
        unlocks: Vec::new(),
    }
}

fn rung(title: &str, salary: f64, iq: i32, networking: i32, edu: Option<Education>) -> CareerRung {
    CareerRung {
        title: title.into(),
        monthly_salary: salary,
        min_financial_iq: iq,
        min_networking: networking,
        min_education: edu,
    }
}

fn option(label: &str, cash: f64, credit: i32, stats: StatChanges) -> DecisionOption {
    DecisionOption {
        label: label.into(),
        cash,
        credit,
        stats,
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        let mut startup = item("startup_stake", "Startup Stake", AssetKind::Business, 20_000.0, 0.12);
        startup.required_education = Some(Education::Master);

        let mut emergency = quest("emergency_fund", "Build an emergency fund", QuestMetric::Cash, 5_000.0);
        emergency.starts_active = true;
        emergency.reward.cash = Some(250.0);
        emergency.reward.stats = Some(StatChanges { happiness: 5, stress: -5, ..Default::default() });
        emergency.unlocks = vec!["passive_starter".into()];

        let mut first_year = quest("first_year", "Survive your first year", QuestMetric::MonthsPlayed, 12.0);
        first_year.starts_active = true;
        first_year.reward.credit = Some(10);
        first_year.unlocks = vec!["two_years".into()];

        let mut credit_builder = quest("credit_builder", "Reach a 720 credit score", QuestMetric::CreditScore, 720.0);
        credit_builder.starts_active = true;
        credit_builder.reward.stats = Some(StatChanges { financial_iq: 5, ..Default::default() });

        let mut money_mind = quest("money_mind", "Raise financial IQ to 60", QuestMetric::FinancialIq, 60.0);
        money_mind.starts_active = true;
        money_mind.reward.stats = Some(StatChanges { networking: 5, ..Default::default() });

        let mut passive = quest("passive_starter", "Earn $100/month passively", QuestMetric::PassiveIncome, 100.0);
        passive.reward.cash = Some(500.0);
        passive.unlocks = vec!["net_worth_50k".into()];

        let mut net_worth = quest("net_worth_50k", "Reach $50,000 net worth", QuestMetric::NetWorth, 50_000.0);
        net_worth.reward.cash = Some(1_000.0);
        net_worth.reward.credit = Some(15);

        let mut two_years = quest("two_years", "Stay solvent for two years", QuestMetric::MonthsPlayed, 24.0);
        two_years.reward.cash = Some(750.0);

        Self {
            start: StartConfig::default(),
            economy: EconomyConfig::default(),
            catalog: vec![
                item("index_fund", "Total Market Index Fund", AssetKind::Stock, 100.0, 0.02),
                item("tech_stock", "Tech Growth Stock", AssetKind::Stock, 250.0, 0.005),
                item("gov_bond", "Government Bond", AssetKind::Bond, 1_000.0, 0.045),
                item("corp_bond", "Corporate Bond", AssetKind::Bond, 500.0, 0.06),
                item("bitcoin", "Bitcoin", AssetKind::Crypto, 30_000.0, 0.0),
                item("condo", "City Condo", AssetKind::RealEstate, 150_000.0, 0.06),
                item("duplex", "Suburban Duplex", AssetKind::RealEstate, 320_000.0, 0.07),
                startup,
            ],
            credit_tiers: vec![
                TierBand { min_score: 300, tier: CreditTier::Poor },
                TierBand { min_score: 580, tier: CreditTier::Fair },
                TierBand { min_score: 670, tier: CreditTier::Good },
                TierBand { min_score: 740, tier: CreditTier::VeryGood },
                TierBand { min_score: 800, tier: CreditTier::Excellent },
            ],
            quests: vec![
                emergency,
                first_year,
                credit_builder,
                money_mind,
                passive,
                net_worth,
                two_years,
            ],
            loan_products: vec![
                LoanProduct {
                    id: "personal".into(),
                    name: "Personal Loan".into(),
                    spread: 0.06,
                    term_months: 36,
                    max_amount: 20_000.0,
                    min_credit: 600,
                },
                LoanProduct {
                    id: "student".into(),
                    name: "Student Loan".into(),
                    spread: 0.01,
                    term_months: 120,
                    max_amount: 60_000.0,
                    min_credit: 300,
                },
                LoanProduct {
                    id: "payday".into(),
                    name: "Payday Advance".into(),
                    spread: 0.30,
                    term_months: 6,
                    max_amount: 2_000.0,
                    min_credit: 300,
                },
            ],
            mortgage: MortgageTerms::default(),
            refinance_min_score: 680,
            career_ladder: vec![
                rung("Junior Analyst", 3_200.0, 0, 0, None),
                rung("Analyst", 4_200.0, 25, 20, None),
                rung("Senior Analyst", 5_600.0, 40, 35, None),
                rung("Manager", 7_500.0, 55, 50, Some(Education::Bachelor)),
                rung("Director", 10_500.0, 70, 65, Some(Education::Master)),
            ],
            tuition: vec![
                Tuition { level: Education::Bachelor, cost: 20_000.0, financial_iq: 15 },
                Tuition { level: Education::Master, cost: 35_000.0, financial_iq: 12 },
                Tuition { level: Education::Doctorate, cost: 50_000.0, financial_iq: 10 },
            ],
            side_hustles: vec![
                SideHustleDef {
                    id: "food_delivery".into(),
                    name: "Food Delivery".into(),
                    startup_cost: 0.0,
                    monthly_income: 250.0,
                },
                SideHustleDef {
                    id: "freelance_design".into(),
                    name: "Freelance Design".into(),
                    startup_cost: 200.0,
                    monthly_income: 400.0,
                },
                SideHustleDef {
                    id: "online_store".into(),
                    name: "Online Store".into(),
                    startup_cost: 1_500.0,
                    monthly_income: 650.0,
                },
            ],
            life_events: vec![
                Decision {
                    id: "car_repair".into(),
                    title: "Car trouble".into(),
                    description: "Your car needs a new transmission.".into(),
                    options: vec![
                        option("Pay for the repair", -1_200.0, 0, StatChanges::default()),
                        option(
                            "Take the bus for a while",
                            0.0,
                            0,
                            StatChanges { happiness: -10, stress: 10, energy: -5, ..Default::default() },
                        ),
                    ],
                },
                Decision {
                    id: "medical_bill".into(),
                    title: "Medical bill".into(),
                    description: "An unexpected clinic visit left you with a bill.".into(),
                    options: vec![
                        option("Pay it now", -800.0, 0, StatChanges::default()),
                        option(
                            "Let it go to collections",
                            0.0,
                            -35,
                            StatChanges { stress: 8, ..Default::default() },
                        ),
                    ],
                },
                Decision {
                    id: "wedding_invite".into(),
                    title: "Wedding invitation".into(),
                    description: "A college friend is getting married out of state.".into(),
                    options: vec![
                        option(
                            "Attend",
                            -400.0,
                            0,
                            StatChanges { happiness: 10, networking: 5, ..Default::default() },
                        ),
                        option(
                            "Send regrets",
                            0.0,
                            0,
                            StatChanges { happiness: -5, ..Default::default() },
                        ),
                    ],
                },
            ],
            life_event_chance: 0.15,
            living_expenses: 2_200.0,
            late_fee: 35.0,
            goal_net_worth: 1_000_000.0,
            max_months: 120,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn from_json_fills_missing_sections() {
        let config = GameConfig::from_json(r#"{ "living_expenses": 1500.0 }"#).unwrap();
        assert_eq!(config.living_expenses, 1_500.0);
        assert_eq!(config.catalog, GameConfig::default().catalog);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            GameConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn rejects_non_monotonic_tiers() {
        let mut config = GameConfig::default();
        config.credit_tiers.swap(1, 2);
        assert!(matches!(config.validate(), Err(ConfigError::TierBandsNotMonotonic)));
    }

    #[test]
    fn rejects_mortgageable_stock() {
        let mut config = GameConfig::default();
        config.catalog[0].can_mortgage = true;
        assert!(matches!(config.validate(), Err(ConfigError::MortgageNotAllowed { .. })));
    }

    #[test]
    fn rejects_unknown_unlock() {
        let mut config = GameConfig::default();
        config.quests[0].unlocks.push("nope".into());
        assert!(matches!(config.validate(), Err(ConfigError::UnknownQuest { .. })));
    }

    #[test]
    fn rejects_out_of_range_start() {
        let mut config = GameConfig::default();
        config.start.stats.energy = 500;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "starting stats" })
        ));

        let mut config = GameConfig::default();
        config.start.credit_rating = 900;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "starting credit rating" })
        ));
    }

    #[test]
    fn rejects_duplicate_items() {
        let mut config = GameConfig::default();
        let dup = config.catalog[0].clone();
        config.catalog.push(dup);
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateItem { .. })));
    }

    #[test]
    fn lookups() {
        let config = GameConfig::default();
        assert!(config.item("condo").is_some_and(|i| i.can_mortgage));
        assert!(config.loan_product("personal").is_some());
        assert!(config.side_hustle("online_store").is_some());
        assert!(config.tuition_for(Education::Master).is_some());
        assert!(config.quest("missing").is_none());
    }
}
