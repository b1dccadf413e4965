//! Tycoon game state.

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// Lower bound of every life stat.
pub const STAT_MIN: i32 = 0;
/// Upper bound of every life stat.
pub const STAT_MAX: i32 = 100;

/// Credit score bounds.
pub const CREDIT_MIN: i32 = 300;
pub const CREDIT_MAX: i32 = 850;

/// Monthly action budget bounds.
pub const ACTIONS_MIN: u8 = 1;
pub const ACTIONS_MAX: u8 = 4;

// ── Stats ─────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Energy,
    Stress,
    Health,
    Happiness,
    FinancialIq,
    Networking,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Energy,
        Stat::Stress,
        Stat::Health,
        Stat::Happiness,
        Stat::FinancialIq,
        Stat::Networking,
    ];
}

/// Life stats, each kept in `[0, 100]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub energy: i32,
    pub stress: i32,
    pub health: i32,
    pub happiness: i32,
    pub financial_iq: i32,
    pub networking: i32,
}

impl Stats {
    pub fn new(energy: i32, stress: i32, health: i32) -> Self {
        Self {
            energy,
            stress,
            health,
            happiness: 60,
            financial_iq: 10,
            networking: 10,
        }
    }

    pub fn get(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Energy => self.energy,
            Stat::Stress => self.stress,
            Stat::Health => self.health,
            Stat::Happiness => self.happiness,
            Stat::FinancialIq => self.financial_iq,
            Stat::Networking => self.networking,
        }
    }

    fn slot(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Energy => &mut self.energy,
            Stat::Stress => &mut self.stress,
            Stat::Health => &mut self.health,
            Stat::Happiness => &mut self.happiness,
            Stat::FinancialIq => &mut self.financial_iq,
            Stat::Networking => &mut self.networking,
        }
    }

    /// Add `delta` to one stat, clamping to `[0, 100]`.
    pub fn adjust(&mut self, stat: Stat, delta: i32) {
        let slot = self.slot(stat);
        *slot = slot.saturating_add(delta).clamp(STAT_MIN, STAT_MAX);
    }

    pub fn in_range(&self) -> bool {
        Stat::ALL
            .iter()
            .all(|&stat| (STAT_MIN..=STAT_MAX).contains(&self.get(stat)))
    }

    /// Pull every stat back into `[0, 100]`.
    pub fn clamp_all(&mut self) {
        for stat in Stat::ALL {
            self.adjust(stat, 0);
        }
    }

    pub fn apply(&mut self, changes: &StatChanges) {
        self.adjust(Stat::Energy, changes.energy);
        self.adjust(Stat::Stress, changes.stress);
        self.adjust(Stat::Health, changes.health);
        self.adjust(Stat::Happiness, changes.happiness);
        self.adjust(Stat::FinancialIq, changes.financial_iq);
        self.adjust(Stat::Networking, changes.networking);
    }
}

/// A bundle of stat deltas. Missing fields deserialize as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatChanges {
    pub energy: i32,
    pub stress: i32,
    pub health: i32,
    pub happiness: i32,
    pub financial_iq: i32,
    pub networking: i32,
}

impl StatChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ── Assets & Debts ────────────────────────────────────────────────────

/// Asset classes. Each kind has its own exposure to the equity market.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Stock,
    Bond,
    RealEstate,
    Business,
    Crypto,
}

impl AssetKind {
    /// Exponent applied to the market index when pricing this kind.
    pub fn market_beta(self) -> f64 {
        match self {
            AssetKind::Stock => 1.0,
            AssetKind::Bond => 0.0,
            AssetKind::RealEstate => 0.3,
            AssetKind::Business => 0.5,
            AssetKind::Crypto => 2.0,
        }
    }
}

/// Education ladder, ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Education {
    HighSchool,
    Bachelor,
    Master,
    Doctorate,
}

impl Education {
    pub fn next(self) -> Option<Education> {
        match self {
            Education::HighSchool => Some(Education::Bachelor),
            Education::Bachelor => Some(Education::Master),
            Education::Master => Some(Education::Doctorate),
            Education::Doctorate => None,
        }
    }
}

/// An owned position. `value` is the current unit price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub kind: AssetKind,
    pub quantity: u32,
    pub value: f64,
    pub cost_basis: f64,
    /// Monthly income produced by the whole position.
    pub cash_flow: f64,
    pub mortgage_id: Option<String>,
}

impl Asset {
    pub fn market_value(&self) -> f64 {
        self.value * self.quantity as f64
    }
}

/// Consumer debt (personal loans, student loans, card balances).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Liability {
    pub id: String,
    pub name: String,
    pub balance: f64,
    pub interest_rate: f64,
    pub monthly_payment: f64,
    pub original_balance: f64,
    pub term_months: u32,
}

/// Debt secured by a property asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mortgage {
    pub id: String,
    pub asset_id: String,
    pub balance: f64,
    pub interest_rate: f64,
    pub monthly_payment: f64,
    pub original_balance: f64,
    pub term_months: u32,
}

// ── Credit ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub month: u32,
    pub score: i32,
    pub reasons: Vec<String>,
}

// ── Quests ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestStatus {
    Active,
    ReadyToClaim,
    Completed,
}

/// Quest ids partitioned by status. An id lives in at most one list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestBook {
    pub active: Vec<String>,
    pub ready_to_claim: Vec<String>,
    pub completed: Vec<String>,
}

impl QuestBook {
    pub fn status_of(&self, id: &str) -> Option<QuestStatus> {
        if self.active.iter().any(|q| q == id) {
            Some(QuestStatus::Active)
        } else if self.ready_to_claim.iter().any(|q| q == id) {
            Some(QuestStatus::ReadyToClaim)
        } else if self.completed.iter().any(|q| q == id) {
            Some(QuestStatus::Completed)
        } else {
            None
        }
    }

    /// Activate an id that is not yet tracked anywhere.
    pub fn unlock(&mut self, id: &str) -> bool {
        if self.status_of(id).is_some() {
            return false;
        }
        self.active.push(id.to_string());
        true
    }
}

// ── Auto-invest ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub item_id: String,
    pub percent: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoInvest {
    pub enabled: bool,
    pub max_percent: u8,
    pub allocations: Vec<Allocation>,
}

// ── Economy ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketTrend {
    Stable,
    Bull,
    Boom,
    Bear,
    Crash,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Economy {
    pub interest_rate: f64,
    pub inflation_rate: f64,
    pub market_trend: MarketTrend,
    pub recession: bool,
    pub recession_months: u32,
    /// Cumulative equity-market level, 1.0 at game start.
    pub market_index: f64,
}

// ── Career & side income ──────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Career {
    pub level: u32,
    pub title: String,
    pub monthly_salary: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideHustle {
    pub id: String,
    pub name: String,
    pub monthly_income: f64,
}

/// Deferred effects of this month's actions, consumed by the next advance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Boosts {
    /// Overtime shifts worked; each pays a share of the salary paid next month.
    #[serde(default)]
    pub overtime_shifts: u32,
    pub hustle_boost_percent: u32,
}

// ── Decisions & events ────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub label: String,
    #[serde(default)]
    pub cash: f64,
    #[serde(default)]
    pub credit: i32,
    #[serde(default)]
    pub stats: StatChanges,
}

/// A blocking life event. Monthly actions are locked until resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub id: String,
    pub title: String,
    pub description: String,
    pub options: Vec<DecisionOption>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: u64,
    pub month: u32,
    pub title: String,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Won,
    Bankrupt,
    /// The configured month limit passed without a win.
    TimeUp,
}

/// Income/expense summary of the most recent month advance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub salary: f64,
    pub side_income: f64,
    pub passive_income: f64,
    pub living_expenses: f64,
    pub debt_payments: f64,
    pub missed_payments: u32,
    pub auto_invested: f64,
    pub cashflow: f64,
}

// ── Root aggregate ────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub month: u32,
    pub cash: f64,
    pub stats: Stats,
    pub credit_rating: i32,
    pub credit_history: Vec<CreditEntry>,
    pub assets: Vec<Asset>,
    pub liabilities: Vec<Liability>,
    pub mortgages: Vec<Mortgage>,
    pub monthly_actions_max: u8,
    pub monthly_actions_remaining: u8,
    pub quests: QuestBook,
    pub auto_invest: AutoInvest,
    pub events: Vec<GameEvent>,
    pub economy: Economy,

    pub career: Career,
    pub education: Education,
    pub side_hustles: Vec<SideHustle>,
    pub boosts: Boosts,
    pub pending_decision: Option<Decision>,
    pub status: GameStatus,
    pub last_report: MonthlyReport,

    pub seed: u64,
    pub next_event_id: u64,
    pub next_loan_id: u64,
}

impl GameState {
    /// Fresh game from the configured starting template.
    pub fn new(config: &GameConfig, seed: u64) -> Self {
        let start = &config.start;
        let first_rung = config.career_ladder.first();
        let mut state = Self {
            month: 0,
            cash: start.cash,
            stats: {
                let mut stats = start.stats.clone();
                stats.clamp_all();
                stats
            },
            credit_rating: start.credit_rating.clamp(CREDIT_MIN, CREDIT_MAX),
            credit_history: Vec::new(),
            assets: Vec::new(),
            liabilities: Vec::new(),
            mortgages: Vec::new(),
            monthly_actions_max: 2,
            monthly_actions_remaining: 2,
            quests: QuestBook::default(),
            auto_invest: AutoInvest {
                enabled: false,
                max_percent: 20,
                allocations: Vec::new(),
            },
            events: Vec::new(),
            economy: Economy {
                interest_rate: config.economy.base_interest_rate,
                inflation_rate: config.economy.base_inflation_rate,
                market_trend: MarketTrend::Stable,
                recession: false,
                recession_months: 0,
                market_index: 1.0,
            },
            career: Career {
                level: 1,
                title: first_rung.map(|r| r.title.clone()).unwrap_or_default(),
                monthly_salary: first_rung.map(|r| r.monthly_salary).unwrap_or(0.0),
            },
            education: start.education,
            side_hustles: Vec::new(),
            boosts: Boosts::default(),
            pending_decision: None,
            status: GameStatus::Playing,
            last_report: MonthlyReport::default(),
            seed,
            next_event_id: 1,
            next_loan_id: 1,
        };

        for quest in config.quests.iter().filter(|q| q.starts_active) {
            state.quests.unlock(&quest.id);
        }
        for debt in &start.debts {
            let id = state.allocate_loan_id();
            state.liabilities.push(Liability {
                id,
                name: debt.name.clone(),
                balance: debt.balance,
                interest_rate: debt.interest_rate,
                monthly_payment: debt.monthly_payment,
                original_balance: debt.balance,
                term_months: debt.term_months,
            });
        }
        state.credit_history.push(CreditEntry {
            month: 0,
            score: state.credit_rating,
            reasons: vec!["Starting credit profile".to_string()],
        });
        crate::actions::refresh_budget(&mut state);
        state.push_event("Welcome to Tycoon", "Your financial journey begins.");
        state
    }

    /// Prepend an entry to the event log (newest first).
    pub fn push_event(&mut self, title: &str, description: &str) {
        let id = self.next_event_id;
        self.next_event_id += 1;
        self.events.insert(
            0,
            GameEvent {
                id,
                month: self.month,
                title: title.to_string(),
                description: description.to_string(),
            },
        );
    }

    pub fn allocate_loan_id(&mut self) -> String {
        let id = format!("loan-{}", self.next_loan_id);
        self.next_loan_id += 1;
        id
    }

    /// Pull bounded fields back into range. Returns `true` if anything moved.
    pub(crate) fn clamp_ranges(&mut self) -> bool {
        let before = (
            self.stats.clone(),
            self.credit_rating,
            self.monthly_actions_max,
            self.monthly_actions_remaining,
        );
        self.stats.clamp_all();
        self.credit_rating = self.credit_rating.clamp(CREDIT_MIN, CREDIT_MAX);
        self.monthly_actions_max = self.monthly_actions_max.clamp(ACTIONS_MIN, ACTIONS_MAX);
        self.monthly_actions_remaining = self.monthly_actions_remaining.min(self.monthly_actions_max);
        before
            != (
                self.stats.clone(),
                self.credit_rating,
                self.monthly_actions_max,
                self.monthly_actions_remaining,
            )
    }

    pub fn is_game_over(&self) -> bool {
        self.status != GameStatus::Playing
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn total_assets(&self) -> f64 {
        self.assets.iter().map(Asset::market_value).sum()
    }

    pub fn total_debt(&self) -> f64 {
        self.liabilities.iter().map(|l| l.balance).sum::<f64>()
            + self.mortgages.iter().map(|m| m.balance).sum::<f64>()
    }

    pub fn net_worth(&self) -> f64 {
        self.cash + self.total_assets() - self.total_debt()
    }

    /// Monthly income from owned positions.
    pub fn passive_income(&self) -> f64 {
        self.assets.iter().map(|a| a.cash_flow).sum()
    }

    pub fn monthly_debt_service(&self) -> f64 {
        self.liabilities
            .iter()
            .map(|l| l.monthly_payment.min(l.balance))
            .sum::<f64>()
            + self
                .mortgages
                .iter()
                .map(|m| m.monthly_payment.min(m.balance))
                .sum::<f64>()
    }

    pub fn side_hustle_income(&self) -> f64 {
        self.side_hustles.iter().map(|h| h.monthly_income).sum()
    }
}
