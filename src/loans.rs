//! Loan / amortization engine.
//!
//! Payment math is pure. State-level operations (`take_loan`, `pay_down`)
//! return a new `GameState`; `process_monthly_payments` runs inside the
//! month advance on the copy being built.

use thiserror::Error;

use crate::config::GameConfig;
use crate::credit::{change_credit, tier_for};
use crate::state::{GameState, Liability, Mortgage};

#[derive(Debug, Error, PartialEq)]
pub enum LoanError {
    #[error("principal must be a non-negative amount")]
    InvalidPrincipal,
    #[error("interest rate cannot be negative")]
    NegativeRate,
    #[error("loan term must be at least one month")]
    ZeroTerm,
    #[error("unknown loan product {id}")]
    UnknownProduct { id: String },
    #[error("no debt with id {id}")]
    UnknownDebt { id: String },
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("maximum for this product is {max}")]
    AmountTooLarge { max: f64 },
    #[error("credit score {current} is below the required {required}")]
    CreditTooLow { required: i32, current: i32 },
    #[error("not enough cash (need {required}, have {available})")]
    InsufficientCash { required: f64, available: f64 },
    #[error("the game has ended")]
    GameOver,
}

/// Anything with an outstanding balance retired by fixed payments.
pub trait Amortizing {
    fn balance(&self) -> f64;
    fn set_balance(&mut self, balance: f64);
    fn interest_rate(&self) -> f64;
    fn monthly_payment(&self) -> f64;
}

impl Amortizing for Liability {
    fn balance(&self) -> f64 {
        self.balance
    }
    fn set_balance(&mut self, balance: f64) {
        self.balance = balance;
    }
    fn interest_rate(&self) -> f64 {
        self.interest_rate
    }
    fn monthly_payment(&self) -> f64 {
        self.monthly_payment
    }
}

impl Amortizing for Mortgage {
    fn balance(&self) -> f64 {
        self.balance
    }
    fn set_balance(&mut self, balance: f64) {
        self.balance = balance;
    }
    fn interest_rate(&self) -> f64 {
        self.interest_rate
    }
    fn monthly_payment(&self) -> f64 {
        self.monthly_payment
    }
}

pub(crate) fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Fixed monthly payment that fully retires `principal` over `term_months`.
///
/// `P * r / (1 - (1 + r)^-n)` with `r = annual_rate / 12`; a zero rate
/// degrades to `P / n`. Rounded to cents.
pub fn calculate_loan_payment(
    principal: f64,
    annual_rate: f64,
    term_months: u32,
) -> Result<f64, LoanError> {
    if !principal.is_finite() || principal < 0.0 {
        return Err(LoanError::InvalidPrincipal);
    }
    if !annual_rate.is_finite() || annual_rate < 0.0 {
        return Err(LoanError::NegativeRate);
    }
    if term_months == 0 {
        return Err(LoanError::ZeroTerm);
    }

    let n = term_months as f64;
    if annual_rate == 0.0 {
        return Ok(round_cents(principal / n));
    }
    let r = annual_rate / 12.0;
    Ok(round_cents(principal * r / (1.0 - (1.0 + r).powf(-n))))
}

/// Reduce a balance by `amount`, never below zero. Negative amounts pay nothing.
pub fn apply_payment<L: Amortizing + Clone>(loan: &L, amount: f64) -> L {
    let mut next = loan.clone();
    let paid = amount.max(0.0).min(loan.balance());
    next.set_balance((loan.balance() - paid).max(0.0));
    next
}

/// Re-price a mortgage's remaining balance at a new rate and term.
///
/// Eligibility (credit score) is the caller's responsibility.
pub fn refinance(mortgage: &Mortgage, new_rate: f64, new_term: u32) -> Result<Mortgage, LoanError> {
    let payment = calculate_loan_payment(mortgage.balance, new_rate, new_term)?;
    Ok(Mortgage {
        interest_rate: new_rate,
        term_months: new_term,
        monthly_payment: payment,
        ..mortgage.clone()
    })
}

/// Rate offered for a product at the player's current credit tier.
pub fn offered_rate(state: &GameState, config: &GameConfig, spread: f64) -> f64 {
    let tier = tier_for(state.credit_rating, &config.credit_tiers);
    (state.economy.interest_rate + spread + tier.rate_premium()).max(0.0)
}

/// Borrow `amount` from a configured loan product.
pub fn take_loan(
    state: &GameState,
    config: &GameConfig,
    product_id: &str,
    amount: f64,
) -> Result<GameState, LoanError> {
    if state.is_game_over() {
        return Err(LoanError::GameOver);
    }
    let product = config
        .loan_product(product_id)
        .ok_or_else(|| LoanError::UnknownProduct { id: product_id.to_string() })?;
    if !(amount.is_finite() && amount > 0.0) {
        return Err(LoanError::NonPositiveAmount);
    }
    if amount > product.max_amount {
        return Err(LoanError::AmountTooLarge { max: product.max_amount });
    }
    if state.credit_rating < product.min_credit {
        return Err(LoanError::CreditTooLow {
            required: product.min_credit,
            current: state.credit_rating,
        });
    }

    let rate = offered_rate(state, config, product.spread);
    let payment = calculate_loan_payment(amount, rate, product.term_months)?;

    let mut next = state.clone();
    let id = next.allocate_loan_id();
    next.liabilities.push(Liability {
        id,
        name: product.name.clone(),
        balance: amount,
        interest_rate: rate,
        monthly_payment: payment,
        original_balance: amount,
        term_months: product.term_months,
    });
    next.cash += amount;
    change_credit(&mut next, -5, &format!("Hard inquiry: {}", product.name));
    next.push_event(
        "Loan approved",
        &format!(
            "{} of {:.2} at {:.2}% for {} months ({:.2}/month).",
            product.name,
            amount,
            rate * 100.0,
            product.term_months,
            payment
        ),
    );
    log::info!("loan {} taken: {:.2} at {:.4}", product_id, amount, rate);
    Ok(next)
}

/// Extra payment against one debt (liability or mortgage).
///
/// Paying more than the balance pays exactly the balance. Fully repaid
/// debts are removed and earn a credit bonus.
pub fn pay_down(state: &GameState, debt_id: &str, amount: f64) -> Result<GameState, LoanError> {
    if state.is_game_over() {
        return Err(LoanError::GameOver);
    }
    if !(amount.is_finite() && amount > 0.0) {
        return Err(LoanError::NonPositiveAmount);
    }

    let mut next = state.clone();
    let balance = if let Some(l) = next.liabilities.iter().find(|l| l.id == debt_id) {
        l.balance
    } else if let Some(m) = next.mortgages.iter().find(|m| m.id == debt_id) {
        m.balance
    } else {
        return Err(LoanError::UnknownDebt { id: debt_id.to_string() });
    };

    let paid = amount.min(balance);
    if paid > next.cash {
        return Err(LoanError::InsufficientCash {
            required: paid,
            available: next.cash,
        });
    }
    next.cash -= paid;

    if let Some(l) = next.liabilities.iter_mut().find(|l| l.id == debt_id) {
        *l = apply_payment(&*l, paid);
    } else if let Some(m) = next.mortgages.iter_mut().find(|m| m.id == debt_id) {
        *m = apply_payment(&*m, paid);
    }

    let cleared = remove_paid_off(&mut next);
    for name in &cleared {
        change_credit(&mut next, 10, &format!("Paid off {}", name));
        next.push_event("Debt paid off", &format!("{} is fully repaid.", name));
    }
    Ok(next)
}

/// Outcome of one month of scheduled debt service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaymentSummary {
    pub paid: f64,
    pub interest: f64,
    pub missed: u32,
    pub late_fees: f64,
    pub paid_off: Vec<String>,
}

/// Pay this month's installment, interest included, out of `cash`.
///
/// A missed installment leaves the balance untouched and charges the late
/// fee to cash instead.
fn service<L: Amortizing + Clone>(
    loan: &mut L,
    cash: &mut f64,
    late_fee: f64,
    summary: &mut PaymentSummary,
) {
    let interest = round_cents(loan.balance() * loan.interest_rate() / 12.0);
    let owed = loan.balance() + interest;
    let due = loan.monthly_payment().min(owed);

    if due <= *cash {
        *cash -= due;
        loan.set_balance(owed);
        *loan = apply_payment(&*loan, due);
        summary.paid += due;
        summary.interest += interest;
    } else {
        *cash -= late_fee;
        summary.late_fees += late_fee;
        summary.missed += 1;
    }
}

/// Run scheduled payments on every debt, removing those paid off.
pub(crate) fn process_monthly_payments(state: &mut GameState, config: &GameConfig) -> PaymentSummary {
    let mut summary = PaymentSummary::default();
    let mut cash = state.cash;

    for liability in state.liabilities.iter_mut() {
        service(liability, &mut cash, config.late_fee, &mut summary);
    }
    for mortgage in state.mortgages.iter_mut() {
        service(mortgage, &mut cash, config.late_fee, &mut summary);
    }

    state.cash = cash;
    summary.paid_off = remove_paid_off(state);
    summary
}

/// Drop zero-balance debts; unlink paid-off mortgages from their assets.
fn remove_paid_off(state: &mut GameState) -> Vec<String> {
    let mut cleared = Vec::new();

    state.liabilities.retain(|l| {
        if l.balance <= 0.0 {
            cleared.push(l.name.clone());
            false
        } else {
            true
        }
    });

    let mut freed = Vec::new();
    state.mortgages.retain(|m| {
        if m.balance <= 0.0 {
            freed.push(m.id.clone());
            false
        } else {
            true
        }
    });
    for asset in state.assets.iter_mut() {
        if asset.mortgage_id.as_ref().is_some_and(|id| freed.contains(id)) {
            cleared.push(format!("mortgage on {}", asset.id));
            asset.mortgage_id = None;
        }
    }
    cleared
}
