//! Charge and elemental balance checks for reaction stoichiometry
use indexmap::IndexMap;

use crate::configuration;
use crate::metabolic_model::metabolite::Metabolite;

/// Result of the charge balance check
#[derive(Clone, Debug, PartialEq)]
pub enum ChargeBalance {
    /// At least one metabolite has no charge set
    Unknown,
    Balanced,
    /// Net charge of the reaction (products minus substrates)
    Imbalanced(f64),
}

/// Result of the elemental balance check
#[derive(Clone, Debug, PartialEq)]
pub enum ElementBalance {
    /// At least one metabolite has no (valid) formula
    Unknown,
    Balanced,
    /// Net count of every element that does not cancel out
    Imbalanced(IndexMap<String, f64>),
}

/// Overall balance of a reaction
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BalanceState {
    /// Fewer than two metabolites participate (exchange, demand and sink reactions)
    NotApplicable,
    Balanced,
    Unbalanced,
    /// Neither check found an imbalance, but at least one could not be determined
    Unknown,
}

/// Derived balancing status of a reaction
#[derive(Clone, Debug, PartialEq)]
pub struct BalanceStatus {
    pub charge: ChargeBalance,
    pub elements: ElementBalance,
    pub balanced: BalanceState,
}

impl Default for BalanceStatus {
    fn default() -> Self {
        BalanceStatus {
            charge: ChargeBalance::Balanced,
            elements: ElementBalance::Balanced,
            balanced: BalanceState::NotApplicable,
        }
    }
}

/// Sum `coefficient * element count` per element over all participants.
///
/// Coefficients are floats, so an element counts as cancelled once its net sum is within
/// the configured tolerance rather than exactly zero.
pub fn check_element_balance<'a, I>(participants: I) -> ElementBalance
where
    I: IntoIterator<Item = (&'a Metabolite, f64)>,
{
    let tolerance = configuration::tolerance();
    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for (metabolite, coefficient) in participants {
        let elements = match metabolite.elements() {
            Some(elements) => elements,
            None => return ElementBalance::Unknown,
        };
        for (element, count) in elements {
            *totals.entry(element).or_insert(0.) += coefficient * count;
        }
    }
    totals.retain(|_, total| total.abs() > tolerance);
    if totals.is_empty() {
        ElementBalance::Balanced
    } else {
        ElementBalance::Imbalanced(totals)
    }
}

/// Sum `coefficient * charge` over all participants.
///
/// A net charge within the configured tolerance of zero is balanced.
pub fn check_charge_balance<'a, I>(participants: I) -> ChargeBalance
where
    I: IntoIterator<Item = (&'a Metabolite, f64)>,
{
    let mut total = 0.;
    for (metabolite, coefficient) in participants {
        match metabolite.charge() {
            Some(charge) => total += coefficient * f64::from(charge),
            None => return ChargeBalance::Unknown,
        }
    }
    if total.abs() > configuration::tolerance() {
        ChargeBalance::Imbalanced(total)
    } else {
        ChargeBalance::Balanced
    }
}

/// Run both checks and combine them into the overall [`BalanceState`]
pub fn check_balance<'a, I>(participants: I) -> BalanceStatus
where
    I: IntoIterator<Item = (&'a Metabolite, f64)>,
{
    let participants: Vec<(&Metabolite, f64)> = participants.into_iter().collect();
    let charge = check_charge_balance(participants.iter().copied());
    let elements = check_element_balance(participants.iter().copied());
    let balanced = if participants.len() < 2 {
        BalanceState::NotApplicable
    } else {
        match (&charge, &elements) {
            (ChargeBalance::Balanced, ElementBalance::Balanced) => BalanceState::Balanced,
            (ChargeBalance::Imbalanced(_), _) | (_, ElementBalance::Imbalanced(_)) => {
                BalanceState::Unbalanced
            }
            _ => BalanceState::Unknown,
        }
    };
    BalanceStatus {
        charge,
        elements,
        balanced,
    }
}
