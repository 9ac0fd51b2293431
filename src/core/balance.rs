//! Balance computation over a group's transaction history.
//!
//! Two accounting policies live here and are deliberately kept apart:
//!
//! * [`compute_balances`] splits each transaction evenly between its members.
//!   The payer is credited the full amount and is never debited their own
//!   share, so a payer who is also a member nets `amount - amount / |members|`.
//! * [`tally_line_items`] only sums what each person paid for itemized bills.
//!   Nobody is debited.
//!
//! Both are pure: callers fetch the records, these functions only fold them.

use crate::core::errors::BillbusterError;
use crate::core::models::transaction::{LineItemBill, Transaction};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;

/// Signed net amount per participant. Positive means the participant is owed money.
pub type Balances = BTreeMap<String, Decimal>;

pub fn compute_balances<'a, I>(transactions: I) -> Result<Balances, BillbusterError>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut balances = Balances::new();
    for transaction in transactions {
        apply_split(&mut balances, transaction)?;
    }
    Ok(balances)
}

fn apply_split(balances: &mut Balances, transaction: &Transaction) -> Result<(), BillbusterError> {
    if transaction.members.is_empty() {
        return Err(BillbusterError::EmptyMembers {
            payer: transaction.payer.clone(),
        });
    }

    credit(balances, &transaction.payer, transaction.amount)?;

    let split_amount = transaction
        .amount
        .checked_div(Decimal::from(transaction.members.len()))
        .ok_or(BillbusterError::BalanceOverflow)?;

    for member in transaction.members.iter().filter(|m| **m != transaction.payer) {
        credit(balances, member, -split_amount)?;
    }
    Ok(())
}

fn credit(balances: &mut Balances, participant: &str, delta: Decimal) -> Result<(), BillbusterError> {
    let entry = balances.entry(participant.to_string()).or_insert(Decimal::ZERO);
    *entry = entry.checked_add(delta).ok_or(BillbusterError::BalanceOverflow)?;
    Ok(())
}

pub fn tally_line_items<'a, I>(bills: I) -> Result<Balances, BillbusterError>
where
    I: IntoIterator<Item = &'a LineItemBill>,
{
    let mut balances = Balances::new();
    for item in bills.into_iter().flat_map(|bill| bill.items.iter()) {
        if let (Some(paid_by), Some(price)) = (&item.paid_by, item.price) {
            credit(&mut balances, paid_by, price)?;
        }
    }
    Ok(balances)
}

/// Rounds every balance to `decimals` places, ties to even.
pub fn round_balances(balances: Balances, decimals: u32) -> Balances {
    balances
        .into_iter()
        .map(|(participant, amount)| {
            let rounded = amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
            // -0.00 and 0.00 should serialize the same
            let rounded = if rounded.is_zero() { Decimal::ZERO } else { rounded };
            (participant, rounded)
        })
        .collect()
}
