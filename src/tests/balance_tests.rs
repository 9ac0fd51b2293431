use crate::core::balance::{Balances, compute_balances, round_balances, tally_line_items};
use crate::core::errors::BillbusterError;
use crate::core::models::transaction::{BillData, LineItem, LineItemBill, RecordError, Transaction};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

const PEOPLE: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

fn tx(payer: &str, amount: Decimal, members: &[&str]) -> Transaction {
    Transaction {
        payer: payer.to_string(),
        amount,
        members: members.iter().map(|m| m.to_string()).collect(),
    }
}

fn item(paid_by: Option<&str>, price: Option<Decimal>) -> LineItem {
    LineItem {
        name: None,
        paid_by: paid_by.map(String::from),
        price,
    }
}

fn balances(entries: &[(&str, Decimal)]) -> Balances {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn test_payer_in_members_is_not_debited_own_share() {
    let result = compute_balances(&[tx("A", dec!(100), &["A", "B", "C", "D"])]).unwrap();
    assert_eq!(
        result,
        balances(&[("A", dec!(100)), ("B", dec!(-25)), ("C", dec!(-25)), ("D", dec!(-25))])
    );
}

#[test]
fn test_payer_in_members_leaves_one_share_unbalanced() {
    let transaction = tx("A", dec!(100), &["A", "B", "C", "D"]);
    let result = compute_balances(&[transaction.clone()]).unwrap();
    let total: Decimal = result.values().copied().sum();
    assert_eq!(total, transaction.amount / Decimal::from(transaction.members.len()));
    assert_eq!(total, dec!(25));
}

#[test]
fn test_payer_excluded_from_members_is_credited_full_amount() {
    let result = compute_balances(&[tx("A", dec!(90), &["B", "C", "D"])]).unwrap();
    assert_eq!(result["A"], dec!(90));
    assert_eq!(result["B"], dec!(-30));
    assert_eq!(result.values().copied().sum::<Decimal>(), Decimal::ZERO);
}

#[test]
fn test_payer_only_member_keeps_full_amount() {
    let result = compute_balances(&[tx("A", dec!(42.50), &["A"])]).unwrap();
    assert_eq!(result, balances(&[("A", dec!(42.50))]));
}

#[test]
fn test_empty_history_gives_empty_balances() {
    let result = compute_balances(&Vec::<Transaction>::new()).unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_empty_members_is_rejected() {
    let err = compute_balances(&[tx("A", dec!(10), &["A", "B"]), tx("B", dec!(5), &[])]).unwrap_err();
    match err {
        BillbusterError::EmptyMembers { payer } => assert_eq!(payer, "B"),
        other => panic!("expected EmptyMembers, got {:?}", other),
    }
}

#[test]
fn test_balances_accumulate_across_transactions() {
    let result = compute_balances(&[
        tx("A", dec!(60), &["A", "B", "C"]),
        tx("B", dec!(30), &["A", "B", "C"]),
    ])
    .unwrap();
    assert_eq!(result["A"], dec!(50));
    assert_eq!(result["B"], dec!(10));
    assert_eq!(result["C"], dec!(-30));
}

#[test]
fn test_overflow_is_reported() {
    let err = compute_balances(&[tx("A", Decimal::MAX, &["B"]), tx("A", Decimal::MAX, &["B"])]).unwrap_err();
    assert!(matches!(err, BillbusterError::BalanceOverflow));
}

#[test]
fn test_line_items_tally_gross_amounts_only() {
    let bill = LineItemBill {
        items: vec![item(Some("A"), Some(dec!(50))), item(Some("B"), Some(dec!(50)))],
    };
    let result = tally_line_items(&[bill]).unwrap();
    assert_eq!(result, balances(&[("A", dec!(50)), ("B", dec!(50))]));
}

#[test]
fn test_line_items_skip_incomplete_items() {
    let bills = vec![
        LineItemBill {
            items: vec![item(Some("A"), Some(dec!(12.5))), item(None, Some(dec!(99)))],
        },
        LineItemBill {
            items: vec![item(Some("A"), Some(dec!(7.5))), item(Some("C"), None)],
        },
    ];
    let result = tally_line_items(&bills).unwrap();
    assert_eq!(result, balances(&[("A", dec!(20))]));
}

#[test]
fn test_rounding_is_bankers_and_never_negative_zero() {
    let raw = balances(&[
        ("A", dec!(0.025)),
        ("B", dec!(-0.025)),
        ("C", dec!(0.035)),
        ("D", dec!(-0.001)),
    ]);
    let rounded = round_balances(raw, 2);
    assert_eq!(rounded["A"], dec!(0.02));
    assert_eq!(rounded["B"], dec!(-0.02));
    assert_eq!(rounded["C"], dec!(0.04));
    assert_eq!(rounded["D"], Decimal::ZERO);
    assert!(rounded["D"].is_sign_positive());
}

#[test]
fn test_three_way_split_rounds_to_cents() {
    let result = round_balances(compute_balances(&[tx("A", dec!(100), &["B", "C", "D"])]).unwrap(), 2);
    assert_eq!(result["A"], dec!(100));
    assert_eq!(result["B"], dec!(-33.33));
}

#[test]
fn test_record_parsing_picks_shape_by_keys() {
    let split = BillData::from_document(&json!({ "payer": "A", "amount": "12.40", "members": ["A", "B", "A"] })).unwrap();
    assert_eq!(split, BillData::Split(tx("A", dec!(12.40), &["A", "B"])));

    let legacy = BillData::from_document(&json!({
        "groupId": "g1",
        "billData": { "items": [{ "name": "Pizza", "price": 20, "paidBy": "A" }, { "price": "oops" }] },
    }))
    .unwrap();
    match legacy {
        BillData::Itemized(bill) => {
            assert_eq!(bill.items.len(), 2);
            assert_eq!(bill.items[0].price, Some(dec!(20)));
            assert_eq!(bill.items[1].price, None);
        }
        other => panic!("expected itemized bill, got {:?}", other),
    }
}

#[test]
fn test_record_parsing_rejects_malformed_split() {
    assert_eq!(
        BillData::from_document(&json!({ "amount": 10, "members": ["B"] })),
        Err(RecordError::MissingField("payer"))
    );
    assert_eq!(
        BillData::from_document(&json!({ "payer": "A", "amount": "ten", "members": ["B"] })),
        Err(RecordError::WrongType("amount", "a number"))
    );
    assert_eq!(
        BillData::from_document(&json!({ "payer": "A", "amount": 0, "members": ["B"] })),
        Err(RecordError::NotPositive("amount"))
    );
    assert_eq!(BillData::from_document(&json!({ "note": "hi" })), Err(RecordError::MissingField("payer")));
    assert_eq!(BillData::from_document(&json!([1, 2])), Err(RecordError::NotAnObject));
}

fn transaction_strategy() -> impl Strategy<Value = Transaction> {
    (
        prop::sample::select(PEOPLE.to_vec()),
        1i64..=1_000_000,
        prop::sample::subsequence(PEOPLE.to_vec(), 1..=PEOPLE.len()),
    )
        .prop_map(|(payer, cents, members)| tx(payer, Decimal::new(cents, 2), &members))
}

// Division leaves at most a few units in the last of Decimal's 28 digits.
fn assert_close(left: &Balances, right: &Balances) {
    let tolerance = dec!(0.00000000000000000001);
    assert_eq!(left.keys().collect::<Vec<_>>(), right.keys().collect::<Vec<_>>());
    for (participant, value) in left {
        let diff = (*value - right[participant]).abs();
        assert!(diff <= tolerance, "{} differs by {}", participant, diff);
    }
}

proptest! {
    #[test]
    fn prop_split_conserves_money_when_payer_excluded(tx in transaction_strategy()) {
        let mut tx = tx;
        tx.members.retain(|m| *m != tx.payer);
        prop_assume!(!tx.members.is_empty());

        let result = compute_balances(&[tx.clone()]).unwrap();
        let total: Decimal = result.values().copied().sum();
        prop_assert!(total.abs() <= dec!(0.00000000000000000001), "residue {}", total);
        prop_assert_eq!(result[&tx.payer], tx.amount);
    }

    #[test]
    fn prop_split_with_payer_as_member_sums_to_one_share(tx in transaction_strategy()) {
        let mut tx = tx;
        if !tx.members.contains(&tx.payer) {
            tx.members.push(tx.payer.clone());
        }

        let result = compute_balances(&[tx.clone()]).unwrap();
        let total: Decimal = result.values().copied().sum();
        let share = tx.amount / Decimal::from(tx.members.len());
        prop_assert!((total - share).abs() <= dec!(0.00000000000000000001), "total {} share {}", total, share);
        prop_assert_eq!(result[&tx.payer], tx.amount);
    }

    #[test]
    fn prop_compute_balances_is_idempotent(txs in prop::collection::vec(transaction_strategy(), 0..20)) {
        let first = compute_balances(&txs).unwrap();
        let second = compute_balances(&txs).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_compute_balances_ignores_order(
        (txs, shuffled) in prop::collection::vec(transaction_strategy(), 0..20)
            .prop_flat_map(|txs| (Just(txs.clone()), Just(txs).prop_shuffle()))
    ) {
        let original = compute_balances(&txs).unwrap();
        let permuted = compute_balances(&shuffled).unwrap();
        assert_close(&original, &permuted);
    }

    #[test]
    fn prop_line_item_total_matches_priced_items(prices in prop::collection::vec(0i64..100_000, 0..30)) {
        let bill = LineItemBill {
            items: prices
                .iter()
                .enumerate()
                .map(|(i, cents)| item(Some(PEOPLE[i % PEOPLE.len()]), Some(Decimal::new(*cents, 2))))
                .collect(),
        };
        let result = tally_line_items(&[bill]).unwrap();
        let expected: Decimal = prices.iter().map(|c| Decimal::new(*c, 2)).sum();
        prop_assert_eq!(result.values().copied().sum::<Decimal>(), expected);
        prop_assert!(result.values().all(|v| *v >= Decimal::ZERO));
    }
}
