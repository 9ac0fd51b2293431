use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

/// One payment event: `payer` advanced `amount` on behalf of `members`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub payer: String,
    pub amount: Decimal,
    pub members: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub name: Option<String>,
    pub paid_by: Option<String>,
    pub price: Option<Decimal>,
}

/// A bill broken into items, each attributed to whoever paid for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItemBill {
    pub items: Vec<LineItem>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BillData {
    Split(Transaction),
    Itemized(LineItemBill),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("bill data must be a JSON object")]
    NotAnObject,
    #[error("missing `{0}`")]
    MissingField(&'static str),
    #[error("`{0}` must be {1}")]
    WrongType(&'static str, &'static str),
    #[error("`{0}` must be greater than 0")]
    NotPositive(&'static str),
    #[error("item {0} has a negative price")]
    NegativePrice(usize),
}

impl RecordError {
    /// The request field the error points at, for boundary validation messages.
    pub fn field(&self) -> &'static str {
        match self {
            RecordError::NotAnObject => "billData",
            RecordError::MissingField(f) | RecordError::WrongType(f, _) | RecordError::NotPositive(f) => f,
            RecordError::NegativePrice(_) => "items",
        }
    }
}

const SPLIT_KEYS: [&str; 3] = ["payer", "amount", "members"];

/// Reads a decimal from a JSON number or a numeric string.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Legacy documents wrap the bill as `{ groupId, billData, timestamp }`.
pub fn bill_body(document: &Map<String, Value>) -> &Map<String, Value> {
    match document.get("billData") {
        Some(Value::Object(inner)) => inner,
        _ => document,
    }
}

impl BillData {
    pub fn from_document(value: &Value) -> Result<BillData, RecordError> {
        value
            .as_object()
            .ok_or(RecordError::NotAnObject)
            .and_then(BillData::from_object)
    }

    pub fn from_object(object: &Map<String, Value>) -> Result<BillData, RecordError> {
        let body = bill_body(object);

        if SPLIT_KEYS.iter().any(|k| body.contains_key(*k)) {
            return Transaction::from_object(body).map(BillData::Split);
        }
        match body.get("items") {
            Some(Value::Array(items)) => Ok(BillData::Itemized(LineItemBill::from_items(items))),
            Some(_) => Err(RecordError::WrongType("items", "an array")),
            None => Err(RecordError::MissingField("payer")),
        }
    }
}

impl Transaction {
    fn from_object(body: &Map<String, Value>) -> Result<Transaction, RecordError> {
        let payer = match body.get("payer") {
            None | Some(Value::Null) => return Err(RecordError::MissingField("payer")),
            Some(Value::String(p)) if p.trim().is_empty() => return Err(RecordError::MissingField("payer")),
            Some(Value::String(p)) => p.clone(),
            Some(_) => return Err(RecordError::WrongType("payer", "a string")),
        };

        let amount = match body.get("amount") {
            None | Some(Value::Null) => return Err(RecordError::MissingField("amount")),
            Some(v) => decimal_from_json(v).ok_or(RecordError::WrongType("amount", "a number"))?,
        };
        if amount <= Decimal::ZERO {
            return Err(RecordError::NotPositive("amount"));
        }

        let members = match body.get("members") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(values)) => {
                let mut members: Vec<String> = Vec::with_capacity(values.len());
                for value in values {
                    let id = value
                        .as_str()
                        .ok_or(RecordError::WrongType("members", "an array of strings"))?;
                    if !members.iter().any(|m| m == id) {
                        members.push(id.to_string());
                    }
                }
                members
            }
            Some(_) => return Err(RecordError::WrongType("members", "an array of strings")),
        };

        Ok(Transaction { payer, amount, members })
    }
}

impl LineItemBill {
    // Lenient: anything unusable in an item is left as None and skipped later.
    fn from_items(items: &[Value]) -> LineItemBill {
        let items = items
            .iter()
            .map(|item| LineItem {
                name: item.get("name").and_then(Value::as_str).map(String::from),
                paid_by: item
                    .get("paidBy")
                    .and_then(Value::as_str)
                    .filter(|p| !p.trim().is_empty())
                    .map(String::from),
                price: item.get("price").and_then(decimal_from_json),
            })
            .collect();
        LineItemBill { items }
    }

    /// Boundary check for submitted bills: at least one item, no negative prices,
    /// and every `price` key that is present must hold a number.
    pub fn validate_submitted(raw_items: &[Value]) -> Result<(), RecordError> {
        if raw_items.is_empty() {
            return Err(RecordError::MissingField("items"));
        }
        for (index, raw) in raw_items.iter().enumerate() {
            let Some(price) = raw.get("price") else { continue };
            let price = decimal_from_json(price).ok_or(RecordError::WrongType("price", "a number"))?;
            if price < Decimal::ZERO {
                return Err(RecordError::NegativePrice(index));
            }
        }
        Ok(())
    }
}
