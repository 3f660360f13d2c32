use crate::month::MonthKey;
use crate::schema::RecordKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a month without its own data point gets a value.
///
/// Balances carry forward, flows do not: a month with no transactions had
/// zero flow, while a month with no balance update still holds the last
/// balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPolicy {
    /// Most recent value at or before the month, 0 if there is none.
    CarryForward,
    /// The month's own value, 0 if there is none.
    ZeroFill,
}

impl FillPolicy {
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Snapshot => FillPolicy::CarryForward,
            RecordKind::Event => FillPolicy::ZeroFill,
        }
    }

    /// Value for `month` given the sparse per-month `history`.
    ///
    /// `history` may extend past either end of the requested window; only
    /// entries at or before `month` are ever consulted.
    pub fn fill(&self, month: MonthKey, history: &BTreeMap<MonthKey, Decimal>) -> Decimal {
        match self {
            FillPolicy::CarryForward => history
                .range(..=month)
                .next_back()
                .map(|(_, value)| *value)
                .unwrap_or(Decimal::ZERO),
            FillPolicy::ZeroFill => history.get(&month).copied().unwrap_or(Decimal::ZERO),
        }
    }
}
