use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use crate::types::*;
use crate::PricingResult;

/// Lower bound on a below-fair-share flow, as a fraction of the fair share.
const BELOW_FLOOR: Decimal = dec!(0.5);
/// Upper bound on an above-fair-share flow, as a fraction of the fair share.
const ABOVE_CAP: Decimal = dec!(1.5);
/// Share of the opposite pool that is spread across the participants.
const POOL_FRACTION: Decimal = dec!(0.5);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Classification of how much volume a target SKU draws from a source SKU
/// relative to its fair (volume) share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairShareStatus {
    AboveFairShare,
    #[default]
    AtFairShare,
    BelowFairShare,
    NotApplicable,
}

impl std::fmt::Display for FairShareStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FairShareStatus::AboveFairShare => write!(f, "above fair share"),
            FairShareStatus::AtFairShare => write!(f, "at fair share"),
            FairShareStatus::BelowFairShare => write!(f, "below fair share"),
            FairShareStatus::NotApplicable => write!(f, "n.a."),
        }
    }
}

/// Outcome of the matrix-wide balance check.
///
/// A matrix is balanced when it has either no above/below entries at all, or
/// at least one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceCheck {
    Balanced,
    /// Some pair is above fair share but nothing is below
    MissingBelow,
    /// Some pair is below fair share but nothing is above
    MissingAbove,
}

impl BalanceCheck {
    pub fn is_balanced(&self) -> bool {
        matches!(self, BalanceCheck::Balanced)
    }

    /// Corrective message for the caller to surface, if any.
    pub fn warning(&self) -> Option<String> {
        match self {
            BalanceCheck::Balanced => None,
            BalanceCheck::MissingBelow => Some(
                "Fair-share matrix is unbalanced: at least one pair is above fair share \
                 but none is below fair share; volume flows set to 0 until a SKU is \
                 marked below fair share"
                    .into(),
            ),
            BalanceCheck::MissingAbove => Some(
                "Fair-share matrix is unbalanced: at least one pair is below fair share \
                 but none is above fair share; volume flows set to 0 until a SKU is \
                 marked above fair share"
                    .into(),
            ),
        }
    }
}

/// A single explicit classification, as exchanged with callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FairShareEntry {
    pub from: String,
    pub to: String,
    pub status: FairShareStatus,
}

/// Sparse matrix of fair-share classifications keyed by `(from, to)`.
///
/// Unset off-diagonal pairs read as [`FairShareStatus::AtFairShare`]; the
/// diagonal is always [`FairShareStatus::NotApplicable`] and never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<FairShareEntry>", into = "Vec<FairShareEntry>")]
pub struct FairShareMatrix {
    entries: BTreeMap<(String, String), FairShareStatus>,
}

impl From<Vec<FairShareEntry>> for FairShareMatrix {
    fn from(entries: Vec<FairShareEntry>) -> Self {
        let mut matrix = FairShareMatrix::new();
        for e in entries {
            matrix.insert(&e.from, &e.to, e.status);
        }
        matrix
    }
}

impl From<FairShareMatrix> for Vec<FairShareEntry> {
    fn from(matrix: FairShareMatrix) -> Self {
        matrix
            .entries
            .into_iter()
            .map(|((from, to), status)| FairShareEntry { from, to, status })
            .collect()
    }
}

impl FairShareMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classify(&self, from: &str, to: &str) -> FairShareStatus {
        if from == to {
            return FairShareStatus::NotApplicable;
        }
        self.entries
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .unwrap_or_default()
    }

    /// Apply one classification and return the updated matrix together with
    /// the balance outcome. An unbalancing update is still applied.
    pub fn set_classification(
        &self,
        from: &str,
        to: &str,
        status: FairShareStatus,
    ) -> (FairShareMatrix, BalanceCheck) {
        let mut next = self.clone();
        next.insert(from, to, status);
        let balance = next.balance();
        (next, balance)
    }

    /// In-place variant of [`set_classification`](Self::set_classification).
    /// Diagonal writes and `NotApplicable` clear the pair instead.
    pub fn insert(&mut self, from: &str, to: &str, status: FairShareStatus) -> BalanceCheck {
        let key = (from.to_string(), to.to_string());
        if from == to || status == FairShareStatus::NotApplicable {
            self.entries.remove(&key);
        } else {
            self.entries.insert(key, status);
        }
        self.balance()
    }

    pub fn balance(&self) -> BalanceCheck {
        let has_above = self
            .entries
            .values()
            .any(|s| *s == FairShareStatus::AboveFairShare);
        let has_below = self
            .entries
            .values()
            .any(|s| *s == FairShareStatus::BelowFairShare);
        match (has_above, has_below) {
            (true, false) => BalanceCheck::MissingBelow,
            (false, true) => BalanceCheck::MissingAbove,
            _ => BalanceCheck::Balanced,
        }
    }

    /// Explicitly stored pairs, in key order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, FairShareStatus)> {
        self.entries
            .iter()
            .map(|((from, to), status)| (from.as_str(), to.as_str(), *status))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct SKUs that are the target of at least one entry with `status`.
    fn targets_with(&self, status: FairShareStatus) -> BTreeSet<&str> {
        self.entries
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|((_, to), _)| to.as_str())
            .collect()
    }

    /// Flow percentage for a single pair. Builds the participant pools on
    /// every call; use [`flows`](Self::flows) for a whole analysis set.
    pub fn flow_percentage(&self, from: &str, to: &str, skus: &[Sku]) -> Percent {
        FlowPools::new(self, skus).flow(self, from, to)
    }

    /// Full flow matrix over `skus`, rows and columns in the given order.
    pub fn flows(&self, skus: &[Sku]) -> FlowMatrix {
        let pools = FlowPools::new(self, skus);
        let names: Vec<String> = skus.iter().map(|s| s.name.clone()).collect();
        let cells = skus
            .iter()
            .map(|from| {
                skus.iter()
                    .map(|to| pools.flow(self, &from.name, &to.name))
                    .collect()
            })
            .collect();
        FlowMatrix {
            names,
            cells,
            balance: pools.balance,
        }
    }
}

/// Participant pools shared by every pair in one evaluation.
struct FlowPools<'a> {
    balance: BalanceCheck,
    shares: HashMap<&'a str, Percent>,
    above_count: usize,
    below_count: usize,
    above_share_sum: Percent,
    below_share_sum: Percent,
}

impl<'a> FlowPools<'a> {
    fn new(matrix: &'a FairShareMatrix, skus: &'a [Sku]) -> Self {
        let shares: HashMap<&str, Percent> = skus
            .iter()
            .map(|s| (s.name.as_str(), s.volume_share()))
            .collect();
        let share_of = |name: &str| shares.get(name).copied().unwrap_or_default();

        let above = matrix.targets_with(FairShareStatus::AboveFairShare);
        let below = matrix.targets_with(FairShareStatus::BelowFairShare);
        let above_share_sum: Percent = above.iter().map(|n| share_of(*n)).sum();
        let below_share_sum: Percent = below.iter().map(|n| share_of(*n)).sum();

        FlowPools {
            balance: matrix.balance(),
            above_count: above.len(),
            below_count: below.len(),
            above_share_sum,
            below_share_sum,
            shares,
        }
    }

    fn flow(&self, matrix: &FairShareMatrix, from: &str, to: &str) -> Percent {
        if !self.balance.is_balanced() {
            return Decimal::ZERO;
        }
        let fair = self.shares.get(to).copied().unwrap_or_default();
        match matrix.classify(from, to) {
            FairShareStatus::NotApplicable => Decimal::ZERO,
            FairShareStatus::AtFairShare => fair,
            FairShareStatus::BelowFairShare => {
                let donated = if self.below_count == 0 {
                    Decimal::ZERO
                } else {
                    POOL_FRACTION * self.above_share_sum / Decimal::from(self.below_count as u64)
                };
                (BELOW_FLOOR * fair).max(fair - donated)
            }
            FairShareStatus::AboveFairShare => {
                let received = if self.above_count == 0 {
                    Decimal::ZERO
                } else {
                    POOL_FRACTION * self.below_share_sum / Decimal::from(self.above_count as u64)
                };
                (ABOVE_CAP * fair).min(fair + received)
            }
        }
    }
}

/// Dense flow percentages for an ordered SKU list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMatrix {
    pub names: Vec<String>,
    /// `cells[i][j]` is the flow from `names[i]` to `names[j]`, in percent
    pub cells: Vec<Vec<Percent>>,
    pub balance: BalanceCheck,
}

impl FlowMatrix {
    pub fn get(&self, from: &str, to: &str) -> Option<Percent> {
        let i = self.names.iter().position(|n| n == from)?;
        let j = self.names.iter().position(|n| n == to)?;
        Some(self.cells[i][j])
    }

    pub fn row(&self, index: usize) -> &[Percent] {
        &self.cells[index]
    }
}

// ---------------------------------------------------------------------------
// Standalone operation
// ---------------------------------------------------------------------------

/// Input for evaluating a fair-share matrix against an analysis set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairShareInput {
    pub skus: Vec<Sku>,
    #[serde(default)]
    pub fair_share: FairShareMatrix,
}

/// One row of the evaluated matrix, for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairShareCell {
    pub from: String,
    pub to: String,
    pub status: FairShareStatus,
    pub flow_pct: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FairShareOutput {
    pub balance: BalanceCheck,
    pub cells: Vec<FairShareCell>,
}

/// Classify every ordered pair of the analysis set and derive its flow
/// percentage. Entries naming SKUs outside the set are rejected.
pub fn evaluate_fair_share(
    input: &FairShareInput,
) -> PricingResult<ComputationOutput<FairShareOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    super::validate_fair_share_names(&input.fair_share, &input.skus)?;

    let flows = input.fair_share.flows(&input.skus);
    if let Some(w) = flows.balance.warning() {
        warnings.push(w);
    }

    let mut cells = Vec::with_capacity(input.skus.len() * input.skus.len());
    for (i, from) in input.skus.iter().enumerate() {
        for (j, to) in input.skus.iter().enumerate() {
            cells.push(FairShareCell {
                from: from.name.clone(),
                to: to.name.clone(),
                status: input.fair_share.classify(&from.name, &to.name),
                flow_pct: flows.cells[i][j],
            });
        }
    }

    let output = FairShareOutput {
        balance: flows.balance,
        cells,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fair-Share Volume Flow Matrix",
        &serde_json::json!({
            "num_skus": input.skus.len(),
            "explicit_entries": input.fair_share.len(),
            "below_floor": BELOW_FLOOR.to_string(),
            "above_cap": ABOVE_CAP.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sku(name: &str, share: Decimal) -> Sku {
        let mut s = Sku::new(name, Ownership::Own);
        s.volume_share = Some(share);
        s
    }

    fn three_skus() -> Vec<Sku> {
        vec![sku("A", dec!(30)), sku("B", dec!(20)), sku("C", dec!(10))]
    }

    #[test]
    fn test_diagonal_is_not_applicable() {
        let skus = three_skus();
        let (matrix, _) =
            FairShareMatrix::new().set_classification("A", "A", FairShareStatus::AboveFairShare);
        assert!(matrix.is_empty());
        assert_eq!(matrix.classify("A", "A"), FairShareStatus::NotApplicable);
        assert_eq!(matrix.flow_percentage("A", "A", &skus), Decimal::ZERO);
    }

    #[test]
    fn test_unset_pair_defaults_to_at_fair_share() {
        let skus = three_skus();
        let matrix = FairShareMatrix::new();
        assert_eq!(matrix.classify("A", "B"), FairShareStatus::AtFairShare);
        assert_eq!(matrix.flow_percentage("A", "B", &skus), dec!(20));
    }

    #[test]
    fn test_above_without_below_is_unbalanced() {
        let skus = three_skus();
        let (matrix, balance) =
            FairShareMatrix::new().set_classification("A", "B", FairShareStatus::AboveFairShare);
        assert_eq!(balance, BalanceCheck::MissingBelow);
        // The write is kept even though it unbalances the matrix
        assert_eq!(matrix.classify("A", "B"), FairShareStatus::AboveFairShare);
        let flows = matrix.flows(&skus);
        assert!(flows.cells.iter().flatten().all(|c| c.is_zero()));
        assert!(balance.warning().unwrap().contains("below fair share"));
    }

    #[test]
    fn test_below_without_above_is_unbalanced() {
        let (_, balance) =
            FairShareMatrix::new().set_classification("B", "C", FairShareStatus::BelowFairShare);
        assert_eq!(balance, BalanceCheck::MissingAbove);
        assert!(balance.warning().unwrap().contains("above fair share"));
    }

    #[test]
    fn test_balanced_flows_use_shared_pools() {
        let skus = three_skus();
        let (m, _) =
            FairShareMatrix::new().set_classification("A", "B", FairShareStatus::AboveFairShare);
        let (m, balance) = m.set_classification("A", "C", FairShareStatus::BelowFairShare);
        assert_eq!(balance, BalanceCheck::Balanced);

        // above(B) = min(1.5*20, 20 + 0.5*10/1) = min(30, 25) = 25
        assert_eq!(m.flow_percentage("A", "B", &skus), dec!(25));
        // below(C) = max(0.5*10, 10 - 0.5*20/1) = max(5, 0) = 5
        assert_eq!(m.flow_percentage("A", "C", &skus), dec!(5));
        // untouched pair stays at fair share
        assert_eq!(m.flow_percentage("B", "A", &skus), dec!(30));
    }

    #[test]
    fn test_above_flow_capped_at_one_and_a_half() {
        let skus = vec![sku("A", dec!(10)), sku("B", dec!(4)), sku("C", dec!(60))];
        let (m, _) =
            FairShareMatrix::new().set_classification("A", "B", FairShareStatus::AboveFairShare);
        let (m, _) = m.set_classification("A", "C", FairShareStatus::BelowFairShare);
        // min(6, 4 + 30) = 6
        assert_eq!(m.flow_percentage("A", "B", &skus), dec!(6));
    }

    #[test]
    fn test_monotonic_ordering_for_equal_shares() {
        let skus = vec![
            sku("A", dec!(25)),
            sku("B", dec!(25)),
            sku("C", dec!(25)),
            sku("D", dec!(25)),
        ];
        let (m, _) =
            FairShareMatrix::new().set_classification("A", "B", FairShareStatus::AboveFairShare);
        let (m, _) = m.set_classification("A", "C", FairShareStatus::BelowFairShare);
        let above = m.flow_percentage("A", "B", &skus);
        let below = m.flow_percentage("A", "C", &skus);
        let at = m.flow_percentage("A", "D", &skus);
        assert!(below <= at, "below {below} > at {at}");
        assert!(at <= above, "at {at} > above {above}");
    }

    #[test]
    fn test_pools_count_distinct_targets_across_rows() {
        let skus = vec![
            sku("A", dec!(40)),
            sku("B", dec!(20)),
            sku("C", dec!(20)),
            sku("D", dec!(20)),
        ];
        let mut m = FairShareMatrix::new();
        m.insert("A", "B", FairShareStatus::AboveFairShare);
        m.insert("D", "B", FairShareStatus::AboveFairShare);
        m.insert("A", "C", FairShareStatus::BelowFairShare);
        m.insert("B", "D", FairShareStatus::BelowFairShare);
        // above set {B}, below set {C, D}
        // below(C) from A = max(10, 20 - 0.5*20/2) = 15
        assert_eq!(m.flow_percentage("A", "C", &skus), dec!(15));
        // above(B) = min(30, 20 + 0.5*40/1) = 30
        assert_eq!(m.flow_percentage("A", "B", &skus), dec!(30));
    }

    #[test]
    fn test_not_applicable_write_clears_pair() {
        let mut m = FairShareMatrix::new();
        m.insert("A", "B", FairShareStatus::BelowFairShare);
        m.insert("A", "B", FairShareStatus::NotApplicable);
        assert!(m.is_empty());
        assert_eq!(m.classify("A", "B"), FairShareStatus::AtFairShare);
    }

    #[test]
    fn test_names_containing_separators_do_not_collide() {
        let mut m = FairShareMatrix::new();
        m.insert("A_B", "C", FairShareStatus::AboveFairShare);
        assert_eq!(m.classify("A", "B_C"), FairShareStatus::AtFairShare);
        assert_eq!(m.classify("A_B", "C"), FairShareStatus::AboveFairShare);
    }

    #[test]
    fn test_serde_round_trip_as_entry_list() {
        let json = serde_json::json!([
            {"from": "A", "to": "B", "status": "above_fair_share"},
            {"from": "B", "to": "C", "status": "below_fair_share"},
            {"from": "C", "to": "C", "status": "above_fair_share"}
        ]);
        let m: FairShareMatrix = serde_json::from_value(json).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.balance(), BalanceCheck::Balanced);
    }

    #[test]
    fn test_evaluate_rejects_unknown_names() {
        let mut fair_share = FairShareMatrix::new();
        fair_share.insert("A", "Z", FairShareStatus::BelowFairShare);
        let input = FairShareInput {
            skus: three_skus(),
            fair_share,
        };
        assert!(evaluate_fair_share(&input).is_err());
    }

    #[test]
    fn test_evaluate_emits_full_grid() {
        let input = FairShareInput {
            skus: three_skus(),
            fair_share: FairShareMatrix::new(),
        };
        let out = evaluate_fair_share(&input).unwrap();
        assert_eq!(out.result.cells.len(), 9);
        assert!(out.warnings.is_empty());
        let diag = &out.result.cells[4];
        assert_eq!(diag.status, FairShareStatus::NotApplicable);
        assert_eq!(diag.flow_pct, Decimal::ZERO);
    }
}
