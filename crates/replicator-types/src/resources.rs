//! The resource vector: typed quantities across the five resource kinds.
//!
//! Every probe inventory, every body's extractable stock, and every cost in
//! the economy is a [`ResourceVector`]. Fields are unsigned, so a vector can
//! never hold a negative quantity; operations that would underflow or
//! overflow return `None` and leave both operands untouched.
//!
//! Callers that mutate shared state must check [`ResourceVector::can_afford`]
//! before calling [`ResourceVector::checked_sub`]. A `None` from a
//! subtraction that passed the affordability check is an invariant
//! violation, never a normal outcome.

use serde::{Deserialize, Serialize};

/// One of the five resource kinds tracked by a [`ResourceVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Stored energy, spent on travel and replication.
    Energy,
    /// Structural metal.
    Metal,
    /// Silicon for electronics.
    Silicon,
    /// Hydrogen for reaction mass.
    Hydrogen,
    /// Scarce elements needed for advanced components.
    RareElements,
}

impl ResourceKind {
    /// All resource kinds in canonical order.
    pub const ALL: [Self; 5] = [
        Self::Energy,
        Self::Metal,
        Self::Silicon,
        Self::Hydrogen,
        Self::RareElements,
    ];

    /// Stable snake-case name of the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Metal => "metal",
            Self::Silicon => "silicon",
            Self::Hydrogen => "hydrogen",
            Self::RareElements => "rare_elements",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-negative quantities of every resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceVector {
    /// Energy units.
    #[serde(default)]
    pub energy: u64,
    /// Metal units.
    #[serde(default)]
    pub metal: u64,
    /// Silicon units.
    #[serde(default)]
    pub silicon: u64,
    /// Hydrogen units.
    #[serde(default)]
    pub hydrogen: u64,
    /// Rare element units.
    #[serde(default)]
    pub rare_elements: u64,
}

impl ResourceVector {
    /// The empty vector.
    pub const ZERO: Self = Self::new(0, 0, 0, 0, 0);

    /// Build a vector from its five fields.
    pub const fn new(
        energy: u64,
        metal: u64,
        silicon: u64,
        hydrogen: u64,
        rare_elements: u64,
    ) -> Self {
        Self {
            energy,
            metal,
            silicon,
            hydrogen,
            rare_elements,
        }
    }

    /// A vector holding only energy.
    pub const fn energy(amount: u64) -> Self {
        Self::new(amount, 0, 0, 0, 0)
    }

    /// A vector holding the same amount of every kind.
    pub const fn splat(amount: u64) -> Self {
        Self::new(amount, amount, amount, amount, amount)
    }

    /// Quantity of a single kind.
    pub const fn get(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Energy => self.energy,
            ResourceKind::Metal => self.metal,
            ResourceKind::Silicon => self.silicon,
            ResourceKind::Hydrogen => self.hydrogen,
            ResourceKind::RareElements => self.rare_elements,
        }
    }

    /// Iterate over `(kind, quantity)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u64)> + '_ {
        ResourceKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    /// Apply `op` field-wise, failing if any field fails.
    fn zip_with(self, other: Self, op: impl Fn(u64, u64) -> Option<u64>) -> Option<Self> {
        Some(Self {
            energy: op(self.energy, other.energy)?,
            metal: op(self.metal, other.metal)?,
            silicon: op(self.silicon, other.silicon)?,
            hydrogen: op(self.hydrogen, other.hydrogen)?,
            rare_elements: op(self.rare_elements, other.rare_elements)?,
        })
    }

    /// Field-wise sum. Returns `None` on overflow.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.zip_with(other, u64::checked_add)
    }

    /// Field-wise difference. Returns `None` if any field would go negative.
    ///
    /// Must only be relied upon after [`can_afford`](Self::can_afford) holds.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.zip_with(other, u64::checked_sub)
    }

    /// Field-wise sum, clamping each field at `u64::MAX`.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self {
            energy: self.energy.saturating_add(other.energy),
            metal: self.metal.saturating_add(other.metal),
            silicon: self.silicon.saturating_add(other.silicon),
            hydrogen: self.hydrogen.saturating_add(other.hydrogen),
            rare_elements: self.rare_elements.saturating_add(other.rare_elements),
        }
    }

    /// Every field multiplied by `factor`. Returns `None` on overflow.
    pub fn scaled(self, factor: u64) -> Option<Self> {
        self.zip_with(Self::splat(factor), u64::checked_mul)
    }

    /// Field-wise minimum of two vectors.
    #[must_use]
    pub fn min_each(self, other: Self) -> Self {
        Self {
            energy: self.energy.min(other.energy),
            metal: self.metal.min(other.metal),
            silicon: self.silicon.min(other.silicon),
            hydrogen: self.hydrogen.min(other.hydrogen),
            rare_elements: self.rare_elements.min(other.rare_elements),
        }
    }

    /// True iff every field of `self` is at least the matching field of `cost`.
    pub const fn can_afford(&self, cost: &Self) -> bool {
        self.energy >= cost.energy
            && self.metal >= cost.metal
            && self.silicon >= cost.silicon
            && self.hydrogen >= cost.hydrogen
            && self.rare_elements >= cost.rare_elements
    }

    /// Sum of all fields, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.iter()
            .fold(0_u64, |acc, (_, quantity)| acc.saturating_add(quantity))
    }

    /// True if every field is zero.
    pub fn is_empty(&self) -> bool {
        *self == Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: ResourceVector = ResourceVector::new(100, 50, 30, 20, 5);

    #[test]
    fn add_is_commutative() {
        let other = ResourceVector::new(1, 2, 3, 4, 5);
        assert_eq!(SAMPLE.checked_add(other), other.checked_add(SAMPLE));
        assert_eq!(
            SAMPLE.checked_add(other),
            Some(ResourceVector::new(101, 52, 33, 24, 10))
        );
    }

    #[test]
    fn add_overflow_fails() {
        let big = ResourceVector::energy(u64::MAX);
        assert_eq!(big.checked_add(ResourceVector::energy(1)), None);
        assert_eq!(big.saturating_add(ResourceVector::energy(1)).energy, u64::MAX);
    }

    #[test]
    fn subtract_affordable_cost() {
        let cost = ResourceVector::new(100, 10, 0, 0, 5);
        assert!(SAMPLE.can_afford(&cost));
        assert_eq!(
            SAMPLE.checked_sub(cost),
            Some(ResourceVector::new(0, 40, 30, 20, 0))
        );
    }

    #[test]
    fn subtract_unaffordable_is_all_or_nothing() {
        let cost = ResourceVector::new(10, 10, 10, 10, 6);
        assert!(!SAMPLE.can_afford(&cost));
        assert_eq!(SAMPLE.checked_sub(cost), None);
    }

    #[test]
    fn can_afford_exact_amount() {
        assert!(SAMPLE.can_afford(&SAMPLE));
        assert!(ResourceVector::ZERO.can_afford(&ResourceVector::ZERO));
    }

    #[test]
    fn total_sums_fields() {
        assert_eq!(SAMPLE.total(), 205);
        assert_eq!(ResourceVector::splat(u64::MAX).total(), u64::MAX);
    }

    #[test]
    fn min_each_caps_fields() {
        let cap = ResourceVector::splat(25);
        assert_eq!(SAMPLE.min_each(cap), ResourceVector::new(25, 25, 25, 20, 5));
    }

    #[test]
    fn get_matches_fields() {
        assert_eq!(SAMPLE.get(ResourceKind::Energy), 100);
        assert_eq!(SAMPLE.get(ResourceKind::RareElements), 5);
        assert_eq!(SAMPLE.iter().count(), 5);
    }

    #[test]
    fn missing_fields_deserialize_as_zero() {
        let parsed: Result<ResourceVector, _> = serde_json::from_str(r#"{"metal": 3}"#);
        assert_eq!(parsed.ok(), Some(ResourceVector::new(0, 3, 0, 0, 0)));
    }
}
