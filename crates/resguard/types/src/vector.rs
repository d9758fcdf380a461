use crate::error::TypesError;
use crate::kind::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Non-negative amount per resource kind.
///
/// Serialized as a map keyed by kind name. Deserialization requires every kind
/// to be present so a truncated snapshot cannot silently read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<ResourceKind, u64>",
    into = "BTreeMap<ResourceKind, u64>"
)]
pub struct ResourceVector([u64; ResourceKind::COUNT]);

impl ResourceVector {
    pub const fn new(amounts: [u64; ResourceKind::COUNT]) -> Self {
        Self(amounts)
    }

    pub const fn zero() -> Self {
        Self([0; ResourceKind::COUNT])
    }

    /// Same amount for every kind.
    pub const fn uniform(amount: u64) -> Self {
        Self([amount; ResourceKind::COUNT])
    }

    pub fn get(&self, kind: ResourceKind) -> u64 {
        self.0[kind.index()]
    }

    pub fn set(&mut self, kind: ResourceKind, amount: u64) {
        self.0[kind.index()] = amount;
    }

    pub fn with(mut self, kind: ResourceKind, amount: u64) -> Self {
        self.set(kind, amount);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u64)> + '_ {
        ResourceKind::ALL.iter().map(move |kind| (*kind, self.get(*kind)))
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|amount| *amount == 0)
    }

    /// True when every component is `<=` the matching component of `bound`.
    pub fn fits_within(&self, bound: &ResourceVector) -> bool {
        self.first_excess(bound).is_none()
    }

    /// First kind (in slot order) where `self` exceeds `bound`, with both amounts.
    pub fn first_excess(&self, bound: &ResourceVector) -> Option<(ResourceKind, u64, u64)> {
        ResourceKind::ALL.iter().find_map(|kind| {
            let (mine, limit) = (self.get(*kind), bound.get(*kind));
            (mine > limit).then_some((*kind, mine, limit))
        })
    }

    pub fn checked_add(&self, other: &ResourceVector) -> Option<ResourceVector> {
        let mut out = [0; ResourceKind::COUNT];
        for (slot, (a, b)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter())) {
            *slot = a.checked_add(*b)?;
        }
        Some(Self(out))
    }

    pub fn checked_sub(&self, other: &ResourceVector) -> Option<ResourceVector> {
        let mut out = [0; ResourceKind::COUNT];
        for (slot, (a, b)) in out.iter_mut().zip(self.0.iter().zip(other.0.iter())) {
            *slot = a.checked_sub(*b)?;
        }
        Some(Self(out))
    }

    pub fn saturating_add(&self, other: &ResourceVector) -> ResourceVector {
        let mut out = self.0;
        for (slot, b) in out.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_add(*b);
        }
        Self(out)
    }

    pub fn saturating_sub(&self, other: &ResourceVector) -> ResourceVector {
        let mut out = self.0;
        for (slot, b) in out.iter_mut().zip(other.0.iter()) {
            *slot = slot.saturating_sub(*b);
        }
        Self(out)
    }

    /// Componentwise sum of `vectors`, `None` on overflow.
    pub fn checked_sum<'a>(
        vectors: impl IntoIterator<Item = &'a ResourceVector>,
    ) -> Option<ResourceVector> {
        vectors
            .into_iter()
            .try_fold(ResourceVector::zero(), |acc, v| acc.checked_add(v))
    }

    pub fn as_array(&self) -> &[u64; ResourceKind::COUNT] {
        &self.0
    }
}

impl Index<ResourceKind> for ResourceVector {
    type Output = u64;

    fn index(&self, kind: ResourceKind) -> &u64 {
        &self.0[kind.index()]
    }
}

impl IndexMut<ResourceKind> for ResourceVector {
    fn index_mut(&mut self, kind: ResourceKind) -> &mut u64 {
        &mut self.0[kind.index()]
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, (kind, amount)) in self.iter().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{kind}: {amount}")?;
        }
        f.write_str("}")
    }
}

impl TryFrom<BTreeMap<ResourceKind, u64>> for ResourceVector {
    type Error = TypesError;

    fn try_from(map: BTreeMap<ResourceKind, u64>) -> Result<Self, Self::Error> {
        let mut vector = ResourceVector::zero();
        for kind in ResourceKind::ALL {
            let amount = map
                .get(&kind)
                .ok_or_else(|| TypesError::MissingResourceKind(kind.to_string()))?;
            vector.set(kind, *amount);
        }
        Ok(vector)
    }
}

impl From<ResourceVector> for BTreeMap<ResourceKind, u64> {
    fn from(vector: ResourceVector) -> Self {
        vector.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_excess_reports_first_kind_in_slot_order() {
        let request = ResourceVector::new([1, 6, 9, 0]);
        let bound = ResourceVector::uniform(5);
        assert_eq!(
            request.first_excess(&bound),
            Some((ResourceKind::Memory, 6, 5))
        );
        assert!(!request.fits_within(&bound));
        assert!(ResourceVector::uniform(5).fits_within(&bound));
    }

    #[test]
    fn checked_sub_refuses_underflow() {
        let pool = ResourceVector::uniform(3);
        assert_eq!(
            pool.checked_sub(&ResourceVector::new([1, 2, 3, 0])),
            Some(ResourceVector::new([2, 1, 0, 3]))
        );
        assert_eq!(pool.checked_sub(&ResourceVector::new([0, 0, 4, 0])), None);
    }

    #[test]
    fn checked_sum_detects_overflow() {
        let vectors = [ResourceVector::uniform(u64::MAX), ResourceVector::uniform(1)];
        assert_eq!(ResourceVector::checked_sum(&vectors), None);

        let vectors = [ResourceVector::uniform(2), ResourceVector::new([1, 0, 0, 4])];
        assert_eq!(
            ResourceVector::checked_sum(&vectors),
            Some(ResourceVector::new([3, 2, 2, 6]))
        );
    }

    #[test]
    fn serializes_as_named_map() {
        let vector = ResourceVector::new([3, 30, 300, 3000]);
        let json = serde_json::to_value(vector).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cpu": 3, "memory": 30, "disk": 300, "network": 3000})
        );
        let back: ResourceVector = serde_json::from_value(json).unwrap();
        assert_eq!(back, vector);
    }

    #[test]
    fn rejects_missing_unknown_or_negative_amounts() {
        let missing = serde_json::json!({"cpu": 1, "memory": 1, "disk": 1});
        assert!(serde_json::from_value::<ResourceVector>(missing).is_err());

        let unknown = serde_json::json!({"cpu": 1, "memory": 1, "disk": 1, "network": 1, "gpu": 1});
        assert!(serde_json::from_value::<ResourceVector>(unknown).is_err());

        let negative = serde_json::json!({"cpu": -1, "memory": 1, "disk": 1, "network": 1});
        assert!(serde_json::from_value::<ResourceVector>(negative).is_err());
    }

    #[test]
    fn display_lists_every_kind() {
        assert_eq!(
            ResourceVector::new([1, 2, 3, 4]).to_string(),
            "{cpu: 1, memory: 2, disk: 3, network: 4}"
        );
    }
}
