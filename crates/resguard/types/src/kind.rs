use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One category of allocatable unit.
///
/// The set is closed: adding a kind means adding a variant here and a slot in
/// [`crate::ResourceVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Cpu,
    Memory,
    Disk,
    Network,
}

impl ResourceKind {
    /// Number of configured kinds.
    pub const COUNT: usize = 4;

    /// Every kind, in vector slot order.
    pub const ALL: [ResourceKind; Self::COUNT] = [
        ResourceKind::Cpu,
        ResourceKind::Memory,
        ResourceKind::Disk,
        ResourceKind::Network,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Cpu => 0,
            Self::Memory => 1,
            Self::Disk => 2,
            Self::Network => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "memory" | "mem" => Ok(Self::Memory),
            "disk" => Ok(Self::Disk),
            "network" | "net" => Ok(Self::Network),
            other => Err(TypesError::UnknownResourceKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_follow_slot_order() {
        for (position, kind) in ResourceKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), position);
        }
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("MEM".parse::<ResourceKind>().unwrap(), ResourceKind::Memory);
        assert_eq!("net".parse::<ResourceKind>().unwrap(), ResourceKind::Network);
        assert!(matches!(
            "gpu".parse::<ResourceKind>(),
            Err(TypesError::UnknownResourceKind(kind)) if kind == "gpu"
        ));
    }
}
