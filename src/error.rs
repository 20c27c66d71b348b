//! Error taxonomy shared by every planning component.

/// Errors raised by address arithmetic and the allocators.
///
/// Validation failures abort construction before any computation runs;
/// capacity failures abort an allocation entirely with no partial result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// Bad dotted quad, bad CIDR syntax, non-power-of-two ratio,
    /// out-of-range prefix or VLAN count.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A block does not fit its parent, a split would pass its limit,
    /// or a subnet index is out of range.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Growth or utilization parameters outside their declared bounds.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PlanError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    pub fn capacity(msg: impl Into<String>) -> Self {
        Self::CapacityExceeded(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
