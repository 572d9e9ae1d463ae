//! # gridclear-core: Market Clearing Data Model
//!
//! Provides the validated input structures for clearing an electricity market
//! over a DC-linearized transmission network.
//!
//! ## Design Philosophy
//!
//! The network is modeled as a **complete graph in matrix form**:
//! - **Nodes**: dense indices `0..node_count`
//! - **Edges**: every ordered pair `(i, j)`, `i != j`, carries a capacity and a
//!   susceptance. A capacity of zero marks a disabled pair; it is never treated
//!   as "missing" or "unconstrained".
//!
//! Market participants (generators and demands) are held in a registry that
//! precomputes a node → participant index once, so constraint generation never
//! rescans the participant lists.
//!
//! ## Quick Start
//!
//! ```rust
//! use gridclear_core::*;
//!
//! let topology = NetworkTopology::uniform(3, 100.0, 500.0).unwrap();
//! let registry = ParticipantRegistry::new(
//!     &topology,
//!     vec![Generator::new(GeneratorId::new(0), NodeId::new(0), 100.0, 12.0)],
//!     vec![Demand::new(DemandId::new(0), NodeId::new(1), 100.0, 40.0)],
//! )
//! .unwrap();
//!
//! assert_eq!(registry.generators_at(NodeId::new(0)).len(), 1);
//! assert!(registry.demands_at(NodeId::new(2)).is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`topology`] - Capacity/susceptance matrices and island detection
//! - [`participants`] - Generators, demands and the node index
//! - [`case`] - Serializable case input (JSON / TOML)
//! - [`units`] - Unit-safe newtypes for MW, radians and prices
//! - [`error`] - Validation error taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod case;
pub mod error;
pub mod participants;
pub mod topology;
pub mod units;

pub use case::MarketCase;
pub use error::{CaseError, CaseResult};
pub use participants::{Demand, Generator, ParticipantRegistry};
pub use topology::{Island, NetworkTopology, PairAttributes};
pub use units::{Megawatts, PricePerMwh, Radians};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratorId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DemandId(usize);

impl NodeId {
    #[inline]
    pub const fn new(value: usize) -> Self {
        NodeId(value)
    }
    #[inline]
    pub const fn value(&self) -> usize {
        self.0
    }
}

impl GeneratorId {
    #[inline]
    pub const fn new(value: usize) -> Self {
        GeneratorId(value)
    }
    #[inline]
    pub const fn value(&self) -> usize {
        self.0
    }
}

impl DemandId {
    #[inline]
    pub const fn new(value: usize) -> Self {
        DemandId(value)
    }
    #[inline]
    pub const fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node#{}", self.0)
    }
}

impl fmt::Display for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen#{}", self.0)
    }
}

impl fmt::Display for DemandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Demand#{}", self.0)
    }
}
