// Lineup construction pipeline: ILP selection, slot assignment, pool-level
// diversity sampling, and late-swap re-optimization.

pub mod assigner;
pub mod sampler;
pub mod selector;
pub mod slots;
pub mod swap;

#[cfg(test)]
pub(crate) mod testutil;

pub use assigner::{assign_slots, AssignError, SlottedLineup};
pub use sampler::{generate, GeneratedPool, SampleError, SamplerSettings, Strategy};
pub use selector::{select, Exclusion, SelectError, SelectOutcome, SelectedLineup};
pub use slots::{Slot, SlotWeights, SLOT_ORDER};
pub use swap::{late_swap, SwapError};
