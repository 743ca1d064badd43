// Player pool data model: records, labels, and CSV loading/merging.

pub mod player;
pub mod pool;

pub use player::{Player, Position};
pub use pool::{Entry, PoolError, ProjectionJoin};
