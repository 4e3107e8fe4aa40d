//! Placement policies

// Modules
pub mod aging;
pub mod counter_swap;

// Exports
pub use self::{aging::Aging, counter_swap::CounterSwap};
