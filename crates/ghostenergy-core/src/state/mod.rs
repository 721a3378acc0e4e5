//! Observable state primitives shared by the application stores.

mod cell;

pub use cell::StateCell;
