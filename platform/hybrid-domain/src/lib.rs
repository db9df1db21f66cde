//! Decision core: signal fusion, universe screening, weight optimisation and
//! lot sizing. Everything in this crate is synchronous and free of I/O; data
//! arrives through the ports in [`repositories`].

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use errors::{CoreError, ErrorKind};
