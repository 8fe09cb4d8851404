//! Postgres database clients.
//!
//! A [`NonTx`] client checks out a pooled connection for every statement,
//! while a [`Tx`] client pins a single connection with an open transaction
//! until it's committed (or dropped, rolling the transaction back).

pub mod non_tx;
pub mod tx;

pub use self::{non_tx::NonTx, tx::Tx};
