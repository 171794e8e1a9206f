//! Authenticated payload multiplexing (spec §4.6, C6): Simple, Frameshift
//! and Fabric schemes sharing one scheduler and one Encrypt-then-MAC
//! item model built on [`auth_stream`].

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

extern crate alloc;

mod mux;
mod ring;
mod scheme;

pub use mux::{Guid, ItemKeys, PayloadItem, PayloadMux};
pub use scheme::{LengthRange, MuxScheme};
