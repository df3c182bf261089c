//! # inventory-core: Pure Domain Types for the Inventory Data Layer
//!
//! This crate holds the one entity the inventory tracks, with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Inventory Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Consumers (UI state holders, tools)                  │   │
//! │  │    Entry form ──► Item list ──► Item details ──► Edit form      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ ItemsRepository                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 inventory-db (Store, Repository)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ inventory-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   Item { id, name, price, quantity }                            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, ItemId)
//!
//! ## Example Usage
//!
//! ```rust
//! use inventory_core::{Item, UNASSIGNED_ID};
//!
//! // A new item leaves the id unassigned; the store picks one on insert.
//! let item = Item::new("Apples", 10.0, 20);
//! assert_eq!(item.id, UNASSIGNED_ID);
//! assert!(!item.has_id());
//! ```

pub mod types;

pub use types::*;
