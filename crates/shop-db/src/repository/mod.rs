//! # Repository Module
//!
//! Database repository implementations for the shop stores.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  CheckoutService / CartManager                                         │
//! │       │                                                                 │
//! │       │  db.products().reserve_stock(&id, qty)                          │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── reserve_stock(&self, id, qty)                                     │
//! │  └── release_stock(&self, id, qty)                                     │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • The store contracts of the pipeline map 1:1 to repositories        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Inventory store and stock guard
//! - [`customer::CustomerRepository`] - Customers and their cart lines
//! - [`order::OrderRepository`] - Append-only order ledger

pub mod customer;
pub mod order;
pub mod product;
