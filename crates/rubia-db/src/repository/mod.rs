//! # Repository Layer
//!
//! One repository per aggregate:
//!
//! - [`client`] / [`supplier`] - reference entities (create, list, delete)
//! - [`product`] - inventory CRUD, stock adjustments, QR code lookup
//! - [`sale`] - checkout, the installment ledger and renegotiation
//! - [`payable`] - supplier invoices and their fixed schedules
//! - [`settings`] - the notification settings singleton
//! - [`report`] - read-only dashboard and reminder queries

pub mod client;
pub mod payable;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod supplier;
