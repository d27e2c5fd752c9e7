//! Optic Desk Core - Domain types and state machines.
//!
//! This crate holds everything about a point-of-sale session at an optical
//! store that can be decided without talking to the backend:
//! - building a sale and computing its totals ([`order`])
//! - finding or creating the customer the sale belongs to ([`resolver`])
//! - editing eye prescriptions ([`prescription`])
//!
//! # Architecture
//!
//! The core crate contains only types and state machines - no I/O, no HTTP
//! clients, no clocks. The `admin` crate drives these against the backend API.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, phone numbers, and labels
//! - [`catalog`] - Products and services offered by the store
//! - [`customer`] - Customer records and the create/update form
//! - [`line_item`] - Products and services inside an order
//! - [`order`] - The order composer and totals arithmetic
//! - [`resolver`] - Search-or-create customer workflow
//! - [`prescription`] - Prescription records and their editor
//! - [`error`] - Local validation failures

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod customer;
pub mod error;
pub mod line_item;
pub mod order;
pub mod prescription;
pub mod resolver;
pub mod types;

pub use catalog::{CatalogProduct, CatalogService, NewProduct, NewService, filter_products};
pub use customer::{Customer, CustomerForm};
pub use error::{ValidationError, ValidationResult};
pub use line_item::{
    LineItem, LineItemKind, LineItemPatch, LineItemSeed, ProductLine, ServiceLine, StepDirection,
    StepField,
};
pub use order::{EmptyCartPolicy, OrderComposer, SaleDraft, Totals};
pub use prescription::{
    EditorMode, PrescriptionEditor, PrescriptionField, PrescriptionRecord, SubmitAction,
};
pub use resolver::{CustomerResolver, ResolverState, SearchTicket};
pub use types::*;
