// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session ownership and dispatch.
//!
//! The [`factory::SessionFactory`] is the entry point: it owns the
//! [`table::SessionTable`] (live sessions and activity counts) and the
//! [`transactions::TransactionRegistry`] (asynchronous correlation), and
//! implements the transport's callback surface.

pub mod factory;
pub mod session;
pub mod table;
pub mod transactions;

pub use factory::SessionFactory;
pub use session::{Session, SessionInformation, SessionState};
pub use table::{SessionLease, SessionTable};
pub use transactions::TransactionRegistry;
