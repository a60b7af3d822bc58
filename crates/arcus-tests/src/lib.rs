// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration test support for the ARCUS workspace.
//!
//! The [`common`] module provides the mock transports, the recording
//! client interface and the [`common::TestClient`] harness the
//! `tests/integration_*.rs` suites are built on.

#![warn(missing_docs)]

pub mod common;
