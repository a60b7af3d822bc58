// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Shared test infrastructure: mocks and the integration harness.

pub mod harness;
pub mod mocks;

pub use harness::{address, call_target, read_target, write_target, TestClient};
pub use mocks::{
    ClientEvent, MockTransportFactory, MockTransportState, RecordingClientInterface,
};
