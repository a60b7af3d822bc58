// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Typed results and their per-target entries.
//!
//! A result always has exactly as many targets as its request, in the same
//! order; invocations write their per-target data back at the original
//! indices. Targets that were never touched (masked out, or part of a
//! request that failed early) keep the `UncertainInitialValue` status.
//! Targets of a successfully submitted asynchronous request carry
//! `GoodCompletesAsynchronously` until the real completion is delivered
//! through the client interface.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use arcus_core::status::StatusCode;
use arcus_core::types::{DataValue, MonitoredItemId, RequestHandle, UaValue};

use crate::transport::CallResponse;

// =============================================================================
// ServiceResult
// =============================================================================

/// Common surface of all result types.
pub trait ServiceResult: Default + Send {
    /// Sizes the result for `target_count` targets and records the
    /// originating request handle.
    fn prepare(&mut self, request_handle: RequestHandle, target_count: usize);

    /// Marks one target as submitted asynchronously. Only meaningful for
    /// services whose data path completes through the client interface.
    fn mark_submitted(&mut self, _index: usize) {}
}

// =============================================================================
// Read
// =============================================================================

/// Per-target entry of a read result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadResultTarget {
    /// Status of this read.
    pub status: StatusCode,

    /// The value read, absent when the status is bad.
    pub value: Option<UaValue>,

    /// Timestamp applied by the data source.
    pub source_timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// Timestamp applied by the server.
    pub server_timestamp: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for ReadResultTarget {
    fn default() -> Self {
        Self {
            status: StatusCode::UNCERTAIN_INITIAL_VALUE,
            value: None,
            source_timestamp: None,
            server_timestamp: None,
        }
    }
}

impl From<DataValue> for ReadResultTarget {
    fn from(value: DataValue) -> Self {
        Self {
            status: value.status,
            value: value.value,
            source_timestamp: value.source_timestamp,
            server_timestamp: value.server_timestamp,
        }
    }
}

/// Result of a read request, synchronous or asynchronous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReadResult {
    /// Handle of the originating request.
    pub request_handle: RequestHandle,

    /// Overall status of the request.
    pub overall_status: StatusCode,

    /// Per-target results, at the request's target indices.
    pub targets: Vec<ReadResultTarget>,
}

impl ServiceResult for ReadResult {
    fn prepare(&mut self, request_handle: RequestHandle, target_count: usize) {
        self.request_handle = request_handle;
        self.overall_status = StatusCode::GOOD;
        self.targets = vec![ReadResultTarget::default(); target_count];
    }

    fn mark_submitted(&mut self, index: usize) {
        if let Some(target) = self.targets.get_mut(index) {
            target.status = StatusCode::GOOD_COMPLETES_ASYNCHRONOUSLY;
        }
    }
}

// =============================================================================
// Write
// =============================================================================

/// Per-target entry of a write result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WriteResultTarget {
    /// Status of this write.
    pub status: StatusCode,
}

impl Default for WriteResultTarget {
    fn default() -> Self {
        Self {
            status: StatusCode::UNCERTAIN_INITIAL_VALUE,
        }
    }
}

/// Result of a write request, synchronous or asynchronous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WriteResult {
    /// Handle of the originating request.
    pub request_handle: RequestHandle,

    /// Overall status of the request.
    pub overall_status: StatusCode,

    /// Per-target results, at the request's target indices.
    pub targets: Vec<WriteResultTarget>,
}

impl ServiceResult for WriteResult {
    fn prepare(&mut self, request_handle: RequestHandle, target_count: usize) {
        self.request_handle = request_handle;
        self.overall_status = StatusCode::GOOD;
        self.targets = vec![WriteResultTarget::default(); target_count];
    }

    fn mark_submitted(&mut self, index: usize) {
        if let Some(target) = self.targets.get_mut(index) {
            target.status = StatusCode::GOOD_COMPLETES_ASYNCHRONOUSLY;
        }
    }
}

// =============================================================================
// Method call
// =============================================================================

/// Per-target entry of a method-call result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCallResultTarget {
    /// Status of this call.
    pub status: StatusCode,

    /// Output arguments produced by the method.
    pub output_arguments: Vec<UaValue>,

    /// Per-input-argument results.
    pub input_argument_results: Vec<StatusCode>,
}

impl Default for MethodCallResultTarget {
    fn default() -> Self {
        Self {
            status: StatusCode::UNCERTAIN_INITIAL_VALUE,
            output_arguments: Vec::new(),
            input_argument_results: Vec::new(),
        }
    }
}

impl From<CallResponse> for MethodCallResultTarget {
    fn from(response: CallResponse) -> Self {
        Self {
            status: response.status,
            output_arguments: response.output_arguments,
            input_argument_results: response.input_argument_results,
        }
    }
}

/// Result of a method-call request, synchronous or asynchronous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MethodCallResult {
    /// Handle of the originating request.
    pub request_handle: RequestHandle,

    /// Overall status of the request.
    pub overall_status: StatusCode,

    /// Per-target results, at the request's target indices.
    pub targets: Vec<MethodCallResultTarget>,
}

impl ServiceResult for MethodCallResult {
    fn prepare(&mut self, request_handle: RequestHandle, target_count: usize) {
        self.request_handle = request_handle;
        self.overall_status = StatusCode::GOOD;
        self.targets = vec![MethodCallResultTarget::default(); target_count];
    }

    fn mark_submitted(&mut self, index: usize) {
        if let Some(target) = self.targets.get_mut(index) {
            target.status = StatusCode::GOOD_COMPLETES_ASYNCHRONOUSLY;
        }
    }
}

// =============================================================================
// Create monitored data
// =============================================================================

/// Per-target entry of a create-monitored-data result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMonitoredDataResultTarget {
    /// Status of the creation.
    pub status: StatusCode,

    /// Client-side id of the created item, when creation succeeded.
    pub monitored_item_id: Option<MonitoredItemId>,

    /// Revised sampling interval.
    pub revised_sampling_interval: Duration,

    /// Revised queue size.
    pub revised_queue_size: u32,
}

impl Default for CreateMonitoredDataResultTarget {
    fn default() -> Self {
        Self {
            status: StatusCode::UNCERTAIN_INITIAL_VALUE,
            monitored_item_id: None,
            revised_sampling_interval: Duration::ZERO,
            revised_queue_size: 0,
        }
    }
}

/// Result of a create-monitored-data request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CreateMonitoredDataResult {
    /// Handle of the originating request.
    pub request_handle: RequestHandle,

    /// Overall status of the request.
    pub overall_status: StatusCode,

    /// Per-target results, at the request's target indices.
    pub targets: Vec<CreateMonitoredDataResultTarget>,
}

impl ServiceResult for CreateMonitoredDataResult {
    fn prepare(&mut self, request_handle: RequestHandle, target_count: usize) {
        self.request_handle = request_handle;
        self.overall_status = StatusCode::GOOD;
        self.targets = vec![CreateMonitoredDataResultTarget::default(); target_count];
    }
}

// =============================================================================
// Tests
// =============================================================================
