// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Concurrency primitives the hydrators are built from.

mod poll;
mod state;

pub use poll::{CancelFlag, PollRateSetter, PollingTask, SelfUpdatingPollingTask};
pub use state::EventuallyConsistentSharedState;
