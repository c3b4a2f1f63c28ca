// Copyright 2026 The Multiblame Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The single error type returned at the crate boundary.

use std::sync::Arc;

use crate::store::ObjectId;

/// Errors surfaced by a running blame computation.
///
/// Non-fatal degradations (similarity-table overflow, rename-limit
/// exceeded) are *not* represented here; they are accumulated in
/// [`crate::result::BlameSummary`] instead, since a run that hits them still
/// completes and returns a result.
#[derive(Debug, thiserror::Error)]
pub enum BlameError {
    /// The cooperative cancellation token was observed at a check-point.
    #[error("blame computation was cancelled")]
    Cancelled,

    /// No start commit was given and the object store has no resolvable
    /// head.
    #[error("repository has no head commit and no start commit was given")]
    NoHead,

    /// A tree entry referenced an object id the store could not open.
    #[error("object {0} referenced by a tree could not be opened")]
    MissingObject(ObjectId),

    /// The object store (or diff backend) raised an error while servicing a
    /// request from the core. Boxed and type-erased so this crate does not
    /// need to be generic over a concrete backend error type.
    #[error(transparent)]
    Backend(#[from] Arc<dyn std::error::Error + Send + Sync>),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BlameError>;
