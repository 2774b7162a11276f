// Copyright (C) 2024 Huawei Device Co., Ltd.
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Locating session identifiers.
//!
//! Every locating request gets a locally generated session id. Network
//! providers tag their reports with it so that a report can be routed back to
//! the request which asked for it.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::fastrand::fast_random;

static SEQUENCE: AtomicU64 = AtomicU64::new(1);

/// A unique identifier for one locating session.
///
/// # Examples
///
/// ```rust
/// use locator_utils::session_id::SessionId;
///
/// let first = SessionId::generate();
/// let second = SessionId::generate();
/// assert_ne!(first, second);
/// assert_eq!(first.brief().len(), first.to_string().len() / 4);
/// ```
#[derive(Hash, PartialEq, Eq, Clone, Debug)]
pub struct SessionId {
    id: String,
}

impl SessionId {
    /// Generates a fresh session id.
    ///
    /// The id combines random bits with a process-wide sequence number, so
    /// two ids generated by the same process never collide.
    pub fn generate() -> Self {
        let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
        Self {
            id: format!("{:016x}{:016x}", fast_random(), seq),
        }
    }

    /// Wraps an existing session id, e.g. the origin tag of a report.
    pub fn new(id: String) -> Self {
        Self { id }
    }

    /// Returns the session id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Returns the first quarter of the id, for logging.
    pub fn brief(&self) -> &str {
        let len = self.id.len();
        &self.id[..len / 4]
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}
