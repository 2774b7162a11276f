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

//! OS account tracking for user isolation.
//!
//! Locations are cached per OS user and the background proxy keeps one
//! shadow list per user; both follow the foreground account recorded here.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// The user that owns the foreground before any switch is observed.
pub const DEFAULT_USER_ID: u64 = 100;

/// OS account events relevant to locating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccountEvent {
    /// The foreground account switched to the given user.
    Switched(u64),
    /// The given user was removed from the system.
    Removed(u64),
}

/// Tracks the foreground OS account.
pub struct AccountTracker {
    foreground: AtomicU64,
    removed: Mutex<HashSet<u64>>,
}

impl AccountTracker {
    /// Creates a tracker with `user_id` in the foreground.
    pub fn new(user_id: u64) -> Self {
        Self {
            foreground: AtomicU64::new(user_id),
            removed: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the foreground user.
    pub fn foreground_user(&self) -> u64 {
        self.foreground.load(Ordering::SeqCst)
    }

    /// Whether `user_id` was removed from the system.
    pub fn is_removed(&self, user_id: u64) -> bool {
        self.removed.lock().unwrap().contains(&user_id)
    }

    /// Applies an account event. Returns `false` if it changed nothing.
    pub(crate) fn apply(&self, event: AccountEvent) -> bool {
        match event {
            AccountEvent::Switched(user_id) => {
                let old = self.foreground.swap(user_id, Ordering::SeqCst);
                if old == user_id {
                    return false;
                }
                self.removed.lock().unwrap().remove(&user_id);
                info!("foreground account switched {} -> {}", old, user_id);
                true
            }
            AccountEvent::Removed(user_id) => {
                if !self.removed.lock().unwrap().insert(user_id) {
                    return false;
                }
                info!("account {} removed", user_id);
                true
            }
        }
    }
}
