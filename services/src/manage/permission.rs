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

//! Permission usage bookkeeping.
//!
//! While a request contributes to a provider it charges usage of the location
//! permissions it relies on. This module counts, per token and permission
//! kind, how many requests are currently charging, and keeps per token
//! records of successful and failed deliveries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::request::request::Request;
use crate::sys_event::{TelemetrySink, PARAM_PERMISSION, PARAM_TOKEN_ID};

/// Permission string for precise location.
static LOCATION_PERMISSION: &str = "ohos.permission.LOCATION";
/// Permission string for background location.
static BACKGROUND_PERMISSION: &str = "ohos.permission.LOCATION_IN_BACKGROUND";
/// Permission string for approximate location.
static APPROXIMATE_PERMISSION: &str = "ohos.permission.APPROXIMATELY_LOCATION";

/// A location permission whose usage is charged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    /// Precise location.
    Location,
    /// Location while in background.
    Background,
    /// Approximate location.
    Approximate,
}

impl PermissionKind {
    /// Returns the permission name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionKind::Location => LOCATION_PERMISSION,
            PermissionKind::Background => BACKGROUND_PERMISSION,
            PermissionKind::Approximate => APPROXIMATE_PERMISSION,
        }
    }
}

/// The permissions one request is currently charging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageFlags {
    /// Charging precise location.
    pub location: bool,
    /// Charging background location.
    pub background: bool,
    /// Charging approximate location.
    pub approximate: bool,
}

impl UsageFlags {
    fn get(&self, kind: PermissionKind) -> bool {
        match kind {
            PermissionKind::Location => self.location,
            PermissionKind::Background => self.background,
            PermissionKind::Approximate => self.approximate,
        }
    }
}

/// Successful and failed deliveries charged to one token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageRecord {
    /// Deliveries that reached the requester.
    pub success: u64,
    /// Deliveries that did not.
    pub fail: u64,
}

const KINDS: [PermissionKind; 3] = [
    PermissionKind::Location,
    PermissionKind::Background,
    PermissionKind::Approximate,
];

/// Counts permission usage per token.
pub struct PermissionUsage {
    using: Mutex<HashMap<(u64, PermissionKind), usize>>,
    records: Mutex<HashMap<u64, UsageRecord>>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl PermissionUsage {
    pub(crate) fn new(telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            using: Mutex::new(HashMap::new()),
            records: Mutex::new(HashMap::new()),
            telemetry,
        }
    }

    /// Makes `request` charge exactly the permissions in `desired`,
    /// starting and stopping usage for the kinds that changed.
    pub(crate) fn apply(&self, request: &Request, desired: UsageFlags) {
        let previous = request.swap_usage(desired);
        if previous == desired {
            return;
        }
        let token_id = request.identity().token_id;
        let mut started = Vec::new();
        let mut stopped = Vec::new();
        {
            let mut using = self.using.lock().unwrap();
            for kind in KINDS {
                match (previous.get(kind), desired.get(kind)) {
                    (false, true) => {
                        let count = using.entry((token_id, kind)).or_insert(0);
                        *count += 1;
                        if *count == 1 {
                            started.push(kind);
                        }
                    }
                    (true, false) => {
                        let Some(count) = using.get_mut(&(token_id, kind)) else {
                            error!("stop using {} for token {} never started", kind.as_str(), token_id);
                            continue;
                        };
                        *count -= 1;
                        if *count == 0 {
                            using.remove(&(token_id, kind));
                            stopped.push(kind);
                        }
                    }
                    _ => {}
                }
            }
        }
        for kind in started {
            debug!("token {} start using {}", token_id, kind.as_str());
            crate::sys_event::SysEvent::permission_using_started()
                .param(build_number_param!(PARAM_TOKEN_ID, token_id))
                .param(build_str_param!(PARAM_PERMISSION, kind.as_str()))
                .write(self.telemetry.as_ref());
        }
        for kind in stopped {
            debug!("token {} stop using {}", token_id, kind.as_str());
            crate::sys_event::SysEvent::permission_using_stopped()
                .param(build_number_param!(PARAM_TOKEN_ID, token_id))
                .param(build_str_param!(PARAM_PERMISSION, kind.as_str()))
                .write(self.telemetry.as_ref());
        }
    }

    /// Number of requests of `token_id` charging `kind`.
    pub fn using_count(&self, token_id: u64, kind: PermissionKind) -> usize {
        self.using
            .lock()
            .unwrap()
            .get(&(token_id, kind))
            .copied()
            .unwrap_or(0)
    }

    /// Whether some request of `token_id` charges `kind`.
    pub fn is_using(&self, token_id: u64, kind: PermissionKind) -> bool {
        self.using_count(token_id, kind) > 0
    }

    pub(crate) fn add_record(&self, token_id: u64, success: bool) {
        let mut records = self.records.lock().unwrap();
        let record = records.entry(token_id).or_default();
        if success {
            record.success += 1;
        } else {
            record.fail += 1;
        }
    }

    /// Returns the delivery records of `token_id`.
    pub fn record(&self, token_id: u64) -> UsageRecord {
        self.records
            .lock()
            .unwrap()
            .get(&token_id)
            .copied()
            .unwrap_or_default()
    }
}
