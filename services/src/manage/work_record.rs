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

//! Provider activation plans.
//!
//! A [`WorkRecord`] lists who justifies a provider being active. Providers
//! always receive the full record; the core finds what changed by diffing it
//! against the previous one.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use crate::request::provider::ProviderKind;
use crate::request::request::Request;

/// One admitted request in a work record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkEntry {
    /// Uid of the requester.
    pub uid: u64,
    /// Process id of the requester.
    pub pid: u64,
    /// Bundle name of the requester.
    pub bundle_name: String,
    /// Session id, for providers that tag their reports.
    pub session_id: Option<String>,
    /// Requested minimum time interval.
    pub time_interval: Duration,
}

impl WorkEntry {
    fn key(&self) -> (u64, u64, String) {
        (self.uid, self.pid, self.bundle_name.clone())
    }
}

/// The activation plan of one provider.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkRecord {
    provider: ProviderKind,
    entries: Vec<WorkEntry>,
}

/// Requester tuples that joined or left a work record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkRecordDiff {
    /// (uid, pid, bundle name) tuples that start contributing.
    pub added: Vec<(u64, u64, String)>,
    /// (uid, pid, bundle name) tuples that stop contributing.
    pub removed: Vec<(u64, u64, String)>,
}

impl WorkRecordDiff {
    /// Whether nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

impl WorkRecord {
    /// Creates an empty record for `provider`.
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            entries: Vec::new(),
        }
    }

    /// Adds an admitted request. Entries are kept sorted so that equal
    /// plans compare equal regardless of registration order.
    pub(crate) fn add(&mut self, request: &Request) {
        let identity = request.identity();
        let session_id = if self.provider.traits().tags_work_entries {
            Some(request.session_id().to_string())
        } else {
            None
        };
        let entry = WorkEntry {
            uid: identity.uid,
            pid: identity.pid,
            bundle_name: identity.bundle_name.clone(),
            session_id,
            time_interval: request.config().time_interval,
        };
        let index = match self.entries.binary_search(&entry) {
            Ok(index) | Err(index) => index,
        };
        self.entries.insert(index, entry);
    }

    /// Returns the provider this record belongs to.
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Returns every entry.
    pub fn entries(&self) -> &[WorkEntry] {
        &self.entries
    }

    /// Whether no request justifies the provider.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether some entry belongs to `uid`.
    pub fn contains_uid(&self, uid: u64) -> bool {
        self.entries.iter().any(|entry| entry.uid == uid)
    }

    /// The shortest requested interval, which sets the provider data rate.
    pub fn min_interval(&self) -> Option<Duration> {
        self.entries.iter().map(|entry| entry.time_interval).min()
    }

    /// Compares this record against the `previous` one.
    pub fn diff(&self, previous: &WorkRecord) -> WorkRecordDiff {
        let now: BTreeSet<_> = self.entries.iter().map(WorkEntry::key).collect();
        let before: BTreeSet<_> = previous.entries.iter().map(WorkEntry::key).collect();
        WorkRecordDiff {
            added: now.difference(&before).cloned().collect(),
            removed: before.difference(&now).cloned().collect(),
        }
    }
}

impl fmt::Display for WorkRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.provider)?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}/{}/{}", entry.uid, entry.pid, entry.bundle_name)?;
        }
        write!(f, "]")
    }
}
