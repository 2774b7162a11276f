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

//! Fire-and-forget telemetry events.
//!
//! Events are built with [`SysEvent`] and handed to a [`TelemetrySink`]. They
//! are never consulted for control decisions.

use std::fmt;

const DOMAIN: &str = "LOCATION";

/// Bundle name of the requester.
pub const PARAM_BUNDLE_NAME: &str = "BUNDLE_NAME";
/// Uid of the requester.
pub const PARAM_UID: &str = "UID";
/// Session id of the request.
pub const PARAM_SESSION_ID: &str = "SESSION_ID";
/// Why the event happened.
pub const PARAM_REASON: &str = "REASON";
/// Provider name.
pub const PARAM_PROVIDER: &str = "PROVIDER";
/// Permission kind.
pub const PARAM_PERMISSION: &str = "PERMISSION";
/// Token id of the requester.
pub const PARAM_TOKEN_ID: &str = "TOKEN_ID";
/// Free-form details.
pub const PARAM_EXTRA_INFO: &str = "EXTRA_INFO";

/// Kind of a telemetry event.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventKind {
    /// A new request was registered.
    RequestAdded,
    /// A request was removed.
    RequestRemoved,
    /// A report was not delivered to a request.
    DeliverySuppressed,
    /// A request failed an admission check.
    AdmissionFailure,
    /// A requester started contributing to a provider work record.
    ContributionStarted,
    /// A requester stopped contributing to a provider work record.
    ContributionStopped,
    /// A token started charging a permission.
    PermissionUsingStarted,
    /// A token stopped charging a permission.
    PermissionUsingStopped,
    /// A systemic fault was detected.
    LocatingFault,
}

impl EventKind {
    /// Returns the event name.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::RequestAdded => "REQUEST_ADDED",
            EventKind::RequestRemoved => "REQUEST_REMOVED",
            EventKind::DeliverySuppressed => "DELIVERY_SUPPRESSED",
            EventKind::AdmissionFailure => "ADMISSION_FAILURE",
            EventKind::ContributionStarted => "CONTRIBUTION_STARTED",
            EventKind::ContributionStopped => "CONTRIBUTION_STOPPED",
            EventKind::PermissionUsingStarted => "PERMISSION_USING_STARTED",
            EventKind::PermissionUsingStopped => "PERMISSION_USING_STOPPED",
            EventKind::LocatingFault => "LOCATING_FAULT",
        }
    }
}

/// Value of an event parameter.
#[derive(Clone, PartialEq, Debug)]
pub enum EventValue {
    /// String value.
    Str(String),
    /// Numeric value.
    Number(i64),
}

/// A named event parameter.
#[derive(Clone, PartialEq, Debug)]
pub struct EventParam {
    name: &'static str,
    value: EventValue,
}

impl EventParam {
    /// Creates a string parameter.
    pub fn string(name: &'static str, value: &str) -> Self {
        Self {
            name,
            value: EventValue::Str(value.to_string()),
        }
    }

    /// Creates a numeric parameter.
    pub fn number(name: &'static str, value: i64) -> Self {
        Self {
            name,
            value: EventValue::Number(value),
        }
    }
}

/// A telemetry event under construction.
#[derive(Clone, PartialEq, Debug)]
pub struct SysEvent {
    kind: EventKind,
    params: Vec<EventParam>,
}

impl SysEvent {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    pub(crate) fn request_added() -> Self {
        Self::new(EventKind::RequestAdded)
    }

    pub(crate) fn request_removed() -> Self {
        Self::new(EventKind::RequestRemoved)
    }

    pub(crate) fn delivery_suppressed() -> Self {
        Self::new(EventKind::DeliverySuppressed)
    }

    pub(crate) fn admission_failure() -> Self {
        Self::new(EventKind::AdmissionFailure)
    }

    pub(crate) fn contribution_started() -> Self {
        Self::new(EventKind::ContributionStarted)
    }

    pub(crate) fn contribution_stopped() -> Self {
        Self::new(EventKind::ContributionStopped)
    }

    pub(crate) fn permission_using_started() -> Self {
        Self::new(EventKind::PermissionUsingStarted)
    }

    pub(crate) fn permission_using_stopped() -> Self {
        Self::new(EventKind::PermissionUsingStopped)
    }

    pub(crate) fn locating_fault() -> Self {
        Self::new(EventKind::LocatingFault)
    }

    pub(crate) fn param(mut self, param: EventParam) -> Self {
        self.params.push(param);
        self
    }

    pub(crate) fn write(self, sink: &dyn TelemetrySink) {
        sink.write(self);
    }

    /// Returns the kind of the event.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the value of the parameter named `name`, if present.
    pub fn get(&self, name: &str) -> Option<&EventValue> {
        self.params
            .iter()
            .find(|param| param.name == name)
            .map(|param| &param.value)
    }
}

impl fmt::Display for SysEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", DOMAIN, self.kind.as_str())?;
        for param in self.params.iter() {
            match &param.value {
                EventValue::Str(s) => write!(f, " {}={}", param.name, s)?,
                EventValue::Number(n) => write!(f, " {}={}", param.name, n)?,
            }
        }
        Ok(())
    }
}

/// Destination of telemetry events.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink: Send + Sync {
    /// Records one event. Must not block.
    fn write(&self, event: SysEvent);
}

/// A sink that writes every event to the log.
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn write(&self, event: SysEvent) {
        info!("sys event {}", event);
    }
}
