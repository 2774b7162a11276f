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

//! Locating error and status codes delivered to request callbacks.
//!
//! Every [`LocationErr`] is per request and recoverable: the request is left
//! out of the current plan pass and may be admitted again on the next one.

/// Why a request cannot be served right now.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(i32)]
pub enum LocationErr {
    /// Unclassified failure.
    Default = -1,
    /// The requester holds neither precise nor approximate location grant.
    LocationPermissionDenied = -2,
    /// The requester is backgrounded without background privilege.
    BackgroundPermissionDenied = -3,
    /// The location switch is off.
    SwitchOff = -4,
    /// The network provider could not reach its server.
    InternetAccessFailure = -5,
    /// The requester process is frozen.
    Frozen = -6,
    /// The requester does not belong to the active OS user.
    NotCurrentUser = -7,
    /// A counted request ran out of time.
    Timeout = -8,
    /// The device is idle.
    DeviceIdle = -9,
    /// The fix does not meet the requested accuracy.
    AccuracyNotMet = -10,
}

impl From<i32> for LocationErr {
    fn from(value: i32) -> Self {
        match value {
            -2 => LocationErr::LocationPermissionDenied,
            -3 => LocationErr::BackgroundPermissionDenied,
            -4 => LocationErr::SwitchOff,
            -5 => LocationErr::InternetAccessFailure,
            -6 => LocationErr::Frozen,
            -7 => LocationErr::NotCurrentUser,
            -8 => LocationErr::Timeout,
            -9 => LocationErr::DeviceIdle,
            -10 => LocationErr::AccuracyNotMet,
            _ => LocationErr::Default,
        }
    }
}

impl LocationErr {
    /// Returns a short description of the error.
    pub fn to_str(&self) -> &'static str {
        match self {
            LocationErr::Default => "locating failed",
            LocationErr::LocationPermissionDenied => "location permission denied",
            LocationErr::BackgroundPermissionDenied => "background permission denied",
            LocationErr::SwitchOff => "location switch off",
            LocationErr::InternetAccessFailure => "internet access failure",
            LocationErr::Frozen => "requester frozen",
            LocationErr::NotCurrentUser => "not current user",
            LocationErr::Timeout => "locating timeout",
            LocationErr::DeviceIdle => "device idle",
            LocationErr::AccuracyNotMet => "accuracy not met",
        }
    }
}

/// Locating session status reported to callbacks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i32)]
pub enum LocatingStatus {
    /// The request left its providers' work records.
    Stopped = 0,
    /// The request entered its providers' work records.
    Started = 1,
}
