// Copyright (C) 2023 Huawei Device Co., Ltd.
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

//! Service level error codes returned by the locator entry points.

use core::fmt;

/// Error codes returned by [`LocatorService`](crate::LocatorService) calls.
///
/// Per request locating failures are not reported through this type; they
/// are delivered to the request callback as
/// [`LocationErr`](crate::request::reason::LocationErr).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(i32)]
pub enum ErrorCode {
    /// Success.
    ErrOk = 0,
    /// The caller lacks the required permission.
    Permission = 201,
    /// The call parameters are invalid.
    ParameterCheck = 401,
    /// The locator service is not ready.
    ServiceUnavailable = 3301000,
    /// The location switch is off.
    SwitchOff = 3301100,
    /// Locating failed.
    LocatingFailed = 3301200,
    /// No usable cached location exists.
    LocatingCacheFailed = 3301206,
}

impl std::error::Error for ErrorCode {}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as i32)
    }
}
