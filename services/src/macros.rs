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

macro_rules! build_str_param {
    ($name:expr, $value:expr) => {
        $crate::sys_event::EventParam::string($name, $value)
    };
}

macro_rules! build_number_param {
    ($name:expr, $value:expr) => {
        $crate::sys_event::EventParam::number($name, $value as i64)
    };
}

// Builds a telemetry event describing one request and writes it to `$sink`.
macro_rules! request_event {
    ($sink:expr, $ctor:ident, $request:expr) => {
        $crate::sys_event::SysEvent::$ctor()
            .param(build_str_param!(
                $crate::sys_event::PARAM_BUNDLE_NAME,
                $request.identity().bundle_name()
            ))
            .param(build_number_param!(
                $crate::sys_event::PARAM_UID,
                $request.identity().uid()
            ))
            .param(build_str_param!(
                $crate::sys_event::PARAM_SESSION_ID,
                $request.session_id().as_str()
            ))
            .write($sink)
    };
    ($sink:expr, $ctor:ident, $request:expr, $reason:expr) => {
        $crate::sys_event::SysEvent::$ctor()
            .param(build_str_param!(
                $crate::sys_event::PARAM_BUNDLE_NAME,
                $request.identity().bundle_name()
            ))
            .param(build_number_param!(
                $crate::sys_event::PARAM_UID,
                $request.identity().uid()
            ))
            .param(build_str_param!(
                $crate::sys_event::PARAM_SESSION_ID,
                $request.session_id().as_str()
            ))
            .param(build_str_param!($crate::sys_event::PARAM_REASON, $reason))
            .write($sink)
    };
}
