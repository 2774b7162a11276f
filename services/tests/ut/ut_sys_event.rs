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

use super::*;

// @tc.name: ut_sys_event_write
// @tc.desc: Test that a built event reaches the sink with its parameters
// @tc.precon: NA
// @tc.step: 1. Create a mock sink expecting one write
//           2. Build a request-added event with two parameters and write it
// @tc.expect: The sink receives the event with the expected kind and values
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_sys_event_write() {
    let mut sink = MockTelemetrySink::new();
    sink.expect_write()
        .withf(|event| {
            event.kind() == EventKind::RequestAdded
                && event.get(PARAM_BUNDLE_NAME) == Some(&EventValue::Str("com.example".into()))
                && event.get(PARAM_UID) == Some(&EventValue::Number(20010001))
        })
        .times(1)
        .return_const(());

    SysEvent::request_added()
        .param(build_str_param!(PARAM_BUNDLE_NAME, "com.example"))
        .param(build_number_param!(PARAM_UID, 20010001u64))
        .write(&sink);
}

// @tc.name: ut_sys_event_display
// @tc.desc: Test the log rendering of an event
// @tc.precon: NA
// @tc.step: 1. Build a locating fault event with a string and a number
//           2. Format it
// @tc.expect: Domain, kind and parameters appear in order
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_sys_event_display() {
    let event = SysEvent::locating_fault()
        .param(build_str_param!(PARAM_EXTRA_INFO, "stale"))
        .param(build_number_param!(PARAM_UID, 1));
    assert_eq!(
        event.to_string(),
        "LOCATION/LOCATING_FAULT EXTRA_INFO=stale UID=1"
    );
    assert!(event.get(PARAM_REASON).is_none());
}
