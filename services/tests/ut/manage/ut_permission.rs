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
use crate::request::config::RequestConfig;
use crate::service::callback::CallbackHandle;
use crate::sys_event::EventKind;
use crate::test_util::{app_identity, RecordingCallback, RecordingSink};

fn request(n: u64) -> Request {
    Request::new(
        RequestConfig::default(),
        CallbackHandle::new(RecordingCallback::new()),
        app_identity(n),
    )
}

const PRECISE: UsageFlags = UsageFlags {
    location: true,
    background: false,
    approximate: false,
};

// @tc.name: ut_permission_usage_refcount
// @tc.desc: Test per token usage counting
// @tc.precon: NA
// @tc.step: 1. Two requests of one token start charging precise location
//           2. Both stop again
// @tc.expect: Start and stop telemetry fire once, on the 0 to 1 transitions
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_permission_usage_refcount() {
    let sink = Arc::new(RecordingSink::default());
    let usage = PermissionUsage::new(sink.clone());
    let first = request(1);
    let second = request(1);
    let token_id = first.identity().token_id;

    usage.apply(&first, PRECISE);
    usage.apply(&second, PRECISE);
    usage.apply(&second, PRECISE);
    assert_eq!(usage.using_count(token_id, PermissionKind::Location), 2);
    assert!(!usage.is_using(token_id, PermissionKind::Background));
    assert_eq!(sink.count(EventKind::PermissionUsingStarted), 1);

    usage.apply(&first, UsageFlags::default());
    assert!(usage.is_using(token_id, PermissionKind::Location));
    usage.apply(&second, UsageFlags::default());
    assert!(!usage.is_using(token_id, PermissionKind::Location));
    assert_eq!(sink.count(EventKind::PermissionUsingStopped), 1);
}

// @tc.name: ut_permission_usage_switch_kind
// @tc.desc: Test switching a request from precise to approximate background usage
// @tc.precon: NA
// @tc.step: 1. Charge precise usage, then approximate plus background usage
// @tc.expect: Precise usage stops, the other two start
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_permission_usage_switch_kind() {
    let sink = Arc::new(RecordingSink::default());
    let usage = PermissionUsage::new(sink.clone());
    let request = request(2);
    let token_id = request.identity().token_id;
    usage.apply(&request, PRECISE);
    let coarse = UsageFlags {
        location: false,
        background: true,
        approximate: true,
    };
    usage.apply(&request, coarse);
    assert_eq!(request.usage(), coarse);
    assert!(!usage.is_using(token_id, PermissionKind::Location));
    assert!(usage.is_using(token_id, PermissionKind::Background));
    assert!(usage.is_using(token_id, PermissionKind::Approximate));
    assert_eq!(sink.count(EventKind::PermissionUsingStarted), 3);
    assert_eq!(sink.count(EventKind::PermissionUsingStopped), 1);
}

// @tc.name: ut_permission_usage_record
// @tc.desc: Test delivery usage records
// @tc.precon: NA
// @tc.step: 1. Add two successful and one failed record for a token
// @tc.expect: The record counts both, other tokens stay empty
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_permission_usage_record() {
    let usage = PermissionUsage::new(Arc::new(RecordingSink::default()));
    usage.add_record(7, true);
    usage.add_record(7, true);
    usage.add_record(7, false);
    assert_eq!(usage.record(7), UsageRecord { success: 2, fail: 1 });
    assert_eq!(usage.record(8), UsageRecord::default());
    assert_eq!(
        PermissionKind::Background.as_str(),
        "ohos.permission.LOCATION_IN_BACKGROUND"
    );
}
