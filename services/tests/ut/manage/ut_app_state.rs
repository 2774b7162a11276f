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
use crate::request::provider::ProviderKind;
use crate::request::reason::LocationErr;
use crate::test_util::{app_identity, TestEnv};

// @tc.name: ut_app_state_background
// @tc.desc: Test work record recomputation on app state transitions
// @tc.precon: NA
// @tc.step: 1. Start a continuous request
//           2. Move its app to background, then back to foreground
// @tc.expect: The request leaves the work records in background and
//             rejoins in foreground
// @tc.type: FUNC
// @tc.require: issues#ICN16H
// @tc.level: Level 1
#[test]
fn ut_app_state_background() {
    let env = TestEnv::new();
    let identity = app_identity(1);
    let (callback, _, request) = env.start(RequestConfig::default(), identity.clone());
    let manager = env.service.request_manager();
    assert!(!manager.work_record(ProviderKind::Satellite).is_empty());

    env.oracle.set_foreground(identity.uid, false);
    env.service
        .on_app_state_changed(identity.uid, identity.pid, false);
    assert!(manager.work_record(ProviderKind::Satellite).is_empty());
    assert!(!request.is_in_plan());
    assert_eq!(callback.errors(), vec![LocationErr::BackgroundPermissionDenied]);

    env.oracle.set_foreground(identity.uid, true);
    env.service
        .on_app_state_changed(identity.uid, identity.pid, true);
    assert!(!manager.work_record(ProviderKind::Satellite).is_empty());
    assert!(request.is_in_plan());
}

// @tc.name: ut_app_state_unknown_process
// @tc.desc: Test a transition of a process without requests
// @tc.precon: NA
// @tc.step: 1. Start a request, report a transition of another process
// @tc.expect: The request is unaffected
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_app_state_unknown_process() {
    let env = TestEnv::new();
    let (_, _, request) = env.start(RequestConfig::default(), app_identity(1));
    let other = app_identity(2);
    env.service.on_app_state_changed(other.uid, other.pid, false);
    assert!(request.is_in_plan());
}
