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

// @tc.name: ut_account_switch
// @tc.desc: Test foreground account switching
// @tc.precon: NA
// @tc.step: 1. Create a tracker for the default user
//           2. Switch to user 101, then switch to user 101 again
// @tc.expect: The first switch changes the foreground user, the second is a no-op
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_account_switch() {
    let tracker = AccountTracker::new(DEFAULT_USER_ID);
    assert_eq!(tracker.foreground_user(), DEFAULT_USER_ID);
    assert!(tracker.apply(AccountEvent::Switched(101)));
    assert_eq!(tracker.foreground_user(), 101);
    assert!(!tracker.apply(AccountEvent::Switched(101)));
}

// @tc.name: ut_account_remove
// @tc.desc: Test account removal
// @tc.precon: NA
// @tc.step: 1. Remove user 102 twice
//           2. Switch to user 102
// @tc.expect: The second removal is a no-op and switching revives the user
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_account_remove() {
    let tracker = AccountTracker::new(DEFAULT_USER_ID);
    assert!(tracker.apply(AccountEvent::Removed(102)));
    assert!(!tracker.apply(AccountEvent::Removed(102)));
    assert!(tracker.is_removed(102));
    assert!(tracker.apply(AccountEvent::Switched(102)));
    assert!(!tracker.is_removed(102));
}
