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

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::*;

// @tc.name: ut_utils_timestamp
// @tc.desc: Test the wall clock helper
// @tc.precon: NA
// @tc.step: 1. Read two timestamps in sequence
// @tc.expect: Both are positive and do not go backwards
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_utils_timestamp() {
    let first = get_current_timestamp();
    let second = get_current_timestamp();
    assert!(first > 0);
    assert!(second >= first);
}

// @tc.name: ut_utils_runtime_spawn
// @tc.desc: Test that spawned timers run and that aborted timers do not
// @tc.precon: NA
// @tc.step: 1. Spawn a short timer setting a flag
//           2. Spawn a long timer setting another flag and abort it
//           3. Wait for the short timer
// @tc.expect: Only the first flag is set
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_utils_runtime_spawn() {
    let fired = Arc::new(AtomicBool::new(false));
    let aborted = Arc::new(AtomicBool::new(false));

    let flag = fired.clone();
    runtime_spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        flag.store(true, Ordering::SeqCst);
    });

    let flag = aborted.clone();
    let handle = runtime_spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        flag.store(true, Ordering::SeqCst);
    });
    handle.abort();

    for _ in 0..100 {
        if fired.load(Ordering::SeqCst) {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    std::thread::sleep(Duration::from_millis(300));
    assert!(fired.load(Ordering::SeqCst));
    assert!(!aborted.load(Ordering::SeqCst));
}
