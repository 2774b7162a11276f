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
use crate::request::config::{RequestConfig, RequestConfigBuilder};
use crate::service::callback::CallbackHandle;
use crate::test_util::{app_identity, RecordingCallback};

fn request(n: u64, interval_secs: u64) -> Request {
    let config: RequestConfig = RequestConfigBuilder::new()
        .time_interval(Duration::from_secs(interval_secs))
        .build();
    Request::new(config, CallbackHandle::new(RecordingCallback::new()), app_identity(n))
}

// @tc.name: ut_work_record_add
// @tc.desc: Test building a work record
// @tc.precon: NA
// @tc.step: 1. Add two requests to a network record in reverse order
// @tc.expect: Entries are sorted, tagged with session ids, min interval is the shortest
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_work_record_add() {
    let first = request(1, 5);
    let second = request(2, 2);
    let mut record = WorkRecord::new(ProviderKind::Network);
    assert!(record.is_empty());
    record.add(&second);
    record.add(&first);
    assert_eq!(record.len(), 2);
    assert_eq!(record.entries()[0].uid, first.identity().uid);
    assert_eq!(
        record.entries()[0].session_id.as_deref(),
        Some(first.session_id().as_str())
    );
    assert!(record.contains_uid(second.identity().uid));
    assert_eq!(record.min_interval(), Some(Duration::from_secs(2)));

    let mut satellite = WorkRecord::new(ProviderKind::Satellite);
    satellite.add(&first);
    assert_eq!(satellite.entries()[0].session_id, None);
}

// @tc.name: ut_work_record_diff
// @tc.desc: Test diffing two work records
// @tc.precon: NA
// @tc.step: 1. Build records {1, 2} and {2, 3}
// @tc.expect: 3 is added and 1 is removed, an equal record diffs empty
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_work_record_diff() {
    let (one, two, three) = (request(1, 1), request(2, 1), request(3, 1));
    let mut previous = WorkRecord::new(ProviderKind::Satellite);
    previous.add(&one);
    previous.add(&two);
    let mut current = WorkRecord::new(ProviderKind::Satellite);
    current.add(&two);
    current.add(&three);

    let diff = current.diff(&previous);
    let id = |r: &Request| {
        let identity = r.identity();
        (identity.uid, identity.pid, identity.bundle_name.clone())
    };
    assert_eq!(diff.added, vec![id(&three)]);
    assert_eq!(diff.removed, vec![id(&one)]);
    assert!(current.diff(&current.clone()).is_empty());
    assert_eq!(
        current.to_string(),
        format!(
            "gps[{}/{}/{}, {}/{}/{}]",
            two.identity().uid,
            two.identity().pid,
            two.identity().bundle_name,
            three.identity().uid,
            three.identity().pid,
            three.identity().bundle_name
        )
    );
}
