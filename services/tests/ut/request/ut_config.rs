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

// @tc.name: ut_scenario_priority_from
// @tc.desc: Test conversion of raw scenario and priority codes
// @tc.precon: NA
// @tc.step: 1. Convert known and unknown codes
// @tc.expect: Known codes map to their variant, unknown codes map to Unset
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_scenario_priority_from() {
    assert_eq!(Scenario::from(0x0301), Scenario::Navigation);
    assert_eq!(Scenario::from(0x0401), Scenario::Navigation);
    assert_eq!(Scenario::from(0x0305), Scenario::NoPower);
    assert_eq!(Scenario::from(0x0603), Scenario::NoPower);
    assert_eq!(Scenario::from(0x7777), Scenario::Unset);
    assert_eq!(Scenario::DailyLifeService as i32, 0x0304);
    assert_eq!(Priority::from(0x0202), Priority::LowPower);
    assert_eq!(Priority::from(0x0502), Priority::FirstFix);
    assert_eq!(Priority::from(-1), Priority::Unset);
}

// @tc.name: ut_config_fusion_eligible
// @tc.desc: Test which configurations are fused
// @tc.precon: NA
// @tc.step: 1. Build configurations for several scenario and priority pairs
// @tc.expect: Daily life, low power and unset first fix are fused,
//             navigation and unset accuracy are not
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_config_fusion_eligible() {
    let fused = |scenario, priority| {
        RequestConfigBuilder::new()
            .scenario(scenario)
            .priority(priority)
            .build()
            .is_fusion_eligible()
    };
    assert!(fused(Scenario::DailyLifeService, Priority::Accuracy));
    assert!(fused(Scenario::LowPowerConsumption, Priority::Unset));
    assert!(fused(Scenario::Unset, Priority::FirstFix));
    assert!(fused(Scenario::Unset, Priority::Unset));
    assert!(!fused(Scenario::Unset, Priority::Accuracy));
    assert!(!fused(Scenario::Navigation, Priority::FirstFix));
}

// @tc.name: ut_config_builder
// @tc.desc: Test the request configuration builder
// @tc.precon: NA
// @tc.step: 1. Build a one-shot configuration with a timeout
//           2. Compare it with an identical one
// @tc.expect: Every field is set and identical configurations compare equal
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_config_builder() {
    let build = || {
        RequestConfigBuilder::new()
            .scenario(Scenario::Navigation)
            .time_interval(Duration::from_secs(5))
            .distance_interval(10.0)
            .max_accuracy(50.0)
            .fix_number(1)
            .timeout(Duration::from_secs(30))
            .build()
    };
    let config = build();
    assert!(config.is_one_shot());
    assert!(!config.is_continuous());
    assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    assert_eq!(config, build());
    assert_eq!(
        config.providers(),
        vec![ProviderKind::Satellite, ProviderKind::Network]
    );
    assert_eq!(
        config.to_string(),
        "scenario:0x0301 priority:0x0203 interval:5s distance:10m acc:50m fix:1 timeout:30000ms"
    );
}
