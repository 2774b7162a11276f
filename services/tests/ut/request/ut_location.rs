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

// @tc.name: ut_location_default_invalid
// @tc.desc: Test that a default location holds the invalid latitude sentinel
// @tc.precon: NA
// @tc.step: 1. Create a default location
//           2. Create a location at valid coordinates
// @tc.expect: Only the second one is valid
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_location_default_invalid() {
    let location = Location::default();
    assert_eq!(location.latitude, INVALID_LATITUDE);
    assert!(!location.is_valid());
    assert!(Location::new(31.2, 121.5, LocationSource::Gnss).is_valid());
    assert!(!Location::new(91.0, 0.0, LocationSource::Gnss).is_valid());
}

// @tc.name: ut_location_distance
// @tc.desc: Test the haversine distance
// @tc.precon: NA
// @tc.step: 1. Measure one degree of latitude along a meridian
//           2. Measure a point against itself
// @tc.expect: One degree is about 111.3 km, the same point is 0 m
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_location_distance() {
    let a = Location::new(0.0, 0.0, LocationSource::Gnss);
    let b = Location::new(1.0, 0.0, LocationSource::Gnss);
    let d = a.distance_to(&b);
    assert!((d - 111_319.5).abs() < 1.0, "distance {}", d);
    assert_eq!(a.distance_to(&a), 0.0);
}

// @tc.name: ut_location_project_roundtrip_distance
// @tc.desc: Test that projection moves a point by the requested distance
// @tc.precon: NA
// @tc.step: 1. Project a mid latitude point 1500 m along several bearings
//           2. Measure the distance back to the start
// @tc.expect: The measured distance matches within a millimeter-level tolerance
// @tc.type: FUNC
// @tc.require: issues#ICN16H
// @tc.level: Level 1
#[test]
fn ut_location_project_roundtrip_distance() {
    let start = (39.9, 116.4);
    for step in 0..8 {
        let bearing = step as f64 * std::f64::consts::PI / 4.0;
        let end = project_position(start, bearing, 1500.0);
        let d = distance_between(start, end);
        assert!((d - 1500.0).abs() < 0.01, "bearing {} distance {}", bearing, d);
    }
}

// @tc.name: ut_location_project_clamp
// @tc.desc: Test that projection keeps coordinates in range
// @tc.precon: NA
// @tc.step: 1. Project a point near the north pole northwards
//           2. Project a point on the antimeridian eastwards
// @tc.expect: Latitude stays within [-90, 90] and longitude within [-180, 180]
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_location_project_clamp() {
    let (lat, _) = project_position((89.999, 0.0), 0.0, 5000.0);
    assert!((-90.0..=90.0).contains(&lat));
    let (_, lon) = project_position((0.0, 179.999), std::f64::consts::FRAC_PI_2, 5000.0);
    assert!((-180.0..=180.0).contains(&lon));
    assert!(lon < 0.0);
}

// @tc.name: ut_location_strip_auxiliary
// @tc.desc: Test that auxiliary fields are removed
// @tc.precon: NA
// @tc.step: 1. Create an indoor location with floor and additions
//           2. Strip auxiliary fields
// @tc.expect: Floor and additions are cleared, coordinates are kept
// @tc.type: FUNC
// @tc.require: issues#ICN16H
#[test]
fn ut_location_strip_auxiliary() {
    let mut location = Location::new(30.0, 120.0, LocationSource::Indoor);
    location.floor_no = 3;
    location.floor_accuracy = 0.5;
    location.additions.push("wifi:ap-list".to_string());
    assert!(location.is_indoor());
    assert!(location.is_network());
    location.strip_auxiliary();
    assert_eq!(location.floor_no, 0);
    assert!(location.additions.is_empty());
    assert_eq!(location.latitude, 30.0);
}
