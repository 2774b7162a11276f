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

//! Location reports and spherical geometry helpers.

use std::f64::consts::PI;
use std::fmt;

/// Mean earth radius used by every distance computation, in meters.
pub const EARTH_RADIUS: f64 = 6378137.0;

/// A cached location with this latitude holds no fix.
pub const INVALID_LATITUDE: f64 = MIN_LATITUDE - 1.0;

const MIN_LATITUDE: f64 = -90.0;
const MAX_LATITUDE: f64 = 90.0;
const MIN_LONGITUDE: f64 = -180.0;
const MAX_LONGITUDE: f64 = 180.0;
const DEG_TO_RAD: f64 = PI / 180.0;
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Where a location comes from.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(i32)]
pub enum LocationSource {
    /// Unknown source.
    #[default]
    Unknown = 0,
    /// Satellite fix.
    Gnss = 1,
    /// Network-derived fix.
    Network = 2,
    /// Indoor positioning fix, network derived.
    Indoor = 3,
    /// High precision satellite fix.
    Rtk = 4,
}

impl From<i32> for LocationSource {
    fn from(value: i32) -> Self {
        match value {
            1 => LocationSource::Gnss,
            2 => LocationSource::Network,
            3 => LocationSource::Indoor,
            4 => LocationSource::Rtk,
            _ => LocationSource::Unknown,
        }
    }
}

/// One location report.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters.
    pub altitude: f64,
    /// Horizontal accuracy radius in meters.
    pub accuracy: f64,
    /// Speed in meters per second.
    pub speed: f64,
    /// Heading in degrees.
    pub direction: f64,
    /// Wall clock time of the fix, in milliseconds since UNIX EPOCH.
    pub time_stamp: i64,
    /// Monotonic time of the fix, in nanoseconds since boot.
    pub time_since_boot: i64,
    /// Floor number for indoor fixes.
    pub floor_no: i32,
    /// Floor accuracy for indoor fixes.
    pub floor_accuracy: f64,
    /// Provider specific auxiliary information.
    pub additions: Vec<String>,
    /// Source of the fix.
    pub source: LocationSource,
    /// Whether the fix was injected by a mock provider.
    pub is_from_mock: bool,
    /// Origin tag, the session id of the request a network fix answers.
    pub uuid: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            latitude: INVALID_LATITUDE,
            longitude: 0.0,
            altitude: 0.0,
            accuracy: 0.0,
            speed: 0.0,
            direction: 0.0,
            time_stamp: 0,
            time_since_boot: 0,
            floor_no: 0,
            floor_accuracy: 0.0,
            additions: Vec::new(),
            source: LocationSource::Unknown,
            is_from_mock: false,
            uuid: String::new(),
        }
    }
}

impl Location {
    /// Creates a location at the given coordinates.
    pub fn new(latitude: f64, longitude: f64, source: LocationSource) -> Self {
        Self {
            latitude,
            longitude,
            source,
            ..Default::default()
        }
    }

    /// Whether this location holds a usable fix.
    pub fn is_valid(&self) -> bool {
        self.latitude != INVALID_LATITUDE
            && (MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude)
            && (MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude)
    }

    /// Whether this fix comes from a satellite receiver.
    pub fn is_satellite(&self) -> bool {
        matches!(self.source, LocationSource::Gnss | LocationSource::Rtk)
    }

    /// Whether this fix is network derived.
    pub fn is_network(&self) -> bool {
        matches!(self.source, LocationSource::Network | LocationSource::Indoor)
    }

    /// Whether this fix comes from indoor positioning.
    pub fn is_indoor(&self) -> bool {
        self.source == LocationSource::Indoor
    }

    /// Great-circle distance to `other` in meters, by the haversine formula.
    pub fn distance_to(&self, other: &Location) -> f64 {
        distance_between(
            (self.latitude, self.longitude),
            (other.latitude, other.longitude),
        )
    }

    /// Removes fields not needed to place the fix on a map.
    pub fn strip_auxiliary(&mut self) {
        self.additions.clear();
        self.floor_no = 0;
        self.floor_accuracy = 0.0;
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Location[source:{:?} acc:{:.1} time:{} boot:{} mock:{}]",
            self.source, self.accuracy, self.time_stamp, self.time_since_boot, self.is_from_mock
        )
    }
}

/// Great-circle distance between two (latitude, longitude) pairs in meters.
pub fn distance_between(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1 * DEG_TO_RAD;
    let lat2_rad = lat2 * DEG_TO_RAD;
    let delta_lat = (lat2 - lat1) * DEG_TO_RAD;
    let delta_lon = (lon2 - lon1) * DEG_TO_RAD;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS * c
}

/// Moves `start` by `distance` meters along `bearing` radians.
///
/// The result is clamped to valid latitude and wrapped to valid longitude.
pub fn project_position(start: (f64, f64), bearing: f64, distance: f64) -> (f64, f64) {
    let (lat1, lon1) = start;
    let lat1_rad = lat1 * DEG_TO_RAD;
    let lon1_rad = lon1 * DEG_TO_RAD;
    let angular_distance = distance / EARTH_RADIUS;

    let sin_lat1 = lat1_rad.sin();
    let cos_lat1 = lat1_rad.cos();
    let sin_d = angular_distance.sin();
    let cos_d = angular_distance.cos();

    let lat2_rad = (sin_lat1 * cos_d + cos_lat1 * sin_d * bearing.cos()).asin();
    let lon2_rad =
        lon1_rad + (bearing.sin() * sin_d * cos_lat1).atan2(cos_d - sin_lat1 * lat2_rad.sin());

    let lat2 = (lat2_rad * RAD_TO_DEG).clamp(MIN_LATITUDE, MAX_LATITUDE);
    let mut lon2 = lon2_rad * RAD_TO_DEG;
    if lon2 > MAX_LONGITUDE {
        lon2 -= 360.0;
    } else if lon2 < MIN_LONGITUDE {
        lon2 += 360.0;
    }
    (lat2, lon2)
}
