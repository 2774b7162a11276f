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

//! Locating request configuration.
//!
//! This module defines what a requester asks for: the usage scenario, the
//! priority, the delivery gates and the number of fixes. Configurations are
//! built with [`RequestConfigBuilder`].

use std::fmt;
use std::time::Duration;

use super::provider::{select_providers, ProviderKind};

/// What the requester uses locations for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(i32)]
pub enum Scenario {
    /// No scenario, the priority decides.
    Unset = 0x0300,
    /// Turn by turn navigation.
    Navigation = 0x0301,
    /// Recording a track.
    TrajectoryTracking = 0x0302,
    /// Ride hailing.
    CarHailing = 0x0303,
    /// Coarse everyday services.
    DailyLifeService = 0x0304,
    /// Only reuse fixes requested by others.
    NoPower = 0x0305,
    /// Sport tracking.
    Sport = 0x0402,
    /// Public transport.
    Transport = 0x0403,
    /// High power consumption allowed.
    HighPowerConsumption = 0x0601,
    /// Low power consumption preferred.
    LowPowerConsumption = 0x0602,
}

impl From<i32> for Scenario {
    fn from(value: i32) -> Self {
        match value {
            0x0301 | 0x0401 => Scenario::Navigation,
            0x0302 => Scenario::TrajectoryTracking,
            0x0303 => Scenario::CarHailing,
            0x0304 | 0x0404 => Scenario::DailyLifeService,
            0x0305 | 0x0603 => Scenario::NoPower,
            0x0402 => Scenario::Sport,
            0x0403 => Scenario::Transport,
            0x0601 => Scenario::HighPowerConsumption,
            0x0602 => Scenario::LowPowerConsumption,
            _ => Scenario::Unset,
        }
    }
}

/// What the requester values most when no scenario is set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(i32)]
pub enum Priority {
    /// No preference.
    Unset = 0x0200,
    /// Best accuracy.
    Accuracy = 0x0201,
    /// Lowest power.
    LowPower = 0x0202,
    /// Fastest first fix.
    FirstFix = 0x0203,
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        match value {
            0x0201 | 0x0501 => Priority::Accuracy,
            0x0202 => Priority::LowPower,
            0x0203 | 0x0502 => Priority::FirstFix,
            _ => Priority::Unset,
        }
    }
}

/// Configuration of one locating request.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestConfig {
    /// Usage scenario.
    pub scenario: Scenario,
    /// Priority, used when the scenario is unset.
    pub priority: Priority,
    /// Minimum time between two deliveries.
    pub time_interval: Duration,
    /// Minimum distance between two deliveries, in meters.
    pub distance_interval: f64,
    /// Maximum tolerable accuracy radius in meters, 0 for any.
    pub max_accuracy: f64,
    /// Number of fixes wanted, 0 for continuous.
    pub fix_number: u32,
    /// Give up after this long. Only applies to counted requests.
    pub timeout: Option<Duration>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::Unset,
            priority: Priority::FirstFix,
            time_interval: Duration::from_secs(1),
            distance_interval: 0.0,
            max_accuracy: 0.0,
            fix_number: 0,
            timeout: None,
        }
    }
}

impl RequestConfig {
    /// Whether the request stops after one fix.
    pub fn is_one_shot(&self) -> bool {
        self.fix_number == 1
    }

    /// Whether the request runs until stopped.
    pub fn is_continuous(&self) -> bool {
        self.fix_number == 0
    }

    /// Whether reports for this request go through fusion.
    ///
    /// Navigation-like scenarios are never fused so raw satellite fixes
    /// pass through untouched.
    pub fn is_fusion_eligible(&self) -> bool {
        match self.scenario {
            Scenario::DailyLifeService | Scenario::LowPowerConsumption => true,
            Scenario::Unset => matches!(self.priority, Priority::FirstFix | Priority::Unset),
            _ => false,
        }
    }

    /// Returns the providers serving this configuration, in order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        select_providers(self.scenario, self.priority)
    }
}

impl fmt::Display for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scenario:{:#06x} priority:{:#06x} interval:{}s distance:{}m acc:{}m fix:{}",
            self.scenario as i32,
            self.priority as i32,
            self.time_interval.as_secs(),
            self.distance_interval,
            self.max_accuracy,
            self.fix_number
        )?;
        if let Some(timeout) = self.timeout {
            write!(f, " timeout:{}ms", timeout.as_millis())?;
        }
        Ok(())
    }
}

/// Builder of [`RequestConfig`].
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use locator_server::request::config::{Priority, RequestConfigBuilder, Scenario};
///
/// let config = RequestConfigBuilder::new()
///     .priority(Priority::Accuracy)
///     .time_interval(Duration::from_secs(10))
///     .build();
/// assert_eq!(config.scenario, Scenario::Unset);
/// assert!(config.is_continuous());
/// ```
pub struct RequestConfigBuilder {
    inner: RequestConfig,
}

impl RequestConfigBuilder {
    /// Creates a builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            inner: RequestConfig::default(),
        }
    }

    /// Sets the scenario.
    pub fn scenario(&mut self, scenario: Scenario) -> &mut Self {
        self.inner.scenario = scenario;
        self
    }

    /// Sets the priority.
    pub fn priority(&mut self, priority: Priority) -> &mut Self {
        self.inner.priority = priority;
        self
    }

    /// Sets the minimum time between deliveries.
    pub fn time_interval(&mut self, interval: Duration) -> &mut Self {
        self.inner.time_interval = interval;
        self
    }

    /// Sets the minimum distance between deliveries, in meters.
    pub fn distance_interval(&mut self, distance: f64) -> &mut Self {
        self.inner.distance_interval = distance;
        self
    }

    /// Sets the maximum tolerable accuracy, in meters.
    pub fn max_accuracy(&mut self, accuracy: f64) -> &mut Self {
        self.inner.max_accuracy = accuracy;
        self
    }

    /// Sets the number of fixes, 0 for continuous.
    pub fn fix_number(&mut self, fix_number: u32) -> &mut Self {
        self.inner.fix_number = fix_number;
        self
    }

    /// Sets the timeout of a counted request.
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.inner.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    pub fn build(&mut self) -> RequestConfig {
        self.inner.clone()
    }
}
