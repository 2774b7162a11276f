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

//! Tunables of the locator core.
//!
//! [`LocatorConfig::default`] gives the production values; tests and
//! embedders override single values through [`LocatorConfigBuilder`].

use std::time::Duration;

/// Tunables shared by every manager of the locator core.
#[derive(Clone, Debug, PartialEq)]
pub struct LocatorConfig {
    /// A satellite fix keeps dominating network fixes for this long.
    pub fusion_window: Duration,
    /// Tolerance subtracted from a request's minimum time interval.
    pub scheduling_jitter: Duration,
    /// Reports older than this against the wall clock are a systemic fault.
    pub stale_report_threshold: Duration,
    /// Stale faults are escalated at most once per this window.
    pub stale_reset_window: Duration,
    /// Satellite cache freshness for cache queries.
    pub satellite_cache_window: Duration,
    /// Network cache freshness for cache queries.
    pub network_cache_window: Duration,
    /// Cache freshness when a long cache is approved.
    pub long_cache_window: Duration,
    /// Lower bound of the approximate location offset, in meters.
    pub fuzz_min_offset: f64,
    /// Upper bound of the approximate location offset, in meters.
    pub fuzz_max_offset: f64,
    /// Accuracy reported for approximate locations, in meters.
    pub coarse_accuracy: f64,
    /// Delay before the background proxy starts its shared request.
    pub proxy_debounce: Duration,
    /// Time interval of the background proxy's shared request.
    pub proxy_time_interval: Duration,
    /// Maximum shadowed requests per (uid, bundle name).
    pub proxy_cap_per_app: usize,
    /// A self request gives up after this long.
    pub self_request_timeout: Duration,
    /// Period of the plan re-application timer, `None` disables it.
    pub reapply_interval: Option<Duration>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            fusion_window: Duration::from_secs(10),
            scheduling_jitter: Duration::from_millis(200),
            stale_report_threshold: Duration::from_secs(30 * 60),
            stale_reset_window: Duration::from_secs(60 * 60),
            satellite_cache_window: Duration::from_secs(10),
            network_cache_window: Duration::from_secs(60),
            long_cache_window: Duration::from_secs(30 * 60),
            fuzz_min_offset: 1000.0,
            fuzz_max_offset: 2000.0,
            coarse_accuracy: 5000.0,
            proxy_debounce: Duration::from_secs(2),
            proxy_time_interval: Duration::from_secs(300),
            proxy_cap_per_app: 1,
            self_request_timeout: Duration::from_secs(60),
            reapply_interval: Some(Duration::from_secs(60)),
        }
    }
}

/// Builder of [`LocatorConfig`].
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use locator_server::config::LocatorConfigBuilder;
///
/// let config = LocatorConfigBuilder::new()
///     .proxy_debounce(Duration::from_millis(10))
///     .reapply_interval(None)
///     .build();
/// assert_eq!(config.proxy_debounce, Duration::from_millis(10));
/// ```
pub struct LocatorConfigBuilder {
    inner: LocatorConfig,
}

impl LocatorConfigBuilder {
    /// Creates a builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            inner: LocatorConfig::default(),
        }
    }

    /// Sets the satellite dominance window.
    pub fn fusion_window(&mut self, window: Duration) -> &mut Self {
        self.inner.fusion_window = window;
        self
    }

    /// Sets the minimum time interval tolerance.
    pub fn scheduling_jitter(&mut self, jitter: Duration) -> &mut Self {
        self.inner.scheduling_jitter = jitter;
        self
    }

    /// Sets the stale report threshold and its escalation window.
    pub fn stale_report(&mut self, threshold: Duration, reset_window: Duration) -> &mut Self {
        self.inner.stale_report_threshold = threshold;
        self.inner.stale_reset_window = reset_window;
        self
    }

    /// Sets the satellite and network cache freshness windows.
    pub fn cache_windows(&mut self, satellite: Duration, network: Duration) -> &mut Self {
        self.inner.satellite_cache_window = satellite;
        self.inner.network_cache_window = network;
        self
    }

    /// Sets the approved long cache window.
    pub fn long_cache_window(&mut self, window: Duration) -> &mut Self {
        self.inner.long_cache_window = window;
        self
    }

    /// Sets the approximate location offset band, in meters.
    pub fn fuzz_band(&mut self, min: f64, max: f64) -> &mut Self {
        self.inner.fuzz_min_offset = min;
        self.inner.fuzz_max_offset = max;
        self
    }

    /// Sets the accuracy reported for approximate locations.
    pub fn coarse_accuracy(&mut self, accuracy: f64) -> &mut Self {
        self.inner.coarse_accuracy = accuracy;
        self
    }

    /// Sets the background proxy start delay.
    pub fn proxy_debounce(&mut self, debounce: Duration) -> &mut Self {
        self.inner.proxy_debounce = debounce;
        self
    }

    /// Sets the background proxy request interval.
    pub fn proxy_time_interval(&mut self, interval: Duration) -> &mut Self {
        self.inner.proxy_time_interval = interval;
        self
    }

    /// Sets the per-app shadow cap of the background proxy.
    pub fn proxy_cap_per_app(&mut self, cap: usize) -> &mut Self {
        self.inner.proxy_cap_per_app = cap;
        self
    }

    /// Sets the self request timeout.
    pub fn self_request_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.inner.self_request_timeout = timeout;
        self
    }

    /// Sets the plan re-application period.
    pub fn reapply_interval(&mut self, interval: Option<Duration>) -> &mut Self {
        self.inner.reapply_interval = interval;
        self
    }

    /// Builds the configuration.
    pub fn build(&mut self) -> LocatorConfig {
        self.inner.clone()
    }
}
