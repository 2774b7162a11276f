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

//! The report pipeline.
//!
//! [`ReportManager`] receives provider reports, refreshes the provider
//! caches and decides for every subscribed request whether, what and when to
//! deliver. Cache queries are served from the same caches through the same
//! permission gates.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

use rand::Rng;

use super::account::AccountTracker;
use super::fusion::FusionController;
use super::permission::PermissionUsage;
use super::request_manager::RequestManager;
use crate::config::LocatorConfig;
use crate::request::location::{project_position, Location};
use crate::request::provider::ProviderKind;
use crate::request::reason::LocationErr;
use crate::request::request::{FixClaim, Request};
use crate::service::interface::{
    FatalHandler, LocationGrant, LocatorHooks, PermissionOracle, ProviderProxy,
};
use crate::sys_event::{SysEvent, TelemetrySink, PARAM_EXTRA_INFO, PARAM_PROVIDER};
use crate::utils::get_current_timestamp;

/// Returns the bearing and distance factors of the approximate offset.
///
/// Both are drawn once per process, so every approximate location of one
/// process lifetime is shifted the same way.
fn fuzz_factors() -> (f64, f64) {
    static FACTORS: OnceLock<(f64, f64)> = OnceLock::new();
    *FACTORS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        (rng.gen::<f64>(), rng.gen::<f64>())
    })
}

/// Location report pipeline and cache.
pub struct ReportManager {
    config: LocatorConfig,
    request_manager: Arc<RequestManager>,
    fusion: FusionController,
    account: Arc<AccountTracker>,
    oracle: Arc<dyn PermissionOracle>,
    hooks: Arc<dyn LocatorHooks>,
    telemetry: Arc<dyn TelemetrySink>,
    fatal: Arc<dyn FatalHandler>,
    usage: Arc<PermissionUsage>,
    fallback: Option<Arc<dyn ProviderProxy>>,
    satellite_cache: Mutex<Option<Location>>,
    network_cache: Mutex<Option<Location>>,
    last_locations: Mutex<HashMap<u64, Location>>,
    last_fault: Mutex<Option<Instant>>,
}

impl ReportManager {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: LocatorConfig,
        request_manager: Arc<RequestManager>,
        account: Arc<AccountTracker>,
        oracle: Arc<dyn PermissionOracle>,
        hooks: Arc<dyn LocatorHooks>,
        telemetry: Arc<dyn TelemetrySink>,
        fatal: Arc<dyn FatalHandler>,
        usage: Arc<PermissionUsage>,
        fallback: Option<Arc<dyn ProviderProxy>>,
    ) -> Self {
        let fusion = FusionController::new(config.fusion_window, hooks.clone());
        Self {
            config,
            request_manager,
            fusion,
            account,
            oracle,
            hooks,
            telemetry,
            fatal,
            usage,
            fallback,
            satellite_cache: Mutex::new(None),
            network_cache: Mutex::new(None),
            last_locations: Mutex::new(HashMap::new()),
            last_fault: Mutex::new(None),
        }
    }

    /// Handles one location report of `provider`.
    ///
    /// Refreshes the provider cache, then evaluates the subscribed requests.
    /// Counted requests whose last fix was delivered are removed afterwards.
    pub fn on_report_location(&self, location: &Location, provider: ProviderKind) {
        debug!("{} report {}", provider, location);
        self.update_cache(location, provider);

        let requests = self.matching_requests(provider, &location.uuid, location.is_from_mock);
        if requests.is_empty() {
            debug!("no {} request for report", provider);
            return;
        }
        let mut finished = Vec::new();
        for request in requests {
            if self.process_request(location, &request) {
                finished.push(request);
            }
        }
        if !finished.is_empty() {
            info!("{} counted requests fulfilled", finished.len());
            self.request_manager.remove_requests(&finished);
        }
    }

    /// Forwards a provider error to the requests it concerns.
    ///
    /// `origin` is the session the provider tagged the error with, if any.
    pub fn on_report_error(&self, provider: ProviderKind, err: LocationErr, origin: Option<&str>) {
        let requests = match origin {
            Some(origin) => self.matching_requests(provider, origin, false),
            None => self.request_manager.requests_for(provider),
        };
        for request in requests {
            if !request.is_requesting() {
                continue;
            }
            if request.record_error(err) {
                info!(
                    "{} error {} for request {}",
                    provider,
                    err.to_str(),
                    request.session_id().brief()
                );
                request.callback().on_error_report(err);
            }
        }
    }

    fn update_cache(&self, location: &Location, provider: ProviderKind) {
        let traits = provider.traits();
        if traits.validates_cache {
            if self.hooks.is_satellite_cache_valid(location) {
                *self.satellite_cache.lock().unwrap() = Some(location.clone());
            } else {
                debug!("satellite report rejected for cache");
            }
        } else if traits.updates_last_location {
            *self.network_cache.lock().unwrap() = Some(location.clone());
            if !location.is_indoor() {
                let user_id = self.account.foreground_user();
                self.last_locations
                    .lock()
                    .unwrap()
                    .insert(user_id, location.clone());
            }
        }
    }

    fn matching_requests(&self, provider: ProviderKind, origin: &str, mock: bool) -> Vec<Arc<Request>> {
        let requests = self.request_manager.requests_for(provider);
        if !provider.traits().routes_by_session || mock {
            return requests;
        }
        match requests.into_iter().find(|r| r.session_id().as_str() == origin) {
            Some(request) => vec![request],
            None => {
                debug!("no {} request for session {}", provider, origin);
                Vec::new()
            }
        }
    }

    /// Runs the delivery pipeline for one request. Returns `true` if the
    /// request delivered its last fix.
    ///
    /// Only requests the latest planning pass admitted are served. A failed
    /// delivery does not count against the fix number.
    fn process_request(&self, location: &Location, request: &Arc<Request>) -> bool {
        if !request.is_requesting() || !request.is_in_plan() {
            return false;
        }
        if request.is_timed_out(Instant::now()) {
            debug!("request {} timed out", request.session_id().brief());
            return false;
        }
        let mut candidate = location.clone();
        if request.config().is_fusion_eligible() {
            let best = request.best_location().or_else(|| self.satellite_cache());
            let fused = self.fusion.get_fuse_location(location, best.as_ref());
            request.set_best_location(fused.clone());
            if request.last_location().as_ref() == Some(&fused) {
                debug!("fused location unchanged for {}", request.session_id().brief());
                return false;
            }
            candidate = fused;
        }

        if !self.request_manager.is_switch_allowed(request.identity()) {
            self.suppress(request, "switch off");
            return false;
        }
        let Some(permitted) = self.get_permitted_location(&candidate, request) else {
            self.suppress(request, "not permitted");
            return false;
        };
        if !self.result_check(&permitted, request) {
            return false;
        }
        if self.is_stale(&permitted) {
            return false;
        }
        if !request.is_internal() && !self.hooks.allow_report(&permitted, request.identity()) {
            self.suppress(request, "vetoed");
            return false;
        }
        let claim = request.claim_fix();
        if claim == FixClaim::Exhausted {
            return false;
        }
        if !self.deliver(&permitted, request) {
            request.release_fix();
            return false;
        }
        claim == FixClaim::Last
    }

    fn deliver(&self, location: &Location, request: &Request) -> bool {
        let token_id = request.identity().token_id;
        if request.callback().on_location_report(location) {
            request.set_last_location(location.clone());
            self.usage.add_record(token_id, true);
            true
        } else {
            warn!(
                "deliver to request {} failed",
                request.session_id().brief()
            );
            self.usage.add_record(token_id, false);
            if request.record_error(LocationErr::LocationPermissionDenied) {
                request
                    .callback()
                    .on_error_report(LocationErr::LocationPermissionDenied);
            }
            false
        }
    }

    /// Delivers a location of the shared background feed to a shadowed
    /// request. The request must still hold the background grant.
    pub(crate) fn report_to_shadow(&self, location: &Location, request: &Request) -> bool {
        if !request.is_requesting() {
            return false;
        }
        if !self.request_manager.is_switch_allowed(request.identity()) {
            return false;
        }
        if !self.oracle.has_background_grant(request.identity()) {
            debug!("shadow {} lost background grant", request.session_id().brief());
            return false;
        }
        let Some(permitted) = self.redact(location, request) else {
            return false;
        };
        if !self.result_check(&permitted, request) {
            return false;
        }
        self.deliver(&permitted, request)
    }

    fn suppress(&self, request: &Request, reason: &str) {
        debug!(
            "suppress delivery to {}: {}",
            request.session_id().brief(),
            reason
        );
        request_event!(self.telemetry.as_ref(), delivery_suppressed, request, reason);
    }

    /// Whether `location` may be delivered to `request` given what it
    /// received last.
    pub fn result_check(&self, location: &Location, request: &Request) -> bool {
        let identity = request.identity();
        let config = request.config();
        if !request.is_internal() {
            if self.oracle.is_frozen(identity.pid) {
                debug!("request {} frozen", request.session_id().brief());
                return false;
            }
            if self.oracle.location_grant(identity) == LocationGrant::Approximate
                && config.max_accuracy > 0.0
                && config.max_accuracy < location.accuracy
            {
                debug!("request {} accuracy not met", request.session_id().brief());
                return false;
            }
        }
        let Some(last) = request.last_location() else {
            return true;
        };
        let gap_ms = (location.time_since_boot - last.time_since_boot) / 1_000_000;
        let min_ms =
            config.time_interval.as_millis() as i64 - self.config.scheduling_jitter.as_millis() as i64;
        if gap_ms < min_ms {
            debug!(
                "request {} interval not met, {}ms < {}ms",
                request.session_id().brief(),
                gap_ms,
                min_ms
            );
            return false;
        }
        if config.distance_interval > 0.0 && location.distance_to(&last) < config.distance_interval {
            debug!("request {} distance not met", request.session_id().brief());
            return false;
        }
        true
    }

    /// Returns the copy of `location` that `request` may receive, or `None`
    /// if it may receive nothing.
    pub fn get_permitted_location(&self, location: &Location, request: &Request) -> Option<Location> {
        if request.is_internal() {
            return Some(location.clone());
        }
        let identity = request.identity();
        if !self.oracle.is_foreground(identity)
            && !self.oracle.has_continuous_task(identity)
            && !request.config().is_one_shot()
        {
            if request.record_error(LocationErr::BackgroundPermissionDenied) {
                request
                    .callback()
                    .on_error_report(LocationErr::BackgroundPermissionDenied);
            }
            return None;
        }
        self.redact(location, request)
    }

    fn redact(&self, location: &Location, request: &Request) -> Option<Location> {
        let identity = request.identity();
        if !self.oracle.is_current_os_user(identity) {
            return None;
        }
        let redacted = self.hooks.redact_location(location, identity)?;
        match self.oracle.location_grant(identity) {
            LocationGrant::Precise => Some(redacted),
            LocationGrant::Approximate => Some(self.approximate(&redacted)),
            LocationGrant::None => None,
        }
    }

    /// Shifts `location` by the per-process offset and pins its accuracy
    /// to the coarse value.
    pub(crate) fn approximate(&self, location: &Location) -> Location {
        let (bearing_factor, distance_factor) = fuzz_factors();
        let bearing = bearing_factor * 2.0 * PI;
        let distance = self.config.fuzz_min_offset
            + distance_factor * (self.config.fuzz_max_offset - self.config.fuzz_min_offset);
        let (latitude, longitude) =
            project_position((location.latitude, location.longitude), bearing, distance);

        let mut coarse = location.clone();
        coarse.latitude = latitude;
        coarse.longitude = longitude;
        coarse.accuracy = self.config.coarse_accuracy;
        coarse.altitude = 0.0;
        coarse.speed = 0.0;
        coarse.direction = 0.0;
        coarse.strip_auxiliary();
        coarse
    }

    fn is_stale(&self, location: &Location) -> bool {
        let now = get_current_timestamp();
        let gap = now - location.time_stamp;
        if gap <= self.config.stale_report_threshold.as_millis() as i64 {
            return false;
        }
        let mut last_fault = self.last_fault.lock().unwrap();
        let escalate = match *last_fault {
            Some(at) => at.elapsed() >= self.config.stale_reset_window,
            None => true,
        };
        if !escalate {
            error!("drop stale report, {}ms behind", gap);
            return true;
        }
        *last_fault = Some(Instant::now());
        drop(last_fault);

        error!("stale report {}ms behind wall clock", gap);
        SysEvent::locating_fault()
            .param(build_str_param!(PARAM_EXTRA_INFO, "stale report"))
            .param(build_str_param!(PARAM_PROVIDER, &format!("{:?}", location.source)))
            .write(self.telemetry.as_ref());
        self.fatal.on_fatal("stale location report");
        true
    }

    fn satellite_cache(&self) -> Option<Location> {
        self.satellite_cache.lock().unwrap().clone()
    }

    /// Serves `request` from the freshest valid cache.
    pub fn get_cache_location(&self, request: &Request) -> Option<Location> {
        let identity = request.identity();
        let now = get_current_timestamp();
        let long = self.hooks.approve_long_cache(identity);
        let window = |short: std::time::Duration| -> i64 {
            if long {
                self.config.long_cache_window.as_millis() as i64
            } else {
                short.as_millis() as i64
            }
        };
        let fresh = |cache: &Mutex<Option<Location>>, window: i64| {
            cache
                .lock()
                .unwrap()
                .clone()
                .filter(|l| l.is_valid() && now - l.time_stamp <= window)
        };
        let satellite = fresh(&self.satellite_cache, window(self.config.satellite_cache_window));
        let network = fresh(&self.network_cache, window(self.config.network_cache_window));
        let cached = match (satellite, network) {
            (Some(s), Some(n)) => Some(if n.time_stamp > s.time_stamp { n } else { s }),
            (s, n) => s.or(n),
        };
        let mut cached = match cached {
            Some(cached) => cached,
            None => {
                let fallback = self.fallback.as_ref()?.get_cached_location()?;
                if !fallback.is_valid() {
                    return None;
                }
                debug!("serve cache from provider fallback");
                fallback
            }
        };

        if cached.is_indoor() {
            if !self.hooks.is_indoor_eligible(identity) {
                debug!("withhold indoor cache from {}", identity);
                return None;
            }
            cached.strip_auxiliary();
        }
        let permitted = self.get_permitted_location(&cached, request)?;
        if !self.result_check(&permitted, request) {
            return None;
        }
        request.set_last_location(permitted.clone());
        Some(permitted)
    }

    /// Returns the last non-indoor network location of OS user `user_id`.
    pub fn last_location(&self, user_id: u64) -> Option<Location> {
        self.last_locations.lock().unwrap().get(&user_id).cloned()
    }
}
