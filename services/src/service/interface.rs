// Copyright (C) 2023 Huawei Device Co., Ltd.
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

//! Interfaces of the collaborators the locator core talks to.
//!
//! Providers, the permission oracle, the switch and the deployment hooks are
//! implemented outside the core. Every query here is a pure query: an
//! implementation must never call back into the core while answering.

use crate::manage::work_record::WorkRecord;
use crate::request::identity::Identity;
use crate::request::location::Location;

/// Process exit status used when the report clock is found broken.
pub const STALE_CLOCK_EXIT_CODE: i32 = 101;

/// Location permission held by a requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationGrant {
    /// No location permission.
    None,
    /// Approximate location only.
    Approximate,
    /// Precise location.
    Precise,
}

/// State of the global location switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchState {
    /// Locating is allowed.
    Enabled,
    /// Locating is disabled.
    Disabled,
}

/// Activation interface of one location provider.
#[cfg_attr(test, mockall::automock)]
pub trait ProviderProxy: Send + Sync {
    /// Hands the full current work record to the provider. Idempotent.
    fn activate(&self, work_record: &WorkRecord);

    /// Turns the provider on or off.
    fn set_enabled(&self, enabled: bool);

    /// Returns the provider's own cached location.
    fn get_cached_location(&self) -> Option<Location>;
}

/// Identity and permission oracle.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionOracle: Send + Sync {
    /// Returns the location permission held by `identity`.
    fn location_grant(&self, identity: &Identity) -> LocationGrant;

    /// Whether `identity` holds the background location permission.
    fn has_background_grant(&self, identity: &Identity) -> bool;

    /// Whether `identity` may keep locating at full rate while backgrounded.
    fn has_continuous_task(&self, identity: &Identity) -> bool;

    /// Whether `identity` is in the foreground.
    fn is_foreground(&self, identity: &Identity) -> bool;

    /// Whether `identity` belongs to the active OS user.
    fn is_current_os_user(&self, identity: &Identity) -> bool;

    /// Whether process `pid` is frozen.
    fn is_frozen(&self, pid: u64) -> bool;
}

/// The global location switch.
#[cfg_attr(test, mockall::automock)]
pub trait SwitchProvider: Send + Sync {
    /// Returns the switch state.
    fn switch_state(&self) -> SwitchState;

    /// Whether `identity` may locate with the switch off.
    fn is_switch_ignored(&self, identity: &Identity) -> bool;
}

/// Deployment specific decision points.
///
/// Every hook has a neutral default, so implementations only override what
/// they need.
pub trait LocatorHooks: Send + Sync {
    /// Whether a satellite report may refresh the satellite cache.
    fn is_satellite_cache_valid(&self, _location: &Location) -> bool {
        true
    }

    /// Returns the copy of `location` that `identity` may see, or `None` to
    /// withhold it.
    fn redact_location(&self, location: &Location, _identity: &Identity) -> Option<Location> {
        Some(location.clone())
    }

    /// Whether `location` may be delivered to `identity`.
    fn allow_report(&self, _location: &Location, _identity: &Identity) -> bool {
        true
    }

    /// Rewrites the fusion outcome. `decided` is what fusion chose.
    fn override_fusion(
        &self,
        _location: &Location,
        _best: Option<&Location>,
        _decided: &Location,
    ) -> Option<Location> {
        None
    }

    /// Whether `identity` may be served from the long cache window.
    fn approve_long_cache(&self, _identity: &Identity) -> bool {
        false
    }

    /// Whether `identity` may receive indoor fixes from the cache.
    fn is_indoor_eligible(&self, _identity: &Identity) -> bool {
        false
    }

    /// Whether the device is idle for `identity`.
    fn is_device_idle(&self, _identity: &Identity) -> bool {
        false
    }
}

/// Hooks with every decision left at its default.
pub struct DefaultHooks;

impl LocatorHooks for DefaultHooks {}

/// Handler of unrecoverable faults.
#[cfg_attr(test, mockall::automock)]
pub trait FatalHandler: Send + Sync {
    /// Called once per reset window when a fatal fault is detected.
    fn on_fatal(&self, reason: &str);
}

/// Exits the process so the service manager restarts it.
pub struct ProcessExit;

impl FatalHandler for ProcessExit {
    fn on_fatal(&self, reason: &str) {
        error!("locator fatal fault: {}, exit", reason);
        std::process::exit(STALE_CLOCK_EXIT_CODE);
    }
}
