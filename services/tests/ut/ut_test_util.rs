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

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{LocatorConfig, LocatorConfigBuilder};
use crate::manage::work_record::WorkRecord;
use crate::request::config::RequestConfig;
use crate::request::identity::Identity;
use crate::request::location::{Location, LocationSource};
use crate::request::provider::ProviderKind;
use crate::request::reason::{LocatingStatus, LocationErr};
use crate::request::request::Request;
use crate::service::callback::{CallbackHandle, LocatorCallback};
use crate::service::interface::{
    DefaultHooks, FatalHandler, LocationGrant, LocatorHooks, PermissionOracle, ProviderProxy,
    SwitchProvider, SwitchState,
};
use crate::sys_event::{EventKind, SysEvent, TelemetrySink};
use crate::utils::get_current_timestamp;
use crate::{Collaborators, LocatorService};

pub(crate) const NANOS_PER_SEC: i64 = 1_000_000_000;

pub(crate) fn test_init() {
    locator_utils::test::init_log();
}

/// Identity of test app `n`, owned by the default user.
pub(crate) fn app_identity(n: u64) -> Identity {
    Identity::new(
        1000 + n,
        20010000 + n,
        5000 + n,
        &format!("com.example.app{}", n),
    )
}

/// A fresh valid fix taken `boot_secs` after boot.
pub(crate) fn fix(source: LocationSource, boot_secs: i64) -> Location {
    fix_at(31.2304, 121.4737, source, boot_secs)
}

pub(crate) fn fix_at(latitude: f64, longitude: f64, source: LocationSource, boot_secs: i64) -> Location {
    let mut location = Location::new(latitude, longitude, source);
    location.accuracy = 10.0;
    location.time_stamp = get_current_timestamp();
    location.time_since_boot = boot_secs * NANOS_PER_SEC;
    location
}

#[derive(Default)]
pub(crate) struct FakeOracle {
    grants: Mutex<HashMap<u64, LocationGrant>>,
    background_grant: Mutex<HashSet<u64>>,
    continuous: Mutex<HashSet<u64>>,
    backgrounded: Mutex<HashSet<u64>>,
    other_user: Mutex<HashSet<u64>>,
    frozen: Mutex<HashSet<u64>>,
}

fn toggle(set: &Mutex<HashSet<u64>>, key: u64, on: bool) {
    let mut set = set.lock().unwrap();
    if on {
        set.insert(key);
    } else {
        set.remove(&key);
    }
}

impl FakeOracle {
    pub(crate) fn set_grant(&self, uid: u64, grant: LocationGrant) {
        self.grants.lock().unwrap().insert(uid, grant);
    }

    pub(crate) fn set_background_grant(&self, uid: u64, granted: bool) {
        toggle(&self.background_grant, uid, granted);
    }

    pub(crate) fn set_continuous(&self, uid: u64, continuous: bool) {
        toggle(&self.continuous, uid, continuous);
    }

    pub(crate) fn set_foreground(&self, uid: u64, foreground: bool) {
        toggle(&self.backgrounded, uid, !foreground);
    }

    pub(crate) fn set_current_user(&self, uid: u64, current: bool) {
        toggle(&self.other_user, uid, !current);
    }

    pub(crate) fn set_frozen(&self, pid: u64, frozen: bool) {
        toggle(&self.frozen, pid, frozen);
    }
}

impl PermissionOracle for FakeOracle {
    fn location_grant(&self, identity: &Identity) -> LocationGrant {
        self.grants
            .lock()
            .unwrap()
            .get(&identity.uid)
            .copied()
            .unwrap_or(LocationGrant::Precise)
    }

    fn has_background_grant(&self, identity: &Identity) -> bool {
        self.background_grant.lock().unwrap().contains(&identity.uid)
    }

    fn has_continuous_task(&self, identity: &Identity) -> bool {
        self.continuous.lock().unwrap().contains(&identity.uid)
    }

    fn is_foreground(&self, identity: &Identity) -> bool {
        !self.backgrounded.lock().unwrap().contains(&identity.uid)
    }

    fn is_current_os_user(&self, identity: &Identity) -> bool {
        !self.other_user.lock().unwrap().contains(&identity.uid)
    }

    fn is_frozen(&self, pid: u64) -> bool {
        self.frozen.lock().unwrap().contains(&pid)
    }
}

pub(crate) struct FakeSwitch {
    enabled: AtomicBool,
    ignored: Mutex<HashSet<u64>>,
}

impl FakeSwitch {
    pub(crate) fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            ignored: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn set_ignored(&self, uid: u64, ignored: bool) {
        toggle(&self.ignored, uid, ignored);
    }
}

impl SwitchProvider for FakeSwitch {
    fn switch_state(&self) -> SwitchState {
        if self.enabled.load(Ordering::SeqCst) {
            SwitchState::Enabled
        } else {
            SwitchState::Disabled
        }
    }

    fn is_switch_ignored(&self, identity: &Identity) -> bool {
        self.ignored.lock().unwrap().contains(&identity.uid)
    }
}

#[derive(Default)]
pub(crate) struct FakeProvider {
    activations: Mutex<Vec<WorkRecord>>,
    enabled: Mutex<Vec<bool>>,
    cached: Mutex<Option<Location>>,
}

impl FakeProvider {
    pub(crate) fn last_record(&self) -> Option<WorkRecord> {
        self.activations.lock().unwrap().last().cloned()
    }

    pub(crate) fn activation_count(&self) -> usize {
        self.activations.lock().unwrap().len()
    }

    pub(crate) fn enabled_history(&self) -> Vec<bool> {
        self.enabled.lock().unwrap().clone()
    }

    pub(crate) fn set_cached(&self, location: Option<Location>) {
        *self.cached.lock().unwrap() = location;
    }
}

impl ProviderProxy for FakeProvider {
    fn activate(&self, work_record: &WorkRecord) {
        self.activations.lock().unwrap().push(work_record.clone());
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.lock().unwrap().push(enabled);
    }

    fn get_cached_location(&self) -> Option<Location> {
        self.cached.lock().unwrap().clone()
    }
}

pub(crate) struct RecordingCallback {
    pub(crate) locations: Mutex<Vec<Location>>,
    pub(crate) errors: Mutex<Vec<LocationErr>>,
    pub(crate) statuses: Mutex<Vec<LocatingStatus>>,
    reachable: AtomicBool,
}

impl RecordingCallback {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            locations: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
        })
    }

    pub(crate) fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub(crate) fn locations(&self) -> Vec<Location> {
        self.locations.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<LocationErr> {
        self.errors.lock().unwrap().clone()
    }

    pub(crate) fn statuses(&self) -> Vec<LocatingStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

impl LocatorCallback for RecordingCallback {
    fn on_location_report(&self, location: &Location) -> bool {
        self.locations.lock().unwrap().push(location.clone());
        self.reachable.load(Ordering::SeqCst)
    }

    fn on_locating_status_change(&self, status: LocatingStatus) -> bool {
        self.statuses.lock().unwrap().push(status);
        true
    }

    fn on_error_report(&self, err: LocationErr) -> bool {
        self.errors.lock().unwrap().push(err);
        true
    }
}

#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<SysEvent>>,
}

impl RecordingSink {
    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind() == kind)
            .count()
    }

    pub(crate) fn events(&self) -> Vec<SysEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl TelemetrySink for RecordingSink {
    fn write(&self, event: SysEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
pub(crate) struct RecordingFatal {
    count: AtomicUsize,
}

impl RecordingFatal {
    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl FatalHandler for RecordingFatal {
    fn on_fatal(&self, _reason: &str) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A locator service wired to fakes.
pub(crate) struct TestEnv {
    pub(crate) oracle: Arc<FakeOracle>,
    pub(crate) switch: Arc<FakeSwitch>,
    pub(crate) satellite: Arc<FakeProvider>,
    pub(crate) network: Arc<FakeProvider>,
    pub(crate) passive: Arc<FakeProvider>,
    pub(crate) sink: Arc<RecordingSink>,
    pub(crate) fatal: Arc<RecordingFatal>,
    pub(crate) service: LocatorService,
}

impl TestEnv {
    pub(crate) fn new() -> Self {
        Self::with(LocatorConfigBuilder::new().reapply_interval(None).build(), Arc::new(DefaultHooks))
    }

    pub(crate) fn with(config: LocatorConfig, hooks: Arc<dyn LocatorHooks>) -> Self {
        test_init();
        let oracle = Arc::new(FakeOracle::default());
        let switch = Arc::new(FakeSwitch::new());
        let satellite = Arc::new(FakeProvider::default());
        let network = Arc::new(FakeProvider::default());
        let passive = Arc::new(FakeProvider::default());
        let sink = Arc::new(RecordingSink::default());
        let fatal = Arc::new(RecordingFatal::default());
        let mut providers: HashMap<ProviderKind, Arc<dyn ProviderProxy>> = HashMap::new();
        providers.insert(ProviderKind::Satellite, satellite.clone());
        providers.insert(ProviderKind::Network, network.clone());
        providers.insert(ProviderKind::Passive, passive.clone());
        let collaborators = Collaborators {
            oracle: oracle.clone(),
            switch: switch.clone(),
            hooks,
            telemetry: sink.clone(),
            fatal: fatal.clone(),
            providers,
        };
        let service = LocatorService::new(config, collaborators);
        Self {
            oracle,
            switch,
            satellite,
            network,
            passive,
            sink,
            fatal,
            service,
        }
    }

    /// Starts `config` for `identity` with a fresh recording callback.
    pub(crate) fn start(
        &self,
        config: RequestConfig,
        identity: Identity,
    ) -> (Arc<RecordingCallback>, CallbackHandle, Arc<Request>) {
        let callback = RecordingCallback::new();
        let handle = CallbackHandle::new(callback.clone());
        let outcome = self
            .service
            .start_locating(config, handle.clone(), identity)
            .unwrap();
        (callback, handle, outcome.request)
    }
}
