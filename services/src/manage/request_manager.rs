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

//! The request registry.
//!
//! [`RequestManager`] owns the callback-keyed and provider-keyed indices of
//! every registered [`Request`], evaluates the admission checks and computes
//! each provider's [`WorkRecord`]. Providers, requester callbacks and the
//! background proxy are only called after the registry lock is released.
//! Planning passes are serialized; requester callbacks run after the pass.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use super::background_proxy::BackgroundProxy;
use super::permission::{PermissionUsage, UsageFlags};
use super::work_record::WorkRecord;
use crate::request::identity::Identity;
use crate::request::provider::ProviderKind;
use crate::request::reason::{LocatingStatus, LocationErr};
use crate::request::request::Request;
use crate::service::callback::CallbackId;
use crate::service::interface::{
    LocationGrant, LocatorHooks, PermissionOracle, ProviderProxy, SwitchProvider, SwitchState,
};
use crate::sys_event::{SysEvent, TelemetrySink, PARAM_PROVIDER, PARAM_UID};
use crate::utils::runtime_spawn;

/// Result of registering a request.
#[derive(Clone, Debug)]
pub struct StartOutcome {
    /// The registered request. For a repeated registration this is the
    /// request registered first.
    pub request: Arc<Request>,
    /// Whether the request was newly inserted.
    pub is_new: bool,
}

enum Admission {
    Admitted(UsageFlags),
    Inactive,
    Denied(LocationErr),
}

#[derive(Default)]
struct Registry {
    receivers: HashMap<CallbackId, Vec<Arc<Request>>>,
    buckets: HashMap<ProviderKind, Vec<Arc<Request>>>,
    work_records: HashMap<ProviderKind, WorkRecord>,
    uids: HashMap<u64, usize>,
    tokens: HashMap<u64, usize>,
}

impl Registry {
    fn attach(&mut self, request: &Arc<Request>) {
        for provider in request.providers() {
            self.buckets
                .entry(*provider)
                .or_default()
                .push(request.clone());
        }
        let identity = request.identity();
        *self.uids.entry(identity.uid).or_insert(0) += 1;
        *self.tokens.entry(identity.token_id).or_insert(0) += 1;
    }

    fn detach(&mut self, request: &Arc<Request>) {
        for provider in request.providers() {
            let Some(bucket) = self.buckets.get_mut(provider) else {
                error!(
                    "request {} missing from {} bucket",
                    request.session_id().brief(),
                    provider
                );
                continue;
            };
            bucket.retain(|r| !Arc::ptr_eq(r, request));
        }
        let identity = request.identity();
        release_count(&mut self.uids, identity.uid);
        release_count(&mut self.tokens, identity.token_id);
    }
}

fn release_count(counts: &mut HashMap<u64, usize>, key: u64) {
    if let Some(count) = counts.get_mut(&key) {
        *count -= 1;
        if *count == 0 {
            counts.remove(&key);
        }
    }
}

struct Activation {
    provider: ProviderKind,
    record: WorkRecord,
    previous: WorkRecord,
}

/// Requester notification raised by a planning pass.
enum Notice {
    Status(Arc<Request>, LocatingStatus),
    Error(Arc<Request>, LocationErr),
}

impl Notice {
    fn dispatch(self) {
        match self {
            Notice::Status(request, status) => {
                request.callback().on_locating_status_change(status);
            }
            Notice::Error(request, err) => {
                request.callback().on_error_report(err);
            }
        }
    }
}

/// Registry of locating requests and driver of provider activation.
pub struct RequestManager {
    registry: Mutex<Registry>,
    plan: Mutex<()>,
    oracle: Arc<dyn PermissionOracle>,
    switch: Arc<dyn SwitchProvider>,
    hooks: Arc<dyn LocatorHooks>,
    telemetry: Arc<dyn TelemetrySink>,
    usage: Arc<PermissionUsage>,
    providers: HashMap<ProviderKind, Arc<dyn ProviderProxy>>,
    proxy: OnceLock<Weak<BackgroundProxy>>,
    reapply: Mutex<Option<JoinHandle<()>>>,
    me: Weak<RequestManager>,
}

impl RequestManager {
    pub(crate) fn new(
        oracle: Arc<dyn PermissionOracle>,
        switch: Arc<dyn SwitchProvider>,
        hooks: Arc<dyn LocatorHooks>,
        telemetry: Arc<dyn TelemetrySink>,
        usage: Arc<PermissionUsage>,
        providers: HashMap<ProviderKind, Arc<dyn ProviderProxy>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            registry: Mutex::new(Registry::default()),
            plan: Mutex::new(()),
            oracle,
            switch,
            hooks,
            telemetry,
            usage,
            providers,
            proxy: OnceLock::new(),
            reapply: Mutex::new(None),
            me: me.clone(),
        })
    }

    pub(crate) fn set_background_proxy(&self, proxy: Weak<BackgroundProxy>) {
        if self.proxy.set(proxy).is_err() {
            error!("background proxy set twice");
        }
    }

    fn background_proxy(&self) -> Option<Arc<BackgroundProxy>> {
        self.proxy.get().and_then(Weak::upgrade)
    }

    /// Starts re-applying every work record each `interval`, healing
    /// activations that raced each other.
    pub(crate) fn start_reapply(&self, interval: Duration) {
        let me = self.me.clone();
        let handle = runtime_spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let Some(manager) = me.upgrade() else {
                    break;
                };
                debug!("periodic work record re-application");
                manager.recompute(true);
            }
        });
        if let Some(old) = self.reapply.lock().unwrap().replace(handle) {
            old.abort();
        }
    }

    /// Registers a request and recomputes the work records.
    ///
    /// A request whose callback already registered a structurally identical
    /// configuration is not duplicated; the existing request is reactivated
    /// and returned with `is_new` unset.
    pub fn start_locating(&self, request: Request) -> StartOutcome {
        let callback_id = request.callback().id();
        let outcome = {
            let mut registry = self.registry.lock().unwrap();
            let existing = registry
                .receivers
                .get(&callback_id)
                .and_then(|list| list.iter().find(|r| r.config() == request.config()))
                .cloned();
            match existing {
                Some(existing) => {
                    existing.set_requesting(true);
                    StartOutcome {
                        request: existing,
                        is_new: false,
                    }
                }
                None => {
                    let request = Arc::new(request);
                    request.set_requesting(true);
                    registry
                        .receivers
                        .entry(callback_id)
                        .or_default()
                        .push(request.clone());
                    registry.attach(&request);
                    StartOutcome {
                        request,
                        is_new: true,
                    }
                }
            }
        };

        let request = &outcome.request;
        if outcome.is_new {
            info!("start locating {}", request);
            let me = self.me.clone();
            request.callback().link_to_death(move || {
                if let Some(manager) = me.upgrade() {
                    manager.stop_locating(callback_id);
                }
            });
            request_event!(self.telemetry.as_ref(), request_added, request);
        } else {
            info!(
                "update locating request {} of callback {}",
                request.session_id().brief(),
                callback_id
            );
        }
        self.handle_request();
        outcome
    }

    /// Removes every request registered with `callback_id`.
    pub fn stop_locating(&self, callback_id: CallbackId) {
        let removed = {
            let mut registry = self.registry.lock().unwrap();
            match registry.receivers.remove(&callback_id) {
                Some(list) => {
                    for request in list.iter() {
                        registry.detach(request);
                    }
                    list
                }
                None => {
                    info!("stop locating unknown callback {}", callback_id);
                    return;
                }
            }
        };
        info!(
            "stop locating callback {}, {} requests",
            callback_id,
            removed.len()
        );
        self.release(removed);
        self.handle_request();
    }

    /// Removes the given requests from every index.
    pub fn remove_requests(&self, requests: &[Arc<Request>]) {
        let removed = {
            let mut registry = self.registry.lock().unwrap();
            let mut removed = Vec::new();
            for request in requests {
                let callback_id = request.callback().id();
                let Some(list) = registry.receivers.get_mut(&callback_id) else {
                    debug!("request {} already removed", request.session_id().brief());
                    continue;
                };
                let before = list.len();
                list.retain(|r| !Arc::ptr_eq(r, request));
                if list.len() == before {
                    continue;
                }
                if list.is_empty() {
                    registry.receivers.remove(&callback_id);
                }
                registry.detach(request);
                removed.push(request.clone());
            }
            removed
        };
        if removed.is_empty() {
            return;
        }
        self.release(removed);
        self.handle_request();
    }

    /// Removes every request of OS user `user_id`.
    pub fn remove_user_requests(&self, user_id: u64) {
        let requests: Vec<_> = self
            .all_requests()
            .into_iter()
            .filter(|r| !r.is_internal() && r.identity().user_id() == user_id)
            .collect();
        info!("remove {} requests of user {}", requests.len(), user_id);
        self.remove_requests(&requests);
    }

    fn release(&self, removed: Vec<Arc<Request>>) {
        let proxy = self.background_proxy();
        for request in removed {
            request.set_requesting(false);
            if request.leave_plan() {
                self.usage.apply(&request, UsageFlags::default());
                request
                    .callback()
                    .on_locating_status_change(LocatingStatus::Stopped);
            }
            if let Some(proxy) = proxy.as_ref() {
                proxy.remove_request(&request);
            }
            request_event!(self.telemetry.as_ref(), request_removed, request);
        }
    }

    /// Recomputes every provider's work record and applies the changes.
    pub fn handle_request(&self) {
        self.recompute(false);
    }

    /// Recomputes the work records if `token_id` belongs to a registered
    /// request.
    pub fn handle_permission_changed(&self, token_id: u64) {
        if !self.registry.lock().unwrap().tokens.contains_key(&token_id) {
            debug!("permission change of token {} not relevant", token_id);
            return;
        }
        info!("permission changed for token {}", token_id);
        self.handle_request();
    }

    /// Recomputes the work records if `uid` belongs to a registered request.
    pub fn handle_power_suspend_changed(&self, pid: u64, uid: u64, frozen: bool) {
        if !self.registry.lock().unwrap().uids.contains_key(&uid) {
            debug!("suspend change of uid {} not relevant", uid);
            return;
        }
        info!("power suspend changed pid {} uid {} frozen {}", pid, uid, frozen);
        self.handle_request();
    }

    fn recompute(&self, force: bool) {
        // Passes run one at a time so plan flags and provider activations
        // follow the order the work records were computed in.
        let plan = self.plan.lock().unwrap();
        let now = Instant::now();
        let mut verdicts: Vec<(Arc<Request>, Admission)> = Vec::new();
        let mut admitted: HashMap<*const Request, bool> = HashMap::new();
        let mut activations = Vec::new();
        {
            let mut registry = self.registry.lock().unwrap();
            let mut records = Vec::with_capacity(ProviderKind::ALL.len());
            for provider in ProviderKind::ALL {
                let mut record = WorkRecord::new(provider);
                // A request routed to several providers is admitted once per pass.
                for request in registry.buckets.get(&provider).into_iter().flatten() {
                    let pass = *admitted.entry(Arc::as_ptr(request)).or_insert_with(|| {
                        let admission = self.admit(request, now);
                        let pass = matches!(admission, Admission::Admitted(_));
                        verdicts.push((request.clone(), admission));
                        pass
                    });
                    if pass {
                        record.add(request);
                    }
                }
                records.push(record);
            }
            for record in records {
                let provider = record.provider();
                let previous = registry
                    .work_records
                    .insert(provider, record.clone())
                    .unwrap_or_else(|| WorkRecord::new(provider));
                if force || previous != record {
                    activations.push(Activation {
                        provider,
                        record,
                        previous,
                    });
                }
            }
        }

        let mut notices = Vec::new();
        for (request, admission) in verdicts {
            self.settle(&request, admission, &mut notices);
        }
        for activation in activations {
            self.activate(activation);
        }
        drop(plan);

        for notice in notices {
            notice.dispatch();
        }
    }

    fn admit(&self, request: &Request, now: Instant) -> Admission {
        if !request.is_requesting() {
            return Admission::Inactive;
        }
        let identity = request.identity();
        if request.is_internal() {
            if !self.is_switch_allowed(identity) {
                return Admission::Denied(LocationErr::SwitchOff);
            }
            return Admission::Admitted(UsageFlags::default());
        }
        if self.oracle.is_frozen(identity.pid) {
            return Admission::Denied(LocationErr::Frozen);
        }
        if !self.oracle.is_current_os_user(identity) {
            return Admission::Denied(LocationErr::NotCurrentUser);
        }
        if request.is_timed_out(now) {
            return Admission::Denied(LocationErr::Timeout);
        }
        if !self.is_switch_allowed(identity) {
            return Admission::Denied(LocationErr::SwitchOff);
        }
        let grant = self.oracle.location_grant(identity);
        if grant == LocationGrant::None {
            return Admission::Denied(LocationErr::LocationPermissionDenied);
        }
        let foreground = self.oracle.is_foreground(identity);
        if !foreground && !self.oracle.has_continuous_task(identity) {
            return Admission::Denied(LocationErr::BackgroundPermissionDenied);
        }
        if self.hooks.is_device_idle(identity) {
            return Admission::Denied(LocationErr::DeviceIdle);
        }
        Admission::Admitted(UsageFlags {
            location: grant == LocationGrant::Precise,
            background: !foreground,
            approximate: grant == LocationGrant::Approximate,
        })
    }

    pub(crate) fn is_switch_allowed(&self, identity: &Identity) -> bool {
        self.switch.switch_state() == SwitchState::Enabled || self.switch.is_switch_ignored(identity)
    }

    fn settle(&self, request: &Arc<Request>, admission: Admission, notices: &mut Vec<Notice>) {
        match admission {
            Admission::Admitted(flags) => {
                request.clear_error();
                self.usage.apply(request, flags);
                if request.enter_plan() {
                    debug!("request {} joins plan", request.session_id().brief());
                    notices.push(Notice::Status(request.clone(), LocatingStatus::Started));
                }
            }
            Admission::Inactive => self.leave(request, notices),
            Admission::Denied(err) => {
                self.leave(request, notices);
                if request.record_error(err) {
                    info!(
                        "request {} excluded: {}",
                        request.session_id().brief(),
                        err.to_str()
                    );
                    request_event!(
                        self.telemetry.as_ref(),
                        admission_failure,
                        request,
                        err.to_str()
                    );
                    notices.push(Notice::Error(request.clone(), err));
                }
            }
        }
    }

    fn leave(&self, request: &Arc<Request>, notices: &mut Vec<Notice>) {
        if request.leave_plan() {
            debug!("request {} leaves plan", request.session_id().brief());
            self.usage.apply(request, UsageFlags::default());
            notices.push(Notice::Status(request.clone(), LocatingStatus::Stopped));
        }
    }

    fn activate(&self, activation: Activation) {
        let Activation {
            provider,
            record,
            previous,
        } = activation;
        let diff = record.diff(&previous);
        for (uid, _, bundle_name) in diff.added.iter() {
            SysEvent::contribution_started()
                .param(build_str_param!(PARAM_PROVIDER, provider.as_str()))
                .param(build_number_param!(PARAM_UID, *uid))
                .param(build_str_param!(
                    crate::sys_event::PARAM_BUNDLE_NAME,
                    bundle_name
                ))
                .write(self.telemetry.as_ref());
        }
        for (uid, _, bundle_name) in diff.removed.iter() {
            SysEvent::contribution_stopped()
                .param(build_str_param!(PARAM_PROVIDER, provider.as_str()))
                .param(build_number_param!(PARAM_UID, *uid))
                .param(build_str_param!(
                    crate::sys_event::PARAM_BUNDLE_NAME,
                    bundle_name
                ))
                .write(self.telemetry.as_ref());
        }

        let Some(proxy) = self.providers.get(&provider) else {
            debug!("no {} provider, skip activation {}", provider, record);
            return;
        };
        info!("activate {}", record);
        proxy.activate(&record);
        if previous.is_empty() != record.is_empty() {
            proxy.set_enabled(!record.is_empty());
        }
    }

    /// Returns a snapshot of the requests routed to `provider`.
    pub fn requests_for(&self, provider: ProviderKind) -> Vec<Arc<Request>> {
        self.registry
            .lock()
            .unwrap()
            .buckets
            .get(&provider)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns a snapshot of the requests registered with `callback_id`.
    pub fn requests_of_callback(&self, callback_id: CallbackId) -> Vec<Arc<Request>> {
        self.registry
            .lock()
            .unwrap()
            .receivers
            .get(&callback_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the requests of process `pid` running as `uid`.
    pub fn requests_of_process(&self, uid: u64, pid: u64) -> Vec<Arc<Request>> {
        self.all_requests()
            .into_iter()
            .filter(|r| r.identity().uid == uid && r.identity().pid == pid)
            .collect()
    }

    /// Returns every registered request.
    pub fn all_requests(&self) -> Vec<Arc<Request>> {
        let registry = self.registry.lock().unwrap();
        let mut requests: Vec<_> = registry.receivers.values().flatten().cloned().collect();
        requests.sort_by(|a, b| a.callback().id().cmp(&b.callback().id()));
        requests
    }

    /// Returns the last computed work record of `provider`.
    pub fn work_record(&self, provider: ProviderKind) -> WorkRecord {
        self.registry
            .lock()
            .unwrap()
            .work_records
            .get(&provider)
            .cloned()
            .unwrap_or_else(|| WorkRecord::new(provider))
    }

    /// Renders the registry grouped by provider.
    pub fn dump(&self) -> String {
        let registry = self.registry.lock().unwrap();
        let mut out = String::new();
        let _ = writeln!(out, "registered callbacks: {}", registry.receivers.len());
        for provider in ProviderKind::ALL {
            let bucket = registry.buckets.get(&provider);
            let _ = writeln!(
                out,
                "{}: {} requests",
                provider,
                bucket.map_or(0, |b| b.len())
            );
            for request in bucket.into_iter().flatten() {
                let _ = writeln!(out, "  {}", request);
            }
            if let Some(record) = registry.work_records.get(&provider) {
                let _ = writeln!(out, "  work record {}", record);
            }
        }
        out
    }
}

impl Drop for RequestManager {
    fn drop(&mut self) {
        if let Some(handle) = self.reapply.lock().unwrap().take() {
            handle.abort();
        }
    }
}
