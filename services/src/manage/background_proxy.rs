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

//! Background request substitution.
//!
//! A continuous request whose app goes to background without the
//! continuous-task privilege stops contributing to its providers. If the app
//! holds the background grant, the request is shadowed here instead: one
//! shared low-rate internal request runs for all shadowed requests of the
//! active user and its locations are forwarded to them.
//!
//! The shadow lock is always released before calling into the
//! [`RequestManager`].

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::report_manager::ReportManager;
use super::request_manager::RequestManager;
use crate::config::LocatorConfig;
use crate::request::config::{Priority, RequestConfigBuilder};
use crate::request::location::Location;
use crate::request::request::Request;
use crate::service::callback::{CallbackHandle, CallbackId, LocatorCallback};
use crate::service::interface::{LocationGrant, PermissionOracle};
use crate::utils::runtime_spawn;

/// State of the shared background request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyState {
    /// Nothing is shadowed.
    Idle,
    /// The start of the shared request is debounced.
    WaitingToStart,
    /// The shared request is running.
    Locating,
}

struct ProxyInner {
    buckets: HashMap<u64, Vec<Arc<Request>>>,
    active_user: u64,
    state: ProxyState,
    timer: Option<JoinHandle<()>>,
    running: Option<CallbackId>,
}

impl ProxyInner {
    fn active_bucket(&self) -> &[Arc<Request>] {
        self.buckets
            .get(&self.active_user)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns to idle. Returns the shared request to stop, if running.
    fn go_idle(&mut self) -> Option<CallbackId> {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.state = ProxyState::Idle;
        self.running.take()
    }
}

/// Shadows backgrounded requests behind one shared low-rate request.
pub struct BackgroundProxy {
    inner: Mutex<ProxyInner>,
    request_manager: Arc<RequestManager>,
    report_manager: Arc<ReportManager>,
    oracle: Arc<dyn PermissionOracle>,
    debounce: Duration,
    time_interval: Duration,
    cap_per_app: usize,
    me: Weak<BackgroundProxy>,
}

impl BackgroundProxy {
    pub(crate) fn new(
        config: &LocatorConfig,
        active_user: u64,
        request_manager: Arc<RequestManager>,
        report_manager: Arc<ReportManager>,
        oracle: Arc<dyn PermissionOracle>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            inner: Mutex::new(ProxyInner {
                buckets: HashMap::new(),
                active_user,
                state: ProxyState::Idle,
                timer: None,
                running: None,
            }),
            request_manager,
            report_manager,
            oracle,
            debounce: config.proxy_debounce,
            time_interval: config.proxy_time_interval,
            cap_per_app: config.proxy_cap_per_app,
            me: me.clone(),
        })
    }

    /// Handles a foreground or background transition of `request`'s app.
    pub fn on_suspend(&self, request: &Arc<Request>, foreground: bool) {
        if request.is_internal() {
            return;
        }
        if foreground {
            self.remove_request(request);
            return;
        }
        if !request.config().is_continuous() {
            return;
        }
        let identity = request.identity();
        if self.oracle.has_continuous_task(identity) {
            debug!("{} keeps locating with continuous task", identity);
            return;
        }
        if !self.oracle.has_background_grant(identity)
            || self.oracle.location_grant(identity) == LocationGrant::None
        {
            debug!("{} has no background grant, not shadowed", identity);
            return;
        }

        let mut inner = self.inner.lock().unwrap();
        let user_id = identity.user_id();
        let bucket = inner.buckets.entry(user_id).or_default();
        if bucket.iter().any(|r| Arc::ptr_eq(r, request)) {
            return;
        }
        let same_app = bucket
            .iter()
            .filter(|r| {
                r.identity().uid == identity.uid && r.identity().bundle_name == identity.bundle_name
            })
            .count();
        if same_app >= self.cap_per_app {
            info!("{} exceeds shadow cap {}", identity, self.cap_per_app);
            return;
        }
        bucket.push(request.clone());
        info!(
            "shadow request {} of {} for user {}",
            request.session_id().brief(),
            identity,
            user_id
        );
        if user_id == inner.active_user && inner.state == ProxyState::Idle {
            self.schedule_start(&mut inner);
        }
    }

    fn schedule_start(&self, inner: &mut ProxyInner) {
        inner.state = ProxyState::WaitingToStart;
        let me = self.me.clone();
        let debounce = self.debounce;
        let timer = runtime_spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(proxy) = me.upgrade() {
                proxy.on_timer_fired();
            }
        });
        if let Some(old) = inner.timer.replace(timer) {
            old.abort();
        }
    }

    /// Starts the shared request once the debounce elapsed.
    pub(crate) fn on_timer_fired(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.timer = None;
            if inner.state != ProxyState::WaitingToStart {
                return;
            }
            if inner.active_bucket().is_empty() {
                inner.state = ProxyState::Idle;
                return;
            }
            inner.state = ProxyState::Locating;
        }

        let callback = CallbackHandle::new(Arc::new(ProxyCallback {
            proxy: self.me.clone(),
        }));
        let callback_id = callback.id();
        let config = RequestConfigBuilder::new()
            .priority(Priority::LowPower)
            .time_interval(self.time_interval)
            .build();
        info!("start shared background request, callback {}", callback_id);
        self.request_manager
            .start_locating(Request::internal(config, callback));

        let orphaned = {
            let mut inner = self.inner.lock().unwrap();
            if inner.state == ProxyState::Locating && inner.running.is_none() {
                inner.running = Some(callback_id);
                false
            } else {
                true
            }
        };
        if orphaned {
            info!("shadow list emptied while starting, stop {}", callback_id);
            self.request_manager.stop_locating(callback_id);
        }
    }

    /// Drops `request` from the shadow lists.
    pub fn remove_request(&self, request: &Arc<Request>) {
        let stop = {
            let mut inner = self.inner.lock().unwrap();
            let user_id = request.identity().user_id();
            let active_user = inner.active_user;
            let Some(bucket) = inner.buckets.get_mut(&user_id) else {
                return;
            };
            let before = bucket.len();
            bucket.retain(|r| !Arc::ptr_eq(r, request));
            if bucket.len() == before {
                return;
            }
            let emptied = bucket.is_empty();
            info!("unshadow request {}", request.session_id().brief());
            if user_id == active_user && emptied {
                inner.go_idle()
            } else {
                None
            }
        };
        if let Some(callback_id) = stop {
            info!("stop shared background request {}", callback_id);
            self.request_manager.stop_locating(callback_id);
        }
    }

    /// Drops shadowed requests of `token_id` that lost the background grant.
    pub fn on_permission_changed(&self, token_id: u64) {
        let candidates: Vec<_> = {
            let inner = self.inner.lock().unwrap();
            inner
                .buckets
                .values()
                .flatten()
                .filter(|r| r.identity().token_id == token_id)
                .cloned()
                .collect()
        };
        for request in candidates {
            let identity = request.identity();
            if !self.oracle.has_background_grant(identity)
                || self.oracle.location_grant(identity) == LocationGrant::None
            {
                info!("{} lost background grant", identity);
                self.remove_request(&request);
            }
        }
    }

    /// Switches the active shadow list to `user_id`.
    pub fn on_user_switch(&self, user_id: u64) {
        let stop = {
            let mut inner = self.inner.lock().unwrap();
            if inner.active_user == user_id {
                return;
            }
            let stop = inner.go_idle();
            inner.active_user = user_id;
            inner.buckets.entry(user_id).or_default();
            if !inner.active_bucket().is_empty() {
                self.schedule_start(&mut inner);
            }
            stop
        };
        if let Some(callback_id) = stop {
            self.request_manager.stop_locating(callback_id);
        }
    }

    /// Forgets the shadow list of a removed user.
    pub fn on_user_removed(&self, user_id: u64) {
        let stop = {
            let mut inner = self.inner.lock().unwrap();
            if inner.buckets.remove(&user_id).is_none() {
                return;
            }
            if inner.active_user == user_id {
                inner.go_idle()
            } else {
                None
            }
        };
        if let Some(callback_id) = stop {
            self.request_manager.stop_locating(callback_id);
        }
    }

    fn forward(&self, location: &Location) {
        let shadows = self.inner.lock().unwrap().active_bucket().to_vec();
        for request in shadows {
            if self.report_manager.report_to_shadow(location, &request) {
                debug!("forward background fix to {}", request.session_id().brief());
            }
        }
    }

    /// Returns the state of the shared request.
    pub fn state(&self) -> ProxyState {
        self.inner.lock().unwrap().state
    }

    /// Whether `request` is shadowed.
    pub fn is_shadowed(&self, request: &Arc<Request>) -> bool {
        self.inner
            .lock()
            .unwrap()
            .buckets
            .values()
            .flatten()
            .any(|r| Arc::ptr_eq(r, request))
    }

    /// Returns the callback of the running shared request.
    pub fn running_callback(&self) -> Option<CallbackId> {
        self.inner.lock().unwrap().running
    }
}

impl fmt::Display for BackgroundProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap();
        writeln!(
            f,
            "background proxy: state:{:?} active user:{}",
            inner.state, inner.active_user
        )?;
        for (user_id, bucket) in inner.buckets.iter() {
            for request in bucket {
                writeln!(f, "  user {} shadow {}", user_id, request)?;
            }
        }
        Ok(())
    }
}

struct ProxyCallback {
    proxy: Weak<BackgroundProxy>,
}

impl LocatorCallback for ProxyCallback {
    fn on_location_report(&self, location: &Location) -> bool {
        match self.proxy.upgrade() {
            Some(proxy) => {
                proxy.forward(location);
                true
            }
            None => false,
        }
    }
}
