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

//! The locating request entity.
//!
//! A [`Request`] is one subscription: who asks, what they ask for, where to
//! deliver, and the runtime state the managers keep for it. The identity,
//! configuration and callback never change after construction; the runtime
//! state lives behind the request's own mutex.

use std::fmt;
use std::sync::Mutex;
use std::time::Instant;

use locator_utils::session_id::SessionId;

use super::config::RequestConfig;
use super::identity::Identity;
use super::location::Location;
use super::provider::ProviderKind;
use super::reason::LocationErr;
use crate::manage::permission::UsageFlags;
use crate::service::callback::CallbackHandle;

/// Outcome of claiming one delivery of a counted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FixClaim {
    /// Deliver, more fixes may follow.
    Deliver,
    /// Deliver, this is the last fix.
    Last,
    /// Every fix was already delivered.
    Exhausted,
}

#[derive(Default)]
struct RequestState {
    requesting: bool,
    in_plan: bool,
    last_location: Option<Location>,
    best_location: Option<Location>,
    usage: UsageFlags,
    last_error: Option<LocationErr>,
    delivered: u32,
}

/// One locating subscription.
pub struct Request {
    identity: Identity,
    config: RequestConfig,
    callback: CallbackHandle,
    session_id: SessionId,
    providers: Vec<ProviderKind>,
    created: Instant,
    internal: bool,
    state: Mutex<RequestState>,
}

impl Request {
    /// Creates a request with a freshly generated session id.
    pub fn new(config: RequestConfig, callback: CallbackHandle, identity: Identity) -> Self {
        let providers = config.providers();
        Self {
            identity,
            config,
            callback,
            session_id: SessionId::generate(),
            providers,
            created: Instant::now(),
            internal: false,
            state: Mutex::new(RequestState::default()),
        }
    }

    /// Creates a request owned by the locator service itself.
    pub(crate) fn internal(config: RequestConfig, callback: CallbackHandle) -> Self {
        let mut request = Self::new(config, callback, Identity::locator_service());
        request.internal = true;
        request
    }

    /// Returns the requester identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Returns the callback handle.
    pub fn callback(&self) -> &CallbackHandle {
        &self.callback
    }

    /// Returns the session id.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Returns the providers serving this request.
    pub fn providers(&self) -> &[ProviderKind] {
        &self.providers
    }

    /// Whether the locator service itself owns this request.
    pub fn is_internal(&self) -> bool {
        self.internal
    }

    /// Whether the request is active.
    pub fn is_requesting(&self) -> bool {
        self.state.lock().unwrap().requesting
    }

    pub(crate) fn set_requesting(&self, requesting: bool) {
        self.state.lock().unwrap().requesting = requesting;
    }

    /// Returns the last location delivered to the requester.
    pub fn last_location(&self) -> Option<Location> {
        self.state.lock().unwrap().last_location.clone()
    }

    pub(crate) fn set_last_location(&self, location: Location) {
        self.state.lock().unwrap().last_location = Some(location);
    }

    /// Returns the best fused location.
    pub fn best_location(&self) -> Option<Location> {
        self.state.lock().unwrap().best_location.clone()
    }

    pub(crate) fn set_best_location(&self, location: Location) {
        self.state.lock().unwrap().best_location = Some(location);
    }

    /// Whether a counted request ran past its timeout at `now`.
    pub fn is_timed_out(&self, now: Instant) -> bool {
        if self.config.is_continuous() {
            return false;
        }
        match self.config.timeout {
            Some(timeout) => now.saturating_duration_since(self.created) > timeout,
            None => false,
        }
    }

    /// Returns the last error reported to the requester.
    pub fn last_error(&self) -> Option<LocationErr> {
        self.state.lock().unwrap().last_error
    }

    /// Records `err` as reported. Returns `false` if it repeats the last one.
    pub(crate) fn record_error(&self, err: LocationErr) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.last_error == Some(err) {
            return false;
        }
        state.last_error = Some(err);
        true
    }

    pub(crate) fn clear_error(&self) {
        self.state.lock().unwrap().last_error = None;
    }

    /// Whether the request currently contributes to its providers' plans.
    pub fn is_in_plan(&self) -> bool {
        self.state.lock().unwrap().in_plan
    }

    /// Marks the request as contributing. Returns `true` on the transition.
    pub(crate) fn enter_plan(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        !std::mem::replace(&mut state.in_plan, true)
    }

    /// Marks the request as not contributing. Returns `true` on the transition.
    pub(crate) fn leave_plan(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        std::mem::replace(&mut state.in_plan, false)
    }

    /// Returns the permissions the request currently charges.
    pub fn usage(&self) -> UsageFlags {
        self.state.lock().unwrap().usage
    }

    pub(crate) fn swap_usage(&self, usage: UsageFlags) -> UsageFlags {
        std::mem::replace(&mut self.state.lock().unwrap().usage, usage)
    }

    /// Claims one delivery. A counted request stops requesting once its
    /// last fix is claimed, so concurrent reports cannot over-deliver.
    pub(crate) fn claim_fix(&self) -> FixClaim {
        let mut state = self.state.lock().unwrap();
        if self.config.is_continuous() {
            state.delivered = state.delivered.saturating_add(1);
            return FixClaim::Deliver;
        }
        if state.delivered >= self.config.fix_number || !state.requesting {
            return FixClaim::Exhausted;
        }
        state.delivered += 1;
        if state.delivered == self.config.fix_number {
            state.requesting = false;
            FixClaim::Last
        } else {
            FixClaim::Deliver
        }
    }

    /// Returns a claim whose delivery failed.
    pub(crate) fn release_fix(&self) {
        let mut state = self.state.lock().unwrap();
        if self.config.is_continuous() || state.delivered == 0 {
            return;
        }
        state.delivered -= 1;
        state.requesting = true;
    }

    /// Number of delivered fixes.
    pub fn delivered(&self) -> u32 {
        self.state.lock().unwrap().delivered
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        write!(
            f,
            "Request[session:{} {} callback:{} {} providers:{:?} requesting:{} in_plan:{} delivered:{}",
            self.session_id.brief(),
            self.identity,
            self.callback.id(),
            self.config,
            self.providers,
            state.requesting,
            state.in_plan,
            state.delivered
        )?;
        if let Some(err) = state.last_error {
            write!(f, " last_error:{:?}", err)?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
