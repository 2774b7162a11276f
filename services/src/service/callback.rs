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

//! Requester callbacks.
//!
//! A [`CallbackHandle`] owns the requester's [`LocatorCallback`] together with
//! its liveness state. The transport layer calls
//! [`CallbackHandle::notify_died`] when the channel to the requester is lost;
//! the observer registered at subscription time then fires exactly once.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::request::location::Location;
use crate::request::reason::{LocatingStatus, LocationErr};

/// Receiver of locating results, implemented by the transport layer.
///
/// Every method reports whether the message reached the requester; a dead
/// channel returns `false` instead of panicking.
#[cfg_attr(test, mockall::automock)]
pub trait LocatorCallback: Send + Sync {
    /// Delivers a location.
    fn on_location_report(&self, location: &Location) -> bool;

    /// Delivers a locating session status change.
    fn on_locating_status_change(&self, _status: LocatingStatus) -> bool {
        true
    }

    /// Delivers a locating error.
    fn on_error_report(&self, _err: LocationErr) -> bool {
        true
    }
}

/// Identifies a callback. Requests registered with the same callback share
/// one id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct CallbackId(u64);

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type DeathObserver = Box<dyn FnOnce() + Send>;

struct Liveness {
    dead: AtomicBool,
    observer: Mutex<Option<DeathObserver>>,
}

/// An owned requester callback with liveness tracking.
#[derive(Clone)]
pub struct CallbackHandle {
    id: CallbackId,
    inner: Arc<dyn LocatorCallback>,
    liveness: Arc<Liveness>,
}

impl CallbackHandle {
    /// Wraps a callback into a handle with a fresh id.
    pub fn new(callback: Arc<dyn LocatorCallback>) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: CallbackId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
            inner: callback,
            liveness: Arc::new(Liveness {
                dead: AtomicBool::new(false),
                observer: Mutex::new(None),
            }),
        }
    }

    /// Returns the callback id.
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Whether the channel to the requester is still open.
    pub fn is_alive(&self) -> bool {
        !self.liveness.dead.load(Ordering::SeqCst)
    }

    /// Reports that the channel to the requester is lost.
    ///
    /// The death observer runs on the first call only.
    pub fn notify_died(&self) {
        if self.liveness.dead.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("callback {} died", self.id);
        let observer = self.liveness.observer.lock().unwrap().take();
        if let Some(observer) = observer {
            observer();
        }
    }

    /// Registers the death observer.
    ///
    /// Returns `false` if an observer is already registered. An observer
    /// registered after death runs immediately.
    pub(crate) fn link_to_death<F>(&self, observer: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let mut slot = self.liveness.observer.lock().unwrap();
        if slot.is_some() {
            return false;
        }
        if !self.is_alive() {
            drop(slot);
            observer();
            return true;
        }
        *slot = Some(Box::new(observer));
        true
    }

    pub(crate) fn on_location_report(&self, location: &Location) -> bool {
        self.is_alive() && self.inner.on_location_report(location)
    }

    pub(crate) fn on_locating_status_change(&self, status: LocatingStatus) -> bool {
        self.is_alive() && self.inner.on_locating_status_change(status)
    }

    pub(crate) fn on_error_report(&self, err: LocationErr) -> bool {
        self.is_alive() && self.inner.on_error_report(err)
    }
}

impl fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
