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

//! One-shot locating on behalf of the service itself.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;

use super::request_manager::RequestManager;
use crate::request::config::{Priority, RequestConfigBuilder};
use crate::request::location::Location;
use crate::request::request::Request;
use crate::service::callback::{CallbackHandle, CallbackId, LocatorCallback};
use crate::utils::runtime_spawn;

/// Receives the outcome of a self request, `None` on timeout.
pub type SelfLocationListener = Box<dyn FnOnce(Option<Location>) + Send>;

#[derive(Default)]
struct SelfInner {
    listeners: Vec<SelfLocationListener>,
    running: bool,
    current: Option<(CallbackId, JoinHandle<()>)>,
}

/// Runs internal one-shot requests. Concurrent callers share one request.
pub struct SelfRequestManager {
    inner: Mutex<SelfInner>,
    request_manager: Arc<RequestManager>,
    timeout: Duration,
    me: Weak<SelfRequestManager>,
}

impl SelfRequestManager {
    pub(crate) fn new(request_manager: Arc<RequestManager>, timeout: Duration) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            inner: Mutex::new(SelfInner::default()),
            request_manager,
            timeout,
            me: me.clone(),
        })
    }

    /// Requests one fix, calling `listener` with the first report or with
    /// `None` once the timeout elapsed.
    pub fn request_self_location(&self, listener: SelfLocationListener) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.listeners.push(listener);
            if inner.running {
                debug!("self request running, {} waiting", inner.listeners.len());
                return;
            }
            inner.running = true;
        }

        let callback = CallbackHandle::new(Arc::new(SelfCallback {
            manager: self.me.clone(),
        }));
        let callback_id = callback.id();
        {
            let mut inner = self.inner.lock().unwrap();
            let me = self.me.clone();
            let timeout = self.timeout;
            let timer = runtime_spawn(async move {
                tokio::time::sleep(timeout).await;
                if let Some(manager) = me.upgrade() {
                    info!("self request {} timed out", callback_id);
                    manager.finish(Some(callback_id), None);
                }
            });
            inner.current = Some((callback_id, timer));
        }

        let config = RequestConfigBuilder::new()
            .priority(Priority::Accuracy)
            .fix_number(1)
            .build();
        info!("start self request, callback {}", callback_id);
        self.request_manager
            .start_locating(Request::internal(config, callback));
    }

    /// Completes the running self request. `expected` restricts completion
    /// to one specific request.
    fn finish(&self, expected: Option<CallbackId>, location: Option<Location>) {
        let (callback_id, listeners) = {
            let mut inner = self.inner.lock().unwrap();
            match (&inner.current, expected) {
                (Some((current, _)), Some(expected)) if *current != expected => return,
                (None, _) => return,
                _ => {}
            }
            let Some((callback_id, timer)) = inner.current.take() else {
                return;
            };
            timer.abort();
            inner.running = false;
            (callback_id, std::mem::take(&mut inner.listeners))
        };
        self.request_manager.stop_locating(callback_id);
        for listener in listeners {
            listener(location.clone());
        }
    }

    /// Whether a self request is running.
    pub fn is_running(&self) -> bool {
        self.inner.lock().unwrap().running
    }
}

struct SelfCallback {
    manager: Weak<SelfRequestManager>,
}

impl LocatorCallback for SelfCallback {
    fn on_location_report(&self, location: &Location) -> bool {
        match self.manager.upgrade() {
            Some(manager) => {
                manager.finish(None, Some(location.clone()));
                true
            }
            None => false,
        }
    }
}
