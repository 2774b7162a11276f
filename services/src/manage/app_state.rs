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

//! Application state monitoring.
//!
//! Foreground and background transitions of requesting processes decide
//! whether their requests are shadowed by the background proxy, and always
//! trigger a work record recomputation.

use std::sync::Arc;

use super::background_proxy::BackgroundProxy;
use super::request_manager::RequestManager;

/// Forwards application state transitions to the managers.
pub struct AppStateListener {
    request_manager: Arc<RequestManager>,
    background_proxy: Arc<BackgroundProxy>,
}

impl AppStateListener {
    pub(crate) fn new(
        request_manager: Arc<RequestManager>,
        background_proxy: Arc<BackgroundProxy>,
    ) -> Self {
        Self {
            request_manager,
            background_proxy,
        }
    }

    /// Handles a transition of process `pid` running as `uid`.
    ///
    /// # Arguments
    ///
    /// * `uid` - Uid of the process.
    /// * `pid` - Process id.
    /// * `foreground` - Whether the process moved to the foreground.
    pub fn on_app_state_changed(&self, uid: u64, pid: u64, foreground: bool) {
        let requests = self.request_manager.requests_of_process(uid, pid);
        if requests.is_empty() {
            debug!("app state of uid {} pid {} not relevant", uid, pid);
            return;
        }
        info!(
            "app uid {} pid {} {}, {} requests",
            uid,
            pid,
            if foreground { "foreground" } else { "background" },
            requests.len()
        );
        for request in requests.iter() {
            self.background_proxy.on_suspend(request, foreground);
        }
        self.request_manager.handle_request();
    }
}
