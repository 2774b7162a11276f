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

//! Time helpers and the timer runtime shared by the locator managers.

use std::future::Future;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

/// Retrieves the current system time as a timestamp in milliseconds since UNIX EPOCH.
///
/// # Panics
///
/// Panics if the system time is set before the UNIX EPOCH (January 1, 1970).
pub(crate) fn get_current_timestamp() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(n) => n.as_millis() as i64,
        Err(_) => panic!("SystemTime before UNIX EPOCH!"),
    }
}

fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        match Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("locator_timer")
            .enable_time()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => panic!("build locator timer runtime failed {:?}", e),
        }
    })
}

/// Spawns a future on the timer runtime, returning a join handle.
///
/// The runtime is created on first use and lives for the rest of the
/// process. Abort the returned handle to cancel a pending timer.
pub(crate) fn runtime_spawn<F: Future<Output = ()> + Send + 'static>(fut: F) -> JoinHandle<()> {
    runtime().spawn(fut)
}
