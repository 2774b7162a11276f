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

//! Multi-source fusion policy.
//!
//! Decides, per request, whether a newly arrived location replaces the
//! request's best location. A recent satellite fix dominates network fixes;
//! everything else is replaced by the newer location.

use std::sync::Arc;
use std::time::Duration;

use crate::request::location::Location;
use crate::service::interface::LocatorHooks;

/// Stateless fusion policy.
pub struct FusionController {
    window: Duration,
    hooks: Arc<dyn LocatorHooks>,
}

impl FusionController {
    pub(crate) fn new(window: Duration, hooks: Arc<dyn LocatorHooks>) -> Self {
        Self { window, hooks }
    }

    /// Returns the location that is authoritative for a request whose best
    /// location so far is `best`, after `location` arrived.
    ///
    /// # Arguments
    ///
    /// * `location` - The newly arrived location.
    /// * `best` - The request's best location, if any.
    pub fn get_fuse_location(&self, location: &Location, best: Option<&Location>) -> Location {
        let decided = match best {
            Some(best)
                if location.is_network()
                    && best.is_satellite()
                    && self.is_recent(location, best) =>
            {
                debug!(
                    "keep satellite fix, network fix arrived {}ns later",
                    location.time_since_boot - best.time_since_boot
                );
                best.clone()
            }
            _ => location.clone(),
        };
        match self.hooks.override_fusion(location, best, &decided) {
            Some(rewritten) => {
                info!("fusion outcome rewritten by hook");
                rewritten
            }
            None => decided,
        }
    }

    fn is_recent(&self, location: &Location, best: &Location) -> bool {
        let gap = location.time_since_boot.saturating_sub(best.time_since_boot);
        (gap as i128) < self.window.as_nanos() as i128
    }
}
