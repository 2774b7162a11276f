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

//! Location providers and the policy choosing them.

use std::fmt;

use super::config::{Priority, Scenario};

/// A location source the core can activate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum ProviderKind {
    /// Satellite receiver.
    Satellite,
    /// Network-assisted positioning.
    Network,
    /// Opportunistic reuse of fixes requested by others.
    Passive,
}

/// Per-provider behavior.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProviderTraits {
    /// Reports carry the session id of the request they answer, and are
    /// routed to that request only.
    pub routes_by_session: bool,
    /// Work entries carry the session id of their request.
    pub tags_work_entries: bool,
    /// Accepted reports refresh the cross-provider last location.
    pub updates_last_location: bool,
    /// Accepted reports go through the external cache validity hook first.
    pub validates_cache: bool,
}

impl ProviderKind {
    /// Every provider, in activation order.
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::Satellite,
        ProviderKind::Network,
        ProviderKind::Passive,
    ];

    /// Returns the provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Satellite => "gps",
            ProviderKind::Network => "network",
            ProviderKind::Passive => "passive",
        }
    }

    /// Returns the behavior table entry of this provider.
    pub fn traits(&self) -> ProviderTraits {
        match self {
            ProviderKind::Satellite => ProviderTraits {
                routes_by_session: false,
                tags_work_entries: false,
                updates_last_location: false,
                validates_cache: true,
            },
            ProviderKind::Network => ProviderTraits {
                routes_by_session: true,
                tags_work_entries: true,
                updates_last_location: true,
                validates_cache: false,
            },
            ProviderKind::Passive => ProviderTraits {
                routes_by_session: false,
                tags_work_entries: false,
                updates_last_location: false,
                validates_cache: false,
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chooses the providers serving a request, in order.
///
/// Navigation-like scenarios use satellite and network, power saving
/// scenarios use network only and the no-power scenario uses passive only.
/// Without a scenario the priority decides; an unset priority is treated as
/// first fix.
///
/// # Examples
///
/// ```rust
/// use locator_server::request::config::{Priority, Scenario};
/// use locator_server::request::provider::{select_providers, ProviderKind};
///
/// assert_eq!(
///     select_providers(Scenario::DailyLifeService, Priority::Accuracy),
///     vec![ProviderKind::Network]
/// );
/// ```
pub fn select_providers(scenario: Scenario, priority: Priority) -> Vec<ProviderKind> {
    match scenario {
        Scenario::Navigation
        | Scenario::TrajectoryTracking
        | Scenario::CarHailing
        | Scenario::Sport
        | Scenario::Transport
        | Scenario::HighPowerConsumption => vec![ProviderKind::Satellite, ProviderKind::Network],
        Scenario::DailyLifeService | Scenario::LowPowerConsumption => vec![ProviderKind::Network],
        Scenario::NoPower => vec![ProviderKind::Passive],
        Scenario::Unset => match priority {
            Priority::LowPower => vec![ProviderKind::Network],
            Priority::Accuracy | Priority::FirstFix | Priority::Unset => {
                vec![ProviderKind::Satellite, ProviderKind::Network]
            }
        },
    }
}
