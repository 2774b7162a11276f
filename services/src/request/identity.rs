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

//! Requester identity.

use std::fmt;

/// Uid the locator service itself runs with.
pub const LOCATOR_UID: u64 = 1021;

const LOCATOR_BUNDLE_NAME: &str = "locator_server";
const UID_PER_USER: u64 = 200000;

/// Who is asking for locations.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Identity {
    /// Process id of the requester.
    pub pid: u64,
    /// Uid of the requester.
    pub uid: u64,
    /// Security token of the requester.
    pub token_id: u64,
    /// Security token of the first caller in a call chain.
    pub first_token_id: u64,
    /// Bundle name of the requester.
    pub bundle_name: String,
}

impl Identity {
    /// Creates an identity.
    pub fn new(pid: u64, uid: u64, token_id: u64, bundle_name: &str) -> Self {
        Self {
            pid,
            uid,
            token_id,
            first_token_id: 0,
            bundle_name: bundle_name.to_string(),
        }
    }

    /// The identity of the locator service, used by its internal requests.
    pub(crate) fn locator_service() -> Self {
        Self::new(std::process::id() as u64, LOCATOR_UID, 0, LOCATOR_BUNDLE_NAME)
    }

    /// Returns the process id.
    pub fn pid(&self) -> u64 {
        self.pid
    }

    /// Returns the uid.
    pub fn uid(&self) -> u64 {
        self.uid
    }

    /// Returns the token id.
    pub fn token_id(&self) -> u64 {
        self.token_id
    }

    /// Returns the bundle name.
    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// Returns the OS user the uid belongs to.
    pub fn user_id(&self) -> u64 {
        self.uid / UID_PER_USER
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[pid:{} uid:{} token:{}]",
            self.bundle_name, self.pid, self.uid, self.token_id
        )
    }
}
