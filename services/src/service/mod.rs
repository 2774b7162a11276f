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

//! Interfaces between the locator core and the outside world.
//!
//! The transport layer, location providers and the permission system live
//! outside the core; this module defines what the core expects from them
//! and what it hands back to requesters.

/// Requester callbacks and their liveness tracking.
pub mod callback;
/// Collaborator interfaces.
pub mod interface;
