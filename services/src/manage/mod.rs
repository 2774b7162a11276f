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

//! The decision core: request registry, report pipeline, fusion and the
//! background substitution layer.

pub mod account;
pub mod app_state;
pub mod background_proxy;
pub mod fusion;
pub mod permission;
pub mod report_manager;
pub mod request_manager;
pub mod self_request;
pub mod work_record;
