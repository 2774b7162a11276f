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

//! Location Service Decision Core.
//!
//! This crate arbitrates concurrent locating requests, decides which location
//! providers must run and filters, fuses and delivers provider reports to the
//! requesters.

#![cfg_attr(test, allow(clippy::redundant_clone))]
#![allow(unreachable_pub, clippy::new_without_default)]
#![warn(
    missing_docs,
    clippy::redundant_static_lifetimes,
    clippy::enum_variant_names,
    clippy::clone_on_copy
)]

#[macro_use]
mod macros;

#[macro_use]
extern crate log;

pub mod config;
pub mod error;
mod locator;
pub mod manage;
pub mod request;
pub mod service;
pub mod sys_event;
mod utils;

pub use locator::{Collaborators, LocatorService};
