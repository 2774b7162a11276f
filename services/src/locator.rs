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

//! The locator service facade.
//!
//! [`LocatorService`] builds every manager once, wires them together and
//! exposes the entry points the transport layer and the system event
//! sources call into.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::Arc;

use crate::config::LocatorConfig;
use crate::error::ErrorCode;
use crate::manage::account::{AccountEvent, AccountTracker, DEFAULT_USER_ID};
use crate::manage::app_state::AppStateListener;
use crate::manage::background_proxy::BackgroundProxy;
use crate::manage::permission::PermissionUsage;
use crate::manage::report_manager::ReportManager;
use crate::manage::request_manager::{RequestManager, StartOutcome};
use crate::manage::self_request::{SelfLocationListener, SelfRequestManager};
use crate::request::config::{RequestConfig, RequestConfigBuilder};
use crate::request::identity::Identity;
use crate::request::location::Location;
use crate::request::provider::ProviderKind;
use crate::request::reason::LocationErr;
use crate::request::request::Request;
use crate::service::callback::{CallbackHandle, CallbackId, LocatorCallback};
use crate::service::interface::{
    DefaultHooks, FatalHandler, LocationGrant, LocatorHooks, PermissionOracle, ProcessExit,
    ProviderProxy, SwitchProvider, SwitchState,
};
use crate::sys_event::{LogSink, TelemetrySink};

/// The collaborators the locator core depends on.
pub struct Collaborators {
    /// Identity and permission oracle.
    pub oracle: Arc<dyn PermissionOracle>,
    /// Global location switch.
    pub switch: Arc<dyn SwitchProvider>,
    /// Deployment specific decision points.
    pub hooks: Arc<dyn LocatorHooks>,
    /// Telemetry destination.
    pub telemetry: Arc<dyn TelemetrySink>,
    /// Handler of unrecoverable faults.
    pub fatal: Arc<dyn FatalHandler>,
    /// Activation interface of every available provider.
    pub providers: HashMap<ProviderKind, Arc<dyn ProviderProxy>>,
}

impl Collaborators {
    /// Creates collaborators with default hooks, log telemetry and the
    /// process exiting fault handler.
    pub fn new(
        oracle: Arc<dyn PermissionOracle>,
        switch: Arc<dyn SwitchProvider>,
        providers: HashMap<ProviderKind, Arc<dyn ProviderProxy>>,
    ) -> Self {
        Self {
            oracle,
            switch,
            hooks: Arc::new(DefaultHooks),
            telemetry: Arc::new(LogSink),
            fatal: Arc::new(ProcessExit),
            providers,
        }
    }
}

/// No-op receiver for requests that never deliver, such as cache queries.
struct CacheQuery;

impl LocatorCallback for CacheQuery {
    fn on_location_report(&self, _location: &Location) -> bool {
        true
    }
}

/// The locator core, fully wired.
pub struct LocatorService {
    account: Arc<AccountTracker>,
    usage: Arc<PermissionUsage>,
    request_manager: Arc<RequestManager>,
    report_manager: Arc<ReportManager>,
    background_proxy: Arc<BackgroundProxy>,
    self_request: Arc<SelfRequestManager>,
    app_state: AppStateListener,
    oracle: Arc<dyn PermissionOracle>,
    switch: Arc<dyn SwitchProvider>,
}

impl LocatorService {
    /// Builds the locator core.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::collections::HashMap;
    /// use std::sync::Arc;
    ///
    /// use locator_server::config::LocatorConfigBuilder;
    /// use locator_server::request::identity::Identity;
    /// use locator_server::service::interface::{
    ///     LocationGrant, PermissionOracle, SwitchProvider, SwitchState,
    /// };
    /// use locator_server::{Collaborators, LocatorService};
    ///
    /// struct AllowAll;
    ///
    /// impl PermissionOracle for AllowAll {
    ///     fn location_grant(&self, _: &Identity) -> LocationGrant {
    ///         LocationGrant::Precise
    ///     }
    ///     fn has_background_grant(&self, _: &Identity) -> bool {
    ///         true
    ///     }
    ///     fn has_continuous_task(&self, _: &Identity) -> bool {
    ///         false
    ///     }
    ///     fn is_foreground(&self, _: &Identity) -> bool {
    ///         true
    ///     }
    ///     fn is_current_os_user(&self, _: &Identity) -> bool {
    ///         true
    ///     }
    ///     fn is_frozen(&self, _: u64) -> bool {
    ///         false
    ///     }
    /// }
    ///
    /// impl SwitchProvider for AllowAll {
    ///     fn switch_state(&self) -> SwitchState {
    ///         SwitchState::Enabled
    ///     }
    ///     fn is_switch_ignored(&self, _: &Identity) -> bool {
    ///         false
    ///     }
    /// }
    ///
    /// let config = LocatorConfigBuilder::new().reapply_interval(None).build();
    /// let collaborators = Collaborators::new(Arc::new(AllowAll), Arc::new(AllowAll), HashMap::new());
    /// let service = LocatorService::new(config, collaborators);
    /// println!("{}", service.dump());
    /// ```
    pub fn new(config: LocatorConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            oracle,
            switch,
            hooks,
            telemetry,
            fatal,
            providers,
        } = collaborators;
        let account = Arc::new(AccountTracker::new(DEFAULT_USER_ID));
        let usage = Arc::new(PermissionUsage::new(telemetry.clone()));
        let fallback = providers.get(&ProviderKind::Satellite).cloned();
        let request_manager = RequestManager::new(
            oracle.clone(),
            switch.clone(),
            hooks.clone(),
            telemetry.clone(),
            usage.clone(),
            providers,
        );
        let report_manager = Arc::new(ReportManager::new(
            config.clone(),
            request_manager.clone(),
            account.clone(),
            oracle.clone(),
            hooks,
            telemetry,
            fatal,
            usage.clone(),
            fallback,
        ));
        let background_proxy = BackgroundProxy::new(
            &config,
            account.foreground_user(),
            request_manager.clone(),
            report_manager.clone(),
            oracle.clone(),
        );
        request_manager.set_background_proxy(Arc::downgrade(&background_proxy));
        let self_request =
            SelfRequestManager::new(request_manager.clone(), config.self_request_timeout);
        let app_state = AppStateListener::new(request_manager.clone(), background_proxy.clone());
        if let Some(interval) = config.reapply_interval {
            request_manager.start_reapply(interval);
        }
        info!("locator service initialized");
        Self {
            account,
            usage,
            request_manager,
            report_manager,
            background_proxy,
            self_request,
            app_state,
            oracle,
            switch,
        }
    }

    /// Starts locating for `identity`, delivering through `callback`.
    ///
    /// Fails if the configuration is malformed, the switch is off for the
    /// requester or the requester holds no location grant.
    pub fn start_locating(
        &self,
        config: RequestConfig,
        callback: CallbackHandle,
        identity: Identity,
    ) -> Result<StartOutcome, ErrorCode> {
        if config.distance_interval < 0.0 || config.max_accuracy < 0.0 {
            error!("start locating with bad config {}", config);
            return Err(ErrorCode::ParameterCheck);
        }
        self.check_access(&identity)?;
        let request = Request::new(config, callback, identity);
        Ok(self.request_manager.start_locating(request))
    }

    /// Stops every request of `callback_id`.
    pub fn stop_locating(&self, callback_id: CallbackId) {
        self.request_manager.stop_locating(callback_id);
    }

    /// Feeds a provider report into the core.
    pub fn report_location(&self, location: &Location, provider: ProviderKind) {
        self.report_manager.on_report_location(location, provider);
    }

    /// Feeds a provider error into the core.
    pub fn report_location_error(
        &self,
        provider: ProviderKind,
        err: LocationErr,
        origin: Option<&str>,
    ) {
        self.report_manager.on_report_error(provider, err, origin);
    }

    /// Returns the freshest cached location `identity` may see.
    pub fn get_cache_location(&self, identity: Identity) -> Result<Location, ErrorCode> {
        self.check_access(&identity)?;
        let config = RequestConfigBuilder::new().fix_number(1).build();
        let request = Request::new(config, CallbackHandle::new(Arc::new(CacheQuery)), identity);
        self.report_manager
            .get_cache_location(&request)
            .ok_or(ErrorCode::LocatingCacheFailed)
    }

    fn check_access(&self, identity: &Identity) -> Result<(), ErrorCode> {
        if self.switch.switch_state() == SwitchState::Disabled
            && !self.switch.is_switch_ignored(identity)
        {
            info!("{} refused, switch off", identity);
            return Err(ErrorCode::SwitchOff);
        }
        if self.oracle.location_grant(identity) == LocationGrant::None {
            info!("{} refused, no location grant", identity);
            return Err(ErrorCode::Permission);
        }
        Ok(())
    }

    /// Requests one fix on behalf of the service itself.
    pub fn request_self_location(&self, listener: SelfLocationListener) {
        self.self_request.request_self_location(listener);
    }

    /// Handles a foreground or background transition.
    pub fn on_app_state_changed(&self, uid: u64, pid: u64, foreground: bool) {
        self.app_state.on_app_state_changed(uid, pid, foreground);
    }

    /// Handles a permission change of `token_id`.
    pub fn on_permission_changed(&self, token_id: u64) {
        self.background_proxy.on_permission_changed(token_id);
        self.request_manager.handle_permission_changed(token_id);
    }

    /// Handles a freeze or thaw of process `pid`.
    pub fn on_power_suspend_changed(&self, pid: u64, uid: u64, frozen: bool) {
        self.request_manager
            .handle_power_suspend_changed(pid, uid, frozen);
    }

    /// Handles a change of the global location switch.
    pub fn on_switch_changed(&self, state: SwitchState) {
        info!("location switch {:?}", state);
        self.request_manager.handle_request();
    }

    /// Handles an OS account event.
    pub fn on_account_event(&self, event: AccountEvent) {
        if !self.account.apply(event) {
            return;
        }
        match event {
            AccountEvent::Switched(user_id) => {
                self.background_proxy.on_user_switch(user_id);
                self.request_manager.handle_request();
            }
            AccountEvent::Removed(user_id) => {
                self.background_proxy.on_user_removed(user_id);
                self.request_manager.remove_user_requests(user_id);
            }
        }
    }

    /// Renders the registry and the background proxy state.
    pub fn dump(&self) -> String {
        let mut out = self.request_manager.dump();
        let _ = write!(out, "{}", self.background_proxy);
        let _ = writeln!(out, "foreground user: {}", self.account.foreground_user());
        out
    }

    /// Returns the request registry.
    pub fn request_manager(&self) -> &Arc<RequestManager> {
        &self.request_manager
    }

    /// Returns the report pipeline.
    pub fn report_manager(&self) -> &Arc<ReportManager> {
        &self.report_manager
    }

    /// Returns the background proxy.
    pub fn background_proxy(&self) -> &Arc<BackgroundProxy> {
        &self.background_proxy
    }

    /// Returns the self request manager.
    pub fn self_request(&self) -> &Arc<SelfRequestManager> {
        &self.self_request
    }

    /// Returns the permission usage bookkeeping.
    pub fn permission_usage(&self) -> &Arc<PermissionUsage> {
        &self.usage
    }

    /// Returns the account tracker.
    pub fn account(&self) -> &Arc<AccountTracker> {
        &self.account
    }
}
