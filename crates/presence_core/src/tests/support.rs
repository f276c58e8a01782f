use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use presence_client::{PresenceConnector, PresenceSession};
use shared::{
    domain::{Address, FocusChange, FunctionInfo, PresencePayload},
    error::PresenceError,
};

use crate::{
    clock::Clock,
    config::PresenceSettings,
    controller::PresenceController,
    events::UpdateOutcome,
    host::{FocusListener, HookHandle, HostEventSource, HostIntrospection},
    service::PresenceService,
    timer::{TimerCallback, TimerFacility, TimerHandle},
};

pub const MAIN: u64 = 0x1010;
pub const MAIN_OTHER: u64 = 0x10f0;
pub const PARSE_HEADER: u64 = 0x2040;
pub const DECRYPT: u64 = 0x3008;
pub const DATA: u64 = 0x9000;

pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        let epoch = Utc
            .timestamp_opt(1_700_000_000, 0)
            .single()
            .expect("valid timestamp");
        Arc::new(Self {
            now: Mutex::new(epoch),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += TimeDelta::from_std(by).expect("delta");
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

#[derive(Default)]
struct ConnectorLog {
    connect_attempts: u32,
    closes: u32,
    payloads: Vec<PresencePayload>,
}

pub struct RecordingConnector {
    log: Arc<Mutex<ConnectorLog>>,
    fail_connect: bool,
    fail_updates: Arc<Mutex<bool>>,
}

impl RecordingConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(ConnectorLog::default())),
            fail_connect: false,
            fail_updates: Arc::new(Mutex::new(false)),
        })
    }

    pub fn failing_connect() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(ConnectorLog::default())),
            fail_connect: true,
            fail_updates: Arc::new(Mutex::new(false)),
        })
    }

    pub fn set_fail_updates(&self, fail: bool) {
        *self.fail_updates.lock().expect("flag lock") = fail;
    }

    pub fn connect_attempts(&self) -> u32 {
        self.log.lock().expect("log lock").connect_attempts
    }

    pub fn closes(&self) -> u32 {
        self.log.lock().expect("log lock").closes
    }

    pub fn payloads(&self) -> Vec<PresencePayload> {
        self.log.lock().expect("log lock").payloads.clone()
    }

    pub fn states(&self) -> Vec<String> {
        self.payloads()
            .into_iter()
            .map(|payload| payload.state)
            .collect()
    }
}

impl PresenceConnector for RecordingConnector {
    fn connect(&self, _client_id: &str) -> Result<Box<dyn PresenceSession>, PresenceError> {
        self.log.lock().expect("log lock").connect_attempts += 1;
        if self.fail_connect {
            return Err(PresenceError::connect("could not find discord ipc pipe"));
        }
        Ok(Box::new(RecordingSession {
            log: Arc::clone(&self.log),
            fail_updates: Arc::clone(&self.fail_updates),
        }))
    }
}

struct RecordingSession {
    log: Arc<Mutex<ConnectorLog>>,
    fail_updates: Arc<Mutex<bool>>,
}

impl PresenceSession for RecordingSession {
    fn update(&mut self, payload: &PresencePayload) -> Result<(), PresenceError> {
        if *self.fail_updates.lock().expect("flag lock") {
            return Err(PresenceError::update("broken pipe"));
        }
        self.log
            .lock()
            .expect("log lock")
            .payloads
            .push(payload.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), PresenceError> {
        self.log.lock().expect("log lock").closes += 1;
        Ok(())
    }
}

#[derive(Default)]
struct FakeHostState {
    cursor: Option<Address>,
    listeners: Vec<(HookHandle, Arc<dyn FocusListener>)>,
    next_hook: u64,
    hooks: u32,
    unhooks: u32,
}

/// A binary with three functions and a data region.
pub struct FakeHost {
    functions: Vec<(u64, u64, &'static str)>,
    state: Mutex<FakeHostState>,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            functions: vec![
                (0x1000, 0x1100, "main"),
                (0x2000, 0x2200, "parse_header"),
                (0x3000, 0x3080, "decrypt"),
            ],
            state: Mutex::new(FakeHostState::default()),
        })
    }

    pub fn set_cursor(&self, address: u64) {
        self.state.lock().expect("host lock").cursor = Some(Address(address));
    }

    /// Moves the cursor and notifies every hooked listener, like the UI would.
    pub fn navigate(&self, address: u64) {
        let (previous, listeners) = {
            let mut state = self.state.lock().expect("host lock");
            let previous = state.cursor.replace(Address(address));
            let listeners: Vec<_> = state
                .listeners
                .iter()
                .map(|(_, listener)| Arc::clone(listener))
                .collect();
            (previous, listeners)
        };
        for listener in listeners {
            listener.screen_address_changed(FocusChange::new(Address(address), previous));
        }
    }

    pub fn hooks(&self) -> u32 {
        self.state.lock().expect("host lock").hooks
    }

    pub fn unhooks(&self) -> u32 {
        self.state.lock().expect("host lock").unhooks
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().expect("host lock").listeners.len()
    }
}

impl HostEventSource for FakeHost {
    fn hook_focus(&self, listener: Arc<dyn FocusListener>) -> HookHandle {
        let mut state = self.state.lock().expect("host lock");
        state.next_hook += 1;
        state.hooks += 1;
        let handle = HookHandle(state.next_hook);
        state.listeners.push((handle, listener));
        handle
    }

    fn unhook_focus(&self, handle: HookHandle) {
        let mut state = self.state.lock().expect("host lock");
        state.unhooks += 1;
        state.listeners.retain(|(hook, _)| *hook != handle);
    }
}

impl HostIntrospection for FakeHost {
    fn screen_address(&self) -> Option<Address> {
        self.state.lock().expect("host lock").cursor
    }

    fn function_containing(&self, address: Address) -> Option<FunctionInfo> {
        self.functions
            .iter()
            .find(|(start, end, _)| (*start..*end).contains(&address.0))
            .map(|(start, _, _)| FunctionInfo {
                start: Address(*start),
            })
    }

    fn name_at(&self, address: Address) -> Option<String> {
        self.functions
            .iter()
            .find(|(start, _, _)| *start == address.0)
            .map(|(_, _, name)| name.to_string())
    }

    fn root_filename(&self) -> String {
        "crackme.exe".to_string()
    }
}

struct ArmedTimer {
    due: DateTime<Utc>,
    callback: TimerCallback,
}

/// Timers that only fire when the test says so, against a [`ManualClock`].
pub struct ManualTimers {
    clock: Arc<ManualClock>,
    armed: Mutex<Vec<ArmedTimer>>,
    delays: Mutex<Vec<Duration>>,
}

impl ManualTimers {
    pub fn new(clock: Arc<ManualClock>) -> Arc<Self> {
        Arc::new(Self {
            clock,
            armed: Mutex::new(Vec::new()),
            delays: Mutex::new(Vec::new()),
        })
    }

    pub fn scheduled(&self) -> usize {
        self.delays.lock().expect("timer lock").len()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().expect("timer lock").clone()
    }

    pub fn armed(&self) -> usize {
        self.armed.lock().expect("timer lock").len()
    }

    /// Runs callbacks whose deadline has passed on the manual clock.
    pub fn fire_due(&self) -> usize {
        let now = self.clock.now();
        let due: Vec<ArmedTimer> = {
            let mut armed = self.armed.lock().expect("timer lock");
            let (due, pending): (Vec<_>, Vec<_>) =
                armed.drain(..).partition(|timer| timer.due <= now);
            *armed = pending;
            due
        };
        let fired = due.len();
        for timer in due {
            (timer.callback)();
        }
        fired
    }
}

impl TimerFacility for ManualTimers {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut delays = self.delays.lock().expect("timer lock");
        delays.push(delay);
        let handle = TimerHandle(delays.len() as u64);
        self.armed.lock().expect("timer lock").push(ArmedTimer {
            due: self.clock.now() + TimeDelta::from_std(delay).expect("delta"),
            callback,
        });
        handle
    }
}

pub struct Harness {
    pub service: PresenceService,
    pub host: Arc<FakeHost>,
    pub connector: Arc<RecordingConnector>,
    pub timers: Arc<ManualTimers>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(RecordingConnector::new(), PresenceSettings::default())
    }

    pub fn with(connector: Arc<RecordingConnector>, settings: PresenceSettings) -> Self {
        let host = FakeHost::new();
        let clock = ManualClock::new();
        let timers = ManualTimers::new(Arc::clone(&clock));
        let service = PresenceService::new(
            settings,
            connector.clone(),
            host.clone(),
            timers.clone(),
            clock.clone(),
        );
        Self {
            service,
            host,
            connector,
            timers,
            clock,
        }
    }

    pub fn controller(&mut self) -> &mut PresenceController {
        self.service.controller_mut()
    }

    pub fn advance_secs(&self, secs: u64) {
        self.clock.advance(Duration::from_secs(secs));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.clock.advance(Duration::from_millis(millis));
    }

    /// Moves the cursor and hands the notification straight to the controller.
    pub fn focus(&mut self, address: u64) -> UpdateOutcome {
        self.host.set_cursor(address);
        self.controller()
            .on_focus_changed(FocusChange::new(Address(address), None))
    }

    /// Fires every due timer and dispatches what they queued.
    pub fn fire_due_timers(&mut self) -> usize {
        self.timers.fire_due();
        self.service.pump()
    }
}
