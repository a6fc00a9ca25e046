//! In-memory engine double for tests.
//!
//! Records every capability call, tracks which handles are alive, and
//! lets tests inject failures at each creation/startup site. Lives
//! behind the `mock` feature so downstream crates can use it from
//! their dev-dependencies.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
    AudioContextInfo, EncoderId, MediaEngine, OutputId, ServiceId, VideoContextInfo,
};

#[derive(Default)]
struct MockState {
    started: bool,
    startup_calls: u32,
    shutdown_calls: u32,

    // Failure injection.
    fail_startup: bool,
    audio_status: i32,
    video_status: i32,
    failing_encoder_ids: HashSet<String>,
    fail_service_create: bool,
    fail_output_create: bool,
    fail_output_start: bool,
    output_error: Option<String>,

    // Recorded configuration calls.
    data_paths: Vec<PathBuf>,
    module_paths: Vec<(PathBuf, PathBuf)>,
    modules_loaded: bool,
    post_load_calls: u32,
    audio_info: Option<AudioContextInfo>,
    video_info: Option<VideoContextInfo>,

    // Handle accounting.
    next_id: u64,
    encoders: HashSet<u64>,
    services: HashSet<u64>,
    outputs: HashSet<u64>,
    running_outputs: HashSet<u64>,
    encoders_created: u32,
    services_created: u32,
    outputs_created: u32,
    bound_audio: HashSet<u64>,
    bound_video: HashSet<u64>,
    service_settings: HashMap<u64, serde_json::Value>,
    output_video: HashMap<u64, EncoderId>,
    output_audio: HashMap<(u64, usize), EncoderId>,
    output_service: HashMap<u64, ServiceId>,
    stop_calls: HashMap<u64, u32>,
    start_calls: HashMap<u64, u32>,
    last_service: Option<u64>,
    last_output: Option<u64>,
    released_while_running: HashSet<u64>,
    double_released: bool,

    call_log: Vec<&'static str>,
}

/// A scriptable [`MediaEngine`] implementation.
pub struct MockEngine {
    state: Mutex<MockState>,
}

impl MockEngine {
    /// A fresh engine that has not been started.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(MockState::default()),
        })
    }

    /// A fresh engine already started with the default locale.
    pub fn started() -> Arc<Self> {
        let engine = Self::new();
        assert!(engine.startup("en-US"));
        engine
    }

    /// Make the next `startup` call refuse.
    pub fn fail_startup(&self) {
        self.state.lock().fail_startup = true;
    }

    /// Status code the next audio context reset returns.
    pub fn set_audio_status(&self, status: i32) {
        self.state.lock().audio_status = status;
    }

    /// Status code the next video context reset returns.
    pub fn set_video_status(&self, status: i32) {
        self.state.lock().video_status = status;
    }

    /// Make creation of the named encoder id return null.
    pub fn fail_encoder(&self, id: &str) {
        self.state.lock().failing_encoder_ids.insert(id.to_string());
    }

    /// Make service creation return null.
    pub fn fail_service_create(&self) {
        self.state.lock().fail_service_create = true;
    }

    /// Make output creation return null.
    pub fn fail_output_create(&self) {
        self.state.lock().fail_output_create = true;
    }

    /// Make `start_output` refuse, optionally with a last-error string.
    pub fn fail_output_start(&self, error: Option<String>) {
        let mut state = self.state.lock();
        state.fail_output_start = true;
        state.output_error = error;
    }

    /// Undo [`MockEngine::fail_encoder`] injections.
    pub fn clear_encoder_failures(&self) {
        self.state.lock().failing_encoder_ids.clear();
    }

    /// Undo [`MockEngine::fail_output_create`].
    pub fn clear_output_create_failure(&self) {
        self.state.lock().fail_output_create = false;
    }

    /// Id handed out by the most recent service creation.
    pub fn last_service(&self) -> Option<ServiceId> {
        self.state.lock().last_service.map(ServiceId)
    }

    /// Id handed out by the most recent output creation.
    pub fn last_output(&self) -> Option<OutputId> {
        self.state.lock().last_output.map(OutputId)
    }

    pub fn is_started(&self) -> bool {
        self.state.lock().started
    }

    pub fn startup_calls(&self) -> u32 {
        self.state.lock().startup_calls
    }

    pub fn shutdown_calls(&self) -> u32 {
        self.state.lock().shutdown_calls
    }

    pub fn data_paths(&self) -> Vec<PathBuf> {
        self.state.lock().data_paths.clone()
    }

    pub fn module_paths(&self) -> Vec<(PathBuf, PathBuf)> {
        self.state.lock().module_paths.clone()
    }

    pub fn modules_loaded(&self) -> bool {
        self.state.lock().modules_loaded
    }

    pub fn post_load_calls(&self) -> u32 {
        self.state.lock().post_load_calls
    }

    pub fn audio_info(&self) -> Option<AudioContextInfo> {
        self.state.lock().audio_info
    }

    pub fn video_info(&self) -> Option<VideoContextInfo> {
        self.state.lock().video_info.clone()
    }

    /// Count of encoder handles currently alive.
    pub fn alive_encoders(&self) -> usize {
        self.state.lock().encoders.len()
    }

    /// Count of service handles currently alive.
    pub fn alive_services(&self) -> usize {
        self.state.lock().services.len()
    }

    /// Count of output handles currently alive.
    pub fn alive_outputs(&self) -> usize {
        self.state.lock().outputs.len()
    }

    pub fn encoders_created(&self) -> u32 {
        self.state.lock().encoders_created
    }

    pub fn services_created(&self) -> u32 {
        self.state.lock().services_created
    }

    pub fn outputs_created(&self) -> u32 {
        self.state.lock().outputs_created
    }

    /// Whether an encoder was bound to the global audio context.
    pub fn audio_bound(&self, encoder: EncoderId) -> bool {
        self.state.lock().bound_audio.contains(&encoder.0)
    }

    /// Whether an encoder was bound to the global video context.
    pub fn video_bound(&self, encoder: EncoderId) -> bool {
        self.state.lock().bound_video.contains(&encoder.0)
    }

    /// Settings the given service was created with.
    pub fn service_settings(&self, service: ServiceId) -> Option<serde_json::Value> {
        self.state.lock().service_settings.get(&service.0).cloned()
    }

    /// Video encoder attached to an output.
    pub fn output_video_encoder(&self, output: OutputId) -> Option<EncoderId> {
        self.state.lock().output_video.get(&output.0).copied()
    }

    /// Audio encoder attached to an output on the given track.
    pub fn output_audio_encoder(&self, output: OutputId, track: usize) -> Option<EncoderId> {
        self.state.lock().output_audio.get(&(output.0, track)).copied()
    }

    /// Service bound to an output.
    pub fn output_bound_service(&self, output: OutputId) -> Option<ServiceId> {
        self.state.lock().output_service.get(&output.0).copied()
    }

    pub fn output_running(&self, output: OutputId) -> bool {
        self.state.lock().running_outputs.contains(&output.0)
    }

    pub fn start_calls(&self, output: OutputId) -> u32 {
        self.state
            .lock()
            .start_calls
            .get(&output.0)
            .copied()
            .unwrap_or(0)
    }

    pub fn stop_calls(&self, output: OutputId) -> u32 {
        self.state
            .lock()
            .stop_calls
            .get(&output.0)
            .copied()
            .unwrap_or(0)
    }

    /// Whether an output was released while still transmitting.
    pub fn released_while_running(&self, output: OutputId) -> bool {
        self.state.lock().released_while_running.contains(&output.0)
    }

    /// Whether any handle was released twice or while unknown.
    pub fn double_released(&self) -> bool {
        self.state.lock().double_released
    }

    /// Coarse sequence of capability calls, for ordering assertions.
    pub fn call_log(&self) -> Vec<&'static str> {
        self.state.lock().call_log.clone()
    }
}

impl MediaEngine for MockEngine {
    fn startup(&self, _locale: &str) -> bool {
        let mut state = self.state.lock();
        state.startup_calls += 1;
        state.call_log.push("startup");
        if state.fail_startup || state.started {
            return false;
        }
        state.started = true;
        true
    }

    fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown_calls += 1;
        state.call_log.push("shutdown");
        state.started = false;
    }

    fn version_string(&self) -> Option<String> {
        let state = self.state.lock();
        state.started.then(|| "31.0.0-mock".to_string())
    }

    fn add_data_path(&self, path: &Path) {
        let mut state = self.state.lock();
        state.call_log.push("add_data_path");
        state.data_paths.push(path.to_path_buf());
    }

    fn reset_audio(&self, info: &AudioContextInfo) -> i32 {
        let mut state = self.state.lock();
        state.call_log.push("reset_audio");
        if state.audio_status == 0 {
            state.audio_info = Some(*info);
        }
        state.audio_status
    }

    fn reset_video(&self, info: &VideoContextInfo) -> i32 {
        let mut state = self.state.lock();
        state.call_log.push("reset_video");
        if state.video_status == 0 {
            state.video_info = Some(info.clone());
        }
        state.video_status
    }

    fn add_module_path(&self, bin_path: &Path, data_path: &Path) {
        let mut state = self.state.lock();
        state.call_log.push("add_module_path");
        state
            .module_paths
            .push((bin_path.to_path_buf(), data_path.to_path_buf()));
    }

    fn load_all_modules(&self) {
        let mut state = self.state.lock();
        state.call_log.push("load_all_modules");
        state.modules_loaded = true;
    }

    fn loaded_modules(&self) -> Vec<String> {
        let state = self.state.lock();
        if state.modules_loaded {
            vec!["mock-aac".to_string(), "mock-x264".to_string()]
        } else {
            Vec::new()
        }
    }

    fn post_load_modules(&self) {
        let mut state = self.state.lock();
        state.call_log.push("post_load_modules");
        state.post_load_calls += 1;
    }

    fn create_audio_encoder(&self, id: &str, _name: &str) -> Option<EncoderId> {
        let mut state = self.state.lock();
        state.call_log.push("create_audio_encoder");
        if state.failing_encoder_ids.contains(id) {
            return None;
        }
        state.next_id += 1;
        state.encoders_created += 1;
        let raw = state.next_id;
        state.encoders.insert(raw);
        Some(EncoderId(raw))
    }

    fn create_video_encoder(&self, id: &str, _name: &str) -> Option<EncoderId> {
        let mut state = self.state.lock();
        state.call_log.push("create_video_encoder");
        if state.failing_encoder_ids.contains(id) {
            return None;
        }
        state.next_id += 1;
        state.encoders_created += 1;
        let raw = state.next_id;
        state.encoders.insert(raw);
        Some(EncoderId(raw))
    }

    fn bind_audio_encoder(&self, encoder: EncoderId) {
        let mut state = self.state.lock();
        state.call_log.push("bind_audio_encoder");
        state.bound_audio.insert(encoder.0);
    }

    fn bind_video_encoder(&self, encoder: EncoderId) {
        let mut state = self.state.lock();
        state.call_log.push("bind_video_encoder");
        state.bound_video.insert(encoder.0);
    }

    fn release_encoder(&self, encoder: EncoderId) {
        let mut state = self.state.lock();
        state.call_log.push("release_encoder");
        if !state.encoders.remove(&encoder.0) {
            state.double_released = true;
        }
    }

    fn create_service(
        &self,
        _kind: &str,
        _name: &str,
        settings: &serde_json::Value,
    ) -> Option<ServiceId> {
        let mut state = self.state.lock();
        state.call_log.push("create_service");
        if state.fail_service_create {
            return None;
        }
        state.next_id += 1;
        state.services_created += 1;
        let raw = state.next_id;
        state.services.insert(raw);
        state.service_settings.insert(raw, settings.clone());
        state.last_service = Some(raw);
        Some(ServiceId(raw))
    }

    fn release_service(&self, service: ServiceId) {
        let mut state = self.state.lock();
        state.call_log.push("release_service");
        if !state.services.remove(&service.0) {
            state.double_released = true;
        }
        state.service_settings.remove(&service.0);
    }

    fn create_output(&self, _kind: &str, _name: &str) -> Option<OutputId> {
        let mut state = self.state.lock();
        state.call_log.push("create_output");
        if state.fail_output_create {
            return None;
        }
        state.next_id += 1;
        state.outputs_created += 1;
        let raw = state.next_id;
        state.outputs.insert(raw);
        state.last_output = Some(raw);
        Some(OutputId(raw))
    }

    fn set_output_video_encoder(&self, output: OutputId, encoder: EncoderId) {
        let mut state = self.state.lock();
        state.call_log.push("set_output_video_encoder");
        state.output_video.insert(output.0, encoder);
    }

    fn set_output_audio_encoder(&self, output: OutputId, encoder: EncoderId, track: usize) {
        let mut state = self.state.lock();
        state.call_log.push("set_output_audio_encoder");
        state.output_audio.insert((output.0, track), encoder);
    }

    fn set_output_service(&self, output: OutputId, service: ServiceId) {
        let mut state = self.state.lock();
        state.call_log.push("set_output_service");
        state.output_service.insert(output.0, service);
    }

    fn start_output(&self, output: OutputId) -> bool {
        let mut state = self.state.lock();
        state.call_log.push("start_output");
        *state.start_calls.entry(output.0).or_insert(0) += 1;
        if state.fail_output_start {
            return false;
        }
        state.running_outputs.insert(output.0);
        true
    }

    fn stop_output(&self, output: OutputId) {
        let mut state = self.state.lock();
        state.call_log.push("stop_output");
        *state.stop_calls.entry(output.0).or_insert(0) += 1;
        state.running_outputs.remove(&output.0);
    }

    fn output_last_error(&self, _output: OutputId) -> Option<String> {
        self.state.lock().output_error.clone()
    }

    fn release_output(&self, output: OutputId) {
        let mut state = self.state.lock();
        state.call_log.push("release_output");
        if state.running_outputs.contains(&output.0) {
            state.released_while_running.insert(output.0);
        }
        if !state.outputs.remove(&output.0) {
            state.double_released = true;
        }
    }
}
