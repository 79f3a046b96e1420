//! Shared fixtures for lifecycle tests: an in-memory store and a scripted
//! clip vendor.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use inflio_core::clip::Clip;
use inflio_core::task::{default_tasks, TaskType};
use inflio_db::models::project::{CreateProject, Project};
use inflio_klap::{ClipVendor, JobPoll, JobState, KlapError};
use inflio_pipeline::{JobLifecycle, MemoryProjectStore, ProjectStore};

pub const SOURCE_URL: &str = "https://cdn.example.com/uploads/v.mp4";

/// One scripted answer to `poll_job`.
#[derive(Debug, Clone)]
pub enum PollStep {
    Processing(Option<u8>),
    Done(&'static str),
    Failed(&'static str),
    Unavailable,
    /// The vendor no longer knows the job.
    Gone,
}

/// A [`ClipVendor`] whose answers are set up by the test.
pub struct ScriptedVendor {
    job_id: String,
    submit_delay: Duration,
    fail_submit: Mutex<bool>,
    polls: Mutex<VecDeque<PollStep>>,
    folders: Mutex<HashMap<String, Vec<Clip>>>,
    pub submits: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub fetches: AtomicUsize,
}

impl ScriptedVendor {
    pub fn new(job_id: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            submit_delay: Duration::ZERO,
            fail_submit: Mutex::new(false),
            polls: Mutex::new(VecDeque::new()),
            folders: Mutex::new(HashMap::new()),
            submits: AtomicUsize::new(0),
            poll_calls: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn fail_submits(&self, fail: bool) {
        *self.fail_submit.lock().unwrap() = fail;
    }

    pub fn push_poll(&self, step: PollStep) {
        self.polls.lock().unwrap().push_back(step);
    }

    pub fn put_folder(&self, folder_id: &str, clips: Vec<Clip>) {
        self.folders
            .lock()
            .unwrap()
            .insert(folder_id.to_string(), clips);
    }

    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

fn unavailable() -> KlapError {
    KlapError::ApiError {
        status: 503,
        body: "upstream unavailable".into(),
    }
}

#[async_trait]
impl ClipVendor for ScriptedVendor {
    async fn submit_job(&self, _source_url: &str) -> Result<String, KlapError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }
        if *self.fail_submit.lock().unwrap() {
            return Err(unavailable());
        }
        Ok(self.job_id.clone())
    }

    async fn poll_job(&self, _external_job_id: &str) -> Result<JobPoll, KlapError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PollStep::Processing(None));
        let poll = match step {
            PollStep::Processing(progress) => JobPoll {
                state: JobState::Processing,
                result_ref: None,
                progress,
                error: None,
            },
            PollStep::Done(folder) => JobPoll {
                state: JobState::Done,
                result_ref: Some(folder.to_string()),
                progress: Some(100),
                error: None,
            },
            PollStep::Failed(message) => JobPoll {
                state: JobState::Failed,
                result_ref: None,
                progress: None,
                error: Some(message.to_string()),
            },
            PollStep::Unavailable => return Err(unavailable()),
            PollStep::Gone => {
                return Err(KlapError::ApiError {
                    status: 404,
                    body: "project not found".into(),
                })
            }
        };
        Ok(poll)
    }

    async fn fetch_results(&self, result_ref: &str) -> Result<Vec<Clip>, KlapError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.folders
            .lock()
            .unwrap()
            .get(result_ref)
            .cloned()
            .ok_or_else(|| KlapError::ApiError {
                status: 404,
                body: format!("folder {result_ref} not found"),
            })
    }
}

pub fn clip(id: &str) -> Clip {
    Clip {
        id: id.to_string(),
        title: format!("Clip {id}"),
        description: None,
        start_time: 0.0,
        end_time: 30.0,
        duration: 30.0,
        thumbnail: None,
        score: 0.7,
        score_explanation: None,
        export_url: Some(format!("https://cdn.example.com/clips/{id}.mp4")),
        created_at: chrono::Utc::now(),
    }
}

pub fn clips(ids: &[&str]) -> Vec<Clip> {
    ids.iter().map(|id| clip(id)).collect()
}

pub struct Harness {
    pub store: Arc<MemoryProjectStore>,
    pub vendor: Arc<ScriptedVendor>,
    pub lifecycle: Arc<JobLifecycle>,
}

pub fn harness(vendor: ScriptedVendor) -> Harness {
    let store = Arc::new(MemoryProjectStore::new());
    let vendor = Arc::new(vendor);
    let lifecycle = Arc::new(JobLifecycle::new(
        store.clone(),
        Some(vendor.clone() as Arc<dyn ClipVendor>),
    ));
    Harness {
        store,
        vendor,
        lifecycle,
    }
}

/// Create a project that tracks the given task types.
pub async fn create_project(store: &MemoryProjectStore, task_types: &[TaskType]) -> Project {
    let input = CreateProject {
        title: "Launch keynote".to_string(),
        description: None,
        video_url: SOURCE_URL.to_string(),
        thumbnail_url: None,
        tasks: Some(task_types.to_vec()),
    };
    store
        .create("user_1", &input, default_tasks(task_types))
        .await
        .unwrap()
}

pub async fn reload(store: &MemoryProjectStore, id: i64) -> Project {
    store.find(id).await.unwrap().unwrap()
}
