//! Shared test doubles
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use tfwrap::infrastructure::{CommandRunner, ProcessOutput, ProcessSpec};

/// Command runner that records every spec and replays queued responses.
///
/// With an empty queue it reports exit code 0 and empty captured text.
#[derive(Default)]
pub struct RecordingRunner {
    specs: Mutex<Vec<ProcessSpec>>,
    responses: Mutex<VecDeque<ProcessOutput>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, output: ProcessOutput) {
        self.responses.lock().unwrap().push_back(output);
    }

    pub fn respond_stdout(&self, code: i32, stdout: &str) {
        self.respond_with(ProcessOutput {
            code,
            stdout: Some(stdout.to_string()),
            stderr: Some(String::new()),
        });
    }

    pub fn recorded(&self) -> Vec<ProcessSpec> {
        self.specs.lock().unwrap().clone()
    }

    pub fn last_spec(&self) -> ProcessSpec {
        self.recorded().last().cloned().expect("no invocation recorded")
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, spec: &ProcessSpec) -> io::Result<ProcessOutput> {
        self.specs.lock().unwrap().push(spec.clone());
        let response = self.responses.lock().unwrap().pop_front();
        Ok(response.unwrap_or(ProcessOutput {
            code: 0,
            stdout: Some(String::new()),
            stderr: Some(String::new()),
        }))
    }
}
