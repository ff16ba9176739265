// ABOUTME: Scripted HTTP probe that records every requested URL.

use async_trait::async_trait;
use parking_lot::Mutex;
use shopstack::probe::{HttpProbe, ProbeError, ProbeOptions, ProbeResponse};

/// Answers every request with one status, or refuses the connection.
pub struct FakeProbe {
    status: Mutex<Option<u16>>,
    requests: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn answering(status: u16) -> Self {
        Self {
            status: Mutex::new(Some(status)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn refusing() -> Self {
        Self {
            status: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpProbe for FakeProbe {
    async fn get(&self, url: &str, _options: ProbeOptions) -> Result<ProbeResponse, ProbeError> {
        self.requests.lock().push(url.to_string());
        match *self.status.lock() {
            Some(status) => Ok(ProbeResponse { status }),
            None => Err(ProbeError::Connect(format!("connection refused: {url}"))),
        }
    }
}
