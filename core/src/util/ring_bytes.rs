use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Fixed-capacity byte buffer keeping the most recent `cap` bytes.
pub struct RingBytes {
    inner: Mutex<VecDeque<u8>>,
    cap: usize,
}

impl RingBytes {
    pub fn new(cap: usize) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(VecDeque::with_capacity(cap)),
            cap,
        })
    }

    pub fn push(&self, data: &[u8]) {
        let mut g = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let data = if data.len() > self.cap {
            &data[data.len() - self.cap..]
        } else {
            data
        };
        let overflow = g.len().saturating_add(data.len()).saturating_sub(self.cap);
        if overflow > 0 {
            g.drain(..overflow);
        }
        g.extend(data);
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let g = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        g.iter().copied().collect()
    }

    /// Lossy UTF-8 rendering with surrounding whitespace trimmed.
    pub fn tail_string(&self) -> String {
        String::from_utf8_lossy(&self.to_bytes()).trim().to_string()
    }
}
