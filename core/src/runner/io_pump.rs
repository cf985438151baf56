use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::util::RingBytes;

/// Drains a child's output stream into a bounded ring. Output is kept for
/// diagnostics only and never forwarded to the caller's stdio.
pub fn pump_into_ring<R>(mut rd: R, ring: Arc<RingBytes>, label: &'static str) -> JoinHandle<u64>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; 16 * 1024];
        let mut total = 0u64;

        loop {
            match rd.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    ring.push(&buf[..n]);
                    total += n as u64;
                }
                Err(e) => {
                    tracing::debug!(stream = label, error = %e, "output pump stopped");
                    break;
                }
            }
        }

        total
    })
}
