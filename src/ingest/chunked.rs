use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::IngestError;

/// Cooperative cancellation handle for an in-progress import.
///
/// Checked at chunk boundaries only; cancelling mid-chunk takes effect before
/// the next chunk starts. A cancelled import discards all partial results.
#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Progress reporter that clamps to a monotonic 0-100 ramp across strategy
/// retries.
pub(crate) struct Progress<'a> {
    callback: &'a mut dyn FnMut(u8),
    last: u8,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(callback: &'a mut dyn FnMut(u8)) -> Self {
        Self { callback, last: 0 }
    }

    pub(crate) fn report(&mut self, pct: u8) {
        let pct = pct.min(100).max(self.last);
        self.last = pct;
        (self.callback)(pct);
    }
}

/// Run `parse_chunk` over `rows` in chunks, checking cancellation before each
/// chunk, reporting progress after each chunk, and yielding between chunks so
/// a long import never monopolizes the executor.
pub(crate) async fn process_in_chunks<T>(
    rows: &[Vec<String>],
    chunk_size: usize,
    cancel: &CancelToken,
    progress: &mut Progress<'_>,
    mut parse_chunk: impl FnMut(&[Vec<String>], usize) -> Vec<T>,
) -> Result<Vec<T>, IngestError> {
    let chunk_size = chunk_size.max(1);
    let total_chunks = rows.len().div_ceil(chunk_size).max(1);
    let mut out = Vec::new();

    for (index, chunk) in rows.chunks(chunk_size).enumerate() {
        if cancel.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        out.extend(parse_chunk(chunk, index * chunk_size));
        progress.report((((index + 1) * 100) / total_chunks) as u8);

        if index + 1 < total_chunks {
            tokio::task::yield_now().await;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<Vec<String>> {
        (0..n).map(|i| vec![i.to_string()]).collect()
    }

    #[tokio::test]
    async fn reports_monotonic_progress() {
        let mut seen = Vec::new();
        let mut cb = |p: u8| seen.push(p);
        let mut progress = Progress::new(&mut cb);
        let cancel = CancelToken::new();

        let out = process_in_chunks(&rows(25), 10, &cancel, &mut progress, |chunk, _| {
            chunk.to_vec()
        })
        .await
        .unwrap();

        assert_eq!(out.len(), 25);
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn cancellation_discards_partial_results() {
        let cancel = CancelToken::new();
        let mut calls = 0usize;
        let cancel_after_first = cancel.clone();

        let mut cb = |_p: u8| {};
        let mut progress = Progress::new(&mut cb);
        let result = process_in_chunks(&rows(30), 10, &cancel, &mut progress, |chunk, _| {
            calls += 1;
            if calls == 1 {
                cancel_after_first.cancel();
            }
            chunk.to_vec()
        })
        .await;

        assert!(matches!(result, Err(IngestError::Cancelled)));
        assert_eq!(calls, 1);
    }
}
