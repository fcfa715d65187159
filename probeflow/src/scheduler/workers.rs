//! The bounded worker pool behind `map` and `parallel`.

use super::Parallelism;
use crate::stream::Streamable;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

/// Spawns exactly `parallelism` workers that pull jobs from `jobs`, run
/// `work` on each and push the results to the returned stream.
///
/// The output closes once every worker has seen `jobs` close and finished
/// its last job. The jobs lock is held only while receiving, never while
/// `work` runs.
///
/// A panic in `work`, or one resumed from `jobs`, stops that worker and is
/// resumed again by whoever drains the output to its end.
pub(crate) fn spawn_workers<J, O, W, Fut>(
    parallelism: Parallelism,
    jobs: Streamable<J>,
    work: W,
) -> Streamable<O>
where
    J: Send + 'static,
    O: Send + 'static,
    W: Fn(J) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    let (sender, output) = Streamable::channel();
    let work = Arc::new(work);
    for worker in 0..parallelism.get() {
        let jobs = jobs.clone();
        let sender = sender.clone();
        let work = Arc::clone(&work);
        let slot = output.panic_slot();
        tokio::spawn(async move {
            debug!(worker, "worker started");
            let mut done = 0_usize;
            loop {
                // Upstream panics surface here too, through `recv`.
                let step = AssertUnwindSafe(async {
                    match jobs.recv().await {
                        Some(job) => Some((*work)(job).await),
                        None => None,
                    }
                })
                .catch_unwind()
                .await;
                let result = match step {
                    Ok(Some(result)) => result,
                    Ok(None) => break,
                    Err(payload) => {
                        warn!(worker, done, "worker panicked, stopping");
                        // Set before `sender` drops so the consumer cannot see a clean close.
                        slot.set(payload);
                        return;
                    }
                };
                done += 1;
                if sender.send(result).is_err() {
                    debug!(worker, "output dropped, worker stopping");
                    return;
                }
            }
            debug!(worker, done, "worker finished");
        });
    }
    output
}
