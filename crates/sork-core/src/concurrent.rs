//! Bounded fan-out over a slice with cooperative cancellation.

use parking_lot::Mutex;
use std::fmt::Display;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

use crate::progress::Progress;

/// Errors raised by the dispatcher itself rather than by the work items.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The worker pool could not be created.
    #[error("failed to create worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Progress output could not be written.
    #[error("failed to write progress: {0}")]
    Output(#[from] io::Error),

    /// The user interrupted the run.
    #[error("interrupted")]
    Interrupted,
}

/// Calls `func` for every item on a pool of `num_threads` workers, or one
/// per logical core when `None`.
///
/// Once a call fails no further calls start; calls already running are
/// allowed to finish. The first error in completion order is returned after
/// all work has settled, and the pool is torn down before returning.
///
/// # Errors
///
/// Returns the first error returned by `func`, or a [`DispatchError`] if
/// the pool cannot be created.
pub fn for_each<T, E, F>(items: &[T], num_threads: Option<usize>, func: F) -> Result<(), E>
where
    T: Sync,
    E: Send + From<DispatchError>,
    F: Fn(&T) -> Result<(), E> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .thread_name(|index| format!("sork-worker-{index}"))
        .build()
        .map_err(|e| E::from(DispatchError::Pool(e)))?;

    debug!("Dispatching {} items on {} threads", items.len(), pool.current_num_threads());

    let aborted = AtomicBool::new(false);
    let first_error: Mutex<Option<E>> = Mutex::new(None);

    pool.scope(|scope| {
        for item in items {
            let aborted = &aborted;
            let first_error = &first_error;
            let func = &func;

            scope.spawn(move |_| {
                if aborted.load(Ordering::SeqCst) {
                    return;
                }

                if let Err(e) = func(item) {
                    aborted.store(true, Ordering::SeqCst);
                    first_error.lock().get_or_insert(e);
                }
            });
        }
    });

    drop(pool);

    match first_error.into_inner() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Like [`for_each`], reporting progress labelled `info` as items start
/// and finish. Non-empty output returned by `func` is printed as each item
/// completes. The status line ends with `Aborted.` on the first failure or
/// once the progress interrupt flag is raised.
///
/// # Errors
///
/// Returns the first error returned by `func`, or a [`DispatchError`] if
/// the pool cannot be created, progress cannot be written or the run was
/// interrupted.
pub fn for_each_with_progress<T, W, E, F>(
    progress: &Progress<W>,
    info: &str,
    items: &[T],
    num_threads: Option<usize>,
    func: F,
) -> Result<(), E>
where
    T: Display + Sync,
    W: Write + Send,
    E: Send + From<DispatchError>,
    F: Fn(&T) -> Result<Option<String>, E> + Sync,
{
    let output_error = |e: io::Error| E::from(DispatchError::Output(e));

    progress.start(info, items.len()).map_err(output_error)?;

    let abort = |e: E| {
        if let Err(output) = progress.abort() {
            warn!("Failed to report abort: {output}");
        }
        e
    };

    for_each(items, num_threads, |item| {
        if progress.is_interrupted() {
            return Err(abort(E::from(DispatchError::Interrupted)));
        }

        let name = item.to_string();
        progress.start_with_item(&name).map_err(output_error)?;

        let output = func(item).map_err(abort)?;

        // Output of tools killed by the interrupt is not worth showing.
        if progress.is_interrupted() {
            return Err(abort(E::from(DispatchError::Interrupted)));
        }

        progress
            .done_with_item(&name, output.as_deref())
            .map_err(output_error)
    })
}
