//! Line-redrawing progress reporter.
//!
//! Every render clears the whole terminal line before drawing the status,
//! so concurrent updates never leave fragments of an older status behind.

use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const CLEAR_ENTIRE_LINE: &str = "\x1b[2K";

#[derive(Debug)]
struct State<W> {
    out: W,
    info: String,
    count: usize,
    total: usize,
    in_flight: Vec<String>,
    aborted: bool,
    finished: bool,
}

/// Thread-safe `[count/total] info` status line.
#[derive(Debug)]
pub struct Progress<W: Write> {
    state: Mutex<State<W>>,
    verbose: bool,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Progress<io::Stdout> {
    /// Reports to standard output.
    #[must_use]
    pub fn stdout(verbose: bool) -> Self {
        Self::new(io::stdout(), verbose)
    }
}

impl<W: Write> Progress<W> {
    /// Reports to `out`. In verbose mode each item is announced on its own
    /// line instead of inline on the status line.
    #[must_use]
    pub fn new(out: W, verbose: bool) -> Self {
        Self {
            state: Mutex::new(State {
                out,
                info: String::new(),
                count: 0,
                total: 0,
                in_flight: Vec::new(),
                aborted: false,
                finished: false,
            }),
            verbose,
            interrupt: None,
        }
    }

    /// Ties the run to `flag`, which is raised when the user interrupts.
    #[must_use]
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Returns `true` once the interrupt flag has been raised.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Resets the counters and renders `[0/total] info...`.
    ///
    /// # Errors
    ///
    /// Returns any error writing to the output.
    pub fn start(&self, info: &str, total: usize) -> io::Result<()> {
        let mut state = self.state.lock();
        state.info = info.to_string();
        state.count = 0;
        state.total = total;
        state.in_flight.clear();
        state.aborted = false;
        state.finished = false;
        Self::render(&mut state)
    }

    /// Announces an item that is about to be processed.
    ///
    /// # Errors
    ///
    /// Returns any error writing to the output.
    pub fn start_with_item(&self, item: &str) -> io::Result<()> {
        let mut state = self.state.lock();
        if self.verbose {
            writeln!(state.out, "{CLEAR_ENTIRE_LINE}\r{item}")?;
        } else {
            state.in_flight.push(item.to_string());
        }
        Self::render(&mut state)
    }

    /// Counts `item` as done, printing its output, if any, on lines of its
    /// own. The status line falls back to the latest item still in flight.
    ///
    /// # Errors
    ///
    /// Returns any error writing to the output.
    pub fn done_with_item(&self, item: &str, output: Option<&str>) -> io::Result<()> {
        let mut state = self.state.lock();
        state.count += 1;
        if let Some(index) = state.in_flight.iter().position(|i| i == item) {
            state.in_flight.remove(index);
        }
        if let Some(output) = output.filter(|o| !o.is_empty()) {
            writeln!(state.out, "{CLEAR_ENTIRE_LINE}\r{output}")?;
        }
        Self::render(&mut state)
    }

    /// Marks the run as aborted.
    ///
    /// # Errors
    ///
    /// Returns any error writing to the output.
    pub fn abort(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        state.aborted = true;
        Self::render(&mut state)
    }

    /// Returns the output, for inspection in tests.
    pub fn into_inner(self) -> W {
        self.state.into_inner().out
    }

    fn render(state: &mut State<W>) -> io::Result<()> {
        // Done or Aborted has already ended the status line.
        if state.finished {
            return Ok(());
        }

        let trailing = if state.count == state.total {
            state.finished = true;
            ". Done.\n".to_string()
        } else if state.aborted {
            state.finished = true;
            ". Aborted.\n".to_string()
        } else if let Some(item) = state.in_flight.last() {
            format!(": {item}")
        } else {
            "...".to_string()
        };

        write!(
            state.out,
            "{CLEAR_ENTIRE_LINE}\r[{}/{}] {}{trailing}",
            state.count, state.total, state.info
        )?;
        state.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(progress: Progress<Vec<u8>>) -> String {
        String::from_utf8(progress.into_inner())
            .unwrap()
            .replace(CLEAR_ENTIRE_LINE, "<clear>")
            .replace('\r', "<cr>")
    }

    #[test]
    fn runs_to_done() {
        let progress = Progress::new(Vec::new(), false);
        progress.start("Checking source", 2).unwrap();
        progress.start_with_item("a.cpp").unwrap();
        progress.done_with_item("a.cpp", None).unwrap();
        progress.start_with_item("b.cpp").unwrap();
        progress.done_with_item("b.cpp", Some("b.cpp: error: bad")).unwrap();

        insta::assert_snapshot!(rendered(progress).trim_end(), @r"
        <clear><cr>[0/2] Checking source...<clear><cr>[0/2] Checking source: a.cpp<clear><cr>[1/2] Checking source...<clear><cr>[1/2] Checking source: b.cpp<clear><cr>b.cpp: error: bad
        <clear><cr>[2/2] Checking source. Done.
        ");
    }

    #[test]
    fn verbose_announces_items_on_own_lines() {
        let progress = Progress::new(Vec::new(), true);
        progress.start("Analyzing source", 1).unwrap();
        progress.start_with_item("a.cpp").unwrap();
        progress.done_with_item("a.cpp", Some("")).unwrap();

        insta::assert_snapshot!(rendered(progress).trim_end(), @r"
        <clear><cr>[0/1] Analyzing source...<clear><cr>a.cpp
        <clear><cr>[0/1] Analyzing source...<clear><cr>[1/1] Analyzing source. Done.
        ");
    }

    #[test]
    fn abort_ends_the_status_line_once() {
        let progress = Progress::new(Vec::new(), false);
        progress.start("Checking source", 3).unwrap();
        progress.abort().unwrap();
        progress.done_with_item("a.cpp", Some("late output")).unwrap();

        insta::assert_snapshot!(rendered(progress).trim_end(), @r"
        <clear><cr>[0/3] Checking source...<clear><cr>[0/3] Checking source. Aborted.
        <clear><cr>late output
        ");
    }

    #[test]
    fn status_shows_items_still_in_flight() {
        let progress = Progress::new(Vec::new(), false);
        progress.start("Checking source", 3).unwrap();
        progress.start_with_item("a.cpp").unwrap();
        progress.start_with_item("b.cpp").unwrap();
        progress.done_with_item("b.cpp", None).unwrap();
        progress.start_with_item("c.cpp").unwrap();
        progress.done_with_item("c.cpp", None).unwrap();

        insta::assert_snapshot!(rendered(progress), @"<clear><cr>[0/3] Checking source...<clear><cr>[0/3] Checking source: a.cpp<clear><cr>[0/3] Checking source: b.cpp<clear><cr>[1/3] Checking source: a.cpp<clear><cr>[1/3] Checking source: c.cpp<clear><cr>[2/3] Checking source: a.cpp");
    }

    #[test]
    fn nothing_to_do_is_done_immediately() {
        let progress = Progress::new(Vec::new(), false);
        progress.start("Checking source", 0).unwrap();

        assert_eq!(rendered(progress), "<clear><cr>[0/0] Checking source. Done.\n");
    }
}
