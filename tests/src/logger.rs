use std::io::{self, IsTerminal, StderrLock, Write};

use crate::collect::{Direction, Test};

/// The result of running a single test.
pub struct TestResult {
    /// The error log for this test. If empty, the test passed.
    pub errors: String,
}

/// Passed and failed counts of one direction.
#[derive(Default, Copy, Clone)]
struct Tally {
    passed: usize,
    failed: usize,
}

/// Receives results of finished tests and keeps count per direction.
pub struct Logger {
    selected: usize,
    skipped: usize,
    tallies: [Tally; Direction::ALL.len()],
    terminal: bool,
}

impl Logger {
    /// Create a new logger.
    pub fn new(selected: usize, skipped: usize) -> Self {
        Self {
            selected,
            skipped,
            tallies: Default::default(),
            terminal: std::io::stderr().is_terminal(),
        }
    }

    /// Register a finished test.
    pub fn end(&mut self, test: &Test, result: std::thread::Result<TestResult>) {
        let tally = &mut self.tallies[test.direction as usize];
        let errors = match result {
            Ok(result) if result.errors.is_empty() => {
                tally.passed += 1;
                None
            }
            Ok(result) => Some(result.errors),
            Err(_) => Some("panicked during conversion\n".into()),
        };
        if errors.is_some() {
            tally.failed += 1;
        }

        self.print(|out| {
            match &errors {
                Some(errors) => {
                    writeln!(out, "❌ {} {test}", test.direction)?;
                    if !crate::ARGS.compact {
                        for line in errors.lines() {
                            writeln!(out, "  {line}")?;
                        }
                    }
                }
                None if crate::ARGS.verbose => writeln!(out, "✅ {} {test}", test.direction)?,
                None => {}
            }
            Ok(())
        })
        .unwrap();
    }

    /// Prints a summary per direction and returns whether the suite passed.
    pub fn finish(&self) -> bool {
        let mut total = Tally::default();
        for (direction, tally) in Direction::ALL.into_iter().zip(self.tallies) {
            if tally.passed + tally.failed > 0 {
                eprintln!("{direction:>9}: {} passed, {} failed", tally.passed, tally.failed);
            }
            total.passed += tally.passed;
            total.failed += tally.failed;
        }

        eprintln!("{} passed, {} failed, {} skipped", total.passed, total.failed, self.skipped);
        assert_eq!(
            self.selected,
            total.passed + total.failed,
            "not all tests were executed successfully"
        );

        total.failed == 0
    }

    /// Prints the output of a finished test above the progress line.
    fn print(
        &mut self,
        inner: impl FnOnce(&mut StderrLock<'_>) -> io::Result<()>,
    ) -> io::Result<()> {
        let mut out = std::io::stderr().lock();
        if self.terminal {
            write!(out, "\x1B[2K\r")?;
        }

        inner(&mut out)?;

        let done: usize = self.tallies.iter().map(|t| t.passed + t.failed).sum();
        if self.terminal && done < self.selected {
            write!(out, "💨 {done} / {}", self.selected)?;
            out.flush()?;
        }

        Ok(())
    }
}
