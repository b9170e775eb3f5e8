//! Diagnostic line sink
//!
//! Every operation reports progress and diagnostics through a caller-supplied
//! sink, one line at a time. Callers decide what to do with the text: print
//! it, collect it, or drop it.

/// Sink for diagnostic and progress lines.
pub trait Console {
    /// Deliver one line of diagnostic text.
    fn log(&mut self, line: &str);
}

impl<F: FnMut(&str)> Console for F {
    fn log(&mut self, line: &str) {
        self(line)
    }
}

/// A console that collects lines in memory.
///
/// # Example
///
/// ```rust
/// use spatialkit::{BufferedConsole, Console};
///
/// let mut console = BufferedConsole::new();
/// console.log("Processing: input.mp4");
/// assert_eq!(console.lines(), ["Processing: input.mp4"]);
/// ```
#[derive(Debug, Default)]
pub struct BufferedConsole {
    lines: Vec<String>,
}

impl BufferedConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines logged so far, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// True if any logged line contains the given fragment.
    pub fn contains(&self, fragment: &str) -> bool {
        self.lines.iter().any(|l| l.contains(fragment))
    }
}

impl Console for BufferedConsole {
    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
