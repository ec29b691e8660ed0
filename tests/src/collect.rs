use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};

use ecow::{EcoString, eco_format};
use rustc_hash::FxHashMap;
use tex2typst::Options;
use unscanny::Scanner;

/// Collects all tests from all files.
///
/// Returns:
/// - the tests and the number of skipped tests in the success case.
/// - parsing errors in the failure case.
pub fn collect() -> Result<(Vec<Test>, usize), Vec<TestParseError>> {
    Collector::new().run()
}

/// A single conversion test.
pub struct Test {
    pub pos: FilePos,
    pub name: EcoString,
    pub direction: Direction,
    pub options: Options,
    pub input: EcoString,
    /// The expected output, or `error: message` when the conversion is
    /// expected to fail.
    pub expected: EcoString,
}

impl Display for Test {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.pos)
    }
}

/// Which way a test converts.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    /// TeX input, Typst output.
    TexToTypst,
    /// Typst input, TeX output.
    TypstToTex,
    /// TeX input, Typst output that converts back to the input.
    Roundtrip,
}

impl Direction {
    pub const ALL: [Self; 3] = [Self::TexToTypst, Self::TypstToTex, Self::Roundtrip];

    fn parse(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|direction| direction.name() == text)
    }

    /// The name used in test headers.
    pub fn name(self) -> &'static str {
        match self {
            Self::TexToTypst => "tex2typst",
            Self::TypstToTex => "typst2tex",
            Self::Roundtrip => "roundtrip",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A position in a file.
#[derive(Clone)]
pub struct FilePos {
    pub path: PathBuf,
    pub line: usize,
}

impl FilePos {
    fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self { path: path.into(), line }
    }
}

impl Display for FilePos {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// An error in a test file.
pub struct TestParseError {
    pub pos: FilePos,
    pub message: EcoString,
}

impl Display for TestParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.pos)
    }
}

/// Collects all tests from all files.
struct Collector {
    tests: Vec<Test>,
    errors: Vec<TestParseError>,
    seen: FxHashMap<EcoString, FilePos>,
    skipped: usize,
}

impl Collector {
    /// Creates a new test collector.
    fn new() -> Self {
        Self {
            tests: vec![],
            errors: vec![],
            seen: FxHashMap::default(),
            skipped: 0,
        }
    }

    /// Collects tests from all files.
    fn run(mut self) -> Result<(Vec<Test>, usize), Vec<TestParseError>> {
        self.walk_files();
        if self.errors.is_empty() {
            Ok((self.tests, self.skipped))
        } else {
            Err(self.errors)
        }
    }

    /// Walks through all test files and collects the tests.
    fn walk_files(&mut self) {
        for entry in walkdir::WalkDir::new(crate::SUITE_PATH).sort_by_file_name() {
            let entry = entry.unwrap();
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "txt") {
                continue;
            }

            let text = std::fs::read_to_string(path).unwrap();
            Parser::new(self, path, &text).parse();
        }
    }
}

/// Parses a single test file.
struct Parser<'a> {
    collector: &'a mut Collector,
    path: &'a Path,
    lines: Vec<&'a str>,
    line: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for a file.
    fn new(collector: &'a mut Collector, path: &'a Path, source: &'a str) -> Self {
        Self { collector, path, lines: source.lines().collect(), line: 0 }
    }

    /// Parses all tests in a file. Lines before the first header are
    /// commentary.
    fn parse(&mut self) {
        while self.line < self.lines.len() && !is_header(self.lines[self.line]) {
            self.line += 1;
        }

        while self.line < self.lines.len() {
            let pos = FilePos::new(self.path, self.line + 1);
            let header = self.lines[self.line];
            self.line += 1;

            let input = self.take_until(|line| line == ">>>");
            if self.line >= self.lines.len() {
                self.error(pos, "missing `>>>` before the expected output");
                return;
            }
            self.line += 1;
            let expected = self.take_until(is_header);

            self.test(pos, header, input, expected);
        }
    }

    /// Turns a header and its two blocks into a test.
    fn test(&mut self, pos: FilePos, header: &str, input: EcoString, expected: EcoString) {
        let mut s = Scanner::new(header);
        s.eat_if("---");
        s.eat_whitespace();

        let name: EcoString = s.eat_until(char::is_whitespace).into();
        s.eat_whitespace();

        let direction = s.eat_until(char::is_whitespace);
        let Some(direction) = Direction::parse(direction) else {
            self.error(pos, eco_format!("unknown direction `{direction}`"));
            return;
        };

        let mut toml = String::new();
        loop {
            s.eat_whitespace();
            let option = s.eat_until(char::is_whitespace);
            if option.is_empty() || option == "---" {
                break;
            }
            let Some((key, value)) = option.split_once('=') else {
                self.error(pos, eco_format!("malformed option `{option}`"));
                return;
            };
            toml.push_str(&format!("{key} = {value}\n"));
        }

        let options = match Options::from_toml(&toml) {
            Ok(options) => options,
            Err(err) => {
                self.error(pos, eco_format!("{err}"));
                return;
            }
        };

        if let Some(prev) = self.collector.seen.insert(name.clone(), pos.clone()) {
            self.error(pos, eco_format!("duplicate test {name} (previously at {prev})"));
            return;
        }

        if !crate::ARGS.selects(&name) {
            self.collector.skipped += 1;
            return;
        }

        self.collector.tests.push(Test { pos, name, direction, options, input, expected });
    }

    /// Takes lines until one matches, leaving out trailing blank lines.
    fn take_until(&mut self, stop: impl Fn(&str) -> bool) -> EcoString {
        let start = self.line;
        while self.line < self.lines.len() && !stop(self.lines[self.line]) {
            self.line += 1;
        }

        let mut end = self.line;
        while end > start && self.lines[end - 1].trim().is_empty() {
            end -= 1;
        }

        self.lines[start..end].join("\n").into()
    }

    /// Stores a test parsing error.
    fn error(&mut self, pos: FilePos, message: impl Into<EcoString>) {
        self.collector
            .errors
            .push(TestParseError { pos, message: message.into() });
    }
}

/// Whether a line starts a new test, like `--- frac tex2typst ---`.
fn is_header(line: &str) -> bool {
    line.starts_with("--- ") && line.ends_with(" ---")
}
