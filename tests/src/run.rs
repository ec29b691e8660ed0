use std::fmt::Write;

use tex2typst::{Error, tex2typst, typst2tex};

use crate::collect::{Direction, Test};
use crate::logger::TestResult;

/// Write a line to the test's error log.
macro_rules! log {
    ($result:expr, $($tts:tt)*) => {{
        writeln!(&mut $result.errors, $($tts)*).unwrap();
    }};
}

/// Runs a single test.
pub fn run(test: &Test) -> TestResult {
    let mut result = TestResult { errors: String::new() };
    let options = &test.options;

    match test.direction {
        Direction::TexToTypst => {
            check(&mut result, "typst", tex2typst(&test.input, options), &test.expected);
        }
        Direction::TypstToTex => {
            check(&mut result, "tex", typst2tex(&test.input, options), &test.expected);
        }
        Direction::Roundtrip => {
            let forward = tex2typst(&test.input, options);
            if let Some(typst) = check(&mut result, "typst", forward, &test.expected) {
                let back = typst2tex(&typst, options);
                check(&mut result, "round trip", back, &test.input);
            }
        }
    }

    result
}

/// Compares a conversion result with what was expected. Returns the output
/// if the conversion succeeded.
fn check(
    result: &mut TestResult,
    what: &str,
    output: Result<String, Error>,
    expected: &str,
) -> Option<String> {
    let actual = match &output {
        Ok(text) => text.clone(),
        Err(err) => format!("error: {}", err.message()),
    };

    if actual != expected {
        log!(result, "mismatched {what}");
        log!(result, "  expected:");
        for line in expected.lines() {
            log!(result, "    {line}");
        }
        log!(result, "  got:");
        for line in actual.lines() {
            log!(result, "    {line}");
        }
    }

    output.ok()
}
