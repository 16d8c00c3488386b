//! Shared test utilities for hri.

pub mod fixtures;

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
}

/// Run table-driven tests, stopping at the first mismatch.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F) -> Result<(), String>
where
    I: std::fmt::Debug + Clone,
    E: std::fmt::Debug + PartialEq,
    F: Fn(I) -> E,
{
    for case in cases {
        let start = std::time::Instant::now();
        let actual = test_fn(case.input.clone());
        if actual != case.expected {
            return Err(format!(
                "Test '{}' failed for input {:?}: expected {:?}, got {:?}",
                case.name, case.input, case.expected, actual
            ));
        }
        println!("[TEST] PASSED: {} ({:?})", case.name, start.elapsed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_table_tests_reports_failure() {
        let cases = vec![
            TestCase {
                name: "double two",
                input: 2,
                expected: 4,
            },
            TestCase {
                name: "wrong",
                input: 3,
                expected: 7,
            },
        ];
        let err = run_table_tests(cases, |x: i32| x * 2).unwrap_err();
        assert!(err.contains("'wrong'"));
    }
}
