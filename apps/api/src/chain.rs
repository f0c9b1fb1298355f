//! Ordered fallback chains — "try each strategy in order, keep the first success".
//!
//! Used by the PDF extractor (primary parser → raw literal scan) and by the
//! model-output recoverer (direct parse → truncation repairs).

/// A single named step in a chain. Steps are plain functions, so a chain is
/// just an array declared next to the code that owns it.
pub type Attempt<I, T, E> = fn(&I) -> Result<T, E>;

/// Runs `attempts` against `input` in order and returns the first `Ok`.
///
/// When every step fails, returns each step's name paired with its error, in
/// the order they were tried. An empty chain fails with an empty list.
pub fn first_success<I: ?Sized, T, E>(
    input: &I,
    attempts: &[(&'static str, Attempt<I, T, E>)],
) -> Result<T, Vec<(&'static str, E)>> {
    let mut failures = Vec::with_capacity(attempts.len());
    for (name, attempt) in attempts {
        match attempt(input) {
            Ok(value) => {
                if !failures.is_empty() {
                    tracing::debug!(step = *name, skipped = failures.len(), "Chain recovered");
                }
                return Ok(value);
            }
            Err(e) => failures.push((*name, e)),
        }
    }
    Err(failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_int(s: &str) -> Result<i64, String> {
        s.trim().parse::<i64>().map_err(|e| e.to_string())
    }

    fn parse_len(s: &str) -> Result<i64, String> {
        if s.is_empty() {
            Err("empty".to_string())
        } else {
            Ok(s.len() as i64)
        }
    }

    fn always_fail(_: &str) -> Result<i64, String> {
        Err("nope".to_string())
    }

    #[test]
    fn test_first_step_wins() {
        let chain: &[(&str, Attempt<str, i64, String>)] =
            &[("int", parse_int), ("len", parse_len)];
        assert_eq!(first_success(" 42 ", chain), Ok(42));
    }

    #[test]
    fn test_falls_through_to_later_step() {
        let chain: &[(&str, Attempt<str, i64, String>)] =
            &[("int", parse_int), ("len", parse_len)];
        assert_eq!(first_success("abc", chain), Ok(3));
    }

    #[test]
    fn test_collects_every_failure_in_order() {
        let chain: &[(&str, Attempt<str, i64, String>)] =
            &[("fail", always_fail), ("len", parse_len)];
        let failures = first_success("", chain).unwrap_err();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].0, "fail");
        assert_eq!(failures[1], ("len", "empty".to_string()));
    }

    #[test]
    fn test_empty_chain_fails() {
        let chain: &[(&str, Attempt<str, i64, String>)] = &[];
        assert!(first_success("1", chain).unwrap_err().is_empty());
    }
}
