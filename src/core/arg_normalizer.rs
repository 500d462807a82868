// EN: src/core/arg_normalizer.rs

//! Repairs arguments split apart by a faulty Windows command-line tokenizer.
//!
//! When a command string contains nested double quotes, some launchers on Windows
//! (npm's `.cmd` shims among them) hand the program arguments that were split at
//! the wrong spaces and lost their closing quote. Nesting is expressed by doubling
//! quotes: level 0 is delimited by `"`, level 1 by `""`, level 2 by `""""`, and so
//! on (`2^level` quotes).
//!
//! The repair re-joins the arguments and walks the result as runs of quotes,
//! whitespace and text, tracking how many levels are open:
//!
//! - At the root, whitespace separates arguments and a quote run opens levels.
//! - Inside a level, everything is glued onto the current argument. A quote run
//!   after whitespace opens deeper levels, a quote run after text closes levels.
//! - Input that ends with a level still open is rejected.
//!
//! Finally each run of quotes inside an argument is halved, so the markers of the
//! outermost level vanish and every doubled quote becomes the literal quote it
//! stands for.

use crate::constants::QUOTE;
use std::iter::Peekable;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Invalid quote nesting in arguments: {0}")]
    InvalidQuoteNesting(String),
}

/// Returns the arguments with nested quoting repaired.
///
/// Input without any faulty argument is handed back untouched.
pub fn normalize(args: Vec<String>) -> Result<Vec<String>, NormalizeError> {
    if !args.iter().any(|arg| is_faulty(arg)) {
        return Ok(args);
    }

    let joined = args.join(" ");
    log::debug!("Repairing nested quotes in: {}", joined);

    let repaired: Vec<String> = rebuild(&joined)?
        .iter()
        .map(|arg| collapse_quotes(arg))
        .filter(|arg| !arg.is_empty())
        .collect();

    log::debug!("Repaired arguments: {:?}", repaired);
    Ok(repaired)
}

/// An argument that opens a quote it never closes.
fn is_faulty(arg: &str) -> bool {
    let trimmed = arg.trim();
    trimmed.starts_with(QUOTE) && !trimmed.ends_with(QUOTE)
}

// --- Tokenizing ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk<'a> {
    Quotes(usize),
    Space(&'a str),
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharClass {
    Quote,
    Space,
    Text,
}

impl CharClass {
    fn of(c: char) -> Self {
        if c == QUOTE {
            Self::Quote
        } else if c.is_whitespace() {
            Self::Space
        } else {
            Self::Text
        }
    }
}

/// Splits `input` into maximal runs of quotes, whitespace and other text.
fn chunks(input: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut rest = input;
    while let Some(first) = rest.chars().next() {
        let class = CharClass::of(first);
        let end = rest
            .find(|c: char| CharClass::of(c) != class)
            .unwrap_or(rest.len());
        let (run, tail) = rest.split_at(end);
        out.push(match class {
            CharClass::Quote => Chunk::Quotes(run.chars().count()),
            CharClass::Space => Chunk::Space(run),
            CharClass::Text => Chunk::Text(run),
        });
        rest = tail;
    }
    out
}

// --- Rebuilding ---

/// Number of quotes delimiting `level`.
fn marker(level: usize) -> usize {
    u32::try_from(level)
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift))
        .unwrap_or(usize::MAX)
}

/// Re-splits the joined string into arguments, keeping the quote markers.
fn rebuild(joined: &str) -> Result<Vec<String>, NormalizeError> {
    let chunks = chunks(joined);
    let mut iter = chunks.iter().copied().peekable();
    let mut out: Vec<String> = Vec::new();
    let mut open = 0usize;
    let mut prev: Option<Chunk<'_>> = None;

    while let Some(chunk) = iter.next() {
        // At the root a chunk right after whitespace starts a new argument.
        let glued = open > 0 || matches!(prev, Some(Chunk::Text(_) | Chunk::Quotes(_)));

        match chunk {
            Chunk::Space(space) => {
                if open > 0 {
                    append(&mut out, space);
                }
            }
            Chunk::Text(text) => {
                if glued {
                    append(&mut out, text);
                } else {
                    out.push(text.to_string());
                }
            }
            Chunk::Quotes(count) => {
                let after_text = matches!(prev, Some(Chunk::Text(_)));
                open = step_levels(open, count, after_text, ends_word(&mut iter));
                let run = QUOTE.to_string().repeat(count);
                if glued {
                    append(&mut out, &run);
                } else {
                    out.push(run);
                }
            }
        }
        prev = Some(chunk);
    }

    if open > 0 {
        return Err(NormalizeError::InvalidQuoteNesting(joined.to_string()));
    }
    Ok(out)
}

/// Applies a run of `count` quotes to the number of open levels.
fn step_levels(mut open: usize, count: usize, after_text: bool, ends_word: bool) -> usize {
    let mut left = count;
    if open == 0 || !after_text {
        while left >= marker(open) {
            left -= marker(open);
            open += 1;
        }
        if !ends_word {
            return open;
        }
    }
    // Closing: either a run after text, or what an opening run at the end of a
    // word could not spend (`""` standing alone).
    while open > 0 && left >= marker(open - 1) {
        left -= marker(open - 1);
        open -= 1;
    }
    open
}

fn ends_word<'a, I>(iter: &mut Peekable<I>) -> bool
where
    I: Iterator<Item = Chunk<'a>>,
{
    matches!(iter.peek(), None | Some(Chunk::Space(_)))
}

fn append(out: &mut Vec<String>, piece: &str) {
    match out.last_mut() {
        Some(last) => last.push_str(piece),
        None => out.push(piece.to_string()),
    }
}

// --- Collapsing ---

/// Halves every run of quotes; a lone quote disappears.
fn collapse_quotes(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut run = 0usize;
    for c in arg.chars() {
        if c == QUOTE {
            run += 1;
            continue;
        }
        push_quotes(&mut out, run / 2);
        run = 0;
        out.push(c);
    }
    push_quotes(&mut out, run / 2);
    out
}

fn push_quotes(out: &mut String, count: usize) {
    out.extend(std::iter::repeat_n(QUOTE, count));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    // --- Detection ---

    #[test]
    fn test_clean_arguments_pass_through_unchanged() {
        let input = args(&["-w", "echo hi", "\"quoted arg\"", "npm run 'build'"]);
        let output = normalize(input.clone()).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_clean_arguments_keep_the_same_allocation() {
        let input = args(&["echo \"a\" \"b\""]);
        let ptr = input.as_ptr();
        let output = normalize(input).unwrap();
        assert_eq!(output.as_ptr(), ptr);
    }

    #[test]
    fn test_faulty_detection_ignores_surrounding_whitespace() {
        assert!(is_faulty("  \"echo "));
        assert!(!is_faulty("  \"echo\"  "));
        assert!(!is_faulty("echo\""));
        assert!(!is_faulty(""));
    }

    // --- Repair ---

    #[test]
    fn test_repairs_single_level_of_nesting() {
        // `"echo ""hi"""` split at its space by the tokenizer.
        let input = args(&["\"echo", "\"\"hi\"\"\""]);
        let output = normalize(input).unwrap();
        assert_eq!(output, args(&["echo \"hi\""]));
    }

    #[test]
    fn test_repairs_commands_among_flags_and_siblings() {
        let input = args(&["-f", "\"echo", "\"\"hi\"\"\"", "\"sleep", "1\""]);
        let output = normalize(input).unwrap();
        assert_eq!(output, args(&["-f", "echo \"hi\"", "sleep 1"]));
    }

    #[test]
    fn test_repairs_two_levels_of_nesting() {
        let input = args(&["\"a", "\"\"b", "\"\"\"\"c\"\"\"\"", "b\"\"", "a\""]);
        let output = normalize(input).unwrap();
        assert_eq!(output, args(&["a \"b \"\"c\"\" b\" a"]));
    }

    #[test]
    fn test_repaired_arguments_have_balanced_quotes() {
        let input = args(&["\"echo", "\"\"say", "hi\"\"\"", "\"\"\"ls\"\"\""]);
        let output = normalize(input).unwrap();
        for arg in &output {
            assert_eq!(arg.matches(QUOTE).count() % 2, 0, "unbalanced: {}", arg);
        }
        assert_eq!(output, args(&["echo \"say hi\"", "\"ls\""]));
    }

    #[test]
    fn test_text_glued_to_a_closing_quote_stays_in_the_argument() {
        let input = args(&["\"a", "b\"c", "d"]);
        let output = normalize(input).unwrap();
        assert_eq!(output, args(&["a bc", "d"]));
    }

    // --- Errors ---

    #[test]
    fn test_unclosed_quote_is_rejected() {
        let input = args(&["\"echo", "hi"]);
        let result = normalize(input);
        assert_eq!(
            result,
            Err(NormalizeError::InvalidQuoteNesting("\"echo hi".to_string()))
        );
    }

    #[test]
    fn test_unclosed_inner_level_is_rejected() {
        let input = args(&["\"echo", "\"\"hi\""]);
        assert!(normalize(input).is_err());
    }

    // --- Helpers ---

    #[test]
    fn test_collapse_halves_quote_runs() {
        assert_eq!(collapse_quotes("\"a\""), "a");
        assert_eq!(collapse_quotes("\"\"a\"\"\""), "\"a\"");
        assert_eq!(collapse_quotes("\"\"\"\""), "\"\"");
        assert_eq!(collapse_quotes("plain"), "plain");
    }

    #[test]
    fn test_chunks_split_into_runs() {
        let parts = chunks("a  \"\"b");
        assert_eq!(
            parts,
            vec![
                Chunk::Text("a"),
                Chunk::Space("  "),
                Chunk::Quotes(2),
                Chunk::Text("b"),
            ]
        );
    }
}
