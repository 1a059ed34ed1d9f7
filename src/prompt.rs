//! Confirmation gate for destructive operations.
//!
//! Deleting a non-empty parent resource prompts `yes/no/always/never`;
//! `always` and `never` stick for the rest of the invocation so bulk deletes
//! are asked once. A force flag bypasses the prompt entirely. I/O handles are
//! injected so tests can drive the gate.

use std::io::{self, BufRead, BufReader, Stdin, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    Always,
    Never,
}

fn parse_answer(input: &str) -> Option<Answer> {
    match input.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(Answer::Yes),
        "n" | "no" => Some(Answer::No),
        "a" | "always" => Some(Answer::Always),
        "v" | "never" => Some(Answer::Never),
        _ => None,
    }
}

pub struct Confirmer<R, W> {
    input: R,
    output: W,
    force: bool,
    /// Set by `always`/`never`; answers every later prompt.
    sticky: Option<bool>,
}

impl Confirmer<BufReader<Stdin>, io::Stderr> {
    /// Prompt on stderr, read answers from stdin.
    pub fn from_terminal(force: bool) -> Self {
        Self::with_io(BufReader::new(io::stdin()), io::stderr(), force)
    }
}

impl<R: BufRead, W: Write> Confirmer<R, W> {
    pub fn with_io(input: R, output: W, force: bool) -> Self {
        Self {
            input,
            output,
            force,
            sticky: None,
        }
    }

    /// Ask the user to confirm `prompt`. Returns `true` when the operation
    /// may proceed. Unrecognized input re-prompts; EOF counts as a decline.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        if self.force {
            return Ok(true);
        }
        if let Some(answer) = self.sticky {
            return Ok(answer);
        }

        loop {
            write!(self.output, "{prompt} [y]es/[n]o/[a]lways/ne[v]er: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(false);
            }

            match parse_answer(&line) {
                Some(Answer::Yes) => return Ok(true),
                Some(Answer::No) => return Ok(false),
                Some(Answer::Always) => {
                    self.sticky = Some(true);
                    return Ok(true);
                }
                Some(Answer::Never) => {
                    self.sticky = Some(false);
                    return Ok(false);
                }
                None => continue,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn confirmer(input: &str, force: bool) -> Confirmer<Cursor<Vec<u8>>, Vec<u8>> {
        Confirmer::with_io(Cursor::new(input.as_bytes().to_vec()), Vec::new(), force)
    }

    #[test]
    fn yes_allows_and_no_declines() {
        assert!(confirmer("y\n", false).confirm("Delete?").unwrap());
        assert!(!confirmer("no\n", false).confirm("Delete?").unwrap());
    }

    #[test]
    fn force_skips_the_prompt_entirely() {
        let mut c = confirmer("", true);
        assert!(c.confirm("Delete?").unwrap());
        assert!(c.output.is_empty(), "no prompt should be written");
    }

    #[test]
    fn always_sticks_for_later_prompts() {
        let mut c = confirmer("always\n", false);
        assert!(c.confirm("Delete a?").unwrap());
        assert!(c.confirm("Delete b?").unwrap());
        // only the first prompt hit the output
        let written = String::from_utf8(c.output.clone()).unwrap();
        assert_eq!(written.matches("[y]es").count(), 1);
    }

    #[test]
    fn never_declines_everything_after() {
        let mut c = confirmer("v\n", false);
        assert!(!c.confirm("Delete a?").unwrap());
        assert!(!c.confirm("Delete b?").unwrap());
    }

    #[test]
    fn garbage_reprompts_until_valid() {
        let mut c = confirmer("maybe\nyes\n", false);
        assert!(c.confirm("Delete?").unwrap());
        let written = String::from_utf8(c.output.clone()).unwrap();
        assert_eq!(written.matches("[y]es").count(), 2);
    }

    #[test]
    fn eof_counts_as_decline() {
        assert!(!confirmer("", false).confirm("Delete?").unwrap());
    }
}
