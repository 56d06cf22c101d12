//! Conflict answers for the CLI: a fixed policy or a stdin prompt.

use std::io::{BufRead, Write};
use std::str::FromStr;

use rimsync_core::{ConflictChoice, RimSyncError};
use rimsync_services::{ConflictContext, ConflictPrompt, Decision, FixedPrompt};

/// `--on-conflict` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    Ask,
    Always(ConflictChoice),
}

impl FromStr for ConflictPolicy {
    type Err = RimSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("ask") {
            return Ok(ConflictPolicy::Ask);
        }
        s.parse::<ConflictChoice>()
            .map(ConflictPolicy::Always)
            .map_err(|_| RimSyncError::InvalidOption {
                kind: "conflict policy",
                value: s.to_string(),
                expected: "ask, merge, prefix, suffix, skip, cancel",
            })
    }
}

impl ConflictPolicy {
    pub fn into_prompt(self) -> Box<dyn ConflictPrompt> {
        match self {
            ConflictPolicy::Ask => Box::new(StdinPrompt::new(std::io::stdin().lock(), std::io::stderr())),
            ConflictPolicy::Always(choice) => Box::new(FixedPrompt(Decision::always(choice))),
        }
    }
}

/// Asks on `out` and reads one answer per line from `input`:
/// `m`erge, `p`refix, `s`uffix, s`k`ip, `c`ancel. A trailing `!` applies the
/// answer to every later conflict of the same category; an empty line takes
/// the proposed choice. End of input cancels.
pub struct StdinPrompt<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> StdinPrompt<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }
}

pub fn parse_answer(line: &str, proposed: ConflictChoice) -> Option<Decision> {
    let line = line.trim();
    let (word, all) = match line.strip_suffix('!') {
        Some(rest) => (rest.trim(), true),
        None => (line, false),
    };
    let choice = match word.to_ascii_lowercase().as_str() {
        "" => proposed,
        "m" => ConflictChoice::Merge,
        "p" => ConflictChoice::Prefix,
        "s" => ConflictChoice::Suffix,
        "k" => ConflictChoice::Skip,
        "c" => ConflictChoice::Cancel,
        other => other.parse().ok()?,
    };
    Some(Decision {
        choice,
        apply_to_all: all,
    })
}

impl<R: BufRead, W: Write> ConflictPrompt for StdinPrompt<R, W> {
    fn decide(&mut self, ctx: &ConflictContext) -> Decision {
        let owners = if ctx.existing_owners.is_empty() {
            "another file of this run".to_string()
        } else {
            ctx.existing_owners.join(", ")
        };
        loop {
            // a broken stderr only loses the question
            let _ = writeln!(
                self.out,
                "conflict: {} wants {}\n  already owned by {}\n  [m]erge [p]refix [s]uffix s[k]ip [c]ancel (add ! for all {} files, enter = {})",
                ctx.file.owner_id(),
                ctx.target.display(),
                owners,
                ctx.category,
                ctx.proposed,
            );
            let _ = self.out.flush();
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => return Decision::once(ConflictChoice::Cancel),
                Ok(_) => {}
            }
            if let Some(decision) = parse_answer(&line, ctx.proposed) {
                return decision;
            }
            let _ = writeln!(self.out, "unrecognized answer: {}", line.trim());
        }
    }
}
