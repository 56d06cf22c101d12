//! Conflict resolver: a small state machine consulted when a target path
//! is already taken by another logical file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rimsync_core::{CategoryKind, ConflictChoice, LogicalFile, NamingOption};

use crate::submods::{decorate_file_name, has_tag};

/// Everything a caller needs to decide a collision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictContext {
    pub target: PathBuf,
    /// The logical file that wants to write `target`.
    pub file: LogicalFile,
    /// Owners already recorded for `target`.
    pub existing_owners: Vec<String>,
    pub category: CategoryKind,
    pub proposed: ConflictChoice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub choice: ConflictChoice,
    /// Reuse `choice` for later collisions of the same category.
    pub apply_to_all: bool,
}

impl Decision {
    pub fn once(choice: ConflictChoice) -> Self {
        Self {
            choice,
            apply_to_all: false,
        }
    }

    pub fn always(choice: ConflictChoice) -> Self {
        Self {
            choice,
            apply_to_all: true,
        }
    }
}

/// Source of external decisions (terminal prompt, UI channel, fixed policy).
pub trait ConflictPrompt {
    fn decide(&mut self, ctx: &ConflictContext) -> Decision;
}

/// Answers every collision the same way.
#[derive(Debug, Clone, Copy)]
pub struct FixedPrompt(pub Decision);

impl ConflictPrompt for FixedPrompt {
    fn decide(&mut self, _ctx: &ConflictContext) -> Decision {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    AwaitingDecision(ConflictContext),
    Resolved(ConflictChoice),
    Cancelled,
}

/// Result of reporting a collision.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a> {
    /// Decided without asking (sticky choice, or the run is cancelled).
    Decided(ConflictChoice),
    /// Waiting for [`ConflictResolver::decide`].
    Ask(&'a ConflictContext),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no conflict is awaiting a decision")]
pub struct NotAwaiting;

/// Owned by one extraction run; the sticky cache never outlives it.
#[derive(Debug)]
pub struct ConflictResolver {
    state: ResolverState,
    sticky: HashMap<CategoryKind, ConflictChoice>,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictResolver {
    pub fn new() -> Self {
        Self {
            state: ResolverState::Idle,
            sticky: HashMap::new(),
        }
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    pub fn sticky_choice(&self, category: CategoryKind) -> Option<ConflictChoice> {
        self.sticky.get(&category).copied()
    }

    /// Forget every "apply to all" answer; the next collision prompts again.
    pub fn reset_choice(&mut self) {
        self.sticky.clear();
        if !matches!(self.state, ResolverState::Cancelled) {
            self.state = ResolverState::Idle;
        }
        tracing::debug!(event = "conflict_choice_reset");
    }

    /// Report a collision. Uses the sticky answer for its category when there
    /// is one; otherwise moves to `AwaitingDecision`.
    pub fn collide(&mut self, ctx: ConflictContext) -> Step<'_> {
        if matches!(self.state, ResolverState::Cancelled) {
            return Step::Decided(ConflictChoice::Cancel);
        }
        if let Some(choice) = self.sticky.get(&ctx.category).copied() {
            tracing::debug!(event = "conflict_sticky", target = %ctx.target.display(), choice = %choice);
            self.settle(choice);
            return Step::Decided(choice);
        }
        self.state = ResolverState::AwaitingDecision(ctx);
        match &self.state {
            ResolverState::AwaitingDecision(ctx) => Step::Ask(ctx),
            _ => Step::Decided(ConflictChoice::Cancel),
        }
    }

    /// Apply an external decision to the pending collision.
    pub fn decide(&mut self, decision: Decision) -> Result<ConflictChoice, NotAwaiting> {
        let category = match &self.state {
            ResolverState::AwaitingDecision(ctx) => ctx.category,
            _ => return Err(NotAwaiting),
        };
        if decision.apply_to_all && decision.choice != ConflictChoice::Cancel {
            self.sticky.insert(category, decision.choice);
        }
        self.settle(decision.choice);
        Ok(decision.choice)
    }

    /// Report a collision and, if needed, ask `prompt`.
    pub fn resolve(&mut self, ctx: ConflictContext, prompt: &mut dyn ConflictPrompt) -> ConflictChoice {
        let decision = match self.collide(ctx) {
            Step::Decided(choice) => return choice,
            Step::Ask(ctx) => prompt.decide(ctx),
        };
        self.decide(decision).unwrap_or(ConflictChoice::Cancel)
    }

    fn settle(&mut self, choice: ConflictChoice) {
        self.state = match choice {
            ConflictChoice::Cancel => ResolverState::Cancelled,
            other => ResolverState::Resolved(other),
        };
    }
}

/// Disambiguating name for a Prefix/Suffix resolution.
///
/// Attempt 0 uses `owner_tag` unless the name already carries it in either
/// position (the submodule resolver put it there); every later attempt, and
/// attempt 0 in that case, uses a number starting at 2. Always derived from
/// the original `target`, so tags never pile up.
pub fn rename_candidate(target: &Path, owner_tag: &str, choice: ConflictChoice, attempt: usize) -> PathBuf {
    let naming = match choice {
        ConflictChoice::Suffix => NamingOption::Suffix,
        _ => NamingOption::Prefix,
    };
    let name = target
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tagged = !owner_tag.is_empty()
        && (has_tag(&name, owner_tag, NamingOption::Prefix) || has_tag(&name, owner_tag, NamingOption::Suffix));
    let tag = match (attempt, tagged) {
        (0, false) if !owner_tag.is_empty() => owner_tag.to_string(),
        (n, false) if !owner_tag.is_empty() => (n + 1).to_string(),
        (n, _) => (n + 2).to_string(),
    };
    target.with_file_name(decorate_file_name(&name, &tag, naming))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rimsync_core::Category;

    fn ctx(category: Category, target: &str) -> ConflictContext {
        let kind = category.kind();
        ConflictContext {
            target: PathBuf::from(target),
            file: LogicalFile {
                mod_id: "CoreExpanded".into(),
                submodule: None,
                category,
                rel_path: PathBuf::from("Misc.xml"),
                source_path: PathBuf::from("Misc.xml"),
            },
            existing_owners: vec!["CoreExpanded_Balance:Keyed/Misc.xml".into()],
            category: kind,
            proposed: ConflictChoice::Suffix,
        }
    }

    struct Counting {
        asked: usize,
        answer: Decision,
    }

    impl ConflictPrompt for Counting {
        fn decide(&mut self, _ctx: &ConflictContext) -> Decision {
            self.asked += 1;
            self.answer
        }
    }

    #[test]
    fn state_transitions() {
        let mut r = ConflictResolver::new();
        assert_eq!(r.state(), &ResolverState::Idle);
        assert!(matches!(r.collide(ctx(Category::Keyed, "a.xml")), Step::Ask(_)));
        assert!(matches!(r.state(), ResolverState::AwaitingDecision(_)));
        assert_eq!(r.decide(Decision::once(ConflictChoice::Merge)), Ok(ConflictChoice::Merge));
        assert_eq!(r.state(), &ResolverState::Resolved(ConflictChoice::Merge));
        assert_eq!(r.decide(Decision::once(ConflictChoice::Skip)), Err(NotAwaiting));
    }

    #[test]
    fn sticky_skip_applies_per_category() {
        let mut r = ConflictResolver::new();
        let mut prompt = Counting {
            asked: 0,
            answer: Decision::always(ConflictChoice::Skip),
        };
        for target in ["Misc.xml", "Other.xml", "Third.xml"] {
            assert_eq!(r.resolve(ctx(Category::Keyed, target), &mut prompt), ConflictChoice::Skip);
        }
        assert_eq!(prompt.asked, 1);

        let def = Category::DefInjected {
            def_type: "ThingDef".into(),
        };
        r.resolve(ctx(def, "Weapons.xml"), &mut prompt);
        assert_eq!(prompt.asked, 2);
    }

    #[test]
    fn reset_rearms_prompting() {
        let mut r = ConflictResolver::new();
        let mut prompt = Counting {
            asked: 0,
            answer: Decision::always(ConflictChoice::Merge),
        };
        r.resolve(ctx(Category::Keyed, "a.xml"), &mut prompt);
        r.resolve(ctx(Category::Keyed, "b.xml"), &mut prompt);
        assert_eq!(prompt.asked, 1);
        r.reset_choice();
        assert_eq!(r.sticky_choice(CategoryKind::Keyed), None);
        r.resolve(ctx(Category::Keyed, "c.xml"), &mut prompt);
        assert_eq!(prompt.asked, 2);
    }

    #[test]
    fn cancel_is_terminal_and_never_sticky() {
        let mut r = ConflictResolver::new();
        let mut prompt = FixedPrompt(Decision::always(ConflictChoice::Cancel));
        assert_eq!(r.resolve(ctx(Category::Keyed, "a.xml"), &mut prompt), ConflictChoice::Cancel);
        assert_eq!(r.state(), &ResolverState::Cancelled);
        assert_eq!(r.sticky_choice(CategoryKind::Keyed), None);
        assert_eq!(
            r.collide(ctx(Category::Keyed, "b.xml")),
            Step::Decided(ConflictChoice::Cancel)
        );
    }

    #[test]
    fn same_context_same_outcome() {
        let run = || {
            let mut r = ConflictResolver::new();
            let mut prompt = FixedPrompt(Decision::always(ConflictChoice::Prefix));
            (
                r.resolve(ctx(Category::Keyed, "a.xml"), &mut prompt),
                r.resolve(ctx(Category::Keyed, "a.xml"), &mut prompt),
            )
        };
        assert_eq!(run(), run());
        assert_eq!(run().0, run().1);
    }

    #[test]
    fn rename_avoids_double_tagging() {
        let t = Path::new("L/Keyed/Misc_Balance.xml");
        assert_eq!(
            rename_candidate(t, "Balance", ConflictChoice::Suffix, 0),
            PathBuf::from("L/Keyed/Misc_Balance_2.xml")
        );
        assert_eq!(
            rename_candidate(t, "Balance", ConflictChoice::Prefix, 0),
            PathBuf::from("L/Keyed/2_Misc_Balance.xml")
        );
        assert_eq!(
            rename_candidate(Path::new("L/Keyed/Balance_Misc.xml"), "Balance", ConflictChoice::Suffix, 0),
            PathBuf::from("L/Keyed/Balance_Misc_2.xml")
        );
        let t = Path::new("L/Keyed/Misc.xml");
        assert_eq!(
            rename_candidate(t, "CoreExpanded", ConflictChoice::Suffix, 0),
            PathBuf::from("L/Keyed/Misc_CoreExpanded.xml")
        );
        assert_eq!(
            rename_candidate(t, "CoreExpanded", ConflictChoice::Suffix, 1),
            PathBuf::from("L/Keyed/Misc_2.xml")
        );
        assert_eq!(
            rename_candidate(t, "CoreExpanded", ConflictChoice::Suffix, 2),
            PathBuf::from("L/Keyed/Misc_3.xml")
        );
    }
}
