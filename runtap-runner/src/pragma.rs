// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The pragma registry.
//!
//! TAP 13 streams may contain `pragma (+|-)<name>` directives that toggle
//! named parser behaviors for the remainder of the current run. The set of
//! known pragmas is fixed at compile time. Toggle values live in a
//! [`PragmaContext`] threaded through the parser rather than in globals;
//! the context captures the pre-suite baseline so that every test run
//! starts from the same configuration regardless of what earlier runs
//! toggled.

use crate::config::HarnessConfig;
use crate::test_set::TestSet;

/// The transition requested of a pragma handler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PragmaState {
    /// Restore the toggle to its pre-suite baseline.
    Reset,
    /// `+name`: turn the toggle on.
    On,
    /// `-name`: turn the toggle off.
    Off,
}

/// The process-wide toggles pragmas act on, plus their baseline values.
#[derive(Clone, Debug)]
pub struct PragmaContext {
    /// Enforce strict TAP. Toggled by `pragma (+|-)strict`.
    pub strict: bool,
    /// Retry stalled reads indefinitely. Toggled by `pragma (+|-)readblock`.
    pub blocking_read: bool,
    baseline: Baseline,
}

#[derive(Clone, Copy, Debug)]
struct Baseline {
    strict: bool,
    blocking_read: bool,
}

impl PragmaContext {
    /// Captures the baseline toggle values from the configuration.
    pub fn new(config: &HarnessConfig) -> Self {
        Self {
            strict: config.strict,
            blocking_read: config.blocking_read,
            baseline: Baseline {
                strict: config.strict,
                blocking_read: config.blocking_read,
            },
        }
    }

    /// Resets every registered pragma to its baseline. Issued at the start
    /// of each test run so toggles never leak across test sets.
    pub fn reset_all(&mut self) {
        for hook in PRAGMA_HOOKS {
            if let Some(handle) = hook.handle {
                handle(self, PragmaState::Reset);
            }
        }
    }
}

type HandleFn = fn(&mut PragmaContext, PragmaState);
type CheckFn = fn(&str, &mut TestSet, &mut PragmaContext) -> bool;

/// One registered pragma.
pub struct PragmaHook {
    /// The name after `+`/`-` in a pragma directive.
    pub name: &'static str,
    /// State-transition handler.
    pub handle: Option<HandleFn>,
    /// Optional claim predicate for non-pragma lines, consulted at TAP 13
    /// and above before ordinary parsing. Returning true consumes the line.
    pub check: Option<CheckFn>,
}

/// The fixed registry, in lookup order.
pub static PRAGMA_HOOKS: &[PragmaHook] = &[
    PragmaHook {
        name: "strict",
        handle: Some(handle_strict),
        check: None,
    },
    PragmaHook {
        name: "readblock",
        handle: Some(handle_readblock),
        check: None,
    },
];

fn handle_strict(ctx: &mut PragmaContext, state: PragmaState) {
    match state {
        PragmaState::Reset => ctx.strict = ctx.baseline.strict,
        PragmaState::On => ctx.strict = true,
        PragmaState::Off => ctx.strict = false,
    }
}

fn handle_readblock(ctx: &mut PragmaContext, state: PragmaState) {
    match state {
        PragmaState::Reset => ctx.blocking_read = ctx.baseline.blocking_read,
        PragmaState::On => ctx.blocking_read = true,
        PragmaState::Off => ctx.blocking_read = false,
    }
}

/// Applies the directive list after the `pragma` keyword.
///
/// The grammar is `SWITCH IDENT { ',' SWITCH IDENT }` with `SWITCH` one of
/// `+`/`-`. Unknown names are skipped without error; a missing switch is a
/// protocol violation and returns false.
pub(crate) fn apply_directives(rest: &str, ctx: &mut PragmaContext) -> bool {
    for part in rest.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let state = match part.as_bytes()[0] {
            b'+' => PragmaState::On,
            b'-' => PragmaState::Off,
            _ => return false,
        };
        let name = part[1..].trim();
        for hook in PRAGMA_HOOKS {
            if hook.name == name {
                if let Some(handle) = hook.handle {
                    handle(ctx, state);
                }
                break;
            }
        }
    }
    true
}

/// Offers a non-pragma line to every registered check predicate. Returns
/// true if some pragma claimed the line.
pub(crate) fn check_line(line: &str, ts: &mut TestSet, ctx: &mut PragmaContext) -> bool {
    for hook in PRAGMA_HOOKS {
        if let Some(check) = hook.check {
            if check(line, ts, ctx) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PragmaContext {
        PragmaContext::new(&HarnessConfig::default())
    }

    #[test]
    fn toggle_and_reset_restores_baseline() {
        let config = HarnessConfig {
            strict: true,
            ..HarnessConfig::default()
        };
        let mut ctx = PragmaContext::new(&config);
        assert!(apply_directives("-strict", &mut ctx));
        assert!(!ctx.strict);
        assert!(apply_directives("+strict", &mut ctx));
        assert!(ctx.strict);
        assert!(apply_directives("-strict", &mut ctx));
        ctx.reset_all();
        assert!(ctx.strict, "reset restores the pre-suite baseline");
    }

    #[test]
    fn comma_separated_list_with_spacing() {
        let mut ctx = ctx();
        assert!(apply_directives("+strict, +readblock", &mut ctx));
        assert!(ctx.strict);
        assert!(ctx.blocking_read);
        assert!(apply_directives("-strict,-readblock,", &mut ctx));
        assert!(!ctx.strict);
        assert!(!ctx.blocking_read);
    }

    #[test]
    fn unknown_names_are_skipped() {
        let mut ctx = ctx();
        assert!(apply_directives("+frobnicate,+strict", &mut ctx));
        assert!(ctx.strict);
    }

    #[test]
    fn missing_switch_is_malformed() {
        let mut ctx = ctx();
        assert!(!apply_directives("strict", &mut ctx));
        assert!(!apply_directives("+strict, readblock", &mut ctx));
    }

    #[test]
    fn empty_directive_list_is_a_no_op() {
        let mut ctx = ctx();
        assert!(apply_directives("", &mut ctx));
        assert!(!ctx.strict);
    }
}
