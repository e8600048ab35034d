// src/normalize/mod.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::trace;

static STATUS_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s*\b(?:closed|open)\b\s*").expect("status regex"));
static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("parenthetical regex"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Turns a raw IPO label into the key both sources are joined on.
///
/// Implementations must be idempotent: feeding a key back in returns it unchanged.
pub trait NameMatcher {
    fn normalize(&self, raw: &str) -> String;
}

/// Strips "Open"/"Closed" status words and any parenthesised qualifier such
/// as an exchange tier, e.g. `"Gamma Open (SME)"` becomes `"Gamma"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusTagMatcher;

impl StatusTagMatcher {
    fn single_pass(raw: &str) -> String {
        let without_status = STATUS_WORD.replace_all(raw, " ");
        let without_parens = PARENTHETICAL.replace_all(&without_status, " ");
        WHITESPACE_RUN
            .replace_all(&without_parens, " ")
            .trim()
            .to_string()
    }
}

impl NameMatcher for StatusTagMatcher {
    fn normalize(&self, raw: &str) -> String {
        // Stripping a parenthetical can expose a new status word
        // ("Ope(x)n"), so repeat until nothing changes.
        let mut current = Self::single_pass(raw);
        loop {
            let next = Self::single_pass(&current);
            if next == current {
                break;
            }
            current = next;
        }
        trace!(raw, key = %current, "normalized name");
        current
    }
}

/// Maps keys produced by an inner matcher onto canonical names, for issues
/// the two sites spell differently.
#[derive(Debug, Clone)]
pub struct AliasMatcher<M> {
    inner: M,
    aliases: BTreeMap<String, String>,
}

impl<M: NameMatcher> AliasMatcher<M> {
    /// Alias keys are normalized through `inner` so a config entry written
    /// as `"Acme Infra (SME)"` still matches. Chains (`a -> b -> c`) are
    /// resolved up front so every alias points at a final name.
    pub fn new(inner: M, aliases: &BTreeMap<String, String>) -> Self {
        let direct: BTreeMap<String, String> = aliases
            .iter()
            .map(|(from, to)| (inner.normalize(from), inner.normalize(to)))
            .filter(|(from, to)| from != to)
            .collect();

        let aliases = direct
            .iter()
            .map(|(from, to)| {
                let mut target = to;
                for _ in 0..direct.len() {
                    match direct.get(target) {
                        Some(next) if next != from => target = next,
                        _ => break,
                    }
                }
                (from.clone(), target.clone())
            })
            .collect();
        Self { inner, aliases }
    }
}

impl<M: NameMatcher> NameMatcher for AliasMatcher<M> {
    fn normalize(&self, raw: &str) -> String {
        let key = self.inner.normalize(raw);
        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }
}

impl<M: NameMatcher + ?Sized> NameMatcher for &M {
    fn normalize(&self, raw: &str) -> String {
        (**self).normalize(raw)
    }
}

impl<M: NameMatcher + ?Sized> NameMatcher for Box<M> {
    fn normalize(&self, raw: &str) -> String {
        (**self).normalize(raw)
    }
}
