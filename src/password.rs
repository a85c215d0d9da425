//! Password strength policy.
//!
//! A password is strong when it is at least six characters long and mixes
//! uppercase, lowercase, digits and at least one other ("special") character.

use std::fmt;

/// Minimum accepted password length, in characters
pub const MIN_PASSWORD_LEN: usize = 6;

/// A single unmet strength rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrengthRule {
    MinLength,
    Uppercase,
    Lowercase,
    Digit,
    Special,
}

impl fmt::Display for StrengthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength => write!(f, "at least {} characters", MIN_PASSWORD_LEN),
            Self::Uppercase => write!(f, "an uppercase letter"),
            Self::Lowercase => write!(f, "a lowercase letter"),
            Self::Digit => write!(f, "a digit"),
            Self::Special => write!(f, "a special character"),
        }
    }
}

/// Returns every rule `pw` fails, empty when the password is strong.
pub fn check_strength(pw: &str) -> Vec<StrengthRule> {
    let (mut upper, mut lower, mut digit, mut special) = (false, false, false, false);
    for c in pw.chars() {
        if c.is_uppercase() {
            upper = true;
        } else if c.is_lowercase() {
            lower = true;
        } else if c.is_ascii_digit() {
            digit = true;
        } else {
            special = true;
        }
    }

    let mut unmet = Vec::new();
    if pw.chars().count() < MIN_PASSWORD_LEN {
        unmet.push(StrengthRule::MinLength);
    }
    for (ok, rule) in [
        (upper, StrengthRule::Uppercase),
        (lower, StrengthRule::Lowercase),
        (digit, StrengthRule::Digit),
        (special, StrengthRule::Special),
    ] {
        if !ok {
            unmet.push(rule);
        }
    }
    unmet
}

/// Policy gate used before accepting any new password.
pub fn strong_password_check(pw: &str) -> bool {
    check_strength(pw).is_empty()
}

/// Human-readable summary of unmet rules, e.g. "needs a digit, a special character"
pub fn describe_unmet(unmet: &[StrengthRule]) -> String {
    let parts: Vec<String> = unmet.iter().map(ToString::to_string).collect();
    format!("needs {}", parts.join(", "))
}
