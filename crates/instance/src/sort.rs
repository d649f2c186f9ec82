// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::cmp::Ordering;

/// Natural (numeric-aware) string comparison.
///
/// Digit runs compare by value, so "Minecraft 2" sorts before
/// "Minecraft 10"; everything else compares per character.
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left_chars = left.chars().peekable();
    let mut right_chars = right.chars().peekable();
    loop {
        match (left_chars.peek().copied(), right_chars.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let left_number = take_number(&mut left_chars);
                let right_number = take_number(&mut right_chars);
                match left_number.cmp(&right_number) {
                    Ordering::Equal => continue,
                    other => return other,
                }
            }
            (Some(l), Some(r)) => {
                match l.cmp(&r) {
                    Ordering::Equal => {
                        left_chars.next();
                        right_chars.next();
                    }
                    other => return other,
                }
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars>) -> u128 {
    let mut number: u128 = 0;
    while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
        number = number.saturating_mul(10).saturating_add(digit as u128);
        chars.next();
    }
    number
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(natural_cmp("Minecraft 2", "Minecraft 10"), Ordering::Less);
        assert_eq!(natural_cmp("Minecraft 10", "Minecraft 2"), Ordering::Greater);
    }

    #[test]
    fn plain_strings_compare_per_character() {
        assert_eq!(natural_cmp("alpha", "beta"), Ordering::Less);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn prefix_sorts_first() {
        assert_eq!(natural_cmp("world", "world 2"), Ordering::Less);
    }

    #[test]
    fn sorting_a_list() {
        let mut names = vec!["Minecraft 10", "alpha", "Minecraft 2"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["Minecraft 2", "Minecraft 10", "alpha"]);
    }
}
