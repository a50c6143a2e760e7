//! Identifier conventions shared by the model builder and the backends.

use std::collections::HashSet;

/// `street address` / `street_address` / `streetAddress` -> `StreetAddress`.
/// A leading digit gets an underscore so the result is a valid identifier.
pub fn pascal_case(s: &str) -> String {
    let out = s
        .split(|c: char| !c.is_alphanumeric())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<String>();
    guard_leading_digit(out)
}

/// `street_address` -> `streetAddress`.
pub fn camel_case(s: &str) -> String {
    let pascal = pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// `streetAddress` -> `street_address`.
pub fn snake_case(s: &str) -> String {
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    guard_leading_digit(out)
}

/// Makes a schema property name usable as a field identifier without changing its casing.
pub fn identifier(s: &str) -> String {
    let out = s
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect::<String>();
    if out.is_empty() {
        return "_".to_string();
    }
    guard_leading_digit(out)
}

/// Renames repeated names by appending `2`, `3`, ... in iteration order. Names already present
/// anywhere in the input are never produced.
pub fn make_unique<'a>(names: impl IntoIterator<Item = &'a mut String>) {
    let names = names.into_iter().collect::<Vec<_>>();
    let mut taken = names.iter().map(|n| n.to_string()).collect::<HashSet<_>>();
    let mut seen = HashSet::new();
    for name in names {
        if seen.insert(name.clone()) {
            continue;
        }
        let free = (2u32..)
            .map(|n| format!("{name}{n}"))
            .find(|candidate| !taken.contains(candidate));
        if let Some(free) = free {
            taken.insert(free.clone());
            seen.insert(free.clone());
            *name = free;
        }
    }
}

fn guard_leading_digit(s: String) -> String {
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{s}")
    } else {
        s
    }
}
