//! Small English inflections for naming generated code.

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
];

const UNCOUNTABLE: &[&str] = &["equipment", "information", "series", "species", "news"];

/// `ProjectTask` → `project_task`.
pub fn underscore(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 4);
    let mut prev: Option<char> = None;
    let mut chars = word.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-' || c == ' ' || c == ':' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev = Some('_');
            continue;
        }
        if c.is_uppercase() {
            let next_lower = chars.peek().is_some_and(|n| n.is_lowercase());
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next_lower,
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// `project_task` → `ProjectTask`.
pub fn camelize(word: &str) -> String {
    underscore(word)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

/// `first_name` → `First name`, `owner_id` → `Owner`.
pub fn humanize(word: &str) -> String {
    let snake = underscore(word);
    let trimmed = snake.strip_suffix("_id").unwrap_or(&snake);
    capitalize(&trimmed.replace('_', " ").trim().to_string())
}

/// Pluralize the last word of a snake or camel cased name.
pub fn pluralize(word: &str) -> String {
    let (head, last) = match word.rfind('_') {
        Some(idx) => word.split_at(idx + 1),
        None => {
            // CamelCase: pluralize from the last capital
            let idx = word
                .char_indices()
                .filter(|(_, c)| c.is_uppercase())
                .map(|(i, _)| i)
                .last()
                .unwrap_or(0);
            word.split_at(idx)
        }
    };
    format!("{head}{}", pluralize_word(last))
}

fn pluralize_word(word: &str) -> String {
    let lower = word.to_lowercase();
    if word.is_empty() || UNCOUNTABLE.contains(&lower.as_str()) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(single, _)| *single == lower) {
        let mut out = plural.to_string();
        if word.starts_with(char::is_uppercase) {
            out = capitalize(&out);
        }
        return out;
    }
    let ends_consonant_y = lower.ends_with('y')
        && !lower
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| "aeiou".contains(c));
    if ends_consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|s| lower.ends_with(s)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
