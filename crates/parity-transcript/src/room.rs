/// Direction words the parser accepts on their own.
const DIRECTIONS: &[&str] = &[
    "n", "s", "e", "w", "ne", "nw", "se", "sw", "u", "d", "north", "south", "east", "west",
    "northeast", "northwest", "southeast", "southwest", "up", "down", "in", "out", "inside",
    "outside",
];

/// Verbs that move the player (and so legitimately re-display the room).
const MOVEMENT_VERBS: &[&str] = &[
    "go", "walk", "run", "enter", "exit", "leave", "climb", "cross", "jump",
];

/// Lowercase words allowed inside a title-cased room name.
const NAME_CONNECTORS: &[&str] = &[
    "of", "the", "and", "in", "on", "a", "an", "to", "at", "by", "with", "from", "near",
    "under", "over", "into", "behind",
];

/// True for commands whose response is expected to (re)display a room:
/// bare directions, movement verbs, and a bare `look`.
pub fn is_movement_command(command: &str) -> bool {
    let lower = command.trim().to_lowercase();
    let mut words = lower.split_whitespace();
    let Some(first) = words.next() else {
        return false;
    };
    let rest = words.next();
    match first {
        "look" | "l" => rest.is_none(),
        w if DIRECTIONS.contains(&w) => rest.is_none(),
        w => MOVEMENT_VERBS.contains(&w),
    }
}

/// Heuristic: a short, title-cased line without sentence punctuation, such as
/// `West of House` or `Up a Tree`.
pub fn is_room_name(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || line.chars().count() > 60 || line.contains(':') {
        return false;
    }
    if !line.chars().next().is_some_and(|c| c.is_uppercase()) {
        return false;
    }
    if matches!(
        line.chars().last(),
        Some('.' | '!' | '?' | ':' | ';' | ',' | '"' | '\'' | '>')
    ) {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() > 8 {
        return false;
    }
    words.iter().all(|w| {
        let first = w.chars().next().unwrap_or(' ');
        first.is_uppercase()
            || first.is_ascii_digit()
            || first == '('
            || NAME_CONNECTORS.contains(&w.to_lowercase().as_str())
    })
}

/// For non-movement commands, drop a leading room block (room name plus its
/// paragraph) so only the action's own response is compared. The text is
/// returned unchanged for movement commands, when it does not start with a
/// room block, or when nothing would remain after removing it.
pub fn strip_room_description(output: &str, command: &str) -> String {
    if is_movement_command(command) {
        return output.to_string();
    }
    let lines: Vec<&str> = output.lines().collect();
    let mut i = 0;
    while i < lines.len() && lines[i].trim().is_empty() {
        i += 1;
    }
    if i >= lines.len() || !is_room_name(lines[i]) {
        return output.to_string();
    }
    let prose = i + 1;
    if prose >= lines.len() || lines[prose].trim().is_empty() {
        return output.to_string();
    }
    let mut end = prose;
    while end < lines.len() && !lines[end].trim().is_empty() {
        end += 1;
    }
    let rest = &lines[end..];
    if rest.iter().all(|l| l.trim().is_empty()) {
        return output.to_string();
    }
    rest.join("\n")
}
