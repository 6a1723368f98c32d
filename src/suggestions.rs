//! # Error Suggestions
//!
//! Helpers that turn command-line mistakes into errors telling the user what
//! went wrong and how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crate::suggestions;
//!
//! let level = args.access_level.parse()
//!     .map_err(|_| suggestions::unknown_access_level(&args.access_level))?;
//! ```

use std::path::Path;

const ACCESS_LEVELS: &[&str] = &[
    "guest",
    "reporter",
    "devel",
    "developer",
    "maintainer",
    "owner",
    "none",
];

/// The roster file passed with `--users` does not exist.
pub fn roster_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Roster file not found: {path}\n\n\
         hint: Pass the student CSV with --users <FILE>\n\
         hint: The file needs a header line with a login column (see --login-column)",
        path = path.display()
    )
}

/// The `--blacklist` author pattern does not compile.
pub fn invalid_blacklist(pattern: &str, error: &regex::Error) -> anyhow::Error {
    let hint = match error {
        regex::Error::Syntax(msg) if msg.contains("unclosed") => {
            "hint: Check for unclosed brackets, parentheses, or braces"
        }
        regex::Error::Syntax(msg) if msg.contains("repetition") => {
            "hint: Repetition operators (+, *, ?) must follow a pattern"
        }
        _ => "hint: The pattern must match the whole author e-mail, e.g. '.*@school\\.example'",
    };

    anyhow::anyhow!(
        "Invalid blacklist pattern: {pattern}\n\
         error: {error}\n\n\
         {hint}\n\
         hint: Test patterns at https://regex101.com (select Rust flavor)"
    )
}

/// `--access-level` names no GitLab role.
pub fn unknown_access_level(value: &str) -> anyhow::Error {
    let did_you_mean = find_similar(&value.to_ascii_lowercase(), ACCESS_LEVELS)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unsupported access level: {value}{did_you_mean}\n\n\
         Valid levels are: {levels}",
        levels = ACCESS_LEVELS.join(", ")
    )
}

/// `clone` got both an exact commit and a deadline.
pub fn commit_and_deadline() -> anyhow::Error {
    anyhow::anyhow!(
        "--commit and --deadline cannot be used together\n\n\
         hint: Use --commit to check out a fixed revision of every project\n\
         hint: Use --deadline (with --blacklist or --prefer-tag) to pick each student's submission"
    )
}

/// `put-file` got both `--force-commit` and `--once`.
pub fn force_and_once() -> anyhow::Error {
    anyhow::anyhow!(
        "--force-commit and --once cannot be used together\n\n\
         hint: --once never touches a file that already exists\n\
         hint: --force-commit always creates a commit, even when the content is unchanged"
    )
}

/// Closest candidate within an edit distance of two.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0usize; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in matrix[0].iter_mut().enumerate() {
        *cell = j;
    }

    for i in 1..=a_len {
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            matrix[i][j] = (matrix[i - 1][j] + 1)
                .min(matrix[i][j - 1] + 1)
                .min(matrix[i - 1][j - 1] + cost);
        }
    }

    matrix[a_len][b_len]
}
