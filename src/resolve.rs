//! Archive entry-name resolution.
//!
//! Packagers regularly get entry names slightly wrong: a leading slash, Windows
//! separators, or URL-escaped characters copied from `full-path` attributes.
//! [`candidate_entry_names`] lists the spellings worth trying, most likely
//! first.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use percent_encoding::percent_decode_str;

/// Candidate archive names for nominal path `name`, in lookup order.
///
/// 1. `name` with one leading `/` or `\` removed
/// 2. that name prefixed with `/`, then with `\`
/// 3. its percent-decoded form
/// 4. for each separator swap (`\` to `/`, then `/` to `\`) that changes the
///    name: the swapped name and its percent-decoded form
///
/// Duplicates are removed, keeping the first occurrence.
pub fn candidate_entry_names(name: &str) -> Vec<String> {
    let trimmed = name
        .strip_prefix('/')
        .or_else(|| name.strip_prefix('\\'))
        .unwrap_or(name);

    let mut candidates = Vec::new();
    push_unique(&mut candidates, String::from(trimmed));
    push_unique(&mut candidates, format!("/{}", trimmed));
    push_unique(&mut candidates, format!("\\{}", trimmed));
    if let Some(decoded) = percent_decoded(trimmed) {
        push_unique(&mut candidates, decoded);
    }

    for (from, to) in [('\\', "/"), ('/', "\\")] {
        if !trimmed.contains(from) {
            continue;
        }
        let swapped = trimmed.replace(from, to);
        let decoded = percent_decoded(&swapped);
        push_unique(&mut candidates, swapped);
        if let Some(decoded) = decoded {
            push_unique(&mut candidates, decoded);
        }
    }

    candidates
}

/// Percent-decoded `name`, when decoding changes it and yields valid UTF-8.
fn percent_decoded(name: &str) -> Option<String> {
    let decoded = percent_decode_str(name).decode_utf8().ok()?;
    if decoded == name {
        None
    } else {
        Some(decoded.into_owned())
    }
}

fn push_unique(candidates: &mut Vec<String>, candidate: String) {
    if !candidates.contains(&candidate) {
        candidates.push(candidate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_candidates() {
        assert_eq!(
            candidate_entry_names("mimetype"),
            ["mimetype", "/mimetype", "\\mimetype"]
        );
    }

    #[test]
    fn test_leading_separator_is_stripped_once() {
        let candidates = candidate_entry_names("/OEBPS/content.opf");
        assert_eq!(candidates[0], "OEBPS/content.opf");
        assert_eq!(candidates[1], "/OEBPS/content.opf");

        let candidates = candidate_entry_names("\\mimetype");
        assert_eq!(candidates[0], "mimetype");
    }

    #[test]
    fn test_separator_swap_follows_decoding() {
        let candidates = candidate_entry_names("META-INF/container.xml");
        assert_eq!(
            candidates,
            [
                "META-INF/container.xml",
                "/META-INF/container.xml",
                "\\META-INF/container.xml",
                "META-INF\\container.xml",
            ]
        );
    }

    #[test]
    fn test_percent_decoded_candidates() {
        let candidates = candidate_entry_names("OEBPS/my%20book.opf");
        assert_eq!(candidates[3], "OEBPS/my book.opf");
        assert!(candidates.contains(&String::from("OEBPS\\my%20book.opf")));
        assert!(candidates.contains(&String::from("OEBPS\\my book.opf")));
    }

    #[test]
    fn test_invalid_escape_is_not_a_candidate() {
        // %FF decodes to a lone byte that is not UTF-8.
        let candidates = candidate_entry_names("a%FF.opf");
        assert_eq!(candidates, ["a%FF.opf", "/a%FF.opf", "\\a%FF.opf"]);
    }
}
