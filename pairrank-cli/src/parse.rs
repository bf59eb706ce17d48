/// Verdict extraction from judge replies.
use pairrank_core::Winner;

/// Find the verdict in a reply: the first standalone `1` or `2` token.
///
/// Digits inside longer numbers ("2023", "12") do not count. Returns `None`
/// when neither digit appears on its own.
pub fn parse_verdict(text: &str) -> Option<Winner> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|token| match token {
            "1" => Some(Winner::A),
            "2" => Some(Winner::B),
            _ => None,
        })
}
