/// Output formatting: terminal table and JSON.
use pairrank_core::{RankedCandidate, RankedResult};
use serde::Serialize;

#[derive(Serialize)]
struct JsonOutput<'a> {
    query: &'a str,
    items: &'a [RankedCandidate],
    total_candidates: usize,
    comparisons: usize,
    fallbacks: usize,
    tournament: bool,
}

/// Longest title shown in the table before it is cut.
const MAX_TITLE_WIDTH: usize = 60;

fn display_title(title: &str) -> String {
    let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.chars().count() <= MAX_TITLE_WIDTH {
        title
    } else {
        let cut: String = title.chars().take(MAX_TITLE_WIDTH - 3).collect();
        format!("{cut}...")
    }
}

fn display_score(score: Option<f64>) -> String {
    match score {
        Some(s) => format!("{s:.4}"),
        None => "-".to_string(),
    }
}

/// Render results as a terminal table.
pub fn format_table(result: &RankedResult) -> String {
    let titles: Vec<String> = result.entries.iter().map(|r| display_title(&r.candidate.title)).collect();

    let id_width = result.entries.iter()
        .map(|r| r.candidate.id.chars().count())
        .max()
        .unwrap_or(2)
        .max(2); // at least "Id"
    let title_width = titles.iter()
        .map(|t| t.chars().count())
        .max()
        .unwrap_or(5)
        .max(5); // at least "Title"

    let mut out = String::new();
    out.push_str(&format!(" # | {:<id_width$} | {:<title_width$} |  Score\n", "Id", "Title"));
    out.push_str(&format!("---|-{}-|-{}-|--------\n", "-".repeat(id_width), "-".repeat(title_width)));

    for (r, title) in result.entries.iter().zip(&titles) {
        out.push_str(&format!(
            "{:>2} | {:<id_width$} | {:<title_width$} | {:>6}\n",
            r.rank, r.candidate.id, title, display_score(r.score),
        ));
    }

    if result.tournament {
        out.push_str(&format!(
            "\nTop {} of {} candidates ({} comparisons",
            result.entries.len(),
            result.total_candidates,
            result.comparisons,
        ));
        if result.fallbacks > 0 {
            out.push_str(&format!(", {} resolved by coin flip", result.fallbacks));
        }
        out.push_str(")\n");
    } else {
        out.push_str(&format!(
            "\n{} candidates, too few to compare; returned unranked\n",
            result.total_candidates,
        ));
    }
    out
}

/// Print results as a formatted terminal table.
pub fn print_table(result: &RankedResult) {
    print!("{}", format_table(result));
}

/// Render results as pretty JSON.
pub fn format_json(result: &RankedResult, query: &str) -> Result<String, serde_json::Error> {
    let output = JsonOutput {
        query,
        items: &result.entries,
        total_candidates: result.total_candidates,
        comparisons: result.comparisons,
        fallbacks: result.fallbacks,
        tournament: result.tournament,
    };
    serde_json::to_string_pretty(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairrank_core::Candidate;

    fn result(tournament: bool) -> RankedResult {
        RankedResult {
            entries: vec![
                RankedCandidate {
                    rank: 1,
                    candidate: Candidate::new("2401.00001", "Deep   Ensembles\nRevisited", "s"),
                    score: tournament.then_some(0.61),
                },
                RankedCandidate {
                    rank: 2,
                    candidate: Candidate::new("2401.00002", "Graph Nets", "s"),
                    score: tournament.then_some(0.25),
                },
            ],
            total_candidates: if tournament { 6 } else { 2 },
            comparisons: if tournament { 15 } else { 0 },
            fallbacks: if tournament { 2 } else { 0 },
            tournament,
        }
    }

    #[test]
    fn test_table_rows() {
        let table = format_table(&result(true));
        assert!(table.contains("Deep Ensembles Revisited"));
        assert!(table.contains("0.6100"));
        assert!(table.contains("Top 2 of 6 candidates (15 comparisons, 2 resolved by coin flip)"));
    }

    #[test]
    fn test_table_unranked() {
        let table = format_table(&result(false));
        assert!(table.contains(" -\n"));
        assert!(table.contains("too few to compare"));
    }

    #[test]
    fn test_long_titles_are_cut() {
        let long = "x".repeat(100);
        let shown = display_title(&long);
        assert_eq!(shown.chars().count(), MAX_TITLE_WIDTH);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_json_shape() {
        let json = format_json(&result(true), "uncertainty").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["query"], "uncertainty");
        assert_eq!(value["comparisons"], 15);
        assert_eq!(value["items"][0]["rank"], 1);
        assert_eq!(value["items"][0]["candidate"]["id"], "2401.00001");
        assert_eq!(value["items"][1]["score"], 0.25);
    }
}
