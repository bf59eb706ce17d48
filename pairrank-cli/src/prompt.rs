/// Prompt building for pairwise relevance comparisons.
use pairrank_core::Candidate;

/// Build a comparison prompt for two candidates.
///
/// The judge is asked to answer with a bare `1` or `2`, which keeps replies
/// inside a handful of tokens and makes the verdict trivial to extract.
pub fn build_prompt(query: &str, paper1: &Candidate, paper2: &Candidate) -> String {
    format!(
        "I need to determine which of these two scientific papers is more relevant \
         to this specific question:\n\n\
         QUESTION: {query}\n\n\
         PAPER 1:\n\
         Title: {title1}\n\
         Summary: {summary1}\n\n\
         PAPER 2:\n\
         Title: {title2}\n\
         Summary: {summary2}\n\n\
         Based solely on relevance to the question, which paper is more relevant?\n\
         Respond with just the number 1 or 2.\n",
        title1 = paper1.title.trim(),
        summary1 = paper1.summary.trim(),
        title2 = paper2.title.trim(),
        summary2 = paper2.summary.trim(),
    )
}
