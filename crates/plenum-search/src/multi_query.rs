//! Multi-query expansion.
//!
//! Derives a fixed set of reformulated queries emphasizing distinct aspects
//! of the base query so retrieval surfaces passages a single framing would
//! miss: the factual claims involved, the questions raised, and the points
//! of contention personas can disagree about.

/// Placeholder substituted with the base query in each template.
pub const QUERY_PLACEHOLDER: &str = "{query}";

/// Default reformulation templates: factual-claim, interrogative, and
/// disagreement framings of the same base query.
pub fn default_templates() -> Vec<String> {
    vec![
        format!("Key factual claims about {}", QUERY_PLACEHOLDER),
        format!("What questions does {} raise?", QUERY_PLACEHOLDER),
        format!(
            "Points of contention and disagreement about {}",
            QUERY_PLACEHOLDER
        ),
    ]
}

/// Expand a base query through the given templates.
///
/// Templates without the placeholder get the base query appended, so a
/// misconfigured template still produces a usable reformulation.
pub fn reformulate(base: &str, templates: &[String]) -> Vec<String> {
    templates
        .iter()
        .map(|template| {
            if template.contains(QUERY_PLACEHOLDER) {
                template.replace(QUERY_PLACEHOLDER, base)
            } else {
                format!("{} {}", template, base)
            }
        })
        .collect()
}
