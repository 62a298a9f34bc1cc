//! Prompts for the retrieval-augmented citation estimate.

/// System prompt for the frontier citation estimate
pub const SYSTEM_PROMPT: &str = "You estimate how many citations an academic paper will receive. Reply only with the number, no explanation.";

/// Header placed before the reference papers
const CONTEXT_HEADER: &str =
    "To provide some context, here are some other papers with their known citation counts:\n\n";

/// Build the user prompt from the target description and similar reference papers
pub fn build_user_prompt(description: &str, references: &[String]) -> String {
    let mut prompt = String::new();
    if !references.is_empty() {
        prompt.push_str(CONTEXT_HEADER);
        prompt.push_str(&references.join("\n"));
        prompt.push_str("\n\nAnd now the question for you:\n\n");
    }
    prompt.push_str("How many citations will this paper receive?\n\n");
    prompt.push_str(description);
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_context() {
        let prompt = build_user_prompt("Title: X", &[]);
        assert!(!prompt.contains("some context"));
        assert!(prompt.ends_with("Title: X"));
    }

    #[test]
    fn test_prompt_with_context() {
        let refs = vec!["Title: A\nCitations: 3\n".to_string()];
        let prompt = build_user_prompt("Title: X", &refs);
        assert!(prompt.starts_with(CONTEXT_HEADER));
        assert!(prompt.contains("Citations: 3"));
        assert!(prompt.find("Title: A").unwrap() < prompt.find("Title: X").unwrap());
    }
}
