//! Paper selection prompts.
//!
//! Contains system and user prompt templates plus the JSON schema used to
//! constrain the model's ranked top-K answer.

use crate::llm::ResponseSchema;

/// System prompt for top-K relevance selection
pub const SYSTEM_PROMPT: &str = r#"You are a research-scanner agent.
Your task is to select the top-K academic papers from a provided list that best match the user's request,
strictly by comparing the user's query against each paper's ABSTRACT text (do not infer from title alone).
Return only a structured JSON object following the provided schema. Do not include explanations.

Scoring & selection rules:
- Compute a semantic relevance score in [0, 1] between the user's query and each paper ABSTRACT.
- Rank by this score (descending) and return exactly K items.
- If abstracts are missing or empty, exclude those papers.
- Do NOT hallucinate: copy title, abstract and url exactly as provided.
- Be conservative: if many are weakly related, still choose the top-K but give appropriately lower scores."#;

/// User prompt template
/// Placeholders: {request}, {papers}, {k}
pub const USER_PROMPT_TEMPLATE: &str = r#"User query:
{request}

Papers (each with Title, Abstract, URL):

{papers}

Return JSON ONLY with this exact schema:
{
  "papers": [
    {
      "title": "...",
      "abstract": "...",
      "url": "...",
      "score": 0.0
    }
  ]
}
Return exactly {k} items."#;

/// Build user prompt with the request and candidate descriptions
pub fn build_user_prompt(request: &str, descriptions: &[String], k: usize) -> String {
    USER_PROMPT_TEMPLATE
        .replace("{request}", request)
        .replace("{k}", &k.to_string())
        .replace("{papers}", &descriptions.join("\n\n"))
}

/// Schema for `{papers: [{title, abstract, url, score}]}`
pub fn response_schema() -> ResponseSchema {
    ResponseSchema {
        name: "paper_selection",
        schema: serde_json::json!({
            "type": "object",
            "properties": {
                "papers": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": {"type": "string"},
                            "abstract": {"type": "string"},
                            "url": {"type": "string"},
                            "score": {"type": "number"}
                        },
                        "required": ["title", "abstract", "url", "score"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["papers"],
            "additionalProperties": false
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_user_prompt() {
        let papers = vec!["Title: A".to_string(), "Title: B".to_string()];
        let prompt = build_user_prompt("Generative AI", &papers, 2);
        assert!(prompt.starts_with("User query:\nGenerative AI\n"));
        assert!(prompt.contains("Title: A\n\nTitle: B"));
        assert!(prompt.ends_with("Return exactly 2 items."));
        assert!(!prompt.contains("{k}"));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        let required = &schema.schema["properties"]["papers"]["items"]["required"];
        assert_eq!(required.as_array().map(Vec::len), Some(4));
    }
}
