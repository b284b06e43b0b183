//! Extraction of generated source from an oracle response.

use std::sync::OnceLock;

use regex::Regex;

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        // opening fence with optional info string, body, closing fence
        Regex::new(r"```[^\n]*\n([\s\S]*?)```").expect("fence pattern is valid")
    })
}

/// Pick the generated unit out of `response`.
///
/// Returns the body of the first fenced block for which `is_definition`
/// holds. Falls back to the whole trimmed response when no fenced block
/// qualifies.
pub fn extract_code<F>(response: &str, is_definition: F) -> String
where
    F: Fn(&str) -> bool,
{
    fence_pattern()
        .captures_iter(response)
        .filter_map(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .find(|body| is_definition(body))
        .map(|body| format!("{}\n", body))
        .unwrap_or_else(|| response.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defines(body: &str) -> bool {
        body.contains("greet()")
    }

    #[test]
    fn test_first_defining_block_wins() {
        let response = "Here you go:\n```sh\necho setup\n```\nand\n```sh\ngreet() {\n  echo hi\n}\n```\n```sh\ngreet() { echo later; }\n```";
        assert_eq!(extract_code(response, defines), "greet() {\n  echo hi\n}\n");
    }

    #[test]
    fn test_language_tag_is_stripped() {
        let response = "```bash\ngreet() { echo hi; }\n```";
        assert_eq!(extract_code(response, defines), "greet() { echo hi; }\n");
    }

    #[test]
    fn test_raw_response_without_fence() {
        let response = "  greet() { echo hi; }  \n";
        assert_eq!(extract_code(response, defines), "greet() { echo hi; }");
    }

    #[test]
    fn test_fenced_blocks_without_definition_fall_back_to_raw() {
        let response = "```\necho nothing here\n```";
        assert_eq!(extract_code(response, defines), response);
    }
}
