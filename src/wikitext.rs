// ============================================================================
// File: src/wikitext.rs
// Wikitext preparation and the instructions sent alongside it
// ============================================================================

/// Summary attached to every edit the bot saves
pub const EDIT_SUMMARY: &str = "Bot expanded article";

/// Category whose members get expanded when none is given on the command line
pub const DEFAULT_CATEGORY: &str = "Stompy, Expand!";

/// Remove the category tag from page text before it is sent for expansion.
///
/// Both the bare category name and its single-leading-space variant are
/// removed wherever they appear, then surrounding whitespace is trimmed.
pub fn strip_category_tag(content: &str, category: &str) -> String {
    if category.is_empty() {
        return content.trim().to_string();
    }

    let mut stripped = content.to_string();
    for tag in [category.to_string(), format!(" {}", category)] {
        stripped = stripped.replace(&tag, "");
    }
    stripped.trim().to_string()
}

/// Style rules for the wiki's markup dialect
pub fn system_instruction() -> String {
    let mut content = String::new();

    content.push_str("You are a technical writer expanding articles on a MediaWiki site about humanoid robots.\n\n");
    content.push_str("FORMATTING RULES:\n");
    content.push_str("- Write MediaWiki markup, never Markdown.\n");
    content.push_str("- Use == Heading == for sections and === Heading === for subsections.\n");
    content.push_str("- Use '''bold''' and ''italic'' for emphasis.\n");
    content.push_str("- Link other articles with [[Article Name]] and external pages with [https://example.com label].\n");
    content.push_str("- Use * for bulleted lists and # for numbered lists.\n");
    content.push_str("- Use {| class=\"wikitable\" ... |} for tables.\n\n");
    content.push_str("CONTENT RULES:\n");
    content.push_str("- Keep every fact, link, template and category already present in the article.\n");
    content.push_str("- Add detail, context and structure; do not invent specifications you are unsure of.\n");
    content.push_str("- Reply with the complete article body only, without commentary.\n");

    content
}

/// User turn wrapping the article text
pub fn user_prompt(text: &str) -> String {
    format!(
        "Expand the following wiki article. Return the full updated article.\n\n{}",
        text
    )
}
