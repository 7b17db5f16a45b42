//! The fixed copywriting instruction sent with every page.

/// Instruction prepended to the raw event description.
pub const INVITATION_INSTRUCTIONS: &str = "\
You are an expert tech event copywriter.
Your task is to generate a compelling, structured invitation from the raw event description below.

Your output MUST include:
- A bold, engaging title and intro (this will be used as the subject)
- A clearly marked section for each of the following:
  📅 Date
  🕘 Time
  📍 Location
  🗣️ Language
  🎯 Who should attend
- A high-level agenda
- Speaker highlights
- Value of attending

Do not use HTML. Use plain text with markdown-style formatting and spacing for readability.

Format nicely, with emojis for visual appeal.

Don't break lines unnecessarily.

Output format similar to ChatGPT.

";

/// Build the full prompt for a page's raw text.
pub fn build_prompt(raw_text: &str) -> String {
    let mut prompt =
        String::with_capacity(INVITATION_INSTRUCTIONS.len() + raw_text.len() + 32);
    prompt.push_str(INVITATION_INSTRUCTIONS);
    prompt.push_str("Raw event description:\n");
    prompt.push_str(raw_text);
    prompt
}
