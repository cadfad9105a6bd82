//! Instruction text sent to the model.

/// Sent ahead of the first question on a freshly uploaded document.
pub const GROUNDING_INSTRUCTIONS: &str = "You are helping and using data only from the documents \
and when necessary provide pages or locations";

/// Answer returned when the model produced no text.
pub const NO_ANSWER: &str = "No answer generated.";

/// Build the quiz instruction for `count` questions, optionally narrowed to `context`.
pub fn quiz_prompt(count: u32, context: Option<&str>) -> String {
    let focus = context
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| format!(", and focusing on: \"{}\"", c))
        .unwrap_or_default();

    format!(
        "Based only on the content of this document{focus}, generate {count} multiple choice questions.\n\
         Each should have 4 options (A-D), a correct answer key, and a brief explanation with an exact \
         quote or line from the document, along with the page number and context.\n\
         Format the response as a JSON array, with each object containing:\n\
         - \"question\"\n\
         - \"options\" (object with A, B, C, D)\n\
         - \"correct\" (A/B/C/D)\n\
         - \"explanation\"\n\
         Return only the JSON array, nothing else."
    )
}
