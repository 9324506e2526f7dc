//! Prompt assembly.
//!
//! Combines the user's prompt and auxiliary data into the single input
//! string each backend sends. Both inputs are trimmed first; an input that
//! is empty after trimming counts as absent.

/// Prose join used by the OpenAI backends.
pub fn prose_join(prompt: &str, data: &str) -> String {
    match (prompt.trim(), data.trim()) {
        ("", "") => String::new(),
        (prompt, "") => prompt.to_string(),
        ("", data) => format!("Data:\n```\n{data}\n```\n"),
        (prompt, data) => format!("{prompt} in the following data: {data}"),
    }
}

/// Labelled join used by the Ollama backend.
pub fn labeled_join(prompt: &str, data: &str) -> String {
    match (prompt.trim(), data.trim()) {
        ("", "") => String::new(),
        (prompt, "") => prompt.to_string(),
        ("", data) => format!("Here is some data to analyze:\n\n```\n{data}\n```"),
        (prompt, data) => format!("{prompt}\n\nData:\n```\n{data}\n```"),
    }
}
