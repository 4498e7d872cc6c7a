//! Prompt assembly for grounded RPP generation.
//!
//! The template content itself is opaque to the core; this module only
//! composes grounding context, request details, and prior feedback into a
//! single prompt string.

use serde_json::Value;

const RPP_TEMPLATE: &str = "\
Kamu adalah asisten yang ahli dalam membuat Rencana Pelaksanaan Pembelajaran (RPP).
Berdasarkan informasi dari dokumen sumber, buatkan RPP yang sesuai dengan kurikulum
dan kebutuhan siswa.

Informasi dari Dokumen Sumber:
{context}

Detail RPP yang Diminta:
{question}

Buatkan RPP yang lengkap, terstruktur, dan sesuai dengan format RPP yang baik.";

/// Compose the generation prompt from grounding context, the query, extra
/// request fields, and previously stored feedback.
pub fn build_rpp_prompt(
    grounding: &str,
    query: &str,
    context: &serde_json::Map<String, Value>,
    feedback: &str,
) -> String {
    let mut question = String::from(query);

    if !context.is_empty() {
        question.push('\n');
        for (key, value) in context {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            question.push_str(&format!("{key}: {rendered}\n"));
        }
    }

    let mut prompt = RPP_TEMPLATE
        .replace("{context}", grounding)
        .replace("{question}", question.trim_end());

    if !feedback.is_empty() {
        prompt.push_str("\n\nMasukan dari RPP sebelumnya:\n");
        prompt.push_str(feedback);
    }

    prompt
}
