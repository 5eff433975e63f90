//! Answer prompt construction and citation extraction.
//!
//! The generator is instructed to cite context documents as
//! `[Document N]`; cited document indices map back to source pages.

use tracing::warn;

use manual_core::RerankedResult;

/// Fixed response when retrieval produces nothing usable.
pub const NO_RESULTS_ANSWER: &str = "I could not find relevant information in the manual \
to answer your question. Please verify the question or consult the full manual.";

/// Build the answer-synthesis prompt from the top reranked chunks.
pub fn build_answer_prompt(query: &str, chunks: &[RerankedResult]) -> String {
    let context_section = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[Document {} - Page {}]\n{}",
                i + 1,
                chunk.page_number,
                chunk.original_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an expert assistant for a technical operations manual.\n\n\
         CONTEXT DOCUMENTS:\n{context_section}\n\n\
         INSTRUCTIONS:\n\
         1. Answer the user's question using ONLY the information in the context documents above\n\
         2. Be precise and technical - this is for operational use\n\
         3. When you reference information, cite the document number in brackets like [Document 1]\n\
         4. If you use information from multiple documents, cite all of them like [Document 1, Document 2]\n\
         5. If the answer cannot be found in the provided context, clearly state: \
         \"This information is not available in the provided manual sections.\"\n\
         6. Do not add information from your general knowledge\n\
         7. Keep answers concise but complete\n\n\
         USER QUESTION:\n{query}\n\n\
         ANSWER:"
    )
}

/// Map `[Document N]` citations in the answer back to page numbers, in
/// ascending document order, deduplicated.
///
/// Returns an empty list when the answer carries no recognizable
/// citations; the caller falls back to the top context pages.
pub fn extract_cited_pages(answer: &str, chunks: &[RerankedResult]) -> Vec<u32> {
    let mut cited_indices: Vec<usize> = Vec::new();

    for group in citation_groups(answer) {
        for index in digit_runs(&group) {
            if !cited_indices.contains(&index) {
                cited_indices.push(index);
            }
        }
    }
    cited_indices.sort_unstable();

    let mut cited_pages: Vec<u32> = Vec::new();
    for doc_idx in cited_indices {
        if doc_idx >= 1 && doc_idx <= chunks.len() {
            let page = chunks[doc_idx - 1].page_number;
            if !cited_pages.contains(&page) {
                cited_pages.push(page);
            }
        }
    }

    if cited_pages.is_empty() {
        warn!("No citations found in answer");
    }

    cited_pages
}

/// The contents of every `[Document ...]` bracket group in the answer.
fn citation_groups(answer: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut rest = answer;

    while let Some(open) = rest.find('[') {
        let after = &rest[open + 1..];
        let Some(close) = after.find(']') else {
            break;
        };
        let inner = &after[..close];
        if inner.trim_start().starts_with("Document") {
            groups.push(inner.to_string());
        }
        rest = &after[close + 1..];
    }

    groups
}

/// Every maximal digit run in the text, parsed as usize.
fn digit_runs(text: &str) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = String::new();

    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse() {
                runs.push(n);
            }
            current.clear();
        }
    }

    runs
}
