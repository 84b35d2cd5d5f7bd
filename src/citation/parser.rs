//! Citation tag parser.
//!
//! Rewrites `\cite{..}` and `\bibliography{..}` markers into `{{ B<n>C<m> }}`
//! and `{{ B<n> }}` placeholders and records what each placeholder stands for.

use crate::core::bibliography::{bibliography_placeholder, citation_placeholder};
use crate::core::{Bibliographies, Bibliography, Citation};
use crate::error::ParseFailure;
use crate::markup::tokenizer::{find_citations, marker_key, split_bibliography_markers};

/// Wraps a placeholder name in template delimiters: `B0` becomes `{{ B0 }}`.
pub fn placeholder_token(name: &str) -> String {
    format!("{{{{ {} }}}}", name)
}

/// Extracts citation markup from document text.
///
/// The text is split on bibliography markers. For every marker, the text
/// block directly in front of it is scanned for `\cite{..}` markers, which
/// are registered under that bibliography. A key seen twice in the same
/// block reuses its first placeholder. Citation ids restart at zero for
/// every bibliography. Citations after the last bibliography marker are
/// left untouched.
///
/// Fails without producing any output when the text opens with a
/// bibliography marker.
pub fn extract(text: &str) -> Result<(Bibliographies, String), ParseFailure> {
    let pieces = split_bibliography_markers(text);

    if let [first, marker, ..] = pieces.as_slice() {
        if first.text.is_empty() {
            return Err(ParseFailure::LeadingBibliography {
                payload: marker.text.to_string(),
            });
        }
    }

    let mut output: Vec<String> = pieces.iter().map(|p| p.text.to_string()).collect();
    let mut bibliographies = Bibliographies::default();
    let mut bib_id = 0;

    for (index, piece) in pieces.iter().enumerate() {
        if !piece.is_marker {
            continue;
        }
        // Markers always sit at odd indices, so a preceding block exists.
        let preceding = pieces[index - 1].text;
        let (rewritten, citations) = rewrite_citations(preceding, bib_id);
        output[index - 1] = rewritten;

        let placeholder = bibliography_placeholder(bib_id);
        output[index] = placeholder_token(&placeholder);
        bibliographies.push(Bibliography {
            id: bib_id,
            placeholder,
            key: marker_key(piece.text).unwrap_or_default(),
            payload: piece.text.to_string(),
            citations,
        });
        bib_id += 1;
    }

    Ok((bibliographies, output.concat()))
}

fn rewrite_citations(block: &str, bib_id: usize) -> (String, Vec<Citation>) {
    let mut citations: Vec<Citation> = Vec::new();
    let mut rewritten = String::with_capacity(block.len());
    let mut last = 0;

    for found in find_citations(block) {
        rewritten.push_str(&block[last..found.start()]);
        last = found.end();

        let key = marker_key(found.as_str()).unwrap_or_default();
        let placeholder = match citations.iter().find(|c| c.key == key) {
            Some(existing) => existing.placeholder.clone(),
            None => {
                let id = citations.len();
                let placeholder = citation_placeholder(bib_id, id);
                citations.push(Citation {
                    id,
                    placeholder: placeholder.clone(),
                    key,
                    payload: found.as_str().to_string(),
                });
                placeholder
            }
        };
        rewritten.push_str(&placeholder_token(&placeholder));
    }

    rewritten.push_str(&block[last..]);
    (rewritten, citations)
}
