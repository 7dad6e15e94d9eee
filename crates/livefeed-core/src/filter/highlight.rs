//! Search-hit highlighting.

use regex::RegexBuilder;

/// A piece of text, marked if it matched the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub matched: bool,
}

/// Splits `text` into alternating matched / unmatched segments.
///
/// Matching is case-insensitive and literal. An empty query yields the whole
/// text as one unmatched segment.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let query = query.trim();
    if query.is_empty() || text.is_empty() {
        return vec![Segment {
            text,
            matched: false,
        }];
    }

    let regex = match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(regex) => regex,
        Err(_) => {
            return vec![Segment {
                text,
                matched: false,
            }];
        }
    };

    let mut segments = Vec::new();
    let mut cursor = 0;
    for hit in regex.find_iter(text) {
        if hit.start() > cursor {
            segments.push(Segment {
                text: &text[cursor..hit.start()],
                matched: false,
            });
        }
        segments.push(Segment {
            text: hit.as_str(),
            matched: true,
        });
        cursor = hit.end();
    }
    if cursor < text.len() {
        segments.push(Segment {
            text: &text[cursor..],
            matched: false,
        });
    }
    segments
}
