//! Response extractor — structured payloads out of noisy tool output
//!
//! The remote producer returns free-form text blocks that usually wrap a
//! single JSON object in prose, Markdown fences, or log noise. Extraction
//! locates the first balanced `{...}` span and decodes it strictly; anything
//! that does not match the known shape yields `None`, never an error and
//! never a half-populated structure.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One content block from a tool result, as produced by the remote service.
///
/// Only blocks with `type == "text"` and `is_error == false` participate
/// in extraction; everything else is silently skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolBlock {
    /// A well-formed text block, the common case in tests and the CLI.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            block_type: "text".to_string(),
            text: text.into(),
            is_error: false,
        }
    }

    fn is_eligible(&self) -> bool {
        self.block_type == "text" && !self.is_error
    }
}

/// An externally supplied entity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(rename = "type", alias = "entityType")]
    pub entity_type: String,
    #[serde(default)]
    pub observations: Vec<String>,
}

/// An externally supplied relation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub source: String,
    pub target: String,
    #[serde(rename = "relationType")]
    pub relation_type: String,
}

/// The structured payload recovered from one extraction pass.
///
/// A missing `relations` field decodes as empty; a missing `entities`
/// field fails the decode and the whole pass yields no data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFragment {
    pub entities: Vec<EntityRecord>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

impl ExtractedFragment {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

/// Run the single extraction pass over a set of tool blocks.
///
/// Eligible blocks are concatenated with newlines first, so an entity
/// payload split across fragments is recoverable as long as the joined
/// text still contains one balanced JSON object. Any failure — no JSON
/// span, unparseable JSON, missing `entities` — is a legitimate empty
/// result for the caller, reported here as `None`.
pub fn extract_fragment(blocks: &[ToolBlock]) -> Option<ExtractedFragment> {
    let joined: Vec<&str> = blocks
        .iter()
        .filter(|b| b.is_eligible())
        .map(|b| b.text.as_str())
        .collect();
    if joined.is_empty() {
        debug!("no eligible text blocks in tool result");
        return None;
    }
    extract_from_text(&joined.join("\n"))
}

/// Extract from already-concatenated text.
pub fn extract_from_text(text: &str) -> Option<ExtractedFragment> {
    let span = first_balanced_object(text)?;
    match serde_json::from_str::<ExtractedFragment>(span) {
        Ok(fragment) => Some(fragment),
        Err(e) => {
            debug!(error = %e, "tool output JSON did not match the entity shape");
            None
        }
    }
}

/// Locate the first balanced `{...}` span in `text`.
///
/// Tracks JSON string state (including escapes) so braces inside string
/// values do not unbalance the scan.
fn first_balanced_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    debug!("no balanced JSON object in tool text");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_object_surrounded_by_prose() {
        let blocks = vec![ToolBlock::text(
            "Here is what I found:\n```json\n{\"entities\":[{\"name\":\"A\",\"type\":\"Project\",\"observations\":[\"root\"]}]}\n```\nHope that helps!",
        )];
        let fragment = extract_fragment(&blocks).expect("should extract");
        assert_eq!(fragment.entities.len(), 1);
        assert_eq!(fragment.entities[0].name, "A");
        assert!(fragment.relations.is_empty());
    }

    #[test]
    fn missing_relations_defaults_to_empty() {
        let fragment =
            extract_from_text("{\"entities\":[]}").expect("entities alone is valid");
        assert!(fragment.relations.is_empty());
    }

    #[test]
    fn missing_entities_yields_no_data() {
        assert!(extract_from_text("{\"relations\":[]}").is_none());
        assert!(extract_from_text("{\"unrelated\":true}").is_none());
    }

    #[test]
    fn unparseable_text_yields_no_data() {
        assert!(extract_from_text("no json here at all").is_none());
        assert!(extract_from_text("{\"entities\": [unterminated").is_none());
    }

    #[test]
    fn braces_inside_strings_do_not_unbalance() {
        let text = "{\"entities\":[{\"name\":\"A{B}\",\"type\":\"T\",\"observations\":[\"uses {braces} freely\"]}]}";
        let fragment = extract_from_text(text).expect("should extract");
        assert_eq!(fragment.entities[0].name, "A{B}");
    }

    #[test]
    fn error_and_non_text_blocks_are_skipped() {
        let blocks = vec![
            ToolBlock {
                block_type: "image".into(),
                text: "{\"entities\":[{\"name\":\"X\",\"type\":\"T\"}]}".into(),
                is_error: false,
            },
            ToolBlock {
                block_type: "text".into(),
                text: "{\"entities\":[{\"name\":\"Bad\",\"type\":\"T\"}]}".into(),
                is_error: true,
            },
        ];
        assert!(extract_fragment(&blocks).is_none());
    }

    #[test]
    fn fragments_concatenate_before_extraction() {
        // A payload split across two tool blocks is still one object
        let blocks = vec![
            ToolBlock::text("{\"entities\":[{\"name\":\"A\",\"type\":"),
            ToolBlock::text("\"Project\",\"observations\":[]}]}"),
        ];
        let fragment = extract_fragment(&blocks).expect("joined text extracts");
        assert_eq!(fragment.entities[0].entity_type, "Project");
    }

    #[test]
    fn first_object_wins_when_multiple_present() {
        let text = "{\"entities\":[]} {\"entities\":[{\"name\":\"late\",\"type\":\"T\"}]}";
        let fragment = extract_from_text(text).expect("first object parses");
        assert!(fragment.entities.is_empty());
    }
}
