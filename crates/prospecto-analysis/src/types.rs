//! Gemini `generateContent` wire types.

use prospecto_core::Citation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateRequest<'a> {
    pub contents: Vec<Content<'a>>,
    pub tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content<'a> {
    pub role: &'static str,
    pub parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestPart<'a> {
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct Tool {
    pub google_search: GoogleSearch,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct GoogleSearch {}

impl<'a> GenerateRequest<'a> {
    /// A single-turn request with search grounding enabled.
    pub fn grounded(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch::default(),
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<CandidateContent>,
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CandidateContent {
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct GroundingMetadata {
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct GroundingChunk {
    pub web: Option<WebSource>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct WebSource {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// Text and grounding sources of the first candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub citations: Vec<Citation>,
}

impl From<GenerateResponse> for ModelReply {
    fn from(response: GenerateResponse) -> Self {
        let Some(first) = response.candidates.into_iter().next() else {
            return ModelReply::default();
        };

        let text = first
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();

        let mut citations: Vec<Citation> = Vec::new();
        for web in first
            .grounding_metadata
            .into_iter()
            .flat_map(|m| m.grounding_chunks)
            .filter_map(|chunk| chunk.web)
        {
            let (Some(uri), Some(title)) = (web.uri, web.title) else {
                continue;
            };
            if uri.is_empty() || title.is_empty() || citations.iter().any(|c| c.uri == uri) {
                continue;
            }
            citations.push(Citation { uri, title });
        }

        ModelReply {
            text: text.trim().to_string(),
            citations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_google_search_tool() {
        let json = serde_json::to_value(GenerateRequest::grounded("hello")).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert!(json["tools"][0]["google_search"].is_object());
    }

    #[test]
    fn reply_joins_parts_and_dedupes_sources() {
        let raw = serde_json::json!({
            "candidates": [{
                "content": { "parts": [ { "text": "{\"establishments\": " }, { "text": "[]}" } ] },
                "groundingMetadata": {
                    "groundingChunks": [
                        { "web": { "uri": "https://a.example", "title": "A" } },
                        { "web": { "uri": "https://a.example", "title": "A again" } },
                        { "web": { "uri": "https://b.example" } },
                        { "retrievedContext": {} },
                        { "web": { "uri": "https://c.example", "title": "C" } }
                    ]
                }
            }]
        });
        let response: GenerateResponse = serde_json::from_value(raw).unwrap();
        let reply = ModelReply::from(response);
        assert_eq!(reply.text, "{\"establishments\": []}");
        let uris: Vec<_> = reply.citations.iter().map(|c| c.uri.as_str()).collect();
        assert_eq!(uris, vec!["https://a.example", "https://c.example"]);
    }

    #[test]
    fn empty_candidates_give_empty_reply() {
        let reply = ModelReply::from(GenerateResponse::default());
        assert!(reply.text.is_empty());
        assert!(reply.citations.is_empty());
    }
}
