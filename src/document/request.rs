//! Outbound request envelope wrapping an encoded document.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::model::Document;
use crate::error::Result;

/// Format tag for documents submitted by hand.
pub const DOCUMENT_FORMAT_MANUAL: &str = "MANUAL";
/// Document type for introducing locally produced goods into circulation.
pub const DOCUMENT_TYPE_LP_INTRODUCE_GOODS: &str = "LP_INTRODUCE_GOODS";

/// Body of a "create document" call.
///
/// `product_document` holds the base64 of the document's canonical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRequest {
    pub product_document: String,
    pub document_format: String,
    pub signature: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl DocumentRequest {
    /// Encode `document` and wrap it with `signature` and the fixed tags.
    pub fn new(document: &Document, signature: impl Into<String>) -> Result<Self> {
        let json = document.to_json()?;
        Ok(Self {
            product_document: STANDARD.encode(json.as_bytes()),
            document_format: DOCUMENT_FORMAT_MANUAL.to_string(),
            signature: signature.into(),
            doc_type: DOCUMENT_TYPE_LP_INTRODUCE_GOODS.to_string(),
        })
    }

    /// Serialize the envelope to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
