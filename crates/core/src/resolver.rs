//! Turning published outputs into retrievable addresses.

use std::fmt;

use serde::Serialize;

use crate::cid::ContentId;
use crate::transcoder::OutputRecord;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// A fully resolved locator for one transcoded artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievableAddress {
    pub cid: ContentId,
    pub media_type: String,
    pub url: String,
}

impl fmt::Display for RetrievableAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// Build one address per record, in input order.
///
/// `base_url` is used verbatim as the prefix of the CID, so it normally ends
/// with `/`.
pub fn resolve(records: &[OutputRecord], base_url: &str) -> Vec<RetrievableAddress> {
    records
        .iter()
        .map(|record| {
            let media_type = media_type_of(record);
            let url = format!(
                "{}{}?mediaType={}",
                base_url,
                record.cid,
                urlencoding::encode(&media_type)
            );
            RetrievableAddress {
                cid: record.cid.clone(),
                media_type,
                url,
            }
        })
        .collect()
}

/// The record's declared type, else a guess from its extension.
fn media_type_of(record: &OutputRecord) -> String {
    if let Some(ref mime) = record.mime_type {
        if !mime.trim().is_empty() {
            return mime.clone();
        }
    }

    record
        .ext
        .as_deref()
        .or_else(|| record.cid.extension())
        .and_then(|ext| mime_guess::from_ext(ext).first())
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_MEDIA_TYPE.to_string())
}
