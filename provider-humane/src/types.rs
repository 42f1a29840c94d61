//! Humane Center API response types

use bridge_traits::content::{ContentPage, MemoryContentEnvelope};
use serde::Deserialize;

/// Paged listing returned by `capture/captures`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageableContentEnvelope {
    /// Envelopes on this page
    #[serde(default)]
    pub content: Vec<MemoryContentEnvelope>,

    /// Total items across all pages
    pub total_elements: u64,

    #[serde(default)]
    pub total_pages: Option<u32>,

    /// Zero-based index of this page
    #[serde(default)]
    pub number: Option<u32>,
}

impl From<PageableContentEnvelope> for ContentPage {
    fn from(page: PageableContentEnvelope) -> Self {
        ContentPage {
            items: page.content,
            total_elements: page.total_elements,
        }
    }
}
