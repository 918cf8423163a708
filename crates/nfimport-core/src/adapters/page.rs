//! Parsed HTML page helpers and block-page detection.

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    pub static ref SELLER_TOP: Selector = Selector::parse("div.txtTopo#u20").unwrap();
    pub static ref HEADINGS: Selector = Selector::parse("h1, h2").unwrap();
    pub static ref KEY_SPAN: Selector = Selector::parse("span.chave").unwrap();
    pub static ref STRONG: Selector = Selector::parse("strong").unwrap();
    pub static ref TABLE: Selector = Selector::parse("table").unwrap();
    pub static ref RESULT_TABLE: Selector = Selector::parse("table#tabResult").unwrap();
    pub static ref ROW: Selector = Selector::parse("tr").unwrap();
    pub static ref CELL: Selector = Selector::parse("td").unwrap();
    pub static ref HEADER_CELL: Selector = Selector::parse("th, td").unwrap();
    pub static ref ITEM_NAME: Selector = Selector::parse("span.txtTit").unwrap();
    pub static ref ITEM_QUANTITY: Selector = Selector::parse("span.Rqtd").unwrap();
    pub static ref ITEM_UNIT: Selector = Selector::parse("span.RUN").unwrap();
    pub static ref ITEM_UNIT_PRICE: Selector = Selector::parse("span.RvlUnit").unwrap();
    pub static ref ITEM_TOTAL: Selector = Selector::parse("span.valor").unwrap();
    /// Tags searched, in order, for a "CNPJ:" seller block.
    pub static ref SELLER_BLOCKS: Vec<Selector> = ["h1", "h2", "strong", "div"]
        .iter()
        .map(|tag| Selector::parse(tag).unwrap())
        .collect();
}

/// Elements whose text is never part of the visible page.
const HIDDEN_TEXT_PARENTS: [&str; 3] = ["script", "style", "noscript"];

/// A parsed receipt page.
pub struct Page {
    document: Html,
}

impl Page {
    pub fn parse(html: &str) -> Self {
        Self {
            document: Html::parse_document(html),
        }
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Visible text fragments joined with `separator`.
    pub fn text(&self, separator: &str) -> String {
        text_fragments(self.document.root_element())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Visible text split into trimmed, non-empty lines.
    pub fn lines(&self) -> Vec<&str> {
        text_fragments(self.document.root_element())
            .flat_map(str::lines)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn select_first(&self, selector: &Selector) -> Option<ElementRef<'_>> {
        self.document.select(selector).next()
    }
}

/// Trimmed, non-empty text nodes under `element`, skipping script and style.
pub fn text_fragments(element: ElementRef<'_>) -> impl Iterator<Item = &str> {
    element.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let parent = node.parent().and_then(ElementRef::wrap)?;
        if HIDDEN_TEXT_PARENTS.contains(&parent.value().name()) {
            return None;
        }
        let trimmed = text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

/// Text content of an element with fragments joined by single spaces.
pub fn element_text(element: ElementRef<'_>) -> String {
    text_fragments(element).collect::<Vec<_>>().join(" ")
}

/// Whether `element` carries the CSS class `class`.
pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Recognizes access-denied pages served instead of a receipt.
#[derive(Debug, Clone)]
pub struct BlockDetector {
    signatures: Vec<String>,
}

impl BlockDetector {
    pub fn new(signatures: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            signatures: signatures
                .into_iter()
                .map(|s| s.into().to_lowercase())
                .collect(),
        }
    }

    /// Check raw HTML.
    pub fn is_blocked(&self, html: &str) -> bool {
        self.is_blocked_page(&Page::parse(html))
    }

    /// Check an already parsed page.
    pub fn is_blocked_page(&self, page: &Page) -> bool {
        let text = page
            .text(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        self.signatures.iter().any(|signature| text.contains(signature))
    }
}

impl Default for BlockDetector {
    fn default() -> Self {
        Self::new(crate::models::config::ExtractionConfig::default().block_signatures)
    }
}
