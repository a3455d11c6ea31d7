//! Sentence projection of stored documents
//!
//! Prefers the transformed body; falls back to text extracted from the raw
//! document only when the transformed body is not stored.

use std::fmt;

use scraper::{ElementRef, Html, Node};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{LexdumpError, Result};
use crate::inspect::DocumentAccessor;

/// Elements whose text is never part of the visible document
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Elements that separate words even without surrounding whitespace
const BLOCK_ELEMENTS: [&str; 22] = [
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "footer",
    "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "p", "section", "td", "title",
];

/// One sentence of a document
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
}

impl Sentence {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Turns markup into plain text
pub trait TextExtractor: Send + Sync {
    fn extract(&self, markup: &str) -> String;
}

/// Splits plain text into sentences
pub trait SentenceSplitter: Send + Sync {
    fn split(&self, text: &str) -> Vec<Sentence>;
}

/// HTML text extraction: visible text nodes with whitespace collapsed
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlTextExtractor;

impl HtmlTextExtractor {
    /// Appends the visible text below `element`, padding block elements with
    /// a space on both sides
    fn collect(element: ElementRef<'_>, text: &mut String) {
        let name = element.value().name();
        if SKIPPED_ELEMENTS.contains(&name) {
            return;
        }
        let block = BLOCK_ELEMENTS.contains(&name);
        if block {
            text.push(' ');
        }
        for child in element.children() {
            match child.value() {
                Node::Text(fragment) => text.push_str(fragment),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        Self::collect(child, text);
                    }
                }
                _ => {}
            }
        }
        if block {
            text.push(' ');
        }
    }
}

impl TextExtractor for HtmlTextExtractor {
    fn extract(&self, markup: &str) -> String {
        let document = Html::parse_document(markup);
        let mut text = String::with_capacity(markup.len());
        Self::collect(document.root_element(), &mut text);

        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Sentence boundaries from Unicode text segmentation
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeSentenceSplitter;

impl SentenceSplitter for UnicodeSentenceSplitter {
    fn split(&self, text: &str) -> Vec<Sentence> {
        text.unicode_sentences()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Sentence::new)
            .collect()
    }
}

/// Sentence view over the documents of an accessor
pub struct SentenceProjector {
    extractor: Box<dyn TextExtractor>,
    splitter: Box<dyn SentenceSplitter>,
}

impl Default for SentenceProjector {
    fn default() -> Self {
        Self::new(Box::new(HtmlTextExtractor), Box::new(UnicodeSentenceSplitter))
    }
}

impl SentenceProjector {
    pub fn new(extractor: Box<dyn TextExtractor>, splitter: Box<dyn SentenceSplitter>) -> Self {
        Self {
            extractor,
            splitter,
        }
    }

    pub fn with_extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    pub fn with_splitter(mut self, splitter: impl SentenceSplitter + 'static) -> Self {
        self.splitter = Box::new(splitter);
        self
    }

    /// Text the sentences of `docid` are cut from
    pub fn text(&self, accessor: &DocumentAccessor<'_>, docid: &str) -> Result<String> {
        match accessor.get_transformed(docid) {
            Ok(text) => Ok(text),
            Err(e) if e.is_not_stored() => {
                tracing::warn!(docid, "Transformed document not stored, extracting text from raw");
                match accessor.get_raw(docid) {
                    Ok(raw) => Ok(self.extractor.extract(&raw)),
                    Err(e) if e.is_not_stored() => Err(LexdumpError::not_stored(
                        docid,
                        "Neither transformed nor raw document",
                    )),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Sentences of `docid` in document order
    pub fn project(&self, accessor: &DocumentAccessor<'_>, docid: &str) -> Result<Vec<Sentence>> {
        let text = self.text(accessor, docid)?;
        Ok(self.splitter.split(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extraction_skips_scripts() {
        let html = "<html><head><title>T</title><style>p{}</style></head>\
                    <body><p>First  para.</p><script>var x = 1;</script><div>Second <b>bold</b>\n text.</div></body></html>";
        let text = HtmlTextExtractor.extract(html);
        assert_eq!(text, "T First para. Second bold text.");
    }

    #[test]
    fn test_closing_block_tags_separate_text() {
        assert_eq!(HtmlTextExtractor.extract("<div>A.</div>B."), "A. B.");
        assert_eq!(HtmlTextExtractor.extract("<p>x</p>y"), "x y");
        assert_eq!(
            HtmlTextExtractor.extract("<div>First sentence.</div>Second one.<p>Third</p>tail"),
            "First sentence. Second one. Third tail"
        );
        assert_eq!(
            HtmlTextExtractor.extract("<table><tr><td>a</td><td>b</td></tr></table>c"),
            "a b c"
        );
    }

    #[test]
    fn test_inline_elements_do_not_split_words() {
        assert_eq!(HtmlTextExtractor.extract("<p>un<b>break</b>able</p>"), "unbreakable");
    }

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(HtmlTextExtractor.extract("just   words"), "just words");
    }

    #[test]
    fn test_unicode_sentences() {
        let sentences = UnicodeSentenceSplitter.split("Hello there. How are you?  Fine!");
        let texts: Vec<&str> = sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Hello there.", "How are you?", "Fine!"]);

        assert!(UnicodeSentenceSplitter.split("   ").is_empty());
    }
}
