//! Corpus text gathered for one run.

use crate::model::{Signal, SourceId};

/// One piece of text, tagged with the source it came from. Documents without
/// a source (local files, piped text) feed every signal.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: Option<SourceId>,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, source: SourceId, text: impl Into<String>) {
        self.documents.push(Document {
            source: Some(source),
            text: text.into(),
        });
    }

    pub fn push_unattributed(&mut self, text: impl Into<String>) {
        self.documents.push(Document {
            source: None,
            text: text.into(),
        });
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents that feed `signal`.
    pub fn documents_for<'a>(
        &'a self,
        signal: &'a Signal,
    ) -> impl Iterator<Item = &'a Document> + 'a {
        self.documents.iter().filter(move |d| signal.reads(d.source))
    }
}

impl FromIterator<String> for Corpus {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut corpus = Corpus::new();
        for text in iter {
            corpus.push_unattributed(text);
        }
        corpus
    }
}
