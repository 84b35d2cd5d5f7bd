use serde::Serialize;

/// Templating variable name of a bibliography section.
pub fn bibliography_placeholder(bib_id: usize) -> String {
    format!("B{}", bib_id)
}

/// Templating variable name of a citation inside a bibliography section.
pub fn citation_placeholder(bib_id: usize, local_id: usize) -> String {
    format!("B{}C{}", bib_id, local_id)
}

/// One unique `\cite{...}` found in front of a bibliography marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Citation {
    /// Local id; restarts at 0 in every bibliography.
    pub id: usize,
    pub placeholder: String,
    /// Key used to join against the bibliography database.
    pub key: String,
    /// Marker text as it appeared in the document.
    pub payload: String,
}

/// One `\bibliography{...}` or `\bib{...}` marker and the citations it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bibliography {
    pub id: usize,
    pub placeholder: String,
    pub key: String,
    pub payload: String,
    /// Citations in first-seen order.
    pub citations: Vec<Citation>,
}

/// Every bibliography of a document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Bibliographies {
    entries: Vec<Bibliography>,
}

impl Bibliographies {
    pub(crate) fn push(&mut self, bibliography: Bibliography) {
        self.entries.push(bibliography);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bibliography> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks a bibliography up by its placeholder (`B0`, `B1`, ...).
    pub fn get(&self, placeholder: &str) -> Option<&Bibliography> {
        self.entries.iter().find(|b| b.placeholder == placeholder)
    }

    /// Total number of registered citations over all bibliographies.
    pub fn citation_count(&self) -> usize {
        self.entries.iter().map(|b| b.citations.len()).sum()
    }
}

impl<'a> IntoIterator for &'a Bibliographies {
    type Item = &'a Bibliography;
    type IntoIter = std::slice::Iter<'a, Bibliography>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
