use std::collections::BTreeMap;

use crate::cbc::{Code, I18nString, Key, Note};

use super::Extensions;

/// Scenarios that apply to documents of one schema.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSet {
    pub schema: &'static str,
    pub list: Vec<Scenario>,
}

/// A combination of document type, tags and extension values together
/// with the notes, codes and extensions it implies.
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub name: I18nString,
    /// Document types this applies to; empty for all.
    pub types: Vec<Key>,
    /// Tags that must all be present on the document.
    pub tags: Vec<Key>,
    /// Extension key that must be present on the document or its lines.
    pub ext_key: Option<Key>,
    /// Required value for `ext_key`; any value when absent.
    pub ext_value: Option<Code>,
    pub note: Option<Note>,
    pub codes: BTreeMap<Key, Code>,
    pub ext: Extensions,
}

/// Combined outputs of every scenario matching a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioSummary {
    pub notes: Vec<Note>,
    pub codes: BTreeMap<Key, Code>,
    pub ext: Extensions,
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Self {
            name: I18nString::en(name),
            ..Default::default()
        }
    }

    pub fn types(mut self, types: &[&str]) -> Self {
        self.types = types.iter().map(|t| Key::from(*t)).collect();
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| Key::from(*t)).collect();
        self
    }

    pub fn ext_match(mut self, key: &str, value: Option<&str>) -> Self {
        self.ext_key = Some(Key::from(key));
        self.ext_value = value.map(Code::from);
        self
    }

    pub fn note(mut self, note: Note) -> Self {
        self.note = Some(note);
        self
    }

    pub fn code(mut self, key: &str, code: &str) -> Self {
        self.codes.insert(Key::from(key), Code::from(code));
        self
    }

    pub fn ext(mut self, ext: Extensions) -> Self {
        self.ext = ext;
        self
    }

    fn matches(&self, doc_type: &Key, tags: &[Key], exts: &[&Extensions]) -> bool {
        if !self.types.is_empty() && !self.types.contains(doc_type) {
            return false;
        }
        if !self.tags.iter().all(|t| tags.contains(t)) {
            return false;
        }
        match &self.ext_key {
            None => true,
            Some(key) => exts.iter().any(|ext| match (ext.get(key.as_str()), &self.ext_value) {
                (Some(v), Some(want)) => v == want,
                (Some(_), None) => true,
                (None, _) => false,
            }),
        }
    }

    /// Note as it will be added to a document.
    fn output_note(&self) -> Option<Note> {
        let note = self.note.clone()?;
        Some(match &self.ext_value {
            Some(code) if note.code.is_empty() => note.with_code(code.clone()),
            _ => note,
        })
    }
}

impl ScenarioSet {
    /// Outputs of the scenarios matching a document's type, tags and
    /// extensions. Later scenarios override codes and extensions of
    /// earlier ones; equivalent notes are only added once.
    pub fn summary_for(&self, doc_type: &Key, tags: &[Key], exts: &[&Extensions]) -> ScenarioSummary {
        let mut summary = ScenarioSummary::default();
        self.add_to(&mut summary, doc_type, tags, exts);
        summary
    }

    pub(crate) fn add_to(&self, summary: &mut ScenarioSummary, doc_type: &Key, tags: &[Key], exts: &[&Extensions]) {
        for s in self.list.iter().filter(|s| s.matches(doc_type, tags, exts)) {
            if let Some(note) = s.output_note() {
                summary.add_note(note);
            }
            for (k, v) in &s.codes {
                summary.codes.insert(k.clone(), v.clone());
            }
            summary.ext = summary.ext.merge(&s.ext);
        }
    }

    /// Every note any scenario in the set may add.
    pub(crate) fn all_notes(&self) -> impl Iterator<Item = Note> + '_ {
        self.list.iter().filter_map(Scenario::output_note)
    }

    /// Every extension key any scenario in the set may set.
    pub(crate) fn all_ext_keys(&self) -> impl Iterator<Item = &Key> {
        self.list.iter().flat_map(|s| s.ext.keys())
    }
}

impl ScenarioSummary {
    fn add_note(&mut self, note: Note) {
        match self.notes.iter_mut().find(|n| n.same_as(&note)) {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
    }
}
