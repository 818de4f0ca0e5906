//! Declaration-time facts about controllers and their members.
//!
//! Facts are written while controllers are being declared (single writer) and
//! only read afterwards. Once the registration context is finished the
//! registry is moved into the immutable [`crate::Registration`], so no request
//! path can write to it.

use std::collections::HashMap;

use tollgate_auth::PolicyRequirement;

use crate::{ParamDescriptor, Verb};

/// What a fact is attached to: a controller, or one of its members.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    pub class: &'static str,
    pub member: Option<&'static str>,
}

impl Subject {
    pub fn class(class: &'static str) -> Self {
        Self { class, member: None }
    }

    pub fn member(class: &'static str, member: &'static str) -> Self {
        Self {
            class,
            member: Some(member),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FactKind {
    /// Base path of a controller (class-level).
    ControllerPath,
    HttpMethod,
    /// Route segment of an action.
    PathName,
    ParamSource,
    PolicyRequirement,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FactValue {
    Path(String),
    Verb(Verb),
    Param(ParamDescriptor),
    Requirement(PolicyRequirement),
}

/// A single `(subject, kind, value)` fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationFact {
    pub subject: Subject,
    pub kind: FactKind,
    pub value: FactValue,
}

#[derive(Debug, Default)]
pub struct MetadataRegistry {
    facts: HashMap<(Subject, FactKind), Vec<FactValue>>,
    /// Members per class in first-annotation order.
    members: HashMap<&'static str, Vec<&'static str>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fact. Repeated facts of the same kind accumulate in order.
    pub fn put(&mut self, subject: Subject, kind: FactKind, value: FactValue) {
        if let Some(member) = subject.member {
            let members = self.members.entry(subject.class).or_default();
            if !members.contains(&member) {
                members.push(member);
            }
        }
        self.facts.entry((subject, kind)).or_default().push(value);
    }

    /// Every fact of `kind` recorded for `subject`, oldest first.
    pub fn get(&self, subject: Subject, kind: FactKind) -> &[FactValue] {
        self.facts
            .get(&(subject, kind))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The most recent fact of `kind` for `subject`.
    pub fn get_last(&self, subject: Subject, kind: FactKind) -> Option<&FactValue> {
        self.get(subject, kind).last()
    }

    /// Annotated members of `class`, in the order they were first seen.
    pub fn members(&self, class: &str) -> &[&'static str] {
        self.members.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_class(&self, class: &str) -> bool {
        self.facts
            .keys()
            .any(|(subject, _)| subject.class == class)
    }

    /// Flattened view, for diagnostics.
    pub fn facts(&self) -> impl Iterator<Item = AnnotationFact> + '_ {
        self.facts.iter().flat_map(|((subject, kind), values)| {
            values.iter().map(move |value| AnnotationFact {
                subject: *subject,
                kind: *kind,
                value: value.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLASS: &str = "UsersController";

    #[test]
    fn facts_accumulate_per_subject_and_kind() {
        let mut registry = MetadataRegistry::new();
        let login = Subject::member(CLASS, "login");

        registry.put(login, FactKind::HttpMethod, FactValue::Verb(Verb::Post));
        registry.put(
            login,
            FactKind::PolicyRequirement,
            FactValue::Requirement(PolicyRequirement::policy("A")),
        );
        registry.put(
            login,
            FactKind::PolicyRequirement,
            FactValue::Requirement(PolicyRequirement::policy("B")),
        );

        assert_eq!(registry.get(login, FactKind::PolicyRequirement).len(), 2);
        assert_eq!(
            registry.get_last(login, FactKind::HttpMethod),
            Some(&FactValue::Verb(Verb::Post))
        );
        assert!(registry.get(login, FactKind::PathName).is_empty());
    }

    #[test]
    fn members_keep_first_seen_order() {
        let mut registry = MetadataRegistry::new();
        for member in ["b", "a", "b", "c"] {
            registry.put(
                Subject::member(CLASS, member),
                FactKind::HttpMethod,
                FactValue::Verb(Verb::Get),
            );
        }
        registry.put(
            Subject::class(CLASS),
            FactKind::ControllerPath,
            FactValue::Path("/api".into()),
        );

        assert_eq!(registry.members(CLASS), &["b", "a", "c"]);
        assert!(registry.contains_class(CLASS));
        assert!(!registry.contains_class("Other"));
        assert_eq!(registry.facts().count(), 5);
    }
}
