//! Polyfill - Main entry point
//!
//! Owns every piece of engine state for one document: registrations,
//! compiled queries, the container set and the observers. Hosts drive it by
//! calling [`Polyfill::tick`] once per frame, or the individual handlers
//! from their own event sources.

use std::collections::HashSet;

use cqfill_css::RuleParent;
use cqfill_dom::{MutationObserver, MutationObserverInit, NodeId, ResizeObserver};

use crate::classify::{self, ContainmentAxes};
use crate::containment::{ContainerRegistration, ContainerSet, RegistrationId};
use crate::document::{Document, RuleRef, SheetId};
use crate::evaluate;
use crate::query::{self, CompiledQuery};
use crate::{Config, EngineError};

/// Observers shared by every registration, created on first use
#[derive(Debug, Default)]
struct Observers {
    mutation: MutationObserver,
    resize: ResizeObserver,
}

/// Running polyfill for one document
#[derive(Debug)]
pub struct Polyfill {
    config: Config,
    containers: ContainerSet,
    registrations: Vec<ContainerRegistration>,
    queries: Vec<CompiledQuery>,
    synthesized: HashSet<RuleRef>,
    processed_sheets: usize,
    observers: Option<Observers>,
}

impl Polyfill {
    /// Activate with the default configuration.
    ///
    /// Returns `None` without a document or when the document supports
    /// layout containment natively.
    pub fn activate(document: Option<&mut Document>) -> Option<Self> {
        Self::activate_with(document, Config::default())
    }

    /// Activate with a custom configuration
    pub fn activate_with(document: Option<&mut Document>, config: Config) -> Option<Self> {
        let Some(doc) = document else {
            tracing::debug!("No document, polyfill inactive");
            return None;
        };
        if doc.supports_native_containment() {
            tracing::info!("Layout containment is supported natively, polyfill inactive");
            return None;
        }

        tracing::info!("cqfill {} activated", crate::VERSION);
        let mut polyfill = Self {
            config,
            containers: ContainerSet::new(),
            registrations: Vec::new(),
            queries: Vec::new(),
            synthesized: HashSet::new(),
            processed_sheets: 0,
            observers: None,
        };
        polyfill.poll_style_sheets(doc);
        Some(polyfill)
    }

    /// One change-detection cycle: new sheets, then DOM mutations, then
    /// geometry changes
    pub fn tick(&mut self, doc: &mut Document) {
        self.poll_style_sheets(doc);
        self.handle_mutations(doc);
        self.handle_resize(doc);
    }

    /// Process sheets attached since the last poll; returns how many were
    /// processed
    pub fn poll_style_sheets(&mut self, doc: &mut Document) -> usize {
        let count = doc.style_sheets().len();
        let mut processed = 0;
        while self.processed_sheets < count {
            let sheet = SheetId(self.processed_sheets);
            self.processed_sheets += 1;

            if !doc.is_same_origin(sheet) {
                tracing::debug!("Skipping cross-origin style sheet {:?}", sheet);
                continue;
            }
            self.polyfill_container_queries(doc, sheet);
            self.polyfill_layout_containment(doc, sheet);
            processed += 1;
        }
        processed
    }

    /// Deliver journaled DOM mutations; when any are relevant, re-run every
    /// registration and then the query evaluation. Returns whether it ran.
    pub fn handle_mutations(&mut self, doc: &mut Document) -> bool {
        let records = doc.tree.take_mutation_records();
        let Some(observers) = self.observers.as_mut() else {
            return false;
        };
        if records.is_empty() || observers.mutation.deliver(&doc.tree, &records) == 0 {
            return false;
        }
        let delivered = observers.mutation.take_records();
        tracing::trace!("Handling {} mutation records", delivered.len());

        self.run_registration_updates(doc);
        self.reevaluate(doc);
        true
    }

    /// Check observed container sizes; re-evaluate queries on any change.
    /// Returns whether it ran.
    pub fn handle_resize(&mut self, doc: &mut Document) -> bool {
        let Some(observers) = self.observers.as_mut() else {
            return false;
        };
        let entries = observers.resize.check_sizes(&doc.tree);
        if entries.is_empty() {
            return false;
        }
        tracing::trace!("Handling {} resize entries", entries.len());
        self.reevaluate(doc);
        true
    }

    /// Re-run the query evaluation loop; returns rewritten selector count
    pub fn reevaluate(&mut self, doc: &mut Document) -> usize {
        evaluate::reevaluate(doc, &self.queries, &self.containers, &self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn containers(&self) -> &ContainerSet {
        &self.containers
    }

    pub fn registrations(&self) -> &[ContainerRegistration] {
        &self.registrations
    }

    pub fn compiled_queries(&self) -> &[CompiledQuery] {
        &self.queries
    }

    /// Whether the engine inserted this rule
    pub fn is_synthesized(&self, rule: RuleRef) -> bool {
        self.synthesized.contains(&rule)
    }

    /// Whether geometry observation currently covers `element`
    pub fn is_observing_size(&self, element: NodeId) -> bool {
        self.observers.as_ref().is_some_and(|o| o.resize.is_observing(element))
    }

    fn polyfill_container_queries(&mut self, doc: &mut Document, sheet: SheetId) {
        let rules = match doc.style_sheet(sheet) {
            Some(style_sheet) => {
                let skip = |rule| self.synthesized.contains(&RuleRef { sheet, rule });
                classify::container_query_rules(style_sheet, &self.config, &skip)
            }
            None => return,
        };

        for rule in rules {
            let origin = RuleRef { sheet, rule };
            match query::compile_container_rule(doc, origin, &self.config) {
                Ok(Some(compiled)) => {
                    self.mark_synthesized(doc, compiled.group);
                    self.queries.extend(compiled.queries);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping container query {:?}: {}", origin, e),
            }
        }
        self.reevaluate(doc);
    }

    fn polyfill_layout_containment(&mut self, doc: &mut Document, sheet: SheetId) {
        let rules: Vec<(cqfill_css::RuleId, ContainmentAxes)> = match doc.style_sheet(sheet) {
            Some(style_sheet) => {
                let skip = |rule| self.synthesized.contains(&RuleRef { sheet, rule });
                classify::containment_rules(style_sheet, &self.config, &skip)
            }
            None => return,
        };

        let mut changed = false;
        for (rule, axes) in rules {
            let origin = RuleRef { sheet, rule };
            let id = RegistrationId(self.registrations.len());
            match ContainerRegistration::register(doc, id, origin, axes) {
                Ok(mut registration) => {
                    self.mark_synthesized(doc, registration.group());
                    self.ensure_observers();
                    match registration.update(doc, &mut self.containers) {
                        Ok(updated) => changed |= updated,
                        Err(e) => tracing::warn!("Container rule {:?} failed to update: {}", origin, e),
                    }
                    self.registrations.push(registration);
                }
                Err(e) => tracing::warn!("Skipping container rule {:?}: {}", origin, e),
            }
        }

        // Queries compiled earlier were evaluated against the old container set
        if changed {
            self.resubscribe();
            self.reevaluate(doc);
        }
    }

    fn run_registration_updates(&mut self, doc: &mut Document) {
        let mut changed = false;
        for registration in &mut self.registrations {
            match registration.update(doc, &mut self.containers) {
                Ok(updated) => changed |= updated,
                Err(e) => tracing::warn!(
                    "Container rule {:?} failed to update: {}",
                    registration.origin(),
                    e
                ),
            }
        }
        if changed {
            self.resubscribe();
        }
    }

    fn ensure_observers(&mut self) {
        if self.observers.is_none() {
            let mut observers = Observers::default();
            observers.mutation.observe(NodeId::ROOT, MutationObserverInit::subtree_all());
            self.observers = Some(observers);
            tracing::debug!("Observers created");
        }
    }

    /// Observe exactly the current containers
    fn resubscribe(&mut self) {
        let Some(observers) = self.observers.as_mut() else {
            return;
        };
        observers.resize.disconnect();
        for (container, _) in self.containers.iter() {
            observers.resize.observe(container);
        }
    }

    /// Record a synthesized group and all of its rules
    fn mark_synthesized(&mut self, doc: &Document, group: RuleRef) {
        self.synthesized.insert(group);
        if let Some(sheet) = doc.style_sheet(group.sheet) {
            if let Ok(children) = sheet.css_rules(RuleParent::Rule(group.rule)) {
                for &rule in children {
                    self.synthesized.insert(RuleRef { sheet: group.sheet, rule });
                }
            }
        }
    }
}
