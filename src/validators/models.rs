//! XSD Content Model Visitor
//!
//! Matches a sequence of child elements against the particles of a model
//! group. The visitor is an iterator: each child is examined only when the
//! next step is pulled, so a consumer that stops early never looks at the rest
//! of the content.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#coss-particle

use std::collections::VecDeque;
use std::iter::Enumerate;
use std::slice::Iter;

use crate::documents::Element;

use super::groups::{GroupParticle, ModelType, XsdGroup};

/// One outcome of matching content against a model
#[derive(Debug, Clone)]
pub enum ModelStep<'a> {
    /// A child matched a particle
    Match {
        /// Matched particle
        particle: &'a GroupParticle,
        /// Matched child
        item: &'a Element,
    },
    /// A particle was passed over before reaching its minimum occurrences
    Missing {
        /// Particle under its minimum
        particle: &'a GroupParticle,
    },
    /// A choice ended without any alternative being chosen
    Incomplete {
        /// The alternatives of the choice
        expected: Vec<&'a GroupParticle>,
    },
    /// A child that no particle accepts at this point
    Unexpected {
        /// The rejected child
        item: &'a Element,
        /// Position of the child among its siblings (0-based)
        position: usize,
    },
}

impl ModelStep<'_> {
    /// Whether this step reports a content error
    pub fn is_error(&self) -> bool {
        !matches!(self, ModelStep::Match { .. })
    }
}

/// Lazy matcher of child elements against a model group
#[derive(Debug)]
pub struct ModelVisitor<'a> {
    group: &'a XsdGroup,
    items: Enumerate<Iter<'a, Element>>,
    pending: VecDeque<ModelStep<'a>>,
    /// Index of the current particle
    position: usize,
    /// Occurrences of the current particle
    count: u32,
    /// For choices: whether an alternative has been picked
    selected: bool,
    ended: bool,
}

impl<'a> ModelVisitor<'a> {
    /// Create a visitor over `items`
    pub fn new(group: &'a XsdGroup, items: &'a [Element]) -> Self {
        Self {
            group,
            items: items.iter().enumerate(),
            pending: VecDeque::new(),
            position: 0,
            count: 0,
            selected: false,
            ended: false,
        }
    }

    /// The particle the visitor currently stands on, if any
    pub fn current_particle(&self) -> Option<&'a GroupParticle> {
        let group = self.group;
        let particles = group.particles();
        match self.group.model() {
            ModelType::Choice if !self.selected => None,
            _ => particles.get(self.position),
        }
    }

    /// Whether all content has been consumed and the model closed
    pub fn is_ended(&self) -> bool {
        self.ended && self.pending.is_empty()
    }

    fn advance(&mut self, position: usize, item: &'a Element) {
        match self.group.model() {
            ModelType::Sequence => self.advance_sequence(position, item),
            ModelType::Choice => self.advance_choice(position, item),
        }
    }

    fn advance_sequence(&mut self, position: usize, item: &'a Element) {
        let group = self.group;
        let particles = group.particles();
        let start = self.position;
        let count = self.count;
        let found = (start..particles.len()).find(|&index| {
            let particle = &particles[index];
            particle.matches(&item.tag) && !(index == start && particle.occurs.is_over(count))
        });

        match found {
            Some(index) => {
                if index > start {
                    self.close_range(start, index);
                    self.position = index;
                    self.count = 0;
                }
                self.count += 1;
                self.pending.push_back(ModelStep::Match {
                    particle: &particles[index],
                    item,
                });
            }
            None => self.pending.push_back(ModelStep::Unexpected { item, position }),
        }
    }

    fn advance_choice(&mut self, position: usize, item: &'a Element) {
        let group = self.group;
        let particles = group.particles();
        if !self.selected {
            match particles.iter().position(|p| p.matches(&item.tag)) {
                Some(index) => {
                    self.selected = true;
                    self.position = index;
                    self.count = 1;
                    self.pending.push_back(ModelStep::Match {
                        particle: &particles[index],
                        item,
                    });
                }
                None => self.pending.push_back(ModelStep::Unexpected { item, position }),
            }
            return;
        }

        let particle = &particles[self.position];
        if particle.matches(&item.tag) && !particle.occurs.is_over(self.count) {
            self.count += 1;
            self.pending.push_back(ModelStep::Match { particle, item });
        } else {
            self.pending.push_back(ModelStep::Unexpected { item, position });
        }
    }

    /// Report the particles in `start..end` left under their minimum
    fn close_range(&mut self, start: usize, end: usize) {
        let group = self.group;
        let particles = group.particles();
        for (index, particle) in particles.iter().enumerate().take(end).skip(start) {
            let count = if index == self.position { self.count } else { 0 };
            if particle.occurs.is_missing(count) {
                self.pending.push_back(ModelStep::Missing { particle });
            }
        }
    }

    fn stop(&mut self) {
        self.ended = true;
        let group = self.group;
        match group.model() {
            ModelType::Sequence => {
                let start = self.position;
                self.close_range(start, group.particles().len());
            }
            ModelType::Choice if self.selected => {
                let particle = &group.particles()[self.position];
                if particle.occurs.is_missing(self.count) {
                    self.pending.push_back(ModelStep::Missing { particle });
                }
            }
            ModelType::Choice => {
                if !group.is_emptiable() {
                    self.pending.push_back(ModelStep::Incomplete {
                        expected: group.particles().iter().collect(),
                    });
                }
            }
        }
    }
}

impl<'a> Iterator for ModelVisitor<'a> {
    type Item = ModelStep<'a>;

    fn next(&mut self) -> Option<ModelStep<'a>> {
        loop {
            if let Some(step) = self.pending.pop_front() {
                return Some(step);
            }
            if self.ended {
                return None;
            }
            match self.items.next() {
                Some((position, item)) => self.advance(position, item),
                None => self.stop(),
            }
        }
    }
}
