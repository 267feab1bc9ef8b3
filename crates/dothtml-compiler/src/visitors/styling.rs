//! Applies configured style rules.

use tracing::debug;

use super::{ControlTreeVisitor, walk_control};
use crate::control_tree::{PropertyValue, ResolvedControl, ResolvedProperty, ResolvedTree};
use crate::options::StyleRule;

pub struct Styling<'a> {
    rules: &'a [StyleRule],
    applied: usize,
}

impl<'a> Styling<'a> {
    /// Apply `rules`, returning how many property values were set.
    pub fn run(tree: &mut ResolvedTree, rules: &'a [StyleRule]) -> usize {
        if rules.is_empty() {
            return 0;
        }
        let mut pass = Styling { rules, applied: 0 };
        pass.visit_tree(tree);
        pass.applied
    }
}

fn rule_matches(rule: &StyleRule, control: &ResolvedControl) -> bool {
    (!control.tag.is_empty() && rule.control.eq_ignore_ascii_case(&control.tag)) || control.is(&rule.control)
}

impl ControlTreeVisitor for Styling<'_> {
    fn visit_control(&mut self, control: &mut ResolvedControl) {
        let rules = self.rules;
        let matching: Vec<&StyleRule> = rules.iter().filter(|rule| rule_matches(rule, control)).collect();
        for rule in matching {
            let Some(capability) = control.metadata.property(&rule.property).cloned() else {
                debug!(control = %rule.control, property = %rule.property, "style rule names an unknown property");
                continue;
            };
            if control.property(&rule.property).is_some() && !rule.overwrite {
                continue;
            }
            control.set_property(ResolvedProperty {
                name: rule.property.clone(),
                value: PropertyValue::HardCoded(rule.value.clone()),
                span: control.span,
                capability: Some(capability),
            });
            self.applied += 1;
        }
        walk_control(self, control);
    }
}
