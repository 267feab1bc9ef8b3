//! Control usage validation.
//!
//! Checks every property assignment against the markup options of the
//! property it sets, and every markup control against the view model it
//! declares. Produces one positioned report per problem; any report fails
//! the view before emission.

use dothtml_core::{DataType, PrimitiveKind, Report, Span};
use dothtml_parser::markup::BindingKind;
use dothtml_registry::{CapabilityProperty, TypeSystem};

use super::{ControlTreeVisitor, walk_control};
use crate::binder::BoundBinding;
use crate::control_tree::{ControlKind, PropertyValue, ResolvedControl, ResolvedProperty, ResolvedTree};
use crate::conversion::implicit_conversion;

const CLASS: &str = "ControlUsage";

pub struct UsageValidation<'a> {
    types: &'a dyn TypeSystem,
    path: String,
    reports: Vec<Report>,
}

impl<'a> UsageValidation<'a> {
    pub fn run(tree: &mut ResolvedTree, types: &'a dyn TypeSystem) -> Vec<Report> {
        let mut pass = UsageValidation {
            types,
            path: tree.path.clone(),
            reports: Vec::new(),
        };
        pass.visit_tree(tree);
        pass.reports
    }

    fn report(&mut self, span: Span, message: String) {
        self.reports.push(Report::new(self.path.as_str(), Some(span), CLASS, message));
    }

    fn check_required(&mut self, control: &ResolvedControl) {
        let missing: Vec<String> = control
            .metadata
            .required_properties()
            .filter(|required| control.property(&required.name).is_none())
            .map(|required| required.name.to_string())
            .collect();
        for name in missing {
            self.report(
                control.span,
                format!("control '{}' requires the property '{name}'", display_name(control)),
            );
        }
    }

    fn check_property(&mut self, control: &ResolvedControl, property: &ResolvedProperty) {
        let Some(capability) = &property.capability else {
            if let Some(binding) = property.binding()
                && binding.kind == BindingKind::Command
            {
                self.report(
                    property.span,
                    format!("HTML attribute '{}' only accepts value bindings", property.name),
                );
            }
            return;
        };
        let owner = display_name(control);
        match &property.value {
            PropertyValue::Failed(_) => {}
            PropertyValue::HardCoded(value) => {
                if !capability.markup.allow_hard_coded {
                    self.report(
                        property.span,
                        format!("property '{}' of '{owner}' must be set with a binding", property.name),
                    );
                } else if !hard_coded_fits(&capability.ty, value) {
                    self.report(
                        property.span,
                        format!(
                            "value '{value}' is not valid for property '{}' of type '{}'",
                            property.name, capability.ty
                        ),
                    );
                }
            }
            PropertyValue::Binding(binding) => {
                if !capability.markup.allow_binding {
                    self.report(
                        property.span,
                        format!("property '{}' of '{owner}' does not accept bindings", property.name),
                    );
                } else if capability.markup.is_command && binding.kind != BindingKind::Command {
                    self.report(
                        property.span,
                        format!("property '{}' of '{owner}' requires a command binding", property.name),
                    );
                } else if !capability.markup.is_command && binding.kind == BindingKind::Command {
                    self.report(
                        property.span,
                        format!("property '{}' of '{owner}' does not accept command bindings", property.name),
                    );
                } else if binding.kind == BindingKind::Value && !self.converts(binding, capability) {
                    self.report(
                        property.span,
                        format!(
                            "cannot convert binding of type '{}' to property '{}' of type '{}'",
                            binding.result_type(),
                            property.name,
                            capability.ty
                        ),
                    );
                }
            }
        }
    }

    fn converts(&self, binding: &BoundBinding, capability: &CapabilityProperty) -> bool {
        let allow_to_string = capability.ty == DataType::string();
        implicit_conversion(self.types, binding.expr.clone(), &capability.ty, allow_to_string).is_some()
    }

    fn check_markup_data_context(&mut self, control: &ResolvedControl) {
        let ControlKind::Markup { path, view_model } = &control.kind else {
            return;
        };
        let context = control.data_context.this();
        if !self.types.is_assignable(context, view_model) {
            self.report(
                control.span,
                format!(
                    "data context '{context}' is not assignable to the view model '{view_model}' of markup control '{path}'"
                ),
            );
        }
    }
}

impl ControlTreeVisitor for UsageValidation<'_> {
    fn visit_control(&mut self, control: &mut ResolvedControl) {
        self.check_required(control);
        for property in &control.properties {
            self.check_property(control, property);
        }
        self.check_markup_data_context(control);
        walk_control(self, control);
    }
}

fn display_name(control: &ResolvedControl) -> String {
    if control.tag.is_empty() {
        control.ty().simple_name()
    } else {
        control.tag.clone()
    }
}

/// Whether a hard-coded attribute value parses as `ty`.
fn hard_coded_fits(ty: &DataType, value: &str) -> bool {
    let value = value.trim();
    match ty.primitive() {
        Some(PrimitiveKind::Bool) => value.is_empty() || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
        Some(PrimitiveKind::Int32) => value.parse::<i32>().is_ok(),
        Some(PrimitiveKind::Int64) => value.parse::<i64>().is_ok(),
        Some(PrimitiveKind::Single | PrimitiveKind::Double | PrimitiveKind::Decimal) => value.parse::<f64>().is_ok(),
        _ => true,
    }
}
