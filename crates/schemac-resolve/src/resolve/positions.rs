//! Position field synthesis.
//!
//! A position field written to an attribute is stored as a z-curve encoded
//! long in a companion attribute `<name>_zcurve`. This pass creates the
//! companion field (outside the document, marked as synthesized) and moves
//! every `attribute` sink of the position into its own statement
//! `... | zcurve | attribute <name>_zcurve`, so the other sinks of the
//! statement keep receiving the position itself.

use schemac_model::{
    zcurve_field_name, DataType, Field, FieldOrigin, IndexingScript, SinkKind, Stage, Statement,
};
use tracing::debug;

use crate::error::CompileResult;
use crate::resolve::pipeline::{Pass, SchemaContext};

pub struct SynthesizePositions;

impl Pass for SynthesizePositions {
    fn name(&self) -> &'static str {
        "positions"
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let positions: Vec<String> = ctx
            .schema
            .fields()
            .filter(|f| is_position_type(&f.data_type) && f.zcurve_source().is_none())
            .map(|f| f.name.clone())
            .collect();

        for name in positions {
            let zcurve = zcurve_field_name(&name);
            let Some(field) = ctx.schema.field_mut(&name) else {
                continue;
            };
            if !field.indexing.writes_to(SinkKind::Attribute, &name, &name) {
                continue;
            }
            field.indexing = route_attribute_to_zcurve(&field.indexing, &name, &zcurve);
            let companion_type = match &field.data_type {
                DataType::Array(_) => DataType::array(DataType::Long),
                _ => DataType::Long,
            };
            let mut settings = field.attribute_settings.clone();
            settings.fast_search = true;

            if ctx.schema.field(&zcurve).is_none() {
                let mut companion = Field::new(zcurve.clone(), companion_type)
                    .with_attribute_settings(settings)
                    .outside_document();
                companion.origin = FieldOrigin::ZCurveOf(name.clone());
                debug!(schema = %ctx.schema.name, field = %zcurve, "synthesized zcurve attribute");
                ctx.schema.add_field(companion);
            }
        }
        Ok(())
    }
}

/// Position or array of positions.
pub fn is_position_type(data_type: &DataType) -> bool {
    data_type.primitive_base().is_position()
}

fn route_attribute_to_zcurve(script: &IndexingScript, position: &str, zcurve: &str) -> IndexingScript {
    let mut statements = Vec::with_capacity(script.statements.len() + 1);
    let mut routed = Vec::new();
    for statement in &script.statements {
        let mut kept = Vec::with_capacity(statement.stages.len());
        for stage in &statement.stages {
            let targets_position = matches!(
                stage.as_sink(),
                Some((SinkKind::Attribute, name)) if name.map_or(true, |n| n == position)
            );
            if !targets_position {
                kept.push(stage.clone());
                continue;
            }
            let mut stages: Vec<Stage> = kept.iter().filter(|s| !s.is_sink()).cloned().collect();
            if !matches!(stages.first(), Some(Stage::Input { .. })) {
                stages.insert(0, Stage::input(position));
            }
            stages.push(Stage::ZCurve);
            stages.push(Stage::sink(SinkKind::Attribute, Some(zcurve.to_string())));
            let zcurve_statement = Statement::new(stages);
            if !routed.contains(&zcurve_statement) {
                routed.push(zcurve_statement);
            }
        }
        if kept.iter().any(Stage::is_sink) {
            statements.push(Statement::new(kept));
        }
    }
    statements.extend(routed);
    IndexingScript::new(statements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(text: &str) -> IndexingScript {
        text.parse().unwrap()
    }

    #[test]
    fn test_attribute_sink_moves_to_zcurve_statement() {
        let routed = route_attribute_to_zcurve(&script("attribute | summary"), "pos", "pos_zcurve");
        assert_eq!(
            routed.to_string(),
            "summary; input pos | zcurve | attribute pos_zcurve"
        );
    }

    #[test]
    fn test_explicit_input_is_kept() {
        let routed = route_attribute_to_zcurve(
            &script("input pos | attribute pos | summary pos"),
            "pos",
            "pos_zcurve",
        );
        assert_eq!(
            routed.to_string(),
            "input pos | summary pos; input pos | zcurve | attribute pos_zcurve"
        );
    }

    #[test]
    fn test_routing_is_stable() {
        let once = route_attribute_to_zcurve(&script("attribute | summary"), "pos", "pos_zcurve");
        let twice = route_attribute_to_zcurve(&once, "pos", "pos_zcurve");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_position_types() {
        assert!(is_position_type(&DataType::Position));
        assert!(is_position_type(&DataType::array(DataType::Position)));
        assert!(!is_position_type(&DataType::Long));
    }
}
