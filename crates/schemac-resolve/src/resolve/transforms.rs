//! Summary transform inference.
//!
//! Every summary field gets the transform that materializes it. The
//! decision depends on three facts about the field's source:
//!
//! - its [`Shape`] (single value, collection, struct, map, position)
//! - how much of it is held in attributes ([`Coverage`])
//! - the element-filter [`Directive`] declared on the summary field
//!
//! [`decide`] maps these to a transform. Explicitly declared transforms
//! other than the element filters are kept as declared.
//!
//! Summary fields that can only be filled from the stored document are
//! reported with a disk-access warning, unless the summary is declared
//! `from-disk`.

use schemac_model::{DataType, DocumentSummary, Field, Schema, SummaryField, SummaryTransform};

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::resolve::pipeline::{BuildOptions, Pass, SchemaContext};
use crate::resolve::summaries::position_source;

pub struct InferTransforms;

impl Pass for InferTransforms {
    fn name(&self) -> &'static str {
        "transforms"
    }

    fn enabled(&self, options: &BuildOptions) -> bool {
        !options.documents_only
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let schema = &*ctx.schema;
        let mut inferred = Vec::new();
        let mut warnings = Vec::new();
        for summary in schema.summaries.values() {
            for field in summary.fields.values() {
                let facts = summary_facts(schema, field);
                let transform = infer_transform(schema, summary, field, &facts)?;
                if needs_disk_warning(summary, &facts, transform) {
                    warnings.push(disk_access_warning(schema, summary, field));
                }
                inferred.push((summary.name.clone(), field.name.clone(), transform));
            }
        }

        for (summary, field, transform) in inferred {
            if let Some(field) = ctx
                .schema
                .summaries
                .get_mut(&summary)
                .and_then(|s| s.fields.get_mut(&field))
            {
                field.transform = transform;
            }
        }
        for warning in warnings {
            ctx.diagnostics.push(warning);
        }
        Ok(())
    }
}

/// Value shape of a summary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Primitive, tensor, reference or predicate value.
    Single,
    /// Array or weighted set of primitives.
    PrimitiveCollection,
    /// Single struct value.
    Struct,
    /// Array of structs.
    StructArray,
    /// Map of primitive to primitive.
    PrimitiveMap,
    /// Map of primitive to struct.
    StructMap,
    /// Position or array of positions.
    Position,
}

impl Shape {
    pub fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Position => Shape::Position,
            DataType::Struct(_) => Shape::Struct,
            DataType::Array(inner) | DataType::WeightedSet(inner) => match inner.as_ref() {
                DataType::Position => Shape::Position,
                DataType::Struct(_) => Shape::StructArray,
                _ => Shape::PrimitiveCollection,
            },
            DataType::Map(_, value) if value.is_struct() => Shape::StructMap,
            DataType::Map(_, _) => Shape::PrimitiveMap,
            _ => Shape::Single,
        }
    }

    pub fn is_composite(self) -> bool {
        matches!(
            self,
            Shape::Struct | Shape::StructArray | Shape::PrimitiveMap | Shape::StructMap
        )
    }

    /// Shapes whose elements can be filtered by what matched.
    pub fn supports_element_filter(self) -> bool {
        matches!(
            self,
            Shape::PrimitiveCollection | Shape::StructArray | Shape::PrimitiveMap | Shape::StructMap
        )
    }
}

/// How much of a source is held in attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coverage {
    None,
    Partial,
    Full,
}

impl Coverage {
    fn of_count(attributes: usize, total: usize) -> Self {
        if total == 0 || attributes == 0 {
            Coverage::None
        } else if attributes == total {
            Coverage::Full
        } else {
            Coverage::Partial
        }
    }
}

/// Element-filter directive of a summary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    None,
    MatchedElementsOnly,
    SelectElementsBy,
}

impl Directive {
    /// `select-elements-by` wins over `matched-elements-only`; an explicit
    /// filter transform counts as `matched-elements-only`.
    pub fn of(field: &SummaryField) -> Self {
        if field.select_elements_by.is_some() {
            Directive::SelectElementsBy
        } else if field.matched_elements_only
            || field
                .explicit_transform
                .is_some_and(SummaryTransform::is_element_filter)
        {
            Directive::MatchedElementsOnly
        } else {
            Directive::None
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Directive::None => "none",
            Directive::MatchedElementsOnly => "matched-elements-only",
            Directive::SelectElementsBy => "select-elements-by",
        }
    }
}

/// Everything the transform of one summary field depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryFacts {
    pub shape: Shape,
    pub coverage: Coverage,
    pub directive: Directive,
    /// The source is an imported field.
    pub imported: bool,
    /// The summary field renames its single source.
    pub alias: bool,
    pub multiple_sources: bool,
}

/// The transform for `facts`, or the directive the shape does not support.
pub fn decide(facts: &SummaryFacts) -> Result<SummaryTransform, Directive> {
    if facts.multiple_sources {
        return Ok(SummaryTransform::None);
    }
    if facts.directive != Directive::None {
        if !facts.shape.supports_element_filter() {
            return Err(facts.directive);
        }
        return Ok(match facts.coverage {
            Coverage::Full => SummaryTransform::MatchedAttributeElementsFilter,
            Coverage::Partial | Coverage::None => SummaryTransform::MatchedElementsFilter,
        });
    }
    let transform = match (facts.shape, facts.coverage) {
        (Shape::Position, Coverage::Full) => SummaryTransform::Geopos,
        (Shape::Position, Coverage::Partial | Coverage::None) => SummaryTransform::None,
        (shape, Coverage::Full) if shape.is_composite() => SummaryTransform::AttributeCombiner,
        (_, Coverage::Full) => SummaryTransform::Attribute,
        (_, Coverage::Partial | Coverage::None) if facts.alias => SummaryTransform::Copy,
        (_, Coverage::Partial | Coverage::None) => SummaryTransform::None,
    };
    Ok(transform)
}

/// Collects the facts about a summary field's source.
pub fn summary_facts(schema: &Schema, field: &SummaryField) -> SummaryFacts {
    let mut facts = SummaryFacts {
        shape: Shape::Single,
        coverage: Coverage::None,
        directive: Directive::of(field),
        imported: false,
        alias: field.is_alias(),
        multiple_sources: field.sources.len() > 1,
    };
    if facts.multiple_sources {
        return facts;
    }
    let source = field.single_source();

    if let Some(position) = position_source(schema, source) {
        facts.shape = Shape::Position;
        facts.coverage = if position.zcurve.is_some() {
            Coverage::Full
        } else {
            Coverage::None
        };
        facts.imported = schema.imported_field(&position.position).is_some();
        facts.alias = false;
        return facts;
    }

    if let Some(declared) = schema.field(source) {
        facts.shape = Shape::of(&declared.data_type);
        facts.coverage = field_coverage(declared);
    } else if let Some(imported) = schema.imported_field(source) {
        facts.shape = Shape::of(&imported.data_type);
        facts.coverage = Coverage::Full;
        facts.imported = true;
    } else if let Some((head, path)) = source.split_once('.') {
        if let Some(sub) = schema.field(head).and_then(|f| f.struct_field(path)) {
            facts.shape = Shape::of(&sub.data_type);
            facts.coverage = field_coverage(sub);
        } else if let Some(nested) = schema.imported_field(head).and_then(|i| i.nested(path)) {
            facts.shape = Shape::of(&nested.data_type);
            facts.coverage = Coverage::Full;
            facts.imported = true;
        }
    }
    facts
}

fn field_coverage(field: &Field) -> Coverage {
    if !field.data_type.is_composite() {
        return if field.has_attribute() {
            Coverage::Full
        } else {
            Coverage::None
        };
    }
    let (attributes, total) = field
        .leaf_struct_fields()
        .fold((0, 0), |(attributes, total), (_, sub)| {
            (attributes + usize::from(sub.has_attribute()), total + 1)
        });
    Coverage::of_count(attributes, total)
}

fn infer_transform(
    schema: &Schema,
    summary: &DocumentSummary,
    field: &SummaryField,
    facts: &SummaryFacts,
) -> CompileResult<SummaryTransform> {
    if let Some(explicit) = field.explicit_transform {
        if explicit != SummaryTransform::None && !explicit.is_element_filter() {
            return Ok(explicit);
        }
    }
    decide(facts).map_err(|directive| {
        CompileError::summary(
            ErrorKind::UnsupportedSummary,
            &schema.name,
            &summary.location(),
            format!(
                "Summary field '{}': '{}' is not supported for this field type. \
                 Supported field types are: array of primitive, weighted set of primitive, array of simple struct, \
                 map of primitive type to simple struct, and map of primitive type to primitive type",
                field.name,
                directive.name()
            ),
        )
    })
}

fn needs_disk_warning(
    summary: &DocumentSummary,
    facts: &SummaryFacts,
    transform: SummaryTransform,
) -> bool {
    if summary.from_disk || facts.imported || transform.is_generated() {
        return false;
    }
    let partial_composite = facts.shape.is_composite() && facts.coverage == Coverage::Partial;
    partial_composite || (!summary.is_default() && !transform.is_attribute_backed())
}

fn disk_access_warning(
    schema: &Schema,
    summary: &DocumentSummary,
    field: &SummaryField,
) -> CompileError {
    CompileError::warning(
        ErrorKind::DiskAccess,
        format!(
            "In schema '{}', {}: Field '{}' references non-attribute fields: using this summary will require disk access",
            schema.name,
            summary.location(),
            field.name
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(shape: Shape, coverage: Coverage, directive: Directive) -> SummaryFacts {
        SummaryFacts {
            shape,
            coverage,
            directive,
            imported: false,
            alias: false,
            multiple_sources: false,
        }
    }

    const SHAPES: [Shape; 7] = [
        Shape::Single,
        Shape::PrimitiveCollection,
        Shape::Struct,
        Shape::StructArray,
        Shape::PrimitiveMap,
        Shape::StructMap,
        Shape::Position,
    ];
    const COVERAGES: [Coverage; 3] = [Coverage::None, Coverage::Partial, Coverage::Full];

    // ============================================================================
    // Decision table
    // ============================================================================

    #[test]
    fn test_without_directive() {
        use SummaryTransform as T;
        let expected = |shape: Shape, coverage: Coverage| match (shape, coverage) {
            (Shape::Position, Coverage::Full) => T::Geopos,
            (Shape::Position, _) => T::None,
            (s, Coverage::Full) if s.is_composite() => T::AttributeCombiner,
            (_, Coverage::Full) => T::Attribute,
            _ => T::None,
        };
        for shape in SHAPES {
            for coverage in COVERAGES {
                assert_eq!(
                    decide(&facts(shape, coverage, Directive::None)),
                    Ok(expected(shape, coverage)),
                    "{:?} {:?}",
                    shape,
                    coverage
                );
            }
        }
    }

    #[test]
    fn test_with_directive() {
        for directive in [Directive::MatchedElementsOnly, Directive::SelectElementsBy] {
            for shape in SHAPES {
                for coverage in COVERAGES {
                    let result = decide(&facts(shape, coverage, directive));
                    if !shape.supports_element_filter() {
                        assert_eq!(result, Err(directive));
                    } else if coverage == Coverage::Full {
                        assert_eq!(result, Ok(SummaryTransform::MatchedAttributeElementsFilter));
                    } else {
                        assert_eq!(result, Ok(SummaryTransform::MatchedElementsFilter));
                    }
                }
            }
        }
    }

    #[test]
    fn test_alias_of_stored_field_is_copy() {
        let mut f = facts(Shape::Single, Coverage::None, Directive::None);
        f.alias = true;
        assert_eq!(decide(&f), Ok(SummaryTransform::Copy));
        f.coverage = Coverage::Full;
        assert_eq!(decide(&f), Ok(SummaryTransform::Attribute));
    }

    #[test]
    fn test_multiple_sources() {
        let mut f = facts(Shape::Position, Coverage::Full, Directive::MatchedElementsOnly);
        f.multiple_sources = true;
        assert_eq!(decide(&f), Ok(SummaryTransform::None));
    }

    #[test]
    fn test_directive_precedence() {
        let mut field = SummaryField::new("f").matched_elements_only();
        assert_eq!(Directive::of(&field), Directive::MatchedElementsOnly);
        field.select_elements_by = Some("my_filter".into());
        assert_eq!(Directive::of(&field), Directive::SelectElementsBy);
        let explicit = SummaryField::new("g")
            .with_explicit_transform(SummaryTransform::MatchedElementsFilter);
        assert_eq!(Directive::of(&explicit), Directive::MatchedElementsOnly);
    }

    #[test]
    fn test_unsupported_directive_names_summary() {
        let schema = Schema::new("s");
        let short = DocumentSummary::new("short");
        let field = SummaryField::new("title").matched_elements_only();
        let err = infer_transform(
            &schema,
            &short,
            &field,
            &facts(Shape::Single, Coverage::Full, Directive::MatchedElementsOnly),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedSummary);
        assert!(err.message.starts_with(
            "For schema 's', document-summary 'short': Summary field 'title': \
             'matched-elements-only' is not supported for this field type."
        ));
    }

    #[test]
    fn test_shapes() {
        assert_eq!(Shape::of(&DataType::Int), Shape::Single);
        assert_eq!(
            Shape::of(&DataType::weighted_set(DataType::String)),
            Shape::PrimitiveCollection
        );
        assert_eq!(
            Shape::of(&DataType::array(DataType::structure("s"))),
            Shape::StructArray
        );
        assert_eq!(
            Shape::of(&DataType::map(DataType::String, DataType::structure("s"))),
            Shape::StructMap
        );
        assert_eq!(
            Shape::of(&DataType::map(DataType::String, DataType::Int)),
            Shape::PrimitiveMap
        );
        assert_eq!(Shape::of(&DataType::array(DataType::Position)), Shape::Position);
    }

    // ============================================================================
    // Disk access
    // ============================================================================

    #[test]
    fn test_disk_warning_rules() {
        let default = DocumentSummary::new("default");
        let mut short = DocumentSummary::new("short");
        let partial = facts(Shape::StructArray, Coverage::Partial, Directive::None);
        let stored = facts(Shape::Single, Coverage::None, Directive::None);

        assert!(needs_disk_warning(&default, &partial, SummaryTransform::None));
        assert!(!needs_disk_warning(&default, &stored, SummaryTransform::None));
        assert!(needs_disk_warning(&short, &stored, SummaryTransform::None));
        assert!(!needs_disk_warning(&short, &stored, SummaryTransform::DocumentId));

        short.from_disk = true;
        assert!(!needs_disk_warning(&short, &partial, SummaryTransform::None));

        let mut imported = partial;
        imported.imported = true;
        assert!(!needs_disk_warning(&default, &imported, SummaryTransform::None));
    }
}
