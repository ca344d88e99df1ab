//! Field data types.
//!
//! Data types are structural: collections own their element type, struct
//! types are referred to by name and looked up in the owning document type,
//! and reference types name the target document type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declared data type of a field or struct sub-field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum DataType {
    Bool,
    Byte,
    Int,
    Long,
    Float16,
    Float,
    Double,
    String,
    Raw,
    Uri,
    Predicate,
    Array(Box<DataType>),
    WeightedSet(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    /// A struct type declared in the document, by name.
    Struct(String),
    Tensor(TensorType),
    /// Reference to a document of the named document type.
    Reference(String),
    /// Two-dimensional position, a struct of `x` and `y` integers.
    Position,
}

impl DataType {
    pub fn array(element: DataType) -> Self {
        DataType::Array(Box::new(element))
    }

    pub fn weighted_set(element: DataType) -> Self {
        DataType::WeightedSet(Box::new(element))
    }

    pub fn map(key: DataType, value: DataType) -> Self {
        DataType::Map(Box::new(key), Box::new(value))
    }

    pub fn structure(name: impl Into<String>) -> Self {
        DataType::Struct(name.into())
    }

    pub fn reference(document: impl Into<String>) -> Self {
        DataType::Reference(document.into())
    }

    /// Returns true for the single-valued builtin types usable as collection
    /// elements and map keys.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            DataType::Bool
                | DataType::Byte
                | DataType::Int
                | DataType::Long
                | DataType::Float16
                | DataType::Float
                | DataType::Double
                | DataType::String
                | DataType::Raw
                | DataType::Uri
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Byte
                | DataType::Int
                | DataType::Long
                | DataType::Float16
                | DataType::Float
                | DataType::Double
        )
    }

    /// True for string-like types that are tokenized when indexed.
    pub fn is_text(&self) -> bool {
        matches!(self, DataType::String | DataType::Uri)
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, DataType::Struct(_))
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, DataType::Tensor(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, DataType::Reference(_))
    }

    pub fn is_position(&self) -> bool {
        matches!(self, DataType::Position)
    }

    /// Element type of an array or weighted set.
    pub fn element_type(&self) -> Option<&DataType> {
        match self {
            DataType::Array(inner) | DataType::WeightedSet(inner) => Some(inner),
            _ => None,
        }
    }

    /// The type with any array/weighted-set wrapper removed.
    pub fn primitive_base(&self) -> &DataType {
        self.element_type().unwrap_or(self)
    }

    /// Name of the struct type this field is built from, looking through
    /// one level of array or the value of a map.
    pub fn struct_name(&self) -> Option<&str> {
        match self {
            DataType::Struct(name) => Some(name),
            DataType::Array(inner) | DataType::WeightedSet(inner) => inner.struct_name_direct(),
            DataType::Map(_, value) => value.struct_name_direct(),
            _ => None,
        }
    }

    fn struct_name_direct(&self) -> Option<&str> {
        match self {
            DataType::Struct(name) => Some(name),
            _ => None,
        }
    }

    /// True for types whose values have addressable sub-fields.
    pub fn is_composite(&self) -> bool {
        match self {
            DataType::Struct(_) | DataType::Map(_, _) | DataType::Position => true,
            DataType::Array(inner) => inner.is_struct(),
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "bool"),
            DataType::Byte => write!(f, "byte"),
            DataType::Int => write!(f, "int"),
            DataType::Long => write!(f, "long"),
            DataType::Float16 => write!(f, "float16"),
            DataType::Float => write!(f, "float"),
            DataType::Double => write!(f, "double"),
            DataType::String => write!(f, "string"),
            DataType::Raw => write!(f, "raw"),
            DataType::Uri => write!(f, "uri"),
            DataType::Predicate => write!(f, "predicate"),
            DataType::Array(inner) => write!(f, "array<{}>", inner),
            DataType::WeightedSet(inner) => write!(f, "weightedset<{}>", inner),
            DataType::Map(key, value) => write!(f, "map<{},{}>", key, value),
            DataType::Struct(name) => write!(f, "{}", name),
            DataType::Tensor(tensor) => write!(f, "{}", tensor),
            DataType::Reference(doc) => write!(f, "reference<{}>", doc),
            DataType::Position => write!(f, "position"),
        }
    }
}

/// Name of the zcurve-encoded long attribute synthesized for a position field.
pub fn zcurve_field_name(position_field: &str) -> String {
    format!("{}_zcurve", position_field)
}

/// Name of the synthesized summary field rendering a position as text.
pub fn position_summary_field_name(position_field: &str) -> String {
    format!("{}.position", position_field)
}

/// Name of the synthesized summary field holding the distance to the query position.
pub fn distance_summary_field_name(position_field: &str) -> String {
    format!("{}.distance", position_field)
}

/// Inverse of [`zcurve_field_name`].
pub fn position_of_zcurve(name: &str) -> Option<&str> {
    name.strip_suffix("_zcurve").filter(|base| !base.is_empty())
}

// =============================================================================
// Tensor types
// =============================================================================

/// A tensor type such as `tensor<float>(x{},y[3])`.
///
/// Only the parts the schema passes look at are modelled: the cell type and
/// whether each dimension is mapped or indexed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TensorType {
    pub cell_type: String,
    pub dimensions: Vec<TensorDimension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TensorDimension {
    pub name: String,
    pub kind: DimensionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionKind {
    Mapped,
    /// Indexed dimension, with a bound unless declared as `x[]`.
    Indexed(Option<u64>),
}

impl TensorType {
    pub fn has_mapped_dimension(&self) -> bool {
        self.dimensions
            .iter()
            .any(|d| d.kind == DimensionKind::Mapped)
    }

    pub fn has_indexed_dimension(&self) -> bool {
        self.dimensions
            .iter()
            .any(|d| matches!(d.kind, DimensionKind::Indexed(_)))
    }

    /// Dense tensors with bounded indexed dimensions only.
    pub fn is_dense(&self) -> bool {
        !self.dimensions.is_empty()
            && self
                .dimensions
                .iter()
                .all(|d| matches!(d.kind, DimensionKind::Indexed(Some(_))))
    }
}

/// Error parsing a tensor type specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorTypeError {
    pub spec: String,
    pub reason: &'static str,
}

impl fmt::Display for TensorTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid tensor type '{}': {}", self.spec, self.reason)
    }
}

impl std::error::Error for TensorTypeError {}

impl FromStr for TensorType {
    type Err = TensorTypeError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let fail = |reason| TensorTypeError {
            spec: spec.to_string(),
            reason,
        };
        let compact: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
        let rest = compact
            .strip_prefix("tensor")
            .ok_or_else(|| fail("must start with 'tensor'"))?;

        let (cell_type, rest) = match rest.strip_prefix('<') {
            Some(after) => {
                let end = after.find('>').ok_or_else(|| fail("unterminated cell type"))?;
                (after[..end].to_string(), &after[end + 1..])
            }
            None => ("double".to_string(), rest),
        };

        let body = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| fail("missing dimension list"))?;

        let mut dimensions = Vec::new();
        for dim in body.split(',').filter(|d| !d.is_empty()) {
            if let Some(name) = dim.strip_suffix("{}") {
                dimensions.push(TensorDimension {
                    name: name.to_string(),
                    kind: DimensionKind::Mapped,
                });
            } else if let Some(open) = dim.find('[') {
                let size = dim[open + 1..]
                    .strip_suffix(']')
                    .ok_or_else(|| fail("unterminated indexed dimension"))?;
                let bound = if size.is_empty() {
                    None
                } else {
                    Some(size.parse().map_err(|_| fail("invalid dimension size"))?)
                };
                dimensions.push(TensorDimension {
                    name: dim[..open].to_string(),
                    kind: DimensionKind::Indexed(bound),
                });
            } else {
                return Err(fail("dimension must be mapped '{}' or indexed '[N]'"));
            }
        }

        Ok(TensorType {
            cell_type,
            dimensions,
        })
    }
}

impl TryFrom<String> for TensorType {
    type Error = TensorTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TensorType> for String {
    fn from(value: TensorType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor<{}>(", self.cell_type)?;
        for (i, dim) in self.dimensions.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            match dim.kind {
                DimensionKind::Mapped => write!(f, "{}{{}}", dim.name)?,
                DimensionKind::Indexed(Some(size)) => write!(f, "{}[{}]", dim.name, size)?,
                DimensionKind::Indexed(None) => write!(f, "{}[]", dim.name)?,
            }
        }
        write!(f, ")")
    }
}
