//! Indexing scripts.
//!
//! An indexing script is a list of statements; each statement is a pipeline
//! of stages separated by `|`. A statement reads a value (`input f`), passes
//! it through transform stages and writes it to one or more sinks
//! (`index`, `attribute`, `summary`). Sinks pass their input along, so a
//! value can be written to several sinks in one statement.
//!
//! The parser hands over statements already split into stages; the
//! [`FromStr`] impls below only tokenize stage lists, they are not a grammar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::field::Stemming;

/// The three kinds of sink a stage may write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Index,
    Attribute,
    Summary,
}

impl SinkKind {
    pub fn name(self) -> &'static str {
        match self {
            SinkKind::Index => "index",
            SinkKind::Attribute => "attribute",
            SinkKind::Summary => "summary",
        }
    }
}

/// One stage of an indexing statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Input {
        field: String,
    },
    Tokenize {
        #[serde(default)]
        normalize: bool,
        #[serde(default)]
        stem: Option<Stemming>,
    },
    Normalize,
    Lowercase,
    /// Encodes a position as a z-curve long.
    ZCurve,
    OptimizePredicate {
        #[serde(default)]
        arity: Option<u32>,
        #[serde(default)]
        lower_bound: Option<i64>,
        #[serde(default)]
        upper_bound: Option<i64>,
    },
    /// Any other value converter (`to_long`, `to_string`, `trim`, ...).
    Convert {
        function: String,
    },
    Index {
        #[serde(default)]
        field: Option<String>,
    },
    Attribute {
        #[serde(default)]
        field: Option<String>,
    },
    Summary {
        #[serde(default)]
        field: Option<String>,
    },
}

impl Stage {
    pub fn input(field: impl Into<String>) -> Self {
        Stage::Input {
            field: field.into(),
        }
    }

    pub fn sink(kind: SinkKind, field: Option<String>) -> Self {
        match kind {
            SinkKind::Index => Stage::Index { field },
            SinkKind::Attribute => Stage::Attribute { field },
            SinkKind::Summary => Stage::Summary { field },
        }
    }

    /// Sink kind and explicit output name, if this stage is a sink.
    pub fn as_sink(&self) -> Option<(SinkKind, Option<&str>)> {
        match self {
            Stage::Index { field } => Some((SinkKind::Index, field.as_deref())),
            Stage::Attribute { field } => Some((SinkKind::Attribute, field.as_deref())),
            Stage::Summary { field } => Some((SinkKind::Summary, field.as_deref())),
            _ => None,
        }
    }

    pub fn is_sink(&self) -> bool {
        self.as_sink().is_some()
    }

    pub fn is_tokenize(&self) -> bool {
        matches!(self, Stage::Tokenize { .. })
    }

    /// Equality of the values two stages produce, ignoring configuration
    /// that does not change which value ends up in a sink.
    pub fn output_equal(&self, other: &Stage) -> bool {
        match (self, other) {
            (Stage::Tokenize { .. }, Stage::Tokenize { .. }) => true,
            (Stage::OptimizePredicate { .. }, Stage::OptimizePredicate { .. }) => true,
            (a, b) => a == b,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Input { field } => write!(f, "input {}", field),
            Stage::Tokenize { normalize, stem } => {
                write!(f, "tokenize")?;
                if *normalize {
                    write!(f, " normalize")?;
                }
                if let Some(stem) = stem {
                    write!(f, " stem:\"{}\"", stem.name())?;
                }
                Ok(())
            }
            Stage::Normalize => write!(f, "normalize"),
            Stage::Lowercase => write!(f, "lowercase"),
            Stage::ZCurve => write!(f, "zcurve"),
            Stage::OptimizePredicate {
                arity,
                lower_bound,
                upper_bound,
            } => {
                write!(f, "optimize_predicate")?;
                if let Some(arity) = arity {
                    write!(f, " arity:{}", arity)?;
                }
                if let Some(lower) = lower_bound {
                    write!(f, " lower_bound:{}", lower)?;
                }
                if let Some(upper) = upper_bound {
                    write!(f, " upper_bound:{}", upper)?;
                }
                Ok(())
            }
            Stage::Convert { function } => write!(f, "{}", function),
            Stage::Index { field } | Stage::Attribute { field } | Stage::Summary { field } => {
                let kind = self.as_sink().map(|(k, _)| k.name()).unwrap_or_default();
                match field {
                    Some(name) => write!(f, "{} {}", kind, name),
                    None => write!(f, "{}", kind),
                }
            }
        }
    }
}

/// A `|`-separated pipeline of stages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statement {
    pub stages: Vec<Stage>,
}

impl Statement {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// The field named by a leading `input` stage.
    pub fn input_field(&self) -> Option<&str> {
        match self.stages.first() {
            Some(Stage::Input { field }) => Some(field),
            _ => None,
        }
    }

    pub fn sinks(&self) -> impl Iterator<Item = (SinkKind, Option<&str>)> {
        self.stages.iter().filter_map(Stage::as_sink)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

/// A field's full indexing script: `;`-separated statements.
///
/// Serialized in its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IndexingScript {
    pub statements: Vec<Statement>,
}

impl IndexingScript {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.statements.iter().flat_map(|s| s.stages.iter())
    }

    /// Output field names of every sink of `kind`, with unnamed sinks
    /// resolved to `default_field`.
    pub fn sink_targets<'a>(
        &'a self,
        kind: SinkKind,
        default_field: &'a str,
    ) -> impl Iterator<Item = &'a str> + 'a {
        self.stages()
            .filter_map(Stage::as_sink)
            .filter(move |(k, _)| *k == kind)
            .map(move |(_, name)| name.unwrap_or(default_field))
    }

    pub fn writes_to(&self, kind: SinkKind, field: &str, default_field: &str) -> bool {
        self.sink_targets(kind, default_field).any(|name| name == field)
    }
}

impl fmt::Display for IndexingScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

// =============================================================================
// Stage-list tokenizing
// =============================================================================

/// Error tokenizing a stage list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptParseError {
    pub stage: String,
    pub reason: String,
}

impl fmt::Display for ScriptParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid indexing stage '{}': {}", self.stage, self.reason)
    }
}

impl std::error::Error for ScriptParseError {}

impl FromStr for Stage {
    type Err = ScriptParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| ScriptParseError {
            stage: text.to_string(),
            reason: reason.to_string(),
        };
        let mut words = text.split_whitespace();
        let head = words.next().ok_or_else(|| fail("empty stage"))?;
        let args: Vec<&str> = words.collect();
        let optional_name = |args: &[&str]| -> Result<Option<String>, ScriptParseError> {
            match args {
                [] => Ok(None),
                [name] => Ok(Some((*name).to_string())),
                _ => Err(fail("expected at most one field name")),
            }
        };

        let stage = match head {
            "input" => match args.as_slice() {
                [name] => Stage::input(*name),
                _ => return Err(fail("input takes exactly one field name")),
            },
            "tokenize" => {
                let mut normalize = false;
                let mut stem = None;
                for arg in args {
                    if arg == "normalize" {
                        normalize = true;
                    } else if arg == "stem" {
                        stem = Some(Stemming::Best);
                    } else if let Some(mode) = arg.strip_prefix("stem:") {
                        let mode = mode.trim_matches('"');
                        stem = Some(
                            Stemming::from_name(mode).ok_or_else(|| fail("unknown stemming"))?,
                        );
                    } else {
                        return Err(fail("unknown tokenize option"));
                    }
                }
                Stage::Tokenize { normalize, stem }
            }
            "normalize" => Stage::Normalize,
            "lowercase" => Stage::Lowercase,
            "zcurve" => Stage::ZCurve,
            "optimize_predicate" => {
                let (mut arity, mut lower_bound, mut upper_bound) = (None, None, None);
                for arg in args {
                    let (key, value) = arg
                        .split_once(':')
                        .ok_or_else(|| fail("expected key:value option"))?;
                    let bad_number = || fail("invalid number");
                    match key {
                        "arity" => arity = Some(value.parse().map_err(|_| bad_number())?),
                        "lower_bound" => {
                            lower_bound = Some(value.parse().map_err(|_| bad_number())?)
                        }
                        "upper_bound" => {
                            upper_bound = Some(value.parse().map_err(|_| bad_number())?)
                        }
                        _ => return Err(fail("unknown optimize_predicate option")),
                    }
                }
                Stage::OptimizePredicate {
                    arity,
                    lower_bound,
                    upper_bound,
                }
            }
            "index" => Stage::Index {
                field: optional_name(&args)?,
            },
            "attribute" => Stage::Attribute {
                field: optional_name(&args)?,
            },
            "summary" => Stage::Summary {
                field: optional_name(&args)?,
            },
            function if args.is_empty() => Stage::Convert {
                function: function.to_string(),
            },
            _ => return Err(fail("unknown stage")),
        };
        Ok(stage)
    }
}

impl FromStr for Statement {
    type Err = ScriptParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let stages = text
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Statement { stages })
    }
}

impl FromStr for IndexingScript {
    type Err = ScriptParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let statements = text
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(IndexingScript { statements })
    }
}

impl TryFrom<String> for IndexingScript {
    type Error = ScriptParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IndexingScript> for String {
    fn from(value: IndexingScript) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_stage_list() {
        let stmt: Statement = "input title | tokenize normalize stem:\"SHORTEST\" | index | summary"
            .parse()
            .unwrap();
        assert_eq!(stmt.input_field(), Some("title"));
        assert_eq!(
            stmt.stages[1],
            Stage::Tokenize {
                normalize: true,
                stem: Some(Stemming::Shortest)
            }
        );
        let sinks: Vec<_> = stmt.sinks().collect();
        assert_eq!(sinks, vec![(SinkKind::Index, None), (SinkKind::Summary, None)]);
    }

    #[test]
    fn test_display_matches_input() {
        let text = "input a | tokenize normalize stem:\"BEST\" | index a";
        let stmt: Statement = text.parse().unwrap();
        assert_eq!(stmt.to_string(), text);
    }

    #[test]
    fn test_multiple_statements() {
        let script: IndexingScript = "summary | attribute; input other | to_long | attribute x"
            .parse()
            .unwrap();
        assert_eq!(script.statements.len(), 2);
        let targets: Vec<_> = script.sink_targets(SinkKind::Attribute, "self").collect();
        assert_eq!(targets, vec!["self", "x"]);
        assert!(script.writes_to(SinkKind::Summary, "self", "self"));
    }

    #[test]
    fn test_output_equality_ignores_tokenize_config() {
        let a = Stage::Tokenize {
            normalize: true,
            stem: Some(Stemming::Best),
        };
        let b = Stage::Tokenize {
            normalize: false,
            stem: None,
        };
        assert!(a.output_equal(&b));
        assert!(!Stage::Lowercase.output_equal(&Stage::Normalize));
    }

    #[test]
    fn test_predicate_options_survive_display() {
        let stage: Stage = "optimize_predicate arity:8 lower_bound:0 upper_bound:100"
            .parse()
            .unwrap();
        assert_eq!(
            stage,
            Stage::OptimizePredicate {
                arity: Some(8),
                lower_bound: Some(0),
                upper_bound: Some(100)
            }
        );
        assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
    }

    #[test]
    fn test_script_serializes_as_text() {
        let script: IndexingScript = "input a | attribute; input a | summary".parse().unwrap();
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, "\"input a | attribute; input a | summary\"");
        let back: IndexingScript = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }

    #[test]
    fn test_rejects_malformed_stages() {
        assert!("input".parse::<Stage>().is_err());
        assert!("attribute a b".parse::<Stage>().is_err());
        assert!("tokenize stem:\"FANCY\"".parse::<Stage>().is_err());
        assert!("to_long extra".parse::<Stage>().is_err());
    }
}
