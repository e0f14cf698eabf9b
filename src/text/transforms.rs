//! Named text transforms and the pipeline they resolve into

use super::tokenize::Tokenizer;
use super::{TextError, TextResult};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A pure `string -> string` text transform
pub type Transform = Arc<dyn Fn(&str) -> TextResult<String> + Send + Sync>;

/// Remove whitespace indentation common to every non-blank line.
///
/// Whitespace-only lines are emptied and ignored when computing the
/// common indentation.
pub fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut dedented = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[indent..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    if text.ends_with('\n') {
        dedented.push('\n');
    }
    dedented
}

/// Collapse every run of whitespace into one space and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Transforms available by name
#[derive(Clone)]
pub struct TransformRegistry {
    transforms: BTreeMap<String, Transform>,
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl TransformRegistry {
    pub fn empty() -> Self {
        Self {
            transforms: BTreeMap::new(),
        }
    }

    /// Registry with `dedent`, `strip`, `normalize` and `pretokenize`
    pub fn with_builtins() -> TextResult<Self> {
        let tokenizer = Tokenizer::new()?;

        let mut registry = Self::empty();
        registry.register("dedent", |text| Ok(dedent(text)));
        registry.register("strip", |text| Ok(text.trim().to_string()));
        registry.register("normalize", |text| Ok(normalize_whitespace(text)));
        registry.register("pretokenize", move |text| Ok(tokenizer.pretokenize(text)));
        Ok(registry)
    }

    /// Register (or replace) a transform under `name`
    pub fn register<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(&str) -> TextResult<String> + Send + Sync + 'static,
    {
        self.transforms.insert(name.into(), Arc::new(transform));
    }

    pub fn names(&self) -> Vec<&str> {
        self.transforms.keys().map(String::as_str).collect()
    }

    /// Resolve a comma-separated list of names into a pipeline.
    ///
    /// Blank entries are ignored; an unknown name fails the whole
    /// resolution.
    pub fn resolve(&self, pipeline: &str) -> TextResult<TextPipeline> {
        let steps = pipeline
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| {
                self.transforms
                    .get(name)
                    .map(|transform| (name.to_string(), Arc::clone(transform)))
                    .ok_or_else(|| TextError::UnknownTransform(name.to_string()))
            })
            .collect::<TextResult<Vec<_>>>()?;

        Ok(TextPipeline { steps })
    }
}

/// An ordered chain of transforms, applied left to right
#[derive(Clone, Default)]
pub struct TextPipeline {
    steps: Vec<(String, Transform)>,
}

impl std::fmt::Debug for TextPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl TextPipeline {
    /// Pipeline that returns its input unchanged
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn apply(&self, text: &str) -> TextResult<String> {
        self.steps
            .iter()
            .try_fold(text.to_string(), |current, (_, transform)| transform(&current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedent_removes_common_indentation() {
        assert_eq!(dedent("    a\n      b\n    c"), "a\n  b\nc");
        assert_eq!(dedent("  a\n\n  b\n"), "a\n\nb\n");
        assert_eq!(dedent("a\n  b"), "a\n  b");
        assert_eq!(dedent(""), "");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn resolves_builtins_in_order() {
        let registry = TransformRegistry::with_builtins().unwrap();
        let pipeline = registry.resolve("dedent, strip ,pretokenize").unwrap();
        assert_eq!(pipeline.names(), vec!["dedent", "strip", "pretokenize"]);
        assert_eq!(
            pipeline.apply("\n    Herr talman!\n    Jag yrkar bifall.\n").unwrap(),
            "Herr talman ! Jag yrkar bifall ."
        );
    }

    #[test]
    fn unknown_name_is_rejected_eagerly() {
        let registry = TransformRegistry::with_builtins().unwrap();
        let err = registry.resolve("strip,dehyphen").unwrap_err();
        assert!(matches!(err, TextError::UnknownTransform(ref name) if name == "dehyphen"));
    }

    #[test]
    fn registered_transform_is_resolvable() {
        let mut registry = TransformRegistry::with_builtins().unwrap();
        registry.register("dehyphen", |text| Ok(text.replace("-\n", "")));
        let pipeline = registry.resolve("dehyphen,normalize").unwrap();
        assert_eq!(pipeline.apply("riks-\ndagen talar").unwrap(), "riksdagen talar");
    }

    #[test]
    fn failing_step_aborts_the_pipeline() {
        let mut registry = TransformRegistry::empty();
        registry.register("upper", |text| Ok(text.to_uppercase()));
        registry.register("fail", |_| {
            Err(TextError::TransformFailed {
                name: "fail".to_string(),
                message: "no model".to_string(),
            })
        });
        let pipeline = registry.resolve("upper,fail").unwrap();
        assert!(pipeline.apply("x").is_err());
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let registry = TransformRegistry::empty();
        let pipeline = registry.resolve(" , ").unwrap();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.apply(" as is ").unwrap(), " as is ");
        assert!(TextPipeline::identity().is_empty());
    }
}
