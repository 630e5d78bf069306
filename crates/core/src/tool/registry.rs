use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use agentils_model::ModelTool;

use super::{Parameters, SchemaError, Tool, ToolObject};
use crate::error::{Error, Result};

/// The derived description of a tool: its name, description and
/// parameters.
///
/// Descriptors are immutable and shared. They are derived once per tool
/// type, name and description by a [`ToolRegistry`].
#[derive(Clone, Debug, PartialEq)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    parameters: Parameters,
}

impl ToolDescriptor {
    /// Returns the name of the tool.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description of the tool.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameters of the tool.
    #[inline]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns the declaration sent to the model.
    pub fn to_model_tool(&self) -> ModelTool {
        ModelTool {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.schema().clone(),
        }
    }
}

/// Tool type, name and description.
type CacheKey = (TypeId, String, String);

/// A cache of [`ToolDescriptor`]s.
///
/// Descriptors are keyed by the concrete tool type, the tool name and the
/// description. Two tools sharing all three must declare the same
/// parameters, as only the first one's are derived.
/// Lookups only take a shared lock. Deriving a missing descriptor takes the
/// exclusive lock, so a descriptor is derived at most once even when many
/// threads ask for it at the same time.
///
/// A registry is usually created at startup and shared with `Arc` by all
/// agents of the process.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    cache: RwLock<HashMap<CacheKey, Arc<ToolDescriptor>>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the descriptor of `tool`, deriving it if it is not cached.
    pub fn describe<T: Tool>(
        &self,
        tool: &T,
    ) -> Result<Arc<ToolDescriptor>, SchemaError> {
        let key = (
            TypeId::of::<T>(),
            tool.name().to_owned(),
            tool.description().to_owned(),
        );
        {
            let cache =
                self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(descriptor) = cache.get(&key) {
                return Ok(Arc::clone(descriptor));
            }
        }

        let mut cache =
            self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Someone else may have derived it while we were waiting.
        if let Some(descriptor) = cache.get(&key) {
            return Ok(Arc::clone(descriptor));
        }

        debug!("deriving descriptor for tool `{}`", key.1);
        let descriptor = Arc::new(ToolDescriptor {
            name: key.1.clone(),
            description: key.2.clone(),
            parameters: tool.parameters()?,
        });
        cache.insert(key, Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Returns the number of cached descriptors.
    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no descriptor is cached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all cached descriptors.
    ///
    /// Descriptors already handed out stay valid.
    pub fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// The tools available to one agent, each bound to its descriptor.
pub(crate) struct Toolset {
    entries: Vec<(Arc<ToolDescriptor>, Arc<dyn ToolObject>)>,
}

impl Toolset {
    /// Describes every tool, rejecting duplicate names.
    pub fn build(
        registry: &ToolRegistry,
        tools: Vec<Arc<dyn ToolObject>>,
    ) -> Result<Self> {
        let mut names = HashSet::new();
        let mut entries = Vec::with_capacity(tools.len());
        for tool in tools {
            let descriptor =
                tool.describe(registry).map_err(|source| Error::Schema {
                    tool: tool.name().to_owned(),
                    source,
                })?;
            if !names.insert(descriptor.name().to_owned()) {
                let name = descriptor.name().to_owned();
                return Err(Error::Schema {
                    tool: name.clone(),
                    source: SchemaError::DuplicateTool(name),
                });
            }
            entries.push((descriptor, tool));
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn get(
        &self,
        name: &str,
    ) -> Option<&(Arc<ToolDescriptor>, Arc<dyn ToolObject>)> {
        self.entries.iter().find(|(descriptor, _)| descriptor.name() == name)
    }

    /// Returns the declarations sent to the model, in registration order.
    pub fn definitions(&self) -> Vec<ModelTool> {
        self.entries
            .iter()
            .map(|(descriptor, _)| descriptor.to_model_tool())
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::future::{Ready, ready};
    use std::thread;

    use schemars::JsonSchema;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::tool::{AnyTool, FunctionTool, NoArguments, ToolResult};

    #[derive(Deserialize, JsonSchema)]
    struct LookupArgs {
        #[allow(dead_code)]
        key: String,
    }

    struct LookupTool {
        name: &'static str,
    }

    impl Tool for LookupTool {
        type Input = LookupArgs;

        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Looks up a key."
        }

        fn execute(
            &self,
            _input: LookupArgs,
        ) -> impl Future<Output = ToolResult> + Send + 'static {
            ready(Ok("value".to_owned()))
        }
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    #[serde(untagged)]
    enum IdOrName {
        Id(u64),
        Name(String),
    }

    #[derive(Deserialize, JsonSchema)]
    struct SelectArgs {
        #[allow(dead_code)]
        target: IdOrName,
    }

    fn noop(_: NoArguments) -> Ready<Result<&'static str, Infallible>> {
        ready(Ok(""))
    }

    fn object<T: Tool>(tool: T) -> Arc<dyn ToolObject> {
        Arc::new(AnyTool(tool))
    }

    #[test]
    fn test_describe_is_cached() {
        let registry = ToolRegistry::new();
        let first = registry.describe(&LookupTool { name: "lookup" }).unwrap();
        let second = registry.describe(&LookupTool { name: "lookup" }).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);

        // Same type, different name.
        registry.describe(&LookupTool { name: "find" }).unwrap();
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
        let third = registry.describe(&LookupTool { name: "lookup" }).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(first, third);
    }

    #[test]
    fn test_same_function_different_descriptions() {
        let registry = ToolRegistry::new();
        let add = FunctionTool::new("op", "Adds two numbers.", noop);
        let delete = FunctionTool::new("op", "Deletes every file.", noop);

        let first = Toolset::build(&registry, vec![object(add)]).unwrap();
        let second = Toolset::build(&registry, vec![object(delete)]).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(first.definitions()[0].description, "Adds two numbers.");
        assert_eq!(
            second.definitions()[0].description,
            "Deletes every file."
        );
    }

    #[test]
    fn test_concurrent_describe() {
        let registry = Arc::new(ToolRegistry::new());
        let descriptors: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    registry.describe(&LookupTool { name: "lookup" }).unwrap()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();
        assert_eq!(registry.len(), 1);
        assert!(descriptors.iter().all(|d| Arc::ptr_eq(d, &descriptors[0])));
    }

    #[test]
    fn test_toolset() {
        let registry = ToolRegistry::new();
        let toolset = Toolset::build(
            &registry,
            vec![
                object(LookupTool { name: "lookup" }),
                object(FunctionTool::new("now", "Time.", |_: NoArguments| {
                    ready(Ok::<_, Infallible>(0))
                })),
            ],
        )
        .unwrap();
        assert_eq!(toolset.len(), 2);
        assert!(toolset.get("now").is_some());
        assert!(toolset.get("later").is_none());

        let definitions = toolset.definitions();
        assert_eq!(definitions[0].name, "lookup");
        assert_eq!(definitions[0].description, "Looks up a key.");
        assert_eq!(definitions[0].parameters["required"], json!(["key"]));
        assert_eq!(definitions[1].name, "now");
    }

    #[test]
    fn test_duplicate_names() {
        let registry = ToolRegistry::new();
        let result = Toolset::build(
            &registry,
            vec![
                object(LookupTool { name: "lookup" }),
                object(LookupTool { name: "lookup" }),
            ],
        );
        match result {
            Err(Error::Schema { tool, source }) => {
                assert_eq!(tool, "lookup");
                assert_eq!(source, SchemaError::DuplicateTool(tool.clone()));
            }
            _ => panic!("expected a schema error"),
        }
    }

    #[test]
    fn test_unresolvable_input() {
        let registry = ToolRegistry::new();
        let tool = FunctionTool::new("select", "Selects.", |_: SelectArgs| {
            ready(Ok::<_, Infallible>(""))
        });
        let result = Toolset::build(&registry, vec![object(tool)]);
        assert!(matches!(
            result,
            Err(Error::Schema {
                source: SchemaError::UnresolvedType(_),
                ..
            })
        ));
        assert!(registry.is_empty());
    }
}
