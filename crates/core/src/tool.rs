//! Tool call supports.

mod error;
mod function;
mod object;
mod registry;
mod schema;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;

pub use error::{Error, ErrorKind};
pub use function::FunctionTool;
pub(crate) use object::{AnyTool, ToolObject};
pub use registry::{ToolDescriptor, ToolRegistry};
pub(crate) use registry::Toolset;
pub use schema::{ParameterKind, ParameterSpec, Parameters, SchemaError};

/// The result of a tool call.
pub type ToolResult = Result<String, Error>;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless, and may not maintain any
/// internal state.
///
/// The tool can be context-aware, meaning it can access additional information
/// about the current execution context, such as the working directory or the
/// current user. To do this, make the context an immutable state of the tool,
/// which can be set during initialization, and copy it when executing.
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned + JsonSchema;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameters of the tool.
    ///
    /// By default they are derived from the JSON schema of
    /// [`Tool::Input`]. Override this to declare them explicitly.
    fn parameters(&self) -> Result<Parameters, SchemaError> {
        Parameters::introspect::<Self::Input>()
    }

    /// Executes the tool with the given input.
    ///
    /// This method must return a future that is fully independent of `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static;
}

/// Input of tools that take no parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct NoArguments {}
