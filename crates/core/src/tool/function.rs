use std::fmt::Display;
use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{Error, Tool, ToolResult};

/// A tool backed by a plain async function or closure.
///
/// The function takes the deserialized input and returns
/// `Result<O, E>`. `O` is fed back to the model as a string: strings are
/// passed verbatim, everything else as compact JSON. `E` becomes an error
/// payload.
///
/// ```
/// # use std::convert::Infallible;
/// # use agentils_core::tool::FunctionTool;
/// #[derive(serde::Deserialize, schemars::JsonSchema)]
/// struct AddArgs {
///     a: i64,
///     b: i64,
/// }
///
/// let tool = FunctionTool::new("add", "Adds two integers.", |args: AddArgs| {
///     async move { Ok::<_, Infallible>(args.a + args.b) }
/// });
/// ```
pub struct FunctionTool<F, I> {
    name: String,
    description: String,
    func: F,
    _input: PhantomData<fn(I)>,
}

impl<F, I> FunctionTool<F, I> {
    /// Wraps `func` as a tool.
    #[inline]
    pub fn new<N, D, Fut>(name: N, description: D, func: F) -> Self
    where
        N: Into<String>,
        D: Into<String>,
        F: Fn(I) -> Fut,
    {
        Self {
            name: name.into(),
            description: description.into(),
            func,
            _input: PhantomData,
        }
    }
}

impl<F, I, Fut, O, E> Tool for FunctionTool<F, I>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    I: DeserializeOwned + JsonSchema + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    O: Serialize + Send + 'static,
    E: Display + Send + 'static,
{
    type Input = I;

    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn description(&self) -> &str {
        &self.description
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let fut = (self.func)(input);
        async move {
            match fut.await {
                Ok(output) => stringify(&output),
                Err(err) => {
                    Err(Error::execution_error().with_reason(err.to_string()))
                }
            }
        }
    }
}

fn stringify<O: Serialize>(output: &O) -> ToolResult {
    let value = serde_json::to_value(output).map_err(|err| {
        Error::execution_error()
            .with_reason(format!("cannot serialize the output: {err}"))
    })?;
    Ok(match value {
        Value::String(s) => s,
        value => value.to_string(),
    })
}
