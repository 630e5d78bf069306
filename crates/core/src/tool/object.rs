use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::pin::Pin;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;
use tracing::Instrument;

use super::{
    Error, SchemaError, Tool, ToolDescriptor, ToolRegistry, ToolResult,
};

/// A type-erased [`Tool`].
pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn describe(
        &self,
        registry: &ToolRegistry,
    ) -> Result<Arc<ToolDescriptor>, SchemaError>;

    /// Runs the tool. Panics inside the tool are turned into errors.
    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>>;
}

pub(crate) struct AnyTool<T: Tool>(pub T);

impl<T: Tool> ToolObject for AnyTool<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn describe(
        &self,
        registry: &ToolRegistry,
    ) -> Result<Arc<ToolDescriptor>, SchemaError> {
        registry.describe(&self.0)
    }

    fn execute(
        &self,
        arguments: Value,
    ) -> Pin<Box<dyn Future<Output = ToolResult> + Send>> {
        let input: T::Input = match serde_json::from_value(arguments) {
            Ok(input) => input,
            Err(err) => {
                let reason = format!("{err}");
                return Box::pin(std::future::ready(ToolResult::Err(
                    Error::invalid_input().with_reason(reason),
                )));
            }
        };

        // The tool may panic before it even returns a future.
        let fut = match catch_unwind(AssertUnwindSafe(|| self.0.execute(input)))
        {
            Ok(fut) => fut,
            Err(payload) => {
                return Box::pin(std::future::ready(Err(panicked(payload))));
            }
        };

        let name = self.0.name().to_owned();
        Box::pin(
            async move {
                match AssertUnwindSafe(fut).catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => {
                        let err = panicked(payload);
                        warn!("tool `{name}` panicked: {}", err.reason());
                        Err(err)
                    }
                }
            }
            .instrument(debug_span!("tool execute")),
        )
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match message {
        Some(message) => Error::panicked().with_reason(message),
        None => Error::panicked(),
    }
}
