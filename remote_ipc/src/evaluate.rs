//! Remote evaluation
//!
//! An endpoint built with evaluation enabled exposes a function listener
//! named [`EVALUATE_FUNCTION`]. It receives one string argument holding
//! source text and hands it to an injected [`Evaluator`]. The calling side
//! builds that text with [`invocation_source`].

use crate::{ListenerError, ListenerResult};
use codec::{CodecError, Value};

/// Function name the evaluation listener is registered under
pub const EVALUATE_FUNCTION: &str = "evaluate";

/// Executes source text received from a peer
pub trait Evaluator {
    fn evaluate(&self, source: &str) -> ListenerResult<Value>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> ListenerResult<Value>,
{
    fn evaluate(&self, source: &str) -> ListenerResult<Value> {
        self(source)
    }
}

/// Builds `(<body>)(<arg1>,<arg2>,...)` with each argument as JSON text
pub fn invocation_source(body: &str, args: &[Value]) -> Result<String, CodecError> {
    let rendered = args
        .iter()
        .map(|arg| -> Result<String, CodecError> {
            Ok(serde_json::to_string(&arg.to_json()?)?)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})({})", body, rendered.join(",")))
}

/// Extracts the source argument of an evaluate call
pub(crate) fn source_argument(args: &[Value]) -> ListenerResult<&str> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| ListenerError::new("evaluate expects a source string argument"))
}
