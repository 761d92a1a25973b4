//! Compiles one [`Definition`] into an immutable [`Executor`].

use crate::definition::{Definition, Identity, Method};
use crate::service::checker::{check_chain, Ordinal};
use crate::service::errors::DefinitionError;
use crate::service::executor::{BoundParameter, BoundResult, Executor};
use crate::service::registry::Registry;

/// Validates `definition` against `registry` and binds its collaborators.
///
/// Every check runs at registration time; a returned executor never fails
/// for a reason knowable before a request arrives.
pub fn compile(
    registry: &Registry,
    path: &str,
    definition: &Definition,
) -> Result<Executor, DefinitionError> {
    let name = &definition.method;
    let method = Method::parse(name).ok_or_else(|| DefinitionError::NoMethod {
        method: name.clone(),
        path: path.to_string(),
    })?;
    if definition.consumes.is_empty() {
        return Err(DefinitionError::NoConsumes {
            method: name.clone(),
            path: path.to_string(),
        });
    }
    if definition.produces.is_empty() {
        return Err(DefinitionError::NoProduces {
            method: name.clone(),
            path: path.to_string(),
        });
    }
    let function = definition
        .function
        .clone()
        .ok_or_else(|| DefinitionError::NoFunction {
            method: name.clone(),
            path: path.to_string(),
        })?;

    let consumers = registry
        .resolve_consumers(&definition.consumes)
        .map_err(|content_type| DefinitionError::NoConsumer {
            content_type,
            method: name.clone(),
            path: path.to_string(),
        })?;
    let producers = registry
        .resolve_producers(&definition.produces)
        .map_err(|content_type| DefinitionError::NoProducer {
            content_type,
            method: name.clone(),
            path: path.to_string(),
        })?;

    let identity = Identity::of(function.as_ref());
    let signature = function.signature();

    if signature.inputs.len() != definition.parameters.len() {
        return Err(DefinitionError::UnmatchedParameters {
            function: identity,
            expected: signature.inputs.len(),
            actual: definition.parameters.len(),
            path: path.to_string(),
        });
    }
    let mut parameters = Vec::with_capacity(definition.parameters.len());
    for (index, (param, arg_type)) in definition
        .parameters
        .iter()
        .zip(&signature.inputs)
        .enumerate()
    {
        let position = Ordinal(index + 1);
        let generator =
            registry
                .generator(&param.source)
                .ok_or_else(|| DefinitionError::NoParameterGenerator {
                    param_source: param.source.clone(),
                })?;
        let target = param
            .operators
            .first()
            .map_or_else(|| arg_type.clone(), |op| op.input().clone());
        generator
            .validate(&param.name, param.default.as_ref(), &target)
            .map_err(|reason| DefinitionError::InvalidParameter {
                position,
                function: identity.clone(),
                reason,
            })?;
        check_chain(&target, arg_type, &param.operators).map_err(|error| {
            DefinitionError::ParameterOperators {
                position,
                function: identity.clone(),
                error,
            }
        })?;
        parameters.push(BoundParameter {
            name: param.name.clone(),
            source: param.source.clone(),
            target,
            default: param.default.clone(),
            generator,
            operators: param.operators.clone(),
        });
    }

    if signature.outputs.len() != definition.results.len() {
        return Err(DefinitionError::UnmatchedResults {
            function: identity,
            expected: signature.outputs.len(),
            actual: definition.results.len(),
            path: path.to_string(),
        });
    }
    let mut results = Vec::with_capacity(definition.results.len());
    for (index, (output, ret_type)) in definition
        .results
        .iter()
        .zip(&signature.outputs)
        .enumerate()
    {
        let position = Ordinal(index + 1);
        let handler = registry.handler(&output.destination).ok_or_else(|| {
            DefinitionError::NoDestinationHandler {
                destination: output.destination.clone(),
            }
        })?;
        let effective = output
            .operators
            .last()
            .map_or_else(|| ret_type.clone(), |op| op.output().clone());
        check_chain(ret_type, &effective, &output.operators).map_err(|error| {
            DefinitionError::ResultOperators {
                position,
                function: identity.clone(),
                error,
            }
        })?;
        handler
            .validate(&effective)
            .map_err(|reason| DefinitionError::InvalidResult {
                position,
                function: identity.clone(),
                reason,
            })?;
        results.push(BoundResult {
            index,
            destination: output.destination.clone(),
            handler,
            operators: output.operators.clone(),
        });
    }
    // Stable, so equal priorities keep declaration order.
    results.sort_by_key(|r| r.handler.priority());

    Ok(Executor {
        method: method.http_method(),
        code: method.default_status(),
        identity,
        consumers,
        producers,
        parameters,
        results,
        function,
    })
}
