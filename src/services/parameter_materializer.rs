//! Turns an agent's ordered parameter list into resolved values.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;

use crate::domain::models::{
    Component, Diagnostic, Parameter, ParameterError, ParameterSource, ResolvedParameter,
    ResolvedParameters, ResolvedValue, ValueFrom,
};
use crate::domain::ports::ResourceStore;
use crate::services::reference_resolver::ReferenceResolver;

/// Resolved parameters plus every problem found along the way.
#[derive(Debug, Clone, Default)]
pub struct MaterializedParameters {
    /// Accepted parameters, in input order.
    pub parameters: ResolvedParameters,
    /// Problems found in the list.
    pub diagnostics: Vec<Diagnostic>,
}

/// What one accepted entry needs to become a value.
enum Pending<'a> {
    Literal(&'a str),
    Source(&'a ValueFrom),
}

/// Resolves an agent's parameter list.
pub struct ParameterMaterializer<S: ResourceStore + ?Sized> {
    resolver: Arc<ReferenceResolver<S>>,
}

impl<S: ResourceStore + ?Sized> ParameterMaterializer<S> {
    /// Materializer sharing `resolver`.
    pub fn new(resolver: Arc<ReferenceResolver<S>>) -> Self {
        Self { resolver }
    }

    /// Examine every entry, then resolve the accepted `valueFrom` sources
    /// concurrently. Output order follows input order; rejected entries
    /// contribute no value.
    pub async fn materialize(
        &self,
        parameters: &[Parameter],
        agent_namespace: &str,
    ) -> MaterializedParameters {
        let mut diagnostics = Vec::new();
        let mut seen = HashSet::new();
        let mut accepted = Vec::new();

        for (i, param) in parameters.iter().enumerate() {
            let path = format!("spec.parameters[{i}]");
            let first_seen = seen.insert(param.name.as_str());

            let pending = match (&param.value, &param.value_from) {
                (Some(_), Some(_)) => {
                    diagnostics.push(Diagnostic::parameter(
                        path,
                        ParameterError::Conflict {
                            name: param.name.clone(),
                        },
                    ));
                    continue;
                }
                (None, None) => {
                    diagnostics.push(Diagnostic::parameter(
                        path,
                        ParameterError::Empty {
                            name: param.name.clone(),
                        },
                    ));
                    continue;
                }
                _ if !first_seen => {
                    diagnostics.push(Diagnostic::parameter(
                        path,
                        ParameterError::Duplicate {
                            name: param.name.clone(),
                        },
                    ));
                    continue;
                }
                (Some(value), None) => Pending::Literal(value),
                (None, Some(source)) => Pending::Source(source),
            };
            accepted.push((i, param, pending));
        }

        let resolved = join_all(accepted.into_iter().map(|(i, param, pending)| async move {
            match pending {
                Pending::Literal(value) => (
                    i,
                    param,
                    Ok(ResolvedValue::Value(value.to_string())),
                    ParameterSource::Literal,
                ),
                Pending::Source(source) => {
                    let origin = match source {
                        ValueFrom::ConfigMapKeyRef(r) => ParameterSource::ConfigMap {
                            name: r.name.clone(),
                            key: r.key.clone(),
                        },
                        ValueFrom::SecretKeyRef(r) => ParameterSource::Secret {
                            name: r.name.clone(),
                            key: r.key.clone(),
                        },
                    };
                    let value = self.resolver.resolve_value_from(source, agent_namespace).await;
                    (i, param, value, origin)
                }
            }
        }))
        .await;

        let mut values = Vec::with_capacity(resolved.len());
        for (i, param, value, source) in resolved {
            let path = format!("spec.parameters[{i}].valueFrom");
            match value {
                Ok(ResolvedValue::Absent { cause }) => {
                    diagnostics.push(Diagnostic::reference(
                        Component::ReferenceResolver,
                        path,
                        cause.clone(),
                        true,
                    ));
                    values.push(ResolvedParameter {
                        name: param.name.clone(),
                        value: ResolvedValue::Absent { cause },
                        source,
                    });
                }
                Ok(value) => values.push(ResolvedParameter {
                    name: param.name.clone(),
                    value,
                    source,
                }),
                Err(cause) => diagnostics.push(Diagnostic::reference(
                    Component::ReferenceResolver,
                    path,
                    cause,
                    false,
                )),
            }
        }

        MaterializedParameters {
            parameters: ResolvedParameters(values),
            diagnostics,
        }
    }
}
