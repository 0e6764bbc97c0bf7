//! Function signatures, the signature scanner and argument binding
//!
//! A [`Signature`] is the declared parameter list of an injectable function.
//! [`Signature::scan`] extracts one [`DependencyDescriptor`] per parameter
//! whose default is a [`Depends`] marker; [`Signature::bind`] maps the
//! caller's positional and keyword arguments onto parameter names.

use crate::{BoundArgs, CallArgs, Depends, DiError, DiResult, Provider, Value};
use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// How a parameter may be supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
	PositionalOrKeyword,
	KeywordOnly,
}

/// Default value of a parameter.
#[derive(Clone)]
pub enum ParamDefault {
	Required,
	Value(Value),
	Depends(Depends),
}

impl fmt::Debug for ParamDefault {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Required => f.write_str("Required"),
			Self::Value(_) => f.write_str("Value(..)"),
			Self::Depends(marker) => f.debug_tuple("Depends").field(marker).finish(),
		}
	}
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
	name: String,
	kind: ParamKind,
	default: ParamDefault,
}

impl Parameter {
	/// A required positional-or-keyword parameter.
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			kind: ParamKind::PositionalOrKeyword,
			default: ParamDefault::Required,
		}
	}

	/// A required keyword-only parameter.
	pub fn keyword_only(name: impl Into<String>) -> Self {
		Self {
			kind: ParamKind::KeywordOnly,
			..Self::new(name)
		}
	}

	/// Sets a plain default value.
	pub fn default<T: Any + Send + Sync>(mut self, value: T) -> Self {
		self.default = ParamDefault::Value(Arc::new(value));
		self
	}

	/// Marks the parameter for resolution through a provider.
	pub fn depends(mut self, marker: Depends) -> Self {
		self.default = ParamDefault::Depends(marker);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn kind(&self) -> ParamKind {
		self.kind
	}

	pub fn default_value(&self) -> &ParamDefault {
		&self.default
	}
}

/// Static record of one marked parameter, computed once at wrap time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyDescriptor {
	pub name: String,
	/// Provider named by the marker, before override substitution.
	pub provider: Provider,
	/// Index among all declared parameters; `None` for keyword-only ones.
	pub position: Option<usize>,
}

impl DependencyDescriptor {
	/// Whether the caller already supplied this parameter.
	pub fn is_provided(&self, args: &CallArgs) -> bool {
		args.has_keyword(&self.name)
			|| self
				.position
				.is_some_and(|position| position < args.positional_len())
	}
}

/// Declared parameter list of an injectable function or provider.
///
/// # Examples
///
/// ```
/// use fninject_di::{Parameter, Provider, Signature, depends};
///
/// let greeting = Provider::function("greeting", |_| Ok("Hello World!".to_string()));
/// let signature = Signature::new("get_message")
///     .param(Parameter::new("name"))
///     .param(Parameter::new("message").depends(depends(&greeting)));
///
/// let descriptors = signature.scan().unwrap();
/// assert_eq!(descriptors.len(), 1);
/// assert_eq!(descriptors[0].name, "message");
/// assert_eq!(descriptors[0].position, Some(1));
/// ```
#[derive(Debug, Clone)]
pub struct Signature {
	name: String,
	params: Vec<Parameter>,
}

impl Signature {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			params: Vec::new(),
		}
	}

	pub fn param(mut self, param: Parameter) -> Self {
		self.params.push(param);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn params(&self) -> &[Parameter] {
		&self.params
	}

	fn invalid(&self, reason: String) -> DiError {
		DiError::InvalidSignature {
			function: self.name.clone(),
			reason,
		}
	}

	/// Extracts the descriptors of all marked parameters, in declared order.
	///
	/// Fails when a marker carries no provider, when a parameter name is
	/// declared twice, or when a positional parameter follows a keyword-only
	/// one.
	pub fn scan(&self) -> DiResult<Vec<DependencyDescriptor>> {
		let mut seen = HashSet::new();
		let mut keyword_only_seen = false;
		let mut descriptors = Vec::new();

		for (index, param) in self.params.iter().enumerate() {
			if !seen.insert(param.name.as_str()) {
				return Err(self.invalid(format!("duplicate parameter `{}`", param.name)));
			}
			match param.kind {
				ParamKind::KeywordOnly => keyword_only_seen = true,
				ParamKind::PositionalOrKeyword if keyword_only_seen => {
					return Err(self.invalid(format!(
						"positional parameter `{}` follows a keyword-only parameter",
						param.name
					)));
				}
				ParamKind::PositionalOrKeyword => {}
			}

			let ParamDefault::Depends(marker) = &param.default else {
				continue;
			};
			let provider = marker
				.provider()
				.ok_or_else(|| DiError::MissingProvider(param.name.clone()))?;
			descriptors.push(DependencyDescriptor {
				name: param.name.clone(),
				provider: provider.clone(),
				position: match param.kind {
					ParamKind::PositionalOrKeyword => Some(index),
					ParamKind::KeywordOnly => None,
				},
			});
		}

		Ok(descriptors)
	}

	/// Binds call arguments to parameter names.
	///
	/// Unsupplied parameters take their plain default; unsupplied marked
	/// parameters are left unbound for the resolver.
	pub fn bind(&self, args: CallArgs) -> DiResult<BoundArgs> {
		let (positional, mut keyword) = args.into_parts();
		let slots: Vec<&Parameter> = self
			.params
			.iter()
			.filter(|param| param.kind == ParamKind::PositionalOrKeyword)
			.collect();

		if positional.len() > slots.len() {
			return Err(DiError::TooManyPositional {
				function: self.name.clone(),
				expected: slots.len(),
				given: positional.len(),
			});
		}

		let mut unexpected: Vec<&String> = keyword
			.keys()
			.filter(|name| !self.params.iter().any(|param| &param.name == *name))
			.collect();
		unexpected.sort();
		if let Some(name) = unexpected.first() {
			return Err(DiError::UnexpectedArgument {
				function: self.name.clone(),
				name: (*name).clone(),
			});
		}

		let mut bound = BoundArgs::for_function(self.name.clone());
		for (param, value) in slots.iter().zip(positional) {
			if keyword.contains_key(&param.name) {
				return Err(DiError::DuplicateArgument {
					function: self.name.clone(),
					name: param.name.clone(),
				});
			}
			bound.insert(param.name.clone(), value);
		}

		for param in &self.params {
			if bound.contains(&param.name) {
				continue;
			}
			if let Some(value) = keyword.remove(&param.name) {
				bound.insert(param.name.clone(), value);
				continue;
			}
			match &param.default {
				ParamDefault::Value(value) => bound.insert(param.name.clone(), Arc::clone(value)),
				ParamDefault::Depends(_) => {}
				ParamDefault::Required => {
					return Err(DiError::MissingArgument {
						function: self.name.clone(),
						name: param.name.clone(),
					});
				}
			}
		}

		Ok(bound)
	}
}
