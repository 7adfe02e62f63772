//! Scopes requested on the authorize page.

// std
use std::collections::BTreeSet;
// self
use crate::_prelude::*;

/// Scope requested when the caller does not configure any.
pub const DEFAULT_SCOPE: &str = "identity";

/// Rejected scope input.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeValidationError {
	/// An individual scope was empty.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// An individual scope contained whitespace and would split on the wire.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The rejected scope.
		scope: String,
	},
}

/// Sorted, duplicate-free scopes; rendered space-delimited in the `scope` parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeSet(Arc<[String]>);
impl ScopeSet {
	/// Validates and normalizes `scopes`.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut unique = BTreeSet::new();

		for scope in scopes {
			let scope = scope.into();

			if scope.is_empty() {
				return Err(ScopeValidationError::Empty);
			}
			if scope.contains(char::is_whitespace) {
				return Err(ScopeValidationError::ContainsWhitespace { scope });
			}

			unique.insert(scope);
		}

		Ok(Self(unique.into_iter().collect()))
	}

	/// Number of scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether no scope is requested.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Whether `scope` is requested.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.binary_search_by(|candidate| candidate.as_str().cmp(scope)).is_ok()
	}

	/// Requested scopes in sorted order.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(String::as_str)
	}

	/// Value of the `scope` query parameter.
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	/// Parses a whitespace-separated list; an empty string is an empty set.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if !s.is_empty() && s.trim().is_empty() {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
