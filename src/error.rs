//! Strategy-level error types shared by the registry, token, profile, and callback paths.

// self
use crate::{_prelude::*, provider::ProviderCall};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for transport sources and host verifier failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Client-registration persistence failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Provider answered with something other than a successful payload.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// Callback `state` was absent, expired, or never issued by this strategy.
	#[error("Authentication did not originate from this server.")]
	StateMismatch,
	/// Client registration has not been reconciled yet.
	#[error("OAuth client registration is still initializing.")]
	NotReady,
	/// Host verification hook rejected the authenticated profile.
	#[error("Host verification rejected the profile: {source}.")]
	Verification {
		/// Error returned by the host verifier.
		#[source]
		source: BoxError,
	},
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required construction parameter was missing or blank.
	#[error("Missing required {field} parameter.")]
	MissingField {
		/// Name of the missing parameter.
		field: &'static str,
	},
	/// The callback return URL cannot be parsed.
	#[error("Return URL is invalid.")]
	InvalidReturnUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A provider endpoint cannot be parsed or joined.
	#[error("Provider endpoint `{endpoint}` is invalid.")]
	InvalidEndpoint {
		/// Endpoint label.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// State-token lifetime must be positive.
	#[error("The state token lifetime must be positive.")]
	NonPositiveStateTtl,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Request body could not be encoded.
	#[error("Request body could not be encoded.")]
	RequestEncode(#[source] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
	/// HTTP client failure without a typed source.
	#[error("HTTP client error occurred while calling the provider: {message}.")]
	Other {
		/// Client-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Provider responses that do not carry the expected payload.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Body was not valid JSON or did not match the expected shape.
	#[error("Invalid JSON response while trying to {call}.")]
	Parse {
		/// Provider call that produced the body.
		call: ProviderCall,
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Envelope `status` field signalled failure.
	#[error("Error while trying to {call}. ({})", status_detail(.status, .message))]
	Status {
		/// Provider call that failed.
		call: ProviderCall,
		/// Envelope status code, when present.
		status: Option<i64>,
		/// Provider-supplied message, when present.
		message: Option<String>,
	},
	/// Body carried an OAuth-style `error` field.
	#[error("Error while trying to {call}: {error}.")]
	Provider {
		/// Provider call that failed.
		call: ProviderCall,
		/// Provider `error` value.
		error: String,
		/// Provider `error_description` value, when present.
		description: Option<String>,
	},
	/// A successful envelope omitted a required field.
	#[error("Response while trying to {call} is missing `{field}`.")]
	MissingField {
		/// Provider call that produced the body.
		call: ProviderCall,
		/// Dotted path of the missing field.
		field: &'static str,
	},
}

fn status_detail(status: &Option<i64>, message: &Option<String>) -> String {
	match (message, status) {
		(Some(message), _) => message.clone(),
		(None, Some(status)) => status.to_string(),
		(None, None) => "no status".into(),
	}
}
