//! OPSkins OAuth 2.0 login strategy with anti-forgery state tokens and self-healing client
//! registration, running the authorization-code flow over a pluggable transport.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod profile;
pub mod provider;
pub mod registry;
pub mod state;
pub mod store;
pub mod strategy;

mod api;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, OnceCell as AsyncOnceCell};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map as JsonMap, Value as JsonValue};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{BoxError, Error, Result};
}

pub use config::{StrategyConfig, StrategyConfigBuilder};
pub use error::{Error, Result};
#[cfg(feature = "reqwest")] pub use reqwest;
#[cfg(feature = "reqwest")] pub use strategy::ReqwestStrategy;
pub use strategy::{AuthOutcome, AuthRequest, Strategy, Verifier};
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
