//! In-process transport for unit tests: canned replies per path plus a request log.

// std
use std::collections::VecDeque;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse, http::StatusCode};
// self
use crate::{_prelude::*, http::ProviderHttpClient};

#[derive(Debug)]
pub(crate) struct FakeTransportError;
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Fake connection refused.")
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Debug)]
enum FakeReply {
	Body { status: u16, body: String },
	Refused,
}

#[derive(Clone, Debug)]
pub(crate) struct RecordedRequest {
	pub(crate) method: String,
	pub(crate) path: String,
	pub(crate) query: Option<String>,
	pub(crate) headers: HashMap<String, String>,
	pub(crate) body: String,
}

#[derive(Debug, Default)]
struct FakeState {
	replies: Mutex<HashMap<String, VecDeque<FakeReply>>>,
	requests: Mutex<Vec<RecordedRequest>>,
}

/// Replies are queued per path; the last reply for a path is reused once the queue drains.
#[derive(Clone, Debug, Default)]
pub(crate) struct FakeHttpClient(Arc<FakeState>);
impl FakeHttpClient {
	pub(crate) fn reply(&self, path: &str, status: u16, body: impl Into<String>) -> &Self {
		self.push(path, FakeReply::Body { status, body: body.into() })
	}

	pub(crate) fn refuse(&self, path: &str) -> &Self {
		self.push(path, FakeReply::Refused)
	}

	pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
		self.0.requests.lock().clone()
	}

	pub(crate) fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
		self.requests().into_iter().filter(|request| request.path == path).collect()
	}

	fn push(&self, path: &str, reply: FakeReply) -> &Self {
		self.0.replies.lock().entry(path.to_owned()).or_default().push_back(reply);

		self
	}
}
impl ProviderHttpClient for FakeHttpClient {
	type Handle = FakeHandle;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		FakeHandle(self.0.clone())
	}
}

pub(crate) struct FakeHandle(Arc<FakeState>);
impl FakeHandle {
	fn respond(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError<FakeTransportError>> {
		let path = request.uri().path().to_owned();
		let recorded = RecordedRequest {
			method: request.method().to_string(),
			path: path.clone(),
			query: request.uri().query().map(str::to_owned),
			headers: request
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_owned(), value.to_str().unwrap_or_default().to_owned())
				})
				.collect(),
			body: String::from_utf8_lossy(request.body()).into_owned(),
		};

		self.0.requests.lock().push(recorded);

		let reply = {
			let mut replies = self.0.replies.lock();
			let queue = replies.get_mut(&path);

			match queue {
				Some(queue) if queue.len() > 1 => queue.pop_front(),
				Some(queue) => queue.front().cloned(),
				None => None,
			}
		};

		match reply {
			Some(FakeReply::Body { status, body }) => {
				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() =
					StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

				Ok(response)
			},
			Some(FakeReply::Refused) => Err(HttpClientError::Reqwest(Box::new(FakeTransportError))),
			None => {
				let mut response = HttpResponse::new(b"Not Found".to_vec());

				*response.status_mut() = StatusCode::NOT_FOUND;

				Ok(response)
			},
		}
	}
}
impl<'c> AsyncHttpClient<'c> for FakeHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let result = self.respond(request);

		Box::pin(async move { result })
	}
}
