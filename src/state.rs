//! Anti-forgery state tokens bound to login redirects.
//!
//! Every login redirect carries a fresh random `state` value. The registry remembers each value
//! together with the instant it was issued; a callback is accepted only while its `state` is
//! still live. Expiry is evaluated lazily against the caller's clock, so no timers outlive the
//! registry, and an accepted token is consumed so a captured callback URL cannot be replayed.

// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

/// Random bytes drawn per state token (hex-encoded to twice as many characters).
pub const STATE_TOKEN_BYTES: usize = 16;
/// Default lifetime of an issued state token.
pub const DEFAULT_STATE_TTL: Duration = Duration::minutes(10);

#[derive(Clone, Debug)]
struct StateEntry {
	token: String,
	issued_at: OffsetDateTime,
}

/// Live state tokens for one strategy.
#[derive(Debug)]
pub struct StateRegistry {
	ttl: Duration,
	entries: Mutex<Vec<StateEntry>>,
}
impl StateRegistry {
	/// Creates an empty registry whose tokens live for `ttl`.
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, entries: Mutex::new(Vec::new()) }
	}

	/// Lifetime applied to every token.
	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Issues a new token valid from now.
	pub fn issue(&self) -> String {
		self.issue_at(OffsetDateTime::now_utc())
	}

	/// Issues a new token valid from `now`.
	pub fn issue_at(&self, now: OffsetDateTime) -> String {
		let token = random_hex(STATE_TOKEN_BYTES);
		let mut entries = self.entries.lock();

		self.prune(&mut entries, now);

		if !entries.iter().any(|entry| entry.token == token) {
			entries.push(StateEntry { token: token.clone(), issued_at: now });
		}

		token
	}

	/// Checks and consumes `token` against the current time.
	pub fn validate(&self, token: &str) -> bool {
		self.validate_at(token, OffsetDateTime::now_utc())
	}

	/// Returns true iff `token` is live at `now`; a live token is removed on success.
	pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> bool {
		let mut entries = self.entries.lock();

		self.prune(&mut entries, now);

		match entries.iter().position(|entry| entry.token == token) {
			Some(idx) => {
				entries.remove(idx);

				true
			},
			None => false,
		}
	}

	/// Overwrites the live collection, e.g. with tokens shared by another process.
	///
	/// Injected tokens are treated as issued at the moment of replacement.
	pub fn replace<I, S>(&self, tokens: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.replace_at(tokens, OffsetDateTime::now_utc());
	}

	/// Overwrites the live collection with tokens issued at `now`.
	pub fn replace_at<I, S>(&self, tokens: I, now: OffsetDateTime)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut fresh: Vec<StateEntry> = Vec::new();

		for token in tokens {
			let token = token.into();

			if !token.is_empty() && !fresh.iter().any(|entry| entry.token == token) {
				fresh.push(StateEntry { token, issued_at: now });
			}
		}

		*self.entries.lock() = fresh;
	}

	/// Tokens still live at the current time, oldest first.
	pub fn snapshot(&self) -> Vec<String> {
		let mut entries = self.entries.lock();

		self.prune(&mut entries, OffsetDateTime::now_utc());

		entries.iter().map(|entry| entry.token.clone()).collect()
	}

	/// Number of tokens live at the current time.
	pub fn len(&self) -> usize {
		self.len_at(OffsetDateTime::now_utc())
	}

	/// Number of tokens live at `now`; expired tokens are pruned first.
	pub fn len_at(&self, now: OffsetDateTime) -> usize {
		let mut entries = self.entries.lock();

		self.prune(&mut entries, now);

		entries.len()
	}

	/// Returns true when no token is live at the current time.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn prune(&self, entries: &mut Vec<StateEntry>, now: OffsetDateTime) {
		entries.retain(|entry| now - entry.issued_at < self.ttl);
	}
}
impl Default for StateRegistry {
	fn default() -> Self {
		Self::new(DEFAULT_STATE_TTL)
	}
}

fn random_hex(len: usize) -> String {
	let mut bytes = vec![0_u8; len];

	rand::rng().fill(bytes.as_mut_slice());

	hex::encode(bytes)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn issued_token_validates_once() {
		let registry = StateRegistry::default();
		let token = registry.issue();

		assert_eq!(token.len(), STATE_TOKEN_BYTES * 2);
		assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
		assert!(registry.validate(&token));
		assert!(!registry.validate(&token), "Consumed tokens must not be accepted twice.");
	}

	#[test]
	fn unknown_and_empty_tokens_are_rejected() {
		let registry = StateRegistry::default();

		registry.issue();

		assert!(!registry.validate("deadbeefdeadbeefdeadbeefdeadbeef"));
		assert!(!registry.validate(""));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn tokens_expire_after_ttl() {
		let registry = StateRegistry::default();
		let issued_at = OffsetDateTime::now_utc();
		let fresh = registry.issue_at(issued_at);
		let stale = registry.issue_at(issued_at);

		assert!(registry.validate_at(&fresh, issued_at + Duration::minutes(9)));
		assert!(!registry.validate_at(&stale, issued_at + DEFAULT_STATE_TTL));
		assert!(registry.is_empty(), "Expired tokens are pruned on access.");
	}

	#[test]
	fn replace_overwrites_live_tokens() {
		let registry = StateRegistry::new(Duration::minutes(1));
		let now = OffsetDateTime::now_utc();
		let original = registry.issue_at(now);

		registry.replace_at(["a1", "b2", "a1", ""], now);

		assert_eq!(registry.len(), 2);
		assert!(!registry.validate_at(&original, now));
		assert!(registry.validate_at("b2", now + Duration::seconds(30)));
		assert!(!registry.validate_at("a1", now + Duration::minutes(2)));
	}

	#[test]
	fn random_tokens_are_lowercase_hex() {
		let token = random_hex(4);

		assert_eq!(token.len(), 8);
		assert!(token.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
		assert_ne!(random_hex(STATE_TOKEN_BYTES), random_hex(STATE_TOKEN_BYTES));
	}

	#[test]
	fn len_ignores_expired_tokens() {
		let registry = StateRegistry::new(Duration::minutes(1));
		let now = OffsetDateTime::now_utc();

		registry.issue_at(now - Duration::minutes(5));
		registry.issue_at(now);

		assert_eq!(registry.len(), 1);
		assert_eq!(registry.len(), registry.snapshot().len());
		assert_eq!(registry.len_at(now + Duration::minutes(2)), 0);
		assert!(registry.is_empty());
	}

	#[test]
	fn snapshot_lists_live_tokens() {
		let registry = StateRegistry::default();
		let first = registry.issue();
		let second = registry.issue();

		assert_eq!(registry.snapshot(), vec![first, second]);
	}
}
