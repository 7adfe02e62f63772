//! Connects a strategy against the live provider, prints the login URL, then handles the
//! callback URL pasted back from the browser.
//!
//! Requires `OPSKINS_API_KEY`; the registration is persisted under the system temp dir so a
//! restart reuses the same OAuth client.

// std
use std::{env, io, sync::Arc};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use opskins_auth::{
	AuthOutcome, AuthRequest, Strategy, StrategyConfig,
	auth::UserProfile,
	store::{ClientStore, FileStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = StrategyConfig::builder()
		.name("opskins-auth-demo")
		.return_url("http://localhost:3000/auth/opskins/callback")
		.api_key(env::var("OPSKINS_API_KEY")?)
		.permanent(true)
		.build()?;
	let store: Arc<dyn ClientStore> = Arc::new(FileStore::in_dir(env::temp_dir())?);
	let strategy = Strategy::connect(config, store, |profile: UserProfile| async move {
		match profile.id().cloned() {
			Some(id) => Ok(id),
			None => Err(eyre!("Profile carries no user id.")),
		}
	})
	.await?;

	println!("Send your user to {}.", strategy.login()?);
	println!("Paste the callback URL the browser lands on:");

	let mut line = String::new();

	io::stdin().read_line(&mut line)?;

	match strategy.authenticate(&AuthRequest::from_uri(line.trim())).await {
		AuthOutcome::Success(id) => println!("Authenticated OPSkins user {id}."),
		AuthOutcome::Redirect(url) => println!("Not a callback; send the user to {url}."),
		AuthOutcome::Failure(e) => eprintln!("Authentication failed: {e}."),
	}

	Ok(())
}
