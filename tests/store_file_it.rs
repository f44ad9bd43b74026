// std
use std::{env, fs, process};
// crates.io
use time::OffsetDateTime;
// self
use restforce_client::{
	auth::Credential,
	notify::RefreshNotifier,
	store::{CredentialStore, FileStore},
};

#[tokio::test]
async fn refreshed_credentials_survive_restarts() {
	let path = env::temp_dir().join(format!(
		"restforce_client_it_{}_{}/credential.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	));
	let store = FileStore::open(&path).expect("File store should open in a fresh directory.");

	assert!(store.load().await.expect("Empty store should load.").is_none());

	let credential = Credential::new("access-2", "refresh-2", "https://na1.example.com")
		.expect("Credential fixture should be valid.")
		.with_issued_at(OffsetDateTime::from_unix_timestamp(1_735_689_600).expect("Valid timestamp."));

	store
		.on_credential_refreshed(&credential)
		.await
		.expect("File store should persist refreshed credentials.");

	let reopened = FileStore::open(&path).expect("File store should reopen.");
	let loaded = reopened
		.load()
		.await
		.expect("Reopened store should load.")
		.expect("Credential should survive the restart.");

	assert_eq!(loaded, credential);

	let raw = fs::read_to_string(&path).expect("Snapshot should be readable.");

	assert!(raw.contains("\"instance_url\": \"https://na1.example.com\""));

	if let Some(parent) = path.parent() {
		fs::remove_dir_all(parent).unwrap_or_else(|e| {
			panic!("Failed to remove temporary store directory {}: {e}", parent.display())
		});
	}
}
