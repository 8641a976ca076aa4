use std::sync::Arc;

use identity_quickstart::{
	credential::{Claims, VerifiableCredential},
	crypto::SeededCrypto,
	dwn::Dwn,
	workflow::{run, LocalWeb5, QuickstartConfig, DEFAULT_CREDENTIAL_TYPE, VC_JWT_DATA_FORMAT},
	MigratedDbPool,
};

async fn local_web5(seed: u8) -> eyre::Result<(LocalWeb5, Dwn)> {
	let dwn = Dwn::in_memory().await?;
	let api = LocalWeb5::new(Arc::new(SeededCrypto::new([seed; 32])), dwn.clone());
	Ok((api, dwn))
}

fn alice_config(password: &str) -> QuickstartConfig {
	let mut claims = Claims::new();
	claims.insert("name".to_owned(), "Alice Smith".into());
	claims.insert("expertiseLevel".to_owned(), "Beginner".into());
	QuickstartConfig {
		claims,
		..QuickstartConfig::new(password)
	}
}

#[tokio::test]
async fn test_quickstart_end_to_end() -> eyre::Result<()> {
	let (api, dwn) = local_web5(1).await?;
	let outcome = run(
		&api,
		QuickstartConfig {
			verify: true,
			..alice_config("pw123")
		},
	)
	.await?;

	assert!(outcome.did.as_str().starts_with("did:key:z6Mk"));
	assert_eq!(outcome.bearer_did.did(), &outcome.did);
	assert!(!outcome.signed_jwt.is_empty());
	assert_eq!(outcome.read_jwt, outcome.signed_jwt);
	assert_eq!(outcome.parsed.subject(), outcome.did.as_str());
	assert_eq!(outcome.parsed.issuer(), outcome.did.as_str());
	assert_eq!(outcome.parsed.credential_type(), DEFAULT_CREDENTIAL_TYPE);
	assert_eq!(outcome.parsed.claims()["name"], "Alice Smith");
	assert!(outcome.verified);

	// The record is really in the DWN, under the new DID.
	let records = dwn.records(outcome.did.clone()).query(None).await?;
	assert_eq!(records.len(), 1);
	let descriptor = records[0].descriptor();
	assert_eq!(descriptor.schema, DEFAULT_CREDENTIAL_TYPE);
	assert_eq!(descriptor.data_format, VC_JWT_DATA_FORMAT);
	assert!(descriptor.published);
	assert_eq!(records[0].data_text().await?, outcome.signed_jwt);
	Ok(())
}

#[tokio::test]
async fn test_runs_are_not_idempotent() -> eyre::Result<()> {
	let (api, dwn) = local_web5(2).await?;
	let first = run(&api, alice_config("pw123")).await?;
	let second = run(&api, alice_config("pw123")).await?;

	assert_ne!(first.did, second.did);
	assert_ne!(first.credential.id(), second.credential.id());
	let first_records = dwn.records(first.did.clone()).query(None).await?;
	let second_records = dwn.records(second.did.clone()).query(None).await?;
	assert_eq!(first_records.len(), 1);
	assert_eq!(second_records.len(), 1);
	assert_ne!(first_records[0].id(), second_records[0].id());
	Ok(())
}

#[tokio::test]
async fn test_empty_claims() -> eyre::Result<()> {
	let (api, _dwn) = local_web5(3).await?;
	let outcome = run(
		&api,
		QuickstartConfig {
			claims: Claims::new(),
			..QuickstartConfig::new("pw123")
		},
	)
	.await?;
	assert!(!outcome.signed_jwt.is_empty());
	let verified = VerifiableCredential::verify(&outcome.read_jwt)?;
	assert!(verified.claims().is_empty());
	assert_eq!(verified.subject(), outcome.did.as_str());
	Ok(())
}

#[tokio::test]
async fn test_records_persist_in_db_file() -> eyre::Result<()> {
	let dir = tempfile::tempdir()?;
	let path = dir.path().join("records.db");

	let did = {
		let dwn = Dwn::new(MigratedDbPool::open(&path).await?);
		let api = LocalWeb5::new(Arc::new(SeededCrypto::new([4; 32])), dwn);
		run(&api, alice_config("pw123")).await?.did
	};

	let dwn = Dwn::new(MigratedDbPool::open(&path).await?);
	let records = dwn.records(did.clone()).query(None).await?;
	assert_eq!(records.len(), 1);
	let parsed = VerifiableCredential::parse_jwt(&records[0].data_text().await?)?;
	assert_eq!(parsed.subject(), did.as_str());
	Ok(())
}
