use crew_auth::SecretKey;

/// Handle `crewd keygen`.
pub fn handle() -> anyhow::Result<()> {
    let key = SecretKey::generate()?;
    println!("{}", key.to_hex());
    Ok(())
}
