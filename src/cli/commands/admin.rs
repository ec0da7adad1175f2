use anyhow::{anyhow, Context};
use tracing::info;

use crate::auth::hash_password;
use crate::cli::open_store;
use crate::config::AppConfig;
use crate::models::{Account, Role};
use crate::store::{Model, Repository, StoreError};

pub async fn handle(
    config: AppConfig,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
) -> anyhow::Result<()> {
    Account::validate_plain_password(&password).map_err(|e| anyhow!(e.message))?;

    let store = open_store(&config).await?;
    let accounts: Repository<Account> = Repository::new(store);

    let account = Account {
        first_name,
        last_name,
        email: Account::normalize_email(&email),
        password: hash_password(&password, config.security.bcrypt_cost)
            .await
            .context("failed to hash password")?,
        role: Role::Admin,
        ..Account::default()
    };

    let account = accounts.create(account).await.map_err(|e| match e {
        StoreError::Validation(errors) => anyhow!(
            "invalid admin account: {}",
            errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join(", ")
        ),
        StoreError::Duplicate(_) => anyhow!("an account with email {} already exists", email),
        other => anyhow!(other),
    })?;

    info!("Created Admin account {} <{}>", account.id(), account.email);
    println!("{}", account.id());
    Ok(())
}
