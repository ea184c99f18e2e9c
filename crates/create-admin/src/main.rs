use anyhow::{bail, Context};
use rrhh_core::{choices::ADMIN_ROLE, password, validation};

const CONFIG_PATH: &str = "./app-config.toml";

/// Only the database section of the server configuration is needed here.
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Config {
    database: rrhh_db::Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (username, password) = parse_args(std::env::args().skip(1))?;
    dotenvy::dotenv().ok();
    let configuration = std::fs::read_to_string(CONFIG_PATH)
        .with_context(|| format!("unable to read configuration file {CONFIG_PATH}"))?;
    let mut config: Config = toml::from_str(&configuration)
        .with_context(|| format!("unable to parse configuration file {CONFIG_PATH}"))?;
    if let Ok(db_url) = std::env::var("RRHH_DATABASE_URL") {
        config.database.set_db_url(db_url);
    }
    let store = rrhh_db::create(&config.database);
    if store
        .username_exists(&username)
        .await
        .context("checking for an existing account")?
    {
        bail!("an account named {username} already exists");
    }
    let (user, _) = store
        .register_user(rrhh_db::models::AccountFields {
            password_hash: password::hash_password(&password).context("hashing password")?,
            username,
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            is_staff: true,
            rol: ADMIN_ROLE.to_owned(),
        })
        .await
        .context("creating administrator account")?;
    println!("Administrator {} created with id {}", user.username, user.id);
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<(String, String)> {
    let (Some(username), Some(password), None) = (args.next(), args.next(), args.next()) else {
        bail!("usage: create-admin <username> <password>");
    };
    let username = username.trim().to_owned();
    validation::validate_username(&username).context("invalid username")?;
    validation::validate_password_length(&password).context("invalid password")?;
    Ok((username, password))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> impl Iterator<Item = String> {
        values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn it_takes_exactly_a_username_and_a_password() {
        let (username, password) =
            parse_args(args(&["admin", "clave-segura"])).expect("arguments should be accepted");
        assert_eq!(username, "admin");
        assert_eq!(password, "clave-segura");
        assert!(parse_args(args(&["admin"])).is_err());
        assert!(parse_args(args(&["admin", "clave-segura", "extra"])).is_err());
    }

    #[test]
    fn it_rejects_short_passwords_and_odd_usernames() {
        assert!(parse_args(args(&["admin", "corta"])).is_err());
        assert!(parse_args(args(&["mal usuario", "clave-segura"])).is_err());
    }
}
