use tokio::io::{AsyncBufReadExt, BufReader};

use crate::services::auth_service::{AuthService, SignUpOutcome};
use crate::services::config_service;

fn auth_service() -> Result<AuthService, String> {
    AuthService::from_settings(&config_service::get_settings()?)
}

async fn password_or_prompt(password: Option<String>) -> Result<String, String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    lines
        .next_line()
        .await
        .map_err(|e| format!("Failed to read password: {}", e))?
        .filter(|p| !p.is_empty())
        .ok_or_else(|| "A password is required".to_string())
}

pub async fn login(email: &str, password: Option<String>) -> Result<(), String> {
    let auth = auth_service()?;
    let password = password_or_prompt(password).await?;
    let state = auth.sign_in(email, &password).await?;
    println!("Signed in as {}", state.email.as_deref().unwrap_or(email));
    Ok(())
}

pub async fn signup(email: &str, password: Option<String>) -> Result<(), String> {
    let auth = auth_service()?;
    let password = password_or_prompt(password).await?;
    match auth.sign_up(email, &password).await? {
        SignUpOutcome::SignedIn(state) => {
            println!("Account created. Signed in as {}", state.email.as_deref().unwrap_or(email));
        }
        SignUpOutcome::ConfirmationRequired { email } => {
            println!("Account created. Check {} to confirm your email, then log in.", email);
        }
    }
    Ok(())
}

pub fn logout() -> Result<(), String> {
    auth_service()?.sign_out()?;
    println!("Signed out");
    Ok(())
}

pub async fn whoami() -> Result<(), String> {
    let auth = auth_service()?;
    let token = auth
        .get_valid_access_token()
        .await?
        .ok_or("Not signed in")?;
    let user = auth.get_user_info(&token).await?;
    println!("{} ({})", user.email, user.user_id);
    Ok(())
}
