use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Input, Password, theme::ColorfulTheme};
use tdlink_core::{
    CallError, Client,
    types::{
        AuthorizationState, CheckAuthenticationCode, CheckAuthenticationEmailCode,
        CheckAuthenticationPassword, EmailAddressAuthentication, EmailAddressAuthenticationCode,
        GetAuthorizationState, GetMe, RegisterUser, SetAuthenticationEmailAddress,
        SetAuthenticationPhoneNumber, SetTdlibParameters, User,
    },
};
use tracing::debug;

/// Answers every authorization state with the parameters or with input from
/// the terminal until the session is ready, then returns the logged-in user.
pub async fn login(client: &Client, params: SetTdlibParameters) -> Result<User> {
    let mut rx = client.auth().watch();
    loop {
        let snapshot = rx.borrow_and_update().clone();
        debug!(phase = %snapshot.phase, version = snapshot.version, "Login step");

        let step = match snapshot.state.as_deref() {
            // Any request wakes the engine up and makes it report its state.
            None => client.call(&GetAuthorizationState {}).await.map(|_| ()),
            Some(AuthorizationState::WaitTdlibParameters(_)) => {
                client.call(&params).await.map(|_| ())
            }
            Some(AuthorizationState::WaitPhoneNumber(_)) => {
                let phone_number = prompt_text("Phone number").await?;
                let request = SetAuthenticationPhoneNumber {
                    phone_number,
                    settings: None,
                };
                client.call(&request).await.map(|_| ())
            }
            Some(AuthorizationState::WaitEmailAddress(_)) => {
                let email_address = prompt_text("Email address").await?;
                client
                    .call(&SetAuthenticationEmailAddress { email_address })
                    .await
                    .map(|_| ())
            }
            Some(AuthorizationState::WaitEmailCode(state)) => {
                let prompt = format!("Code sent to {}", state.code_info.email_address_pattern);
                let code = prompt_text(&prompt).await?;
                let request = CheckAuthenticationEmailCode {
                    code: EmailAddressAuthentication::Code(EmailAddressAuthenticationCode { code }),
                };
                client.call(&request).await.map(|_| ())
            }
            Some(AuthorizationState::WaitCode(state)) => {
                let prompt = format!("Code sent to {}", state.code_info.phone_number);
                let code = prompt_text(&prompt).await?;
                client.call(&CheckAuthenticationCode { code }).await.map(|_| ())
            }
            Some(AuthorizationState::WaitOtherDeviceConfirmation(state)) => {
                println!(
                    "Confirm this login on another device: {}",
                    style(&state.link).cyan()
                );
                Ok(())
            }
            Some(AuthorizationState::WaitRegistration(state)) => {
                println!("{}", state.terms_of_service.text.text);
                let first_name = prompt_text("First name").await?;
                let last_name = prompt_text("Last name").await?;
                let request = RegisterUser {
                    first_name,
                    last_name,
                    disable_notification: false,
                };
                client.call(&request).await.map(|_| ())
            }
            Some(AuthorizationState::WaitPassword(state)) => {
                let prompt = if state.password_hint.is_empty() {
                    "Password".to_owned()
                } else {
                    format!("Password (hint: {})", state.password_hint)
                };
                let password = prompt_password(&prompt).await?;
                client
                    .call(&CheckAuthenticationPassword { password })
                    .await
                    .map(|_| ())
            }
            Some(AuthorizationState::WaitPremiumPurchase(state)) => {
                bail!(
                    "This account needs a premium subscription ({}) before it can log in",
                    state.store_product_id
                );
            }
            Some(AuthorizationState::Ready(_)) => {
                return client.call(&GetMe {}).await.context("Failed to fetch the current user");
            }
            Some(
                AuthorizationState::LoggingOut(_)
                | AuthorizationState::Closing(_)
                | AuthorizationState::Closed(_),
            ) => bail!("Session is {} and can no longer log in", snapshot.phase),
        };

        match step {
            Ok(()) => {}
            // Wrong input: the phase stays the same, so ask again.
            Err(CallError::Rpc(e)) => {
                if e.is_displayable() {
                    eprintln!("{} {}", style("error:").red().bold(), e);
                }
                continue;
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Authorization request failed")),
        }

        if rx.changed().await.is_err() {
            bail!("Session ended during login");
        }
    }
}

async fn prompt_text(prompt: &str) -> Result<String> {
    let prompt = prompt.to_owned();
    let result = tokio::task::spawn_blocking(move || {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()
            .context("Failed to read input")
    })
    .await;

    let input = result.context("Blocking task failed (panic)")??;
    Ok(input.trim().to_owned())
}

async fn prompt_password(prompt: &str) -> Result<String> {
    let prompt = prompt.to_owned();
    let result = tokio::task::spawn_blocking(move || {
        Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact()
            .context("Failed to read password")
    })
    .await;

    Ok(result.context("Blocking task failed (panic)")??)
}
