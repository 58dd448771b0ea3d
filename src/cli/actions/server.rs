use crate::api;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            jwt_secret,
            frontend_url,
            token_ttl,
        } => {
            let config = api::AppConfig::new(jwt_secret)
                .with_frontend_base_url(frontend_url)
                .with_token_ttl_seconds(token_ttl);

            api::new(port, dsn, config).await?;
        }
    }

    Ok(())
}
