use anyhow::Result;
use cabinet_session::cli::{actions, actions::Action, start};

#[tokio::main]
async fn main() -> Result<()> {
    let (action, globals) = start()?;

    match action {
        Action::Login { .. } => actions::login::handle(action, &globals).await?,
        Action::Register { .. } => actions::register::handle(action, &globals).await?,
        Action::Logout => actions::logout::handle(&globals).await?,
        Action::Status => actions::status::handle(&globals).await?,
        Action::Refresh => actions::refresh::handle(&globals).await?,
        Action::Guard { .. } => actions::guard::handle(action, &globals).await?,
    }

    Ok(())
}
