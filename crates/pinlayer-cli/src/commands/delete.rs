use crate::commands::common::{find_comment, settle_and_check, CommandContext, StdinConfirm};
use crate::error::CliError;

pub async fn run_delete(context: &CommandContext, id: &str, yes: bool) -> Result<(), CliError> {
    let (_, mut controller) = context.open_controller(false).await?;
    let id = find_comment(controller.comments(), id)?;

    let deleted = if yes {
        controller.delete_comment(&id, &mut |_: &str| true)
    } else {
        controller.delete_comment(&id, &mut StdinConfirm)
    };
    if !deleted {
        println!("Delete cancelled");
        return Ok(());
    }

    settle_and_check(&mut controller, &id).await?;
    println!("{id}");
    Ok(())
}
