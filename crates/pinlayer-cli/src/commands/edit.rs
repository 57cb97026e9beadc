use crate::commands::common::{
    find_comment, resolve_comment_text, settle_and_check, CommandContext,
};
use crate::error::CliError;

pub async fn run_edit(
    context: &CommandContext,
    id: &str,
    text_parts: &[String],
) -> Result<(), CliError> {
    let text = resolve_comment_text(text_parts)?;
    let (_, mut controller) = context.open_controller(false).await?;
    let id = find_comment(controller.comments(), id)?;

    if controller
        .comment(&id)
        .is_some_and(|comment| comment.text == text)
    {
        println!("{id}");
        return Ok(());
    }

    controller.update_comment_text(&id, text);
    settle_and_check(&mut controller, &id).await?;
    println!("{id}");
    Ok(())
}
