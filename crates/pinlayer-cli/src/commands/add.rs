use pinlayer_core::models::Point;

use crate::commands::common::{resolve_comment_text, settle_and_check, CommandContext};
use crate::error::CliError;

pub async fn run_add(
    context: &CommandContext,
    x: f64,
    y: f64,
    author: Option<&str>,
    text_parts: &[String],
) -> Result<(), CliError> {
    let position = Point::new(x, y);
    if !position.is_finite() {
        return Err(CliError::InvalidCoordinates);
    }
    let text = resolve_comment_text(text_parts)?;

    let (mut resolved, mut controller) = context.open_controller(false).await?;
    let author = resolved.resolve_author(author);
    let index = controller.comments().len();
    let provisional = controller
        .submit_comment(position, &text, Some(&author))
        .ok_or(CliError::EmptyContent)?;

    settle_and_check(&mut controller, &provisional).await?;
    let stored = controller
        .comments()
        .get(index)
        .map_or_else(|| provisional.to_string(), |comment| comment.id.to_string());
    println!("{stored}");
    Ok(())
}
