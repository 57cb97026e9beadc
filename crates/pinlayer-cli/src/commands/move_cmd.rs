use pinlayer_core::models::Point;

use crate::commands::common::{find_comment, settle_and_check, CommandContext};
use crate::error::CliError;

pub async fn run_move(context: &CommandContext, id: &str, x: f64, y: f64) -> Result<(), CliError> {
    let position = Point::new(x, y);
    if !position.is_finite() {
        return Err(CliError::InvalidCoordinates);
    }

    let (_, mut controller) = context.open_controller(false).await?;
    let id = find_comment(controller.comments(), id)?;
    controller.move_comment(&id, position);
    settle_and_check(&mut controller, &id).await?;
    println!("{id}");
    Ok(())
}
