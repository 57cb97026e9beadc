use crate::commands::common::{
    comment_to_list_item, format_comment_lines, CommandContext, CommentListItem,
};
use crate::error::CliError;

pub async fn run_list(context: &CommandContext, as_json: bool) -> Result<(), CliError> {
    let (_, controller) = context.open_controller(false).await?;
    let comments = controller.comments();

    if as_json {
        let json_items = comments
            .iter()
            .map(comment_to_list_item)
            .collect::<Vec<CommentListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_comment_lines(comments) {
            println!("{line}");
        }
    }

    Ok(())
}
