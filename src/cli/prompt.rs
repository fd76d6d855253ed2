//! Interactive daily target editor.
//!
//! A terminal front end for [`DialogState`]: each line typed is an edit,
//! an empty line (or end of input) closes the dialog without saving.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::settings::{DialogAction, DialogState};
use crate::types::DailyTarget;

use super::client::IpcClient;
use super::display::Display;

/// Reads lines until one is a valid target.
///
/// Returns the dialog state and the target to save, or `None` when the
/// user closed the dialog.
pub fn prompt_target<R, W>(
    mut state: DialogState,
    input: &mut R,
    output: &mut W,
) -> io::Result<(DialogState, Option<DailyTarget>)>
where
    R: BufRead,
    W: Write,
{
    loop {
        write!(output, "1日の目標 (1〜20) [{}]: ", state.draft)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 || line.trim().is_empty() {
            return Ok((state.apply(DialogAction::Close), None));
        }

        state = state
            .apply(DialogAction::Edit(line.trim().to_string()))
            .apply(DialogAction::Validate);

        match state.save_request() {
            Ok(target) => return Ok((state, Some(target))),
            Err(e) => writeln!(output, "{}", e)?,
        }
    }
}

/// Edits the daily target on the terminal and saves it through the daemon.
///
/// A failed save keeps the dialog open with the typed value.
pub async fn edit_target(client: &IpcClient) -> Result<()> {
    let current = client
        .get_target()
        .await?
        .data
        .and_then(|d| d.daily_target)
        .and_then(|t| DailyTarget::new(t).ok())
        .unwrap_or_default();

    let mut state = DialogState::new(current).apply(DialogAction::Open(current));
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    while state.open {
        let (next, target) = prompt_target(state, &mut input, &mut output)?;
        state = next;
        let Some(target) = target else {
            println!("変更せずに閉じました");
            break;
        };

        match client.set_target(target).await {
            Ok(response) => {
                state = state.apply(DialogAction::SaveSucceeded);
                Display::show_message(&response);
            }
            Err(e) => Display::show_error(&e.to_string()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn opened(n: u8) -> DialogState {
        let target = DailyTarget::new(n).unwrap();
        DialogState::new(target).apply(DialogAction::Open(target))
    }

    #[test]
    fn test_valid_line_yields_target() {
        let mut input = Cursor::new("12\n");
        let mut output = Vec::new();

        let (state, target) = prompt_target(opened(8), &mut input, &mut output).unwrap();

        assert_eq!(target.map(|t| t.get()), Some(12));
        assert!(state.open);
        assert!(state.is_valid());
        assert!(String::from_utf8(output).unwrap().contains("[8]"));
    }

    #[test]
    fn test_invalid_lines_reprompt() {
        let mut input = Cursor::new("abc\n21\n5\n");
        let mut output = Vec::new();

        let (_state, target) = prompt_target(opened(8), &mut input, &mut output).unwrap();

        assert_eq!(target.map(|t| t.get()), Some(5));
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("目標は1〜20の範囲で設定してください").count(), 2);
        assert!(text.contains("[abc]"));
    }

    #[test]
    fn test_empty_line_closes() {
        let mut input = Cursor::new("\n");
        let mut output = Vec::new();

        let (state, target) = prompt_target(opened(8), &mut input, &mut output).unwrap();

        assert!(target.is_none());
        assert!(!state.open);
        assert_eq!(state.draft, "8");
    }

    #[test]
    fn test_end_of_input_closes() {
        let mut input = Cursor::new("0\n");
        let mut output = Vec::new();

        let (state, target) = prompt_target(opened(3), &mut input, &mut output).unwrap();

        assert!(target.is_none());
        assert!(!state.open);
        assert!(!state.is_valid());
    }
}
