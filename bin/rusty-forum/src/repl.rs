//! Line-oriented driver: print the rendered screen, read a control id,
//! prompt for the fields that control submits, dispatch.

use std::io::Write;

use rf_app::Forum;
use rf_core::{Form, Snapshot, UiAction};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{sleep_until, Instant};
use tracing::debug;

const HELP: &str = "Type a control id shown in [brackets], `refresh` to reload, or `quit`.";

type Input = Lines<BufReader<Stdin>>;

pub async fn run(forum: &mut Forum) -> anyhow::Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    show(forum)?;

    loop {
        prompt("> ")?;
        let line = match forum.notification_deadline() {
            Some(deadline) => {
                tokio::select! {
                    line = input.next_line() => line?,
                    _ = sleep_until(Instant::from_std(deadline)) => {
                        if forum.tick() {
                            println!();
                            show(forum)?;
                        }
                        continue;
                    }
                }
            }
            None => input.next_line().await?,
        };
        let Some(line) = line else {
            break;
        };

        let command = line.trim();
        match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" | "?" => {
                println!("{HELP}");
                continue;
            }
            "refresh" => {
                if let Err(err) = forum.refresh().await {
                    debug!(error = %err, "refresh failed");
                }
            }
            control => {
                let rendered = forum.render()?;
                let Some(action) = rendered.action(control) else {
                    println!("No control `{control}` on this screen. {HELP}");
                    continue;
                };
                let Some(form) = read_form(forum, action, &mut input).await? else {
                    break;
                };
                // Failures are reported through the notification slot.
                if let Err(err) = forum.dispatch(action, &form).await {
                    debug!(error = %err, control, "action failed");
                }
            }
        }
        show(forum)?;
    }
    Ok(())
}

fn show(forum: &Forum) -> anyhow::Result<()> {
    let rendered = forum.render()?;
    println!("{}", rendered.markup);
    Ok(())
}

fn prompt(label: &str) -> anyhow::Result<()> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(())
}

/// Reads one line per field. For an open edit form an empty answer keeps
/// the draft value. `None` means input ended.
async fn read_form(
    forum: &Forum,
    action: UiAction,
    input: &mut Input,
) -> anyhow::Result<Option<Form>> {
    let draft = match action {
        UiAction::SubmitEdit(target) => forum.view().editing.get(target).map(|d| d.current.clone()),
        _ => None,
    };

    let mut form = Form::new();
    for field in action.fields() {
        let kept = draft.as_ref().and_then(|d| draft_value(d, field));
        match &kept {
            Some(value) => prompt(&format!("{field} [{value}]: "))?,
            None => prompt(&format!("{field}: "))?,
        }
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        let value = match kept {
            Some(value) if line.is_empty() => value,
            _ => line,
        };
        form.set(field, value);
    }
    Ok(Some(form))
}

fn draft_value(draft: &Snapshot, field: &str) -> Option<String> {
    match (draft, field) {
        (Snapshot::Thread { title, .. }, "title") => Some(title.clone()),
        (Snapshot::Thread { text, .. }, "text") => Some(text.clone()),
        (Snapshot::Reply { text }, "text") => Some(text.clone()),
        _ => None,
    }
}
