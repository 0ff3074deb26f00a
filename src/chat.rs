use std::sync::Arc;

use clx::progress::{ProgressJob, ProgressJobBuilder, ProgressStatus};
use log::warn;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{App, GlobalOptions, ModelSession};
use crate::cli::ModelArgs;
use crate::llm::Conversation;
use crate::prompt;

fn thinking_job() -> Arc<ProgressJob> {
    ProgressJobBuilder::new()
        .body("{{spinner()}} {{message | flex}}")
        .prop("message", "Thinking...")
        .start()
}

fn finish(job: &Arc<ProgressJob>, ok: bool) {
    if ok {
        job.set_status(ProgressStatus::Done);
        job.prop("message", "Done");
    } else {
        job.set_status(ProgressStatus::Warn);
        job.prop("message", "Failed");
    }
    clx::progress::flush();
}

pub async fn ask(global: &GlobalOptions, args: &ModelArgs, question: &str) -> miette::Result<()> {
    let mut app = App::load(global)?;
    let model = app.model_session(args)?;

    let job = thinking_job();
    let mut conversation = model.client.new_conversation(question);
    let result = app.run_turn(&model, &mut conversation, &job).await;
    finish(&job, result.is_ok());
    let answer = result?;

    let (input, output) = app.state.token_usage();
    eprintln!(
        "Tokens: {input} input + {output} output = {} total",
        input + output
    );
    println!("{answer}");
    Ok(())
}

/// Read questions from stdin until EOF or `/quit`. The conversation carries
/// over between questions until `/reset` or a failed turn.
pub async fn repl(global: &GlobalOptions, args: &ModelArgs) -> miette::Result<()> {
    let mut app = App::load(global)?;
    let model = app.model_session(args)?;
    eprintln!("{}", prompt::banner());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation: Option<Conversation> = None;
    while let Some(line) = lines.next_line().await.map_err(crate::error::Error::from)? {
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/reset" => {
                conversation = None;
                app.state.invalidate_health();
                eprintln!("Conversation reset.");
                continue;
            }
            "/health" => {
                println!("{}", app.health_dashboard().await);
                continue;
            }
            _ => {}
        }

        match turn(&mut app, &model, conversation.take(), line).await {
            Ok((answer, conv)) => {
                conversation = Some(conv);
                println!("{answer}\n");
            }
            Err(e) => {
                warn!("turn failed, starting a new conversation: {e}");
                eprintln!("Error: {e}");
            }
        }
    }

    let (input, output) = app.state.token_usage();
    eprintln!(
        "Tokens: {input} input + {output} output = {} total",
        input + output
    );
    Ok(())
}

async fn turn(
    app: &mut App,
    model: &ModelSession,
    conversation: Option<Conversation>,
    question: &str,
) -> crate::error::Result<(String, Conversation)> {
    let mut conversation = match conversation {
        Some(mut conv) => {
            model.client.append_user_message(&mut conv, question);
            conv
        }
        None => model.client.new_conversation(question),
    };
    let job = thinking_job();
    let result = app.run_turn(model, &mut conversation, &job).await;
    finish(&job, result.is_ok());
    Ok((result?, conversation))
}
