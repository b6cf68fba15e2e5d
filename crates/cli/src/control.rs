//! Interactive command loop
//!
//! Reads single-letter commands from stdin and drives the playback
//! controller. Unrecognized input re-prompts; it is never fatal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use read_along_config::Settings;
use read_along_core::{Command, PlaybackMode};
use read_along_pipeline::highlight::{render_line, HighlightSink};
use read_along_pipeline::playback::{CommandOutcome, PlaybackController, PlaybackEvent};

use crate::render::TerminalSink;

/// Run the interactive session until quit or end of input
pub async fn run(
    controller: Arc<PlaybackController>,
    settings: &Settings,
    initial_mode: PlaybackMode,
) -> anyhow::Result<()> {
    let karaoke_on = Arc::new(AtomicBool::new(initial_mode == PlaybackMode::Karaoke));
    let mut mode = initial_mode;

    spawn_render_task(&controller, settings, Arc::clone(&karaoke_on));

    print_menu(settings.playback.seek_step_secs);
    controller.handle(Command::Play).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            // end of input behaves like quit: never leave audio running
            controller.handle(Command::Quit).await?;
            break;
        };

        let Some(command) = Command::parse(&line, settings.playback.seek_step_secs, mode) else {
            if !line.trim().is_empty() {
                println!("Unrecognized command '{}'. Try p/r/s/y/w/f/h/q.", line.trim());
            }
            continue;
        };

        match controller.handle(command).await {
            Ok(CommandOutcome::Continue) => {
                match command {
                    Command::Pause => println!("Paused."),
                    Command::Resume => println!("Resumed."),
                    Command::Stop => println!("Stopped."),
                    Command::Replay => println!("Replaying from the start."),
                    Command::SeekRelative(delta) if delta < 0.0 => {
                        println!("Rewound {:.0}s.", -delta)
                    }
                    Command::SeekRelative(delta) => println!("Forwarded {delta:.0}s."),
                    _ => {}
                }
            }
            Ok(CommandOutcome::SwitchMode(new_mode)) => {
                mode = new_mode;
                karaoke_on.store(mode == PlaybackMode::Karaoke, Ordering::SeqCst);
                match mode {
                    PlaybackMode::Karaoke => println!("Highlighting on."),
                    PlaybackMode::Plain => println!("Highlighting off."),
                }
                controller.handle(Command::Replay).await?;
            }
            Ok(CommandOutcome::Quit) => break,
            Err(e) => {
                // non-fatal: the controller left the session recoverable
                println!("{e}");
            }
        }
    }

    Ok(())
}

/// Forward highlight events to the terminal sink
fn spawn_render_task(
    controller: &Arc<PlaybackController>,
    settings: &Settings,
    karaoke_on: Arc<AtomicBool>,
) {
    let words = controller.timings().words();
    let highlight = settings.highlight.clone();
    let sink = TerminalSink::new(words.len(), highlight.max_line_chars);
    let mut events = controller.subscribe();

    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                PlaybackEvent::WordChanged { index } => {
                    if karaoke_on.load(Ordering::SeqCst) {
                        let line = render_line(&words, index, &highlight);
                        sink.on_word(index, &line);
                    }
                }
                PlaybackEvent::Finished => {
                    println!("\nPlayback complete. [y] replay, [q] quit");
                }
                PlaybackEvent::Stopped | PlaybackEvent::StateChanged { .. } => {}
            }
        }
    });
}

fn print_menu(seek_step_secs: f64) {
    println!("Commands:");
    println!("  [p] pause        [r] resume");
    println!("  [s] stop         [y] replay");
    println!("  [w] rewind {seek_step_secs:.0}s   [f] forward {seek_step_secs:.0}s");
    println!("  [h] toggle highlighting");
    println!("  [q] quit");
}
