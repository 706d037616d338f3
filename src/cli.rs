//! Interactive console
//!
//! The REPL is the presentation surface when running headless: it shows
//! status and mappings, toggles learn mode, and can inject synthetic
//! control events so the gateway is fully drivable with no Nocturn
//! attached.
//!
//! Readline is blocking, so the whole loop runs on a blocking thread and
//! drives the engine through its handle; queries hop back onto the runtime
//! with `Handle::block_on`.

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::runtime::Handle;

use crate::daw;
use crate::engine::EngineHandle;
use crate::events::{ControlEvent, ControlId};
use crate::layout::nav;

/// Run the console until `quit` or EOF.
pub async fn run_repl(engine: EngineHandle) -> Result<()> {
    let rt = Handle::current();
    tokio::task::spawn_blocking(move || repl_loop(rt, engine)).await?
}

fn repl_loop(rt: Handle, engine: EngineHandle) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("{}", "Nocturn gateway console. Type 'help' for commands.".dimmed());

    loop {
        match rl.readline("nocturn> ") {
            Ok(line) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);
                if !dispatch(&rt, &engine, &line) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Execute one command line. Returns false when the console should exit.
fn dispatch(rt: &Handle, engine: &EngineHandle, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let command = words.next().unwrap_or("");
    let args: Vec<&str> = words.collect();

    match (command, args.as_slice()) {
        ("quit", _) | ("exit", _) => return false,

        ("help", _) => print_help(),

        ("status", _) => match rt.block_on(engine.status()) {
            Some(status) => {
                println!(
                    "  profile {} | {} page {}/{}{}{}",
                    status.profile.green(),
                    status.mode.cyan(),
                    status.page + 1,
                    status.page_count,
                    if status.shift_active { " [shift]".yellow() } else { "".normal() },
                    if status.learn_mode { " [learn]".red() } else { "".normal() },
                );
                if let Some(id) = status.last_touched {
                    println!("  last touched: {}", id);
                }
            }
            None => println!("{}", "engine is gone".red()),
        },

        ("mappings", _) => {
            let rows = rt.block_on(engine.mappings());
            for (id, label, target, value) in rows {
                println!(
                    "  {:<18} {:<16} {:<12} {}",
                    id.to_string().bright_white(),
                    label,
                    target.dimmed(),
                    value
                );
            }
        }

        ("learn", ["on"]) => engine.set_learn(true),
        ("learn", ["off"]) => engine.set_learn(false),

        ("save", _) => engine.save_profile(),

        ("profile", [..]) if !args.is_empty() => {
            engine.switch_profile(args.join(" "));
        }

        ("mode", ["eq"]) => press(engine, nav::MODE_EQ),
        ("mode", ["dyn"]) => press(engine, nav::MODE_DYN),
        ("page", ["up"]) => press(engine, nav::PAGE_UP),
        ("page", ["down"]) => press(engine, nav::PAGE_DOWN),

        ("turn", [n, delta]) => match (n.parse::<u8>(), delta.parse::<i8>()) {
            (Ok(n @ 1..=8), Ok(delta)) if delta != 0 => {
                engine.surface_event(ControlEvent::turn(ControlId::Encoder(n), delta));
            }
            _ => println!("{}", "usage: turn <1-8> <delta>".red()),
        },

        ("press", [n]) => match n.parse::<u8>() {
            Ok(n @ 1..=16) => press(engine, ControlId::Button(n)),
            _ => println!("{}", "usage: press <1-16>".red()),
        },

        ("ports", _) => {
            print_ports("MIDI inputs", daw::list_input_ports());
            print_ports("MIDI outputs", daw::list_output_ports());
        }

        _ => println!("{} (try 'help')", format!("unknown command: {}", line).red()),
    }

    true
}

/// Inject a full press/release pair for a button-like control.
fn press(engine: &EngineHandle, id: ControlId) {
    engine.surface_event(ControlEvent::press(id));
    engine.surface_event(ControlEvent::release(id));
}

fn print_ports(title: &str, ports: Result<Vec<String>>) {
    println!("{}:", title.bold());
    match ports {
        Ok(names) if names.is_empty() => println!("  (none)"),
        Ok(names) => {
            for name in names {
                println!("  {}", name);
            }
        }
        Err(e) => println!("  {}", format!("unavailable: {:#}", e).red()),
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  status              console state and active profile");
    println!("  mappings            active mapping table");
    println!("  learn on|off        arm/disarm learn mode (off saves)");
    println!("  save                persist the current profile now");
    println!("  profile <name>      switch profile");
    println!("  mode eq|dyn         force console mode");
    println!("  page up|down        page navigation");
    println!("  turn <n> <delta>    simulate encoder n");
    println!("  press <n>           simulate button n press+release");
    println!("  ports               list system MIDI ports");
    println!("  quit                exit");
}
