//!
//! dbconsole binary
//! ----------------
//! Interactive terminal client for the administrative database backend. Logs
//! in, keeps the session countdown running in the background, and runs backend
//! CLI commands through the confirmation-gated console. Every interpreter
//! command re-evaluates the session guard first.

use std::env;
use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use dbconsole::catalog::{CatalogClient, ObjectKind};
use dbconsole::config::ConsoleConfig;
use dbconsole::console::{confirmation_prompt, CommandConsole, CommandHistoryEntry, Confirmer, Submission};
use dbconsole::gateway::{build_http_client, AuthGateway};
use dbconsole::session::{format_countdown, ClockTick, LoginClient, LoginRedirect, SessionContext, SystemTime};
use dbconsole::storage::MemoryStorage;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--api <url>] [--user <u>] [--password <p>] [--timeout <secs>]\n\nFlags:\n  --api <url>              Backend API base (default: $DBCONSOLE_API_BASE or http://localhost:8000/api)\n  --user <u>               Username for the first login attempt\n  --password <p>           Password for the first login attempt\n  --timeout <secs>         HTTP request timeout (default: $DBCONSOLE_HTTP_TIMEOUT_SECS or 30)\n  -h, --help               Show this help\n\nInteractive commands:\n  :help                    show this help\n  :status                  show who is logged in and the session countdown\n  :refresh                 reset the session countdown\n  :commands                list commands the backend accepts\n  :history                 show command history\n  :toggle <n>              expand/collapse output of history entry n\n  :clear                   clear command history\n  :reload                  re-initialise the console from session storage\n  :schema                  list tables, views, triggers and procedures\n  :def <kind> <name>       show definition (kind: table|view|procedure|trigger)\n  :browse <table>          show the first rows of a table as JSON\n  :sql <text>              run SQL and print the JSON result\n  :logout                  end the session\n  :quit | :exit            leave the client\n  <command>                run a backend CLI command (e.g. db137 users list)\n\nDestructive commands (drop-db, erase, erase-db) ask for confirmation unless they\nalready end in --yes. reset-db always asks and is sent without --yes."
    );
}

struct Args {
    api: Option<String>,
    user: Option<String>,
    password: Option<String>,
    timeout: Option<String>,
}

/// Yes/no prompt on the terminal; anything but y/yes declines.
struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, base: &str) -> bool {
        print!("{} [y/N] ", confirmation_prompt(base));
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() { return false; }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

enum Exit {
    Login,
    Quit,
}

fn main() -> Result<()> {
    println!(r"     _ _
  __| | |__   ___ ___  _ __  ___  ___ | | ___
 / _` | '_ \ / __/ _ \| '_ \/ __|/ _ \| |/ _ \
| (_| | |_) | (_| (_) | | | \__ \ (_) | |  __/
 \__,_|_.__/ \___\___/|_| |_|___/\___/|_|\___|");
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let mut argv: Vec<String> = env::args().collect();
    let program = argv.remove(0);
    let mut args = Args { api: None, user: None, password: None, timeout: None };
    let mut i = 0;
    while i < argv.len() {
        let slot = match argv[i].as_str() {
            "--api" => &mut args.api,
            "--user" => &mut args.user,
            "--password" => &mut args.password,
            "--timeout" => &mut args.timeout,
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            unk => {
                eprintln!("Unrecognized argument: {}", unk);
                print_usage(&program);
                std::process::exit(2);
            }
        };
        if i + 1 >= argv.len() { eprintln!("{} requires a value", argv[i]); print_usage(&program); std::process::exit(2); }
        *slot = Some(argv[i + 1].clone());
        i += 2;
    }

    let mut cfg = ConsoleConfig::from_env().context("reading environment")?;
    if let Some(api) = args.api.as_deref() { cfg.set_api_base(api)?; }
    if let Some(t) = args.timeout.as_deref() { cfg.set_timeout_secs(t)?; }
    tracing::info!(target: "startup", api = %cfg.api_base, timeout_secs = cfg.request_timeout.as_secs(), "dbconsole starting");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    let redirect = Arc::new(LoginRedirect::new());
    let ctx = SessionContext::new(MemoryStorage::shared(), redirect.clone(), Arc::new(SystemTime));
    let http = build_http_client(&cfg)?;
    let login = ctx.login_client(http.clone(), cfg.api_base.clone());
    let gateway = AuthGateway::new(http, cfg.api_base.clone(), &ctx);
    let mut rl = DefaultEditor::new().context("Failed to initialise line editor")?;

    println!("connected to {}", cfg.api_base);
    let mut first = (args.user.take(), args.password.take());
    loop {
        redirect.take_pending();
        let (user, pass) = match (first.0.take(), first.1.take()) {
            (Some(u), Some(p)) => (u, p),
            (u, _) => {
                let user = match u { Some(u) => u, None => match rl.readline("username: ") { Ok(s) => s.trim().to_string(), Err(_) => return Ok(()) } };
                let pass = match rl.readline("password: ") { Ok(s) => s, Err(_) => return Ok(()) };
                (user, pass)
            }
        };
        if user.is_empty() { continue; }
        if let Err(e) = rt.block_on(login.login(&user, &pass)) {
            eprintln!("login failed: {}", e);
            continue;
        }
        match run_protected(&rt, &mut rl, &ctx, &gateway, &login, &redirect)? {
            Exit::Login => continue,
            Exit::Quit => break,
        }
    }
    Ok(())
}

fn print_entry(n: usize, e: &CommandHistoryEntry) {
    let mark = if e.success { "ok" } else { "failed" };
    println!("[{}] $ {}  ({}){}", n, e.command, mark, if e.expanded { "" } else { "  [collapsed]" });
    if e.expanded && !e.output.is_empty() { println!("{}", e.output); }
}

fn run_protected(
    rt: &tokio::runtime::Runtime,
    rl: &mut DefaultEditor,
    ctx: &SessionContext,
    gateway: &AuthGateway,
    login: &LoginClient,
    redirect: &LoginRedirect,
) -> Result<Exit> {
    let guard = ctx.guard();
    let clock = ctx.clock();
    if guard.enter(|_| ()).is_err() { return Ok(Exit::Login); }
    if let Some(b) = ctx.badge() { println!("{}", b); }

    let mut console = CommandConsole::new(gateway.clone(), ctx.storage().clone(), Arc::new(StdinConfirmer));
    let catalog = CatalogClient::new(gateway.clone());
    let available = rt.block_on(console.load_available());
    if !available.is_empty() { println!("{} backend commands available; type :commands to list them", available.len()); }

    let clock_task = {
        let _enter = rt.enter();
        let mut warned = false;
        clock.clone().spawn(move |tick| match tick {
            ClockTick::Running { remaining } if remaining.as_secs() <= 60 && !warned => {
                warned = true;
                eprintln!("\nsession expires in {}; :refresh to extend", format_countdown(remaining));
            }
            ClockTick::Running { remaining } if remaining.as_secs() > 60 => warned = false,
            ClockTick::Elapsed => eprintln!("\nsession expired; press Enter to log in again"),
            _ => {}
        })
    };

    let exit = loop {
        if let Some((_, reason)) = redirect.take_pending() {
            println!("returning to login ({:?})", reason);
            break Exit::Login;
        }
        let line = match rl.readline("> ") {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break Exit::Quit,
            Err(e) => { eprintln!("input error: {}", e); break Exit::Quit; }
        };
        // the countdown may have ended the session while we waited for input
        if let Some((_, reason)) = redirect.take_pending() {
            println!("returning to login ({:?})", reason);
            break Exit::Login;
        }
        let line = line.trim().to_string();
        if line.is_empty() { continue; }
        let _ = rl.add_history_entry(line.as_str());
        if matches!(line.as_str(), ":quit" | ":exit") { break Exit::Quit; }
        // protected navigation: the guard decides before anything runs
        if guard.enter(|_| ()).is_err() { continue; }

        let (cmd, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line.as_str(), ""),
        };
        match cmd {
            ":help" => print_usage("dbconsole"),
            ":status" => {
                if let Some(b) = ctx.badge() { println!("{}", b); }
                if let Some(left) = clock.remaining() { println!("Session expires in: {}", format_countdown(left)); }
            }
            ":refresh" => {
                if clock.refresh() { println!("Session expires in: {}", clock.remaining().map(format_countdown).unwrap_or_default()); }
            }
            ":commands" => {
                for c in rt.block_on(console.load_available()) {
                    if c.description.is_empty() { println!("  {}", c.name); } else { println!("  {:<28} {}", c.name, c.description); }
                }
            }
            ":history" => {
                let entries = console.history().entries();
                if entries.is_empty() { println!("(no history)"); }
                for (i, e) in entries.iter().enumerate() { print_entry(i + 1, e); }
            }
            ":toggle" => match rest.parse::<usize>() {
                Ok(n) if n >= 1 => match console.toggle_expand(n - 1) {
                    Ok(_) => { if let Some(e) = console.history().get(n - 1) { print_entry(n, &e); } }
                    Err(e) => eprintln!("error: {}", e),
                },
                _ => eprintln!("usage: :toggle <n>"),
            },
            ":clear" => { console.clear(); println!("history cleared"); }
            ":reload" => {
                console = CommandConsole::new(gateway.clone(), ctx.storage().clone(), Arc::new(StdinConfirmer));
                println!("restored {} history entries", console.history().len());
            }
            ":schema" => match rt.block_on(catalog.schema()) {
                Ok(o) => {
                    println!("Tables: {}", o.tables.join(", "));
                    println!("Views: {}", o.views.join(", "));
                    println!("Triggers: {}", o.triggers.join(", "));
                    println!("Procedures: {}", o.procedures.join(", "));
                }
                Err(e) => eprintln!("error: {}", e),
            },
            ":def" => {
                let mut parts = rest.splitn(2, char::is_whitespace);
                match (parts.next().and_then(ObjectKind::parse), parts.next().map(str::trim)) {
                    (Some(kind), Some(name)) if !name.is_empty() => match rt.block_on(catalog.definition(kind, name)) {
                        Ok(Some(text)) => println!("{}", text),
                        Ok(None) => println!("{:?} '{}' not found", kind, name),
                        Err(e) => eprintln!("error: {}", e),
                    },
                    _ => eprintln!("usage: :def <table|view|procedure|trigger> <name>"),
                }
            }
            ":browse" if rest.is_empty() => eprintln!("usage: :browse <table>"),
            ":browse" => match rt.block_on(catalog.browse(rest)) {
                Ok(rows) => { let pretty = serde_json::to_string_pretty(&rows).unwrap_or_else(|_| rows.to_string()); println!("{}", pretty); }
                Err(e) => eprintln!("error: {}", e),
            },
            ":sql" => match rt.block_on(catalog.query(rest)) {
                Ok(val) => { let pretty = serde_json::to_string_pretty(&val).unwrap_or_else(|_| val.to_string()); println!("{}", pretty); }
                Err(e) => eprintln!("error: {}", e),
            },
            ":logout" => {
                if let Some(user) = login.logout() {
                    println!("You have been logged out\nGoodbye, {}", user);
                }
                break Exit::Login;
            }
            c if c.starts_with(':') => eprintln!("unknown command {}; :help lists commands", c),
            _ => {
                let entry = rt.block_on(async {
                    match console.submit(&line) {
                        Submission::Declined => { println!("cancelled"); None }
                        s => s.wait().await,
                    }
                });
                if let Some(e) = entry { print_entry(console.history().len(), &e); }
            }
        }
    };
    clock_task.abort();
    Ok(exit)
}
