mod autopilot;
mod config;
mod dashboard;

use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use tankduel::{
    Connection, ConnectionState, FixedTimestep, Host, JsonFileStore, Joiner, MatchOutcome, MatchSession,
    ReplayTransport, Role, Transport, advertised_ip, finish_match, parse_target, request_rematch,
    wait_for_rematch,
};

use autopilot::Autopilot;
use config::PeerConfig;
use dashboard::DashboardState;

#[derive(Parser)]
#[command(name = "tankduel-peer")]
#[command(about = "Two-player tank duel over a direct TCP link")]
struct Args {
    #[arg(short, long, default_value = "Player")]
    name: String,

    #[arg(long, default_value = "scores.json")]
    scores: PathBuf,

    #[arg(long)]
    headless: bool,

    #[arg(short, long, default_value_t = tankduel::DEFAULT_TICK_RATE)]
    tick_rate: u32,

    #[arg(long, default_value_t = 0, help = "Rematches to offer after the first match")]
    rematches: u32,

    #[arg(long, help = "Give up on a match after this many ticks")]
    max_ticks: Option<u64>,

    #[arg(long, default_value_t = 0, help = "Seed for the autopilot and pickup placement")]
    seed: u64,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Wait for an opponent to join.
    Host {
        #[arg(short, long, default_value_t = tankduel::DEFAULT_PORT)]
        port: u16,

        #[arg(long, default_value_t = 60, help = "Seconds to wait for an opponent")]
        wait: u64,
    },
    /// Connect to a waiting host. Blank or invalid values fall back to
    /// 127.0.0.1 and the default port.
    Join {
        #[arg(long, default_value = "")]
        ip: String,

        #[arg(short, long, default_value = "")]
        port: String,
    },
}

enum MatchEnd {
    Finished(MatchOutcome),
    Quit,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = PeerConfig {
        player_name: args.name.clone(),
        scores_path: args.scores.clone(),
        rematches: args.rematches,
        max_ticks: args.max_ticks,
        seed: args.seed,
        ..Default::default()
    };
    config.session.tick_rate = args.tick_rate;
    config.session.pickup_seed ^= args.seed;

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let (role, connection) = match args.mode {
        Mode::Host { port, wait } => {
            config.net.port = port;
            config.peer_wait = Duration::from_secs(wait);
            (Role::Host, host(&config)?)
        }
        Mode::Join { ip, port } => (Role::Joiner, join(&ip, &port, &config)?),
    };

    let result = play(role, connection.clone(), &config, args.headless);
    connection.stop();
    result
}

fn host(config: &PeerConfig) -> Result<Connection> {
    let host = Host::start(&config.net)?;
    println!(
        "Waiting for an opponent on {}:{}",
        advertised_ip(),
        host.local_addr().port()
    );

    if !host.wait_for_peer(config.peer_wait) {
        host.stop();
        bail!("no opponent joined within {:?}", config.peer_wait);
    }
    Ok(host.into_connection())
}

fn join(ip: &str, port: &str, config: &PeerConfig) -> Result<Connection> {
    let target = parse_target(ip, port);
    let joiner = Joiner::connect(target, &config.net)?;
    Ok(joiner.into_connection())
}

fn play(role: Role, connection: Connection, config: &PeerConfig, headless: bool) -> Result<()> {
    let store = JsonFileStore::new(&config.scores_path);
    let mut session = MatchSession::new(role, connection.clone(), config.session.clone());
    let mut autopilot = Autopilot::new(config.seed ^ role as u64);
    let mut rematches_left = config.rematches;

    loop {
        let end = if headless {
            run_headless(&mut session, &mut autopilot, config)
        } else {
            run_with_dashboard(&mut session, &mut autopilot, &connection, config)?
        };

        let outcome = match end {
            MatchEnd::Finished(outcome) => outcome,
            MatchEnd::Quit => {
                log::info!("Leaving the match");
                return Ok(());
            }
        };

        let link = ReplayTransport::new(&connection, session.take_held_controls());
        let report = finish_match(&link, &store, &config.player_name, outcome.is_win(), &config.endgame)?;
        println!("{}", if outcome.is_win() { "Victory!" } else { "Defeat." });
        for entry in report.leaderboard.entries() {
            println!("  {:<16} {:>3} W {:>3} L {:>3} G", entry.name, entry.wins, entry.losses, entry.games);
        }

        if rematches_left == 0 || !connection.is_connected() {
            return Ok(());
        }
        rematches_left -= 1;

        if let Err(e) = request_rematch(&connection) {
            log::warn!("Could not request a rematch: {}", e);
            return Ok(());
        }
        let accepted = report.rematch_requested
            || wait_for_rematch(&link, config.rematch_wait, config.endgame.poll_interval);
        if !accepted {
            println!("Opponent did not want a rematch");
            return Ok(());
        }

        log::info!("Rematch accepted");
        session.reset();
    }
}

fn run_headless(session: &mut MatchSession<Connection>, autopilot: &mut Autopilot, config: &PeerConfig) -> MatchEnd {
    let mut timestep = FixedTimestep::new(config.session.tick_rate);
    let mut last_frame = Instant::now();
    let mut warned_lost = false;

    loop {
        let now = Instant::now();
        timestep.accumulate((now - last_frame).as_secs_f32());
        last_frame = now;

        while timestep.consume_tick() {
            if let Some(end) = step(session, autopilot, config) {
                return end;
            }
        }

        let lost = session.is_connection_lost();
        if lost && session.transport().state() == ConnectionState::Closed {
            log::warn!("Opponent left the match");
            return MatchEnd::Quit;
        }
        if lost && !warned_lost {
            log::warn!(
                "Connection lost: nothing from the opponent for {:.1}s",
                session.since_last_snapshot().as_secs_f32()
            );
        } else if !lost && warned_lost {
            log::info!("Opponent is back");
        }
        warned_lost = lost;

        thread::sleep(Duration::from_millis(1));
    }
}

fn step(session: &mut MatchSession<Connection>, autopilot: &mut Autopilot, config: &PeerConfig) -> Option<MatchEnd> {
    let input = autopilot.next_input(&session.world().tank, session.remote());
    let report = session.tick(&input);

    if let Some(outcome) = report.outcome {
        return Some(MatchEnd::Finished(outcome));
    }
    if config.max_ticks.is_some_and(|max| session.ticks() >= max) {
        log::warn!("No result after {} ticks", session.ticks());
        return Some(MatchEnd::Quit);
    }
    None
}

fn run_with_dashboard(
    session: &mut MatchSession<Connection>,
    autopilot: &mut Autopilot,
    connection: &Connection,
    config: &PeerConfig,
) -> io::Result<MatchEnd> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let started = Instant::now();
    let mut timestep = FixedTimestep::new(config.session.tick_rate);
    let mut last_frame = Instant::now();
    let mut end = None;

    while end.is_none() {
        let now = Instant::now();
        timestep.accumulate((now - last_frame).as_secs_f32());
        last_frame = now;

        while end.is_none() && timestep.consume_tick() {
            end = step(session, autopilot, config);
        }

        if event::poll(Duration::from_millis(1))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    end = Some(MatchEnd::Quit);
                }
            }
        }

        let world = session.world();
        let state = DashboardState {
            role: session.role(),
            player: &config.player_name,
            tick: session.ticks(),
            elapsed: started.elapsed(),
            local: &world.tank,
            remote: session.remote(),
            local_shells: world.shells.len(),
            ghost_shells: session.ghosts().shells().len(),
            pickups: world.pickups.visible().len(),
            link: connection.stats(),
            connection: connection.state(),
            since_last_snapshot: session.since_last_snapshot(),
            connection_lost: session.is_connection_lost(),
            outcome: session.outcome(),
        };
        terminal.draw(|frame| dashboard::render(frame, &state))?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(end.unwrap_or(MatchEnd::Quit))
}
