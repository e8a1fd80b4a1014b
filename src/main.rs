use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rayon::prelude::*;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use game_2048::advisor::Advisor;
use game_2048::audio::{LogSink, NullAudio, ToneNotifier};
use game_2048::config::AppConfig;
use game_2048::engine::{Board, BoardSize, Move, Tile};
use game_2048::session::{GameMode, GameSession, GameState};
use game_2048::storage::{JsonFileBackend, Storage};
use game_2048::theme::{self, Theme};
use game_2048::trace::{self, Trace};

#[derive(Parser, Debug)]
#[command(name = "game-2048", about = "Sliding-tile merge game")]
struct Args {
    /// TOML config file
    #[arg(long, value_name = "FILE", value_parser = clap::value_parser!(PathBuf))]
    config: Option<PathBuf>,

    /// Board side (3-6)
    #[arg(long)]
    size: Option<usize>,

    /// classic, endless, time, step or challenge
    #[arg(long)]
    mode: Option<GameMode>,

    #[arg(long)]
    seed: Option<u64>,

    /// Keep scores in memory only
    #[arg(long, default_value_t = false)]
    no_storage: bool,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Interactive game on stdin (default)
    Play {
        /// Write a replay trace on exit
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
    },
    /// Let the advisor play one game
    Auto {
        #[arg(long, value_name = "FILE")]
        trace: Option<PathBuf>,
        /// Only print the final board
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
    /// Play many advisor games in parallel and summarize
    Bench {
        #[arg(long, default_value_t = 100)]
        games: u64,
        /// Stop each game after this many moves
        #[arg(long)]
        max_moves: Option<u32>,
    },
    /// Rebuild a game from a trace file
    Replay { path: PathBuf },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let cfg = match &args.config {
        Some(path) => AppConfig::from_toml(path).with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };
    let size = args.size.map(BoardSize::try_from).transpose()?.or(cfg.game.size);
    let mode = args.mode.unwrap_or(cfg.game.mode);
    let seed = args.seed.or(cfg.game.seed);

    match args.cmd.unwrap_or(Cmd::Play { trace: None }) {
        Cmd::Play { trace } => {
            let storage = open_storage(&cfg, args.no_storage)?;
            play(storage, size, mode, seed, trace)
        }
        Cmd::Auto { trace, quiet } => {
            let storage = open_storage(&cfg, args.no_storage)?;
            auto(storage, Advisor::with_weights(cfg.advisor), size.unwrap_or_default(), mode, seed, trace, quiet)
        }
        Cmd::Bench { games, max_moves } => {
            bench(Advisor::with_weights(cfg.advisor), size.unwrap_or_default(), mode, seed.unwrap_or(0), games, max_moves);
            Ok(())
        }
        Cmd::Replay { path } => replay(path),
    }
}

fn open_storage(cfg: &AppConfig, disabled: bool) -> Result<Storage> {
    match (&cfg.storage.path, disabled) {
        (Some(path), false) => {
            let backend =
                JsonFileBackend::open(path).with_context(|| format!("opening store {}", path.display()))?;
            Ok(Storage::new(backend))
        }
        _ => Ok(Storage::in_memory()),
    }
}

fn play(
    storage: Storage,
    size: Option<BoardSize>,
    mode: GameMode,
    seed: Option<u64>,
    trace_out: Option<PathBuf>,
) -> Result<()> {
    let settings = storage.settings();
    let size = size.unwrap_or(settings.board_size);
    let theme = theme::theme(&settings.theme);
    let audio = ToneNotifier::from_storage(LogSink, &storage);
    let mut game = GameSession::new(storage, Box::new(audio), size, mode, seed);
    let mut advisor = Advisor::new();

    println!("wasd/hjkl or up/down/left/right to move, u undo, c continue, r restart,");
    println!("? hint, size N, sound on|off, q quit");
    render(&game, theme);

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else { continue };
        match cmd {
            "q" | "quit" => break,
            "u" | "undo" => {
                if !game.undo() {
                    println!("nothing to undo");
                }
            }
            "c" | "continue" => {
                game.continue_endless();
            }
            "r" | "restart" => {
                game.restart();
                announce(game.start_unlocks());
            }
            "?" | "hint" => match advisor.suggest(game.board()) {
                Some(s) => println!("hint: {} ({})", s.dir, s.reasoning),
                None => println!("no moves left"),
            },
            "size" => {
                if let Some(size) = words.next().and_then(|w| w.parse::<usize>().ok()) {
                    if let Ok(size) = BoardSize::try_from(size) {
                        game.change_board_size(size);
                        announce(game.start_unlocks());
                    }
                }
            }
            "sound" => match words.next() {
                Some("on") => game.set_sound_enabled(true),
                Some("off") => game.set_sound_enabled(false),
                _ => {}
            },
            other => {
                // Anything unrecognised is ignored.
                let Ok(dir) = other.parse::<Move>() else { continue };
                if let Some(report) = game.make_move(dir) {
                    announce(&report.unlocked);
                }
            }
        }
        render(&game, theme);
        io::stdout().flush()?;
    }

    if let Some(path) = trace_out {
        game.trace().write_to_path(&path).with_context(|| format!("writing {}", path.display()))?;
        info!("trace written to {}", path.display());
    }
    Ok(())
}

fn announce(ids: &[&str]) {
    for id in ids {
        println!("achievement unlocked: {id}");
    }
}

fn auto(
    storage: Storage,
    mut advisor: Advisor,
    size: BoardSize,
    mode: GameMode,
    seed: Option<u64>,
    trace_out: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let theme = theme::theme(&storage.settings().theme);
    let mut game = GameSession::new(storage, Box::new(NullAudio), size, mode, seed);
    while let Some(dir) = advisor.best_move(game.board()) {
        if game.make_move(dir).is_none() {
            break;
        }
        if game.state() == GameState::Won && game.continue_endless() {
            info!("won after {} moves, continuing", game.move_count());
        }
        if !quiet {
            render(&game, theme);
        }
    }
    render(&game, theme);
    println!("Moves: {} | score: {} | max tile: {}", game.move_count(), game.score(), game.max_tile());

    if let Some(path) = trace_out {
        game.trace().write_to_path(&path).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

struct BenchResult {
    score: u64,
    max_tile: Tile,
    moves: u32,
    won: bool,
}

fn bench(advisor: Advisor, size: BoardSize, mode: GameMode, base_seed: u64, games: u64, max_moves: Option<u32>) {
    let pb = ProgressBar::new(games);
    pb.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} games | {elapsed_precise} | eta {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let results: Vec<BenchResult> = (0..games)
        .into_par_iter()
        .map(|i| {
            let mut advisor = advisor.clone();
            let mut game = GameSession::new(
                Storage::in_memory(),
                Box::new(NullAudio),
                size,
                mode,
                Some(base_seed.wrapping_add(i)),
            );
            let mut won = false;
            while let Some(dir) = advisor.best_move(game.board()) {
                if max_moves.is_some_and(|m| game.move_count() >= m) {
                    break;
                }
                match game.make_move(dir) {
                    Some(report) => won |= report.won,
                    None => break,
                }
                if game.state() == GameState::Won {
                    game.continue_endless();
                }
            }
            pb.inc(1);
            BenchResult { score: game.score(), max_tile: game.max_tile(), moves: game.move_count(), won }
        })
        .collect();
    pb.finish_and_clear();

    let n = results.len().max(1) as f64;
    let mean_score = results.iter().map(|r| r.score as f64).sum::<f64>() / n;
    let mean_moves = results.iter().map(|r| r.moves as f64).sum::<f64>() / n;
    let wins = results.iter().filter(|r| r.won).count();
    let best = results.iter().map(|r| r.max_tile).max().unwrap_or(0);
    println!(
        "{games} games on {size} | mean score {mean_score:.1} | mean moves {mean_moves:.1} | wins {wins} ({:.1}%) | best tile {best}",
        wins as f64 * 100.0 / n
    );
}

fn replay(path: PathBuf) -> Result<()> {
    let trace = Trace::read_from_path(&path).with_context(|| format!("reading {}", path.display()))?;
    info!("{} actions, {} {} game, seed {}", trace.len(), trace.size, trace.mode, trace.seed);
    let game = trace::replay(&trace, Storage::in_memory(), Box::new(NullAudio))?;
    render(&game, theme::theme("classic"));
    println!("Moves: {} | score: {} | undos: {} | {:?}", game.move_count(), game.score(), game.undo_count(), game.state());
    Ok(())
}

fn render(game: &GameSession, theme: &Theme) {
    println!("score {} (best {})  moves {}  {}", game.score(), game.best_score(), game.move_count(), game.mode());
    print_board(game.board(), theme);
    match game.state() {
        GameState::Won => println!("You reached {}! (c to keep going)", game.config().target_score()),
        GameState::GameOver => println!("Game over. (r to restart)"),
        GameState::Playing => {}
    }
}

fn print_board(board: &Board, theme: &Theme) {
    for row in board.rows() {
        let line: Vec<String> = row
            .iter()
            .map(|&v| {
                if v == 0 {
                    format!("{:^6}", ".")
                } else {
                    let c = theme::tile_color(theme, v);
                    paint(&format!("{v:^6}"), c.background, c.text)
                }
            })
            .collect();
        println!("{}", line.join(" "));
    }
}

/// Wrap `text` in 24-bit ANSI colors. Non-hex colors are left unstyled.
fn paint(text: &str, bg: &str, fg: &str) -> String {
    match (rgb(bg), rgb(fg)) {
        (Some((br, bgr, bb)), Some((fr, fgr, fb))) => {
            format!("\x1b[48;2;{br};{bgr};{bb}m\x1b[38;2;{fr};{fgr};{fb}m{text}\x1b[0m")
        }
        _ => text.to_string(),
    }
}

fn rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}
