//! Compact binary record of a single game, enough to replay it exactly.
//!
//! Layout (little-endian):
//!
//! | field | size |
//! |---|---|
//! | magic `G2T1` | 4 |
//! | version | 1 |
//! | endianness (0 = LE) | 1 |
//! | board side | 1 |
//! | mode tag | 1 |
//! | rng seed | 8 |
//! | start time, unix seconds | 8 |
//! | start kind (0 fresh, 1 position) | 1 |
//! | start cells, only for kind 1 | side² × 8 |
//! | action count | 4 |
//! | actions | count |
//! | CRC32C of everything above | 4 |
//!
//! Actions are one byte each: 0-3 the move index, 4 undo, 5 continue in
//! endless mode.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::audio::AudioNotifier;
use crate::engine::{Board, BoardError, BoardSize, Move, Tile};
use crate::session::{GameMode, GameSession};
use crate::storage::Storage;

const MAGIC: &[u8; 4] = b"G2T1";
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0;

const ACTION_UNDO: u8 = 4;
const ACTION_CONTINUE: u8 = 5;

const START_FRESH: u8 = 0;
const START_POSITION: u8 = 1;

// magic + version + endian + side + mode + seed + start time + start kind
const HEADER_LEN: usize = 4 + 1 + 1 + 1 + 1 + 8 + 8 + 1;

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
    #[error("unknown action byte {0}")]
    UnknownAction(u8),
    #[error("unsupported board side {0}")]
    BadSize(u8),
    #[error("invalid start position: {0}")]
    Board(#[from] BoardError),
    #[error("action {step} ({action:?}) was rejected during replay")]
    Diverged { step: usize, action: Action },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Move),
    Undo,
    ContinueEndless,
}

impl Action {
    fn to_byte(self) -> u8 {
        match self {
            Action::Move(m) => m.index(),
            Action::Undo => ACTION_UNDO,
            Action::ContinueEndless => ACTION_CONTINUE,
        }
    }

    fn from_byte(b: u8) -> Result<Action, TraceError> {
        match b {
            ACTION_UNDO => Ok(Action::Undo),
            ACTION_CONTINUE => Ok(Action::ContinueEndless),
            _ => Move::from_index(b).map(Action::Move).ok_or(TraceError::UnknownAction(b)),
        }
    }
}

/// How the traced game began.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Start {
    /// Empty board plus the usual initial spawns.
    Fresh,
    /// An explicit position, no initial spawns.
    Position(Board),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub size: BoardSize,
    pub mode: GameMode,
    pub seed: u64,
    pub start_unix_s: u64,
    pub start: Start,
    pub actions: Vec<Action>,
}

impl Trace {
    pub fn new(size: BoardSize, mode: GameMode, seed: u64, start: Start) -> Self {
        Self { size, mode, seed, start_unix_s: now_unix_seconds(), start, actions: Vec::new() }
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        let side = self.size.side();
        let start_len = match self.start {
            Start::Fresh => 0,
            Start::Position(_) => side * side * 8,
        };
        let mut buf = Vec::with_capacity(HEADER_LEN + start_len + 4 + self.actions.len() + 4);

        buf.extend_from_slice(MAGIC);
        buf.push(VERSION);
        buf.push(ENDIAN_LE);
        buf.push(side as u8);
        buf.push(self.mode.tag());
        buf.extend_from_slice(&self.seed.to_le_bytes());
        buf.extend_from_slice(&self.start_unix_s.to_le_bytes());
        match &self.start {
            Start::Fresh => buf.push(START_FRESH),
            Start::Position(board) => {
                buf.push(START_POSITION);
                for &t in board.cells() {
                    buf.extend_from_slice(&t.to_le_bytes());
                }
            }
        }
        buf.extend_from_slice(&(self.actions.len() as u32).to_le_bytes());
        buf.extend(self.actions.iter().map(|a| a.to_byte()));

        let checksum = crc32c::crc32c(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Trace, TraceError> {
        if bytes.len() < HEADER_LEN + 4 + 4 {
            return Err(TraceError::Malformed);
        }
        let (content, trailer) = bytes.split_at(bytes.len() - 4);
        let file_crc = read_u32_le(trailer).ok_or(TraceError::Malformed)?;
        if file_crc != crc32c::crc32c(content) {
            return Err(TraceError::Checksum);
        }

        if &content[..4] != MAGIC || content[4] != VERSION || content[5] != ENDIAN_LE {
            return Err(TraceError::MagicOrVersion);
        }
        let side = content[6];
        let size = BoardSize::try_from(side as usize).map_err(|_| TraceError::BadSize(side))?;
        let mode = GameMode::from_tag(content[7]).ok_or(TraceError::Malformed)?;
        let seed = read_u64_le(&content[8..]).ok_or(TraceError::Malformed)?;
        let start_unix_s = read_u64_le(&content[16..]).ok_or(TraceError::Malformed)?;
        let mut off = 24;

        let start = match content[off] {
            START_FRESH => {
                off += 1;
                Start::Fresh
            }
            START_POSITION => {
                off += 1;
                let n = size.side();
                let mut rows = Vec::with_capacity(n);
                for _ in 0..n {
                    let mut row: Vec<Tile> = Vec::with_capacity(n);
                    for _ in 0..n {
                        let slice = content.get(off..).ok_or(TraceError::Malformed)?;
                        row.push(read_u64_le(slice).ok_or(TraceError::Malformed)?);
                        off += 8;
                    }
                    rows.push(row);
                }
                Start::Position(Board::from_rows(rows)?)
            }
            _ => return Err(TraceError::Malformed),
        };

        let count = content
            .get(off..)
            .and_then(read_u32_le)
            .ok_or(TraceError::Malformed)? as usize;
        off += 4;
        let raw = content.get(off..).ok_or(TraceError::Malformed)?;
        if raw.len() != count {
            return Err(TraceError::Malformed);
        }
        let actions = raw.iter().map(|&b| Action::from_byte(b)).collect::<Result<Vec<_>, _>>()?;

        Ok(Trace { size, mode, seed, start_unix_s, start, actions })
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TraceError> {
        let data = self.encode();
        let mut f = fs::File::create(path)?;
        f.write_all(&data)?;
        Ok(())
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Trace, TraceError> {
        let data = fs::read(path)?;
        Trace::decode(&data)
    }
}

/// Rebuild the session a trace was recorded from.
///
/// Every recorded action must be accepted again; anything else means the
/// trace does not belong to this engine and yields [`TraceError::Diverged`].
pub fn replay(
    trace: &Trace,
    storage: Storage,
    audio: Box<dyn AudioNotifier>,
) -> Result<GameSession, TraceError> {
    let mut session = match &trace.start {
        Start::Fresh => GameSession::new(storage, audio, trace.size, trace.mode, Some(trace.seed)),
        Start::Position(board) => {
            GameSession::resume(storage, audio, board.clone(), trace.mode, trace.seed)
        }
    };
    for (step, &action) in trace.actions.iter().enumerate() {
        let accepted = match action {
            Action::Move(dir) => session.make_move(dir).is_some(),
            Action::Undo => session.undo(),
            Action::ContinueEndless => session.continue_endless(),
        };
        if !accepted {
            return Err(TraceError::Diverged { step, action });
        }
    }
    Ok(session)
}

#[inline]
fn read_u32_le(bytes: &[u8]) -> Option<u32> {
    let b: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
    Some(u32::from_le_bytes(b))
}

#[inline]
fn read_u64_le(bytes: &[u8]) -> Option<u64> {
    let b: [u8; 8] = bytes.get(..8)?.try_into().ok()?;
    Some(u64::from_le_bytes(b))
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
